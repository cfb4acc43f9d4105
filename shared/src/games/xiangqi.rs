//! Chinese chess on a 10×9 board. Red holds seat 0, starts on rows 5–9 and
//! moves first.

use super::{MoveError, Oracle, PieceMove, Played};
use crate::board::{Grid, Pos, Seat};
use crate::kind::Outcome;
use serde::{Deserialize, Serialize};

pub const ROWS: i32 = 10;
pub const COLS: i32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Red,
    Black,
}

impl Side {
    pub fn of_seat(seat: Seat) -> Self {
        if seat == 0 {
            Side::Red
        } else {
            Side::Black
        }
    }

    pub fn seat(self) -> Seat {
        match self {
            Side::Red => 0,
            Side::Black => 1,
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Side::Red => Side::Black,
            Side::Black => Side::Red,
        }
    }

    fn forward(self) -> i32 {
        match self {
            Side::Red => -1,
            Side::Black => 1,
        }
    }

    fn owns_row(self, row: i32) -> bool {
        match self {
            Side::Red => row >= 5,
            Side::Black => row <= 4,
        }
    }

    fn in_palace(self, pos: Pos) -> bool {
        let rows = match self {
            Side::Red => 7..=9,
            Side::Black => 0..=2,
        };
        rows.contains(&pos.row) && (3..=5).contains(&pos.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    Rook,
    Knight,
    Elephant,
    Advisor,
    General,
    Cannon,
    Soldier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub side: Side,
    pub kind: PieceKind,
}

impl Piece {
    pub const fn new(side: Side, kind: PieceKind) -> Self {
        Self { side, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XiangqiBoard {
    grid: Grid<Option<Piece>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XiangqiRecord {
    pub seat: Seat,
    pub from: Pos,
    pub to: Pos,
    pub piece: Piece,
    pub captured: Option<Piece>,
}

const BACK_RANK: [PieceKind; 9] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Elephant,
    PieceKind::Advisor,
    PieceKind::General,
    PieceKind::Advisor,
    PieceKind::Elephant,
    PieceKind::Knight,
    PieceKind::Rook,
];

/// Whether `piece` may go from `from` to `to` by its movement pattern alone.
/// Self-check is not considered here.
pub fn legal_move(grid: &Grid<Option<Piece>>, from: Pos, to: Pos, piece: Piece) -> bool {
    if from == to || !grid.contains(from) || !grid.contains(to) {
        return false;
    }
    let target = grid.at(to);
    if target.map_or(false, |other| other.side == piece.side) {
        return false;
    }

    let (dr, dc) = from.delta(to);
    let straight = dr == 0 || dc == 0;
    match piece.kind {
        PieceKind::Rook => straight && grid.count_between(from, to) == 0,
        PieceKind::Cannon => {
            let screens = if straight { grid.count_between(from, to) } else { usize::MAX };
            match target {
                None => screens == 0,
                Some(_) => screens == 1,
            }
        }
        PieceKind::Knight => {
            let leg = match (dr.abs(), dc.abs()) {
                (2, 1) => from.offset(dr / 2, 0),
                (1, 2) => from.offset(0, dc / 2),
                _ => return false,
            };
            grid.at(leg).is_none()
        }
        PieceKind::Elephant => {
            dr.abs() == 2
                && dc.abs() == 2
                && piece.side.owns_row(to.row)
                && grid.at(from.offset(dr / 2, dc / 2)).is_none()
        }
        PieceKind::Advisor => dr.abs() == 1 && dc.abs() == 1 && piece.side.in_palace(to),
        PieceKind::General => dr.abs() + dc.abs() == 1 && piece.side.in_palace(to),
        PieceKind::Soldier => {
            let forward = dr == piece.side.forward() && dc == 0;
            let crossed = !piece.side.owns_row(from.row);
            forward || (crossed && dr == 0 && dc.abs() == 1)
        }
    }
}

impl Default for XiangqiBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl XiangqiBoard {
    pub fn new() -> Self {
        let mut grid = Grid::new(ROWS, COLS);
        for (side, back, cannons, soldiers) in [(Side::Red, 9, 7, 6), (Side::Black, 0, 2, 3)] {
            for (col, kind) in BACK_RANK.iter().enumerate() {
                grid.set(Pos::new(back, col as i32), Some(Piece::new(side, *kind)));
            }
            for col in [1, 7] {
                grid.set(Pos::new(cannons, col), Some(Piece::new(side, PieceKind::Cannon)));
            }
            for col in [0, 2, 4, 6, 8] {
                grid.set(Pos::new(soldiers, col), Some(Piece::new(side, PieceKind::Soldier)));
            }
        }
        Self { grid }
    }

    /// An empty board, for setting up positions.
    pub fn empty() -> Self {
        Self {
            grid: Grid::new(ROWS, COLS),
        }
    }

    pub fn grid(&self) -> &Grid<Option<Piece>> {
        &self.grid
    }

    pub fn put(&mut self, pos: Pos, piece: Option<Piece>) {
        self.grid.set(pos, piece);
    }

    fn general(&self, side: Side) -> Option<Pos> {
        self.grid
            .occupied()
            .find(|(_, piece)| *piece == Piece::new(side, PieceKind::General))
            .map(|(pos, _)| pos)
    }

    /// True when `side`'s general is attacked, or when the two generals face
    /// each other on an open file.
    pub fn is_in_check(&self, side: Side) -> bool {
        let Some(general) = self.general(side) else {
            return true;
        };
        if let Some(other) = self.general(side.opponent()) {
            if other.col == general.col && self.grid.count_between(general, other) == 0 {
                return true;
            }
        }
        self.grid
            .occupied()
            .filter(|(_, piece)| piece.side != side)
            .any(|(pos, piece)| legal_move(&self.grid, pos, general, piece))
    }

    fn apply(&mut self, seat: Seat, from: Pos, to: Pos, piece: Piece) -> XiangqiRecord {
        let captured = self.grid.take(to);
        self.grid.set(to, Some(piece));
        self.grid.set(from, None);
        XiangqiRecord {
            seat,
            from,
            to,
            piece,
            captured,
        }
    }

    /// Applies the move on the board, tests for check and rolls back.
    fn leaves_general_safe(&mut self, from: Pos, to: Pos, piece: Piece) -> bool {
        let record = self.apply(piece.side.seat(), from, to, piece);
        let safe = !self.is_in_check(piece.side);
        self.revert(&record);
        safe
    }

    pub fn has_any_legal_move(&mut self, side: Side) -> bool {
        let pieces: Vec<(Pos, Piece)> = self
            .grid
            .occupied()
            .filter(|(_, piece)| piece.side == side)
            .collect();
        let targets: Vec<Pos> = self.grid.positions().collect();

        pieces.into_iter().any(|(from, piece)| {
            targets.iter().any(|&to| {
                legal_move(&self.grid, from, to, piece) && self.leaves_general_safe(from, to, piece)
            })
        })
    }
}

impl Oracle for XiangqiBoard {
    type Move = PieceMove;
    type Record = XiangqiRecord;

    fn play(&mut self, seat: Seat, mv: &PieceMove) -> Result<Played<XiangqiRecord>, MoveError> {
        let PieceMove { from, to } = *mv;
        if !self.grid.contains(from) || !self.grid.contains(to) {
            return Err(MoveError::OutOfRange);
        }
        let side = Side::of_seat(seat);
        let piece = self.grid.at(from).ok_or(MoveError::EmptySource)?;
        if piece.side != side {
            return Err(MoveError::NotYourPiece);
        }
        if self.grid.at(to).map_or(false, |target| target.side == side) {
            return Err(MoveError::OwnTarget);
        }
        if !legal_move(&self.grid, from, to, piece) {
            return Err(MoveError::IllegalPattern);
        }

        let record = self.apply(seat, from, to, piece);
        if self.is_in_check(side) {
            self.revert(&record);
            return Err(MoveError::SelfCheck);
        }

        let enemy = side.opponent();
        let check = self.is_in_check(enemy);
        let outcome = (!self.has_any_legal_move(enemy)).then_some(Outcome::Winner(seat));

        Ok(Played::next(record).with_check(check).ending(outcome))
    }

    fn revert(&mut self, record: &XiangqiRecord) {
        self.grid.set(record.from, Some(record.piece));
        self.grid.set(record.to, record.captured);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(from: (i32, i32), to: (i32, i32)) -> PieceMove {
        PieceMove {
            from: Pos::new(from.0, from.1),
            to: Pos::new(to.0, to.1),
        }
    }

    fn red(kind: PieceKind) -> Option<Piece> {
        Some(Piece::new(Side::Red, kind))
    }

    fn black(kind: PieceKind) -> Option<Piece> {
        Some(Piece::new(Side::Black, kind))
    }

    #[test]
    fn test_opening_cannon_and_knight() {
        let mut board = XiangqiBoard::new();
        assert!(board.play(0, &mv((7, 1), (7, 4))).is_ok());
        assert!(board.play(1, &mv((0, 1), (2, 2))).is_ok());
        // Cannon jumps its own soldier to take the black soldier
        let played = board.play(0, &mv((7, 4), (3, 4))).unwrap();
        assert_eq!(played.record.captured, black(PieceKind::Soldier));
    }

    #[test]
    fn test_knight_leg_block() {
        let mut board = XiangqiBoard::new();
        assert!(legal_move(board.grid(), Pos::new(9, 1), Pos::new(7, 2), red(PieceKind::Knight).unwrap()));
        board.put(Pos::new(8, 1), red(PieceKind::Soldier));
        assert!(!legal_move(board.grid(), Pos::new(9, 1), Pos::new(7, 2), red(PieceKind::Knight).unwrap()));
    }

    #[test]
    fn test_elephant_stays_home_and_advisor_in_palace() {
        let board = XiangqiBoard::new();
        let elephant = red(PieceKind::Elephant).unwrap();
        assert!(legal_move(board.grid(), Pos::new(9, 2), Pos::new(7, 4), elephant));
        assert!(!legal_move(board.grid(), Pos::new(5, 2), Pos::new(3, 4), elephant));
        let advisor = red(PieceKind::Advisor).unwrap();
        assert!(legal_move(board.grid(), Pos::new(9, 3), Pos::new(8, 4), advisor));
        assert!(legal_move(board.grid(), Pos::new(8, 4), Pos::new(7, 5), advisor));
        assert!(!legal_move(board.grid(), Pos::new(7, 5), Pos::new(6, 6), advisor));
    }

    #[test]
    fn test_soldier_sideways_only_after_river() {
        let board = XiangqiBoard::empty();
        let soldier = red(PieceKind::Soldier).unwrap();
        assert!(legal_move(board.grid(), Pos::new(6, 0), Pos::new(5, 0), soldier));
        assert!(!legal_move(board.grid(), Pos::new(6, 0), Pos::new(6, 1), soldier));
        assert!(!legal_move(board.grid(), Pos::new(6, 0), Pos::new(7, 0), soldier));
        assert!(legal_move(board.grid(), Pos::new(4, 0), Pos::new(4, 1), soldier));
    }

    #[test]
    fn test_self_check_rejected() {
        let mut board = XiangqiBoard::empty();
        board.put(Pos::new(9, 4), red(PieceKind::General));
        board.put(Pos::new(8, 4), red(PieceKind::Rook));
        board.put(Pos::new(0, 4), black(PieceKind::Rook));
        board.put(Pos::new(0, 3), black(PieceKind::General));
        let before = board.clone();

        assert_eq!(board.play(0, &mv((8, 4), (8, 0))), Err(MoveError::SelfCheck));
        assert_eq!(board, before);
    }

    #[test]
    fn test_generals_may_not_face() {
        let mut board = XiangqiBoard::empty();
        board.put(Pos::new(9, 3), red(PieceKind::General));
        board.put(Pos::new(0, 4), black(PieceKind::General));
        assert_eq!(board.play(0, &mv((9, 3), (9, 4))), Err(MoveError::SelfCheck));
    }

    #[test]
    fn test_checkmate_ends_game() {
        let mut board = XiangqiBoard::empty();
        board.put(Pos::new(0, 4), black(PieceKind::General));
        board.put(Pos::new(9, 3), red(PieceKind::General));
        board.put(Pos::new(1, 0), red(PieceKind::Rook));
        board.put(Pos::new(5, 8), red(PieceKind::Rook));

        // One rook holds row 1, the other checks along row 0
        let played = board.play(0, &mv((5, 8), (0, 8))).unwrap();
        assert!(played.check);
        assert_eq!(played.outcome, Some(Outcome::Winner(0)));
    }

    #[test]
    fn test_revert_restores_capture() {
        let mut board = XiangqiBoard::new();
        board.play(0, &mv((7, 1), (7, 4))).unwrap();
        let before = board.clone();
        let played = board.play(1, &mv((2, 7), (9, 7))).unwrap();
        assert_eq!(played.record.captured, red(PieceKind::Knight));
        board.revert(&played.record);
        assert_eq!(board, before);
    }
}
