//! International chess. White holds seat 0, starts on rows 0–1 and moves
//! towards higher rows.

use super::{MoveError, Oracle, Played};
use crate::board::{Grid, Pos, Seat, ALL_DIRECTIONS, DIAGONAL, ORTHOGONAL};
use crate::kind::Outcome;
use serde::{Deserialize, Serialize};

pub const SIZE: i32 = 8;

const KNIGHT_JUMPS: [(i32, i32); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn of_seat(seat: Seat) -> Self {
        if seat == 0 {
            Color::White
        } else {
            Color::Black
        }
    }

    pub fn seat(self) -> Seat {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    fn forward(self) -> i32 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    fn home_row(self) -> i32 {
        match self {
            Color::White => 0,
            Color::Black => SIZE - 1,
        }
    }

    fn pawn_row(self) -> i32 {
        self.home_row() + self.forward()
    }

    fn last_row(self) -> i32 {
        self.opponent().home_row()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChessMove {
    pub from: Pos,
    pub to: Pos,
    /// Piece a pawn turns into on the last row; a queen when left out.
    pub promotion: Option<PieceKind>,
}

/// Which rooks may still castle, per colour: (king side, queen side).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastlingRights {
    pub white: (bool, bool),
    pub black: (bool, bool),
}

impl CastlingRights {
    const ALL: CastlingRights = CastlingRights {
        white: (true, true),
        black: (true, true),
    };

    fn of(&mut self, color: Color) -> &mut (bool, bool) {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    fn get(&self, color: Color) -> (bool, bool) {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChessBoard {
    grid: Grid<Option<Piece>>,
    castling: CastlingRights,
    /// Square a pawn skipped on the previous move, capturable en passant.
    en_passant: Option<Pos>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChessRecord {
    pub seat: Seat,
    pub from: Pos,
    pub to: Pos,
    pub piece: Piece,
    /// Captured piece and the square it stood on (differs from `to` en passant).
    pub captured: Option<(Pos, Piece)>,
    pub rook_move: Option<(Pos, Pos)>,
    pub promoted: Option<PieceKind>,
    pub castling_before: CastlingRights,
    pub en_passant_before: Option<Pos>,
}

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

const KING_COL: i32 = 4;

/// Whether `piece` standing on `from` attacks `target`.
fn attacks(grid: &Grid<Option<Piece>>, from: Pos, target: Pos, piece: Piece) -> bool {
    if from == target {
        return false;
    }
    let (dr, dc) = from.delta(target);
    match piece.kind {
        PieceKind::King => dr.abs() <= 1 && dc.abs() <= 1,
        PieceKind::Knight => KNIGHT_JUMPS.contains(&(dr, dc)),
        PieceKind::Pawn => dr == piece.color.forward() && dc.abs() == 1,
        PieceKind::Rook => (dr == 0 || dc == 0) && grid.count_between(from, target) == 0,
        PieceKind::Bishop => dr.abs() == dc.abs() && grid.count_between(from, target) == 0,
        PieceKind::Queen => {
            (dr == 0 || dc == 0 || dr.abs() == dc.abs()) && grid.count_between(from, target) == 0
        }
    }
}

pub fn is_square_attacked(grid: &Grid<Option<Piece>>, target: Pos, by: Color) -> bool {
    grid.occupied()
        .filter(|(_, piece)| piece.color == by)
        .any(|(pos, piece)| attacks(grid, pos, target, piece))
}

impl Default for ChessBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl ChessBoard {
    pub fn new() -> Self {
        let mut board = Self::empty();
        for color in [Color::White, Color::Black] {
            for (col, kind) in BACK_RANK.iter().enumerate() {
                board.put(Pos::new(color.home_row(), col as i32), Some(Piece::new(color, *kind)));
            }
            for col in 0..SIZE {
                board.put(Pos::new(color.pawn_row(), col), Some(Piece::new(color, PieceKind::Pawn)));
            }
        }
        board.castling = CastlingRights::ALL;
        board
    }

    /// An empty board without castling rights, for setting up positions.
    pub fn empty() -> Self {
        Self {
            grid: Grid::new(SIZE, SIZE),
            castling: CastlingRights {
                white: (false, false),
                black: (false, false),
            },
            en_passant: None,
        }
    }

    pub fn grid(&self) -> &Grid<Option<Piece>> {
        &self.grid
    }

    pub fn put(&mut self, pos: Pos, piece: Option<Piece>) {
        self.grid.set(pos, piece);
    }

    pub fn set_castling(&mut self, castling: CastlingRights) {
        self.castling = castling;
    }

    fn king(&self, color: Color) -> Option<Pos> {
        self.grid
            .occupied()
            .find(|(_, piece)| *piece == Piece::new(color, PieceKind::King))
            .map(|(pos, _)| pos)
    }

    pub fn is_in_check(&self, color: Color) -> bool {
        match self.king(color) {
            Some(king) => is_square_attacked(&self.grid, king, color.opponent()),
            None => true,
        }
    }

    /// Movement pattern check including castling and en passant, ignoring self-check.
    pub fn legal_move(&self, from: Pos, to: Pos, piece: Piece) -> bool {
        if from == to || !self.grid.contains(from) || !self.grid.contains(to) {
            return false;
        }
        let target = self.grid.at(to);
        if target.map_or(false, |other| other.color == piece.color) {
            return false;
        }

        let (dr, dc) = from.delta(to);
        match piece.kind {
            PieceKind::Pawn => {
                let forward = piece.color.forward();
                if dc == 0 {
                    let single = dr == forward && target.is_none();
                    let double = dr == 2 * forward
                        && from.row == piece.color.pawn_row()
                        && target.is_none()
                        && self.grid.at(from.offset(forward, 0)).is_none();
                    single || double
                } else {
                    dr == forward
                        && dc.abs() == 1
                        && (target.is_some() || self.en_passant == Some(to))
                }
            }
            PieceKind::King if dr == 0 && dc.abs() == 2 => self.can_castle(from, to, piece.color),
            _ => attacks(&self.grid, from, to, piece),
        }
    }

    fn can_castle(&self, from: Pos, to: Pos, color: Color) -> bool {
        let home = color.home_row();
        if from != Pos::new(home, KING_COL) {
            return false;
        }
        let (king_side, queen_side) = self.castling.get(color);
        let (allowed, rook_col, passes) = if to.col == 6 {
            (king_side, 7, [5, 6])
        } else if to.col == 2 {
            (queen_side, 0, [3, 2])
        } else {
            return false;
        };

        let rook = Pos::new(home, rook_col);
        if !allowed || self.grid.at(rook) != Some(Piece::new(color, PieceKind::Rook)) {
            return false;
        }
        let (low, high) = (rook_col.min(KING_COL) + 1, rook_col.max(KING_COL));
        if (low..high).any(|col| self.grid.at(Pos::new(home, col)).is_some()) {
            return false;
        }

        let enemy = color.opponent();
        !self.is_in_check(color)
            && passes
                .iter()
                .all(|&col| !is_square_attacked(&self.grid, Pos::new(home, col), enemy))
    }

    fn apply(&mut self, seat: Seat, mv: &ChessMove, piece: Piece) -> ChessRecord {
        let ChessMove { from, to, promotion } = *mv;
        let castling_before = self.castling;
        let en_passant_before = self.en_passant;
        let (dr, dc) = from.delta(to);

        let mut captured = self.grid.take(to).map(|victim| (to, victim));
        if piece.kind == PieceKind::Pawn && dc != 0 && captured.is_none() {
            let behind = Pos::new(from.row, to.col);
            captured = self.grid.take(behind).map(|victim| (behind, victim));
        }

        let rook_move = (piece.kind == PieceKind::King && dc.abs() == 2).then(|| {
            let (rook_from, rook_to) = if dc > 0 { (7, 5) } else { (0, 3) };
            (Pos::new(from.row, rook_from), Pos::new(from.row, rook_to))
        });
        if let Some((rook_from, rook_to)) = rook_move {
            let rook = self.grid.take(rook_from);
            self.grid.set(rook_to, rook);
        }

        let promoted = (piece.kind == PieceKind::Pawn && to.row == piece.color.last_row())
            .then(|| promotion.unwrap_or(PieceKind::Queen));
        let placed = Piece::new(piece.color, promoted.unwrap_or(piece.kind));
        self.grid.set(from, None);
        self.grid.set(to, Some(placed));

        // Castling rights die with the king, or with a rook leaving or lost on its corner
        if piece.kind == PieceKind::King {
            *self.castling.of(piece.color) = (false, false);
        }
        for corner in [from, to] {
            for color in [Color::White, Color::Black] {
                let home = color.home_row();
                if corner == Pos::new(home, 7) {
                    self.castling.of(color).0 = false;
                }
                if corner == Pos::new(home, 0) {
                    self.castling.of(color).1 = false;
                }
            }
        }

        self.en_passant = (piece.kind == PieceKind::Pawn && dr.abs() == 2)
            .then(|| from.offset(dr / 2, 0));

        ChessRecord {
            seat,
            from,
            to,
            piece,
            captured,
            rook_move,
            promoted,
            castling_before,
            en_passant_before,
        }
    }

    fn leaves_king_safe(&mut self, mv: &ChessMove, piece: Piece) -> bool {
        let record = self.apply(piece.color.seat(), mv, piece);
        let safe = !self.is_in_check(piece.color);
        self.revert(&record);
        safe
    }

    pub fn has_any_legal_move(&mut self, color: Color) -> bool {
        let pieces: Vec<(Pos, Piece)> = self
            .grid
            .occupied()
            .filter(|(_, piece)| piece.color == color)
            .collect();
        let targets: Vec<Pos> = self.grid.positions().collect();

        pieces.into_iter().any(|(from, piece)| {
            targets.iter().any(|&to| {
                let mv = ChessMove {
                    from,
                    to,
                    promotion: None,
                };
                self.legal_move(from, to, piece) && self.leaves_king_safe(&mv, piece)
            })
        })
    }

    /// Bare kings, or a king and one minor piece against a bare king.
    pub fn insufficient_material(&self) -> bool {
        let mut minors = 0;
        for (_, piece) in self.grid.occupied() {
            match piece.kind {
                PieceKind::King => {}
                PieceKind::Bishop | PieceKind::Knight => minors += 1,
                _ => return false,
            }
        }
        minors <= 1
    }
}

impl Oracle for ChessBoard {
    type Move = ChessMove;
    type Record = ChessRecord;

    fn play(&mut self, seat: Seat, mv: &ChessMove) -> Result<Played<ChessRecord>, MoveError> {
        let ChessMove { from, to, promotion } = *mv;
        if !self.grid.contains(from) || !self.grid.contains(to) {
            return Err(MoveError::OutOfRange);
        }
        let color = Color::of_seat(seat);
        let piece = self.grid.at(from).ok_or(MoveError::EmptySource)?;
        if piece.color != color {
            return Err(MoveError::NotYourPiece);
        }
        if self.grid.at(to).map_or(false, |target| target.color == color) {
            return Err(MoveError::OwnTarget);
        }
        if matches!(promotion, Some(PieceKind::King | PieceKind::Pawn)) {
            return Err(MoveError::IllegalPattern);
        }
        if !self.legal_move(from, to, piece) {
            return Err(MoveError::IllegalPattern);
        }

        let record = self.apply(seat, mv, piece);
        if self.is_in_check(color) {
            self.revert(&record);
            return Err(MoveError::SelfCheck);
        }

        let enemy = color.opponent();
        let check = self.is_in_check(enemy);
        let outcome = if !self.has_any_legal_move(enemy) {
            Some(if check {
                Outcome::Winner(seat)
            } else {
                Outcome::Draw
            })
        } else if self.insufficient_material() {
            Some(Outcome::Draw)
        } else {
            None
        };

        Ok(Played::next(record).with_check(check).ending(outcome))
    }

    fn revert(&mut self, record: &ChessRecord) {
        self.grid.set(record.to, None);
        self.grid.set(record.from, Some(record.piece));
        if let Some((pos, victim)) = record.captured {
            self.grid.set(pos, Some(victim));
        }
        if let Some((rook_from, rook_to)) = record.rook_move {
            let rook = self.grid.take(rook_to);
            self.grid.set(rook_from, rook);
        }
        self.castling = record.castling_before;
        self.en_passant = record.en_passant_before;
    }
}

/// Every square a piece could reach by pattern, useful for move hints.
pub fn destinations(board: &ChessBoard, from: Pos) -> Vec<Pos> {
    let Some(piece) = board.grid.at(from) else {
        return Vec::new();
    };
    let candidates: Vec<(i32, i32)> = match piece.kind {
        PieceKind::Knight => KNIGHT_JUMPS.to_vec(),
        PieceKind::King => ALL_DIRECTIONS.iter().copied().chain([(0, 2), (0, -2)]).collect(),
        PieceKind::Pawn => {
            let f = piece.color.forward();
            vec![(f, 0), (2 * f, 0), (f, -1), (f, 1)]
        }
        PieceKind::Rook | PieceKind::Bishop | PieceKind::Queen => {
            let directions: Vec<(i32, i32)> = match piece.kind {
                PieceKind::Rook => ORTHOGONAL.to_vec(),
                PieceKind::Bishop => DIAGONAL.to_vec(),
                _ => ALL_DIRECTIONS.to_vec(),
            };
            directions
                .into_iter()
                .flat_map(|(dr, dc)| (1..SIZE).map(move |n| (dr * n, dc * n)))
                .collect()
        }
    };
    candidates
        .into_iter()
        .map(|(dr, dc)| from.offset(dr, dc))
        .filter(|&to| board.legal_move(from, to, piece))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(from: (i32, i32), to: (i32, i32)) -> ChessMove {
        ChessMove {
            from: Pos::new(from.0, from.1),
            to: Pos::new(to.0, to.1),
            promotion: None,
        }
    }

    fn white(kind: PieceKind) -> Option<Piece> {
        Some(Piece::new(Color::White, kind))
    }

    fn black(kind: PieceKind) -> Option<Piece> {
        Some(Piece::new(Color::Black, kind))
    }

    #[test]
    fn test_opening_pawn_and_knight() {
        let mut board = ChessBoard::new();
        assert!(board.play(0, &mv((1, 4), (3, 4))).is_ok());
        assert_eq!(board.en_passant, Some(Pos::new(2, 4)));
        assert!(board.play(1, &mv((7, 6), (5, 5))).is_ok());
        assert_eq!(board.en_passant, None);
        assert_eq!(board.play(0, &mv((0, 1), (2, 1))), Err(MoveError::IllegalPattern));
        assert_eq!(destinations(&board, Pos::new(0, 6)).len(), 3);
    }

    #[test]
    fn test_fools_mate() {
        let mut board = ChessBoard::new();
        board.play(0, &mv((1, 5), (2, 5))).unwrap();
        board.play(1, &mv((6, 4), (4, 4))).unwrap();
        board.play(0, &mv((1, 6), (3, 6))).unwrap();
        let played = board.play(1, &mv((7, 3), (3, 7))).unwrap();
        assert!(played.check);
        assert_eq!(played.outcome, Some(Outcome::Winner(1)));
    }

    #[test]
    fn test_pinned_piece_cannot_move() {
        let mut board = ChessBoard::empty();
        board.put(Pos::new(0, 4), white(PieceKind::King));
        board.put(Pos::new(1, 4), white(PieceKind::Bishop));
        board.put(Pos::new(7, 4), black(PieceKind::Rook));
        board.put(Pos::new(7, 0), black(PieceKind::King));
        assert_eq!(board.play(0, &mv((1, 4), (2, 5))), Err(MoveError::SelfCheck));
    }

    #[test]
    fn test_castling_and_revert() {
        let mut board = ChessBoard::empty();
        board.set_castling(CastlingRights::ALL);
        board.put(Pos::new(0, 4), white(PieceKind::King));
        board.put(Pos::new(0, 7), white(PieceKind::Rook));
        board.put(Pos::new(0, 0), white(PieceKind::Rook));
        board.put(Pos::new(7, 4), black(PieceKind::King));
        board.put(Pos::new(6, 0), black(PieceKind::Pawn));
        let before = board.clone();

        let played = board.play(0, &mv((0, 4), (0, 6))).unwrap();
        assert_eq!(board.grid().at(Pos::new(0, 5)), white(PieceKind::Rook));
        assert_eq!(board.castling.white, (false, false));

        board.revert(&played.record);
        assert_eq!(board, before);
    }

    #[test]
    fn test_castling_through_attack_rejected() {
        let mut board = ChessBoard::empty();
        board.set_castling(CastlingRights::ALL);
        board.put(Pos::new(0, 4), white(PieceKind::King));
        board.put(Pos::new(0, 7), white(PieceKind::Rook));
        board.put(Pos::new(7, 5), black(PieceKind::Rook));
        board.put(Pos::new(7, 0), black(PieceKind::King));
        assert_eq!(board.play(0, &mv((0, 4), (0, 6))), Err(MoveError::IllegalPattern));
    }

    #[test]
    fn test_en_passant_only_right_after_double_step() {
        let mut board = ChessBoard::empty();
        board.put(Pos::new(0, 4), white(PieceKind::King));
        board.put(Pos::new(7, 4), black(PieceKind::King));
        board.put(Pos::new(4, 4), white(PieceKind::Pawn));
        board.put(Pos::new(6, 3), black(PieceKind::Pawn));
        board.put(Pos::new(6, 7), black(PieceKind::Pawn));

        board.play(1, &mv((6, 3), (4, 3))).unwrap();
        let played = board.play(0, &mv((4, 4), (5, 3))).unwrap();
        assert_eq!(played.record.captured, Some((Pos::new(4, 3), Piece::new(Color::Black, PieceKind::Pawn))));
        assert_eq!(board.grid().at(Pos::new(4, 3)), None);

        board.revert(&played.record);
        assert_eq!(board.grid().at(Pos::new(4, 3)), black(PieceKind::Pawn));

        // Waiting a move forfeits the capture
        board.play(0, &mv((0, 4), (0, 3))).unwrap();
        board.play(1, &mv((6, 7), (5, 7))).unwrap();
        assert_eq!(board.play(0, &mv((4, 4), (5, 3))), Err(MoveError::IllegalPattern));
    }

    #[test]
    fn test_promotion_defaults_to_queen() {
        let mut board = ChessBoard::empty();
        board.put(Pos::new(0, 0), white(PieceKind::King));
        board.put(Pos::new(7, 7), black(PieceKind::King));
        board.put(Pos::new(6, 3), white(PieceKind::Pawn));
        let played = board.play(0, &mv((6, 3), (7, 3))).unwrap();
        assert_eq!(played.record.promoted, Some(PieceKind::Queen));
        assert_eq!(board.grid().at(Pos::new(7, 3)), white(PieceKind::Queen));

        board.revert(&played.record);
        assert_eq!(board.grid().at(Pos::new(6, 3)), white(PieceKind::Pawn));
    }

    #[test]
    fn test_stalemate_and_bare_kings_draw() {
        let mut board = ChessBoard::empty();
        board.put(Pos::new(7, 0), black(PieceKind::King));
        board.put(Pos::new(0, 7), white(PieceKind::King));
        board.put(Pos::new(4, 1), white(PieceKind::Queen));
        let played = board.play(0, &mv((4, 1), (5, 1))).unwrap();
        assert!(!played.check);
        assert_eq!(played.outcome, Some(Outcome::Draw));

        let mut bare = ChessBoard::empty();
        bare.put(Pos::new(0, 0), white(PieceKind::King));
        bare.put(Pos::new(7, 7), black(PieceKind::King));
        bare.put(Pos::new(6, 6), white(PieceKind::Knight));
        bare.put(Pos::new(4, 5), black(PieceKind::Bishop));
        let played = bare.play(0, &mv((6, 6), (4, 5))).unwrap();
        assert_eq!(played.outcome, Some(Outcome::Draw));
    }
}
