//! Rule oracles, one per game kind.
//!
//! Each oracle owns its board and implements [`Oracle`]: `play` validates and
//! applies a move, returning a record that `revert` undoes exactly. The
//! [`Board`] enum wraps one oracle per session and routes wire-level
//! [`MoveRequest`]s to it.

pub mod cards;
pub mod checkers;
pub mod chess;
pub mod go;
pub mod gobang;
pub mod military;
pub mod othello;
pub mod xiangqi;

use crate::board::{Grid, Pos, Seat, Stone};
use crate::kind::{GameKind, Outcome};
use serde::{Deserialize, Serialize};

use cards::{CardPlay, CardRecord, CardView, CardsBoard};
use checkers::{CheckersBoard, CheckersRecord};
use chess::{ChessBoard, ChessMove, ChessRecord};
use go::{GoBoard, GoMove, GoRecord};
use gobang::{GobangBoard, GobangRecord};
use military::{MilitaryBoard, MilitaryRecord, MilitaryReport, MilitaryView};
use othello::{OthelloBoard, OthelloRecord};
use xiangqi::{XiangqiBoard, XiangqiRecord};

/// Why an oracle refused a move.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum MoveError {
    #[error("position is off the board")]
    OutOfRange,
    #[error("target is occupied")]
    Occupied,
    #[error("no piece on the source square")]
    EmptySource,
    #[error("that piece is not yours")]
    NotYourPiece,
    #[error("cannot capture your own piece")]
    OwnTarget,
    #[error("the piece cannot move that way")]
    IllegalPattern,
    #[error("move leaves your own king in check")]
    SelfCheck,
    #[error("suicide is not allowed")]
    Suicide,
    #[error("move flips no stones")]
    NoFlips,
    #[error("this piece cannot move")]
    Immovable,
    #[error("pieces in a camp cannot be attacked")]
    CampProtected,
    #[error("invalid deployment: {0}")]
    InvalidDeployment(String),
    #[error("cards are not in your hand")]
    CardsNotInHand,
    #[error("cards do not form a valid combination")]
    InvalidCombination,
    #[error("play does not beat the table")]
    DoesNotBeat,
    #[error("cannot pass while leading")]
    CannotPass,
    #[error("move does not belong to this game")]
    WrongGame,
}

/// Who moves after an accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnChange {
    Next,
    /// The opponent has no legal move, so the mover goes again.
    Again,
}

/// The result of an accepted move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Played<R> {
    pub record: R,
    pub turn: TurnChange,
    pub outcome: Option<Outcome>,
    /// The side to move next is in check.
    pub check: bool,
}

impl<R> Played<R> {
    pub fn next(record: R) -> Self {
        Self {
            record,
            turn: TurnChange::Next,
            outcome: None,
            check: false,
        }
    }

    pub fn again(mut self) -> Self {
        self.turn = TurnChange::Again;
        self
    }

    pub fn ending(mut self, outcome: Option<Outcome>) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn with_check(mut self, check: bool) -> Self {
        self.check = check;
        self
    }

    pub fn map<S>(self, f: impl FnOnce(R) -> S) -> Played<S> {
        Played {
            record: f(self.record),
            turn: self.turn,
            outcome: self.outcome,
            check: self.check,
        }
    }
}

pub trait Oracle {
    type Move;
    type Record;

    fn play(&mut self, seat: Seat, mv: &Self::Move) -> Result<Played<Self::Record>, MoveError>;

    /// Undoes a move previously returned by `play` on this board.
    fn revert(&mut self, record: &Self::Record);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceMove {
    pub from: Pos,
    pub to: Pos,
}

/// A move as it arrives from a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveRequest {
    /// A stone on an empty point: gobang, go and othello.
    Place(Pos),
    Go(GoMove),
    /// A piece from one cell to another: xiangqi, chess, checkers and military.
    Piece(PieceMove),
    Chess(ChessMove),
    Cards(CardPlay),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveRecord {
    Gobang(GobangRecord),
    Go(GoRecord),
    Othello(OthelloRecord),
    Xiangqi(XiangqiRecord),
    Chess(ChessRecord),
    Checkers(CheckersRecord),
    Military(MilitaryRecord),
    Cards(CardRecord),
}

impl MoveRecord {
    pub fn seat(&self) -> Seat {
        match self {
            MoveRecord::Gobang(r) => r.seat,
            MoveRecord::Go(r) => r.seat,
            MoveRecord::Othello(r) => r.seat,
            MoveRecord::Xiangqi(r) => r.seat,
            MoveRecord::Chess(r) => r.seat,
            MoveRecord::Checkers(r) => r.seat,
            MoveRecord::Military(r) => r.seat,
            MoveRecord::Cards(r) => r.seat,
        }
    }
}

/// What every participant is told about an accepted move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveReport {
    Open(MoveRecord),
    /// Military moves reveal positions and battle results only.
    Military(MilitaryReport),
}

/// A seat's picture of the board. Spectator-safe unless the game hides
/// information, in which case only the viewer's own share is filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardView {
    Stones(Grid<Option<Stone>>),
    Xiangqi(Grid<Option<xiangqi::Piece>>),
    Chess(Grid<Option<chess::Piece>>),
    Checkers(Grid<Option<Seat>>),
    Military(MilitaryView),
    Cards(CardView),
}

/// The board of one session, dispatching to the oracle of its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Board {
    Gobang(GobangBoard),
    Go(GoBoard),
    Othello(OthelloBoard),
    Xiangqi(XiangqiBoard),
    Chess(ChessBoard),
    Checkers(CheckersBoard),
    Military(MilitaryBoard),
    Cards(CardsBoard),
}

fn wrap<O: Oracle>(
    oracle: &mut O,
    seat: Seat,
    mv: &O::Move,
    into: impl FnOnce(O::Record) -> MoveRecord,
) -> Result<Played<MoveRecord>, MoveError> {
    oracle.play(seat, mv).map(|played| played.map(into))
}

impl Board {
    pub fn new(kind: GameKind) -> Self {
        match kind {
            GameKind::Gobang => Board::Gobang(GobangBoard::new()),
            GameKind::Go => Board::Go(GoBoard::new()),
            GameKind::Othello => Board::Othello(OthelloBoard::new()),
            GameKind::Xiangqi => Board::Xiangqi(XiangqiBoard::new()),
            GameKind::Chess => Board::Chess(ChessBoard::new()),
            GameKind::Checkers => Board::Checkers(CheckersBoard::new()),
            GameKind::Military => Board::Military(MilitaryBoard::new()),
            GameKind::Cards => Board::Cards(CardsBoard::new()),
        }
    }

    pub fn kind(&self) -> GameKind {
        match self {
            Board::Gobang(_) => GameKind::Gobang,
            Board::Go(_) => GameKind::Go,
            Board::Othello(_) => GameKind::Othello,
            Board::Xiangqi(_) => GameKind::Xiangqi,
            Board::Chess(_) => GameKind::Chess,
            Board::Checkers(_) => GameKind::Checkers,
            Board::Military(_) => GameKind::Military,
            Board::Cards(_) => GameKind::Cards,
        }
    }

    pub fn play(&mut self, seat: Seat, request: &MoveRequest) -> Result<Played<MoveRecord>, MoveError> {
        match (self, request) {
            (Board::Gobang(b), MoveRequest::Place(at)) => wrap(b, seat, at, MoveRecord::Gobang),
            (Board::Go(b), MoveRequest::Go(mv)) => wrap(b, seat, mv, MoveRecord::Go),
            (Board::Go(b), MoveRequest::Place(at)) => {
                wrap(b, seat, &GoMove::Place(*at), MoveRecord::Go)
            }
            (Board::Othello(b), MoveRequest::Place(at)) => wrap(b, seat, at, MoveRecord::Othello),
            (Board::Xiangqi(b), MoveRequest::Piece(mv)) => wrap(b, seat, mv, MoveRecord::Xiangqi),
            (Board::Chess(b), MoveRequest::Chess(mv)) => wrap(b, seat, mv, MoveRecord::Chess),
            (Board::Chess(b), MoveRequest::Piece(PieceMove { from, to })) => {
                let mv = ChessMove {
                    from: *from,
                    to: *to,
                    promotion: None,
                };
                wrap(b, seat, &mv, MoveRecord::Chess)
            }
            (Board::Checkers(b), MoveRequest::Piece(mv)) => wrap(b, seat, mv, MoveRecord::Checkers),
            (Board::Military(b), MoveRequest::Piece(mv)) => wrap(b, seat, mv, MoveRecord::Military),
            (Board::Cards(b), MoveRequest::Cards(mv)) => wrap(b, seat, mv, MoveRecord::Cards),
            _ => Err(MoveError::WrongGame),
        }
    }

    pub fn revert(&mut self, record: &MoveRecord) -> Result<(), MoveError> {
        match (self, record) {
            (Board::Gobang(b), MoveRecord::Gobang(r)) => b.revert(r),
            (Board::Go(b), MoveRecord::Go(r)) => b.revert(r),
            (Board::Othello(b), MoveRecord::Othello(r)) => b.revert(r),
            (Board::Xiangqi(b), MoveRecord::Xiangqi(r)) => b.revert(r),
            (Board::Chess(b), MoveRecord::Chess(r)) => b.revert(r),
            (Board::Checkers(b), MoveRecord::Checkers(r)) => b.revert(r),
            (Board::Military(b), MoveRecord::Military(r)) => b.revert(r),
            (Board::Cards(b), MoveRecord::Cards(r)) => b.revert(r),
            _ => return Err(MoveError::WrongGame),
        }
        Ok(())
    }

    pub fn report(&self, record: &MoveRecord) -> MoveReport {
        match record {
            MoveRecord::Military(r) => MoveReport::Military(MilitaryReport::from(r)),
            other => MoveReport::Open(other.clone()),
        }
    }

    /// The board as `viewer` may see it. `None` is a spectator.
    pub fn view(&self, viewer: Option<Seat>) -> BoardView {
        match self {
            Board::Gobang(b) => BoardView::Stones(b.grid().clone()),
            Board::Go(b) => BoardView::Stones(b.grid().clone()),
            Board::Othello(b) => BoardView::Stones(b.grid().clone()),
            Board::Xiangqi(b) => BoardView::Xiangqi(b.grid().clone()),
            Board::Chess(b) => BoardView::Chess(b.grid().clone()),
            Board::Checkers(b) => BoardView::Checkers(b.grid().clone()),
            Board::Military(b) => BoardView::Military(b.view(viewer)),
            Board::Cards(b) => BoardView::Cards(b.view(viewer)),
        }
    }

    pub fn cards_mut(&mut self) -> Option<&mut CardsBoard> {
        match self {
            Board::Cards(b) => Some(b),
            _ => None,
        }
    }

    pub fn cards(&self) -> Option<&CardsBoard> {
        match self {
            Board::Cards(b) => Some(b),
            _ => None,
        }
    }

    pub fn military(&self) -> Option<&MilitaryBoard> {
        match self {
            Board::Military(b) => Some(b),
            _ => None,
        }
    }

    pub fn military_mut(&mut self) -> Option<&mut MilitaryBoard> {
        match self {
            Board::Military(b) => Some(b),
            _ => None,
        }
    }

    pub fn checkers_mut(&mut self) -> Option<&mut CheckersBoard> {
        match self {
            Board::Checkers(b) => Some(b),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_matches_kind() {
        for kind in GameKind::ALL {
            assert_eq!(Board::new(kind).kind(), kind);
        }
    }

    #[test]
    fn test_request_for_another_game_is_rejected() {
        let mut board = Board::new(GameKind::Gobang);
        let request = MoveRequest::Cards(CardPlay::Pass);
        assert_eq!(board.play(0, &request), Err(MoveError::WrongGame));
    }

    #[test]
    fn test_play_then_revert_through_the_enum() {
        let mut board = Board::new(GameKind::Chess);
        let before = board.clone();
        let request = MoveRequest::Piece(PieceMove {
            from: Pos::new(1, 4),
            to: Pos::new(3, 4),
        });
        let played = board.play(0, &request).unwrap();
        assert_eq!(played.record.seat(), 0);
        assert_ne!(board, before);
        board.revert(&played.record).unwrap();
        assert_eq!(board, before);
    }

    #[test]
    fn test_military_report_hides_units() {
        let mut board = Board::new(GameKind::Military);
        if let Some(military) = board.military_mut() {
            military.put(0, Pos::new(5, 0), military::Unit::Brigade);
            military.put(1, Pos::new(6, 0), military::Unit::Regiment);
            military.put(1, Pos::new(11, 0), military::Unit::Company);
        }
        let request = MoveRequest::Piece(PieceMove {
            from: Pos::new(5, 0),
            to: Pos::new(6, 0),
        });
        let played = board.play(0, &request).unwrap();
        match board.report(&played.record) {
            MoveReport::Military(report) => {
                assert_eq!(report.battle, Some(military::combat::Battle::AttackerWins));
                assert!(!report.flag_captured);
            }
            other => panic!("unexpected report {:?}", other),
        }
    }
}
