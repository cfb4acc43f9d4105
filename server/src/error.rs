//! Typed rejections for room operations.

use shared::protocol::ErrorCode;
use shared::{GameKind, MoveError, RoomId};

/// Why a room operation was refused. Every variant leaves the room untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("room {0} does not exist")]
    NotFound(RoomId),
    #[error("room hosts {actual}, not {expected}")]
    KindMismatch { expected: GameKind, actual: GameKind },
    #[error("room is full")]
    RoomFull,
    #[error("no free room id found after {0} attempts")]
    AllocationExhausted(usize),
    #[error("it is not your turn")]
    NotYourTurn,
    #[error("the game has ended")]
    GameEnded,
    #[error("illegal move: {0}")]
    IllegalMove(#[from] MoveError),
    #[error("another request is already pending")]
    NegotiationConflict,
    #[error("you undid the previous move yourself")]
    ConsecutiveUndoDenied,
    #[error("the game has not started")]
    NotStarted,
    #[error("a game is in progress")]
    GameInProgress,
    #[error("nothing can be undone right now")]
    UndoUnavailable,
    #[error("only the host can do that")]
    NotHost,
    #[error("at least {0} players are needed")]
    NotEnoughPlayers(usize),
    #[error("there is no pending request to answer")]
    NoPendingRequest,
    #[error("{0} does not support this operation")]
    Unsupported(GameKind),
}

impl RoomError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RoomError::NotFound(_) => ErrorCode::NotFound,
            RoomError::KindMismatch { .. } => ErrorCode::KindMismatch,
            RoomError::RoomFull => ErrorCode::RoomFull,
            RoomError::AllocationExhausted(_) => ErrorCode::AllocationExhausted,
            RoomError::NotYourTurn => ErrorCode::NotYourTurn,
            RoomError::GameEnded => ErrorCode::GameEnded,
            RoomError::IllegalMove(_) => ErrorCode::IllegalMove,
            RoomError::NegotiationConflict => ErrorCode::NegotiationConflict,
            RoomError::ConsecutiveUndoDenied => ErrorCode::ConsecutiveUndoDenied,
            RoomError::NotStarted => ErrorCode::NotStarted,
            RoomError::GameInProgress => ErrorCode::GameInProgress,
            RoomError::UndoUnavailable => ErrorCode::UndoUnavailable,
            RoomError::NotHost => ErrorCode::NotHost,
            RoomError::NotEnoughPlayers(_) => ErrorCode::NotEnoughPlayers,
            RoomError::NoPendingRequest => ErrorCode::NoPendingRequest,
            RoomError::Unsupported(_) => ErrorCode::Unsupported,
        }
    }
}
