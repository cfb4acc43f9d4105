//! Commands clients send and events the server answers with.

use crate::board::Seat;
use crate::games::cards::Card;
use crate::games::military::{Placement, Unit};
use crate::games::{BoardView, MoveReport, MoveRequest};
use crate::kind::{GameKind, Outcome, SidePreference, Status};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type ClientId = u32;
pub type RoomId = u32;

/// One logical room operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    CreateRoom {
        kind: GameKind,
    },
    JoinRoom {
        room_id: RoomId,
        /// Rejects the join when the room hosts another game.
        kind: Option<GameKind>,
    },
    ChooseSide {
        room_id: RoomId,
        preference: SidePreference,
    },
    StartGame {
        room_id: RoomId,
    },
    Arrange {
        room_id: RoomId,
        placements: Vec<Placement>,
    },
    Move {
        room_id: RoomId,
        request: MoveRequest,
    },
    RequestUndo {
        room_id: RoomId,
    },
    RespondUndo {
        room_id: RoomId,
        approve: bool,
    },
    RequestDraw {
        room_id: RoomId,
    },
    RespondDraw {
        room_id: RoomId,
        approve: bool,
    },
    Surrender {
        room_id: RoomId,
    },
    Leave {
        room_id: RoomId,
    },
    PlayAgain {
        room_id: RoomId,
    },
}

impl Command {
    /// The room the command targets, if it names one.
    pub fn room_id(&self) -> Option<RoomId> {
        match self {
            Command::CreateRoom { .. } => None,
            Command::JoinRoom { room_id, .. }
            | Command::ChooseSide { room_id, .. }
            | Command::StartGame { room_id }
            | Command::Arrange { room_id, .. }
            | Command::Move { room_id, .. }
            | Command::RequestUndo { room_id }
            | Command::RespondUndo { room_id, .. }
            | Command::RequestDraw { room_id }
            | Command::RespondDraw { room_id, .. }
            | Command::Surrender { room_id }
            | Command::Leave { room_id }
            | Command::PlayAgain { room_id } => Some(*room_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    NotFound,
    KindMismatch,
    RoomFull,
    AllocationExhausted,
    NotYourTurn,
    GameEnded,
    IllegalMove,
    NegotiationConflict,
    ConsecutiveUndoDenied,
    NotStarted,
    GameInProgress,
    UndoUnavailable,
    NotHost,
    NotEnoughPlayers,
    NoPendingRequest,
    Unsupported,
    Internal,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Server notifications, broadcast to a room or sent to one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    RoomCreated {
        room_id: RoomId,
        kind: GameKind,
        seat: Seat,
    },
    Joined {
        room_id: RoomId,
        kind: GameKind,
        seat: Seat,
        status: Status,
    },
    PlayerJoined {
        room_id: RoomId,
        seat: Seat,
        client_id: ClientId,
    },
    /// All seats are filled; each seat now states its preference.
    ChooseSide {
        room_id: RoomId,
    },
    SideChosen {
        room_id: RoomId,
        seat: Seat,
    },
    /// Seat occupancy after side choice may have swapped identities.
    SeatsAssigned {
        room_id: RoomId,
        seats: Vec<Option<ClientId>>,
    },
    ArrangementStarted {
        room_id: RoomId,
    },
    Arranged {
        room_id: RoomId,
        seat: Seat,
    },
    GameStarted {
        room_id: RoomId,
        turn: Seat,
        view: BoardView,
    },
    MoveMade {
        room_id: RoomId,
        report: MoveReport,
    },
    Check {
        room_id: RoomId,
        seat: Seat,
    },
    TurnChanged {
        room_id: RoomId,
        turn: Seat,
    },
    GameOver {
        room_id: RoomId,
        outcome: Outcome,
    },
    UndoRequested {
        room_id: RoomId,
        seat: Seat,
    },
    UndoApplied {
        room_id: RoomId,
        turn: Seat,
        view: BoardView,
    },
    UndoRejected {
        room_id: RoomId,
    },
    DrawOffered {
        room_id: RoomId,
        seat: Seat,
    },
    DrawRejected {
        room_id: RoomId,
        seat: Seat,
    },
    NegotiationExpired {
        room_id: RoomId,
    },
    /// A seat gave up; in a multi-player checkers game the rest play on.
    Surrendered {
        room_id: RoomId,
        seat: Seat,
    },
    PlayerLeft {
        room_id: RoomId,
        seat: Seat,
    },
    RoomReset {
        room_id: RoomId,
        status: Status,
    },
    /// Private: the recipient's cards.
    Hand {
        room_id: RoomId,
        cards: Vec<Card>,
    },
    /// Private: the recipient's own fallen units.
    Casualties {
        room_id: RoomId,
        units: Vec<Unit>,
    },
    Error {
        code: ErrorCode,
        message: String,
    },
}
