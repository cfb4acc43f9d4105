//! Rules and wire types shared by the game hall server and its clients.
//!
//! The `games` module holds one pure rule oracle per game kind; nothing in
//! this crate performs I/O. [`Packet`] is the datagram envelope exchanged
//! over UDP, framed with bincode.

pub mod board;
pub mod games;
pub mod kind;
pub mod protocol;

use serde::{Deserialize, Serialize};

pub use board::{Grid, Pos, Seat, Stone};
pub use games::{
    Board, BoardView, MoveError, MoveRecord, MoveReport, MoveRequest, Oracle, PieceMove, Played,
    TurnChange,
};
pub use kind::{GameKind, Outcome, SidePreference, Status};
pub use protocol::{ClientId, Command, ErrorCode, Event, RoomId};

pub const PROTOCOL_VERSION: u32 = 1;

/// Largest datagram either side sends or accepts.
pub const MAX_PACKET_SIZE: usize = 8192;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum Packet {
    Connect {
        client_version: u32,
    },
    Heartbeat,
    Command(Command),
    Disconnect,

    Connected {
        client_id: ClientId,
    },
    Event(Event),
    Disconnected {
        reason: String,
    },
}
