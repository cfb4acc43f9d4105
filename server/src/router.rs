//! Turns decoded commands into session operations.
//!
//! The router resolves the target room through the registry, runs the
//! operation under that room's lock, and converts rejections into an
//! `Error` event addressed to the requester only. A panic inside a session
//! is contained here and reported as an internal error.

use crate::error::RoomError;
use crate::registry::{Registry, SharedSession};
use crate::session::Outbound;
use log::{debug, error, warn};
use rand::Rng;
use shared::protocol::ErrorCode;
use shared::{ClientId, Command, Event, RoomId};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct Router {
    registry: Arc<Registry>,
    negotiation_ttl: Duration,
}

impl Router {
    pub fn new(registry: Arc<Registry>, negotiation_ttl: Duration) -> Self {
        Self {
            registry,
            negotiation_ttl,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Executes one command and returns every event it produced.
    pub fn dispatch(&self, client: ClientId, command: Command, rng: &mut impl Rng, now: Instant) -> Vec<Outbound> {
        debug!("Client {} sent {:?}", client, command);
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.execute(client, &command, rng, now)));
        match result {
            Ok(Ok(events)) => events,
            Ok(Err(err)) => {
                match command.room_id() {
                    Some(room_id) => warn!("Client {} command rejected in room {}: {}", client, room_id, err),
                    None => warn!("Client {} command rejected: {}", client, err),
                }
                vec![Outbound {
                    to: client,
                    event: Event::Error {
                        code: err.code(),
                        message: err.to_string(),
                    },
                }]
            }
            Err(_) => {
                error!("Internal failure while handling {:?} from client {}", command, client);
                vec![Outbound {
                    to: client,
                    event: Event::Error {
                        code: ErrorCode::Internal,
                        message: "internal server error".to_string(),
                    },
                }]
            }
        }
    }

    /// Releases every seat `client` holds, forfeiting games in progress.
    pub fn disconnect(&self, client: ClientId) -> Vec<Outbound> {
        let mut out = Vec::new();
        for (room_id, session) in self.registry.rooms_with(client) {
            match session.lock().leave(client) {
                Ok(events) => out.extend(events),
                Err(err) => warn!("Client {} could not leave room {}: {}", client, room_id, err),
            }
            self.registry.remove_if_empty(room_id);
        }
        out
    }

    /// Cancels negotiations that outlived their TTL in every room.
    pub fn expire_negotiations(&self, now: Instant) -> Vec<Outbound> {
        self.registry
            .sessions()
            .iter()
            .flat_map(|session| session.lock().expire_negotiation(now))
            .collect()
    }

    fn execute(
        &self,
        client: ClientId,
        command: &Command,
        rng: &mut impl Rng,
        now: Instant,
    ) -> Result<Vec<Outbound>, RoomError> {
        match command {
            Command::CreateRoom { kind } => {
                let (_, created) = self.registry.create(*kind, client, self.negotiation_ttl, rng)?;
                Ok(created)
            }
            Command::JoinRoom { room_id, kind } => {
                let (_, out) = self.room(*room_id)?.lock().join(client, *kind, rng)?;
                Ok(out)
            }
            Command::ChooseSide { room_id, preference } => {
                self.room(*room_id)?.lock().choose_side(client, *preference, rng)
            }
            Command::StartGame { room_id } => self.room(*room_id)?.lock().start_game(client),
            Command::Arrange { room_id, placements } => self.room(*room_id)?.lock().arrange(client, placements),
            Command::Move { room_id, request } => self.room(*room_id)?.lock().submit_move(client, request),
            Command::RequestUndo { room_id } => self.room(*room_id)?.lock().request_undo(client, now),
            Command::RespondUndo { room_id, approve } => self.room(*room_id)?.lock().respond_undo(client, *approve),
            Command::RequestDraw { room_id } => self.room(*room_id)?.lock().request_draw(client, now),
            Command::RespondDraw { room_id, approve } => self.room(*room_id)?.lock().respond_draw(client, *approve),
            Command::Surrender { room_id } => self.room(*room_id)?.lock().surrender(client),
            Command::Leave { room_id } => {
                let out = self.room(*room_id)?.lock().leave(client)?;
                self.registry.remove_if_empty(*room_id);
                Ok(out)
            }
            Command::PlayAgain { room_id } => self.room(*room_id)?.lock().reset(client, rng),
        }
    }

    fn room(&self, room_id: RoomId) -> Result<SharedSession, RoomError> {
        self.registry.get(room_id)
    }
}
