//! Room registry shared by every connection handler.
//!
//! The registry maps room ids to sessions. Each session sits behind its own
//! mutex so that play in one room never waits on another; the map lock is
//! only held long enough to look up, insert, or remove an entry.

use crate::error::RoomError;
use crate::session::{GameSession, Outbound};
use log::info;
use parking_lot::{Mutex, RwLock};
use rand::Rng;
use shared::{ClientId, GameKind, RoomId};
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

/// Four-digit ids, easy to read out to a friend.
pub const ROOM_ID_RANGE: RangeInclusive<RoomId> = 1000..=9999;

pub type SharedSession = Arc<Mutex<GameSession>>;

pub struct Registry {
    rooms: RwLock<HashMap<RoomId, SharedSession>>,
    /// Random draws tried before room creation gives up
    id_attempts: usize,
}

impl Registry {
    pub fn new(id_attempts: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            id_attempts,
        }
    }

    /// Opens a room under a fresh random id with `creator` in seat 0.
    ///
    /// Ids are drawn at random from [`ROOM_ID_RANGE`]; after `id_attempts`
    /// collisions the call fails with [`RoomError::AllocationExhausted`].
    pub fn create(
        &self,
        kind: GameKind,
        creator: ClientId,
        negotiation_ttl: Duration,
        rng: &mut impl Rng,
    ) -> Result<(RoomId, Vec<Outbound>), RoomError> {
        let mut rooms = self.rooms.write();
        for _ in 0..self.id_attempts {
            let room_id = rng.gen_range(ROOM_ID_RANGE);
            if rooms.contains_key(&room_id) {
                continue;
            }
            let session = GameSession::new(room_id, kind, creator, negotiation_ttl);
            let created = session.created();
            rooms.insert(room_id, Arc::new(Mutex::new(session)));
            info!("Room {} created for {} by client {}", room_id, kind, creator);
            return Ok((room_id, created));
        }
        Err(RoomError::AllocationExhausted(self.id_attempts))
    }

    pub fn get(&self, room_id: RoomId) -> Result<SharedSession, RoomError> {
        self.rooms
            .read()
            .get(&room_id)
            .cloned()
            .ok_or(RoomError::NotFound(room_id))
    }

    /// Drops the room once its last seat is vacated.
    pub fn remove_if_empty(&self, room_id: RoomId) -> bool {
        let mut rooms = self.rooms.write();
        let empty = rooms
            .get(&room_id)
            .map(|session| session.lock().is_empty())
            .unwrap_or(false);
        if empty {
            rooms.remove(&room_id);
            info!("Room {} closed", room_id);
        }
        empty
    }

    /// Every room in which `client` holds a seat.
    pub fn rooms_with(&self, client: ClientId) -> Vec<(RoomId, SharedSession)> {
        let rooms: Vec<(RoomId, SharedSession)> = self
            .rooms
            .read()
            .iter()
            .map(|(id, session)| (*id, Arc::clone(session)))
            .collect();
        rooms
            .into_iter()
            .filter(|(_, session)| session.lock().has_client(client))
            .collect()
    }

    /// Snapshot of all sessions, for periodic sweeps.
    pub fn sessions(&self) -> Vec<SharedSession> {
        self.rooms.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rooms.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TTL: Duration = Duration::from_secs(60);

    #[test]
    fn test_create_and_get() {
        let registry = Registry::new(10);
        let mut rng = StdRng::seed_from_u64(7);
        let (room_id, created) = registry.create(GameKind::Go, 1, TTL, &mut rng).unwrap();

        assert!(ROOM_ID_RANGE.contains(&room_id));
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].to, 1);
        assert_eq!(registry.len(), 1);

        let session = registry.get(room_id).unwrap();
        assert_eq!(session.lock().kind(), GameKind::Go);
        assert!(matches!(registry.get(1), Err(RoomError::NotFound(1))));
    }

    #[test]
    fn test_allocation_exhausted_on_collisions() {
        let registry = Registry::new(3);
        // A constant generator draws the same id every time.
        let mut rng = StepRng::new(0, 0);
        registry.create(GameKind::Gobang, 1, TTL, &mut rng).unwrap();

        let err = registry.create(GameKind::Gobang, 2, TTL, &mut rng).unwrap_err();
        assert_eq!(err, RoomError::AllocationExhausted(3));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_if_empty() {
        let registry = Registry::new(10);
        let mut rng = StdRng::seed_from_u64(7);
        let (room_id, _) = registry.create(GameKind::Chess, 1, TTL, &mut rng).unwrap();

        assert!(!registry.remove_if_empty(room_id));
        registry.get(room_id).unwrap().lock().leave(1).unwrap();
        assert!(registry.remove_if_empty(room_id));
        assert!(registry.is_empty());
        assert!(!registry.remove_if_empty(room_id));
    }

    #[test]
    fn test_rooms_with_client() {
        let registry = Registry::new(10);
        let mut rng = StdRng::seed_from_u64(7);
        let (first, _) = registry.create(GameKind::Go, 1, TTL, &mut rng).unwrap();
        let (second, _) = registry.create(GameKind::Othello, 2, TTL, &mut rng).unwrap();
        registry
            .get(second)
            .unwrap()
            .lock()
            .join(1, None, &mut rng)
            .unwrap();

        let mut ids: Vec<RoomId> = registry.rooms_with(1).into_iter().map(|(id, _)| id).collect();
        ids.sort_unstable();
        let mut expected = vec![first, second];
        expected.sort_unstable();
        assert_eq!(ids, expected);
        assert_eq!(registry.rooms_with(2).len(), 1);
        assert!(registry.rooms_with(3).is_empty());
    }
}
