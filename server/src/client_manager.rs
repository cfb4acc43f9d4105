//! Connection bookkeeping for the game hall
//!
//! Every UDP peer that completes the handshake gets a client id. The manager
//! maps ids to addresses for replies and tracks when each peer was last heard
//! from, so silent peers can be swept and their seats released.

use log::info;
use shared::ClientId;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// A connected peer
#[derive(Debug)]
pub struct Client {
    /// Identifier assigned by the server, used as the player identity in rooms
    pub id: ClientId,
    /// Where replies and room events are sent
    pub addr: SocketAddr,
    /// Last time any packet arrived from this peer
    pub last_seen: Instant,
}

impl Client {
    /// Creates a client record for a peer that just completed the handshake
    ///
    /// The peer counts as active from this moment, so a fresh connection is
    /// never swept before its first heartbeat is due.
    pub fn new(id: ClientId, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
        }
    }

    /// Records activity from the peer
    ///
    /// Called for heartbeats and for every routed command, so any traffic
    /// keeps the connection alive.
    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    /// Checks if the peer has exceeded the connection timeout
    ///
    /// Returns true when nothing has been heard from the peer within
    /// `timeout`, which the sweep treats as a disconnect.
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Tracks all connected peers and enforces the connection limit
///
/// Heartbeats and commands both refresh a client's activity timestamp; the
/// periodic sweep removes anyone silent for longer than `timeout`.
pub struct ClientManager {
    clients: HashMap<ClientId, Client>,
    /// Ids start at 1 and are never reused within a server run
    next_client_id: ClientId,
    max_clients: usize,
    timeout: Duration,
}

impl ClientManager {
    /// Creates an empty manager
    ///
    /// `max_clients` caps concurrent connections and `timeout` is how long a
    /// peer may stay silent before `check_timeouts` drops it.
    pub fn new(max_clients: usize, timeout: Duration) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
            timeout,
        }
    }

    /// Registers a new peer
    ///
    /// Assigns the next unused client id and starts tracking the peer's
    /// address. Returns `None` when the server is at capacity, in which case
    /// the caller answers the handshake with a refusal.
    pub fn add_client(&mut self, addr: SocketAddr) -> Option<ClientId> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!("Client {} connected from {}", client_id, addr);
        self.clients.insert(client_id, Client::new(client_id, addr));

        Some(client_id)
    }

    /// Forgets a peer
    ///
    /// Returns false if it was already gone, which happens when an explicit
    /// disconnect races the timeout sweep. Seats the client held are released
    /// by the router, not here.
    pub fn remove_client(&mut self, client_id: &ClientId) -> bool {
        if let Some(client) = self.clients.remove(client_id) {
            info!("Client {} disconnected", client.id);
            true
        } else {
            false
        }
    }

    /// Looks up the client id bound to a network address
    ///
    /// Every packet after the handshake is attributed to a client this way;
    /// packets from unknown addresses are refused.
    pub fn find_client_by_addr(&self, addr: SocketAddr) -> Option<ClientId> {
        self.clients
            .iter()
            .find(|(_, client)| client.addr == addr)
            .map(|(id, _)| *id)
    }

    /// Returns the address events for `client_id` should be sent to
    ///
    /// `None` once the client has disconnected or timed out, so late room
    /// events for it are dropped.
    pub fn addr_of(&self, client_id: ClientId) -> Option<SocketAddr> {
        self.clients.get(&client_id).map(|client| client.addr)
    }

    /// Refreshes the activity timestamp
    ///
    /// Returns false for unknown ids, e.g. a heartbeat that arrives after the
    /// sweep already removed the client.
    pub fn touch(&mut self, client_id: ClientId) -> bool {
        match self.clients.get_mut(&client_id) {
            Some(client) => {
                client.touch();
                true
            }
            None => false,
        }
    }

    /// Removes and returns every client that has been silent too long
    ///
    /// Run periodically by the timeout task. The returned ids are forwarded
    /// to the main loop, which vacates their seats as if they had left.
    pub fn check_timeouts(&mut self) -> Vec<ClientId> {
        let timeout = self.timeout;
        let timed_out: Vec<ClientId> = self
            .clients
            .iter()
            .filter(|(_, client)| client.is_timed_out(timeout))
            .map(|(id, _)| *id)
            .collect();

        for client_id in &timed_out {
            self.remove_client(client_id);
        }

        timed_out
    }

    /// Returns every connected client with its address
    pub fn get_client_addrs(&self) -> Vec<(ClientId, SocketAddr)> {
        self.clients
            .iter()
            .map(|(id, client)| (*id, client.addr))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
