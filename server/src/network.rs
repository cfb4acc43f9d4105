//! Server network layer: UDP transport, connection handshake, and the main loop
//!
//! Three background tasks feed the main loop over channels: a receiver that
//! decodes datagrams, a sender that drains the outgoing queue, and a timeout
//! checker that sweeps silent clients. The main loop owns the router and
//! routes every decoded command to it, delivering the resulting events to
//! the addresses of their recipients.

use crate::client_manager::ClientManager;
use crate::config::ServerConfig;
use crate::registry::Registry;
use crate::router::Router;
use crate::session::Outbound;
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{ClientId, Command, Packet, MAX_PACKET_SIZE, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::interval;

/// Messages sent from network tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    /// A datagram that decoded into a packet
    PacketReceived { packet: Packet, addr: SocketAddr },
    /// A client the sweep found silent for too long
    ClientTimeout { client_id: ClientId },
    /// Stops the main loop after notifying connected clients
    Shutdown,
}

/// Messages sent from the main loop to the sender task
#[derive(Debug)]
pub enum GameMessage {
    SendPacket { packet: Packet, addr: SocketAddr },
}

/// UDP front end of the game hall
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    router: Router,
    config: ServerConfig,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: mpsc::UnboundedReceiver<GameMessage>,
}

impl Server {
    /// Binds the UDP socket and sets up the empty room registry
    pub async fn new(config: ServerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(config.bind_addr()).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();
        let registry = Arc::new(Registry::new(config.room_id_attempts));

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(
                config.max_clients,
                config.client_timeout(),
            ))),
            router: Router::new(registry, config.negotiation_ttl()),
            config,
            server_tx,
            server_rx,
            game_tx,
            game_rx,
        })
    }

    /// Address the socket actually bound, useful when the port was 0
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// A sender into the main loop, e.g. for requesting shutdown.
    pub fn handle(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    /// Spawns task that continuously listens for incoming packets
    async fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = vec![0u8; MAX_PACKET_SIZE];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[..len]) {
                            if let Err(e) = server_tx.send(ServerMessage::PacketReceived { packet, addr }) {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that processes the outgoing packet queue
    async fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let mut game_rx = std::mem::replace(&mut self.game_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                }
            }
        });
    }

    /// Spawns task that monitors client timeouts
    async fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();
        let period = self.config.sweep_interval();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts()
                };

                for client_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { client_id }) {
                        error!("Failed to send timeout message: {}", e);
                        return;
                    }
                }
            }
        });
    }

    /// Encodes and writes a single packet to the socket
    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        if data.len() > MAX_PACKET_SIZE {
            warn!("Packet of {} bytes to {} exceeds the datagram limit", data.len(), addr);
        }
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    /// Queues a packet for the sender task
    fn send_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::SendPacket { packet, addr }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    /// Sends each event to its recipient, skipping clients that are gone
    async fn deliver(&self, events: Vec<Outbound>) {
        if events.is_empty() {
            return;
        }
        let clients = self.clients.read().await;
        for Outbound { to, event } in events {
            match clients.addr_of(to) {
                Some(addr) => self.send_packet(Packet::Event(event), addr),
                None => debug!("Dropping event for departed client {}", to),
            }
        }
    }

    /// Resolves the sender of a packet to its client id
    async fn client_at(&self, addr: SocketAddr) -> Option<ClientId> {
        self.clients.read().await.find_client_by_addr(addr)
    }

    /// Processes incoming packets: handshake, heartbeats, commands, and disconnects
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Connect { client_version } => {
                info!("Client connecting from {} (version: {})", addr, client_version);

                if client_version != PROTOCOL_VERSION {
                    self.send_packet(
                        Packet::Disconnected {
                            reason: "Protocol version mismatch".to_string(),
                        },
                        addr,
                    );
                    return;
                }

                if let Some(existing_id) = self.client_at(addr).await {
                    info!("Removing existing client {} from {}", existing_id, addr);
                    self.drop_client(existing_id).await;
                }

                let client_id = {
                    let mut clients = self.clients.write().await;
                    clients.add_client(addr)
                };

                let response = match client_id {
                    Some(client_id) => Packet::Connected { client_id },
                    None => Packet::Disconnected {
                        reason: "Server full".to_string(),
                    },
                };
                self.send_packet(response, addr);
            }

            Packet::Heartbeat => {
                if let Some(client_id) = self.client_at(addr).await {
                    self.clients.write().await.touch(client_id);
                }
            }

            Packet::Command(command) => {
                let Some(client_id) = self.client_at(addr).await else {
                    warn!("Command from unconnected address {}", addr);
                    self.send_packet(
                        Packet::Disconnected {
                            reason: "Not connected".to_string(),
                        },
                        addr,
                    );
                    return;
                };
                self.clients.write().await.touch(client_id);
                let events = self.route(client_id, command);
                self.deliver(events).await;
            }

            Packet::Disconnect => {
                if let Some(client_id) = self.client_at(addr).await {
                    self.drop_client(client_id).await;
                }
            }

            _ => {
                warn!("Unexpected packet type from client at {}", addr);
            }
        }
    }

    /// Hands a command to the router with a fresh random source and the current time
    fn route(&self, client_id: ClientId, command: Command) -> Vec<Outbound> {
        let mut rng = rand::thread_rng();
        self.router.dispatch(client_id, command, &mut rng, Instant::now())
    }

    /// Releases the client's seats first so remaining players still hear about it
    async fn drop_client(&self, client_id: ClientId) {
        let events = self.router.disconnect(client_id);
        self.deliver(events).await;
        self.clients.write().await.remove_client(&client_id);
    }

    /// Tells every connected client the server is going away
    ///
    /// Written straight to the socket since the sender task may not get
    /// another chance to run once the main loop returns.
    async fn notify_shutdown(&self) {
        let clients = self.clients.read().await.get_client_addrs();
        let packet = Packet::Disconnected {
            reason: "Server shutting down".to_string(),
        };
        for (client_id, addr) in clients {
            if let Err(e) = Self::send_packet_impl(&self.socket, &packet, addr).await {
                warn!("Failed to notify client {} of shutdown: {}", client_id, e);
            }
        }
    }

    /// Main server loop coordinating packets, timeouts, and negotiation expiry
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver().await;
        self.spawn_network_sender().await;
        self.spawn_timeout_checker().await;

        let mut sweep = interval(self.config.sweep_interval());

        info!("Server started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        },
                        Some(ServerMessage::ClientTimeout { client_id }) => {
                            info!("Client {} timed out", client_id);
                            let events = self.router.disconnect(client_id);
                            self.deliver(events).await;
                        },
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            self.notify_shutdown().await;
                            break;
                        }
                    }
                },

                _ = sweep.tick() => {
                    let events = self.router.expire_negotiations(Instant::now());
                    self.deliver(events).await;

                    let rooms = self.router.registry().len();
                    if rooms > 0 {
                        debug!("{} clients, {} rooms", self.clients.read().await.len(), rooms);
                    }
                },
            }
        }

        Ok(())
    }
}
