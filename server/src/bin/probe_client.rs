//! Smoke-test client: seats two players in a fresh room and plays through setup.
//!
//! For gobang the first player then wins with five in a row; for every other
//! game the first player surrenders once play begins.

use bincode::{deserialize, serialize};
use clap::Parser;
use log::{info, warn};
use shared::games::military::default_deployment;
use shared::{
    ClientId, Command, Event, GameKind, MoveRequest, Outcome, Packet, Pos, RoomId, Seat, SidePreference, MAX_PACKET_SIZE,
    PROTOCOL_VERSION,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server address
    #[clap(short, long, default_value = "127.0.0.1:8080")]
    server: SocketAddr,
    /// Game to play: gobang, go, othello, xiangqi, chess, checkers, military, cards
    #[clap(short, long, default_value = "gobang")]
    kind: GameKind,
}

struct Player {
    name: &'static str,
    socket: UdpSocket,
    server: SocketAddr,
    client_id: ClientId,
    seat: Option<Seat>,
    room_id: Option<RoomId>,
}

impl Player {
    async fn connect(name: &'static str, server: SocketAddr) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let mut player = Player {
            name,
            socket,
            server,
            client_id: 0,
            seat: None,
            room_id: None,
        };
        player.send(&Packet::Connect { client_version: PROTOCOL_VERSION }).await?;
        match player.recv(Duration::from_secs(2)).await? {
            Some(Packet::Connected { client_id }) => {
                info!("{} connected as client {}", name, client_id);
                player.client_id = client_id;
                Ok(player)
            }
            other => Err(format!("{} was not accepted: {:?}", name, other).into()),
        }
    }

    async fn send(&self, packet: &Packet) -> Result<(), Box<dyn std::error::Error>> {
        self.socket.send_to(&serialize(packet)?, self.server).await?;
        Ok(())
    }

    async fn command(&self, command: Command) -> Result<(), Box<dyn std::error::Error>> {
        self.send(&Packet::Command(command)).await
    }

    async fn recv(&self, wait: Duration) -> Result<Option<Packet>, Box<dyn std::error::Error>> {
        let mut buffer = vec![0u8; MAX_PACKET_SIZE];
        match timeout(wait, self.socket.recv_from(&mut buffer)).await {
            Ok(received) => {
                let (len, _) = received?;
                Ok(Some(deserialize(&buffer[..len])?))
            }
            Err(_) => Ok(None),
        }
    }

    /// Prints everything the server has sent, tracking room and seat.
    async fn drain(&mut self) -> Result<Vec<Event>, Box<dyn std::error::Error>> {
        let mut events = Vec::new();
        while let Some(packet) = self.recv(Duration::from_millis(300)).await? {
            let event = match packet {
                Packet::Event(event) => event,
                other => {
                    warn!("{} received {:?}", self.name, other);
                    continue;
                }
            };
            match &event {
                Event::RoomCreated { room_id, seat, .. } | Event::Joined { room_id, seat, .. } => {
                    self.room_id = Some(*room_id);
                    self.seat = Some(*seat);
                }
                Event::SeatsAssigned { seats, .. } => {
                    self.seat = seats.iter().position(|c| *c == Some(self.client_id));
                }
                Event::GameStarted { turn, .. } => println!("[{}] game started, seat {} to move", self.name, turn),
                Event::GameOver { outcome, .. } => {
                    let result = match (outcome, self.seat) {
                        (Outcome::Draw, _) => "draw",
                        (outcome, Some(seat)) if outcome.is_winner(seat) => "won",
                        _ => "lost",
                    };
                    println!("[{}] game over: {:?} ({})", self.name, outcome, result);
                }
                Event::Error { code, message } => println!("[{}] error {}: {}", self.name, code, message),
                other => println!("[{}] {:?}", self.name, summary(other)),
            }
            events.push(event);
        }
        Ok(events)
    }
}

/// Board views are large; keep the log readable.
fn summary(event: &Event) -> String {
    let text = format!("{:?}", event);
    match text.char_indices().nth(120) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut host = Player::connect("host", args.server).await?;
    let mut guest = Player::connect("guest", args.server).await?;

    host.command(Command::CreateRoom { kind: args.kind }).await?;
    host.drain().await?;
    let room_id = host.room_id.ok_or("room was not created")?;
    println!("Room {} hosts {}", room_id, args.kind);

    guest
        .command(Command::JoinRoom {
            room_id,
            kind: Some(args.kind),
        })
        .await?;
    guest.drain().await?;
    host.drain().await?;

    if args.kind == GameKind::Checkers {
        host.command(Command::StartGame { room_id }).await?;
    } else {
        if args.kind == GameKind::Cards {
            let mut third = Player::connect("third", args.server).await?;
            third.command(Command::JoinRoom { room_id, kind: None }).await?;
            third.drain().await?;
            third
                .command(Command::ChooseSide {
                    room_id,
                    preference: SidePreference::Second,
                })
                .await?;
            third.drain().await?;
        }
        for (player, preference) in [&host, &guest].into_iter().zip([SidePreference::First, SidePreference::Second]) {
            player.command(Command::ChooseSide { room_id, preference }).await?;
        }
    }
    host.drain().await?;
    guest.drain().await?;

    if args.kind == GameKind::Military {
        for player in [&mut host, &mut guest] {
            let seat = player.seat.ok_or("seat unknown")?;
            player
                .command(Command::Arrange {
                    room_id,
                    placements: default_deployment(seat),
                })
                .await?;
        }
        host.drain().await?;
        guest.drain().await?;
    }

    if args.kind != GameKind::Gobang {
        host.command(Command::Surrender { room_id }).await?;
        host.drain().await?;
        guest.drain().await?;
        return Ok(());
    }

    let (first, second) = if host.seat == Some(0) {
        (&mut host, &mut guest)
    } else {
        (&mut guest, &mut host)
    };
    for col in 0..5 {
        first
            .command(Command::Move {
                room_id,
                request: MoveRequest::Place(Pos::new(7, col)),
            })
            .await?;
        first.drain().await?;
        if col < 4 {
            second
                .command(Command::Move {
                    room_id,
                    request: MoveRequest::Place(Pos::new(8, col)),
                })
                .await?;
            second.drain().await?;
        }
    }
    first.drain().await?;
    second.drain().await?;

    for player in [&host, &guest] {
        player.send(&Packet::Disconnect).await?;
    }
    Ok(())
}
