//! One room: seats, the lifecycle, turn order, and undo/draw negotiation.
//!
//! Every operation takes the acting client, validates it against the current
//! state, and either fails without touching anything or applies the change
//! and returns the events to deliver. Sessions never perform I/O.

use crate::error::RoomError;
use log::{debug, info};
use rand::Rng;
use shared::games::cards::choose_landlord;
use shared::games::checkers;
use shared::games::military::Placement;
use shared::games::MoveRecord;
use shared::{
    Board, ClientId, Event, GameKind, MoveRequest, Outcome, RoomId, Seat, SidePreference, Status,
    TurnChange,
};
use std::time::{Duration, Instant};

/// An event addressed to one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub to: ClientId,
    pub event: Event,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationKind {
    Undo,
    Draw,
}

#[derive(Debug, Clone)]
struct Negotiation {
    kind: NegotiationKind,
    requester: Seat,
    approvals: Vec<Seat>,
    opened_at: Instant,
}

#[derive(Debug)]
pub struct GameSession {
    room_id: RoomId,
    kind: GameKind,
    seats: Vec<Option<ClientId>>,
    status: Status,
    board: Board,
    history: Vec<MoveRecord>,
    turn: Seat,
    participants: Vec<Seat>,
    preferences: Vec<Option<SidePreference>>,
    pending: Option<Negotiation>,
    last_undoer: Option<Seat>,
    outcome: Option<Outcome>,
    negotiation_ttl: Duration,
}

impl GameSession {
    /// Opens a room with `creator` in seat 0.
    pub fn new(room_id: RoomId, kind: GameKind, creator: ClientId, negotiation_ttl: Duration) -> Self {
        let mut seats = vec![None; kind.seat_count()];
        seats[0] = Some(creator);
        Self {
            room_id,
            kind,
            seats,
            status: Status::Forming,
            board: Board::new(kind),
            history: Vec::new(),
            turn: 0,
            participants: Vec::new(),
            preferences: vec![None; kind.seat_count()],
            pending: None,
            last_undoer: None,
            outcome: None,
            negotiation_ttl,
        }
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn kind(&self) -> GameKind {
        self.kind
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn turn(&self) -> Seat {
        self.turn
    }

    pub fn seats(&self) -> &[Option<ClientId>] {
        &self.seats
    }

    pub fn participants(&self) -> &[Seat] {
        &self.participants
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn last_undoer(&self) -> Option<Seat> {
        self.last_undoer
    }

    pub fn pending_negotiation(&self) -> Option<NegotiationKind> {
        self.pending.as_ref().map(|p| p.kind)
    }

    pub fn seat_of(&self, client: ClientId) -> Option<Seat> {
        self.seats.iter().position(|seated| *seated == Some(client))
    }

    pub fn has_client(&self, client: ClientId) -> bool {
        self.seat_of(client).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.iter().all(Option::is_none)
    }

    /// The confirmation sent to the creator.
    pub fn created(&self) -> Vec<Outbound> {
        self.occupied()
            .map(|(seat, to)| Outbound {
                to,
                event: Event::RoomCreated {
                    room_id: self.room_id,
                    kind: self.kind,
                    seat,
                },
            })
            .collect()
    }

    pub fn join(
        &mut self,
        client: ClientId,
        expected: Option<GameKind>,
        rng: &mut impl Rng,
    ) -> Result<(Seat, Vec<Outbound>), RoomError> {
        if let Some(expected) = expected.filter(|kind| *kind != self.kind) {
            return Err(RoomError::KindMismatch {
                expected,
                actual: self.kind,
            });
        }
        if let Some(seat) = self.seat_of(client) {
            return Ok((seat, vec![self.joined(seat, client)]));
        }
        if self.status != Status::Forming {
            return Err(RoomError::RoomFull);
        }
        let seat = self.open_seat().ok_or(RoomError::RoomFull)?;
        self.seats[seat] = Some(client);
        info!("Client {} joined room {} as {}", client, self.room_id, self.kind.role(seat));

        let mut out = vec![self.joined(seat, client)];
        out.extend(self.others(
            seat,
            Event::PlayerJoined {
                room_id: self.room_id,
                seat,
                client_id: client,
            },
        ));
        if self.kind.has_side_choice() && self.seats.iter().all(Option::is_some) {
            out.extend(self.begin_side_choice(rng));
        }
        Ok((seat, out))
    }

    pub fn choose_side(
        &mut self,
        client: ClientId,
        preference: SidePreference,
        rng: &mut impl Rng,
    ) -> Result<Vec<Outbound>, RoomError> {
        let seat = self.seat(client)?;
        match self.status {
            Status::AwaitingSideChoice => {}
            Status::Forming => return Err(RoomError::NotStarted),
            Status::Ended => return Err(RoomError::GameEnded),
            Status::Arranging | Status::InProgress => return Err(RoomError::GameInProgress),
        }

        self.preferences[seat] = Some(preference);
        let mut out = self.broadcast(Event::SideChosen {
            room_id: self.room_id,
            seat,
        });
        let chosen: Option<Vec<SidePreference>> = self.preferences.iter().copied().collect();
        if let Some(chosen) = chosen {
            out.extend(self.settle_sides(&chosen, rng));
        }
        Ok(out)
    }

    /// Checkers only: the host starts the game with whoever is seated.
    pub fn start_game(&mut self, client: ClientId) -> Result<Vec<Outbound>, RoomError> {
        let seat = self.seat(client)?;
        if self.kind != GameKind::Checkers {
            return Err(RoomError::Unsupported(self.kind));
        }
        match self.status {
            Status::Forming => {}
            Status::Ended => return Err(RoomError::GameEnded),
            _ => return Err(RoomError::GameInProgress),
        }
        let players: Vec<Seat> = self.occupied().map(|(seat, _)| seat).collect();
        if players.first() != Some(&seat) {
            return Err(RoomError::NotHost);
        }
        if players.len() < self.kind.min_players() {
            return Err(RoomError::NotEnoughPlayers(self.kind.min_players()));
        }

        if let Some(board) = self.board.checkers_mut() {
            board.seat_players(&players);
        }
        let turn = players[0];
        Ok(self.start_play(players, turn))
    }

    /// Military only: stores one side's deployment.
    pub fn arrange(&mut self, client: ClientId, placements: &[Placement]) -> Result<Vec<Outbound>, RoomError> {
        let seat = self.seat(client)?;
        let kind = self.kind;
        if !kind.has_arrangement() {
            return Err(RoomError::Unsupported(kind));
        }
        match self.status {
            Status::Arranging => {}
            Status::InProgress => return Err(RoomError::GameInProgress),
            Status::Ended => return Err(RoomError::GameEnded),
            Status::Forming | Status::AwaitingSideChoice => return Err(RoomError::NotStarted),
        }

        let board = self.board.military_mut().ok_or(RoomError::Unsupported(kind))?;
        board.deploy(seat, placements)?;
        let ready = board.fully_deployed();
        info!("Room {}: {} deployed", self.room_id, kind.role(seat));

        let mut out = self.broadcast(Event::Arranged {
            room_id: self.room_id,
            seat,
        });
        if ready {
            out.extend(self.start_play(vec![0, 1], 0));
        }
        Ok(out)
    }

    pub fn submit_move(&mut self, client: ClientId, request: &MoveRequest) -> Result<Vec<Outbound>, RoomError> {
        let seat = self.seat(client)?;
        self.require_in_progress()?;
        self.require_participant(seat)?;
        if seat != self.turn {
            return Err(RoomError::NotYourTurn);
        }

        let played = self.board.play(seat, request)?;
        debug!("Room {}: seat {} played {:?}", self.room_id, seat, request);

        let room_id = self.room_id;
        let report = self.board.report(&played.record);
        let battle = matches!(&played.record, MoveRecord::Military(record) if record.battle.is_some());
        self.history.push(played.record);

        let mut out = Vec::new();
        if self.pending.take().is_some() {
            out.extend(self.broadcast(Event::NegotiationExpired { room_id }));
        }
        out.extend(self.broadcast(Event::MoveMade { room_id, report }));
        out.extend(self.private_updates(battle));

        if let Some(outcome) = played.outcome {
            out.extend(self.finish(outcome));
            return Ok(out);
        }

        self.turn = match played.turn {
            TurnChange::Again => seat,
            TurnChange::Next => self.next_participant(seat),
        };
        if played.check {
            out.extend(self.broadcast(Event::Check {
                room_id,
                seat: self.turn,
            }));
        }
        out.extend(self.broadcast(Event::TurnChanged {
            room_id,
            turn: self.turn,
        }));
        Ok(out)
    }

    pub fn request_undo(&mut self, client: ClientId, now: Instant) -> Result<Vec<Outbound>, RoomError> {
        let seat = self.seat(client)?;
        if !self.kind.supports_undo() {
            return Err(RoomError::Unsupported(self.kind));
        }
        self.require_in_progress()?;
        self.require_participant(seat)?;
        if self.pending.is_some() {
            return Err(RoomError::NegotiationConflict);
        }
        let last = self.history.last().ok_or(RoomError::UndoUnavailable)?;
        if last.seat() != seat || self.turn == seat {
            return Err(RoomError::UndoUnavailable);
        }
        if self.last_undoer == Some(seat) {
            return Err(RoomError::ConsecutiveUndoDenied);
        }

        self.pending = Some(Negotiation {
            kind: NegotiationKind::Undo,
            requester: seat,
            approvals: Vec::new(),
            opened_at: now,
        });
        Ok(self.broadcast(Event::UndoRequested {
            room_id: self.room_id,
            seat,
        }))
    }

    /// Answered by the seat on turn.
    pub fn respond_undo(&mut self, client: ClientId, approve: bool) -> Result<Vec<Outbound>, RoomError> {
        let seat = self.seat(client)?;
        self.require_in_progress()?;
        let requester = match &self.pending {
            Some(pending) if pending.kind == NegotiationKind::Undo => pending.requester,
            _ => return Err(RoomError::NoPendingRequest),
        };
        if seat != self.turn {
            return Err(RoomError::NegotiationConflict);
        }
        let room_id = self.room_id;

        if !approve {
            self.pending = None;
            return Ok(self.broadcast(Event::UndoRejected { room_id }));
        }

        let record = self.history.pop().ok_or(RoomError::UndoUnavailable)?;
        if let Err(err) = self.board.revert(&record) {
            self.history.push(record);
            return Err(err.into());
        }
        self.pending = None;
        self.turn = record.seat();
        self.last_undoer = Some(requester);
        info!("Room {}: undo by seat {} accepted", room_id, requester);

        let turn = self.turn;
        let board = &self.board;
        Ok(self.personal(|seat| Event::UndoApplied {
            room_id,
            turn,
            view: board.view(Some(seat)),
        }))
    }

    pub fn request_draw(&mut self, client: ClientId, now: Instant) -> Result<Vec<Outbound>, RoomError> {
        let seat = self.seat(client)?;
        self.require_in_progress()?;
        self.require_participant(seat)?;
        if self.pending.is_some() {
            return Err(RoomError::NegotiationConflict);
        }

        self.pending = Some(Negotiation {
            kind: NegotiationKind::Draw,
            requester: seat,
            approvals: vec![seat],
            opened_at: now,
        });
        Ok(self.broadcast(Event::DrawOffered {
            room_id: self.room_id,
            seat,
        }))
    }

    /// Every other participant must approve; one refusal cancels the offer.
    pub fn respond_draw(&mut self, client: ClientId, approve: bool) -> Result<Vec<Outbound>, RoomError> {
        let seat = self.seat(client)?;
        self.require_in_progress()?;
        let pending = match self.pending.as_mut() {
            Some(pending) if pending.kind == NegotiationKind::Draw => pending,
            _ => return Err(RoomError::NoPendingRequest),
        };
        if pending.approvals.contains(&seat) || !self.participants.contains(&seat) {
            return Err(RoomError::NegotiationConflict);
        }

        if !approve {
            self.pending = None;
            return Ok(self.broadcast(Event::DrawRejected {
                room_id: self.room_id,
                seat,
            }));
        }

        pending.approvals.push(seat);
        let agreed = self.participants.iter().all(|s| pending.approvals.contains(s));
        if agreed {
            Ok(self.finish(Outcome::Draw))
        } else {
            Ok(Vec::new())
        }
    }

    pub fn surrender(&mut self, client: ClientId) -> Result<Vec<Outbound>, RoomError> {
        let seat = self.seat(client)?;
        match self.status {
            Status::InProgress | Status::Arranging => {}
            Status::Ended => return Err(RoomError::GameEnded),
            Status::Forming | Status::AwaitingSideChoice => return Err(RoomError::NotStarted),
        }
        self.require_participant(seat)?;
        Ok(self.forfeit(seat))
    }

    /// Vacates the caller's seat. During play this forfeits.
    pub fn leave(&mut self, client: ClientId) -> Result<Vec<Outbound>, RoomError> {
        let seat = self.seat(client)?;
        let room_id = self.room_id;
        let mut out = Vec::new();
        if self.pending.take().is_some() {
            out.extend(self.broadcast(Event::NegotiationExpired { room_id }));
        }

        match self.status {
            Status::InProgress | Status::Arranging if self.participants.contains(&seat) => {
                out.extend(self.forfeit(seat));
            }
            Status::AwaitingSideChoice => {
                self.status = Status::Forming;
                self.preferences = vec![None; self.seats.len()];
                self.board = Board::new(self.kind);
            }
            _ => {}
        }

        out.extend(self.broadcast(Event::PlayerLeft { room_id, seat }));
        self.seats[seat] = None;
        info!("Client {} left room {}", client, room_id);
        Ok(out)
    }

    /// Starts a new game in place, keeping everyone seated.
    pub fn reset(&mut self, client: ClientId, rng: &mut impl Rng) -> Result<Vec<Outbound>, RoomError> {
        self.seat(client)?;
        if matches!(self.status, Status::InProgress | Status::Arranging) {
            return Err(RoomError::GameInProgress);
        }

        self.board = Board::new(self.kind);
        self.history.clear();
        self.outcome = None;
        self.pending = None;
        self.last_undoer = None;
        self.participants.clear();
        self.preferences = vec![None; self.seats.len()];
        self.turn = 0;
        self.status = Status::Forming;

        let full = self.seats.iter().all(Option::is_some);
        let side_choice = if self.kind.has_side_choice() && full {
            self.begin_side_choice(rng)
        } else {
            Vec::new()
        };
        info!("Room {} reset to {:?}", self.room_id, self.status);

        let mut out = self.broadcast(Event::RoomReset {
            room_id: self.room_id,
            status: self.status,
        });
        out.extend(side_choice);
        Ok(out)
    }

    /// Cancels a negotiation that has been open longer than the TTL.
    pub fn expire_negotiation(&mut self, now: Instant) -> Vec<Outbound> {
        match &self.pending {
            Some(pending) if now.saturating_duration_since(pending.opened_at) >= self.negotiation_ttl => {
                debug!("Room {}: {:?} request expired", self.room_id, pending.kind);
                self.pending = None;
                self.broadcast(Event::NegotiationExpired {
                    room_id: self.room_id,
                })
            }
            _ => Vec::new(),
        }
    }

    fn seat(&self, client: ClientId) -> Result<Seat, RoomError> {
        self.seat_of(client).ok_or(RoomError::NotFound(self.room_id))
    }

    fn require_in_progress(&self) -> Result<(), RoomError> {
        match self.status {
            Status::InProgress => Ok(()),
            Status::Ended => Err(RoomError::GameEnded),
            _ => Err(RoomError::NotStarted),
        }
    }

    /// A seat that dropped out of a running game is finished with it.
    fn require_participant(&self, seat: Seat) -> Result<(), RoomError> {
        if self.participants.contains(&seat) {
            Ok(())
        } else {
            Err(RoomError::GameEnded)
        }
    }

    fn occupied(&self) -> impl Iterator<Item = (Seat, ClientId)> + '_ {
        self.seats
            .iter()
            .enumerate()
            .filter_map(|(seat, client)| client.map(|client| (seat, client)))
    }

    fn broadcast(&self, event: Event) -> Vec<Outbound> {
        self.occupied()
            .map(|(_, to)| Outbound {
                to,
                event: event.clone(),
            })
            .collect()
    }

    fn others(&self, except: Seat, event: Event) -> Vec<Outbound> {
        self.occupied()
            .filter(|(seat, _)| *seat != except)
            .map(|(_, to)| Outbound {
                to,
                event: event.clone(),
            })
            .collect()
    }

    /// One event per seated client, built for that client's seat.
    fn personal(&self, make: impl Fn(Seat) -> Event) -> Vec<Outbound> {
        self.occupied()
            .map(|(seat, to)| Outbound { to, event: make(seat) })
            .collect()
    }

    fn joined(&self, seat: Seat, client: ClientId) -> Outbound {
        Outbound {
            to: client,
            event: Event::Joined {
                room_id: self.room_id,
                kind: self.kind,
                seat,
                status: self.status,
            },
        }
    }

    /// Checkers seat the second player opposite the host; otherwise the first free seat.
    fn open_seat(&self) -> Option<Seat> {
        let taken: Vec<Seat> = self.occupied().map(|(seat, _)| seat).collect();
        if self.kind == GameKind::Checkers {
            if let [host] = taken.as_slice() {
                let opposite = checkers::opposite(*host);
                if self.seats[opposite].is_none() {
                    return Some(opposite);
                }
            }
        }
        self.seats.iter().position(Option::is_none)
    }

    fn begin_side_choice(&mut self, rng: &mut impl Rng) -> Vec<Outbound> {
        self.status = Status::AwaitingSideChoice;
        self.preferences = vec![None; self.seats.len()];
        let room_id = self.room_id;
        let mut out = self.broadcast(Event::ChooseSide { room_id });

        if let Some(cards) = self.board.cards_mut() {
            cards.deal(rng);
            info!("Room {}: cards dealt", room_id);
        }
        if let Some(cards) = self.board.cards() {
            out.extend(self.personal(|seat| Event::Hand {
                room_id,
                cards: cards.hand(seat).to_vec(),
            }));
        }
        out
    }

    fn settle_sides(&mut self, chosen: &[SidePreference], rng: &mut impl Rng) -> Vec<Outbound> {
        let room_id = self.room_id;

        if self.kind == GameKind::Cards {
            let calls: Vec<bool> = chosen.iter().map(|p| *p == SidePreference::First).collect();
            let landlord = choose_landlord(&calls, rng);
            if let Some(cards) = self.board.cards_mut() {
                cards.crown(landlord);
            }
            info!("Room {}: seat {} is the landlord", room_id, landlord);
            let everyone = (0..self.seats.len()).collect();
            return self.start_play(everyone, landlord);
        }

        let first = match (chosen[0], chosen[1]) {
            (a, b) if a == b => rng.gen_range(0..2),
            (SidePreference::First, _) => 0,
            _ => 1,
        };
        if first != 0 {
            self.seats.swap(0, first);
        }
        let mut out = self.broadcast(Event::SeatsAssigned {
            room_id,
            seats: self.seats.clone(),
        });

        if self.kind.has_arrangement() {
            self.status = Status::Arranging;
            self.participants = vec![0, 1];
            out.extend(self.broadcast(Event::ArrangementStarted { room_id }));
        } else {
            out.extend(self.start_play(vec![0, 1], 0));
        }
        out
    }

    fn start_play(&mut self, participants: Vec<Seat>, turn: Seat) -> Vec<Outbound> {
        self.participants = participants;
        self.turn = turn;
        self.status = Status::InProgress;
        info!("Room {}: {} started, {} to move", self.room_id, self.kind, self.kind.role(turn));

        let room_id = self.room_id;
        let board = &self.board;
        self.personal(|seat| Event::GameStarted {
            room_id,
            turn,
            view: board.view(Some(seat)),
        })
    }

    /// Hidden-information follow-ups after a move: fresh hands at cards,
    /// casualty lists after a military battle.
    fn private_updates(&self, battle: bool) -> Vec<Outbound> {
        let room_id = self.room_id;
        if let Some(cards) = self.board.cards() {
            return self.personal(|seat| Event::Hand {
                room_id,
                cards: cards.hand(seat).to_vec(),
            });
        }
        match self.board.military() {
            Some(military) if battle => self.personal(|seat| Event::Casualties {
                room_id,
                units: military.casualties(seat).to_vec(),
            }),
            _ => Vec::new(),
        }
    }

    fn next_participant(&self, seat: Seat) -> Seat {
        self.participants
            .iter()
            .copied()
            .find(|s| *s > seat)
            .or_else(|| self.participants.first().copied())
            .unwrap_or(seat)
    }

    fn forfeit(&mut self, seat: Seat) -> Vec<Outbound> {
        let room_id = self.room_id;
        self.pending = None;
        let mut out = self.broadcast(Event::Surrendered { room_id, seat });

        if let Some(cards) = self.board.cards() {
            let outcome = cards.concession(seat);
            out.extend(self.finish(outcome));
            return out;
        }

        let remaining: Vec<Seat> = self.participants.iter().copied().filter(|s| *s != seat).collect();
        if self.kind == GameKind::Checkers && remaining.len() >= 2 {
            if self.turn == seat {
                self.turn = self.next_participant(seat);
                out.extend(self.broadcast(Event::TurnChanged {
                    room_id,
                    turn: self.turn,
                }));
            }
            self.participants = remaining;
            info!("Room {}: seat {} dropped out, {} players remain", room_id, seat, self.participants.len());
            return out;
        }

        let outcome = match remaining.as_slice() {
            [winner] => Outcome::Winner(*winner),
            _ => Outcome::Team(remaining),
        };
        out.extend(self.finish(outcome));
        out
    }

    fn finish(&mut self, outcome: Outcome) -> Vec<Outbound> {
        info!("Room {} ended: {:?}", self.room_id, outcome);
        self.status = Status::Ended;
        self.pending = None;
        self.outcome = Some(outcome.clone());
        self.broadcast(Event::GameOver {
            room_id: self.room_id,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shared::games::cards::CardPlay;
    use shared::games::military::default_deployment;
    use shared::{MoveError, PieceMove, Pos};

    const TTL: Duration = Duration::from_secs(60);

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    /// Two clients seated, client 1 in seat 0, game in progress (or arranging).
    fn started(kind: GameKind) -> GameSession {
        let mut rng = rng();
        let mut session = GameSession::new(1000, kind, 1, TTL);
        session.join(2, Some(kind), &mut rng).unwrap();
        session.choose_side(1, SidePreference::First, &mut rng).unwrap();
        session.choose_side(2, SidePreference::Second, &mut rng).unwrap();
        session
    }

    fn place(row: i32, col: i32) -> MoveRequest {
        MoveRequest::Place(Pos::new(row, col))
    }

    fn events_for(out: &[Outbound], client: ClientId) -> Vec<&Event> {
        out.iter().filter(|o| o.to == client).map(|o| &o.event).collect()
    }

    #[test]
    fn test_creation_seats_creator() {
        let session = GameSession::new(1234, GameKind::Go, 7, TTL);
        assert_eq!(session.seats(), &[Some(7), None]);
        assert_eq!(session.status(), Status::Forming);
        assert_eq!(session.created().len(), 1);
        assert!(!session.is_empty());
    }

    #[test]
    fn test_join_rules() {
        let mut rng = rng();
        let mut session = GameSession::new(1000, GameKind::Chess, 1, TTL);

        assert_eq!(
            session.join(2, Some(GameKind::Go), &mut rng).unwrap_err(),
            RoomError::KindMismatch {
                expected: GameKind::Go,
                actual: GameKind::Chess
            }
        );
        let (seat, out) = session.join(2, None, &mut rng).unwrap();
        assert_eq!(seat, 1);
        assert_eq!(session.status(), Status::AwaitingSideChoice);
        assert!(events_for(&out, 1).contains(&&Event::ChooseSide { room_id: 1000 }));

        assert_eq!(session.join(2, None, &mut rng).unwrap().0, 1);
        assert_eq!(session.join(3, None, &mut rng).unwrap_err(), RoomError::RoomFull);
    }

    #[test]
    fn test_side_choice_swaps_identities() {
        let mut rng = rng();
        let mut session = GameSession::new(1000, GameKind::Xiangqi, 1, TTL);
        session.join(2, None, &mut rng).unwrap();
        session.choose_side(1, SidePreference::Second, &mut rng).unwrap();
        assert_eq!(session.status(), Status::AwaitingSideChoice);
        session.choose_side(2, SidePreference::First, &mut rng).unwrap();

        assert_eq!(session.seats(), &[Some(2), Some(1)]);
        assert_eq!(session.status(), Status::InProgress);
        assert_eq!(session.turn(), 0);
    }

    #[test]
    fn test_tied_preferences_still_start() {
        let mut rng = rng();
        let mut session = GameSession::new(1000, GameKind::Gobang, 1, TTL);
        session.join(2, None, &mut rng).unwrap();
        session.choose_side(1, SidePreference::First, &mut rng).unwrap();
        session.choose_side(2, SidePreference::First, &mut rng).unwrap();
        assert_eq!(session.status(), Status::InProgress);
        assert!(session.has_client(1) && session.has_client(2));
    }

    #[test]
    fn test_turn_alternation_and_gating() {
        let mut rng = rng();
        let mut session = GameSession::new(1000, GameKind::Gobang, 1, TTL);
        assert_eq!(session.submit_move(1, &place(7, 7)).unwrap_err(), RoomError::NotStarted);
        session.join(2, None, &mut rng).unwrap();
        session.choose_side(1, SidePreference::First, &mut rng).unwrap();
        session.choose_side(2, SidePreference::Second, &mut rng).unwrap();

        assert_eq!(session.submit_move(2, &place(7, 7)).unwrap_err(), RoomError::NotYourTurn);
        assert_eq!(session.submit_move(9, &place(7, 7)).unwrap_err(), RoomError::NotFound(1000));
        session.submit_move(1, &place(7, 7)).unwrap();
        assert_eq!(session.turn(), 1);
        assert_eq!(
            session.submit_move(2, &place(7, 7)).unwrap_err(),
            RoomError::IllegalMove(MoveError::Occupied)
        );
        assert_eq!(session.turn(), 1);
        session.submit_move(2, &place(7, 8)).unwrap();
        assert_eq!(session.turn(), 0);
        session.submit_move(1, &place(8, 7)).unwrap();
        assert_eq!(session.turn(), 1);
        assert_eq!(session.history().len(), 3);
        assert_eq!(session.outcome(), None);
    }

    #[test]
    fn test_undo_round_trip() {
        let mut session = started(GameKind::Go);
        let initial = session.board().clone();
        let now = Instant::now();

        session.submit_move(1, &place(3, 3)).unwrap();
        assert_eq!(session.request_undo(2, now).unwrap_err(), RoomError::UndoUnavailable);
        session.request_undo(1, now).unwrap();
        assert_eq!(session.request_draw(1, now).unwrap_err(), RoomError::NegotiationConflict);
        assert_eq!(session.respond_undo(1, true).unwrap_err(), RoomError::NegotiationConflict);

        session.respond_undo(2, true).unwrap();
        assert_eq!(session.board(), &initial);
        assert_eq!(session.turn(), 0);
        assert!(session.history().is_empty());
        assert_eq!(session.last_undoer(), Some(0));
        assert_eq!(session.pending_negotiation(), None);
    }

    #[test]
    fn test_alternating_undos_unwind_to_the_start() {
        let mut session = started(GameKind::Chess);
        let initial = session.board().clone();
        let now = Instant::now();
        let step = |from: (i32, i32), to: (i32, i32)| {
            MoveRequest::Piece(PieceMove {
                from: Pos::new(from.0, from.1),
                to: Pos::new(to.0, to.1),
            })
        };

        session.submit_move(1, &step((1, 4), (3, 4))).unwrap();
        session.submit_move(2, &step((6, 3), (4, 3))).unwrap();
        session.submit_move(1, &step((3, 4), (4, 3))).unwrap();
        session.submit_move(2, &step((7, 3), (4, 3))).unwrap();
        assert_eq!(session.history().len(), 4);

        // Seat 1 moved last, so clients take turns asking, starting with client 2.
        let mut asker = 2;
        while !session.history().is_empty() {
            let answerer = 3 - asker;
            session.request_undo(asker, now).unwrap();
            session.respond_undo(answerer, true).unwrap();
            asker = answerer;
        }
        assert_eq!(session.board(), &initial);
        assert_eq!(session.turn(), 0);
    }

    #[test]
    fn test_back_to_back_undo_denied() {
        let mut session = started(GameKind::Othello);
        let now = Instant::now();
        session.submit_move(1, &place(2, 3)).unwrap();
        session.request_undo(1, now).unwrap();
        session.respond_undo(2, true).unwrap();

        session.submit_move(1, &place(2, 3)).unwrap();
        assert_eq!(session.request_undo(1, now).unwrap_err(), RoomError::ConsecutiveUndoDenied);
    }

    #[test]
    fn test_refused_undo_keeps_the_move() {
        let mut session = started(GameKind::Gobang);
        session.submit_move(1, &place(7, 7)).unwrap();
        session.request_undo(1, Instant::now()).unwrap();
        let out = session.respond_undo(2, false).unwrap();
        assert!(events_for(&out, 1).contains(&&Event::UndoRejected { room_id: 1000 }));
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.turn(), 1);
        assert_eq!(session.respond_undo(2, true).unwrap_err(), RoomError::NoPendingRequest);
    }

    #[test]
    fn test_draw_by_agreement() {
        let mut session = started(GameKind::Chess);
        session.request_draw(2, Instant::now()).unwrap();
        assert_eq!(session.respond_draw(2, true).unwrap_err(), RoomError::NegotiationConflict);
        session.respond_draw(1, true).unwrap();
        assert_eq!(session.status(), Status::Ended);
        assert_eq!(session.outcome(), Some(&Outcome::Draw));
        assert_eq!(session.submit_move(1, &place(1, 1)).unwrap_err(), RoomError::GameEnded);
    }

    #[test]
    fn test_surrender_hands_the_win_over() {
        let mut session = started(GameKind::Xiangqi);
        session.surrender(1).unwrap();
        assert_eq!(session.outcome(), Some(&Outcome::Winner(1)));
        assert_eq!(session.surrender(2).unwrap_err(), RoomError::GameEnded);
    }

    #[test]
    fn test_negotiation_expires() {
        let mut session = started(GameKind::Gobang);
        let opened = Instant::now();
        session.request_draw(1, opened).unwrap();
        assert!(session.expire_negotiation(opened + Duration::from_secs(1)).is_empty());
        let out = session.expire_negotiation(opened + TTL);
        assert_eq!(out.len(), 2);
        assert_eq!(session.pending_negotiation(), None);
        session.request_draw(2, opened + TTL).unwrap();
    }

    #[test]
    fn test_leave_before_start_reopens_the_room() {
        let mut rng = rng();
        let mut session = GameSession::new(1000, GameKind::Go, 1, TTL);
        session.join(2, None, &mut rng).unwrap();
        session.choose_side(2, SidePreference::First, &mut rng).unwrap();
        session.leave(2).unwrap();

        assert_eq!(session.status(), Status::Forming);
        assert_eq!(session.seats(), &[Some(1), None]);
        session.join(3, None, &mut rng).unwrap();
        assert_eq!(session.status(), Status::AwaitingSideChoice);
    }

    #[test]
    fn test_leave_during_play_forfeits() {
        let mut session = started(GameKind::Gobang);
        session.submit_move(1, &place(7, 7)).unwrap();
        session.request_undo(1, Instant::now()).unwrap();
        let out = session.leave(2).unwrap();

        assert_eq!(session.outcome(), Some(&Outcome::Winner(0)));
        assert_eq!(session.pending_negotiation(), None);
        assert!(events_for(&out, 1).contains(&&Event::PlayerLeft { room_id: 1000, seat: 1 }));
        session.leave(1).unwrap();
        assert!(session.is_empty());
    }

    #[test]
    fn test_reset_rules() {
        let mut rng = rng();
        let mut session = started(GameKind::Gobang);
        session.submit_move(1, &place(7, 7)).unwrap();
        assert_eq!(session.reset(1, &mut rng).unwrap_err(), RoomError::GameInProgress);

        session.surrender(2).unwrap();
        session.reset(2, &mut rng).unwrap();
        assert_eq!(session.status(), Status::AwaitingSideChoice);
        assert!(session.history().is_empty());
        assert_eq!(session.outcome(), None);
        assert_eq!(session.board(), &Board::new(GameKind::Gobang));
    }

    #[test]
    fn test_checkers_seating_and_start() {
        let mut rng = rng();
        let mut session = GameSession::new(1000, GameKind::Checkers, 1, TTL);
        assert_eq!(session.start_game(1).unwrap_err(), RoomError::NotEnoughPlayers(2));
        assert_eq!(session.join(2, None, &mut rng).unwrap().0, 3);
        assert_eq!(session.join(3, None, &mut rng).unwrap().0, 1);
        assert_eq!(session.start_game(2).unwrap_err(), RoomError::NotHost);

        session.start_game(1).unwrap();
        assert_eq!(session.participants(), &[0, 1, 3]);
        assert_eq!(session.turn(), 0);
        assert_eq!(session.join(4, None, &mut rng).unwrap_err(), RoomError::RoomFull);
    }

    #[test]
    fn test_checkers_dropout_continues() {
        let mut rng = rng();
        let mut session = GameSession::new(1000, GameKind::Checkers, 1, TTL);
        session.join(2, None, &mut rng).unwrap();
        session.join(3, None, &mut rng).unwrap();
        session.start_game(1).unwrap();

        session.surrender(1).unwrap();
        assert_eq!(session.status(), Status::InProgress);
        assert_eq!(session.participants(), &[1, 3]);
        assert_eq!(session.turn(), 1);

        session.leave(3).unwrap();
        assert_eq!(session.outcome(), Some(&Outcome::Winner(3)));
    }

    #[test]
    fn test_dropped_checkers_seat_stays_out() {
        let mut rng = rng();
        let mut session = GameSession::new(1000, GameKind::Checkers, 1, TTL);
        session.join(2, None, &mut rng).unwrap();
        session.join(3, None, &mut rng).unwrap();
        session.start_game(1).unwrap();

        let step = MoveRequest::Piece(PieceMove {
            from: Pos::new(3, 9),
            to: Pos::new(4, 9),
        });
        session.submit_move(1, &step).unwrap();
        assert_eq!(session.turn(), 1);
        session.surrender(1).unwrap();
        assert_eq!(session.participants(), &[1, 3]);

        assert_eq!(session.request_undo(1, Instant::now()).unwrap_err(), RoomError::GameEnded);
        assert_eq!(session.request_draw(1, Instant::now()).unwrap_err(), RoomError::GameEnded);
        assert_eq!(session.pending_negotiation(), None);
        assert_eq!(session.respond_undo(3, true).unwrap_err(), RoomError::NoPendingRequest);
        let back = MoveRequest::Piece(PieceMove {
            from: Pos::new(4, 9),
            to: Pos::new(5, 9),
        });
        assert_eq!(session.submit_move(1, &back).unwrap_err(), RoomError::GameEnded);
        assert_eq!(session.turn(), 1);
        assert!(session.participants().contains(&session.turn()));
    }

    #[test]
    fn test_cards_bidding_picks_landlord() {
        let mut rng = rng();
        let mut session = GameSession::new(1000, GameKind::Cards, 1, TTL);
        session.join(2, None, &mut rng).unwrap();
        let (_, out) = session.join(3, None, &mut rng).unwrap();
        let hands = out.iter().filter(|o| matches!(o.event, Event::Hand { .. })).count();
        assert_eq!(hands, 3);

        session.choose_side(1, SidePreference::Second, &mut rng).unwrap();
        session.choose_side(2, SidePreference::First, &mut rng).unwrap();
        session.choose_side(3, SidePreference::First, &mut rng).unwrap();

        assert_eq!(session.status(), Status::InProgress);
        assert_eq!(session.turn(), 1);
        let cards = session.board().cards().unwrap();
        assert_eq!(cards.landlord(), Some(1));
        assert_eq!(cards.hand(1).len(), 20);
        assert_eq!(session.request_undo(2, Instant::now()).unwrap_err(), RoomError::Unsupported(GameKind::Cards));
        assert_eq!(
            session.submit_move(2, &MoveRequest::Cards(CardPlay::Pass)).unwrap_err(),
            RoomError::IllegalMove(MoveError::CannotPass)
        );

        session.surrender(2).unwrap();
        assert_eq!(session.outcome(), Some(&Outcome::Team(vec![0, 2])));
    }

    #[test]
    fn test_military_arrangement_phase() {
        let mut session = started(GameKind::Military);
        assert_eq!(session.status(), Status::Arranging);
        let step = MoveRequest::Piece(PieceMove {
            from: Pos::new(5, 0),
            to: Pos::new(4, 0),
        });
        assert_eq!(session.submit_move(1, &step).unwrap_err(), RoomError::NotStarted);

        session.arrange(1, &default_deployment(0)).unwrap();
        assert_eq!(session.status(), Status::Arranging);
        assert!(matches!(
            session.arrange(2, &default_deployment(0)).unwrap_err(),
            RoomError::IllegalMove(MoveError::InvalidDeployment(_))
        ));
        let out = session.arrange(2, &default_deployment(1)).unwrap();
        assert_eq!(session.status(), Status::InProgress);
        assert_eq!(session.turn(), 0);
        assert!(events_for(&out, 2)
            .iter()
            .any(|event| matches!(event, Event::GameStarted { .. })));
    }
}
