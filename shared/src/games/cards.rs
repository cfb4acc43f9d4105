//! Doudizhu, the three-seat landlord card game.
//!
//! Ranks run 3..=15 for the suited cards (11 = jack, 14 = ace, 15 = two) and
//! 16/17 for the small and big joker. Hands are kept sorted.

use super::{MoveError, Oracle, Played};
use crate::board::Seat;
use crate::kind::Outcome;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const SEATS: usize = 3;
pub const HAND_SIZE: usize = 17;
pub const RESERVED: usize = 3;

pub const ACE: u8 = 14;
pub const TWO: u8 = 15;
pub const SMALL_JOKER: u8 = 16;
pub const BIG_JOKER: u8 = 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Suit {
    Spades,
    Hearts,
    Clubs,
    Diamonds,
    Joker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Card {
    pub rank: u8,
    pub suit: Suit,
}

impl Card {
    pub const fn new(rank: u8, suit: Suit) -> Self {
        Self { rank, suit }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.rank {
            3..=10 => return write!(f, "{}", self.rank),
            11 => "J",
            12 => "Q",
            13 => "K",
            ACE => "A",
            TWO => "2",
            SMALL_JOKER => "joker",
            _ => "JOKER",
        };
        f.write_str(name)
    }
}

/// The 54-card deck in a fixed order.
pub fn deck() -> Vec<Card> {
    let suits = [Suit::Spades, Suit::Hearts, Suit::Clubs, Suit::Diamonds];
    let mut cards: Vec<Card> = (3..=TWO)
        .flat_map(|rank| suits.iter().map(move |suit| Card::new(rank, *suit)))
        .collect();
    cards.push(Card::new(SMALL_JOKER, Suit::Joker));
    cards.push(Card::new(BIG_JOKER, Suit::Joker));
    cards
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    Single,
    Pair,
    Triple,
    TripleSingle,
    TriplePair,
    Straight,
    PairRun,
    Airplane,
    AirplaneSingles,
    AirplanePairs,
    FourTwoSingles,
    FourTwoPairs,
    Bomb,
    Rocket,
}

/// A classified play. `primary` is the rank that decides comparisons: the
/// repeated rank, or the top of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combo {
    pub shape: Shape,
    pub primary: u8,
    pub length: usize,
}

impl Combo {
    fn new(shape: Shape, primary: u8, length: usize) -> Self {
        Self {
            shape,
            primary,
            length,
        }
    }

    pub fn beats(&self, table: &Combo) -> bool {
        match (self.shape, table.shape) {
            (Shape::Rocket, _) => true,
            (_, Shape::Rocket) => false,
            (Shape::Bomb, Shape::Bomb) => self.primary > table.primary,
            (Shape::Bomb, _) => true,
            (_, Shape::Bomb) => false,
            (mine, theirs) => {
                mine == theirs && self.length == table.length && self.primary > table.primary
            }
        }
    }
}

fn rank_counts(cards: &[Card]) -> BTreeMap<u8, usize> {
    let mut counts = BTreeMap::new();
    for card in cards {
        *counts.entry(card.rank).or_insert(0) += 1;
    }
    counts
}

/// Whether `ranks` (ascending) is an unbroken run that stops at the ace.
fn is_run(ranks: &[u8]) -> bool {
    ranks.windows(2).all(|w| w[1] == w[0] + 1) && ranks.last().is_some_and(|top| *top <= ACE)
}

/// Top rank of the highest run of `len` consecutive ranks holding at least a
/// triple, with the leftover cards.
fn triple_run(counts: &BTreeMap<u8, usize>, len: usize) -> Option<(u8, BTreeMap<u8, usize>)> {
    let triples: Vec<u8> = counts
        .iter()
        .filter(|(rank, count)| **count >= 3 && **rank <= ACE)
        .map(|(rank, _)| *rank)
        .collect();
    triples.windows(len).rev().find(|w| is_run(w)).map(|run| {
        let mut rest = counts.clone();
        for rank in run {
            if let Some(count) = rest.get_mut(rank) {
                *count -= 3;
            }
        }
        rest.retain(|_, count| *count > 0);
        (run[len - 1], rest)
    })
}

/// Classifies a set of cards, or `None` when they form no legal shape.
pub fn classify(cards: &[Card]) -> Option<Combo> {
    let n = cards.len();
    let counts = rank_counts(cards);
    let ranks: Vec<u8> = counts.keys().copied().collect();
    let uniform = |c: usize| counts.values().all(|count| *count == c);
    let top = *ranks.last()?;

    if n == 2 && ranks == [SMALL_JOKER, BIG_JOKER] {
        return Some(Combo::new(Shape::Rocket, BIG_JOKER, n));
    }
    match (n, ranks.len()) {
        (1, 1) => return Some(Combo::new(Shape::Single, top, n)),
        (2, 1) => return Some(Combo::new(Shape::Pair, top, n)),
        (3, 1) => return Some(Combo::new(Shape::Triple, top, n)),
        (4, 1) => return Some(Combo::new(Shape::Bomb, top, n)),
        _ => {}
    }

    if n == 4 || n == 5 {
        if let Some((&rank, _)) = counts.iter().find(|(_, count)| **count == 3) {
            let rest: Vec<usize> = counts.values().copied().filter(|c| *c != 3).collect();
            match rest.as_slice() {
                [1] if n == 4 => return Some(Combo::new(Shape::TripleSingle, rank, n)),
                [2] if n == 5 => return Some(Combo::new(Shape::TriplePair, rank, n)),
                _ => {}
            }
        }
    }

    if n >= 5 && uniform(1) && is_run(&ranks) {
        return Some(Combo::new(Shape::Straight, top, n));
    }
    if n >= 6 && uniform(2) && is_run(&ranks) {
        return Some(Combo::new(Shape::PairRun, top, n));
    }
    if n >= 6 && uniform(3) && is_run(&ranks) {
        return Some(Combo::new(Shape::Airplane, top, n));
    }

    if let Some((&quad, _)) = counts.iter().find(|(_, count)| **count == 4) {
        if n == 6 {
            return Some(Combo::new(Shape::FourTwoSingles, quad, n));
        }
        if n == 8 && counts.iter().filter(|(rank, _)| **rank != quad).all(|(_, c)| *c == 2) {
            return Some(Combo::new(Shape::FourTwoPairs, quad, n));
        }
    }

    if n % 4 == 0 && n >= 8 {
        if let Some((top, _)) = triple_run(&counts, n / 4) {
            return Some(Combo::new(Shape::AirplaneSingles, top, n));
        }
    }
    if n % 5 == 0 && n >= 10 {
        if let Some((top, rest)) = triple_run(&counts, n / 5) {
            if rest.values().all(|count| count % 2 == 0) {
                return Some(Combo::new(Shape::AirplanePairs, top, n));
            }
        }
    }

    None
}

/// Picks the landlord: the lowest seat that called, or a random seat.
pub fn choose_landlord(calls: &[bool], rng: &mut impl Rng) -> Seat {
    calls
        .iter()
        .position(|called| *called)
        .unwrap_or_else(|| rng.gen_range(0..SEATS))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardPlay {
    Play(Vec<Card>),
    Pass,
}

/// The play currently on the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablePlay {
    pub seat: Seat,
    pub combo: Combo,
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    pub seat: Seat,
    pub play: CardPlay,
    pub combo: Option<Combo>,
    pub prev_table: Option<TablePlay>,
    pub prev_passes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CardsBoard {
    hands: [Vec<Card>; SEATS],
    reserved: Vec<Card>,
    landlord: Option<Seat>,
    table: Option<TablePlay>,
    passes: usize,
}

/// One seat's picture of the round: its own hand and everyone's hand size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardView {
    pub hand: Vec<Card>,
    pub hand_sizes: [usize; SEATS],
    pub landlord: Option<Seat>,
    /// Revealed once the landlord has taken them.
    pub reserved: Vec<Card>,
    pub table: Option<TablePlay>,
}

impl CardsBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shuffles a fresh deck and deals 17 cards per seat, keeping 3 aside.
    pub fn deal(&mut self, rng: &mut impl Rng) {
        let mut cards = deck();
        cards.shuffle(rng);
        *self = Self::default();
        for (i, hand) in self.hands.iter_mut().enumerate() {
            *hand = cards[i * HAND_SIZE..(i + 1) * HAND_SIZE].to_vec();
            hand.sort();
        }
        self.reserved = cards[SEATS * HAND_SIZE..].to_vec();
    }

    /// Hands the reserved cards to the landlord.
    pub fn crown(&mut self, landlord: Seat) {
        if self.landlord.is_some() || landlord >= SEATS {
            return;
        }
        self.hands[landlord].extend(self.reserved.iter().copied());
        self.hands[landlord].sort();
        self.landlord = Some(landlord);
    }

    pub fn landlord(&self) -> Option<Seat> {
        self.landlord
    }

    pub fn hand(&self, seat: Seat) -> &[Card] {
        self.hands.get(seat).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn table(&self) -> Option<&TablePlay> {
        self.table.as_ref()
    }

    /// Puts a specific hand on a seat, for setting up positions.
    pub fn set_hand(&mut self, seat: Seat, mut cards: Vec<Card>) {
        cards.sort();
        self.hands[seat] = cards;
    }

    pub fn farmers(&self) -> Vec<Seat> {
        (0..SEATS).filter(|seat| Some(*seat) != self.landlord).collect()
    }

    /// The outcome when `seat` concedes the round.
    pub fn concession(&self, seat: Seat) -> Outcome {
        match self.landlord {
            Some(landlord) if landlord == seat => Outcome::Team(self.farmers()),
            Some(landlord) => Outcome::Winner(landlord),
            None => Outcome::Draw,
        }
    }

    pub fn view(&self, viewer: Option<Seat>) -> CardView {
        CardView {
            hand: viewer.map(|seat| self.hand(seat).to_vec()).unwrap_or_default(),
            hand_sizes: [self.hands[0].len(), self.hands[1].len(), self.hands[2].len()],
            landlord: self.landlord,
            reserved: if self.landlord.is_some() {
                self.reserved.clone()
            } else {
                Vec::new()
            },
            table: self.table.clone(),
        }
    }

    /// Removes `cards` from the hand, or fails leaving the hand untouched.
    fn take_from_hand(&mut self, seat: Seat, cards: &[Card]) -> Result<(), MoveError> {
        let mut remaining = self.hands[seat].clone();
        for card in cards {
            let index = remaining
                .iter()
                .position(|held| held == card)
                .ok_or(MoveError::CardsNotInHand)?;
            remaining.remove(index);
        }
        self.hands[seat] = remaining;
        Ok(())
    }
}

impl Oracle for CardsBoard {
    type Move = CardPlay;
    type Record = CardRecord;

    fn play(&mut self, seat: Seat, mv: &CardPlay) -> Result<Played<CardRecord>, MoveError> {
        if seat >= SEATS {
            return Err(MoveError::NotYourPiece);
        }
        let prev_table = self.table.clone();
        let prev_passes = self.passes;
        let leading = self.table.as_ref().map_or(true, |table| table.seat == seat);

        match mv {
            CardPlay::Pass => {
                if leading {
                    return Err(MoveError::CannotPass);
                }
                self.passes += 1;
                if self.passes >= SEATS - 1 {
                    self.table = None;
                    self.passes = 0;
                }
                Ok(Played::next(CardRecord {
                    seat,
                    play: CardPlay::Pass,
                    combo: None,
                    prev_table,
                    prev_passes,
                }))
            }
            CardPlay::Play(cards) => {
                let combo = classify(cards).ok_or(MoveError::InvalidCombination)?;
                if let Some(table) = self.table.as_ref().filter(|_| !leading) {
                    if !combo.beats(&table.combo) {
                        return Err(MoveError::DoesNotBeat);
                    }
                }
                self.take_from_hand(seat, cards)?;
                let mut cards = cards.clone();
                cards.sort();
                self.table = Some(TablePlay {
                    seat,
                    combo,
                    cards: cards.clone(),
                });
                self.passes = 0;

                let outcome = self.hands[seat].is_empty().then(|| match self.landlord {
                    Some(landlord) if landlord != seat => Outcome::Team(self.farmers()),
                    _ => Outcome::Winner(seat),
                });
                Ok(Played::next(CardRecord {
                    seat,
                    play: CardPlay::Play(cards),
                    combo: Some(combo),
                    prev_table,
                    prev_passes,
                })
                .ending(outcome))
            }
        }
    }

    fn revert(&mut self, record: &CardRecord) {
        if let CardPlay::Play(cards) = &record.play {
            let hand = &mut self.hands[record.seat];
            hand.extend(cards.iter().copied());
            hand.sort();
        }
        self.table = record.prev_table.clone();
        self.passes = record.prev_passes;
    }
}
