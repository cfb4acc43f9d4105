//! Game catalogue and the small vocabulary types every room shares.

use crate::board::Seat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every game the hall can host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameKind {
    Gobang,
    Go,
    Othello,
    Xiangqi,
    Chess,
    Checkers,
    Military,
    Cards,
}

impl GameKind {
    pub const ALL: [GameKind; 8] = [
        GameKind::Gobang,
        GameKind::Go,
        GameKind::Othello,
        GameKind::Xiangqi,
        GameKind::Chess,
        GameKind::Checkers,
        GameKind::Military,
        GameKind::Cards,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GameKind::Gobang => "gobang",
            GameKind::Go => "go",
            GameKind::Othello => "othello",
            GameKind::Xiangqi => "xiangqi",
            GameKind::Chess => "chess",
            GameKind::Checkers => "checkers",
            GameKind::Military => "military",
            GameKind::Cards => "cards",
        }
    }

    /// Role names by seat index; the length is the seat count.
    pub fn seat_roles(self) -> &'static [&'static str] {
        match self {
            GameKind::Gobang | GameKind::Go | GameKind::Othello => &["black", "white"],
            GameKind::Xiangqi => &["red", "black"],
            GameKind::Chess => &["white", "black"],
            GameKind::Military => &["red", "blue"],
            GameKind::Checkers => &["red", "green", "yellow", "blue", "orange", "purple"],
            GameKind::Cards => &["east", "south", "west"],
        }
    }

    pub fn seat_count(self) -> usize {
        self.seat_roles().len()
    }

    /// Players needed before a game can begin.
    pub fn min_players(self) -> usize {
        match self {
            GameKind::Checkers => 2,
            other => other.seat_count(),
        }
    }

    /// Whether seats choose first/second move once the room is full.
    /// Cards reuse the step as the landlord bid; checkers are started by the host.
    pub fn has_side_choice(self) -> bool {
        !matches!(self, GameKind::Checkers)
    }

    pub fn has_arrangement(self) -> bool {
        matches!(self, GameKind::Military)
    }

    pub fn supports_undo(self) -> bool {
        !matches!(self, GameKind::Cards)
    }

    pub fn role(self, seat: Seat) -> &'static str {
        self.seat_roles().get(seat).copied().unwrap_or("spectator")
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GameKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown game kind '{}'", s))
    }
}

/// A seat's answer to the side-choice step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SidePreference {
    First,
    Second,
}

/// Room lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Forming,
    AwaitingSideChoice,
    Arranging,
    InProgress,
    Ended,
}

/// How a finished game ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Winner(Seat),
    /// Several seats share the win (the farmers at cards, the survivors at checkers).
    Team(Vec<Seat>),
    Draw,
}

impl Outcome {
    pub fn is_winner(&self, seat: Seat) -> bool {
        match self {
            Outcome::Winner(winner) => *winner == seat,
            Outcome::Team(seats) => seats.contains(&seat),
            Outcome::Draw => false,
        }
    }
}
