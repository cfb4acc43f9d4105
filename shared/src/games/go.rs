//! Go on a 19×19 board: group liberties, captures, the suicide rule, passing
//! and area scoring.

use super::{MoveError, Oracle, Played};
use crate::board::{Grid, Pos, Seat, Stone, ORTHOGONAL};
use crate::kind::Outcome;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

pub const SIZE: i32 = 19;

/// Komi in half points, awarded to white.
const KOMI_HALVES: i32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoMove {
    Place(Pos),
    Pass,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoBoard {
    grid: Grid<Option<Stone>>,
    consecutive_passes: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoRecord {
    pub seat: Seat,
    /// `None` for a pass.
    pub at: Option<Pos>,
    pub captured: Vec<Pos>,
    pub passes_before: u8,
}

/// A connected same-colour group and its liberties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub stones: Vec<Pos>,
    pub liberties: HashSet<Pos>,
}

/// Flood-fills the group of `color` containing `origin`.
pub fn liberties(grid: &Grid<Option<Stone>>, origin: Pos, color: Stone) -> Group {
    let mut stones = Vec::new();
    let mut liberties = HashSet::new();
    let mut visited = HashSet::from([origin]);
    let mut queue = VecDeque::from([origin]);

    while let Some(pos) = queue.pop_front() {
        stones.push(pos);
        for (dr, dc) in ORTHOGONAL {
            let next = pos.offset(dr, dc);
            if !grid.contains(next) {
                continue;
            }
            match grid.at(next) {
                None => {
                    liberties.insert(next);
                }
                Some(stone) if stone == color && visited.insert(next) => {
                    queue.push_back(next);
                }
                Some(_) => {}
            }
        }
    }

    Group { stones, liberties }
}

impl Default for GoBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl GoBoard {
    pub fn new() -> Self {
        Self::with_size(SIZE)
    }

    /// Smaller boards are handy for tests and teaching positions.
    pub fn with_size(size: i32) -> Self {
        Self {
            grid: Grid::new(size, size),
            consecutive_passes: 0,
        }
    }

    pub fn grid(&self) -> &Grid<Option<Stone>> {
        &self.grid
    }

    fn place(&mut self, seat: Seat, at: Pos) -> Result<GoRecord, MoveError> {
        if !self.grid.contains(at) {
            return Err(MoveError::OutOfRange);
        }
        if self.grid.at(at).is_some() {
            return Err(MoveError::Occupied);
        }

        let color = Stone::of_seat(seat);
        let enemy = color.opponent();
        self.grid.set(at, Some(color));

        // Opponent groups touching the new stone that are left without liberties
        let mut captured = Vec::new();
        let mut seen = HashSet::new();
        for (dr, dc) in ORTHOGONAL {
            let next = at.offset(dr, dc);
            if self.grid.at(next) != Some(enemy) || seen.contains(&next) {
                continue;
            }
            let group = liberties(&self.grid, next, enemy);
            seen.extend(group.stones.iter().copied());
            if group.liberties.is_empty() {
                captured.extend(group.stones);
            }
        }

        if captured.is_empty() && liberties(&self.grid, at, color).liberties.is_empty() {
            self.grid.set(at, None);
            return Err(MoveError::Suicide);
        }

        for pos in &captured {
            self.grid.set(*pos, None);
        }

        Ok(GoRecord {
            seat,
            at: Some(at),
            captured,
            passes_before: self.consecutive_passes,
        })
    }

    /// Area score in half points: stones plus empty regions bordered by one colour only.
    pub fn area_score(&self) -> (i32, i32) {
        let mut black = 0;
        let mut white = 0;
        let mut visited = HashSet::new();

        for (pos, cell) in self.grid.iter() {
            match cell {
                Some(Stone::Black) => black += 2,
                Some(Stone::White) => white += 2,
                None if visited.insert(pos) => {
                    let mut region = 0;
                    let mut borders = HashSet::new();
                    let mut queue = VecDeque::from([pos]);
                    while let Some(cursor) = queue.pop_front() {
                        region += 2;
                        for (dr, dc) in ORTHOGONAL {
                            let next = cursor.offset(dr, dc);
                            if !self.grid.contains(next) {
                                continue;
                            }
                            match self.grid.at(next) {
                                Some(stone) => {
                                    borders.insert(stone);
                                }
                                None => {
                                    if visited.insert(next) {
                                        queue.push_back(next);
                                    }
                                }
                            }
                        }
                    }
                    if borders.len() == 1 {
                        if borders.contains(&Stone::Black) {
                            black += region;
                        } else {
                            white += region;
                        }
                    }
                }
                None => {}
            }
        }

        (black, white + KOMI_HALVES)
    }

    fn scored_outcome(&self) -> Outcome {
        let (black, white) = self.area_score();
        if black > white {
            Outcome::Winner(Stone::Black.seat())
        } else if white > black {
            Outcome::Winner(Stone::White.seat())
        } else {
            Outcome::Draw
        }
    }
}

impl Oracle for GoBoard {
    type Move = GoMove;
    type Record = GoRecord;

    fn play(&mut self, seat: Seat, mv: &GoMove) -> Result<Played<GoRecord>, MoveError> {
        match *mv {
            GoMove::Place(at) => {
                let record = self.place(seat, at)?;
                self.consecutive_passes = 0;
                Ok(Played::next(record))
            }
            GoMove::Pass => {
                let record = GoRecord {
                    seat,
                    at: None,
                    captured: Vec::new(),
                    passes_before: self.consecutive_passes,
                };
                self.consecutive_passes += 1;
                let outcome = (self.consecutive_passes >= 2).then(|| self.scored_outcome());
                Ok(Played::next(record).ending(outcome))
            }
        }
    }

    fn revert(&mut self, record: &GoRecord) {
        if let Some(at) = record.at {
            self.grid.set(at, None);
            let enemy = Stone::of_seat(record.seat).opponent();
            for pos in &record.captured {
                self.grid.set(*pos, Some(enemy));
            }
        }
        self.consecutive_passes = record.passes_before;
    }
}
