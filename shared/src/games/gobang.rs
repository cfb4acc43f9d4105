//! Five in a row on a 15×15 board.

use super::{MoveError, Oracle, Played};
use crate::board::{Grid, Pos, Seat, Stone};
use crate::kind::Outcome;
use serde::{Deserialize, Serialize};

pub const SIZE: i32 = 15;
const LINE: usize = 5;
const AXES: [(i32, i32); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GobangBoard {
    grid: Grid<Option<Stone>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GobangRecord {
    pub seat: Seat,
    pub at: Pos,
}

impl Default for GobangBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl GobangBoard {
    pub fn new() -> Self {
        Self {
            grid: Grid::new(SIZE, SIZE),
        }
    }

    pub fn grid(&self) -> &Grid<Option<Stone>> {
        &self.grid
    }

    /// Length of the run through `at` along one axis, counting both directions.
    fn run_length(&self, at: Pos, stone: Stone, (dr, dc): (i32, i32)) -> usize {
        let mut count = 1;
        for sign in [1, -1] {
            let mut cursor = at.offset(dr * sign, dc * sign);
            while self.grid.at(cursor) == Some(stone) {
                count += 1;
                cursor = cursor.offset(dr * sign, dc * sign);
            }
        }
        count
    }

    pub fn completes_line(&self, at: Pos, stone: Stone) -> bool {
        AXES.iter()
            .any(|&axis| self.run_length(at, stone, axis) >= LINE)
    }
}

impl Oracle for GobangBoard {
    type Move = Pos;
    type Record = GobangRecord;

    fn play(&mut self, seat: Seat, at: &Pos) -> Result<Played<GobangRecord>, MoveError> {
        let at = *at;
        if !self.grid.contains(at) {
            return Err(MoveError::OutOfRange);
        }
        if self.grid.at(at).is_some() {
            return Err(MoveError::Occupied);
        }

        let stone = Stone::of_seat(seat);
        self.grid.set(at, Some(stone));

        let outcome = if self.completes_line(at, stone) {
            Some(Outcome::Winner(seat))
        } else if self.grid.is_full() {
            Some(Outcome::Draw)
        } else {
            None
        };

        Ok(Played::next(GobangRecord { seat, at }).ending(outcome))
    }

    fn revert(&mut self, record: &GobangRecord) {
        self.grid.set(record.at, None);
    }
}
