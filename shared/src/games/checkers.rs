//! Chinese checkers on the 121-hole star.
//!
//! Holes live on a 17×17 grid in axial coordinates: with `x = col - 8`,
//! `y = row - 8` and `z = -x - y`, the star is the union of the two big
//! triangles `max(x, y, z) <= 4` and `min(x, y, z) >= -4`. Each of the six
//! points is one seat's home; a seat wins by filling the opposite point.

use super::{MoveError, Oracle, PieceMove, Played};
use crate::board::{Grid, Pos, Seat};
use crate::kind::Outcome;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

pub const SIZE: i32 = 17;
pub const SEATS: usize = 6;
pub const PIECES_PER_SIDE: usize = 10;

/// Hex neighbours in (row, col) steps.
pub const DIRECTIONS: [(i32, i32); 6] = [(-1, 0), (-1, 1), (0, -1), (0, 1), (1, -1), (1, 0)];

fn axial(pos: Pos) -> (i32, i32, i32) {
    let x = pos.col - 8;
    let y = pos.row - 8;
    (x, y, -x - y)
}

pub fn is_hole(pos: Pos) -> bool {
    if !(0..SIZE).contains(&pos.row) || !(0..SIZE).contains(&pos.col) {
        return false;
    }
    let (x, y, z) = axial(pos);
    x.max(y).max(z) <= 4 || x.min(y).min(z) >= -4
}

/// The star point a seat starts in, in seat order red, green, yellow, blue,
/// orange, purple. Opposite points are three seats apart.
pub fn in_home(seat: Seat, pos: Pos) -> bool {
    if !is_hole(pos) {
        return false;
    }
    let (x, y, z) = axial(pos);
    match seat {
        0 => y < -4,
        1 => z > 4,
        2 => x > 4,
        3 => y > 4,
        4 => z < -4,
        5 => x < -4,
        _ => false,
    }
}

pub fn opposite(seat: Seat) -> Seat {
    (seat + SEATS / 2) % SEATS
}

pub fn home_holes(seat: Seat) -> Vec<Pos> {
    (0..SIZE)
        .flat_map(|row| (0..SIZE).map(move |col| Pos::new(row, col)))
        .filter(|pos| in_home(seat, *pos))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckersBoard {
    grid: Grid<Option<Seat>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckersRecord {
    pub seat: Seat,
    pub from: Pos,
    pub to: Pos,
    /// Holes visited on the way, endpoints included.
    pub path: Vec<Pos>,
}

impl Default for CheckersBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckersBoard {
    pub fn new() -> Self {
        Self {
            grid: Grid::new(SIZE, SIZE),
        }
    }

    /// Fills the home points of the seats taking part.
    pub fn seat_players(&mut self, players: &[Seat]) {
        self.grid = Grid::new(SIZE, SIZE);
        for &seat in players {
            for pos in home_holes(seat) {
                self.grid.set(pos, Some(seat));
            }
        }
    }

    pub fn grid(&self) -> &Grid<Option<Seat>> {
        &self.grid
    }

    pub fn put(&mut self, pos: Pos, seat: Option<Seat>) {
        self.grid.set(pos, seat);
    }

    fn is_free(&self, pos: Pos) -> bool {
        is_hole(pos) && self.grid.at(pos).is_none()
    }

    /// Every hole the piece on `from` can reach this turn, with the path taken.
    ///
    /// Single steps end the move. Jumps chain: each landing hole is expanded
    /// again, and a visited set keeps the search from circling.
    pub fn reachable(&self, from: Pos) -> HashMap<Pos, Vec<Pos>> {
        let mut reached = HashMap::new();

        for (dr, dc) in DIRECTIONS {
            let next = from.offset(dr, dc);
            if self.is_free(next) {
                reached.insert(next, vec![from, next]);
            }
        }

        let mut visited = HashMap::from([(from, vec![from])]);
        let mut queue = VecDeque::from([from]);
        while let Some(cursor) = queue.pop_front() {
            let path = visited[&cursor].clone();
            for (dr, dc) in DIRECTIONS {
                let over = cursor.offset(dr, dc);
                let landing = over.offset(dr, dc);
                // The moving piece has left `from`, so it cannot serve as a hurdle
                let occupied_over = is_hole(over) && self.grid.at(over).is_some() && over != from;
                if !occupied_over || !self.is_free(landing) || visited.contains_key(&landing) {
                    continue;
                }
                let mut extended = path.clone();
                extended.push(landing);
                visited.insert(landing, extended.clone());
                reached.entry(landing).or_insert(extended);
                queue.push_back(landing);
            }
        }

        reached
    }

    pub fn pieces_home(&self, seat: Seat) -> usize {
        let target = opposite(seat);
        self.grid
            .occupied()
            .filter(|(pos, owner)| *owner == seat && in_home(target, *pos))
            .count()
    }
}

impl Oracle for CheckersBoard {
    type Move = PieceMove;
    type Record = CheckersRecord;

    fn play(&mut self, seat: Seat, mv: &PieceMove) -> Result<Played<CheckersRecord>, MoveError> {
        let PieceMove { from, to } = *mv;
        if !is_hole(from) || !is_hole(to) {
            return Err(MoveError::OutOfRange);
        }
        let owner = self.grid.at(from).ok_or(MoveError::EmptySource)?;
        if owner != seat {
            return Err(MoveError::NotYourPiece);
        }
        if self.grid.at(to).is_some() {
            return Err(MoveError::Occupied);
        }

        let path = self
            .reachable(from)
            .remove(&to)
            .ok_or(MoveError::IllegalPattern)?;

        self.grid.set(from, None);
        self.grid.set(to, Some(seat));

        let outcome =
            (self.pieces_home(seat) == PIECES_PER_SIDE).then_some(Outcome::Winner(seat));
        Ok(Played::next(CheckersRecord {
            seat,
            from,
            to,
            path,
        })
        .ending(outcome))
    }

    fn revert(&mut self, record: &CheckersRecord) {
        self.grid.set(record.to, None);
        self.grid.set(record.from, Some(record.seat));
    }
}
