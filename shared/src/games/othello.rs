//! Othello on an 8×8 board.

use super::{MoveError, Oracle, Played};
use crate::board::{Grid, Pos, Seat, Stone, ALL_DIRECTIONS};
use crate::kind::Outcome;
use serde::{Deserialize, Serialize};

pub const SIZE: i32 = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OthelloBoard {
    grid: Grid<Option<Stone>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OthelloRecord {
    pub seat: Seat,
    pub at: Pos,
    pub flipped: Vec<Pos>,
}

/// Opponent stones that placing `color` at `at` would turn over.
///
/// A run in one direction only flips when it is closed by a stone of the
/// mover's colour; runs that end at the edge or at an empty cell flip nothing.
pub fn flips(grid: &Grid<Option<Stone>>, at: Pos, color: Stone) -> Vec<Pos> {
    if !grid.is_empty_at(at) {
        return Vec::new();
    }

    let mut flipped = Vec::new();
    for (dr, dc) in ALL_DIRECTIONS {
        let mut run = Vec::new();
        let mut cursor = at.offset(dr, dc);
        while grid.at(cursor) == Some(color.opponent()) {
            run.push(cursor);
            cursor = cursor.offset(dr, dc);
        }
        if !run.is_empty() && grid.at(cursor) == Some(color) {
            flipped.extend(run);
        }
    }
    flipped
}

impl Default for OthelloBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl OthelloBoard {
    pub fn new() -> Self {
        let mut grid = Grid::new(SIZE, SIZE);
        grid.set(Pos::new(3, 3), Some(Stone::White));
        grid.set(Pos::new(3, 4), Some(Stone::Black));
        grid.set(Pos::new(4, 3), Some(Stone::Black));
        grid.set(Pos::new(4, 4), Some(Stone::White));
        Self { grid }
    }

    pub fn grid(&self) -> &Grid<Option<Stone>> {
        &self.grid
    }

    pub fn has_move(&self, color: Stone) -> bool {
        self.grid
            .positions()
            .any(|pos| !flips(&self.grid, pos, color).is_empty())
    }

    pub fn count(&self, color: Stone) -> usize {
        self.grid.occupied().filter(|(_, stone)| *stone == color).count()
    }

    fn final_outcome(&self) -> Outcome {
        let black = self.count(Stone::Black);
        let white = self.count(Stone::White);
        match black.cmp(&white) {
            std::cmp::Ordering::Greater => Outcome::Winner(Stone::Black.seat()),
            std::cmp::Ordering::Less => Outcome::Winner(Stone::White.seat()),
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }
}

impl Oracle for OthelloBoard {
    type Move = Pos;
    type Record = OthelloRecord;

    fn play(&mut self, seat: Seat, at: &Pos) -> Result<Played<OthelloRecord>, MoveError> {
        let at = *at;
        if !self.grid.contains(at) {
            return Err(MoveError::OutOfRange);
        }
        if self.grid.at(at).is_some() {
            return Err(MoveError::Occupied);
        }

        let color = Stone::of_seat(seat);
        let flipped = flips(&self.grid, at, color);
        if flipped.is_empty() {
            return Err(MoveError::NoFlips);
        }

        self.grid.set(at, Some(color));
        for pos in &flipped {
            self.grid.set(*pos, Some(color));
        }

        let played = Played::next(OthelloRecord { seat, at, flipped });
        if self.has_move(color.opponent()) {
            Ok(played)
        } else if self.has_move(color) {
            Ok(played.again())
        } else {
            Ok(played.ending(Some(self.final_outcome())))
        }
    }

    fn revert(&mut self, record: &OthelloRecord) {
        let enemy = Stone::of_seat(record.seat).opponent();
        self.grid.set(record.at, None);
        for pos in &record.flipped {
            self.grid.set(*pos, Some(enemy));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::TurnChange;

    fn board_from(rows: &[&str]) -> OthelloBoard {
        let mut grid = Grid::new(SIZE, SIZE);
        for (row, line) in rows.iter().enumerate() {
            for (col, ch) in line.chars().enumerate() {
                let stone = match ch {
                    'B' => Some(Stone::Black),
                    'W' => Some(Stone::White),
                    _ => None,
                };
                grid.set(Pos::new(row as i32, col as i32), stone);
            }
        }
        OthelloBoard { grid }
    }

    #[test]
    fn test_opening_moves() {
        let board = OthelloBoard::new();
        let legal: Vec<Pos> = board
            .grid()
            .positions()
            .filter(|pos| !flips(board.grid(), *pos, Stone::Black).is_empty())
            .collect();
        assert_eq!(legal.len(), 4);
        assert!(legal.contains(&Pos::new(2, 3)));
    }

    #[test]
    fn test_flips_in_all_eight_directions() {
        let board = board_from(&[
            "B..B..B.",
            ".W.W.W..",
            "..WWW...",
            "BWW.WWB.",
            "..WWW...",
            ".W.W.W..",
            "B..B..B.",
            "........",
        ]);
        let flipped = flips(board.grid(), Pos::new(3, 3), Stone::Black);
        assert_eq!(flipped.len(), 16);
    }

    #[test]
    fn test_run_without_anchor_does_not_flip() {
        let board = board_from(&["BWW.", "", "", "", "", "", "", ""]);
        // Running off the board to the right, nothing closes the run
        assert!(flips(board.grid(), Pos::new(0, 3), Stone::White).is_empty());
        let mut board = board;
        assert_eq!(board.play(1, &Pos::new(0, 3)), Err(MoveError::NoFlips));
        assert_eq!(board.play(0, &Pos::new(0, 3)).unwrap().record.flipped.len(), 2);
    }

    #[test]
    fn test_forced_pass_keeps_turn() {
        // White has no reply after black takes (0,2); black still has (2,2)
        let mut board = board_from(&["BW......", "", "BW......", "", "", "", "", ""]);
        let played = board.play(0, &Pos::new(0, 2)).unwrap();
        assert_eq!(played.turn, TurnChange::Again);
        assert!(played.outcome.is_none());
    }

    #[test]
    fn test_game_ends_when_nobody_can_move() {
        let mut board = board_from(&["BW......", "", "", "", "", "", "", ""]);
        let played = board.play(0, &Pos::new(0, 2)).unwrap();
        assert_eq!(played.outcome, Some(Outcome::Winner(0)));
    }

    #[test]
    fn test_revert_restores_flips() {
        let mut board = OthelloBoard::new();
        let played = board.play(0, &Pos::new(2, 3)).unwrap();
        assert_eq!(board.count(Stone::Black), 4);
        board.revert(&played.record);
        assert_eq!(board, OthelloBoard::new());
    }
}
