//! Board geometry shared by every grid game: positions, a dense cell grid,
//! and the two-colour stone used by gobang, go and othello.

use serde::{Deserialize, Serialize};

/// Index of a seat in a room. Seat 0 always holds the game's first-move role.
pub type Seat = usize;

/// The four orthogonal unit steps.
pub const ORTHOGONAL: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// The four diagonal unit steps.
pub const DIAGONAL: [(i32, i32); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

/// All eight neighbour directions.
pub const ALL_DIRECTIONS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// A board coordinate. Signed so that direction arithmetic can step off the
/// board and be rejected by [`Grid::contains`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pos {
    pub row: i32,
    pub col: i32,
}

impl Pos {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn offset(self, dr: i32, dc: i32) -> Self {
        Self::new(self.row + dr, self.col + dc)
    }

    /// Unit step towards `other` on each axis (-1, 0 or 1).
    pub fn step_towards(self, other: Pos) -> (i32, i32) {
        ((other.row - self.row).signum(), (other.col - self.col).signum())
    }

    pub fn delta(self, other: Pos) -> (i32, i32) {
        (other.row - self.row, other.col - self.col)
    }
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Dense row-major grid of cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    rows: i32,
    cols: i32,
    cells: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    pub fn new(rows: i32, cols: i32) -> Self {
        Self {
            rows,
            cols,
            cells: vec![T::default(); (rows * cols) as usize],
        }
    }
}

impl<T> Grid<T> {
    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.row >= 0 && pos.row < self.rows && pos.col >= 0 && pos.col < self.cols
    }

    fn index(&self, pos: Pos) -> Option<usize> {
        self.contains(pos)
            .then(|| (pos.row * self.cols + pos.col) as usize)
    }

    pub fn get(&self, pos: Pos) -> Option<&T> {
        self.index(pos).map(|i| &self.cells[i])
    }

    pub fn get_mut(&mut self, pos: Pos) -> Option<&mut T> {
        self.index(pos).map(move |i| &mut self.cells[i])
    }

    /// Overwrites a cell. Writes outside the grid are ignored.
    pub fn set(&mut self, pos: Pos, value: T) {
        if let Some(cell) = self.get_mut(pos) {
            *cell = value;
        }
    }

    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| Pos::new(row, col)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Pos, &T)> + '_ {
        self.positions().zip(self.cells.iter())
    }
}

impl<T: Copy> Grid<Option<T>> {
    /// The occupant of `pos`, `None` for empty or off-board cells.
    pub fn at(&self, pos: Pos) -> Option<T> {
        self.get(pos).copied().flatten()
    }

    pub fn is_empty_at(&self, pos: Pos) -> bool {
        self.contains(pos) && self.at(pos).is_none()
    }

    /// Clears a cell and returns what stood there.
    pub fn take(&mut self, pos: Pos) -> Option<T> {
        self.get_mut(pos).and_then(Option::take)
    }

    pub fn occupied(&self) -> impl Iterator<Item = (Pos, T)> + '_ {
        self.iter().filter_map(|(pos, cell)| cell.map(|piece| (pos, piece)))
    }

    /// Number of occupied cells strictly between two aligned positions.
    pub fn count_between(&self, from: Pos, to: Pos) -> usize {
        let (dr, dc) = from.step_towards(to);
        let mut cursor = from.offset(dr, dc);
        let mut count = 0;
        while cursor != to && self.contains(cursor) {
            if self.at(cursor).is_some() {
                count += 1;
            }
            cursor = cursor.offset(dr, dc);
        }
        count
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }
}

/// Two-colour stone for the placement games. Black always opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stone {
    Black,
    White,
}

impl Stone {
    pub fn of_seat(seat: Seat) -> Self {
        if seat == 0 {
            Stone::Black
        } else {
            Stone::White
        }
    }

    pub fn seat(self) -> Seat {
        match self {
            Stone::Black => 0,
            Stone::White => 1,
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Stone::Black => Stone::White,
            Stone::White => Stone::Black,
        }
    }
}
