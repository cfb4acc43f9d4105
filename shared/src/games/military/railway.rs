//! The railway network of the military board and the searches over it.
//!
//! Rows 1, 5, 6 and 10 carry horizontal track across all five columns.
//! Columns 0 and 4 carry vertical track from row 1 to row 10, and column 2
//! links rows 5 and 6 across the front. Two cells are joined when they are
//! neighbours on the same track.

use super::{COLS, ROWS};
use crate::board::Pos;
use std::collections::{HashMap, VecDeque};

const HORIZONTAL_ROWS: [i32; 4] = [1, 5, 6, 10];

fn in_board(pos: Pos) -> bool {
    (0..ROWS).contains(&pos.row) && (0..COLS).contains(&pos.col)
}

pub fn on_horizontal(pos: Pos) -> bool {
    in_board(pos) && HORIZONTAL_ROWS.contains(&pos.row)
}

pub fn on_vertical(pos: Pos) -> bool {
    match pos.col {
        0 | 4 => (1..=10).contains(&pos.row),
        2 => (5..=6).contains(&pos.row),
        _ => false,
    }
}

pub fn is_railway(pos: Pos) -> bool {
    on_horizontal(pos) || on_vertical(pos)
}

/// Cells joined to `pos` by a single stretch of track.
pub fn rail_neighbors(pos: Pos) -> Vec<Pos> {
    let mut neighbors = Vec::with_capacity(4);
    for dc in [-1, 1] {
        let next = pos.offset(0, dc);
        if on_horizontal(pos) && on_horizontal(next) {
            neighbors.push(next);
        }
    }
    for dr in [-1, 1] {
        let next = pos.offset(dr, 0);
        if on_vertical(pos) && on_vertical(next) {
            neighbors.push(next);
        }
    }
    neighbors
}

/// Breadth-first search used by the engineer, which may turn at junctions.
///
/// Cells strictly between the endpoints must be empty; the destination may
/// hold an enemy. Returns the path including both endpoints.
pub fn engineer_path(from: Pos, to: Pos, occupied: impl Fn(Pos) -> bool) -> Option<Vec<Pos>> {
    if from == to || !is_railway(from) || !is_railway(to) {
        return None;
    }

    let mut parents: HashMap<Pos, Pos> = HashMap::new();
    let mut queue = VecDeque::from([from]);

    while let Some(cursor) = queue.pop_front() {
        for next in rail_neighbors(cursor) {
            if next == from || parents.contains_key(&next) {
                continue;
            }
            parents.insert(next, cursor);
            if next == to {
                return Some(unwind(&parents, from, to));
            }
            if !occupied(next) {
                queue.push_back(next);
            }
        }
    }

    None
}

fn unwind(parents: &HashMap<Pos, Pos>, from: Pos, to: Pos) -> Vec<Pos> {
    let mut path = vec![to];
    let mut cursor = to;
    while cursor != from {
        match parents.get(&cursor) {
            Some(&parent) => {
                path.push(parent);
                cursor = parent;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

/// A straight run along one track with no turns, for every piece but the engineer.
pub fn straight_path(from: Pos, to: Pos, occupied: impl Fn(Pos) -> bool) -> Option<Vec<Pos>> {
    if from == to {
        return None;
    }
    let on_track: fn(Pos) -> bool = if from.row == to.row {
        on_horizontal
    } else if from.col == to.col {
        on_vertical
    } else {
        return None;
    };

    let (dr, dc) = from.step_towards(to);
    let mut path = vec![from];
    let mut cursor = from;
    while cursor != to {
        let next = cursor.offset(dr, dc);
        if !on_track(cursor) || !on_track(next) {
            return None;
        }
        if next != to && occupied(next) {
            return None;
        }
        path.push(next);
        cursor = next;
    }
    Some(path)
}
