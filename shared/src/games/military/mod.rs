//! The military flag game on a 12×5 board with hidden pieces.
//!
//! Red (seat 0) deploys in rows 0–5 and blue (seat 1) in rows 6–11. Each side
//! sees its own units; the other side only ever learns positions and battle
//! results.

pub mod combat;
pub mod railway;

use super::{MoveError, Oracle, PieceMove, Played};
use crate::board::{Pos, Seat};
use crate::kind::Outcome;
use combat::{resolve, Battle};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

pub const ROWS: i32 = 12;
pub const COLS: i32 = 5;
pub const ARMY_SIZE: usize = 25;

const CAMPS: [(i32, i32); 10] = [
    (2, 1),
    (2, 3),
    (3, 2),
    (4, 1),
    (4, 3),
    (7, 1),
    (7, 3),
    (8, 2),
    (9, 1),
    (9, 3),
];

const HEADQUARTERS: [(i32, i32); 4] = [(0, 1), (0, 3), (11, 1), (11, 3)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Unit {
    Commander,
    General,
    Division,
    Brigade,
    Regiment,
    Battalion,
    Company,
    Platoon,
    Engineer,
    Landmine,
    Bomb,
    Flag,
}

/// The 25 units every side deploys.
pub const STANDARD_ARMY: [(Unit, usize); 12] = [
    (Unit::Commander, 1),
    (Unit::General, 1),
    (Unit::Division, 2),
    (Unit::Brigade, 2),
    (Unit::Regiment, 2),
    (Unit::Battalion, 2),
    (Unit::Company, 3),
    (Unit::Platoon, 3),
    (Unit::Engineer, 3),
    (Unit::Landmine, 3),
    (Unit::Bomb, 2),
    (Unit::Flag, 1),
];

impl Unit {
    /// Officer rank from 9 (commander) down to 1 (engineer).
    pub fn rank(self) -> Option<u8> {
        match self {
            Unit::Commander => Some(9),
            Unit::General => Some(8),
            Unit::Division => Some(7),
            Unit::Brigade => Some(6),
            Unit::Regiment => Some(5),
            Unit::Battalion => Some(4),
            Unit::Company => Some(3),
            Unit::Platoon => Some(2),
            Unit::Engineer => Some(1),
            Unit::Landmine | Unit::Bomb | Unit::Flag => None,
        }
    }

    pub fn is_movable(self) -> bool {
        !matches!(self, Unit::Landmine | Unit::Flag)
    }
}

pub fn is_camp(pos: Pos) -> bool {
    CAMPS.contains(&(pos.row, pos.col))
}

pub fn is_headquarters(pos: Pos) -> bool {
    HEADQUARTERS.contains(&(pos.row, pos.col))
}

fn in_board(pos: Pos) -> bool {
    (0..ROWS).contains(&pos.row) && (0..COLS).contains(&pos.col)
}

fn own_half(seat: Seat, row: i32) -> bool {
    if seat == 0 {
        (0..=5).contains(&row)
    } else {
        (6..=11).contains(&row)
    }
}

fn front_row(seat: Seat) -> i32 {
    if seat == 0 {
        5
    } else {
        6
    }
}

fn in_back_rows(seat: Seat, row: i32) -> bool {
    if seat == 0 {
        row <= 1
    } else {
        row >= 10
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub pos: Pos,
    pub unit: Unit,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MilitaryBoard {
    armies: [BTreeMap<Pos, Unit>; 2],
    casualties: [Vec<Unit>; 2],
    deployed: [bool; 2],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilitaryRecord {
    pub seat: Seat,
    pub from: Pos,
    pub to: Pos,
    pub unit: Unit,
    pub path: Vec<Pos>,
    pub defender: Option<Unit>,
    pub battle: Option<Battle>,
}

/// What both sides are told about a move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilitaryReport {
    pub seat: Seat,
    pub from: Pos,
    pub to: Pos,
    pub path: Vec<Pos>,
    pub battle: Option<Battle>,
    pub flag_captured: bool,
}

impl From<&MilitaryRecord> for MilitaryReport {
    fn from(record: &MilitaryRecord) -> Self {
        Self {
            seat: record.seat,
            from: record.from,
            to: record.to,
            path: record.path.clone(),
            battle: record.battle,
            flag_captured: record.defender == Some(Unit::Flag),
        }
    }
}

/// One side's picture of the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilitaryView {
    pub own: Vec<Placement>,
    pub hidden: Vec<Pos>,
    pub casualties: Vec<Unit>,
    pub deployed: [bool; 2],
}

/// Checks a deployment against the standard army and the placement rules.
pub fn validate_deployment(seat: Seat, placements: &[Placement]) -> Result<(), MoveError> {
    let invalid = |reason: &str| Err(MoveError::InvalidDeployment(reason.to_string()));

    if placements.len() != ARMY_SIZE {
        return invalid("a deployment holds exactly 25 units");
    }
    let mut counts: BTreeMap<Unit, usize> = BTreeMap::new();
    let mut cells = HashSet::new();
    for Placement { pos, unit } in placements {
        if !in_board(*pos) || !own_half(seat, pos.row) {
            return invalid("units must stand in their own half");
        }
        if is_camp(*pos) {
            return invalid("camps start empty");
        }
        if !cells.insert(*pos) {
            return invalid("two units on one cell");
        }
        match unit {
            Unit::Flag if !is_headquarters(*pos) => return invalid("the flag sits in a headquarters"),
            Unit::Landmine if !in_back_rows(seat, pos.row) => {
                return invalid("landmines go in the two back rows")
            }
            Unit::Bomb if pos.row == front_row(seat) => return invalid("bombs cannot hold the front row"),
            _ => {}
        }
        *counts.entry(*unit).or_default() += 1;
    }
    let standard: BTreeMap<Unit, usize> = STANDARD_ARMY.into_iter().collect();
    if counts != standard {
        return invalid("the army does not match the standard composition");
    }
    Ok(())
}

/// A ready-made legal deployment. Blue mirrors red's onto rows 6-11.
pub fn default_deployment(seat: Seat) -> Vec<Placement> {
    let red: [(i32, i32, Unit); 25] = [
        (0, 0, Unit::Landmine),
        (0, 1, Unit::Flag),
        (0, 2, Unit::Landmine),
        (0, 3, Unit::Landmine),
        (0, 4, Unit::Bomb),
        (1, 0, Unit::Engineer),
        (1, 1, Unit::Bomb),
        (1, 2, Unit::Company),
        (1, 3, Unit::Company),
        (1, 4, Unit::Company),
        (2, 0, Unit::Platoon),
        (2, 2, Unit::Platoon),
        (2, 4, Unit::Platoon),
        (3, 0, Unit::Battalion),
        (3, 1, Unit::Battalion),
        (3, 3, Unit::Regiment),
        (3, 4, Unit::Regiment),
        (4, 0, Unit::Brigade),
        (4, 2, Unit::Brigade),
        (4, 4, Unit::Division),
        (5, 0, Unit::Division),
        (5, 1, Unit::General),
        (5, 2, Unit::Commander),
        (5, 3, Unit::Engineer),
        (5, 4, Unit::Engineer),
    ];
    red.iter()
        .map(|&(row, col, unit)| Placement {
            pos: if seat == 0 {
                Pos::new(row, col)
            } else {
                Pos::new(ROWS - 1 - row, col)
            },
            unit,
        })
        .collect()
}

impl MilitaryBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deploy(&mut self, seat: Seat, placements: &[Placement]) -> Result<(), MoveError> {
        if seat > 1 {
            return Err(MoveError::NotYourPiece);
        }
        if self.is_deployed(seat) {
            return Err(MoveError::InvalidDeployment("already deployed".to_string()));
        }
        validate_deployment(seat, placements)?;
        self.armies[seat] = placements.iter().map(|p| (p.pos, p.unit)).collect();
        self.deployed[seat] = true;
        Ok(())
    }

    pub fn is_deployed(&self, seat: Seat) -> bool {
        self.deployed.get(seat).copied().unwrap_or(false)
    }

    pub fn fully_deployed(&self) -> bool {
        self.deployed.iter().all(|done| *done)
    }

    /// Places a unit directly, bypassing deployment, for setting up positions.
    pub fn put(&mut self, seat: Seat, pos: Pos, unit: Unit) {
        self.armies[seat].insert(pos, unit);
    }

    pub fn unit_at(&self, pos: Pos) -> Option<(Seat, Unit)> {
        (0..2).find_map(|seat| self.armies[seat].get(&pos).map(|unit| (seat, *unit)))
    }

    pub fn casualties(&self, seat: Seat) -> &[Unit] {
        &self.casualties[seat]
    }

    fn is_occupied(&self, pos: Pos) -> bool {
        self.armies.iter().any(|army| army.contains_key(&pos))
    }

    fn has_movable_unit(&self, seat: Seat) -> bool {
        self.armies[seat]
            .iter()
            .any(|(pos, unit)| unit.is_movable() && !is_headquarters(*pos))
    }

    /// The route a unit takes from `from` to `to`, if its movement rules allow it.
    pub fn route(&self, from: Pos, to: Pos, unit: Unit) -> Option<Vec<Pos>> {
        let occupied = |pos: Pos| self.is_occupied(pos);
        if railway::is_railway(from) && railway::is_railway(to) {
            let path = if unit == Unit::Engineer {
                railway::engineer_path(from, to, occupied)
            } else {
                railway::straight_path(from, to, occupied)
            };
            if path.is_some() {
                return path;
            }
        }

        let (dr, dc) = from.delta(to);
        match (dr.abs(), dc.abs()) {
            (1, 0) | (0, 1) => Some(vec![from, to]),
            (1, 1) if is_camp(from) || is_camp(to) => Some(vec![from, to]),
            _ => None,
        }
    }

    pub fn view(&self, viewer: Option<Seat>) -> MilitaryView {
        let own = viewer
            .filter(|seat| *seat < 2)
            .map(|seat| {
                self.armies[seat]
                    .iter()
                    .map(|(pos, unit)| Placement { pos: *pos, unit: *unit })
                    .collect()
            })
            .unwrap_or_default();
        let hidden = (0..2)
            .filter(|seat| Some(*seat) != viewer)
            .flat_map(|seat| self.armies[seat].keys().copied())
            .collect();
        let casualties = viewer
            .and_then(|seat| self.casualties.get(seat).cloned())
            .unwrap_or_default();
        MilitaryView {
            own,
            hidden,
            casualties,
            deployed: self.deployed,
        }
    }
}

impl Oracle for MilitaryBoard {
    type Move = PieceMove;
    type Record = MilitaryRecord;

    fn play(&mut self, seat: Seat, mv: &PieceMove) -> Result<Played<MilitaryRecord>, MoveError> {
        let PieceMove { from, to } = *mv;
        if seat > 1 {
            return Err(MoveError::NotYourPiece);
        }
        if !in_board(from) || !in_board(to) {
            return Err(MoveError::OutOfRange);
        }
        let enemy = 1 - seat;
        let unit = match self.armies[seat].get(&from) {
            Some(unit) => *unit,
            None if self.armies[enemy].contains_key(&from) => return Err(MoveError::NotYourPiece),
            None => return Err(MoveError::EmptySource),
        };
        if !unit.is_movable() || is_headquarters(from) {
            return Err(MoveError::Immovable);
        }
        if self.armies[seat].contains_key(&to) {
            return Err(MoveError::OwnTarget);
        }
        let defender = self.armies[enemy].get(&to).copied();
        if defender.is_some() && is_camp(to) {
            return Err(MoveError::CampProtected);
        }
        let path = self.route(from, to, unit).ok_or(MoveError::IllegalPattern)?;

        self.armies[seat].remove(&from);
        let battle = defender.map(|defender| resolve(unit, defender));
        match (battle, defender) {
            (Some(Battle::AttackerWins), Some(defender)) => {
                self.armies[enemy].remove(&to);
                self.casualties[enemy].push(defender);
                self.armies[seat].insert(to, unit);
            }
            (Some(Battle::DefenderWins), _) => {
                self.casualties[seat].push(unit);
            }
            (Some(Battle::BothDie), Some(defender)) => {
                self.armies[enemy].remove(&to);
                self.casualties[enemy].push(defender);
                self.casualties[seat].push(unit);
            }
            _ => {
                self.armies[seat].insert(to, unit);
            }
        }

        let flag_taken = defender == Some(Unit::Flag);
        let outcome = (flag_taken || !self.has_movable_unit(enemy)).then_some(Outcome::Winner(seat));

        Ok(Played::next(MilitaryRecord {
            seat,
            from,
            to,
            unit,
            path,
            defender,
            battle,
        })
        .ending(outcome))
    }

    fn revert(&mut self, record: &MilitaryRecord) {
        let seat = record.seat;
        let enemy = 1 - seat;
        match (record.battle, record.defender) {
            (Some(Battle::AttackerWins), Some(defender)) => {
                self.armies[seat].remove(&record.to);
                self.casualties[enemy].pop();
                self.armies[enemy].insert(record.to, defender);
            }
            (Some(Battle::DefenderWins), _) => {
                self.casualties[seat].pop();
            }
            (Some(Battle::BothDie), Some(defender)) => {
                self.casualties[seat].pop();
                self.casualties[enemy].pop();
                self.armies[enemy].insert(record.to, defender);
            }
            _ => {
                self.armies[seat].remove(&record.to);
            }
        }
        self.armies[seat].insert(record.from, record.unit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(from: (i32, i32), to: (i32, i32)) -> PieceMove {
        PieceMove {
            from: Pos::new(from.0, from.1),
            to: Pos::new(to.0, to.1),
        }
    }

    #[test]
    fn test_standard_deployment_accepted() {
        let mut board = MilitaryBoard::new();
        board.deploy(0, &default_deployment(0)).unwrap();
        assert!(!board.fully_deployed());
        board.deploy(1, &default_deployment(1)).unwrap();
        assert!(board.fully_deployed());
        assert!(board.deploy(1, &default_deployment(1)).is_err());
    }

    #[test]
    fn test_deployment_rules() {
        let mut wrong_half = default_deployment(0);
        wrong_half[5].pos = Pos::new(6, 0);
        assert!(validate_deployment(0, &wrong_half).is_err());

        let mut flag_outside = default_deployment(0);
        flag_outside.swap(0, 1);
        flag_outside[0].pos = Pos::new(0, 0);
        flag_outside[1].pos = Pos::new(0, 1);
        assert!(validate_deployment(0, &flag_outside).is_err());

        let mut bomb_front = default_deployment(0);
        bomb_front[4].unit = Unit::Engineer;
        bomb_front[24].unit = Unit::Bomb;
        assert!(validate_deployment(0, &bomb_front).is_err());

        let short: Vec<Placement> = default_deployment(0).into_iter().skip(1).collect();
        assert!(validate_deployment(0, &short).is_err());
    }

    #[test]
    fn test_engineer_detour_versus_straight_runner() {
        let mut board = MilitaryBoard::new();
        board.put(0, Pos::new(1, 0), Unit::Engineer);
        board.put(0, Pos::new(10, 4), Unit::Company);
        board.put(1, Pos::new(10, 0), Unit::Platoon);
        // Column 0 is blocked, so the engineer has to go round by row 1
        board.put(1, Pos::new(3, 0), Unit::Platoon);

        let played = board.play(0, &mv((1, 0), (5, 4))).unwrap();
        assert_eq!(played.record.path.first(), Some(&Pos::new(1, 0)));
        assert_eq!(played.record.path.last(), Some(&Pos::new(5, 4)));
        assert!(played.record.path.contains(&Pos::new(1, 4)));
        assert!(!played.record.path.contains(&Pos::new(3, 0)));

        // A company on the rails cannot turn a corner
        assert_eq!(board.play(0, &mv((10, 4), (6, 0))), Err(MoveError::IllegalPattern));
    }

    #[test]
    fn test_step_and_camp_diagonal() {
        let mut board = MilitaryBoard::new();
        board.put(0, Pos::new(3, 1), Unit::Platoon);
        board.put(1, Pos::new(10, 0), Unit::Platoon);
        assert!(board.play(0, &mv((3, 1), (2, 1))).is_ok());
        // (2,1) is a camp, so the diagonal out of it is allowed
        assert!(board.play(0, &mv((2, 1), (3, 0))).is_ok());
        assert!(board.play(0, &mv((3, 0), (4, 1))).is_ok());
        assert!(board.play(0, &mv((4, 1), (5, 2))).is_ok());
        // Neither end is a camp and the rails do not bend here
        assert_eq!(board.play(0, &mv((5, 2), (6, 3))), Err(MoveError::IllegalPattern));
    }

    #[test]
    fn test_immovable_and_camp_protection() {
        let mut board = MilitaryBoard::new();
        board.put(0, Pos::new(0, 0), Unit::Landmine);
        board.put(0, Pos::new(0, 1), Unit::Commander);
        board.put(0, Pos::new(3, 1), Unit::Commander);
        board.put(1, Pos::new(3, 2), Unit::Platoon);
        board.put(1, Pos::new(10, 0), Unit::Platoon);

        assert_eq!(board.play(0, &mv((0, 0), (1, 0))), Err(MoveError::Immovable));
        assert_eq!(board.play(0, &mv((0, 1), (1, 1))), Err(MoveError::Immovable));
        assert_eq!(board.play(0, &mv((3, 1), (3, 2))), Err(MoveError::CampProtected));
        assert_eq!(board.play(1, &mv((3, 1), (3, 0))), Err(MoveError::NotYourPiece));
    }

    #[test]
    fn test_battle_and_revert() {
        let mut board = MilitaryBoard::new();
        board.put(0, Pos::new(5, 0), Unit::Brigade);
        board.put(0, Pos::new(0, 0), Unit::Company);
        board.put(1, Pos::new(6, 0), Unit::Regiment);
        board.put(1, Pos::new(11, 0), Unit::Company);
        let before = board.clone();

        let played = board.play(0, &mv((5, 0), (6, 0))).unwrap();
        assert_eq!(played.record.battle, Some(Battle::AttackerWins));
        assert_eq!(board.unit_at(Pos::new(6, 0)), Some((0, Unit::Brigade)));
        assert_eq!(board.casualties(1), &[Unit::Regiment]);
        assert!(board.view(Some(0)).casualties.is_empty());
        assert_eq!(board.view(Some(1)).casualties, vec![Unit::Regiment]);

        board.revert(&played.record);
        assert_eq!(board, before);
    }

    #[test]
    fn test_flag_capture_wins() {
        let mut board = MilitaryBoard::new();
        board.put(0, Pos::new(10, 1), Unit::Engineer);
        board.put(0, Pos::new(0, 0), Unit::Company);
        board.put(1, Pos::new(11, 1), Unit::Flag);
        board.put(1, Pos::new(6, 0), Unit::Company);

        let played = board.play(0, &mv((10, 1), (11, 1))).unwrap();
        assert_eq!(played.outcome, Some(Outcome::Winner(0)));
        assert!(MilitaryReport::from(&played.record).flag_captured);
    }

    #[test]
    fn test_view_hides_enemy_units() {
        let mut board = MilitaryBoard::new();
        board.deploy(0, &default_deployment(0)).unwrap();
        board.deploy(1, &default_deployment(1)).unwrap();
        let view = board.view(Some(0));
        assert_eq!(view.own.len(), ARMY_SIZE);
        assert_eq!(view.hidden.len(), ARMY_SIZE);
        assert!(view.hidden.iter().all(|pos| pos.row >= 6));
    }
}
