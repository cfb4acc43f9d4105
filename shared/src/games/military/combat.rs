//! Combat table for the military game.

use super::Unit;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Battle {
    AttackerWins,
    DefenderWins,
    BothDie,
}

impl Battle {
    /// The same battle seen from the other side.
    pub fn mirrored(self) -> Self {
        match self {
            Battle::AttackerWins => Battle::DefenderWins,
            Battle::DefenderWins => Battle::AttackerWins,
            Battle::BothDie => Battle::BothDie,
        }
    }
}

/// Resolves an attack. Reaching the flag always wins; bombs take everything
/// with them; only the engineer clears a landmine; ranks decide the rest.
pub fn resolve(attacker: Unit, defender: Unit) -> Battle {
    if defender == Unit::Flag {
        return Battle::AttackerWins;
    }
    if attacker == Unit::Bomb || defender == Unit::Bomb {
        return Battle::BothDie;
    }
    if defender == Unit::Landmine {
        return if attacker == Unit::Engineer {
            Battle::AttackerWins
        } else {
            Battle::BothDie
        };
    }

    match (attacker.rank(), defender.rank()) {
        (Some(a), Some(d)) if a > d => Battle::AttackerWins,
        (Some(a), Some(d)) if a < d => Battle::DefenderWins,
        _ => Battle::BothDie,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OFFICERS: [Unit; 9] = [
        Unit::Commander,
        Unit::General,
        Unit::Division,
        Unit::Brigade,
        Unit::Regiment,
        Unit::Battalion,
        Unit::Company,
        Unit::Platoon,
        Unit::Engineer,
    ];

    #[test]
    fn test_rank_order_is_strict_and_symmetric() {
        for (i, &a) in OFFICERS.iter().enumerate() {
            for (j, &b) in OFFICERS.iter().enumerate() {
                let battle = resolve(a, b);
                assert_eq!(battle, resolve(b, a).mirrored(), "{:?} vs {:?}", a, b);
                let expected = match i.cmp(&j) {
                    std::cmp::Ordering::Less => Battle::AttackerWins,
                    std::cmp::Ordering::Greater => Battle::DefenderWins,
                    std::cmp::Ordering::Equal => Battle::BothDie,
                };
                assert_eq!(battle, expected);
            }
        }
    }

    #[test]
    fn test_bomb_destroys_anything() {
        for unit in OFFICERS {
            assert_eq!(resolve(Unit::Bomb, unit), Battle::BothDie);
            assert_eq!(resolve(unit, Unit::Bomb), Battle::BothDie);
        }
        assert_eq!(resolve(Unit::Bomb, Unit::Bomb), Battle::BothDie);
        assert_eq!(resolve(Unit::Bomb, Unit::Landmine), Battle::BothDie);
    }

    #[test]
    fn test_landmine_only_cleared_by_engineer() {
        assert_eq!(resolve(Unit::Engineer, Unit::Landmine), Battle::AttackerWins);
        assert_eq!(resolve(Unit::Commander, Unit::Landmine), Battle::BothDie);
        assert_eq!(resolve(Unit::Platoon, Unit::Landmine), Battle::BothDie);
    }

    #[test]
    fn test_flag_falls_to_anyone() {
        assert_eq!(resolve(Unit::Engineer, Unit::Flag), Battle::AttackerWins);
        assert_eq!(resolve(Unit::Bomb, Unit::Flag), Battle::AttackerWins);
    }
}
