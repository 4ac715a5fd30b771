//! Normalized combat attempts parsed out of a submitted report.

use crate::ladder::Encounter;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// One parsed attempt at an encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FightRecord {
    /// Fight number inside the report.
    pub id: u32,
    /// Log-source id of the encounter that was attempted.
    pub encounter_id: u32,
    pub kill: bool,
    /// Furthest phase reached, 0-based and ladder-relative.
    pub last_phase_index: usize,
}

/// All fights of a single report submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FightBatch {
    #[serde(default)]
    pub fights: Vec<FightRecord>,
}

impl FightBatch {
    pub fn new(fights: Vec<FightRecord>) -> Self {
        Self { fights }
    }

    pub fn is_empty(&self) -> bool {
        self.fights.is_empty()
    }

    /// Fights of this batch belonging to one encounter.
    pub fn for_encounter(&self, encounter: &Encounter) -> Vec<FightRecord> {
        self.fights
            .iter()
            .filter(|f| encounter.has_source(f.encounter_id))
            .copied()
            .collect()
    }
}

/// Fight representing the greatest progression in `fights`.
///
/// Ordering, strongest first:
/// 1. a kill beats any non-kill;
/// 2. between kills, the one whose encounter id sits later in
///    `encounter.ids` (the harder or later source) wins;
/// 3. the greater phase index wins;
/// 4. the earliest fight (lowest id) wins the remaining ties.
pub fn furthest_fight<'a>(encounter: &Encounter, fights: &'a [FightRecord]) -> Option<&'a FightRecord> {
    fights.iter().max_by_key(|fight| {
        let source_rank = if fight.kill {
            encounter
                .source_rank(fight.encounter_id)
                .map_or(0, |rank| rank + 1)
        } else {
            0
        };
        (fight.kill, source_rank, fight.last_phase_index, Reverse(fight.id))
    })
}
