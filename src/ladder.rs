//! Encounters and their role ladders.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Normal,
    Extreme,
    Savage,
    #[default]
    Ultimate,
}

impl Difficulty {
    /// Numeric difficulty understood by the ranking service.
    pub fn as_int(self) -> u32 {
        match self {
            Difficulty::Normal => 100,
            Difficulty::Extreme => 100,
            Difficulty::Savage => 101,
            Difficulty::Ultimate => 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleKind {
    /// Milestone at a ladder index (0-based phase).
    Progression(usize),
    /// Terminal milestone above every phase.
    Cleared,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub encounter: String,
    pub kind: RoleKind,
    #[serde(default)]
    pub color: u32,
    pub description: String,
}

impl Role {
    /// Human label used in messages, e.g. "phase 3" or "cleared".
    pub fn phase_label(&self) -> String {
        match self.kind {
            RoleKind::Progression(index) => format!("phase {}", index + 1),
            RoleKind::Cleared => "cleared".to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` ({})", self.name, self.phase_label())
    }
}

/// What a kill in a submitted report promotes a character to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KillPolicy {
    /// A kill grants the distinct cleared role (ladder index `N`).
    #[default]
    PromoteToCleared,
    /// A kill grants the ladder's last phase role (index `N - 1`).
    CapAtLastPhase,
}

/// Ordered phase milestones for one encounter plus its cleared milestone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleLadder {
    phases: Vec<Role>,
    cleared: Role,
    pub kill_policy: KillPolicy,
}

impl RoleLadder {
    pub fn new(encounter: &str, phase_names: &[(String, u32)], cleared: (String, u32)) -> Self {
        let phases = phase_names
            .iter()
            .enumerate()
            .map(|(index, (name, color))| Role {
                name: name.clone(),
                encounter: encounter.to_string(),
                kind: RoleKind::Progression(index),
                color: *color,
                description: format!("Reached phase {} ({}) in prog.", index + 1, name),
            })
            .collect();

        let cleared = Role {
            name: cleared.0,
            encounter: encounter.to_string(),
            kind: RoleKind::Cleared,
            color: cleared.1,
            description: format!("Cleared {encounter}."),
        };

        Self {
            phases,
            cleared,
            kill_policy: KillPolicy::default(),
        }
    }

    pub fn with_kill_policy(mut self, policy: KillPolicy) -> Self {
        self.kill_policy = policy;
        self
    }

    /// Number of phase milestones (`N`).
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn phases(&self) -> &[Role] {
        &self.phases
    }

    pub fn cleared(&self) -> &Role {
        &self.cleared
    }

    /// Role at a position in the shared index space, where `N` is cleared.
    pub fn role_at(&self, index: usize) -> Option<&Role> {
        if index == self.phases.len() {
            Some(&self.cleared)
        } else {
            self.phases.get(index)
        }
    }

    /// Position of a role in the shared index space: phases map to their
    /// ladder index, cleared maps to `N`. Roles from another encounter, or
    /// progression roles outside this ladder, are not ranked.
    pub fn rank_of(&self, role: &Role) -> Option<usize> {
        if role.encounter != self.cleared.encounter {
            return None;
        }
        match role.kind {
            RoleKind::Cleared => Some(self.phases.len()),
            RoleKind::Progression(index) if index < self.phases.len() => Some(index),
            RoleKind::Progression(_) => None,
        }
    }
}

/// A raid encounter as the guild configured it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encounter {
    pub name: String,
    /// Log-source ids, easiest/earliest first. A later position means a
    /// harder or later version of the fight.
    pub ids: Vec<u32>,
    pub difficulty: Difficulty,
    pub ladder: RoleLadder,
}

impl Encounter {
    pub fn has_source(&self, id: u32) -> bool {
        self.ids.contains(&id)
    }

    /// Position of a log-source id in `ids`.
    pub fn source_rank(&self, id: u32) -> Option<usize> {
        self.ids.iter().position(|&candidate| candidate == id)
    }
}
