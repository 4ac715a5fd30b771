//! Progression rule engine.
//!
//! Decides, from the role a character currently holds and the fights of one
//! report, whether the character advanced and which roles change hands.
//! Roles of a ladder live in one integer space: phase `i` is `i`, the
//! cleared role is `N`, and holding nothing sits below every phase.

use crate::fight::{FightRecord, furthest_fight};
use crate::ladder::{Encounter, KillPolicy, Role};
use std::fmt::Write;

#[cfg(test)]
mod tests;

/// Which ladder roles are revoked when a character is promoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeBoundary {
    /// The held role and every phase below it.
    AtOrBelowExisting,
    /// Only the phases strictly below the held role.
    BelowExisting,
}

/// Revoke set used on promotion. Promotion to cleared additionally revokes
/// every phase role of the ladder.
pub const REVOKE_BOUNDARY: RevokeBoundary = RevokeBoundary::AtOrBelowExisting;

pub const NO_FIGHTS_MESSAGE: &str = "No valid fights found in provided report!";

/// Outcome of one `decide` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub should_apply: bool,
    pub message: String,
    pub grant: Vec<Role>,
    pub revoke: Vec<Role>,
}

impl Decision {
    fn rejected(message: String) -> Self {
        Self {
            should_apply: false,
            message,
            grant: Vec::new(),
            revoke: Vec::new(),
        }
    }

    /// Role the character holds after this decision is applied.
    pub fn new_role(&self) -> Option<&Role> {
        if self.should_apply {
            self.grant.first()
        } else {
            None
        }
    }
}

/// Anything that can turn a batch of fights into a progression decision.
pub trait ProgressionRule {
    fn decide(&self, existing: Option<&Role>, fights: &[FightRecord]) -> Decision;
}

impl ProgressionRule for Encounter {
    fn decide(&self, existing: Option<&Role>, fights: &[FightRecord]) -> Decision {
        let ladder = &self.ladder;

        let Some(furthest) = furthest_fight(self, fights) else {
            tracing::debug!(encounter = %self.name, "No fights provided to decide");
            return Decision::rejected(NO_FIGHTS_MESSAGE.to_string());
        };

        tracing::debug!(
            encounter = %self.name,
            fight = furthest.id,
            kill = furthest.kill,
            last_phase_index = furthest.last_phase_index,
            "Furthest fight selected"
        );

        let mut message = String::new();
        let _ = writeln!(message, "⮕ Fight {}", furthest.id);

        let Some(candidate) = candidate_index(furthest, ladder.len(), ladder.kill_policy) else {
            let _ = write!(
                message,
                "No prog roles are configured for {}, so only a kill can be recorded.",
                self.name
            );
            return Decision::rejected(message);
        };

        // candidate_index never goes past the cleared role
        let Some(candidate_role) = ladder.role_at(candidate) else {
            return Decision::rejected(message);
        };

        let existing_index = existing.and_then(|role| {
            let rank = ladder.rank_of(role);
            if rank.is_none() {
                tracing::debug!(role = %role.name, encounter = %self.name, "Held role is not on this ladder");
            }
            rank
        });

        if let (Some(held), Some(existing_index)) = (existing, existing_index) {
            if candidate < existing_index {
                let _ = write!(
                    message,
                    "You already have a prog role further than the furthest prog in this report! Your existing prog point is {}, and the furthest prog point seen by you in this report is {}.",
                    held, candidate_role
                );
                return Decision::rejected(message);
            }
            if candidate == existing_index {
                let _ = write!(
                    message,
                    "Your furthest prog point, {}, is the same as the furthest prog point in this report.",
                    held
                );
                return Decision::rejected(message);
            }
        }

        let mut revoke = revoke_set(ladder.phases(), existing_index, candidate == ladder.len());

        // a role of this encounter that fell off a shrunken ladder is still held
        if let Some(stale) = existing.filter(|role| existing_index.is_none() && role.encounter == self.name)
            && !revoke.contains(stale)
        {
            revoke.push(stale.clone());
        }

        let _ = writeln!(message, "Your furthest prog point is now {}.", candidate_role);

        tracing::info!(
            encounter = %self.name,
            role = %candidate_role.name,
            revoked = revoke.len(),
            "Progression advanced"
        );

        Decision {
            should_apply: true,
            message,
            grant: vec![candidate_role.clone()],
            revoke,
        }
    }
}

/// Index the furthest fight earns. `None` when a wipe is submitted for a
/// ladder without phases.
fn candidate_index(fight: &FightRecord, phases: usize, policy: KillPolicy) -> Option<usize> {
    if fight.kill {
        // with no phases, index 0 is the cleared role under either policy
        return Some(match policy {
            KillPolicy::PromoteToCleared => phases,
            KillPolicy::CapAtLastPhase => phases.saturating_sub(1),
        });
    }
    if phases == 0 {
        return None;
    }
    Some(fight.last_phase_index.min(phases - 1))
}

fn revoke_set(phases: &[Role], existing: Option<usize>, to_cleared: bool) -> Vec<Role> {
    if to_cleared {
        return phases.to_vec();
    }
    let Some(existing) = existing else {
        return Vec::new();
    };
    let end = match REVOKE_BOUNDARY {
        RevokeBoundary::AtOrBelowExisting => existing + 1,
        RevokeBoundary::BelowExisting => existing,
    };
    phases[..end.min(phases.len())].to_vec()
}

/// The single role a character holds for one encounter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressionState {
    held: Option<Role>,
}

impl ProgressionState {
    pub fn held(&self) -> Option<&Role> {
        self.held.as_ref()
    }

    /// Replace the held role with the granted one. Rejected decisions leave
    /// the state untouched.
    pub fn apply(&mut self, decision: &Decision) -> bool {
        match decision.new_role() {
            Some(role) => {
                self.held = Some(role.clone());
                true
            }
            None => false,
        }
    }
}
