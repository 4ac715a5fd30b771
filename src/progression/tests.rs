use super::*;
use crate::ladder::{Difficulty, RoleKind, RoleLadder};

fn encounter_with(policy: KillPolicy) -> Encounter {
    let phases: Vec<(String, u32)> = (1..=5).map(|p| (format!("TOP P{p} Prog"), 0)).collect();
    Encounter {
        name: "The Omega Protocol (Ultimate)".to_string(),
        ids: vec![1068, 1077],
        difficulty: Difficulty::Ultimate,
        ladder: RoleLadder::new(
            "The Omega Protocol (Ultimate)",
            &phases,
            ("TOP Cleared".to_string(), 0x00ff00),
        )
        .with_kill_policy(policy),
    }
}

fn encounter() -> Encounter {
    encounter_with(KillPolicy::PromoteToCleared)
}

fn wipe(id: u32, phase: usize) -> FightRecord {
    FightRecord {
        id,
        encounter_id: 1068,
        kill: false,
        last_phase_index: phase,
    }
}

fn kill(id: u32, phase: usize) -> FightRecord {
    FightRecord {
        id,
        encounter_id: 1068,
        kill: true,
        last_phase_index: phase,
    }
}

#[test]
fn empty_batch_is_rejected() {
    let decision = encounter().decide(None, &[]);
    assert!(!decision.should_apply);
    assert_eq!(decision.message, NO_FIGHTS_MESSAGE);
    assert!(decision.grant.is_empty());
    assert!(decision.revoke.is_empty());
}

#[test]
fn first_wipe_grants_phase_without_revokes() {
    let enc = encounter();
    let decision = enc.decide(None, &[wipe(3, 0), wipe(4, 2), wipe(5, 1)]);

    assert!(decision.should_apply);
    assert_eq!(decision.grant, vec![enc.ladder.phases()[2].clone()]);
    assert!(decision.revoke.is_empty());
    assert!(decision.message.starts_with("⮕ Fight 4\n"));
    assert!(decision.message.contains("`TOP P3 Prog` (phase 3)"));
}

#[test]
fn same_point_is_rejected_without_changes() {
    let enc = encounter();
    let held = enc.ladder.phases()[1].clone();
    let decision = enc.decide(Some(&held), &[wipe(1, 0), wipe(2, 1)]);

    assert!(!decision.should_apply);
    assert!(decision.message.contains("is the same as the furthest prog point"));
    assert!(decision.grant.is_empty());
    assert!(decision.revoke.is_empty());
}

#[test]
fn lower_point_is_rejected_and_names_both_roles() {
    let enc = encounter();
    let held = enc.ladder.phases()[3].clone();
    let decision = enc.decide(Some(&held), &[wipe(7, 1)]);

    assert!(!decision.should_apply);
    assert!(decision.message.starts_with("⮕ Fight 7\n"));
    assert!(decision.message.contains("`TOP P4 Prog` (phase 4)"));
    assert!(decision.message.contains("`TOP P2 Prog` (phase 2)"));
    assert!(decision.new_role().is_none());
}

#[test]
fn promotion_revokes_held_role_and_below() {
    let enc = encounter();
    let held = enc.ladder.phases()[1].clone();
    let decision = enc.decide(Some(&held), &[wipe(1, 3)]);

    assert!(decision.should_apply);
    assert_eq!(decision.grant, vec![enc.ladder.phases()[3].clone()]);
    assert_eq!(decision.revoke, enc.ladder.phases()[..2].to_vec());
}

#[test]
fn kill_with_no_role_grants_cleared_and_revokes_all_phases() {
    let enc = encounter();
    let decision = enc.decide(None, &[wipe(1, 4), kill(2, 4)]);

    assert!(decision.should_apply);
    assert_eq!(decision.grant, vec![enc.ladder.cleared().clone()]);
    assert_eq!(decision.revoke, enc.ladder.phases().to_vec());
    assert!(decision.message.contains("`TOP Cleared` (cleared)"));
}

#[test]
fn cleared_character_cannot_be_demoted() {
    let enc = encounter();
    let held = enc.ladder.cleared().clone();

    let wipe_decision = enc.decide(Some(&held), &[wipe(1, 4)]);
    assert!(!wipe_decision.should_apply);
    assert!(wipe_decision.message.contains("further than the furthest prog"));

    let kill_decision = enc.decide(Some(&held), &[kill(2, 4)]);
    assert!(!kill_decision.should_apply);
    assert!(kill_decision.message.contains("is the same as"));
}

#[test]
fn phase_beyond_ladder_is_clamped_to_last_phase() {
    let enc = encounter();
    let decision = enc.decide(None, &[wipe(1, 42)]);
    assert_eq!(decision.grant, vec![enc.ladder.phases()[4].clone()]);
}

#[test]
fn cap_policy_grants_last_phase_on_kill() {
    let enc = encounter_with(KillPolicy::CapAtLastPhase);
    let decision = enc.decide(None, &[kill(1, 4)]);
    assert!(decision.should_apply);
    assert_eq!(decision.grant[0].kind, RoleKind::Progression(4));

    let held = decision.grant[0].clone();
    let again = enc.decide(Some(&held), &[kill(2, 4)]);
    assert!(!again.should_apply);
    assert!(again.revoke.is_empty());
}

#[test]
fn ladder_without_phases_only_accepts_kills() {
    let enc = Encounter {
        name: "UCoB".to_string(),
        ids: vec![1060],
        difficulty: Difficulty::Ultimate,
        ladder: RoleLadder::new("UCoB", &[], ("UCoB Cleared".to_string(), 0)),
    };
    let wipe = FightRecord {
        id: 1,
        encounter_id: 1060,
        kill: false,
        last_phase_index: 2,
    };
    assert!(!enc.decide(None, &[wipe]).should_apply);

    let kill = FightRecord { kill: true, ..wipe };
    let decision = enc.decide(None, &[kill]);
    assert_eq!(decision.grant, vec![enc.ladder.cleared().clone()]);
}

#[test]
fn role_from_another_encounter_counts_as_none() {
    let enc = encounter();
    let mut foreign = enc.ladder.phases()[4].clone();
    foreign.encounter = "Dragonsong's Reprise (Ultimate)".to_string();

    let decision = enc.decide(Some(&foreign), &[wipe(1, 0)]);
    assert!(decision.should_apply);
    assert!(decision.revoke.is_empty());
}

#[test]
fn role_beyond_a_shrunken_ladder_is_revoked() {
    let enc = encounter();
    let stale = Role {
        name: "TOP P7 Prog".to_string(),
        encounter: enc.name.clone(),
        kind: RoleKind::Progression(6),
        color: 0,
        description: String::new(),
    };

    let decision = enc.decide(Some(&stale), &[wipe(1, 1)]);
    assert!(decision.should_apply);
    assert_eq!(decision.grant, vec![enc.ladder.phases()[1].clone()]);
    assert_eq!(decision.revoke, vec![stale.clone()]);

    // promotion to cleared revokes the stale role along with every phase
    let decision = enc.decide(Some(&stale), &[kill(2, 4)]);
    assert_eq!(decision.revoke.len(), enc.ladder.len() + 1);
    assert!(decision.revoke.contains(&stale));
}

#[test]
fn progression_index_never_decreases() {
    // Every batch shape a small ladder can see, applied in order and in reverse.
    let enc = encounter();
    let mut batches: Vec<Vec<FightRecord>> = (0..7).map(|phase| vec![wipe(1, phase)]).collect();
    batches.push(vec![kill(1, 4)]);
    batches.push(vec![wipe(1, 2), kill(2, 4), wipe(3, 0)]);

    for order in [batches.clone(), batches.iter().rev().cloned().collect()] {
        let mut state = ProgressionState::default();
        let mut last_rank: Option<usize> = None;
        for batch in &order {
            let decision = enc.decide(state.held(), batch);
            if decision.should_apply {
                assert_eq!(decision.grant.len(), 1);
                assert!(!decision.revoke.contains(&decision.grant[0]));
            }
            state.apply(&decision);
            let rank = state.held().and_then(|role| enc.ladder.rank_of(role));
            assert!(rank >= last_rank, "rank went from {last_rank:?} to {rank:?}");
            last_rank = rank;
        }
    }
}

#[test]
fn rejected_decisions_do_not_touch_state() {
    let enc = encounter();
    let mut state = ProgressionState::default();
    assert!(state.apply(&enc.decide(None, &[wipe(1, 2)])));
    let before = state.clone();
    assert!(!state.apply(&enc.decide(state.held(), &[wipe(2, 2)])));
    assert_eq!(state, before);
}
