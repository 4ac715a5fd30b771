use super::*;
use crate::display::{DisplayPayload, DisplaySurface, MemorySurface, PayloadField};
use hashbrown::HashMap;
use time::macros::datetime;

const CHANNEL: &str = "leaderboards";
const TOP: &str = "The Omega Protocol (Ultimate)";
const DSR: &str = "Dragonsong's Reprise (Ultimate)";

fn key(name: &str, world: &str) -> CharacterKey {
    CharacterKey::new(name, world)
}

fn board_with(entries: &[(&str, &str, u32)]) -> Leaderboard {
    let mut board = Leaderboard::new(TOP, CHANNEL);
    for (name, world, kills) in entries {
        board.upsert(key(name, world), *kills);
    }
    board
}

// Aggregation

#[test]
fn upsert_same_key_keeps_one_entry_with_latest_count() {
    let mut board = Leaderboard::new(TOP, CHANNEL);
    board.upsert_at(key("Dank Tank", "Gilgamesh"), 12, datetime!(2025-01-01 0:00 UTC));
    board.upsert_at(key("dank tank", "GILGAMESH"), 40, datetime!(2025-01-02 0:00 UTC));

    assert_eq!(board.len(), 1);
    let entry = &board.entries()[0];
    assert_eq!(entry.kill_count, 40);
    assert_eq!(entry.last_update, datetime!(2025-01-02 0:00 UTC));
    assert_eq!(board.last_updated, datetime!(2025-01-02 0:00 UTC));
}

#[test]
fn same_name_on_different_worlds_are_distinct() {
    let board = board_with(&[("Galen Ayder", "Cactuar", 3), ("Galen Ayder", "Sargatanas", 5)]);
    assert_eq!(board.len(), 2);
}

#[test]
fn ranked_view_is_sorted_for_any_insert_order() {
    let counts = [7u32, 1, 99, 42, 42, 0, 13];
    let orders: [Vec<usize>; 3] = [
        (0..counts.len()).collect(),
        (0..counts.len()).rev().collect(),
        vec![3, 0, 6, 1, 5, 2, 4],
    ];

    for order in orders {
        let mut board = Leaderboard::new(TOP, CHANNEL);
        for i in order {
            board.upsert(key(&format!("Raider {i}"), "Gilgamesh"), counts[i]);
        }
        let view = board.ranked_view(usize::MAX);
        assert_eq!(view.len(), counts.len());
        assert!(view.windows(2).all(|w| w[0].kill_count >= w[1].kill_count));
    }
}

#[test]
fn ranked_view_respects_limit_and_does_not_mutate() {
    let board = board_with(&[("A A", "W", 1), ("B B", "W", 2), ("C C", "W", 3)]);
    let before = board.entries().to_vec();

    assert_eq!(board.ranked_view(2).len(), 2);
    assert_eq!(board.ranked_view(2)[0].character.name(), "C C");
    assert_eq!(board.ranked_view(10).len(), 3);
    assert!(board.ranked_view(0).is_empty());
    assert_eq!(board.entries(), before.as_slice());
}

#[test]
fn equal_counts_keep_insertion_order() {
    let board = board_with(&[("First One", "W", 5), ("Second One", "W", 5)]);
    assert_eq!(board.entries()[0].character.name(), "First One");
    assert_eq!(board.entries()[1].character.name(), "Second One");
}

// Rendering

#[test]
fn payload_has_medals_then_numeric_ranks_for_top_ten() {
    let names: Vec<String> = (1..=12).map(|i| format!("Raider {i}")).collect();
    let mut board = Leaderboard::new(TOP, CHANNEL);
    for (i, name) in names.iter().enumerate() {
        board.upsert(key(name, "Gilgamesh"), 100 - i as u32);
    }

    let payload = render_payload(&board);
    assert!(payload.title.contains("🏆 The Omega Protocol (Ultimate) Kill Count Leaderboard"));
    assert!(payload.title.starts_with("<:toptotem:"));
    assert!(payload.timestamp.is_some());

    let rankings = &payload.field(RANKINGS_FIELD).expect("rankings field").value;
    let lines: Vec<&str> = rankings.lines().collect();
    assert_eq!(lines.len(), TOP_ENTRIES);
    assert_eq!(lines[0], "🥇 `Raider 1 (Gilgamesh)` - **100 kills**");
    assert!(lines[1].starts_with("🥈 "));
    assert!(lines[2].starts_with("🥉 "));
    assert_eq!(lines[3], "**#4** `Raider 4 (Gilgamesh)` - **97 kills**");
    assert!(lines[9].starts_with("**#10** "));
}

#[test]
fn empty_board_renders_without_rankings_field() {
    let mut board = Leaderboard::new("Some Savage Tier", CHANNEL);
    board.last_updated = datetime!(2025-03-04 5:06:07 UTC);
    let payload = render_payload(&board);
    assert!(payload.fields.is_empty());
    assert_eq!(payload.title, "🏆 Some Savage Tier Kill Count Leaderboard");
    assert_eq!(payload.timestamp.as_deref(), Some("2025-03-04T05:06:07Z"));
    assert_eq!(render_text(&board), "**Some Savage Tier Kill Count Leaderboard**\n\nNo entries yet!");
}

#[test]
fn text_view_uses_plain_rank_numbers() {
    let board = board_with(&[("A A", "W", 4), ("B B", "W", 3), ("C C", "W", 2), ("D D", "W", 1)]);
    let text = render_text(&board);
    assert!(text.contains("\n#4 `D D (W)` - **1 kills**"));
}

#[test]
fn parse_recovers_three_entries_with_digits_in_names() {
    let payload = DisplayPayload {
        title: "🏆 The Omega Protocol (Ultimate) Kill Count Leaderboard".to_string(),
        fields: vec![PayloadField {
            name: RANKINGS_FIELD.to_string(),
            value: "🥇 `Dank' Tank (Gilgamesh)` - **272 kills**\n\
                    🥈 `R2 D2 (Cactuar)` - **31 kills**\n\
                    **#3** `Agent **47** (Sargatanas)` - **9 kills**\n"
                .to_string(),
        }],
        ..Default::default()
    };

    let entries = parse_rankings(&payload);
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].character, key("Dank' Tank", "Gilgamesh"));
    assert_eq!(entries[0].kill_count, 272);
    assert_eq!(entries[1].character.name(), "R2 D2");
    assert_eq!(entries[1].character.world(), "Cactuar");
    assert_eq!(entries[1].kill_count, 31);
    assert_eq!(entries[2].character.name(), "Agent **47**");
    assert_eq!(entries[2].kill_count, 9);
}

#[test]
fn parse_accepts_count_without_kills_suffix_and_skips_junk() {
    let payload = DisplayPayload {
        fields: vec![
            PayloadField {
                name: "Notes".to_string(),
                value: "🥇 `Ignored (World)` - **1 kills**".to_string(),
            },
            PayloadField {
                name: RANKINGS_FIELD.to_string(),
                value: "#1 `Lone Wolf (Zalera)` - **8**\nnot a ranked line\n\n`No World` - **3 kills**"
                    .to_string(),
            },
        ],
        ..Default::default()
    };

    let entries = parse_rankings(&payload);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].character, key("Lone Wolf", "Zalera"));
    assert_eq!(entries[0].kill_count, 8);
}

#[test]
fn rendered_payload_parses_back() {
    let board = board_with(&[("Dank Tank", "Gilgamesh", 272), ("R2 D2", "Cactuar", 31)]);
    let entries = parse_rankings(&render_payload(&board));
    let recovered: Vec<(CharacterKey, u32)> =
        entries.into_iter().map(|e| (e.character, e.kill_count)).collect();
    let original: Vec<(CharacterKey, u32)> =
        board.entries().iter().map(|e| (e.character.clone(), e.kill_count)).collect();
    assert_eq!(recovered, original);
}

// Reconciliation

#[tokio::test]
async fn reconcile_creates_message_when_no_handle() {
    let surface = MemorySurface::new();
    let mut board = board_with(&[("Dank Tank", "Gilgamesh", 3)]);
    let mut legacy = HashMap::new();

    let handle = reconcile(&surface, &mut board, &mut legacy)
        .await
        .unwrap()
        .expect("handle");
    assert_eq!(board.message_id.as_ref(), Some(&handle));
    assert_eq!(surface.payload(CHANNEL, &handle).await, Some(render_payload(&board)));
}

#[tokio::test]
async fn reconcile_edits_in_place() {
    let surface = MemorySurface::new();
    let mut board = board_with(&[("Dank Tank", "Gilgamesh", 3)]);
    let mut legacy = HashMap::new();
    let first = reconcile(&surface, &mut board, &mut legacy).await.unwrap();

    board.upsert(key("Dank Tank", "Gilgamesh"), 4);
    let second = reconcile(&surface, &mut board, &mut legacy).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(surface.message_count(CHANNEL).await, 1);
    let payload = surface.payload(CHANNEL, &second.unwrap()).await.unwrap();
    assert!(payload.field(RANKINGS_FIELD).unwrap().value.contains("**4 kills**"));
}

#[tokio::test]
async fn reconcile_falls_back_when_handle_is_gone() {
    let surface = MemorySurface::new();
    let mut board = board_with(&[("Dank Tank", "Gilgamesh", 3)]);
    let mut legacy = HashMap::new();
    let stale = reconcile(&surface, &mut board, &mut legacy).await.unwrap().unwrap();
    assert!(surface.delete(CHANNEL, &stale).await);

    let fresh = reconcile(&surface, &mut board, &mut legacy).await.unwrap().unwrap();

    assert_ne!(fresh, stale);
    assert_eq!(board.message_id.as_ref(), Some(&fresh));
    assert!(surface.payload(CHANNEL, &fresh).await.is_some());
}

#[tokio::test]
async fn reconcile_migrates_legacy_handle() {
    let surface = MemorySurface::new();
    let mut board = board_with(&[("Dank Tank", "Gilgamesh", 3)]);
    let old = surface.send(CHANNEL, &DisplayPayload::default()).await.unwrap();
    let mut legacy = HashMap::new();
    legacy.insert(TOP.to_string(), old.clone());

    let handle = reconcile(&surface, &mut board, &mut legacy).await.unwrap();

    assert_eq!(handle, Some(old));
    assert!(legacy.is_empty());
    assert_eq!(surface.message_count(CHANNEL).await, 1);
}

#[tokio::test]
async fn reconcile_without_channel_is_a_no_op() {
    let surface = MemorySurface::new();
    let mut board = Leaderboard::new(TOP, "");
    let result = reconcile(&surface, &mut board, &mut HashMap::new()).await.unwrap();
    assert!(result.is_none());
    assert!(board.message_id.is_none());
}

// Startup restore

fn empty_boards() -> HashMap<String, Leaderboard> {
    [TOP, DSR]
        .into_iter()
        .map(|name| (name.to_string(), Leaderboard::new(name, CHANNEL)))
        .collect()
}

#[tokio::test]
async fn restore_detects_messages_by_title_and_recovers_entries() {
    let surface = MemorySurface::new();
    let posted = board_with(&[("Dank Tank", "Gilgamesh", 272), ("R2 D2", "Cactuar", 31)]);
    let handle = surface.send(CHANNEL, &render_payload(&posted)).await.unwrap();
    // a user quoting the title must not be picked up
    surface.post_foreign(CHANNEL, Some(render_payload(&posted))).await;

    let mut boards = empty_boards();
    let summary = restore_leaderboards(&surface, CHANNEL, &mut boards, &HashMap::new())
        .await
        .unwrap();

    assert_eq!(summary.detected, vec![TOP.to_string()]);
    assert_eq!(summary.missing, vec![DSR.to_string()]);
    let top = &boards[TOP];
    assert_eq!(top.message_id.as_ref(), Some(&handle));
    assert_eq!(top.len(), 2);
    assert_eq!(top.entries()[0].kill_count, 272);
    assert!(boards[DSR].message_id.is_none());
}

#[tokio::test]
async fn restore_applies_valid_overrides_before_scanning() {
    let surface = MemorySurface::new();
    let mut posted = Leaderboard::new(DSR, CHANNEL);
    posted.upsert(key("Lone Wolf", "Zalera"), 8);
    let override_handle = surface.send(CHANNEL, &render_payload(&posted)).await.unwrap();

    let mut overrides = HashMap::new();
    overrides.insert(DSR.to_string(), override_handle.clone());
    overrides.insert(TOP.to_string(), DisplayHandle::from("msg-404"));

    let mut boards = empty_boards();
    let summary = restore_leaderboards(&surface, CHANNEL, &mut boards, &overrides)
        .await
        .unwrap();

    assert_eq!(summary.from_overrides, vec![DSR.to_string()]);
    assert_eq!(summary.missing, vec![TOP.to_string()]);
    assert_eq!(boards[DSR].message_id.as_ref(), Some(&override_handle));
    assert_eq!(boards[DSR].entries()[0].character, key("Lone Wolf", "Zalera"));
    assert!(boards[TOP].message_id.is_none());
}
