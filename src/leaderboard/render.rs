//! Leaderboard payload rendering and recovery.
//!
//! Ranked lines look like
//! `🥇 `Dank' Tank (Gilgamesh)` - **272 kills**` and
//! `**#4** `Jerran Zeva (Cactuar)` - **51 kills**`.

use super::{Leaderboard, LeaderboardEntry};
use crate::character::CharacterKey;
use crate::display::{DisplayPayload, PayloadField};
use memchr::{memchr, memrchr};
use regex::Regex;
use std::fmt::Write;
use std::sync::LazyLock;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub const RANKINGS_FIELD: &str = "Rankings";
pub const TOP_ENTRIES: usize = 10;
const LEADERBOARD_COLOR: u32 = 0x00ff00;
const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];

static ENCOUNTER_TOTEMS: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "The Omega Protocol (Ultimate)" => "<:toptotem:1412804998495997972>",
    "Dragonsong's Reprise (Ultimate)" => "<:dsrtotem:1412805063595921489>",
    "The Epic of Alexander (Ultimate)" => "<:teatotem:1412805183909527552>",
    "Futures Rewritten (Ultimate)" => "<:frutotem:1412805130255863818>",
    "The Weapon's Refrain (Ultimate)" => "<:uwutotem:1412805291568791752>",
    "The Unending Coil of Bahamut (Ultimate)" => "<:ucobtotem:1412805358518407179>",
};

// "**272 kills**" or "**272**"
static KILL_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(\d+)(?:\s*kills)?\*\*").expect("kill count pattern is valid"));

pub fn encounter_totem(encounter: &str) -> Option<&'static str> {
    ENCOUNTER_TOTEMS.get(encounter).copied()
}

fn rank_marker(rank: usize, bold: bool) -> String {
    match MEDALS.get(rank) {
        Some(medal) => (*medal).to_string(),
        None if bold => format!("**#{}**", rank + 1),
        None => format!("#{}", rank + 1),
    }
}

fn ranked_line(out: &mut String, marker: &str, entry: &LeaderboardEntry) {
    let _ = writeln!(
        out,
        "{} `{}` - **{} kills**",
        marker, entry.character, entry.kill_count
    );
}

/// Embed-style payload of the top ten entries.
pub fn render_payload(leaderboard: &Leaderboard) -> DisplayPayload {
    let title = match encounter_totem(&leaderboard.encounter) {
        Some(totem) => format!(
            "{totem} 🏆 {} Kill Count Leaderboard {totem}",
            leaderboard.encounter
        ),
        None => format!("🏆 {} Kill Count Leaderboard", leaderboard.encounter),
    };

    let mut rankings = String::new();
    for (rank, entry) in leaderboard.ranked_view(TOP_ENTRIES).iter().enumerate() {
        ranked_line(&mut rankings, &rank_marker(rank, true), entry);
    }

    let mut fields = Vec::new();
    if !rankings.is_empty() {
        fields.push(PayloadField {
            name: RANKINGS_FIELD.to_string(),
            value: rankings,
        });
    }

    DisplayPayload {
        title,
        description: "Top raiders by total kills".to_string(),
        color: LEADERBOARD_COLOR,
        timestamp: leaderboard.last_updated.format(&Rfc3339).ok(),
        fields,
    }
}

/// Plain-text view used when an admin asks to see a leaderboard.
pub fn render_text(leaderboard: &Leaderboard) -> String {
    let mut out = format!("**{} Kill Count Leaderboard**\n\n", leaderboard.encounter);
    if leaderboard.is_empty() {
        out.push_str("No entries yet!");
        return out;
    }
    for (rank, entry) in leaderboard.ranked_view(TOP_ENTRIES).iter().enumerate() {
        ranked_line(&mut out, &rank_marker(rank, false), entry);
    }
    out
}

/// Recover entries from a previously rendered payload. Lines that do not
/// parse are skipped.
pub fn parse_rankings(payload: &DisplayPayload) -> Vec<LeaderboardEntry> {
    let Some(field) = payload.field(RANKINGS_FIELD) else {
        return Vec::new();
    };
    let now = OffsetDateTime::now_utc();

    field
        .value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let entry = parse_ranked_line(line, now);
            if entry.is_none() {
                tracing::warn!(line, "Could not parse leaderboard line");
            }
            entry
        })
        .collect()
}

fn parse_ranked_line(line: &str, now: OffsetDateTime) -> Option<LeaderboardEntry> {
    let bytes = line.as_bytes();
    let start = memchr(b'`', bytes)?;
    let end = memrchr(b'`', bytes)?;
    if start >= end {
        return None;
    }

    let name_and_world = &line[start + 1..end];
    let inner = name_and_world.as_bytes();
    let world_start = memrchr(b'(', inner)?;
    let world_end = memrchr(b')', inner)?;
    if world_start >= world_end {
        return None;
    }

    let name = name_and_world[..world_start].trim();
    let world = name_and_world[world_start + 1..world_end].trim();
    if name.is_empty() || world.is_empty() {
        return None;
    }

    // last match, so digits inside the name never win
    let captures = KILL_COUNT.captures_iter(line).last()?;
    let kill_count = captures.get(1)?.as_str().parse::<u32>().ok()?;

    tracing::debug!(name, world, kill_count, "Parsed leaderboard entry");

    Some(LeaderboardEntry {
        character: CharacterKey::new(name, world),
        kill_count,
        last_update: now,
    })
}
