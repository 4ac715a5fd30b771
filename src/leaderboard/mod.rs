//! Kill-count leaderboards.
//!
//! One `Leaderboard` per encounter, holding at most one entry per character.
//! Entries are re-sorted by kill count (descending, stable) after every
//! mutation so that ranked views are always a prefix of the collection.

mod error;
mod reconcile;
mod render;

#[cfg(test)]
mod tests;

pub use error::DisplayError;
pub use reconcile::{RECENT_SCAN_LIMIT, RestoreSummary, reconcile, restore_leaderboards};
pub use render::{
    RANKINGS_FIELD, TOP_ENTRIES, encounter_totem, parse_rankings, render_payload, render_text,
};

use crate::character::CharacterKey;
use crate::display::DisplayHandle;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub character: CharacterKey,
    pub kill_count: u32,
    pub last_update: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct Leaderboard {
    pub encounter: String,
    entries: Vec<LeaderboardEntry>,
    pub last_updated: OffsetDateTime,
    pub channel_id: String,
    pub message_id: Option<DisplayHandle>,
}

impl Leaderboard {
    pub fn new(encounter: &str, channel_id: &str) -> Self {
        Self {
            encounter: encounter.to_string(),
            entries: Vec::new(),
            last_updated: OffsetDateTime::now_utc(),
            channel_id: channel_id.to_string(),
            message_id: None,
        }
    }

    /// Insert or overwrite the entry for `character`, then re-rank.
    pub fn upsert(&mut self, character: CharacterKey, kill_count: u32) {
        self.upsert_at(character, kill_count, OffsetDateTime::now_utc());
    }

    pub fn upsert_at(&mut self, character: CharacterKey, kill_count: u32, at: OffsetDateTime) {
        match self.entries.iter_mut().find(|e| e.character == character) {
            Some(entry) => {
                entry.kill_count = kill_count;
                entry.last_update = at;
            }
            None => self.entries.push(LeaderboardEntry {
                character,
                kill_count,
                last_update: at,
            }),
        }
        self.sort();
        self.last_updated = at;
    }

    /// Top `limit` entries in rank order. Read-only.
    pub fn ranked_view(&self, limit: usize) -> &[LeaderboardEntry] {
        &self.entries[..limit.min(self.entries.len())]
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn entry(&self, character: &CharacterKey) -> Option<&LeaderboardEntry> {
        self.entries.iter().find(|e| &e.character == character)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Swap in entries recovered from a rendered payload. Duplicate
    /// characters keep their first (highest ranked) occurrence.
    pub fn restore_entries(&mut self, entries: Vec<LeaderboardEntry>) {
        let mut restored: Vec<LeaderboardEntry> = Vec::with_capacity(entries.len());
        for entry in entries {
            if !restored.iter().any(|e| e.character == entry.character) {
                restored.push(entry);
            }
        }
        self.entries = restored;
        self.sort();
        self.last_updated = OffsetDateTime::now_utc();
    }

    fn sort(&mut self) {
        // stable, so equal counts keep their insertion order
        self.entries.sort_by(|a, b| b.kill_count.cmp(&a.kill_count));
    }
}
