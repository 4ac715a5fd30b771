//! Character identity shared by progression records and leaderboards.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Case-normalized `(name, world)` pair. Two keys are equal iff both parts
/// are equal after normalization, so `"dank tank" @ "GILGAMESH"` and
/// `"Dank Tank" @ "Gilgamesh"` address the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CharacterKey {
    name: String,
    world: String,
}

impl CharacterKey {
    pub fn new(name: &str, world: &str) -> Self {
        Self {
            name: title_case(name),
            world: title_case(&clean_world(world)),
        }
    }

    pub fn from_parts(first_name: &str, last_name: &str, world: &str) -> Self {
        Self::new(&format!("{} {}", first_name.trim(), last_name.trim()), world)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn world(&self) -> &str {
        &self.world
    }

    /// Code a player adds to their public profile to prove ownership.
    pub fn ownership_code(user_id: &str) -> String {
        format!("progboard-{user_id}")
    }
}

impl fmt::Display for CharacterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.world)
    }
}

/// Uppercase the first letter of every whitespace-separated word, lowercase
/// the rest, and collapse runs of whitespace.
pub fn title_case(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn clean_world(world: &str) -> String {
    world
        .trim()
        .trim_matches(|c: char| matches!(c, '[' | ']' | '(' | ')' | '@'))
        .trim()
        .to_string()
}

/// Accepts either a bare report code or a full report URL such as
/// `https://www.fflogs.com/reports/AbC123xYz#fight=4` and returns the code.
pub fn clean_report_id(report: &str) -> String {
    let report = report.trim();
    let tail = match report.rfind("/reports/") {
        Some(pos) => &report[pos + "/reports/".len()..],
        None => report,
    };
    tail.split(['#', '?', '/'])
        .next()
        .unwrap_or_default()
        .to_string()
}
