//! Application configuration, persisted with confy as YAML.

use crate::error::ConfigError;
use crate::ladder::{Difficulty, Encounter, KillPolicy, RoleLadder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const APP_NAME: &str = "progboard";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConfig {
    pub name: String,
    #[serde(default)]
    pub color: u32,
}

impl RoleConfig {
    fn named(name: String) -> Self {
        Self { name, color: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterConfig {
    pub name: String,
    /// Log-source ids, oldest/easiest version first.
    pub ids: Vec<u32>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub prog_roles: Vec<RoleConfig>,
    /// Defaults to "<name> Cleared".
    #[serde(default)]
    pub cleared_role: Option<RoleConfig>,
    #[serde(default)]
    pub kill_policy: KillPolicy,
}

impl EncounterConfig {
    pub fn to_encounter(&self) -> Encounter {
        let phases: Vec<(String, u32)> = self
            .prog_roles
            .iter()
            .map(|r| (r.name.clone(), r.color))
            .collect();
        let cleared = self
            .cleared_role
            .clone()
            .unwrap_or_else(|| RoleConfig::named(format!("{} Cleared", self.name)));

        Encounter {
            name: self.name.clone(),
            ids: self.ids.clone(),
            difficulty: self.difficulty,
            ladder: RoleLadder::new(&self.name, &phases, (cleared.name, cleared.color))
                .with_kill_policy(self.kill_policy),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub leaderboard_enabled: bool,
    #[serde(default)]
    pub leaderboard_channel_id: String,
    /// Encounter name to a message handle that must be reused on startup.
    #[serde(default)]
    pub leaderboard_message_overrides: HashMap<String, String>,
    /// Flat encounter to handle mapping from before handles lived on the
    /// leaderboard. Entries are dropped once migrated.
    #[serde(default)]
    pub legacy_message_ids: HashMap<String, String>,
    #[serde(default)]
    pub encounters: Vec<EncounterConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub reports_directory: String,
    pub roster_file: String,
    #[serde(default)]
    pub guilds: Vec<GuildConfig>,
}

impl ::std::default::Default for AppConfig {
    fn default() -> Self {
        Self {
            reports_directory: "reports".to_string(),
            roster_file: "roster.toml".to_string(),
            guilds: vec![GuildConfig {
                id: "local".to_string(),
                name: "Local Guild".to_string(),
                leaderboard_enabled: true,
                leaderboard_channel_id: "leaderboards".to_string(),
                leaderboard_message_overrides: HashMap::new(),
                legacy_message_ids: HashMap::new(),
                encounters: ultimate_encounters(),
            }],
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Ok(confy::load(APP_NAME, None)?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, None, self).map_err(ConfigError::Save)
    }

    pub fn guild(&self, id: &str) -> Result<&GuildConfig, ConfigError> {
        self.guilds
            .iter()
            .find(|g| g.id == id)
            .ok_or_else(|| ConfigError::UnknownGuild { id: id.to_string() })
    }
}

/// The six ultimates with a phase ladder each.
pub fn ultimate_encounters() -> Vec<EncounterConfig> {
    [
        ("The Unending Coil of Bahamut (Ultimate)", "UCoB", vec![1060, 1073], 5),
        ("The Weapon's Refrain (Ultimate)", "UWU", vec![1061, 1074], 4),
        ("The Epic of Alexander (Ultimate)", "TEA", vec![1062, 1075], 4),
        ("Dragonsong's Reprise (Ultimate)", "DSR", vec![1065, 1076], 7),
        ("The Omega Protocol (Ultimate)", "TOP", vec![1068, 1077], 6),
        ("Futures Rewritten (Ultimate)", "FRU", vec![1079], 5),
    ]
    .into_iter()
    .map(|(name, short, ids, phases)| EncounterConfig {
        name: name.to_string(),
        ids,
        difficulty: Difficulty::Ultimate,
        prog_roles: (1..=phases)
            .map(|p| RoleConfig::named(format!("{short} P{p} Prog")))
            .collect(),
        cleared_role: Some(RoleConfig::named(format!("{short} Cleared"))),
        kill_policy: KillPolicy::PromoteToCleared,
    })
    .collect()
}
