//! Per-guild state and the store that owns it.
//!
//! Every mutation of a guild (progression records, leaderboards, display
//! handles) happens while holding that guild's mutex, including the
//! outbound display calls of a reconcile. Different guilds never share a
//! lock.

use crate::character::CharacterKey;
use crate::config::{AppConfig, GuildConfig};
use crate::display::{DisplayHandle, DisplaySurface};
use crate::error::ConfigError;
use crate::ladder::{Encounter, Role};
use crate::leaderboard::{
    DisplayError, Leaderboard, RestoreSummary, reconcile, restore_leaderboards,
};
use crate::progression::{Decision, ProgressionState};
use hashbrown::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

pub type GuildHandle = Arc<Mutex<GuildState>>;

pub struct GuildState {
    pub id: String,
    pub name: String,
    pub leaderboard_enabled: bool,
    pub leaderboard_channel_id: String,
    encounters: Vec<Encounter>,
    leaderboards: HashMap<String, Leaderboard>,
    legacy_message_ids: HashMap<String, DisplayHandle>,
    message_overrides: HashMap<String, DisplayHandle>,
    progression: HashMap<CharacterKey, HashMap<String, ProgressionState>>,
    /// Characters whose ownership was verified, with the verifying user.
    characters: HashMap<CharacterKey, String>,
}

impl GuildState {
    pub fn from_config(config: &GuildConfig) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        let mut encounters = Vec::with_capacity(config.encounters.len());
        for (position, encounter) in config.encounters.iter().enumerate() {
            if encounter.name.trim().is_empty() {
                return Err(ConfigError::UnnamedEncounter {
                    guild: config.id.clone(),
                    position,
                });
            }
            if encounter.ids.is_empty() {
                return Err(ConfigError::NoSourceIds {
                    guild: config.id.clone(),
                    name: encounter.name.clone(),
                });
            }
            if !seen.insert(encounter.name.clone()) {
                return Err(ConfigError::DuplicateEncounter {
                    guild: config.id.clone(),
                    name: encounter.name.clone(),
                });
            }
            encounters.push(encounter.to_encounter());
        }

        let to_handles = |map: &std::collections::HashMap<String, String>| {
            map.iter()
                .map(|(name, id)| (name.clone(), DisplayHandle(id.clone())))
                .collect::<HashMap<_, _>>()
        };

        let mut state = Self {
            id: config.id.clone(),
            name: config.name.clone(),
            leaderboard_enabled: config.leaderboard_enabled,
            leaderboard_channel_id: config.leaderboard_channel_id.clone(),
            encounters,
            leaderboards: HashMap::new(),
            legacy_message_ids: to_handles(&config.legacy_message_ids),
            message_overrides: to_handles(&config.leaderboard_message_overrides),
            progression: HashMap::new(),
            characters: HashMap::new(),
        };
        state.initialize_empty_leaderboards();
        Ok(state)
    }

    /// Pre-create an empty leaderboard per encounter so that handles can be
    /// restored before any kill count is submitted.
    fn initialize_empty_leaderboards(&mut self) {
        if !self.posts_leaderboards() {
            return;
        }
        for encounter in &self.encounters {
            self.leaderboards
                .entry(encounter.name.clone())
                .or_insert_with(|| Leaderboard::new(&encounter.name, &self.leaderboard_channel_id));
        }
        tracing::info!(guild = %self.name, count = self.leaderboards.len(), "Initialized empty leaderboards");
    }

    fn posts_leaderboards(&self) -> bool {
        self.leaderboard_enabled && !self.leaderboard_channel_id.is_empty()
    }

    fn display_channel(&self) -> &str {
        if self.posts_leaderboards() {
            &self.leaderboard_channel_id
        } else {
            ""
        }
    }

    // --- Encounters ---

    pub fn encounters(&self) -> &[Encounter] {
        &self.encounters
    }

    pub fn encounter(&self, name: &str) -> Option<&Encounter> {
        self.encounters.iter().find(|e| e.name == name)
    }

    // --- Characters and progression ---

    pub fn register_character(&mut self, character: &CharacterKey, user_id: &str) {
        self.characters
            .insert(character.clone(), user_id.to_string());
    }

    pub fn characters(&self) -> impl Iterator<Item = &CharacterKey> {
        self.characters.keys()
    }

    pub fn held_role(&self, character: &CharacterKey, encounter: &str) -> Option<&Role> {
        self.progression
            .get(character)?
            .get(encounter)?
            .held()
    }

    /// Record an accepted decision. Returns whether the held role changed.
    pub fn apply_progression(&mut self, character: &CharacterKey, encounter: &str, decision: &Decision) -> bool {
        if !decision.should_apply {
            return false;
        }
        self.progression
            .entry(character.clone())
            .or_default()
            .entry(encounter.to_string())
            .or_default()
            .apply(decision)
    }

    // --- Leaderboards ---

    pub fn leaderboard(&self, encounter: &str) -> Option<&Leaderboard> {
        self.leaderboards.get(encounter)
    }

    pub fn leaderboard_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.leaderboards.keys().cloned().collect();
        names.sort();
        names
    }

    /// Leaderboard for `encounter`, created on first use.
    pub fn leaderboard_mut(&mut self, encounter: &str) -> &mut Leaderboard {
        let channel = self.display_channel().to_string();
        self.leaderboards
            .entry(encounter.to_string())
            .or_insert_with(|| Leaderboard::new(encounter, &channel))
    }

    /// Drop a leaderboard together with any legacy handle mapping.
    pub fn clear_leaderboard(&mut self, encounter: &str) -> bool {
        let removed = self.leaderboards.remove(encounter).is_some();
        let legacy = self.legacy_message_ids.remove(encounter).is_some();
        removed || legacy
    }

    pub async fn reconcile_leaderboard(
        &mut self,
        surface: &dyn DisplaySurface,
        encounter: &str,
    ) -> Result<Option<DisplayHandle>, DisplayError> {
        let Some(leaderboard) = self.leaderboards.get_mut(encounter) else {
            return Ok(None);
        };
        reconcile(surface, leaderboard, &mut self.legacy_message_ids).await
    }

    /// Reconcile every leaderboard, returning the ones that failed.
    pub async fn reconcile_all(&mut self, surface: &dyn DisplaySurface) -> Vec<(String, DisplayError)> {
        let mut failures = Vec::new();
        for name in self.leaderboard_names() {
            let result = self.reconcile_leaderboard(surface, &name).await;
            if let Err(e) = result {
                tracing::warn!(guild = %self.name, encounter = %name, error = %e, "Error refreshing leaderboard");
                failures.push((name, e));
            }
        }
        failures
    }

    pub async fn restore(&mut self, surface: &dyn DisplaySurface) -> Result<RestoreSummary, DisplayError> {
        let channel = self.display_channel().to_string();
        restore_leaderboards(surface, &channel, &mut self.leaderboards, &self.message_overrides).await
    }
}

/// All configured guilds, keyed by guild id.
#[derive(Default)]
pub struct GuildStore {
    guilds: RwLock<HashMap<String, GuildHandle>>,
}

impl GuildStore {
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let mut guilds = HashMap::new();
        for guild in &config.guilds {
            let state = GuildState::from_config(guild)?;
            guilds.insert(state.id.clone(), Arc::new(Mutex::new(state)));
        }
        Ok(Self {
            guilds: RwLock::new(guilds),
        })
    }

    pub async fn get(&self, id: &str) -> Option<GuildHandle> {
        self.guilds.read().await.get(id).cloned()
    }

    pub async fn insert(&self, state: GuildState) -> GuildHandle {
        let id = state.id.clone();
        let handle = Arc::new(Mutex::new(state));
        self.guilds.write().await.insert(id, Arc::clone(&handle));
        handle
    }

    pub async fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.guilds.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Run startup restoration for every guild that posts leaderboards.
    pub async fn restore_all(&self, surface: &dyn DisplaySurface) {
        for id in self.ids().await {
            let Some(guild) = self.get(&id).await else {
                continue;
            };
            let mut guild = guild.lock().await;
            if !guild.posts_leaderboards() {
                continue;
            }
            match guild.restore(surface).await {
                Ok(summary) => tracing::info!(
                    guild = %guild.name,
                    overrides = summary.from_overrides.len(),
                    detected = summary.detected.len(),
                    missing = summary.missing.len(),
                    "Processed leaderboard message restoration"
                ),
                Err(e) => tracing::warn!(guild = %guild.name, error = %e, "Error restoring leaderboard messages"),
            }
        }
    }
}
