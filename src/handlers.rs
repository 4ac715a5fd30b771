//! Request flows: progression submissions, kill-count submissions and
//! leaderboard administration.
//!
//! Transport adapters build the typed requests below and send the returned
//! text back to the requester. Lookups against external services run before
//! the guild lock is taken; the lock is then held from the first read of
//! guild state until the display surface has been reconciled.

use crate::character::{CharacterKey, clean_report_id};
use crate::display::{DisplayHandle, DisplaySurface};
use crate::error::{RequestError, ServiceError};
use crate::guild::{GuildHandle, GuildStore};
use crate::ladder::{Encounter, Role};
use crate::leaderboard::render_text;
use crate::progression::{NO_FIGHTS_MESSAGE, ProgressionRule};
use crate::services::{OwnershipVerifier, RankingSource, ReportSource, total_kills};
use std::fmt;
use std::sync::Arc;

const PROFILE_HINT: &str = "To make lookups faster in the future, please link your character to your log profile.";
const REPORT_HINT: &str = "Make sure the report is public and the link or code is correct.";

/// Progression submission for one character and one report.
#[derive(Debug, Clone, Default)]
pub struct ProgRequest {
    pub guild_id: String,
    pub user_id: String,
    pub world: String,
    pub first_name: String,
    pub last_name: String,
    /// Report code or full report URL.
    pub report: String,
}

/// Kill-count submission for one character and one encounter.
#[derive(Debug, Clone, Default)]
pub struct CountRequest {
    pub guild_id: String,
    pub user_id: String,
    pub world: String,
    pub first_name: String,
    pub last_name: String,
    pub encounter: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaderboardCommand {
    Show { encounter: String },
    Refresh,
    Clear { encounter: String },
    RefreshKillCounts { encounter: String },
}

/// Role changes the transport must perform for one encounter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleChange {
    pub encounter: String,
    pub grant: Vec<Role>,
    pub revoke: Vec<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgReply {
    pub character: CharacterKey,
    pub messages: Vec<String>,
    pub changes: Vec<RoleChange>,
}

impl fmt::Display for ProgReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Prog for `{}`:\n{}", self.character, self.messages.join("\n"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountReply {
    pub character: CharacterKey,
    pub encounter: String,
    pub kill_count: u32,
    pub display: Option<DisplayHandle>,
}

impl fmt::Display for CountReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "✅ **Kill count recorded!**\n\n`{}` has **{} kills** in {}.\n\nThe leaderboard has been updated!",
            self.character, self.kill_count, self.encounter
        )
    }
}

/// External collaborators the request flows call through.
#[derive(Clone)]
pub struct Services {
    pub ownership: Arc<dyn OwnershipVerifier>,
    pub rankings: Arc<dyn RankingSource>,
    pub reports: Arc<dyn ReportSource>,
    pub display: Arc<dyn DisplaySurface>,
}

pub struct Progboard {
    pub guilds: GuildStore,
    services: Services,
}

impl Progboard {
    pub fn new(guilds: GuildStore, services: Services) -> Self {
        Self { guilds, services }
    }

    pub fn display(&self) -> &dyn DisplaySurface {
        self.services.display.as_ref()
    }

    async fn guild(&self, id: &str) -> Result<GuildHandle, RequestError> {
        self.guilds.get(id).await.ok_or_else(|| {
            tracing::warn!(guild = id, "Request received from guild with no configuration");
            RequestError::UnknownGuild { id: id.to_string() }
        })
    }

    async fn verify(&self, character: &CharacterKey, user_id: &str) -> Result<(), RequestError> {
        let owned = self
            .services
            .ownership
            .verify_ownership(character, user_id)
            .await
            .map_err(|source| RequestError::OwnershipCheck {
                character: character.to_string(),
                source,
            })?;
        if !owned {
            return Err(RequestError::OwnershipNotVerified {
                character: character.to_string(),
                code: CharacterKey::ownership_code(user_id),
            });
        }
        Ok(())
    }

    async fn kill_count(&self, character: &CharacterKey, encounter: &Encounter) -> Result<u32, ServiceError> {
        let rankings = self
            .services
            .rankings
            .fetch_rankings(character, &encounter.ids, encounter.difficulty.as_int())
            .await?;
        Ok(total_kills(&rankings, &encounter.ids))
    }

    /// Grant progression roles from the fights of a submitted report.
    pub async fn submit_prog(&self, request: ProgRequest) -> Result<ProgReply, RequestError> {
        require("prog", "world", &request.world)?;
        require("prog", "first name", &request.first_name)?;
        require("prog", "last name", &request.last_name)?;
        require("prog", "report", &request.report)?;

        let guild = self.guild(&request.guild_id).await?;
        let character = CharacterKey::from_parts(&request.first_name, &request.last_name, &request.world);
        let report_id = clean_report_id(&request.report);

        self.verify(&character, &request.user_id).await?;

        let batch = self
            .services
            .reports
            .fetch_fights(&report_id)
            .await
            .map_err(|source| RequestError::Lookup {
                context: format!("Could not retrieve report `{report_id}`"),
                hint: REPORT_HINT,
                source,
            })?;

        let mut guild = guild.lock().await;
        guild.register_character(&character, &request.user_id);

        let mut messages = Vec::new();
        let mut changes = Vec::new();
        let encounters: Vec<Encounter> = guild.encounters().to_vec();
        for encounter in &encounters {
            let fights = batch.for_encounter(encounter);
            if fights.is_empty() {
                continue;
            }
            let decision = encounter.decide(guild.held_role(&character, &encounter.name), &fights);
            messages.push(format!("**{}**\n{}", encounter.name, decision.message.trim_end()));
            if guild.apply_progression(&character, &encounter.name, &decision) {
                changes.push(RoleChange {
                    encounter: encounter.name.clone(),
                    grant: decision.grant,
                    revoke: decision.revoke,
                });
            }
        }

        if messages.is_empty() {
            messages.push(NO_FIGHTS_MESSAGE.to_string());
        }

        tracing::info!(
            guild = %guild.name,
            character = %character,
            report = %report_id,
            changes = changes.len(),
            "Processed prog submission"
        );

        Ok(ProgReply {
            character,
            messages,
            changes,
        })
    }

    /// Record a character's kill count and refresh the posted leaderboard.
    pub async fn submit_count(&self, request: CountRequest) -> Result<CountReply, RequestError> {
        require("count", "world", &request.world)?;
        require("count", "first name", &request.first_name)?;
        require("count", "last name", &request.last_name)?;
        require("count", "encounter", &request.encounter)?;

        let guild = self.guild(&request.guild_id).await?;
        let encounter = guild
            .lock()
            .await
            .encounter(&request.encounter)
            .cloned()
            .ok_or_else(|| RequestError::UnknownEncounter {
                name: request.encounter.clone(),
            })?;
        let character = CharacterKey::from_parts(&request.first_name, &request.last_name, &request.world);

        self.verify(&character, &request.user_id).await?;

        let kill_count = self
            .kill_count(&character, &encounter)
            .await
            .map_err(|source| RequestError::Lookup {
                context: "Could not retrieve kill count".to_string(),
                hint: PROFILE_HINT,
                source,
            })?;

        let mut guild = guild.lock().await;
        guild.register_character(&character, &request.user_id);
        guild
            .leaderboard_mut(&encounter.name)
            .upsert(character.clone(), kill_count);

        // the count is stored either way; display trouble is only logged
        let display = match guild
            .reconcile_leaderboard(self.display(), &encounter.name)
            .await
        {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(encounter = %encounter.name, error = %e, "Error updating leaderboard");
                None
            }
        };

        Ok(CountReply {
            character,
            encounter: encounter.name,
            kill_count,
            display,
        })
    }

    pub async fn leaderboard_command(
        &self,
        guild_id: &str,
        command: LeaderboardCommand,
    ) -> Result<String, RequestError> {
        let guild = self.guild(guild_id).await?;

        match command {
            LeaderboardCommand::Show { encounter } => {
                require("leaderboard", "encounter", &encounter)?;
                let guild = guild.lock().await;
                Ok(match guild.leaderboard(&encounter) {
                    Some(board) => render_text(board),
                    None => format!("No leaderboard exists for {encounter} yet."),
                })
            }
            LeaderboardCommand::Refresh => {
                let mut guild = guild.lock().await;
                if guild.leaderboard_names().is_empty() {
                    return Ok("No leaderboards to refresh.".to_string());
                }
                let failures = guild.reconcile_all(self.display()).await;
                if failures.is_empty() {
                    Ok("✅ All leaderboards have been refreshed!".to_string())
                } else {
                    let names: Vec<String> = failures.into_iter().map(|(name, _)| name).collect();
                    Ok(format!(
                        "Refreshed leaderboards, but could not post: {}",
                        names.join(", ")
                    ))
                }
            }
            LeaderboardCommand::Clear { encounter } => {
                require("leaderboard", "encounter", &encounter)?;
                guild.lock().await.clear_leaderboard(&encounter);
                Ok(format!("✅ Cleared the leaderboard for {encounter}."))
            }
            LeaderboardCommand::RefreshKillCounts { encounter } => {
                require("leaderboard", "encounter", &encounter)?;
                self.refresh_kill_counts(&guild, &encounter).await
            }
        }
    }

    /// Re-fetch the kill count of every registered character. Lookups run
    /// on a snapshot of the roster with the guild unlocked; a count that
    /// changes concurrently may be overwritten by this refresh.
    async fn refresh_kill_counts(&self, guild: &GuildHandle, encounter: &str) -> Result<String, RequestError> {
        let (encounter, characters) = {
            let guild = guild.lock().await;
            let encounter = guild
                .encounter(encounter)
                .cloned()
                .ok_or_else(|| RequestError::UnknownEncounter {
                    name: encounter.to_string(),
                })?;
            let characters: Vec<CharacterKey> = guild.characters().cloned().collect();
            (encounter, characters)
        };

        let mut counts = Vec::with_capacity(characters.len());
        for character in characters {
            match self.kill_count(&character, &encounter).await {
                Ok(count) => counts.push((character, count)),
                Err(e) => {
                    tracing::warn!(character = %character, error = %e, "Error getting kill count");
                }
            }
        }

        let mut guild = guild.lock().await;
        let board = guild.leaderboard_mut(&encounter.name);
        let mut updated = 0;
        for (character, count) in counts {
            if count > 0 || board.entry(&character).is_some() {
                board.upsert(character, count);
                updated += 1;
            }
        }

        if let Err(e) = guild.reconcile_leaderboard(self.display(), &encounter.name).await {
            tracing::warn!(encounter = %encounter.name, error = %e, "Error posting refreshed leaderboard");
        }

        Ok(format!(
            "✅ Refreshed {updated} kill counts for {}.",
            encounter.name
        ))
    }
}

fn require(command: &'static str, field: &'static str, value: &str) -> Result<(), RequestError> {
    if value.trim().is_empty() {
        return Err(RequestError::MissingField { command, field });
    }
    Ok(())
}
