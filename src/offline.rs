//! File-backed collaborators for running without network services.
//!
//! Reports live as `<directory>/<report id>.toml`:
//!
//! ```toml
//! [[fights]]
//! id = 4
//! encounter_id = 1068
//! kill = false
//! last_phase_index = 3
//! ```
//!
//! The roster lists characters with the user that owns them and their
//! rankings:
//!
//! ```toml
//! [[characters]]
//! name = "Dank Tank"
//! world = "Gilgamesh"
//! owner = "1234"
//! rankings = [{ encounter_id = 1068, total_kills = 12, cleared = true }]
//! ```

use crate::character::CharacterKey;
use crate::error::ServiceError;
use crate::fight::FightBatch;
use crate::services::{OwnershipVerifier, Ranking, RankingSource, ReportSource};
use async_trait::async_trait;
use hashbrown::HashMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const REPORTS: &str = "report directory";
const ROSTER: &str = "roster";

pub struct ReportDirectory {
    root: PathBuf,
}

impl ReportDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, report_id: &str) -> Result<PathBuf, ServiceError> {
        let valid = !report_id.is_empty()
            && report_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(ServiceError::NotFound {
                what: format!("report `{report_id}`"),
            });
        }
        Ok(self.root.join(format!("{report_id}.toml")))
    }
}

#[async_trait]
impl ReportSource for ReportDirectory {
    async fn fetch_fights(&self, report_id: &str) -> Result<FightBatch, ServiceError> {
        let path = self.path_for(report_id)?;
        let contents = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ServiceError::NotFound {
                    what: format!("report `{report_id}`"),
                }
            } else {
                ServiceError::Unavailable {
                    service: REPORTS,
                    reason: e.to_string(),
                }
            }
        })?;
        let batch: FightBatch = toml::from_str(&contents).map_err(|e| ServiceError::Malformed {
            service: REPORTS,
            detail: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), fights = batch.fights.len(), "Loaded report");
        Ok(batch)
    }
}

#[derive(Debug, Deserialize)]
struct RosterFile {
    #[serde(default)]
    characters: Vec<RosterCharacter>,
}

#[derive(Debug, Deserialize)]
struct RosterCharacter {
    name: String,
    world: String,
    owner: String,
    #[serde(default)]
    rankings: Vec<Ranking>,
}

struct RosterEntry {
    owner: String,
    rankings: HashMap<u32, Ranking>,
}

/// Character roster loaded once from a TOML file.
#[derive(Default)]
pub struct Roster {
    characters: HashMap<CharacterKey, RosterEntry>,
}

impl Roster {
    pub fn load(path: &Path) -> Result<Self, ServiceError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ServiceError::Unavailable {
            service: ROSTER,
            reason: format!("{}: {e}", path.display()),
        })?;
        let roster = Self::parse(&contents)?;
        tracing::info!(path = %path.display(), characters = roster.characters.len(), "Loaded roster");
        Ok(roster)
    }

    pub fn parse(contents: &str) -> Result<Self, ServiceError> {
        let file: RosterFile = toml::from_str(contents).map_err(|e| ServiceError::Malformed {
            service: ROSTER,
            detail: e.to_string(),
        })?;

        let characters = file
            .characters
            .into_iter()
            .map(|c| {
                let rankings = c.rankings.into_iter().map(|r| (r.encounter_id, r)).collect();
                (
                    CharacterKey::new(&c.name, &c.world),
                    RosterEntry {
                        owner: c.owner,
                        rankings,
                    },
                )
            })
            .collect();
        Ok(Self { characters })
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    fn lookup(&self, character: &CharacterKey) -> Result<&RosterEntry, ServiceError> {
        self.characters.get(character).ok_or_else(|| ServiceError::NotFound {
            what: format!("character `{character}`"),
        })
    }
}

#[async_trait]
impl OwnershipVerifier for Roster {
    async fn verify_ownership(&self, character: &CharacterKey, user_id: &str) -> Result<bool, ServiceError> {
        Ok(self.lookup(character)?.owner == user_id)
    }
}

#[async_trait]
impl RankingSource for Roster {
    async fn fetch_rankings(
        &self,
        character: &CharacterKey,
        encounter_ids: &[u32],
        _difficulty: u32,
    ) -> Result<HashMap<u32, Ranking>, ServiceError> {
        let entry = self.lookup(character)?;
        Ok(encounter_ids
            .iter()
            .filter_map(|id| entry.rankings.get(id).map(|r| (*id, *r)))
            .collect())
    }
}
