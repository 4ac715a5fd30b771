//! Narrow interfaces to the external services this crate depends on.

use crate::character::CharacterKey;
use crate::error::ServiceError;
use crate::fight::FightBatch;
use async_trait::async_trait;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// A character's ranking for one log-source encounter id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ranking {
    pub encounter_id: u32,
    #[serde(default)]
    pub total_kills: u32,
    #[serde(default)]
    pub cleared: bool,
}

/// Proves a chat user owns a game character.
#[async_trait]
pub trait OwnershipVerifier: Send + Sync {
    async fn verify_ownership(&self, character: &CharacterKey, user_id: &str) -> Result<bool, ServiceError>;
}

#[async_trait]
pub trait RankingSource: Send + Sync {
    async fn fetch_rankings(
        &self,
        character: &CharacterKey,
        encounter_ids: &[u32],
        difficulty: u32,
    ) -> Result<HashMap<u32, Ranking>, ServiceError>;
}

#[async_trait]
pub trait ReportSource: Send + Sync {
    async fn fetch_fights(&self, report_id: &str) -> Result<FightBatch, ServiceError>;
}

/// Sum of kills over the source ids whose ranking reports a clear.
/// Saturates at `u32::MAX`.
pub fn total_kills(rankings: &HashMap<u32, Ranking>, encounter_ids: &[u32]) -> u32 {
    encounter_ids
        .iter()
        .filter_map(|id| rankings.get(id))
        .filter(|ranking| ranking.cleared)
        .fold(0u32, |total, ranking| total.saturating_add(ranking.total_kills))
}
