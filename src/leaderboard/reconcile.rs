//! Keeps posted leaderboards in sync with in-memory state.

use super::{DisplayError, Leaderboard, parse_rankings, render_payload};
use crate::display::{DisplayHandle, DisplayPayload, DisplaySurface};
use hashbrown::HashMap;

/// How many recent channel messages are scanned for lost leaderboards.
pub const RECENT_SCAN_LIMIT: usize = 100;

/// Push the current leaderboard to its channel.
///
/// Edits the stored message in place when there is one, falling back to a
/// new message if the edit fails. A handle left in the legacy flat mapping is
/// migrated onto the leaderboard and removed from the mapping. Returns the
/// handle now on record, or `None` for leaderboards without a channel.
pub async fn reconcile(
    surface: &dyn DisplaySurface,
    leaderboard: &mut Leaderboard,
    legacy: &mut HashMap<String, DisplayHandle>,
) -> Result<Option<DisplayHandle>, DisplayError> {
    if leaderboard.channel_id.is_empty() {
        return Ok(None);
    }

    if let Some(handle) = legacy.remove(&leaderboard.encounter)
        && leaderboard.message_id.is_none()
    {
        tracing::info!(encounter = %leaderboard.encounter, %handle, "Migrated legacy leaderboard handle");
        leaderboard.message_id = Some(handle);
    }

    let payload = render_payload(leaderboard);

    if let Some(handle) = leaderboard.message_id.clone() {
        match surface.edit(&leaderboard.channel_id, &handle, &payload).await {
            Ok(()) => {
                tracing::debug!(encounter = %leaderboard.encounter, %handle, "Updated existing leaderboard message");
                return Ok(Some(handle));
            }
            Err(e) => {
                tracing::warn!(
                    encounter = %leaderboard.encounter,
                    %handle,
                    error = %e,
                    "Failed to edit leaderboard message, posting a new one"
                );
            }
        }
    }

    let handle = send_new(surface, leaderboard, &payload).await?;
    Ok(Some(handle))
}

async fn send_new(
    surface: &dyn DisplaySurface,
    leaderboard: &mut Leaderboard,
    payload: &DisplayPayload,
) -> Result<DisplayHandle, DisplayError> {
    let handle = surface
        .send(&leaderboard.channel_id, payload)
        .await
        .map_err(|source| DisplayError::Send {
            encounter: leaderboard.encounter.clone(),
            source,
        })?;
    tracing::info!(encounter = %leaderboard.encounter, %handle, "Created new leaderboard message");
    leaderboard.message_id = Some(handle.clone());
    Ok(handle)
}

/// What `restore_leaderboards` managed to recover.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    pub from_overrides: Vec<String>,
    pub detected: Vec<String>,
    /// Encounters that will get a fresh message on their next reconcile.
    pub missing: Vec<String>,
}

/// Reattach leaderboards to messages posted before a restart.
///
/// Manual overrides are applied first and must resolve to an existing
/// message. Leaderboards still lacking a handle are then matched against the
/// bot's recent messages in `channel` by title. Entries found in a matched
/// message replace the in-memory entries.
pub async fn restore_leaderboards(
    surface: &dyn DisplaySurface,
    channel: &str,
    leaderboards: &mut HashMap<String, Leaderboard>,
    overrides: &HashMap<String, DisplayHandle>,
) -> Result<RestoreSummary, DisplayError> {
    let mut summary = RestoreSummary::default();
    if channel.is_empty() {
        return Ok(summary);
    }

    for (encounter, handle) in overrides {
        let Some(leaderboard) = leaderboards.get_mut(encounter) else {
            continue;
        };
        match surface.fetch(channel, handle).await {
            Ok(message) => {
                leaderboard.message_id = Some(handle.clone());
                let restored = message.payload.as_ref().map_or(0, |p| adopt_entries(leaderboard, p));
                tracing::info!(%encounter, %handle, entries = restored, "Applied manual leaderboard override");
                summary.from_overrides.push(encounter.clone());
            }
            Err(source) => {
                let error = DisplayError::InvalidOverride {
                    encounter: encounter.clone(),
                    handle: handle.clone(),
                    source,
                };
                tracing::warn!(error = %error, "Skipping manual leaderboard override");
            }
        }
    }

    let mut needing: Vec<String> = leaderboards
        .iter()
        .filter(|(_, lb)| lb.message_id.is_none())
        .map(|(name, _)| name.clone())
        .collect();
    needing.sort();

    if needing.is_empty() {
        tracing::debug!("All leaderboards already have message handles");
        return Ok(summary);
    }

    tracing::info!(count = needing.len(), "Scanning channel history for leaderboard messages");

    let messages = surface
        .fetch_recent(channel, RECENT_SCAN_LIMIT)
        .await
        .map_err(|source| DisplayError::History {
            channel: channel.to_string(),
            source,
        })?;

    for message in messages.iter().filter(|m| m.from_self) {
        let Some(payload) = &message.payload else {
            continue;
        };
        let Some(position) = needing.iter().position(|name| payload.title.contains(name.as_str())) else {
            continue;
        };
        let encounter = needing.remove(position);
        if let Some(leaderboard) = leaderboards.get_mut(&encounter) {
            leaderboard.message_id = Some(message.handle.clone());
            let restored = adopt_entries(leaderboard, payload);
            tracing::info!(%encounter, handle = %message.handle, entries = restored, "Detected leaderboard message");
            summary.detected.push(encounter);
        }
        if needing.is_empty() {
            break;
        }
    }

    for encounter in &needing {
        tracing::warn!(%encounter, "No existing leaderboard message found, a new one will be created");
    }
    summary.missing = needing;

    Ok(summary)
}

fn adopt_entries(leaderboard: &mut Leaderboard, payload: &DisplayPayload) -> usize {
    let entries = parse_rankings(payload);
    let count = entries.len();
    if count > 0 {
        leaderboard.restore_entries(entries);
    }
    count
}
