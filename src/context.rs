use crate::config::AppConfig;
use crate::display::MemorySurface;
use crate::error::ConfigError;
use crate::guild::GuildStore;
use crate::handlers::{Progboard, Services};
use crate::offline::{ReportDirectory, Roster};
use std::path::Path;
use std::sync::Arc;

/// Holds all shared state for the REPL: the loaded configuration, the request
/// handlers and the in-memory surface leaderboards are posted to.
pub struct CliContext {
    pub config: AppConfig,
    pub progboard: Progboard,
    pub surface: Arc<MemorySurface>,
}

impl CliContext {
    pub fn new(config: AppConfig) -> Result<Self, ConfigError> {
        let roster = match Roster::load(Path::new(&config.roster_file)) {
            Ok(roster) => roster,
            Err(e) => {
                tracing::warn!(path = %config.roster_file, error = %e, "Starting with an empty roster");
                Roster::default()
            }
        };
        let roster = Arc::new(roster);
        let surface = Arc::new(MemorySurface::new());

        let services = Services {
            ownership: roster.clone(),
            rankings: roster,
            reports: Arc::new(ReportDirectory::new(&config.reports_directory)),
            display: surface.clone(),
        };
        let guilds = GuildStore::from_config(&config)?;

        Ok(Self {
            progboard: Progboard::new(guilds, services),
            surface,
            config,
        })
    }

    /// Load the persisted configuration, falling back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let config = AppConfig::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load configuration, using defaults");
            AppConfig::default()
        });
        Self::new(config)
    }

    /// Logging, configuration and leaderboard restoration, in that order.
    pub async fn start() -> Result<Self, ConfigError> {
        crate::logging::init();
        let ctx = Self::load()?;
        ctx.restore().await;
        Ok(ctx)
    }

    /// Re-adopt leaderboards posted before a restart.
    pub async fn restore(&self) {
        self.progboard
            .guilds
            .restore_all(self.progboard.display())
            .await;
    }
}
