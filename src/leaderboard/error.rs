//! Error types for leaderboard display reconciliation

use crate::display::DisplayHandle;
use crate::error::ServiceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("Could not post leaderboard for {encounter}")]
    Send {
        encounter: String,
        #[source]
        source: ServiceError,
    },

    #[error("override message {handle} for {encounter} is invalid or inaccessible")]
    InvalidOverride {
        encounter: String,
        handle: DisplayHandle,
        #[source]
        source: ServiceError,
    },

    #[error("failed to read recent messages in channel {channel}")]
    History {
        channel: String,
        #[source]
        source: ServiceError,
    },
}
