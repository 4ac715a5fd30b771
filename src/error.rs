//! Error types shared across request handling

use thiserror::Error;

/// Errors during configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration")]
    Load(#[from] confy::ConfyError),

    #[error("failed to save configuration: {0}")]
    Save(#[source] confy::ConfyError),

    #[error("guild '{id}' is not configured")]
    UnknownGuild { id: String },

    #[error("encounter at position {position} in guild '{guild}' has no name")]
    UnnamedEncounter { guild: String, position: usize },

    #[error("encounter '{name}' in guild '{guild}' has no log source ids")]
    NoSourceIds { guild: String, name: String },

    #[error("encounter '{name}' is configured twice in guild '{guild}'")]
    DuplicateEncounter { guild: String, name: String },
}

/// Failures reported by an external collaborator (ranking lookup, report
/// parser, ownership check, display surface).
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{service} is unavailable: {reason}")]
    Unavailable { service: &'static str, reason: String },

    #[error("{what} was not found")]
    NotFound { what: String },

    #[error("malformed response from {service}: {detail}")]
    Malformed { service: &'static str, detail: String },
}

/// Request-scoped failures. The `Display` text is sent back to the requester
/// verbatim; none of these leave state modified.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("`/{command}` command failed! Please input your {field}.")]
    MissingField {
        command: &'static str,
        field: &'static str,
    },

    #[error("This server is not configured for progboard.")]
    UnknownGuild { id: String },

    #[error("`{name}` is not a valid encounter!")]
    UnknownEncounter { name: String },

    #[error(
        "I could not verify your ownership of `{character}`!\nIf this is your character, add the following code to your profile and try again:\n\n**{code}**"
    )]
    OwnershipNotVerified { character: String, code: String },

    #[error("Could not verify ownership of `{character}`: {source}")]
    OwnershipCheck {
        character: String,
        #[source]
        source: ServiceError,
    },

    #[error("{context}: {source}\n{hint}")]
    Lookup {
        context: String,
        hint: &'static str,
        #[source]
        source: ServiceError,
    },
}
