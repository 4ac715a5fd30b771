pub mod character;
pub mod commands;
pub mod config;
pub mod context;
pub mod display;
pub mod error;
pub mod fight;
pub mod guild;
pub mod handlers;
pub mod ladder;
pub mod leaderboard;
pub mod logging;
pub mod offline;
pub mod progression;
pub mod repl;
pub mod services;

pub use character::CharacterKey;
pub use context::CliContext;
pub use handlers::{CountRequest, LeaderboardCommand, ProgRequest, Progboard, Services};
pub use repl::readline;
