use clap::{Parser, Subcommand};

use progboard::commands;
use progboard::readline;
use progboard::{CliContext, CountRequest, LeaderboardCommand, ProgRequest};

#[tokio::main]
async fn main() -> Result<(), String> {
    let ctx = CliContext::start().await.map_err(|e| e.to_string())?;

    while let Some(line) = readline()? {
        match respond(&line, &ctx).await {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(err) => println!("{err}"),
        }
    }

    commands::exit();
    Ok(())
}

#[derive(Parser)]
#[command(version, about = "progboard")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Args)]
struct Requester {
    #[arg(short, long, default_value = "local")]
    guild: String,
    #[arg(short, long, default_value = "local")]
    user: String,
}

#[derive(clap::Args)]
struct Character {
    #[arg(short, long, default_value = "")]
    world: String,
    #[arg(short, long, default_value = "")]
    first: String,
    #[arg(short, long, default_value = "")]
    last: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a report for progression roles
    Prog {
        #[command(flatten)]
        requester: Requester,
        #[command(flatten)]
        character: Character,
        #[arg(short, long, default_value = "")]
        report: String,
    },
    /// Submit a character's kill count
    Count {
        #[command(flatten)]
        requester: Requester,
        #[command(flatten)]
        character: Character,
        #[arg(short, long, default_value = "")]
        encounter: String,
    },
    Show {
        #[arg(short, long, default_value = "local")]
        guild: String,
        #[arg(short, long)]
        encounter: String,
    },
    /// Print a leaderboard as posted
    State {
        #[arg(short, long, default_value = "local")]
        guild: String,
        #[arg(short, long)]
        encounter: String,
    },
    Refresh {
        #[arg(short, long, default_value = "local")]
        guild: String,
    },
    Clear {
        #[arg(short, long, default_value = "local")]
        guild: String,
        #[arg(short, long)]
        encounter: String,
    },
    RefreshKills {
        #[arg(short, long, default_value = "local")]
        guild: String,
        #[arg(short, long)]
        encounter: String,
    },
    /// Print configuration, for one guild or all of them
    Config {
        #[arg(short, long)]
        guild: Option<String>,
        /// Write the active configuration to the config file
        #[arg(short, long)]
        save: bool,
    },
    Exit,
}

async fn respond(line: &str, ctx: &CliContext) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "progboard".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    match cli.command {
        Some(Commands::Prog {
            requester,
            character,
            report,
        }) => {
            let request = ProgRequest {
                guild_id: requester.guild,
                user_id: requester.user,
                world: character.world,
                first_name: character.first,
                last_name: character.last,
                report,
            };
            commands::prog(ctx, request).await
        }
        Some(Commands::Count {
            requester,
            character,
            encounter,
        }) => {
            let request = CountRequest {
                guild_id: requester.guild,
                user_id: requester.user,
                world: character.world,
                first_name: character.first,
                last_name: character.last,
                encounter,
            };
            commands::count(ctx, request).await
        }
        Some(Commands::Show { guild, encounter }) => {
            commands::leaderboard(ctx, &guild, LeaderboardCommand::Show { encounter }).await
        }
        Some(Commands::State { guild, encounter }) => commands::posted(ctx, &guild, &encounter).await,
        Some(Commands::Refresh { guild }) => {
            commands::leaderboard(ctx, &guild, LeaderboardCommand::Refresh).await
        }
        Some(Commands::Clear { guild, encounter }) => {
            commands::leaderboard(ctx, &guild, LeaderboardCommand::Clear { encounter }).await
        }
        Some(Commands::RefreshKills { guild, encounter }) => {
            commands::leaderboard(ctx, &guild, LeaderboardCommand::RefreshKillCounts { encounter }).await
        }
        Some(Commands::Config { guild, save }) => {
            if save {
                commands::save_settings(ctx);
            } else {
                commands::show_settings(ctx, guild.as_deref());
            }
        }
        Some(Commands::Exit) => {
            commands::exit();
            return Ok(true);
        }
        None => {}
    }
    Ok(false)
}
