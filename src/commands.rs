use crate::config::GuildConfig;
use crate::context::CliContext;
use crate::display::DisplayPayload;
use crate::handlers::{CountRequest, LeaderboardCommand, ProgRequest};
use std::io::Write;

pub async fn prog(ctx: &CliContext, request: ProgRequest) {
    match ctx.progboard.submit_prog(request).await {
        Ok(reply) => {
            println!("{reply}");
            for change in &reply.changes {
                for role in &change.grant {
                    println!("  + {}", role.name);
                }
                for role in &change.revoke {
                    println!("  - {}", role.name);
                }
            }
        }
        Err(e) => println!("{e}"),
    }
}

pub async fn count(ctx: &CliContext, request: CountRequest) {
    match ctx.progboard.submit_count(request).await {
        Ok(reply) => println!("{reply}"),
        Err(e) => println!("{e}"),
    }
}

pub async fn leaderboard(ctx: &CliContext, guild_id: &str, command: LeaderboardCommand) {
    match ctx.progboard.leaderboard_command(guild_id, command).await {
        Ok(text) => println!("{text}"),
        Err(e) => println!("{e}"),
    }
}

/// Print a leaderboard as it currently appears on the display surface.
pub async fn posted(ctx: &CliContext, guild_id: &str, encounter: &str) {
    let Some(guild) = ctx.progboard.guilds.get(guild_id).await else {
        println!("Unknown guild {guild_id}");
        return;
    };
    let guild = guild.lock().await;
    let Some(board) = guild.leaderboard(encounter) else {
        println!("No leaderboard exists for {encounter} yet.");
        return;
    };
    let Some(handle) = &board.message_id else {
        println!("The {encounter} leaderboard has not been posted yet.");
        return;
    };

    match ctx.surface.payload(&board.channel_id, handle).await {
        Some(payload) => {
            println!("[{} / {handle}]", board.channel_id);
            print_payload(&payload);
        }
        None => println!("Message {handle} is gone from {}.", board.channel_id),
    }
}

fn print_payload(payload: &DisplayPayload) {
    println!("{}", payload.title);
    println!("{}", payload.description);
    for field in &payload.fields {
        println!("\n{}\n{}", field.name, field.value.trim_end());
    }
    if let Some(timestamp) = &payload.timestamp {
        println!("\nupdated {timestamp}");
    }
}

pub fn show_settings(ctx: &CliContext, guild_id: Option<&str>) {
    if let Some(id) = guild_id {
        match ctx.config.guild(id) {
            Ok(guild) => print_guild_config(guild),
            Err(e) => println!("{e}"),
        }
        return;
    }

    if let Ok(path) = confy::get_configuration_file_path("progboard", None) {
        println!("config file: {}", path.display());
    }
    println!("reports directory: {}", ctx.config.reports_directory);
    println!("roster file: {}", ctx.config.roster_file);
    for guild in &ctx.config.guilds {
        print_guild_config(guild);
    }
}

fn print_guild_config(guild: &GuildConfig) {
    let channel = if guild.leaderboard_enabled {
        guild.leaderboard_channel_id.as_str()
    } else {
        "disabled"
    };
    println!("\n{} ({}) leaderboards: {}", guild.name, guild.id, channel);
    for encounter in &guild.encounters {
        println!(
            "  {:<45} ids {:?}, {} prog roles",
            encounter.name,
            encounter.ids,
            encounter.prog_roles.len()
        );
    }
}

/// Write the active configuration back to disk, creating the file on first use.
pub fn save_settings(ctx: &CliContext) {
    match ctx.config.save() {
        Ok(()) => println!("configuration saved"),
        Err(e) => println!("{e}"),
    }
}

pub fn exit() {
    println!("quitting...");
    let _ = std::io::stdout().flush();
}
