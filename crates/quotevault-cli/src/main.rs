//! QuoteVault CLI - browse, collect, and share quotes from the terminal
//!
//! Running `quotevault` with no subcommand shows today's quote.

mod auth;
mod cli;
mod commands;
mod config_profiles;
mod error;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::auth_cmd::run_auth;
use crate::commands::collections::run_collections;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::export::{run_backdrops, run_export, ExportOptions};
use crate::commands::favorites::{run_like, run_likes};
use crate::commands::quotes::{run_daily, run_feed, run_share, run_show};
use crate::commands::theme::run_theme;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("quotevault=info")),
        )
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();

    match cli.command {
        None => run_daily(profile, false).await?,
        Some(Commands::Daily { json }) => run_daily(profile, json).await?,
        Some(Commands::Feed {
            pages,
            category,
            json,
        }) => run_feed(profile, pages, &category, json).await?,
        Some(Commands::Show { id, json }) => run_show(profile, &id, json).await?,
        Some(Commands::Share { id }) => run_share(profile, id.as_deref()).await?,
        Some(Commands::Like { id }) => run_like(profile, &id).await?,
        Some(Commands::Likes { json }) => run_likes(profile, json).await?,
        Some(Commands::Collections { command }) => run_collections(command, profile).await?,
        Some(Commands::Export {
            id,
            backdrop,
            background,
            output_dir,
            json,
        }) => {
            let options = ExportOptions {
                id: id.as_deref(),
                backdrop: backdrop.as_deref(),
                background: background.as_deref(),
                output_dir: output_dir.as_deref(),
                json,
            };
            run_export(profile, options).await?;
        }
        Some(Commands::Backdrops { json }) => run_backdrops(profile, json).await?,
        Some(Commands::Theme { mode }) => run_theme(profile, mode)?,
        Some(Commands::Completions { shell, output }) => {
            run_completions(shell, output.as_deref())?;
        }
        Some(Commands::Config { command }) => run_config(command, profile)?,
        Some(Commands::Auth { command }) => run_auth(command, profile).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests;
