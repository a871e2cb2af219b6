//! Bookvault CLI - capture bookings and keep the note vault in step
//!
//! Records land in the local store first. Each capture is mirrored into the
//! vault right away on a best-effort basis, and `bookvault sync` catches up
//! on anything the inline write missed.

mod cli;
mod commands;
mod error;

use std::path::Path;

use bookvault_core::config::{Settings, SettingsOverrides};
use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::book::{run_book, BookArgs};
use crate::commands::completions::run_completions;
use crate::commands::consult::run_consult;
use crate::commands::delete::run_delete;
use crate::commands::list::{run_list, run_show};
use crate::commands::status::run_status;
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    load_env(cli.env_file.as_deref())?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bookvault=info".parse().unwrap())
                .add_directive("bookvault_core=info".parse().unwrap()),
        )
        .init();

    let settings = Settings::resolve(SettingsOverrides {
        db_path: cli.db_path,
        vault_path: cli.vault_path,
        state_path: cli.state_path,
    });
    tracing::debug!(?settings, "Resolved settings");

    match cli.command {
        Commands::Book {
            name,
            contact,
            contact_type,
            at,
            source,
            content,
        } => {
            let args = BookArgs {
                name: &name,
                contact: &contact,
                contact_type: contact_type.as_deref(),
                at: &at,
                source: source.as_deref(),
                content: &content,
            };
            run_book(args, &settings).await?;
        }
        Commands::Consult {
            contact,
            source,
            message,
        } => {
            run_consult(contact.as_deref(), source.as_deref(), &message, &settings).await?;
        }
        Commands::List { limit, json } => run_list(limit, json, &settings).await?,
        Commands::Show { id, json } => run_show(&id, json, &settings).await?,
        Commands::Status { id, status } => run_status(&id, &status, &settings).await?,
        Commands::Delete { id } => run_delete(&id, &settings).await?,
        Commands::Sync { dry_run, json } => run_sync(dry_run, json, &settings).await?,
        Commands::Completions { shell, output } => {
            run_completions(shell, output.as_deref())?;
        }
    }

    Ok(())
}

/// Load `.env` from the working directory, then an explicit env file.
fn load_env(env_file: Option<&Path>) -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    if let Some(path) = env_file {
        dotenvy::from_path(path)
            .map_err(|error| CliError::Config(format!("{}: {error}", path.display())))?;
    }

    Ok(())
}
