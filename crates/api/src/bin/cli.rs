//! Operator commands that run outside the HTTP server.
//!
//! ```text
//! storyverse-cli import-manuscript --user-id 1 [--file raw.md] [--dry-run]
//! storyverse-cli link-branch-points --universe-id 7
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use storyverse_core::types::DbId;
use storyverse_db::repositories::{ManuscriptRepo, UniverseRepo, UserRepo};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "storyverse-cli", version, about = "Storyverse maintenance commands")]
struct Cli {
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest the manuscript document into a new universe owned by a user.
    ImportManuscript {
        #[arg(long)]
        user_id: DbId,
        #[arg(long, env = "MANUSCRIPT_PATH", default_value = "raw.md", value_name = "PATH")]
        file: PathBuf,
        /// Run the whole import, then roll it back.
        #[arg(long)]
        dry_run: bool,
    },
    /// Flag the manuscript's branch points and link its alternate timelines.
    LinkBranchPoints {
        #[arg(long)]
        universe_id: DbId,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storyverse_db=info,storyverse_api=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let pool = storyverse_db::create_pool(&cli.database_url)
        .await
        .context("failed to connect to database")?;

    match cli.command {
        Command::ImportManuscript {
            user_id,
            file,
            dry_run,
        } => {
            UserRepo::find_by_id(&pool, user_id)
                .await?
                .with_context(|| format!("user {user_id} does not exist"))?;

            let outcome = ManuscriptRepo::ingest_file(&pool, user_id, &file, dry_run).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);

            if outcome.success {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Command::LinkBranchPoints { universe_id } => {
            UniverseRepo::find_by_id(&pool, universe_id)
                .await?
                .with_context(|| format!("universe {universe_id} does not exist"))?;

            let report = ManuscriptRepo::link_branch_points(&pool, universe_id)
                .await
                .context("linking branch points failed")?;
            println!("{}", serde_json::to_string_pretty(&report)?);

            Ok(ExitCode::SUCCESS)
        }
    }
}
