//! CLI interface for commit-scrub.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::core::Scrubber;
use crate::data::JsonFileStore;
use crate::github::{default_token_provider, GitHubClient};
use crate::utils::check_github_credentials;

pub mod cleanup;
pub mod repo;
pub mod scan;
pub mod status;

/// commit-scrub: finds tool-generated commits and rewrites them out of
/// GitHub history.
#[derive(Parser)]
#[command(name = "commit-scrub")]
#[command(about = "Finds and scrubs auto-generated commits from GitHub history", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The main command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Manages registered repositories.
    Repo(repo::RepoCommand),
    /// Classifies a repository's recent history.
    Scan(scan::ScanCommand),
    /// Rewrites selected commits out of a repository's default branch.
    Cleanup(cleanup::CleanupCommand),
    /// Shows the GitHub connection status.
    Status(status::StatusCommand),
}

impl Cli {
    /// Executes the CLI command.
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Repo(repo_cmd) => repo_cmd.execute().await,
            Commands::Scan(scan_cmd) => scan_cmd.execute().await,
            Commands::Cleanup(cleanup_cmd) => cleanup_cmd.execute().await,
            Commands::Status(status_cmd) => status_cmd.execute().await,
        }
    }
}

/// Opens the repository store at its configured location.
pub(crate) fn open_store() -> Result<JsonFileStore> {
    JsonFileStore::open_default().context("Failed to locate repository store")
}

/// Builds a scrubber backed by the GitHub API and the on-disk store.
///
/// Fails early when no credential source is configured.
pub(crate) fn connect() -> Result<Scrubber> {
    let source = check_github_credentials()?;
    tracing::debug!(%source, "Using GitHub credentials");

    let tokens = default_token_provider()?;
    let client = GitHubClient::from_env(tokens)?;
    Ok(Scrubber::new(Box::new(client), Box::new(open_store()?)))
}
