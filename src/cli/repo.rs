//! Repository registration commands.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::cli::{connect, open_store};
use crate::data::{to_yaml, RepositoryRecord, RepositoryStore};
use crate::git::RepoLocator;

/// Repository registration.
#[derive(Parser)]
pub struct RepoCommand {
    /// Repo subcommand to execute.
    #[command(subcommand)]
    pub command: RepoSubcommands,
}

/// Repo subcommands.
#[derive(Subcommand)]
pub enum RepoSubcommands {
    /// Registers a repository after checking it exists on GitHub.
    Add {
        /// Repository URL, e.g. https://github.com/owner/repo.
        url: String,
    },
    /// Lists registered repositories.
    List,
    /// Shows one registered repository.
    Show {
        /// Repository URL.
        url: String,
    },
    /// Forgets a registered repository; GitHub is not touched.
    Remove {
        /// Repository URL.
        url: String,
    },
}

impl RepoCommand {
    /// Executes the repo command.
    pub async fn execute(self) -> Result<()> {
        match self.command {
            RepoSubcommands::Add { url } => {
                let scrubber = connect()?;
                let record = scrubber.register(&url).await?;
                println!("✅ Registered {}", record.url);
                print!("{}", to_yaml(&record)?);
            }
            RepoSubcommands::List => {
                let records = open_store()?.list()?;
                if records.is_empty() {
                    println!("No repositories registered. Add one with `commit-scrub repo add <url>`.");
                } else {
                    for record in &records {
                        println!("{}", summary_line(record));
                    }
                }
            }
            RepoSubcommands::Show { url } => {
                let record = find(&open_store()?, &url)?;
                print!("{}", to_yaml(&record)?);
                if record.status.is_transient() {
                    eprintln!(
                        "warning: status is {}; an operation is running or was interrupted",
                        record.status
                    );
                }
            }
            RepoSubcommands::Remove { url } => {
                let store = open_store()?;
                let record = find(&store, &url)?;
                store.delete(&record.id)?;
                println!("🗑️  Removed {}", record.url);
            }
        }
        Ok(())
    }
}

/// Looks up a registered repository by any accepted form of its URL.
pub(crate) fn find(store: &dyn RepositoryStore, url: &str) -> Result<RepositoryRecord> {
    let locator = RepoLocator::parse(url)?;
    store
        .get_by_url(&locator.canonical_url())?
        .with_context(|| format!("Repository not registered: {}", locator.canonical_url()))
}

/// One-line listing of a record.
pub(crate) fn summary_line(record: &RepositoryRecord) -> String {
    let found = record
        .tool_commits_found
        .map_or_else(|| "-".to_string(), |n| n.to_string());
    let scanned = record
        .last_scanned_at
        .map_or_else(|| "never".to_string(), |at| at.format("%Y-%m-%d %H:%M").to_string());
    format!(
        "{:<50} {:<14} found: {:<4} scanned: {}{}",
        record.url,
        record.status,
        found,
        scanned,
        if record.private { " (private)" } else { "" }
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::data::{MemoryStore, NewRepository, RepositoryStatus};

    fn store_with_hello() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .create(NewRepository {
                url: "https://github.com/octo/hello".to_string(),
                name: "hello".to_string(),
                owner: "octo".to_string(),
                private: true,
                default_branch: "main".to_string(),
            })
            .unwrap();
        store
    }

    #[test]
    fn find_accepts_url_variants() {
        let store = store_with_hello();
        let record = find(&store, "https://github.com/octo/hello.git/").unwrap();
        assert_eq!(record.name, "hello");
    }

    #[test]
    fn find_unregistered_fails() {
        let err = find(&store_with_hello(), "https://github.com/octo/other").unwrap_err();
        assert!(err.to_string().contains("not registered"));
    }

    #[test]
    fn summary_line_shows_state() {
        let record = find(&store_with_hello(), "https://github.com/octo/hello").unwrap();
        let line = summary_line(&record);
        assert!(line.contains("pending"));
        assert!(line.contains("never"));
        assert!(line.ends_with("(private)"));
        assert_eq!(record.status, RepositoryStatus::Pending);
    }
}
