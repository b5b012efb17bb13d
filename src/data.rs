//! Repository records, their persistence, and report output.

use serde::{Deserialize, Serialize};

use crate::git::{ClassifiedCommit, RewriteResult};

pub mod repository;
pub mod store;
pub mod yaml;

pub use repository::{NewRepository, RepositoryRecord, RepositoryStatus, RepositoryUpdate};
pub use store::{JsonFileStore, MemoryStore, RepositoryStore};
pub use yaml::*;

/// Result of scanning a repository's default branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Repository record after the scan.
    pub repository: RepositoryRecord,
    /// Commits examined, newest first.
    pub commits: Vec<ClassifiedCommit>,
}

impl ScanReport {
    /// Commits classified as tool-generated.
    pub fn tool_generated(&self) -> impl Iterator<Item = &ClassifiedCommit> {
        self.commits.iter().filter(|c| c.is_tool_generated)
    }
}

/// Result of a completed history rewrite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Repository record after the rewrite.
    pub repository: RepositoryRecord,
    /// Rebuild outcome.
    pub result: RewriteResult,
}

/// Connection state of the configured GitHub credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionStatus {
    /// Whether a credential was found and accepted by the remote.
    pub connected: bool,
    /// Login of the authenticated account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    /// Display name of the authenticated account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Avatar image URL of the authenticated account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Reason the connection check failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
