//! Registered repository records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scan and cleanup state of a registered repository.
///
/// `Scanning` and `Processing` are transient; they are replaced once the
/// corresponding operation finishes, successfully or not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryStatus {
    /// Registered, never scanned.
    #[default]
    Pending,
    /// Scan in progress.
    Scanning,
    /// Last scan or cleanup found no tool-generated commits left.
    Clean,
    /// Last scan found tool-generated commits.
    NeedsCleanup,
    /// History rewrite in progress.
    Processing,
    /// Last scan or cleanup failed.
    Error,
}

impl RepositoryStatus {
    /// Returns whether the status marks an operation in flight.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Scanning | Self::Processing)
    }
}

impl fmt::Display for RepositoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Scanning => "scanning",
            Self::Clean => "clean",
            Self::NeedsCleanup => "needs_cleanup",
            Self::Processing => "processing",
            Self::Error => "error",
        };
        f.pad(label)
    }
}

/// Repository registered for scanning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    /// Record identifier.
    pub id: String,
    /// Canonical web URL; unique among records.
    pub url: String,
    /// Repository name.
    pub name: String,
    /// Owner login.
    pub owner: String,
    /// Whether the repository is private.
    pub private: bool,
    /// Default branch reported at registration.
    pub default_branch: String,
    /// Scan and cleanup state.
    pub status: RepositoryStatus,
    /// Completion time of the last successful scan.
    #[serde(default)]
    pub last_scanned_at: Option<DateTime<Utc>>,
    /// Tool-generated commits found by the last scan, minus those cleaned since.
    #[serde(default)]
    pub tool_commits_found: Option<usize>,
}

/// Fields supplied when registering a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRepository {
    /// Canonical web URL.
    pub url: String,
    /// Repository name.
    pub name: String,
    /// Owner login.
    pub owner: String,
    /// Whether the repository is private.
    pub private: bool,
    /// Default branch.
    pub default_branch: String,
}

/// Partial update of a repository record; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryUpdate {
    /// New status.
    pub status: Option<RepositoryStatus>,
    /// New last-scan time.
    pub last_scanned_at: Option<DateTime<Utc>>,
    /// New tool-commit count.
    pub tool_commits_found: Option<usize>,
    /// New default branch.
    pub default_branch: Option<String>,
}

impl RepositoryUpdate {
    /// Update that only changes the status.
    pub fn status(status: RepositoryStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Applies the update to a record.
    pub fn apply(self, record: &mut RepositoryRecord) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(at) = self.last_scanned_at {
            record.last_scanned_at = Some(at);
        }
        if let Some(count) = self.tool_commits_found {
            record.tool_commits_found = Some(count);
        }
        if let Some(branch) = self.default_branch {
            record.default_branch = branch;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&RepositoryStatus::NeedsCleanup).unwrap();
        assert_eq!(json, "\"needs_cleanup\"");
        assert_eq!(RepositoryStatus::NeedsCleanup.to_string(), "needs_cleanup");
    }

    #[test]
    fn transient_states() {
        assert!(RepositoryStatus::Scanning.is_transient());
        assert!(RepositoryStatus::Processing.is_transient());
        assert!(!RepositoryStatus::Error.is_transient());
    }

    #[test]
    fn update_leaves_unset_fields() {
        let mut record = RepositoryRecord {
            id: "1".to_string(),
            url: "https://github.com/octo/hello".to_string(),
            name: "hello".to_string(),
            owner: "octo".to_string(),
            private: false,
            default_branch: "main".to_string(),
            status: RepositoryStatus::Pending,
            last_scanned_at: None,
            tool_commits_found: Some(3),
        };
        RepositoryUpdate::status(RepositoryStatus::Error).apply(&mut record);
        assert_eq!(record.status, RepositoryStatus::Error);
        assert_eq!(record.tool_commits_found, Some(3));
        assert_eq!(record.default_branch, "main");
    }
}
