//! Commit records as seen through the remote commit graph.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::git::SHORT_HASH_LEN;

/// Name, email and timestamp of a commit author or committer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Timestamp with the original timezone offset.
    pub date: DateTime<FixedOffset>,
}

/// Commit as returned by the paginated commit listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    /// Full commit SHA.
    pub id: String,
    /// Full commit message.
    pub message: String,
    /// Commit author.
    pub author: Identity,
    /// Parent commit SHAs, in order.
    pub parent_ids: Vec<String>,
    /// Web URL of the commit.
    pub html_url: String,
}

/// Full commit content needed to recreate a commit object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Full commit SHA.
    pub id: String,
    /// Full commit message.
    pub message: String,
    /// Commit author.
    pub author: Identity,
    /// Commit committer.
    pub committer: Identity,
    /// Tree SHA the commit snapshots.
    pub tree_id: String,
    /// Parent commit SHAs, in order.
    pub parent_ids: Vec<String>,
}

/// Payload for creating a new commit object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCommit {
    /// Commit message.
    pub message: String,
    /// Tree SHA.
    pub tree_id: String,
    /// Parent commit SHAs.
    pub parent_ids: Vec<String>,
    /// Author identity, preserved from the original commit.
    pub author: Identity,
    /// Committer identity, dated at rewrite time.
    pub committer: Identity,
}

/// Commit listing entry labelled by the classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedCommit {
    /// Full commit SHA.
    pub id: String,
    /// Full commit message.
    pub message: String,
    /// Author display name.
    pub author: String,
    /// Author email address.
    pub author_email: String,
    /// Authored timestamp.
    pub date: DateTime<FixedOffset>,
    /// Web URL of the commit.
    pub url: String,
    /// Whether the heuristics consider this commit tool-generated.
    pub is_tool_generated: bool,
    /// Human readable marker when the commit names the tool explicitly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Prompt text recorded in the commit's metadata, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_prompt: Option<String>,
}

/// Returns the abbreviated form of a commit SHA for display.
pub fn short_id(id: &str) -> &str {
    id.get(..SHORT_HASH_LEN).unwrap_or(id)
}
