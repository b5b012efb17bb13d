//! GitHub REST API request and response bodies.
//!
//! Required fields are non-optional so a malformed response fails to decode
//! instead of being silently defaulted.

use serde::{Deserialize, Serialize};

use crate::git::commit::{CommitRecord, CommitSummary, Identity, NewCommit};
use crate::github::{AuthenticatedUser, RepositoryInfo};

#[derive(Deserialize)]
pub(crate) struct OwnerResponse {
    pub login: String,
}

/// `GET /repos/{owner}/{repo}`.
#[derive(Deserialize)]
pub(crate) struct RepoResponse {
    pub name: String,
    pub owner: OwnerResponse,
    pub private: bool,
    pub html_url: String,
    pub default_branch: String,
}

impl From<RepoResponse> for RepositoryInfo {
    fn from(r: RepoResponse) -> Self {
        Self {
            name: r.name,
            owner: r.owner.login,
            private: r.private,
            html_url: r.html_url,
            default_branch: r.default_branch,
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct ShaRef {
    pub sha: String,
}

#[derive(Deserialize)]
pub(crate) struct ListedCommitBody {
    pub message: String,
    pub author: Identity,
}

/// Entry of `GET /repos/{owner}/{repo}/commits`.
#[derive(Deserialize)]
pub(crate) struct ListedCommit {
    pub sha: String,
    pub html_url: String,
    pub commit: ListedCommitBody,
    pub parents: Vec<ShaRef>,
}

impl From<ListedCommit> for CommitSummary {
    fn from(c: ListedCommit) -> Self {
        Self {
            id: c.sha,
            message: c.commit.message,
            author: c.commit.author,
            parent_ids: c.parents.into_iter().map(|p| p.sha).collect(),
            html_url: c.html_url,
        }
    }
}

/// `GET /repos/{owner}/{repo}/git/commits/{sha}`.
#[derive(Deserialize)]
pub(crate) struct GitCommitResponse {
    pub sha: String,
    pub message: String,
    pub tree: ShaRef,
    pub parents: Vec<ShaRef>,
    pub author: Identity,
    pub committer: Identity,
}

impl From<GitCommitResponse> for CommitRecord {
    fn from(c: GitCommitResponse) -> Self {
        Self {
            id: c.sha,
            message: c.message,
            author: c.author,
            committer: c.committer,
            tree_id: c.tree.sha,
            parent_ids: c.parents.into_iter().map(|p| p.sha).collect(),
        }
    }
}

/// `POST /repos/{owner}/{repo}/git/commits` body.
#[derive(Serialize)]
pub(crate) struct CreateCommitRequest<'a> {
    pub message: &'a str,
    pub tree: &'a str,
    pub parents: &'a [String],
    pub author: &'a Identity,
    pub committer: &'a Identity,
}

impl<'a> From<&'a NewCommit> for CreateCommitRequest<'a> {
    fn from(c: &'a NewCommit) -> Self {
        Self {
            message: &c.message,
            tree: &c.tree_id,
            parents: &c.parent_ids,
            author: &c.author,
            committer: &c.committer,
        }
    }
}

/// Response of commit creation.
#[derive(Deserialize)]
pub(crate) struct CreatedCommit {
    pub sha: String,
}

/// `PATCH /repos/{owner}/{repo}/git/refs/{ref}` body.
#[derive(Serialize)]
pub(crate) struct UpdateRefRequest<'a> {
    pub sha: &'a str,
    pub force: bool,
}

/// Response of ref updates.
#[derive(Deserialize)]
pub(crate) struct RefResponse {
    pub object: ShaRef,
}

/// `GET /user`.
#[derive(Deserialize)]
pub(crate) struct UserResponse {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl From<UserResponse> for AuthenticatedUser {
    fn from(u: UserResponse) -> Self {
        Self {
            login: u.login,
            name: u.name,
            avatar_url: u.avatar_url,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn listed_commit_decodes() {
        let json = r#"{
            "sha": "c2",
            "html_url": "https://github.com/octo/hello/commit/c2",
            "commit": {
                "message": "Fix bug",
                "author": {"name": "Jane", "email": "jane@example.com", "date": "2024-03-01T10:00:00Z"}
            },
            "parents": [{"sha": "c1", "url": "ignored"}]
        }"#;
        let listed: ListedCommit = serde_json::from_str(json).unwrap();
        let summary = CommitSummary::from(listed);
        assert_eq!(summary.id, "c2");
        assert_eq!(summary.parent_ids, vec!["c1".to_string()]);
        assert_eq!(summary.author.email, "jane@example.com");
    }

    #[test]
    fn missing_required_field_fails() {
        let json = r#"{
            "sha": "c2",
            "message": "Fix bug",
            "parents": [],
            "author": {"name": "Jane", "email": "jane@example.com", "date": "2024-03-01T10:00:00Z"},
            "committer": {"name": "Jane", "email": "jane@example.com", "date": "2024-03-01T10:00:00Z"}
        }"#;
        assert!(serde_json::from_str::<GitCommitResponse>(json).is_err());
    }

    #[test]
    fn create_request_uses_api_field_names() {
        let identity: Identity = serde_json::from_str(
            r#"{"name": "Jane", "email": "jane@example.com", "date": "2024-03-01T10:00:00+02:00"}"#,
        )
        .unwrap();
        let commit = NewCommit {
            message: "Fix bug".to_string(),
            tree_id: "t1".to_string(),
            parent_ids: vec!["p1".to_string()],
            author: identity.clone(),
            committer: identity,
        };
        let value = serde_json::to_value(CreateCommitRequest::from(&commit)).unwrap();
        assert_eq!(value["tree"], "t1");
        assert_eq!(value["parents"][0], "p1");
        assert_eq!(value["author"]["date"], "2024-03-01T10:00:00+02:00");
    }
}
