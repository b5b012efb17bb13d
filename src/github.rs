//! Remote commit-graph service integration.

pub mod client;
pub mod token;
pub(crate) mod types;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScrubError};
use crate::git::commit::{CommitRecord, CommitSummary, NewCommit};
use crate::git::remote::RepoLocator;

pub use client::GitHubClient;
pub use token::{
    default_token_provider, ConnectorTokenProvider, StaticTokenProvider, TokenProvider,
};

/// Default GitHub REST API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// HTTP request timeout for remote calls.
///
/// A timed out call surfaces as [`ScrubError::Remote`] and aborts the operation.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Boxed future returned by remote-service trait methods.
pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Repository metadata reported by the remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    /// Repository name.
    pub name: String,
    /// Owner login.
    pub owner: String,
    /// Whether the repository is private.
    pub private: bool,
    /// Web URL of the repository.
    pub html_url: String,
    /// Name of the default branch.
    pub default_branch: String,
}

/// Account behind the current credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Login name.
    pub login: String,
    /// Display name, if set.
    pub name: Option<String>,
    /// Avatar image URL, if set.
    pub avatar_url: Option<String>,
}

/// Operations the rewrite engine needs from the remote commit graph.
///
/// Every call is a blocking network round trip from the engine's point of
/// view; the engine never issues two calls concurrently.
pub trait CommitGraph: Send + Sync {
    /// Returns repository metadata, failing with `NotFound` for unknown repositories.
    fn get_repository<'a>(&'a self, locator: &'a RepoLocator) -> RemoteFuture<'a, RepositoryInfo>;

    /// Returns one page (1-based) of commits on `branch`, newest first.
    fn list_commits<'a>(
        &'a self,
        locator: &'a RepoLocator,
        branch: &'a str,
        page: u32,
        per_page: u32,
    ) -> RemoteFuture<'a, Vec<CommitSummary>>;

    /// Returns the full content of a commit.
    fn get_commit<'a>(&'a self, locator: &'a RepoLocator, id: &'a str)
        -> RemoteFuture<'a, CommitRecord>;

    /// Creates a new commit object and returns its id.
    fn create_commit<'a>(
        &'a self,
        locator: &'a RepoLocator,
        commit: &'a NewCommit,
    ) -> RemoteFuture<'a, String>;

    /// Points `reference` (e.g. `heads/main`) at `id`.
    fn update_ref<'a>(
        &'a self,
        locator: &'a RepoLocator,
        reference: &'a str,
        id: &'a str,
        force: bool,
    ) -> RemoteFuture<'a, ()>;

    /// Returns the account behind the current credential.
    fn get_authenticated_user(&self) -> RemoteFuture<'_, AuthenticatedUser>;
}

/// Checks an HTTP response for error status and maps failures onto the
/// error taxonomy.
pub(crate) async fn check_response(
    response: reqwest::Response,
    context: &str,
) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_else(|e| {
        tracing::debug!("Failed to read error response body: {e}");
        String::new()
    });
    Err(ScrubError::from_http_status(status.as_u16(), context, &body))
}

/// Maps a transport-level failure into a remote error with context.
pub(crate) fn transport_error(context: &str, err: reqwest::Error) -> ScrubError {
    if err.is_timeout() {
        ScrubError::Remote(format!("{context}: request timed out"))
    } else {
        ScrubError::Remote(format!("{context}: {err}"))
    }
}
