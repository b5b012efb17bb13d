//! GitHub REST API client.

use anyhow::Context;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use super::types::{
    CreateCommitRequest, CreatedCommit, GitCommitResponse, ListedCommit, RefResponse, RepoResponse,
    UpdateRefRequest, UserResponse,
};
use super::{
    check_response, transport_error, AuthenticatedUser, CommitGraph, RemoteFuture,
    RepositoryInfo, TokenProvider, DEFAULT_API_URL, REQUEST_TIMEOUT,
};
use crate::error::{Result, ScrubError};
use crate::git::commit::{short_id, CommitRecord, CommitSummary, NewCommit};
use crate::git::remote::RepoLocator;

const USER_AGENT: &str = concat!("commit-scrub/", env!("CARGO_PKG_VERSION"));

/// [`CommitGraph`] backed by the GitHub REST API.
///
/// A token is requested from the provider for every call, so an expiring
/// credential is refreshed between calls of a long rewrite.
pub struct GitHubClient {
    /// HTTP client for API requests.
    http: Client,
    /// API base URL without trailing slash.
    base_url: String,
    /// Source of access tokens.
    tokens: Box<dyn TokenProvider>,
}

impl GitHubClient {
    /// Creates a client for the given API base URL.
    pub fn new(base_url: impl Into<String>, tokens: Box<dyn TokenProvider>) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    /// Creates a client for `GITHUB_API_URL`, falling back to api.github.com.
    pub fn from_env(tokens: Box<dyn TokenProvider>) -> anyhow::Result<Self> {
        let base_url = crate::utils::get_env_var("GITHUB_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::new(base_url, tokens)
    }

    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        self.request_url(method, &format!("{}{}", self.base_url, path))
            .await
    }

    async fn request_url(&self, method: Method, url: &str) -> Result<RequestBuilder> {
        let token = self.tokens.access_token().await?;
        Ok(self
            .http
            .request(method, url)
            .bearer_auth(token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28"))
    }

    async fn send(&self, request: RequestBuilder, context: &str) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(context, e))?;
        check_response(response, context).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response, context: &str) -> Result<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| ScrubError::Remote(format!("{context}: unexpected response: {e}")))
    }
}

impl CommitGraph for GitHubClient {
    fn get_repository<'a>(&'a self, locator: &'a RepoLocator) -> RemoteFuture<'a, RepositoryInfo> {
        Box::pin(async move {
            let context = locator.slug();
            debug!(repo = %context, "Fetching repository metadata");

            let request = self
                .request(Method::GET, &format!("/repos/{}/{}", locator.owner, locator.repo))
                .await?;
            let response = self.send(request, &context).await?;
            let repo: RepoResponse = Self::decode(response, &context).await?;
            Ok(repo.into())
        })
    }

    fn list_commits<'a>(
        &'a self,
        locator: &'a RepoLocator,
        branch: &'a str,
        page: u32,
        per_page: u32,
    ) -> RemoteFuture<'a, Vec<CommitSummary>> {
        Box::pin(async move {
            let context = format!("{} commits on {branch} (page {page})", locator.slug());
            debug!(repo = %locator.slug(), branch, page, per_page, "Listing commits");

            let mut url = Url::parse(&format!(
                "{}/repos/{}/{}/commits",
                self.base_url, locator.owner, locator.repo
            ))
            .map_err(|e| ScrubError::Remote(format!("{context}: {e}")))?;
            url.query_pairs_mut()
                .append_pair("sha", branch)
                .append_pair("page", &page.to_string())
                .append_pair("per_page", &per_page.to_string());

            let request = self.request_url(Method::GET, url.as_str()).await?;

            let response = request
                .send()
                .await
                .map_err(|e| transport_error(&context, e))?;

            // An empty repository has no commits to list.
            if response.status() == StatusCode::CONFLICT {
                debug!(repo = %locator.slug(), "Repository is empty");
                return Ok(Vec::new());
            }

            let response = check_response(response, &context).await?;
            let listed: Vec<ListedCommit> = Self::decode(response, &context).await?;
            Ok(listed.into_iter().map(CommitSummary::from).collect())
        })
    }

    fn get_commit<'a>(
        &'a self,
        locator: &'a RepoLocator,
        id: &'a str,
    ) -> RemoteFuture<'a, CommitRecord> {
        Box::pin(async move {
            let context = format!("{} commit {}", locator.slug(), short_id(id));
            debug!(repo = %locator.slug(), commit = id, "Fetching commit detail");

            let request = self
                .request(
                    Method::GET,
                    &format!("/repos/{}/{}/git/commits/{id}", locator.owner, locator.repo),
                )
                .await?;
            let response = self.send(request, &context).await?;
            let commit: GitCommitResponse = Self::decode(response, &context).await?;
            Ok(commit.into())
        })
    }

    fn create_commit<'a>(
        &'a self,
        locator: &'a RepoLocator,
        commit: &'a NewCommit,
    ) -> RemoteFuture<'a, String> {
        Box::pin(async move {
            let context = format!(
                "{} create commit on tree {}",
                locator.slug(),
                short_id(&commit.tree_id)
            );
            debug!(
                repo = %locator.slug(),
                tree = %commit.tree_id,
                parents = ?commit.parent_ids,
                "Creating commit"
            );

            let request = self
                .request(
                    Method::POST,
                    &format!("/repos/{}/{}/git/commits", locator.owner, locator.repo),
                )
                .await?
                .json(&CreateCommitRequest::from(commit));
            let response = self.send(request, &context).await?;
            let created: CreatedCommit = Self::decode(response, &context).await?;
            Ok(created.sha)
        })
    }

    fn update_ref<'a>(
        &'a self,
        locator: &'a RepoLocator,
        reference: &'a str,
        id: &'a str,
        force: bool,
    ) -> RemoteFuture<'a, ()> {
        Box::pin(async move {
            let context = format!("{} update {reference}", locator.slug());
            info!(repo = %locator.slug(), reference, commit = id, force, "Updating reference");

            let request = self
                .request(
                    Method::PATCH,
                    &format!("/repos/{}/{}/git/refs/{reference}", locator.owner, locator.repo),
                )
                .await?
                .json(&UpdateRefRequest { sha: id, force });
            let response = self.send(request, &context).await?;
            let updated: RefResponse = Self::decode(response, &context).await?;

            if updated.object.sha != id {
                return Err(ScrubError::Remote(format!(
                    "{context}: reference points at {} instead of {}",
                    short_id(&updated.object.sha),
                    short_id(id)
                )));
            }
            Ok(())
        })
    }

    fn get_authenticated_user(&self) -> RemoteFuture<'_, AuthenticatedUser> {
        Box::pin(async move {
            let context = "authenticated user";
            let request = self.request(Method::GET, "/user").await?;
            let response = self.send(request, context).await?;
            let user: UserResponse = Self::decode(response, context).await?;
            Ok(user.into())
        })
    }
}
