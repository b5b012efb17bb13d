//! Shared test utilities for the history engine.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, FixedOffset};

use crate::error::{Result, ScrubError};
use crate::git::commit::{CommitRecord, CommitSummary, Identity, NewCommit};
use crate::git::remote::RepoLocator;
use crate::github::{AuthenticatedUser, CommitGraph, RemoteFuture, RepositoryInfo};

/// Fixed timestamp used for generated test commits.
pub(crate) fn test_date() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2024-03-01T10:00:00+02:00").unwrap()
}

/// Neutral human identity for generated test commits.
pub(crate) fn test_identity() -> Identity {
    Identity {
        name: "Test User".to_string(),
        email: "test@example.com".to_string(),
        date: test_date(),
    }
}

/// Builds a listing entry with a neutral author.
pub(crate) fn summary(id: &str, message: &str, parents: &[&str]) -> CommitSummary {
    CommitSummary {
        id: id.to_string(),
        message: message.to_string(),
        author: test_identity(),
        parent_ids: parents.iter().map(|p| p.to_string()).collect(),
        html_url: format!("https://github.com/octo/hello/commit/{id}"),
    }
}

/// Builds a commit record with the standard test identity.
pub(crate) fn record(id: &str, parents: &[&str]) -> CommitRecord {
    CommitRecord {
        id: id.to_string(),
        message: format!("Change {id} in the project"),
        author: test_identity(),
        committer: test_identity(),
        tree_id: format!("tree-{id}"),
        parent_ids: parents.iter().map(|p| p.to_string()).collect(),
    }
}

/// Returns the locator used by the fake remote.
pub(crate) fn locator() -> RepoLocator {
    RepoLocator::parse("https://github.com/octo/hello").unwrap()
}

/// Remote call recorded by [`FakeGraph`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    GetRepository,
    ListCommits { page: u32 },
    GetCommit(String),
    CreateCommit(NewCommit),
    UpdateRef { reference: String, id: String, force: bool },
    GetUser,
}

#[derive(Default)]
struct FakeState {
    /// Commits in the branch, oldest first.
    chain: Vec<CommitRecord>,
    /// Objects created through `create_commit`, by id.
    created: HashMap<String, NewCommit>,
    /// Current ref targets.
    refs: HashMap<String, String>,
    calls: Vec<Call>,
    /// `create_commit` fails once this many commits have been created.
    fail_create_after: Option<usize>,
    /// Commit ids whose detail lookup fails.
    fail_detail: HashSet<String>,
    fail_update_ref: bool,
    missing_repository: bool,
    fail_user: bool,
}

/// In-memory commit graph that records every call.
///
/// Holds a single linear branch (`main`) built with [`FakeGraph::linear`].
/// Cloning shares state, so a test can keep a handle for assertions after
/// moving the fake into the code under test.
#[derive(Clone, Default)]
pub(crate) struct FakeGraph {
    state: Arc<Mutex<FakeState>>,
}

impl FakeGraph {
    /// Creates a linear branch `main` from `(id, message)` pairs, oldest first.
    pub(crate) fn linear(commits: &[(&str, &str)]) -> Self {
        let mut chain = Vec::new();
        let mut parent: Option<String> = None;
        for (id, message) in commits {
            chain.push(CommitRecord {
                id: id.to_string(),
                message: message.to_string(),
                author: test_identity(),
                committer: test_identity(),
                tree_id: format!("tree-{id}"),
                parent_ids: parent.iter().cloned().collect(),
            });
            parent = Some(id.to_string());
        }
        Self::from_chain(chain)
    }

    /// Creates a linear branch of `count` commits with generated ids `c0..`.
    pub(crate) fn numbered(count: usize) -> Self {
        let ids: Vec<String> = (0..count).map(|i| format!("c{i}")).collect();
        let messages: Vec<String> = (0..count).map(|i| format!("Human change number {i}")).collect();
        let pairs: Vec<(&str, &str)> = ids
            .iter()
            .zip(&messages)
            .map(|(id, msg)| (id.as_str(), msg.as_str()))
            .collect();
        Self::linear(&pairs)
    }

    /// Creates a fake from explicit records, oldest first.
    pub(crate) fn from_chain(chain: Vec<CommitRecord>) -> Self {
        let mut refs = HashMap::new();
        if let Some(tip) = chain.last() {
            refs.insert("heads/main".to_string(), tip.id.clone());
        }
        Self {
            state: Arc::new(Mutex::new(FakeState {
                chain,
                refs,
                ..FakeState::default()
            })),
        }
    }

    /// Makes `create_commit` fail after `n` successful creations.
    pub(crate) fn fail_create_after(self, n: usize) -> Self {
        self.state.lock().unwrap().fail_create_after = Some(n);
        self
    }

    /// Makes detail lookups of `id` fail.
    pub(crate) fn fail_detail(self, id: &str) -> Self {
        self.state.lock().unwrap().fail_detail.insert(id.to_string());
        self
    }

    /// Makes ref updates fail.
    pub(crate) fn fail_update_ref(self) -> Self {
        self.state.lock().unwrap().fail_update_ref = true;
        self
    }

    /// Makes repository lookups report `NotFound`.
    pub(crate) fn missing_repository(self) -> Self {
        self.state.lock().unwrap().missing_repository = true;
        self
    }

    /// Makes the authenticated-user lookup fail with `AuthRequired`.
    pub(crate) fn fail_user(self) -> Self {
        self.state.lock().unwrap().fail_user = true;
        self
    }

    /// Returns all recorded calls in order.
    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Returns the payloads passed to `create_commit`, in order.
    pub(crate) fn created(&self) -> Vec<NewCommit> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::CreateCommit(commit) => Some(commit),
                _ => None,
            })
            .collect()
    }

    /// Returns the number of `list_commits` calls.
    pub(crate) fn list_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::ListCommits { .. }))
            .count()
    }

    /// Returns whether any ref update was attempted.
    pub(crate) fn ref_updated(&self) -> bool {
        self.calls()
            .iter()
            .any(|c| matches!(c, Call::UpdateRef { .. }))
    }

    /// Returns the current target of `heads/main`.
    pub(crate) fn head(&self) -> Option<String> {
        self.state.lock().unwrap().refs.get("heads/main").cloned()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

/// Synthetic id for the `n`th created commit.
pub(crate) fn new_id(n: usize) -> String {
    format!("new{n}")
}

impl CommitGraph for FakeGraph {
    fn get_repository<'a>(&'a self, locator: &'a RepoLocator) -> RemoteFuture<'a, RepositoryInfo> {
        Box::pin(async move {
            self.record(Call::GetRepository);
            if self.state.lock().unwrap().missing_repository {
                return Err(ScrubError::NotFound(locator.slug()));
            }
            Ok(RepositoryInfo {
                name: locator.repo.clone(),
                owner: locator.owner.clone(),
                private: false,
                html_url: locator.canonical_url(),
                default_branch: "main".to_string(),
            })
        })
    }

    fn list_commits<'a>(
        &'a self,
        _locator: &'a RepoLocator,
        branch: &'a str,
        page: u32,
        per_page: u32,
    ) -> RemoteFuture<'a, Vec<CommitSummary>> {
        Box::pin(async move {
            self.record(Call::ListCommits { page });
            if branch != "main" {
                return Err(ScrubError::NotFound(format!("branch {branch}")));
            }
            let state = self.state.lock().unwrap();
            let skip = (page.saturating_sub(1) * per_page) as usize;
            Ok(state
                .chain
                .iter()
                .rev()
                .skip(skip)
                .take(per_page as usize)
                .map(|c| CommitSummary {
                    id: c.id.clone(),
                    message: c.message.clone(),
                    author: c.author.clone(),
                    parent_ids: c.parent_ids.clone(),
                    html_url: format!("https://github.com/octo/hello/commit/{}", c.id),
                })
                .collect())
        })
    }

    fn get_commit<'a>(
        &'a self,
        _locator: &'a RepoLocator,
        id: &'a str,
    ) -> RemoteFuture<'a, CommitRecord> {
        Box::pin(async move {
            self.record(Call::GetCommit(id.to_string()));
            let state = self.state.lock().unwrap();
            if state.fail_detail.contains(id) {
                return Err(ScrubError::Remote(format!("detail of {id} timed out")));
            }
            state
                .chain
                .iter()
                .find(|c| c.id == id)
                .cloned()
                .ok_or_else(|| ScrubError::NotFound(format!("commit {id}")))
        })
    }

    fn create_commit<'a>(
        &'a self,
        _locator: &'a RepoLocator,
        commit: &'a NewCommit,
    ) -> RemoteFuture<'a, String> {
        Box::pin(async move {
            self.record(Call::CreateCommit(commit.clone()));
            let mut state = self.state.lock().unwrap();
            if state
                .fail_create_after
                .is_some_and(|limit| state.created.len() >= limit)
            {
                return Err(ScrubError::Remote("create commit: HTTP 502".to_string()));
            }
            let id = new_id(state.created.len());
            state.created.insert(id.clone(), commit.clone());
            Ok(id)
        })
    }

    fn update_ref<'a>(
        &'a self,
        _locator: &'a RepoLocator,
        reference: &'a str,
        id: &'a str,
        force: bool,
    ) -> RemoteFuture<'a, ()> {
        Box::pin(async move {
            self.record(Call::UpdateRef {
                reference: reference.to_string(),
                id: id.to_string(),
                force,
            });
            let mut state = self.state.lock().unwrap();
            if state.fail_update_ref {
                return Err(ScrubError::Remote("update ref: HTTP 500".to_string()));
            }
            state.refs.insert(reference.to_string(), id.to_string());
            Ok(())
        })
    }

    fn get_authenticated_user(&self) -> RemoteFuture<'_, AuthenticatedUser> {
        Box::pin(async move {
            self.record(Call::GetUser);
            if self.state.lock().unwrap().fail_user {
                return Err(ScrubError::AuthRequired("GitHub not connected".to_string()));
            }
            Ok(AuthenticatedUser {
                login: "octocat".to_string(),
                name: Some("The Octocat".to_string()),
                avatar_url: None,
            })
        })
    }
}
