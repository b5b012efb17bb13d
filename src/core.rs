//! Repository scan and cleanup orchestration.
//!
//! [`Scrubber`] ties the remote commit graph, the history engine and the
//! repository store together and drives each record through its status
//! lifecycle:
//!
//! ```text
//! pending -> scanning -> needs_cleanup | clean | error
//! needs_cleanup | clean | error -> processing -> clean | error
//! ```

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::Utc;
use tracing::{info, warn};

use crate::data::{
    CleanupReport, ConnectionStatus, NewRepository, RepositoryRecord, RepositoryStatus,
    RepositoryStore, RepositoryUpdate, ScanReport,
};
use crate::error::{Result, ScrubError};
use crate::git::{
    classify_summary, fetch_chain, fetch_history, publish, rebuild, CommitSummary, RepoLocator,
    RewriteMode, RewritePlan, RewriteResult,
};
use crate::github::CommitGraph;

/// Statuses from which a scan or cleanup may start.
const CLAIMABLE: [RepositoryStatus; 5] = [
    RepositoryStatus::Pending,
    RepositoryStatus::Scanning,
    RepositoryStatus::Clean,
    RepositoryStatus::NeedsCleanup,
    RepositoryStatus::Error,
];

/// Scans repositories for tool-generated commits and rewrites them away.
pub struct Scrubber {
    graph: Box<dyn CommitGraph>,
    store: Box<dyn RepositoryStore>,
    in_flight: Mutex<HashSet<String>>,
}

/// Marks a repository busy until dropped.
struct InFlight<'a> {
    set: &'a Mutex<HashSet<String>>,
    id: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Ok(mut set) = self.set.lock() {
            set.remove(&self.id);
        }
    }
}

impl Scrubber {
    /// Creates a scrubber over a remote graph and a record store.
    pub fn new(graph: Box<dyn CommitGraph>, store: Box<dyn RepositoryStore>) -> Self {
        Self {
            graph,
            store,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Registers a repository after confirming it exists on the remote.
    ///
    /// Fails if the repository is already registered.
    pub async fn register(&self, url: &str) -> Result<RepositoryRecord> {
        let locator = RepoLocator::parse(url)?;
        let info = self.graph.get_repository(&locator).await?;

        let record = self.store.create(NewRepository {
            url: locator.canonical_url(),
            name: info.name,
            owner: info.owner,
            private: info.private,
            default_branch: info.default_branch,
        })?;

        info!(repo = %locator.slug(), id = %record.id, "Registered repository");
        Ok(record)
    }

    /// Returns the record for `url`, registering the repository first if needed.
    pub async fn ensure_registered(&self, url: &str) -> Result<RepositoryRecord> {
        let locator = RepoLocator::parse(url)?;
        match self.store.get_by_url(&locator.canonical_url())? {
            Some(record) => Ok(record),
            None => self.register(url).await,
        }
    }

    /// Returns the record for a registered repository.
    pub fn repository(&self, url: &str) -> Result<RepositoryRecord> {
        let locator = RepoLocator::parse(url)?;
        self.store
            .get_by_url(&locator.canonical_url())?
            .ok_or_else(|| not_registered(&locator))
    }

    /// Classifies the default branch's recent history, newest commit first.
    ///
    /// On success the record becomes `needs_cleanup` or `clean` with the
    /// number of tool-generated commits found. On failure it becomes `error`
    /// and keeps its previous count.
    pub async fn scan(&self, url: &str) -> Result<ScanReport> {
        let locator = RepoLocator::parse(url)?;
        let record = self.ensure_registered(url).await?;
        let (_guard, record) = self.begin(&locator, &record, RepositoryStatus::Scanning)?;

        let (branch, commits) = match self.fetch_for_scan(&locator).await {
            Ok(fetched) => fetched,
            Err(err) => {
                warn!(repo = %locator.slug(), error = %err, "Scan failed");
                self.mark_failed(&record);
                return Err(err);
            }
        };

        let classified: Vec<_> = commits.iter().rev().map(classify_summary).collect();
        let found = classified.iter().filter(|c| c.is_tool_generated).count();
        let status = if found > 0 {
            RepositoryStatus::NeedsCleanup
        } else {
            RepositoryStatus::Clean
        };

        let repository = self.store.update(
            &record.id,
            RepositoryUpdate {
                status: Some(status),
                last_scanned_at: Some(Utc::now()),
                tool_commits_found: Some(found),
                default_branch: Some(branch),
            },
        )?;

        info!(
            repo = %locator.slug(),
            examined = classified.len(),
            found,
            status = %status,
            "Scan complete"
        );

        Ok(ScanReport {
            repository,
            commits: classified,
        })
    }

    /// Rewrites the default branch so the `targets` no longer carry tool
    /// metadata (or are dropped), then force-updates the branch.
    ///
    /// The branch is only moved after the whole chain was recreated. A
    /// rewrite that would change nothing publishes nothing and leaves the
    /// record in `error`.
    pub async fn cleanup(
        &self,
        url: &str,
        targets: HashSet<String>,
        mode: RewriteMode,
    ) -> Result<CleanupReport> {
        if targets.is_empty() {
            return Err(ScrubError::NoTargets);
        }

        let locator = RepoLocator::parse(url)?;
        let record = self.ensure_registered(url).await?;
        let (_guard, record) = self.begin(&locator, &record, RepositoryStatus::Processing)?;

        let result = match self.rewrite(&locator, targets, mode).await {
            Ok(result) => result,
            Err(err) => {
                warn!(repo = %locator.slug(), error = %err, "Cleanup failed");
                self.mark_failed(&record);
                return Err(err);
            }
        };

        let update = if result.rewritten_count > 0 {
            RepositoryUpdate {
                status: Some(RepositoryStatus::Clean),
                tool_commits_found: Some(
                    record
                        .tool_commits_found
                        .unwrap_or(0)
                        .saturating_sub(result.rewritten_count),
                ),
                ..RepositoryUpdate::default()
            }
        } else {
            warn!(repo = %locator.slug(), "Cleanup changed no commits");
            RepositoryUpdate::status(RepositoryStatus::Error)
        };
        let repository = self.store.update(&record.id, update)?;

        Ok(CleanupReport { repository, result })
    }

    /// Reports whether the configured credential reaches the remote.
    pub async fn connection_status(&self) -> ConnectionStatus {
        match self.graph.get_authenticated_user().await {
            Ok(user) => ConnectionStatus {
                connected: true,
                login: Some(user.login),
                name: user.name,
                avatar_url: user.avatar_url,
                error: None,
            },
            Err(err) => ConnectionStatus {
                connected: false,
                login: None,
                name: None,
                avatar_url: None,
                error: Some(err.to_string()),
            },
        }
    }

    async fn fetch_for_scan(
        &self,
        locator: &RepoLocator,
    ) -> Result<(String, Vec<CommitSummary>)> {
        let info = self.graph.get_repository(locator).await?;
        let commits = fetch_history(
            self.graph.as_ref(),
            locator,
            &info.default_branch,
            &HashSet::new(),
        )
        .await?;
        Ok((info.default_branch, commits))
    }

    async fn rewrite(
        &self,
        locator: &RepoLocator,
        targets: HashSet<String>,
        mode: RewriteMode,
    ) -> Result<RewriteResult> {
        let graph = self.graph.as_ref();
        let branch = graph.get_repository(locator).await?.default_branch;

        let commits = fetch_chain(graph, locator, &branch, &targets).await?;
        let plan = RewritePlan::new(commits, targets, mode)?;
        let result = rebuild(graph, locator, &plan).await?;

        if result.rewritten_count > 0 {
            publish(graph, locator, &branch, &result.new_head_id).await?;
        }
        Ok(result)
    }

    /// Claims the repository for one operation and moves it to `status`.
    ///
    /// The claim is refused while another operation in this process holds
    /// the repository, or while the stored record is `processing`.
    fn begin<'a>(
        &'a self,
        locator: &RepoLocator,
        record: &RepositoryRecord,
        status: RepositoryStatus,
    ) -> Result<(InFlight<'a>, RepositoryRecord)> {
        let busy = || ScrubError::RewriteInProgress(locator.slug());

        {
            let mut set = self
                .in_flight
                .lock()
                .map_err(|_| ScrubError::Storage("in-flight set lock poisoned".to_string()))?;
            if !set.insert(record.id.clone()) {
                return Err(busy());
            }
        }
        let guard = InFlight {
            set: &self.in_flight,
            id: record.id.clone(),
        };

        match self.store.try_transition(&record.id, &CLAIMABLE, status)? {
            Some(claimed) => Ok((guard, claimed)),
            None => Err(busy()),
        }
    }

    fn mark_failed(&self, record: &RepositoryRecord) {
        if let Err(err) = self
            .store
            .update(&record.id, RepositoryUpdate::status(RepositoryStatus::Error))
        {
            warn!(id = %record.id, error = %err, "Failed to record error status");
        }
    }
}

fn not_registered(locator: &RepoLocator) -> ScrubError {
    ScrubError::NotFound(format!("{} is not registered", locator.canonical_url()))
}
