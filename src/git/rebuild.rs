//! Recreation of a linear commit chain with rewritten messages.

use std::collections::HashSet;

use chrono::{SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, ScrubError};
use crate::git::commit::{short_id, CommitRecord, CommitSummary, Identity, NewCommit};
use crate::git::history::ensure_linear;
use crate::git::remote::RepoLocator;
use crate::git::sanitize::{needs_sanitizing, sanitize};
use crate::github::CommitGraph;

/// What happens to a rewrite target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteMode {
    /// Keep the commit and strip tool metadata from its message.
    #[default]
    Sanitize,
    /// Remove the commit; its changes land in the next surviving commit.
    Drop,
}

/// Ordered window of commits (oldest first) with the ids to rewrite.
#[derive(Debug, Clone)]
pub struct RewritePlan {
    commits: Vec<CommitSummary>,
    targets: HashSet<String>,
    mode: RewriteMode,
}

impl RewritePlan {
    /// Validates and builds a plan.
    ///
    /// Fails with `NoTargets` for an empty target set, `NonLinearHistory`
    /// when the window is not a single chain, and `MissingCommit` when a
    /// target lies outside the window.
    pub fn new(
        commits: Vec<CommitSummary>,
        targets: HashSet<String>,
        mode: RewriteMode,
    ) -> Result<Self> {
        if targets.is_empty() {
            return Err(ScrubError::NoTargets);
        }
        ensure_linear(&commits)?;

        let known: HashSet<&str> = commits.iter().map(|c| c.id.as_str()).collect();
        let mut missing: Vec<&String> = targets
            .iter()
            .filter(|t| !known.contains(t.as_str()))
            .collect();
        missing.sort();
        if let Some(first) = missing.first() {
            return Err(ScrubError::MissingCommit((*first).clone()));
        }

        Ok(Self {
            commits,
            targets,
            mode,
        })
    }

    /// Commits in the window, oldest first.
    pub fn commits(&self) -> &[CommitSummary] {
        &self.commits
    }

    /// Ids selected for rewriting.
    pub fn targets(&self) -> &HashSet<String> {
        &self.targets
    }

    /// Returns whether `id` is a rewrite target.
    pub fn is_target(&self, id: &str) -> bool {
        self.targets.contains(id)
    }

    /// Treatment of targets.
    pub fn mode(&self) -> RewriteMode {
        self.mode
    }

    /// Current branch tip (newest commit in the window).
    pub fn tip_id(&self) -> Option<&str> {
        self.commits.last().map(|c| c.id.as_str())
    }
}

/// Outcome of a successful rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteResult {
    /// Id of the new chain head.
    pub new_head_id: String,
    /// Number of targets whose message changed or that were dropped.
    pub rewritten_count: usize,
    /// Notes about targets that could not be rewritten as requested, in order.
    pub errors: Vec<String>,
}

/// Recreates every commit in the plan's window, oldest first.
///
/// All commit details are loaded before the first write, so lookup failures
/// leave the remote untouched. Each recreated commit keeps its tree, author
/// identity and authored date; the committer date is set to now and the
/// parent is the previously recreated commit. The oldest commit keeps its
/// original parents so history older than the window stays attached.
///
/// The first failed creation stops the rebuild with `ChainBroken`. Nothing
/// is published here.
pub async fn rebuild(
    graph: &dyn CommitGraph,
    locator: &RepoLocator,
    plan: &RewritePlan,
) -> Result<RewriteResult> {
    let records = load_details(graph, locator, plan).await?;
    let mut errors = Vec::new();

    let drops_any = plan.mode() == RewriteMode::Drop
        && plan.targets().iter().any(|t| Some(t.as_str()) != plan.tip_id());
    let changes_anything = drops_any
        || records
            .iter()
            .any(|r| plan.is_target(&r.id) && needs_sanitizing(&r.message));
    if !changes_anything {
        for record in records.iter().filter(|r| plan.is_target(&r.id)) {
            errors.push(format!("{}: message is already clean", short_id(&record.id)));
        }
        info!(repo = %locator.slug(), "No target message would change; skipping rebuild");
        return Ok(RewriteResult {
            new_head_id: plan.tip_id().unwrap_or_default().to_string(),
            rewritten_count: 0,
            errors,
        });
    }

    let rewrite_time = Utc::now().trunc_subsecs(0).fixed_offset();
    let base_parents = records
        .first()
        .map(|r| r.parent_ids.clone())
        .unwrap_or_default();
    let last = records.len().saturating_sub(1);

    let mut previous: Option<String> = None;
    let mut completed = 0;
    let mut rewritten_count = 0;

    info!(
        repo = %locator.slug(),
        window = records.len(),
        targets = plan.targets().len(),
        mode = ?plan.mode(),
        "Rebuilding commit chain"
    );

    for (i, record) in records.iter().enumerate() {
        let is_target = plan.is_target(&record.id);

        if is_target && plan.mode() == RewriteMode::Drop {
            if i != last {
                debug!(commit = %record.id, "Dropping commit");
                rewritten_count += 1;
                continue;
            }
            warn!(commit = %record.id, "Branch tip cannot be dropped; sanitizing instead");
            errors.push(format!(
                "{}: branch tip cannot be dropped without losing changes; message sanitized instead",
                short_id(&record.id)
            ));
        }

        let message = if is_target {
            let cleaned = sanitize(&record.message);
            if cleaned != record.message {
                rewritten_count += 1;
            } else if plan.mode() == RewriteMode::Sanitize {
                errors.push(format!("{}: message is already clean", short_id(&record.id)));
            }
            cleaned
        } else {
            record.message.clone()
        };

        let new_commit = NewCommit {
            message,
            tree_id: record.tree_id.clone(),
            parent_ids: match &previous {
                Some(id) => vec![id.clone()],
                None => base_parents.clone(),
            },
            author: record.author.clone(),
            committer: Identity {
                date: rewrite_time,
                ..record.committer.clone()
            },
        };

        match graph.create_commit(locator, &new_commit).await {
            Ok(new_id) => {
                debug!(old = %record.id, new = %new_id, "Recreated commit");
                previous = Some(new_id);
                completed += 1;
            }
            Err(source) => {
                warn!(
                    repo = %locator.slug(),
                    commit = %record.id,
                    completed,
                    error = %source,
                    "Commit recreation failed; aborting rebuild"
                );
                errors.push(format!("{}: {source}", short_id(&record.id)));
                return Err(ScrubError::ChainBroken {
                    commit: record.id.clone(),
                    completed,
                    errors,
                    source: Box::new(source),
                });
            }
        }
    }

    let new_head_id = previous
        .ok_or_else(|| ScrubError::Remote(format!("{}: no commits were recreated", locator.slug())))?;

    info!(
        repo = %locator.slug(),
        new_head = %new_head_id,
        recreated = completed,
        rewritten_count,
        "Commit chain rebuilt"
    );

    Ok(RewriteResult {
        new_head_id,
        rewritten_count,
        errors,
    })
}

async fn load_details(
    graph: &dyn CommitGraph,
    locator: &RepoLocator,
    plan: &RewritePlan,
) -> Result<Vec<CommitRecord>> {
    let mut records = Vec::with_capacity(plan.commits().len());

    for summary in plan.commits() {
        let record = graph.get_commit(locator, &summary.id).await?;
        if record.id != summary.id || record.parent_ids != summary.parent_ids {
            return Err(ScrubError::Remote(format!(
                "{} commit {}: detail does not match the commit listing",
                locator.slug(),
                short_id(&summary.id)
            )));
        }
        records.push(record);
    }

    Ok(records)
}
