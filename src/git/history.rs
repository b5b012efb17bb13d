//! Paginated retrieval of a branch's linear history.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::error::{Result, ScrubError};
use crate::git::commit::{short_id, CommitSummary};
use crate::git::remote::RepoLocator;
use crate::github::CommitGraph;

/// Commits requested per listing page.
pub const PAGE_SIZE: u32 = 100;

/// Maximum number of commits fetched in one pass.
///
/// Histories longer than this are not rewritten in one go.
pub const MAX_COMMITS: usize = 500;

/// Fetches commits on `branch`, returning them oldest first.
///
/// Paging stops at the end of history, at [`MAX_COMMITS`], or as soon as
/// every id in `targets` has been seen, whichever comes first. An empty
/// `targets` set fetches up to the cap. Merge commits are returned as listed.
pub async fn fetch_history(
    graph: &dyn CommitGraph,
    locator: &RepoLocator,
    branch: &str,
    targets: &HashSet<String>,
) -> Result<Vec<CommitSummary>> {
    let mut commits: Vec<CommitSummary> = Vec::new();
    let mut pending: HashSet<&str> = targets.iter().map(String::as_str).collect();
    let mut page = 1;

    loop {
        let batch = graph
            .list_commits(locator, branch, page, PAGE_SIZE)
            .await?;
        let batch_len = batch.len();
        debug!(repo = %locator.slug(), page, batch_len, "Fetched commit page");

        for commit in batch {
            if commits.len() >= MAX_COMMITS {
                break;
            }
            pending.remove(commit.id.as_str());
            commits.push(commit);
        }

        if batch_len < PAGE_SIZE as usize {
            break;
        }
        if !targets.is_empty() && pending.is_empty() {
            debug!(repo = %locator.slug(), page, "All target commits observed");
            break;
        }
        if commits.len() >= MAX_COMMITS {
            warn!(
                repo = %locator.slug(),
                cap = MAX_COMMITS,
                "History exceeds the fetch cap; older commits are not examined"
            );
            break;
        }
        page += 1;
    }

    commits.reverse();

    info!(
        repo = %locator.slug(),
        branch,
        commits = commits.len(),
        "Fetched branch history"
    );
    Ok(commits)
}

/// Like [`fetch_history`], but fails with [`ScrubError::NonLinearHistory`]
/// when the window contains a merge commit or is not a single chain.
pub async fn fetch_chain(
    graph: &dyn CommitGraph,
    locator: &RepoLocator,
    branch: &str,
    targets: &HashSet<String>,
) -> Result<Vec<CommitSummary>> {
    let commits = fetch_history(graph, locator, branch, targets).await?;
    ensure_linear(&commits)?;
    Ok(commits)
}

/// Checks that each commit's only parent is its predecessor in the window.
///
/// The oldest commit may have any single parent outside the window, or none
/// when it is the root.
pub fn ensure_linear(commits: &[CommitSummary]) -> Result<()> {
    for (i, commit) in commits.iter().enumerate() {
        let parents = commit.parent_ids.len();
        let linked = match i {
            0 => parents <= 1,
            _ => parents == 1 && commit.parent_ids[0] == commits[i - 1].id,
        };
        if !linked {
            return Err(ScrubError::NonLinearHistory {
                commit: short_id(&commit.id).to_string(),
                parents,
            });
        }
    }
    Ok(())
}
