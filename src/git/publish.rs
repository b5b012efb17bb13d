//! Forced branch update to a rebuilt chain head.

use tracing::info;

use crate::error::{Result, ScrubError};
use crate::git::commit::short_id;
use crate::git::remote::RepoLocator;
use crate::github::CommitGraph;

/// Force-moves `heads/<branch>` to `new_head_id`.
///
/// This is the only step that makes a rewrite visible, and it is not a
/// compare-and-swap: callers must only invoke it after a complete rebuild and
/// must not run two rewrites of the same branch at once.
pub async fn publish(
    graph: &dyn CommitGraph,
    locator: &RepoLocator,
    branch: &str,
    new_head_id: &str,
) -> Result<()> {
    let reference = format!("heads/{branch}");

    graph
        .update_ref(locator, &reference, new_head_id, true)
        .await
        .map_err(|err| match err {
            ScrubError::NotFound(what) => {
                ScrubError::Remote(format!("{}: {reference} not found ({what})", locator.slug()))
            }
            other => other,
        })?;

    info!(
        repo = %locator.slug(),
        branch,
        head = short_id(new_head_id),
        "Published rewritten history"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::git::test_utils::{locator, Call, FakeGraph};

    #[tokio::test]
    async fn forces_branch_ref() {
        let graph = FakeGraph::linear(&[("c0", "Initial project layout")]);
        publish(&graph, &locator(), "main", "new0").await.unwrap();

        assert_eq!(graph.head().as_deref(), Some("new0"));
        assert_eq!(
            graph.calls(),
            vec![Call::UpdateRef {
                reference: "heads/main".to_string(),
                id: "new0".to_string(),
                force: true,
            }]
        );
    }

    #[tokio::test]
    async fn failure_is_remote_error() {
        let graph = FakeGraph::linear(&[("c0", "Initial project layout")]).fail_update_ref();
        let err = publish(&graph, &locator(), "main", "new0").await.unwrap_err();
        assert!(matches!(err, ScrubError::Remote(_)));
        assert_eq!(graph.head().as_deref(), Some("c0"));
    }
}
