//! Error taxonomy for history scanning and rewriting.

use thiserror::Error;

/// Result alias used throughout the scanning and rewrite engine.
pub type Result<T> = std::result::Result<T, ScrubError>;

/// Errors raised while fetching, rewriting or publishing commit history.
#[derive(Error, Debug)]
pub enum ScrubError {
    /// Repository URL does not have the `https://<host>/<owner>/<repo>` shape.
    #[error("Invalid repository URL '{0}'. Expected https://<host>/<owner>/<repo>[.git]")]
    InvalidUrl(String),

    /// Repository or object does not exist, or the credential cannot see it.
    #[error("Repository not found or you do not have access to it: {0}")]
    NotFound(String),

    /// No usable GitHub credential is available.
    #[error("GitHub authentication required: {0}")]
    AuthRequired(String),

    /// Network failure, server error or unexpected response from the remote.
    #[error("Remote request failed: {0}")]
    Remote(String),

    /// A rewrite target is not inside the fetched history window.
    #[error("Commit {0} is not within the fetched history window")]
    MissingCommit(String),

    /// Recreating the chain failed partway through.
    #[error("History rewrite stopped at commit {commit} after recreating {completed} commits: {source}")]
    ChainBroken {
        /// Original id of the commit whose recreation failed.
        commit: String,
        /// Number of commits recreated before the failure.
        completed: usize,
        /// Notes accumulated before the failure, in order.
        errors: Vec<String>,
        /// Underlying remote failure.
        #[source]
        source: Box<ScrubError>,
    },

    /// A commit in the window has more or fewer parents than a linear chain allows.
    #[error("Commit {commit} breaks linear history ({parents} parents); merge commits cannot be rewritten")]
    NonLinearHistory {
        /// Offending commit id.
        commit: String,
        /// Number of parents it references.
        parents: usize,
    },

    /// Cleanup was requested without any target commits.
    #[error("No commits specified for cleanup")]
    NoTargets,

    /// Another rewrite of the same repository has not finished yet.
    #[error("A rewrite is already in progress for {0}")]
    RewriteInProgress(String),

    /// Repository record store failed.
    #[error("Repository store error: {0}")]
    Storage(String),
}

impl ScrubError {
    /// Maps an HTTP status from the remote into the matching error kind.
    pub fn from_http_status(status: u16, context: &str, body: &str) -> Self {
        match status {
            401 | 403 => Self::AuthRequired(format!("{context}: HTTP {status}: {body}")),
            404 => Self::NotFound(context.to_string()),
            _ => Self::Remote(format!("{context}: HTTP {status}: {body}")),
        }
    }

    /// Returns true when the failure happened before anything was written remotely.
    pub fn is_before_write(&self) -> bool {
        !matches!(self, Self::ChainBroken { .. })
    }
}

impl From<anyhow::Error> for ScrubError {
    fn from(err: anyhow::Error) -> Self {
        Self::Storage(format!("{err:#}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping() {
        assert!(matches!(
            ScrubError::from_http_status(401, "octo/hello", ""),
            ScrubError::AuthRequired(_)
        ));
        assert!(matches!(
            ScrubError::from_http_status(403, "octo/hello", "rate limited"),
            ScrubError::AuthRequired(_)
        ));
        assert!(matches!(
            ScrubError::from_http_status(404, "octo/hello", ""),
            ScrubError::NotFound(ref s) if s == "octo/hello"
        ));
        assert!(matches!(
            ScrubError::from_http_status(502, "octo/hello", "bad gateway"),
            ScrubError::Remote(ref s) if s.contains("502") && s.contains("bad gateway")
        ));
    }

    #[test]
    fn chain_broken_keeps_source() {
        let err = ScrubError::ChainBroken {
            commit: "abc".to_string(),
            completed: 2,
            errors: vec![],
            source: Box::new(ScrubError::Remote("timeout".to_string())),
        };
        assert!(!err.is_before_write());
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("Remote request failed: timeout"));
    }
}
