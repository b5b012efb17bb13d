//! Commit history scanning and rewriting.

pub mod classify;
pub mod commit;
pub mod history;
pub mod publish;
pub mod rebuild;
pub mod remote;
pub mod sanitize;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub(crate) mod test_utils;

pub use classify::{classify, classify_summary, Classification, MatchedRule};
pub use commit::{ClassifiedCommit, CommitRecord, CommitSummary, Identity, NewCommit};
pub use history::{fetch_chain, fetch_history};
pub use publish::publish;
pub use rebuild::{rebuild, RewriteMode, RewritePlan, RewriteResult};
pub use remote::RepoLocator;
pub use sanitize::sanitize;

/// Number of hex characters to show in abbreviated commit hashes.
pub const SHORT_HASH_LEN: usize = 8;
