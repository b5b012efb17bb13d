//! # commit-scrub
//!
//! Finds commits generated by an online coding environment in a GitHub
//! repository's history and rewrites them out of the default branch.
//!
//! Scanning only reads; cleanup recreates the chain from the oldest target
//! onward through the GitHub API and force-updates the branch once every
//! commit was recreated. No local clone is involved.
//!
//! ## Quick Start
//!
//! ```rust
//! use commit_scrub::git::{sanitize, RepoLocator};
//!
//! let locator = RepoLocator::parse("https://github.com/octo/hello.git").unwrap();
//! assert_eq!(locator.slug(), "octo/hello");
//!
//! let message = "Add signup form\n\nReplit-Commit-Session-Id: 9c1e\n";
//! assert_eq!(sanitize(message), "Add signup form");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod cli;
pub mod core;
pub mod data;
pub mod error;
pub mod git;
pub mod github;
pub mod utils;

pub use crate::cli::Cli;
pub use crate::core::Scrubber;
pub use crate::error::{Result, ScrubError};

/// The current version of commit-scrub.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
