//! Preflight validation checks for early failure detection
//!
//! Commands that talk to GitHub call these before doing any remote work so a
//! missing credential fails with setup instructions instead of an HTTP 401.

use anyhow::{bail, Result};

use crate::github::token::{connector_identity, TOKEN_ENV_VARS};
use crate::utils::settings::{get_env_var, get_env_vars};

/// Where GitHub credentials will come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// OAuth token issued by the hosting environment's connector service.
    Connector,
    /// Personal access token from `GITHUB_TOKEN` or `GH_TOKEN`.
    Token,
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::Connector => write!(f, "connector service"),
            CredentialSource::Token => write!(f, "personal access token"),
        }
    }
}

/// Validate a GitHub credential source is configured
///
/// Only inspects the environment and settings file; the credential itself is
/// checked by the first remote call.
pub fn check_github_credentials() -> Result<CredentialSource> {
    if get_env_var("REPLIT_CONNECTORS_HOSTNAME").is_ok() {
        if connector_identity().is_some() {
            return Ok(CredentialSource::Connector);
        }
        if get_env_vars(&TOKEN_ENV_VARS).is_err() {
            bail!(
                "REPLIT_CONNECTORS_HOSTNAME is set but no connector identity was found.\n\
                 Set REPL_IDENTITY or WEB_REPL_RENEWAL, or provide a GITHUB_TOKEN."
            );
        }
    }

    get_env_vars(&TOKEN_ENV_VARS).map_err(|_| {
        anyhow::anyhow!(
            "GitHub credentials not found.\n\
             Set one of these environment variables (or add it to ~/.commit-scrub/settings.json):\n\
             - GITHUB_TOKEN\n\
             - GH_TOKEN"
        )
    })?;

    Ok(CredentialSource::Token)
}
