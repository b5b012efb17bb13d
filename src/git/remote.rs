//! Remote repository addressing.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, ScrubError};

/// Host, owner and name of a remote repository parsed from its web URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoLocator {
    /// Host name, e.g. `github.com`.
    pub host: String,
    /// Owning user or organisation.
    pub owner: String,
    /// Repository name without any `.git` suffix.
    pub repo: String,
}

impl RepoLocator {
    /// Parses `https://<host>/<owner>/<repo>[.git][/]`.
    pub fn parse(url: &str) -> Result<Self> {
        let invalid = || ScrubError::InvalidUrl(url.to_string());

        let parsed = Url::parse(url.trim()).map_err(|_| invalid())?;
        if parsed.scheme() != "https" || parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(invalid());
        }
        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(invalid());
        }

        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(invalid)?
            .to_string();

        let path = parsed.path().strip_prefix('/').unwrap_or(parsed.path());
        let path = path.strip_suffix('/').unwrap_or(path);
        let mut segments = path.split('/');

        let (Some(owner), Some(repo), None) = (segments.next(), segments.next(), segments.next())
        else {
            return Err(invalid());
        };

        let repo = repo.strip_suffix(".git").unwrap_or(repo);
        if owner.is_empty() || repo.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            host,
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    /// Returns `owner/repo`.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Returns the canonical web URL used as the repository's unique key.
    pub fn canonical_url(&self) -> String {
        format!("https://{}/{}/{}", self.host, self.owner, self.repo)
    }
}

impl fmt::Display for RepoLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.host, self.owner, self.repo)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn parse(url: &str) -> RepoLocator {
        RepoLocator::parse(url).unwrap()
    }

    #[test]
    fn parses_plain_url() {
        let loc = parse("https://github.com/octo/hello-world");
        assert_eq!(loc.host, "github.com");
        assert_eq!(loc.owner, "octo");
        assert_eq!(loc.repo, "hello-world");
        assert_eq!(loc.slug(), "octo/hello-world");
    }

    #[test]
    fn strips_git_suffix_and_trailing_slash() {
        assert_eq!(parse("https://github.com/octo/hello.git").repo, "hello");
        assert_eq!(parse("https://github.com/octo/hello/").repo, "hello");
        assert_eq!(parse("https://github.com/octo/hello.git/").repo, "hello");
    }

    #[test]
    fn accepts_other_hosts() {
        let loc = parse("https://git.example.org/team/tool");
        assert_eq!(loc.canonical_url(), "https://git.example.org/team/tool");
    }

    #[test]
    fn rejects_malformed_urls() {
        for url in [
            "",
            "github.com/octo/hello",
            "http://github.com/octo/hello",
            "git@github.com:octo/hello.git",
            "https://github.com/octo",
            "https://github.com/octo/hello/tree/main",
            "https://github.com//hello",
            "https://github.com/octo/.git",
            "https://github.com/octo/hello?tab=readme",
            "https://user:pw@github.com/octo/hello",
        ] {
            assert!(
                matches!(RepoLocator::parse(url), Err(ScrubError::InvalidUrl(_))),
                "expected InvalidUrl for {url:?}"
            );
        }
    }
}
