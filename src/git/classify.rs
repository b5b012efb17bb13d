//! Heuristic detection of tool-generated commits.
//!
//! The rules form a union: any single match flags the commit. The user
//! confirms the final selection before anything is rewritten.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::git::commit::{ClassifiedCommit, CommitSummary};

/// Product name matched in messages and author identities.
pub const PRODUCT_NAME: &str = "replit";

/// Short domain alias of the product.
pub const PRODUCT_ALIAS: &str = "repl.it";

/// Explanation attached when a commit names the product explicitly.
pub const PRODUCT_MARKER: &str = "Generated by Replit";

/// Messages shorter than this many characters are treated as suspect.
pub const MIN_HUMAN_MESSAGE_LEN: usize = 10;

const AUTOSAVE_MARKERS: [&str; 2] = ["auto-save", "autosave"];

const SHORT_MESSAGES: [&str; 3] = ["initial commit", "update", "save"];

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static FILE_ACTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(created|updated|modified|added|deleted)\s+.*\.(js|py|ts|html|css|json)$")
        .unwrap()
});

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static PROMPT_LINE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[ \t]*prompt:[ \t]*(?P<prompt>.*?)[ \t]*\r?$").unwrap());

/// Heuristic rule that flagged a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedRule {
    /// Message mentions the product or its domain alias.
    ProductInMessage,
    /// Message mentions auto-saving.
    Autosave,
    /// Author name or email mentions the product or its alias.
    ProductInAuthor,
    /// Message is a bare "<verb> <file>" description.
    FileAction,
    /// Message is one of the stock placeholder messages.
    StockMessage,
    /// Message is too short to be deliberate.
    ShortMessage,
}

/// Outcome of classifying a single commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// First rule that matched, if any.
    pub rule: Option<MatchedRule>,
    /// Marker text when the product name was found.
    pub explanation: Option<String>,
}

impl Classification {
    /// Returns whether any rule matched.
    pub fn is_tool_generated(&self) -> bool {
        self.rule.is_some()
    }
}

/// Classifies a commit from its message and author identity.
///
/// Total and side-effect free; every well-formed commit gets a verdict.
pub fn classify(commit: &CommitSummary) -> Classification {
    let message = commit.message.to_lowercase();
    let author_name = commit.author.name.to_lowercase();
    let author_email = commit.author.email.to_lowercase();

    let names_product = message.contains(PRODUCT_NAME)
        || author_name.contains(PRODUCT_NAME)
        || author_email.contains(PRODUCT_NAME);
    let explanation = names_product.then(|| PRODUCT_MARKER.to_string());

    let rule = if mentions_product(&message) {
        Some(MatchedRule::ProductInMessage)
    } else if AUTOSAVE_MARKERS.iter().any(|m| message.contains(m)) {
        Some(MatchedRule::Autosave)
    } else if mentions_product(&author_email) || mentions_product(&author_name) {
        Some(MatchedRule::ProductInAuthor)
    } else if FILE_ACTION_PATTERN.is_match(&commit.message) {
        Some(MatchedRule::FileAction)
    } else if SHORT_MESSAGES.contains(&message.trim()) {
        Some(MatchedRule::StockMessage)
    } else if commit.message.chars().count() < MIN_HUMAN_MESSAGE_LEN {
        Some(MatchedRule::ShortMessage)
    } else {
        None
    };

    Classification { rule, explanation }
}

fn mentions_product(text: &str) -> bool {
    text.contains(PRODUCT_NAME) || text.contains(PRODUCT_ALIAS)
}

/// Returns the text of the first `Prompt:` metadata line in a message.
pub fn extract_prompt(message: &str) -> Option<String> {
    PROMPT_LINE_PATTERN
        .captures(message)
        .map(|caps| caps["prompt"].to_string())
        .filter(|prompt| !prompt.is_empty())
}

/// Labels a listing entry, keeping the verdict as a first-class field.
pub fn classify_summary(commit: &CommitSummary) -> ClassifiedCommit {
    let classification = classify(commit);
    if let Some(rule) = classification.rule {
        debug!(commit = %commit.id, ?rule, "Flagged tool-generated commit");
    }
    ClassifiedCommit {
        id: commit.id.clone(),
        message: commit.message.clone(),
        author: commit.author.name.clone(),
        author_email: commit.author.email.clone(),
        date: commit.author.date,
        url: commit.html_url.clone(),
        is_tool_generated: classification.is_tool_generated(),
        explanation: classification.explanation,
        extracted_prompt: extract_prompt(&commit.message),
    }
}
