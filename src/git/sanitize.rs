//! Removal of tool-injected metadata from commit messages.

/// Message used when nothing meaningful survives sanitization.
pub const FALLBACK_MESSAGE: &str = "Updated files";

/// Sanitized messages shorter than this are replaced by [`FALLBACK_MESSAGE`].
pub const MIN_MESSAGE_LEN: usize = 5;

/// Line prefixes (lowercase) of metadata lines injected by the tool.
const METADATA_PREFIXES: [&str; 5] = [
    "replit-commit-author:",
    "replit-commit-session-id:",
    "replit-commit-checkpoint-type:",
    "prompt:",
    "auto-generated by replit",
];

/// Strips metadata lines from a commit message.
///
/// Matching lines are dropped whole and runs of blank lines collapse to one
/// empty line. Other lines are kept apart from stray carriage returns, and
/// the result is trimmed. A result shorter than [`MIN_MESSAGE_LEN`] becomes
/// [`FALLBACK_MESSAGE`], since remotes may reject empty messages.
/// Applying this twice gives the same result as applying it once.
pub fn sanitize(message: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();

    for line in message.lines() {
        if is_metadata_line(line) {
            continue;
        }

        let blank = line.trim().is_empty();
        if blank && kept.last().is_some_and(|prev| prev.trim().is_empty()) {
            continue;
        }
        kept.push(if blank { "" } else { line.trim_end_matches('\r') });
    }

    let cleaned = kept.join("\n");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() < MIN_MESSAGE_LEN {
        FALLBACK_MESSAGE.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Returns whether sanitizing would change the message.
pub fn needs_sanitizing(message: &str) -> bool {
    sanitize(message) != message
}

fn is_metadata_line(line: &str) -> bool {
    let lowered = line.trim_start().to_lowercase();
    METADATA_PREFIXES
        .iter()
        .any(|prefix| lowered.starts_with(prefix))
}
