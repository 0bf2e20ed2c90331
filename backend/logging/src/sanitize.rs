//! Log Sanitizing
//!
//! Client-supplied text (raw frames, display names) is logged verbatim
//! otherwise. Control characters are replaced so a payload cannot forge
//! log lines, and long payloads are truncated.

use regex::Regex;
use std::sync::LazyLock;

/// Longest sanitized output, in characters, before the ellipsis.
pub const MAX_LOGGED_CHARS: usize = 256;

static CONTROL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\p{Cc}\p{Cf}]").unwrap());

/// Replaces control characters with `?` and truncates to [`MAX_LOGGED_CHARS`].
pub fn sanitize_log_text(input: &str) -> String {
    let cleaned = CONTROL_RE.replace_all(input, "?");
    if cleaned.chars().count() <= MAX_LOGGED_CHARS {
        return cleaned.into_owned();
    }
    let mut truncated: String = cleaned.chars().take(MAX_LOGGED_CHARS).collect();
    truncated.push('…');
    truncated
}
