//! Percentage extraction from free-text status lines
//!
//! The upload service reports progress as prose (`"70% - Starting
//! embedding"`). The first `<digits>%` occurrence wins; anything
//! unparseable falls back to [`DEFAULT_PROGRESS_PERCENT`].

use regex::Regex;
use std::sync::OnceLock;

/// Progress shown for a processing job whose status carries no percentage
pub const DEFAULT_PROGRESS_PERCENT: u8 = 50;

fn percent_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+)%").ok()).as_ref()
}

/// First percentage in `text`, clamped to 100
pub fn parse_percent(text: &str) -> Option<u8> {
    let digits = percent_pattern()?.captures(text)?.get(1)?.as_str();
    let value: u64 = digits.parse().ok()?;
    Some(value.min(100) as u8)
}

/// Progress for a `processing` status
///
/// Looks at the dedicated progress field first, then the message, then
/// uses the default.
pub fn progress_from_status(progress: Option<&str>, message: &str) -> u8 {
    progress
        .and_then(parse_percent)
        .or_else(|| parse_percent(message))
        .unwrap_or(DEFAULT_PROGRESS_PERCENT)
}
