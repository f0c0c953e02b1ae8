//! Yes/No classification of free-text replies.

/// Affirmative replies, matched case-insensitively after trimming.
const AFFIRMATIVE: &[&str] = &[
    "yes",
    "sure",
    "certainly",
    "ok",
    "okay",
    "fine",
    "indeed",
    "definitely",
    "of course",
    "affirmative",
    "obviously",
    "absolutely",
    "indubitably",
    "undoubtedly",
    "by all means",
];

/// Negative replies.
const NEGATIVE: &[&str] = &["no", "never", "by no means", "no way", "veto"];

/// How a free-text reply classifies against the fixed lexicons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Affirmative,
    Negative,
    /// Matched neither lexicon.
    Other,
}

/// Classify a reply: case-insensitive, whitespace-trimmed exact match.
pub fn classify(text: &str) -> Reply {
    let trimmed = text.trim();
    if AFFIRMATIVE.iter().any(|w| w.eq_ignore_ascii_case(trimmed)) {
        Reply::Affirmative
    } else if NEGATIVE.iter().any(|w| w.eq_ignore_ascii_case(trimmed)) {
        Reply::Negative
    } else {
        Reply::Other
    }
}
