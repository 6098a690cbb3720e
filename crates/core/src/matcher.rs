use std::sync::OnceLock;

use caseless::default_case_fold_str;
use regex::Regex;

static WHITESPACE: OnceLock<Regex> = OnceLock::new();

fn whitespace() -> &'static Regex {
    // \x1c-\x1f are the ASCII separators; they count as whitespace too.
    WHITESPACE.get_or_init(|| Regex::new(r"[\s\x1c-\x1f]+").expect("whitespace pattern is valid"))
}

/// Collapse whitespace runs to one space, trim, and apply full Unicode case
/// folding ("Straße" and "STRASSE" both become "strasse").
pub fn normalize(text: &str) -> String {
    let collapsed = whitespace().replace_all(text, " ");
    default_case_fold_str(collapsed.trim())
}

/// True when `candidate_text` equals one of `patterns`, or starts with one
/// and the next character is not alphanumeric ("Submit ▸", "Yes, and ...").
///
/// Only the character right after the pattern is checked; there is no
/// word-boundary test before it.
pub fn button_text_matches<S: AsRef<str>>(candidate_text: &str, patterns: &[S]) -> bool {
    let candidate = normalize(candidate_text);
    if candidate.is_empty() {
        return false;
    }

    patterns.iter().any(|pattern| {
        let pattern = normalize(pattern.as_ref());
        if pattern.is_empty() || !candidate.starts_with(&pattern) {
            return false;
        }
        match candidate[pattern.len()..].chars().next() {
            None => true,
            Some(next) => !next.is_alphanumeric(),
        }
    })
}

/// With no required patterns, always true. Otherwise `near_text` must be
/// non-empty and contain at least one pattern after normalization.
pub fn near_text_matches<S: AsRef<str>>(near_text: &str, required: &[S]) -> bool {
    if required.is_empty() {
        return true;
    }

    let near = normalize(near_text);
    if near.is_empty() {
        return false;
    }

    required.iter().any(|pattern| {
        let pattern = normalize(pattern.as_ref());
        !pattern.is_empty() && near.contains(&pattern)
    })
}
