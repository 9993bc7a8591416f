//! Filename sanitization for generated output names.

use crate::config::SanitizationLevel;

/// Characters invalid on common filesystems.
const BASIC_FORBIDDEN: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Extra punctuation removed at the aggressive level.
const AGGRESSIVE_FORBIDDEN: &[char] = &[',', ';', '(', ')', '[', ']', '{', '}'];

/// Longest filename component we will generate.
const MAX_COMPONENT_CHARS: usize = 200;

/// Strip forbidden characters from a name destined for the filesystem.
///
/// Never returns an empty string and is idempotent: sanitizing an
/// already-sanitized name returns it unchanged.
pub fn sanitize_filename(text: &str, level: SanitizationLevel) -> String {
    let mut cleaned = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_control() || BASIC_FORBIDDEN.contains(&c) {
            continue;
        }
        if level == SanitizationLevel::Aggressive && AGGRESSIVE_FORBIDDEN.contains(&c) {
            continue;
        }
        cleaned.push(c);
    }

    if level == SanitizationLevel::Aggressive {
        cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    }

    let trimmed: String = cleaned
        .trim_matches(|c: char| c == ' ' || c == '.')
        .chars()
        .take(MAX_COMPONENT_CHARS)
        .collect();
    // Truncation can expose a trailing space or dot again
    let result = trimmed.trim_end_matches(|c: char| c == ' ' || c == '.');

    if result.is_empty() {
        "Untitled".to_string()
    } else {
        result.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_strips_filesystem_characters() {
        assert_eq!(
            sanitize_filename("A: Tale of \"Two\" <Cities>?", SanitizationLevel::Basic),
            "A Tale of Two Cities"
        );
        assert_eq!(
            sanitize_filename("back\\slash/and|pipe*", SanitizationLevel::Basic),
            "backslashandpipe"
        );
    }

    #[test]
    fn test_basic_keeps_punctuation() {
        assert_eq!(
            sanitize_filename("Book One (Part 1), Revised", SanitizationLevel::Basic),
            "Book One (Part 1), Revised"
        );
    }

    #[test]
    fn test_aggressive_strips_punctuation_and_collapses_whitespace() {
        assert_eq!(
            sanitize_filename("Book: One,  (Part   1); [Draft]", SanitizationLevel::Aggressive),
            "Book One Part 1 Draft"
        );
    }

    #[test]
    fn test_trims_edges() {
        assert_eq!(sanitize_filename("  name.  ", SanitizationLevel::Basic), "name");
        assert_eq!(sanitize_filename("...name", SanitizationLevel::Basic), "name");
    }

    #[test]
    fn test_never_empty() {
        assert_eq!(sanitize_filename("", SanitizationLevel::Basic), "Untitled");
        assert_eq!(sanitize_filename("???", SanitizationLevel::Basic), "Untitled");
        assert_eq!(sanitize_filename(" . . ", SanitizationLevel::Aggressive), "Untitled");
    }

    #[test]
    fn test_control_characters_removed() {
        assert_eq!(
            sanitize_filename("a\tb\nc", SanitizationLevel::Basic),
            "abc"
        );
    }

    #[test]
    fn test_long_names_capped() {
        let long = "x".repeat(500);
        let out = sanitize_filename(&long, SanitizationLevel::Basic);
        assert_eq!(out.chars().count(), 200);
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "A: Tale of \"Two\" <Cities>?",
            "Book: One,  (Part   1); [Draft]",
            "  spaced out .  ",
            "плохие символы: да?",
        ];
        for level in [SanitizationLevel::Basic, SanitizationLevel::Aggressive] {
            for input in inputs {
                let once = sanitize_filename(input, level);
                let twice = sanitize_filename(&once, level);
                assert_eq!(once, twice, "not idempotent for {:?} at {:?}", input, level);
            }
        }
    }
}
