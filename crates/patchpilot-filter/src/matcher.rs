//! Glob-first, regex-fallback path matching.
//!
//! Patterns come straight from user configuration, so malformed input is
//! expected. Each pattern is run through an ordered sequence of matching
//! strategies; a strategy that cannot compile the pattern abstains instead
//! of aborting, and a pattern no strategy can handle contributes no match.

/// A single matching strategy. `None` means the strategy could not interpret
/// the pattern and the next one should be tried.
type MatchAttempt = fn(&str, &str) -> Option<bool>;

const STRATEGIES: &[MatchAttempt] = &[glob_attempt, regex_attempt];

/// Returns `true` if any pattern matches the path.
///
/// Glob matching is attempted first, with the pattern anchored so it matches
/// at any directory depth. If the glob engine rejects the
/// pattern, it is retried verbatim as a regular expression. Patterns that fail
/// both compilers are ignored. Never panics, whatever the input.
///
/// # Examples
///
/// ```
/// use patchpilot_filter::matcher::matches_any;
///
/// let patterns = vec!["*.md".to_string()];
/// assert!(matches_any(&patterns, "docs/guide/README.md"));
/// assert!(!matches_any(&patterns, "src/main.rs"));
///
/// // Malformed patterns contribute no match instead of erroring.
/// assert!(!matches_any(&["a[".to_string()], "a.rs"));
/// ```
pub fn matches_any(patterns: &[String], path: &str) -> bool {
    patterns.iter().any(|pattern| pattern_matches(pattern, path))
}

fn pattern_matches(pattern: &str, path: &str) -> bool {
    STRATEGIES
        .iter()
        .find_map(|strategy| strategy(pattern, path))
        .unwrap_or(false)
}

fn glob_attempt(pattern: &str, path: &str) -> Option<bool> {
    let anchored = anchor(pattern);
    glob::Pattern::new(&anchored).ok().map(|p| p.matches(path))
}

/// The regex fallback uses the raw pattern, not the glob-anchored form.
fn regex_attempt(pattern: &str, path: &str) -> Option<bool> {
    regex::Regex::new(pattern).ok().map(|re| re.is_match(path))
}

/// Anchor a pattern so it matches at any directory depth.
///
/// A pattern beginning with `/` is prefixed with `**` so the absolute-looking
/// suffix matches under any ancestor. A pattern already beginning with `**` is
/// used verbatim. Everything else is prefixed with `**/`.
fn anchor(pattern: &str) -> String {
    if pattern.starts_with('/') {
        format!("**{pattern}")
    } else if pattern.starts_with("**") {
        pattern.to_string()
    } else {
        format!("**/{pattern}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pats(patterns: &[&str]) -> Vec<String> {
        patterns.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn bare_pattern_matches_at_any_depth() {
        assert!(matches_any(&pats(&["*.lock"]), "Cargo.lock"));
        assert!(matches_any(&pats(&["*.lock"]), "deep/nested/Cargo.lock"));
        assert!(!matches_any(&pats(&["*.lock"]), "src/lock.rs"));
    }

    #[test]
    fn slash_prefixed_pattern_is_anchored_with_double_star() {
        assert!(matches_any(&pats(&["/dist/*.js"]), "repo/dist/app.js"));
        assert!(matches_any(&pats(&["/dist/*.js"]), "a/b/dist/app.js"));
    }

    #[test]
    fn double_star_pattern_is_used_verbatim() {
        assert!(matches_any(&pats(&["**/generated/*.rs"]), "x/generated/a.rs"));
        assert!(!matches_any(&pats(&["**/generated/*.rs"]), "x/gen/a.rs"));
    }

    #[test]
    fn any_pattern_matching_is_enough() {
        let patterns = pats(&["*.min.js", "*.snap", "*.md"]);
        assert!(matches_any(&patterns, "notes/TODO.md"));
        assert!(!matches_any(&patterns, "src/app.ts"));
    }

    #[test]
    fn empty_pattern_list_matches_nothing() {
        assert!(!matches_any(&[], "anything.rs"));
    }

    #[test]
    fn malformed_patterns_never_panic() {
        // Invalid as both glob and regex.
        for pattern in ["a[", "[!", "***", "a**b", "(unclosed"] {
            assert!(!matches_any(&pats(&[pattern]), "src/lib.rs"));
        }
    }

    #[test]
    fn glob_failure_falls_back_to_regex() {
        // `\**` is rejected by the glob engine (the recursive wildcard is not
        // alone in its component) but compiles as the regex "literal star,
        // repeated", which matches any string.
        assert!(matches_any(&pats(&["\\**"]), "src/lib.rs"));
    }

    #[test]
    fn regex_fallback_uses_raw_pattern() {
        // Same glob-invalid shape, but anchored so only .ts paths match.
        assert!(matches_any(&pats(&["\\**\\.ts$"]), "src/app.ts"));
        assert!(!matches_any(&pats(&["\\**\\.ts$"]), "src/app.rs"));
    }
}
