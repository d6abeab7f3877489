//! `suite[:glob]` selection patterns.
//!
//! A pattern is split at its first `:`. The suite part matches suite
//! names by exact equality; the optional test part is a shell glob
//! (`*`, `?`, `[...]`) matched against test names. Globs are validated
//! when the pattern is parsed, so a malformed glob aborts the run
//! before any test executes.

use thiserror::Error;

/// Pattern parse failure. Always fatal for the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("unclosed character class in glob '{0}'")]
    UnclosedClass(String),
}

/// A parsed `suite[:glob]` selector.
#[derive(Debug, Clone)]
pub struct Pattern {
    suite: String,
    glob: Option<String>,
}

impl Pattern {
    /// Parse and validate a selector string.
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        match raw.split_once(':') {
            Some((suite, glob)) => {
                validate_glob(glob)?;
                Ok(Self {
                    suite: suite.to_string(),
                    glob: Some(glob.to_string()),
                })
            }
            None => Ok(Self {
                suite: raw.to_string(),
                glob: None,
            }),
        }
    }

    /// True iff the suite part equals `name` exactly.
    pub fn matches_suite(&self, name: &str) -> bool {
        self.suite == name
    }

    /// True if there is no glob part, or the glob matches `name`.
    pub fn matches_test(&self, name: &str) -> bool {
        match &self.glob {
            Some(glob) => glob_match(glob, name),
            None => true,
        }
    }
}

/// Is a suite selected by any pattern? No patterns selects everything.
pub fn suite_selected(patterns: &[Pattern], suite: &str) -> bool {
    patterns.is_empty() || patterns.iter().any(|p| p.matches_suite(suite))
}

/// Is a unit selected? A unit is enabled iff some pattern matches its
/// suite exactly and, when that pattern carries a glob, the glob
/// matches the test name.
pub fn unit_selected(patterns: &[Pattern], suite: &str, test: &str) -> bool {
    patterns.is_empty()
        || patterns
            .iter()
            .any(|p| p.matches_suite(suite) && p.matches_test(test))
}

/// Reject globs whose `[` class never closes.
fn validate_glob(glob: &str) -> Result<(), PatternError> {
    let chars: Vec<char> = glob.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '[' {
            i += 1;
            continue;
        }
        let mut j = i + 1;
        if matches!(chars.get(j), Some('!' | '^')) {
            j += 1;
        }
        // a ']' directly after the opener (or negation) is a literal
        if chars.get(j) == Some(&']') {
            j += 1;
        }
        while j < chars.len() && chars[j] != ']' {
            j += 1;
        }
        if j >= chars.len() {
            return Err(PatternError::UnclosedClass(glob.to_string()));
        }
        i = j + 1;
    }
    Ok(())
}

/// Shell-glob match with iterative `*` backtracking.
fn glob_match(glob: &str, name: &str) -> bool {
    let pat: Vec<char> = glob.chars().collect();
    let text: Vec<char> = name.chars().collect();

    let mut p = 0;
    let mut t = 0;
    // position to resume from after the most recent '*'
    let mut retry: Option<(usize, usize)> = None;

    while t < text.len() {
        let advanced = match pat.get(p) {
            Some('*') => {
                retry = Some((p + 1, t));
                p += 1;
                continue;
            }
            Some('?') => true,
            Some('[') => {
                let (hit, next) = match_class(&pat, p, text[t]);
                if hit {
                    p = next;
                    t += 1;
                    continue;
                }
                false
            }
            Some(&c) => c == text[t],
            None => false,
        };

        if advanced {
            p += 1;
            t += 1;
        } else if let Some((retry_p, retry_t)) = retry {
            p = retry_p;
            t = retry_t + 1;
            retry = Some((retry_p, retry_t + 1));
        } else {
            return false;
        }
    }

    while pat.get(p) == Some(&'*') {
        p += 1;
    }
    p == pat.len()
}

/// Match `c` against the class opening at `pat[start]`.
///
/// Returns whether the class accepts the character and the index just
/// past the closing `]`. The class is known to be well formed because
/// globs are validated at parse time.
fn match_class(pat: &[char], start: usize, c: char) -> (bool, usize) {
    let mut i = start + 1;
    let negated = matches!(pat.get(i), Some('!' | '^'));
    if negated {
        i += 1;
    }

    let mut hit = false;
    let mut first = true;
    while i < pat.len() && (first || pat[i] != ']') {
        first = false;
        if i + 2 < pat.len() && pat[i + 1] == '-' && pat[i + 2] != ']' {
            if pat[i] <= c && c <= pat[i + 2] {
                hit = true;
            }
            i += 3;
        } else {
            if pat[i] == c {
                hit = true;
            }
            i += 1;
        }
    }

    (hit != negated, i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pat(raw: &str) -> Pattern {
        Pattern::parse(raw).unwrap()
    }

    #[test]
    fn test_suite_part_is_exact() {
        let p = pat("math");
        assert!(p.matches_suite("math"));
        assert!(!p.matches_suite("mathx"));
        assert!(!p.matches_suite("mat"));
    }

    #[test]
    fn test_no_glob_matches_every_test() {
        let p = pat("math");
        assert!(p.matches_test("add_overflow"));
        assert!(p.matches_test(""));
    }

    #[test]
    fn test_split_at_first_colon() {
        let p = pat("suite:a:b");
        assert!(p.matches_suite("suite"));
        assert!(p.matches_test("a:b"));
        assert!(!p.matches_test("a"));
    }

    #[test]
    fn test_glob_star() {
        let p = pat("math:add_*");
        assert!(p.matches_test("add_overflow"));
        assert!(p.matches_test("add_"));
        assert!(!p.matches_test("sub_overflow"));
    }

    #[test]
    fn test_glob_star_backtracks() {
        let p = pat("s:*_overflow");
        assert!(p.matches_test("add_then_mul_overflow"));
        assert!(!p.matches_test("add_then_mul_overflows"));
    }

    #[test]
    fn test_glob_question() {
        let p = pat("s:ca?");
        assert!(p.matches_test("cat"));
        assert!(p.matches_test("car"));
        assert!(!p.matches_test("ca"));
        assert!(!p.matches_test("cart"));
    }

    #[test]
    fn test_glob_class() {
        let p = pat("s:[bc]at");
        assert!(p.matches_test("bat"));
        assert!(p.matches_test("cat"));
        assert!(!p.matches_test("rat"));
    }

    #[test]
    fn test_glob_class_range() {
        let p = pat("s:test_[0-9]");
        assert!(p.matches_test("test_3"));
        assert!(!p.matches_test("test_x"));
    }

    #[test]
    fn test_glob_class_negation() {
        let p = pat("s:[!r]at");
        assert!(p.matches_test("bat"));
        assert!(!p.matches_test("rat"));

        let caret = pat("s:[^r]at");
        assert!(caret.matches_test("bat"));
        assert!(!caret.matches_test("rat"));
    }

    #[test]
    fn test_glob_literal_closing_bracket() {
        let p = pat("s:[]x]");
        assert!(p.matches_test("]"));
        assert!(p.matches_test("x"));
        assert!(!p.matches_test("y"));
    }

    #[test]
    fn test_malformed_glob_is_an_error() {
        let err = Pattern::parse("math:[ab").unwrap_err();
        assert_eq!(err, PatternError::UnclosedClass("[ab".to_string()));
        assert!(Pattern::parse("math:x[0-9").is_err());
        assert!(Pattern::parse("math:[!").is_err());
    }

    #[test]
    fn test_empty_pattern_list_selects_everything() {
        assert!(suite_selected(&[], "anything"));
        assert!(unit_selected(&[], "anything", "at_all"));
    }

    #[test]
    fn test_unit_selection_requires_both_parts() {
        let patterns = vec![pat("math:add_*")];
        assert!(unit_selected(&patterns, "math", "add_overflow"));
        assert!(!unit_selected(&patterns, "math", "sub_overflow"));
        assert!(!unit_selected(&patterns, "text", "add_overflow"));
        assert!(suite_selected(&patterns, "math"));
        assert!(!suite_selected(&patterns, "text"));
    }

    #[test]
    fn test_multiple_patterns_union() {
        let patterns = vec![pat("math:add_*"), pat("text")];
        assert!(unit_selected(&patterns, "math", "add_one"));
        assert!(unit_selected(&patterns, "text", "anything"));
        assert!(!unit_selected(&patterns, "math", "sub_one"));
    }
}
