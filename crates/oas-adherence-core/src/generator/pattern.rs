//! Strings matching a `pattern`
//!
//! Patterns are compiled into a proptest regex strategy and sampled with a
//! test runner seeded from the caller's random source, so the output is
//! reproducible for a seeded caller.

use proptest::strategy::{Strategy, ValueTree};
use proptest::test_runner::{Config, RngAlgorithm, TestRng, TestRunner};
use rand::Rng;
use regex::Regex;
use thiserror::Error;

/// Why no string could be produced for a pattern
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// The pattern does not compile
    #[error("invalid pattern '{pattern}': {reason}")]
    Invalid { pattern: String, reason: String },

    /// The pattern compiles but uses constructs generation cannot honor
    #[error("pattern '{pattern}' is not supported for generation: {reason}")]
    Unsupported { pattern: String, reason: String },
}

/// Generate a string that `pattern` matches
pub fn generate_matching<R: Rng + ?Sized>(pattern: &str, rng: &mut R) -> Result<String, PatternError> {
    let compiled = Regex::new(pattern).map_err(|e| PatternError::Invalid {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;

    let unsupported = |reason: String| PatternError::Unsupported {
        pattern: pattern.to_string(),
        reason,
    };

    if contains_boundary_escape(pattern) {
        return Err(unsupported("word boundary escapes".to_string()));
    }
    let normalized = strip_anchors(pattern);

    let strategy = proptest::string::string_regex(&format!("(?-u:{})", normalized))
        .or_else(|_| proptest::string::string_regex(normalized))
        .map_err(|e| unsupported(e.to_string()))?;

    let mut seed = [0u8; 32];
    rng.fill(&mut seed);
    let mut runner = TestRunner::new_with_rng(
        Config::default(),
        TestRng::from_seed(RngAlgorithm::ChaCha, &seed),
    );
    let tree = strategy
        .new_tree(&mut runner)
        .map_err(|reason| unsupported(reason.to_string()))?;
    let value = tree.current();

    if !compiled.is_match(&value) {
        return Err(unsupported(format!("sampled '{}' does not match", value)));
    }
    Ok(value)
}

/// Drop a leading `^` and an unescaped trailing `$`
fn strip_anchors(pattern: &str) -> &str {
    let bytes = pattern.as_bytes();
    let start = usize::from(bytes.first() == Some(&b'^'));
    let mut end = bytes.len();
    if end > start && bytes[end - 1] == b'$' && !is_escaped(bytes, end - 1) {
        end -= 1;
    }
    &pattern[start..end]
}

fn contains_boundary_escape(pattern: &str) -> bool {
    let bytes = pattern.as_bytes();
    bytes
        .iter()
        .enumerate()
        .any(|(idx, b)| (*b == b'b' || *b == b'B') && is_escaped(bytes, idx))
}

/// Whether the byte at `idx` is preceded by an odd number of backslashes
fn is_escaped(bytes: &[u8], idx: usize) -> bool {
    bytes[..idx].iter().rev().take_while(|b| **b == b'\\').count() % 2 == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_string_matches() {
        let mut rng = StdRng::seed_from_u64(11);
        for pattern in ["^[a-z]{3,6}$", r"\d{4}-\d{2}", "^(cat|dog)s?$", "[A-F0-9]+"] {
            let re = Regex::new(pattern).unwrap();
            for _ in 0..20 {
                let value = generate_matching(pattern, &mut rng).unwrap();
                assert!(re.is_match(&value), "{} !~ {}", value, pattern);
            }
        }
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = generate_matching("^[a-z]{8}$", &mut StdRng::seed_from_u64(5)).unwrap();
        let b = generate_matching("^[a-z]{8}$", &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_pattern() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = generate_matching("(", &mut rng).unwrap_err();
        assert!(matches!(err, PatternError::Invalid { .. }));
    }

    #[test]
    fn test_word_boundary_is_unsupported() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = generate_matching(r"\bword\b", &mut rng).unwrap_err();
        assert!(matches!(err, PatternError::Unsupported { .. }));
    }

    #[test]
    fn test_strip_anchors() {
        assert_eq!(strip_anchors("^abc$"), "abc");
        assert_eq!(strip_anchors(r"abc\$"), r"abc\$");
        assert_eq!(strip_anchors("^"), "");
        assert_eq!(strip_anchors(""), "");
    }

    #[test]
    fn test_is_escaped() {
        assert!(is_escaped(br"\b", 1));
        assert!(!is_escaped(br"\\b", 2));
        assert!(!is_escaped(b"b", 0));
    }
}
