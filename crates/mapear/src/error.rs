//! Result and error types for the analyzer core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for analyzer operations
pub type MapearResult<T> = Result<T, MapearError>;

/// Errors that can occur while loading or analyzing a matcher table
#[derive(Debug, Error)]
pub enum MapearError {
    /// File could not be opened or read
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Lookup table file was empty or declared a zero-byte matcher table
    #[error("Empty lookup table: {}", path.display())]
    EmptyLookupTable {
        /// Offending path
        path: PathBuf,
    },

    /// Lookup table JSON did not match the expected schema
    #[error("Malformed lookup table {}: {source}", path.display())]
    MalformedLookupTable {
        /// Offending path
        path: PathBuf,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Predicate expression could not be parsed
    #[error("Expected `{expected}` at char {at} in '{expression}'")]
    PredicateParse {
        /// Token class the parser was looking for
        expected: String,
        /// Full source expression
        expression: String,
        /// 1-based character position of the failure
        at: usize,
    },

    /// Named-predicate record carried no condition string
    #[error("Failed to extract condition for predicate {name}")]
    MissingCondition {
        /// Predicate name as declared in the record
        name: String,
    },

    /// Named-predicate record carried an empty condition string
    #[error("Got empty condition for predicate {name}")]
    EmptyCondition {
        /// Predicate name as declared in the record
        name: String,
    },

    /// A predicate was referenced by a name that was never declared
    #[error("Unknown predicate name: {name}")]
    UnknownPredicate {
        /// The name as supplied by the caller
        name: String,
    },

    /// A predicate was referenced by an out-of-range index
    #[error("Predicate index {index} out of range ({count} available)")]
    PredicateIndexOutOfRange {
        /// The index as supplied by the caller
        index: usize,
        /// Number of predicates actually available
        count: usize,
    },

    /// Matcher entry lacked the payload its kind requires
    #[error("Matcher at table index {index} is missing its {what} reference")]
    MissingPayload {
        /// Byte index of the offending matcher
        index: usize,
        /// What the kind requires ("pattern" or "pattern predicate")
        what: &'static str,
    },

    /// Lookup artifact declared a matcher with a zero-byte span
    #[error("Matcher at table index {index} has size 0")]
    ZeroSizeMatcher {
        /// Byte index of the offending matcher
        index: usize,
    },

    /// Lookup artifact referenced a nonexistent pattern or predicate
    #[error("{what} index {index} out of range ({count} available) in lookup table")]
    DanglingReference {
        /// What the reference points at ("pattern", "pattern predicate", …)
        what: &'static str,
        /// The referenced index
        index: usize,
        /// Number of entries actually available
        count: usize,
    },

    /// Two matcher intervals overlap without one containing the other
    #[error(
        "Matchers {first_index} [{first_begin}, {first_end}] and \
         {second_index} [{second_begin}, {second_end}] overlap without nesting"
    )]
    MatcherOverlap {
        /// Position of the earlier matcher in the sorted list
        first_index: usize,
        /// Begin byte of the earlier matcher
        first_begin: usize,
        /// End byte of the earlier matcher
        first_end: usize,
        /// Position of the later matcher in the sorted list
        second_index: usize,
        /// Begin byte of the later matcher
        second_begin: usize,
        /// End byte of the later matcher
        second_end: usize,
    },

    /// Shadow-map file held fewer bits than the declared table size
    #[error("Expected {expected} bits, but got {actual} bits in {}", path.display())]
    ShadowMapSize {
        /// Offending path
        path: PathBuf,
        /// Bits required by the table size
        expected: usize,
        /// Bits actually present
        actual: usize,
    },

    /// Explicit pattern-predicate assignment had the wrong length
    #[error("Expected {expected} pattern predicate values, got {actual}")]
    PatternPredicateCount {
        /// Number of compiled pattern predicates
        expected: usize,
        /// Number of values supplied
        actual: usize,
    },
}

impl MapearError {
    /// Wrap an I/O error with the path it occurred on
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_predicate_parse_message() {
        let err = MapearError::PredicateParse {
            expected: "(".to_string(),
            expression: "A && B".to_string(),
            at: 3,
        };
        assert_eq!(err.to_string(), "Expected `(` at char 3 in 'A && B'");
    }

    #[test]
    fn test_shadow_map_size_message() {
        let err = MapearError::ShadowMapSize {
            path: PathBuf::from("a.map"),
            expected: 64,
            actual: 8,
        };
        assert!(err.to_string().contains("Expected 64 bits"));
        assert!(err.to_string().contains("a.map"));
    }

    #[test]
    fn test_io_helper_keeps_path() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = MapearError::io("table.json", io);
        assert!(err.to_string().contains("table.json"));
    }
}
