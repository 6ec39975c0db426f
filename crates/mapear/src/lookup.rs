//! Loader for the build-step lookup artifact.
//!
//! The backend's table generator emits a single-line JSON file describing
//! every opcode span of the matcher table, the patterns they resolve to and
//! the predicates gating them. [`LookupTable::from_file`] parses it into the
//! sorted matcher vector, the pattern records and a fully parsed
//! [`PredicateKeeper`].

use crate::error::{MapearError, MapearResult};
use crate::matcher::{Matcher, MatcherKind, MatcherPayload};
use crate::predicate::PredicateKeeper;
use serde::Deserialize;
use std::path::Path;

/// One rewrite rule of the backend
#[derive(Debug, Clone)]
pub struct Pattern {
    /// Position in the pattern array
    pub index: usize,
    /// Named-predicate indices that must all hold for this pattern
    pub named_predicates: Vec<usize>,
    /// Compiled conjunction of the named predicates, if any
    pub pat_predicate: Option<usize>,
    /// Declaring source file, for blame output
    pub path: String,
    /// `"src -> dst"` DAG rendering, for blame output
    pub pattern: String,
    /// Selection complexity, reporting metadata only
    pub complexity: i64,
}

/// Parsed lookup artifact: sorted matchers, patterns, table size and the
/// predicate keeper built from the artifact's predicate arrays
#[derive(Debug)]
pub struct LookupTable {
    /// Matcher spans in table order (DFS preorder over the nesting)
    pub matchers: Vec<Matcher>,
    /// Pattern records, indexed by matcher payloads
    pub patterns: Vec<Pattern>,
    /// Declared size of the matcher table in bytes
    pub matcher_table_size: usize,
    /// Predicate arena parsed from the artifact
    pub predicates: PredicateKeeper,
}

#[derive(Debug, Deserialize)]
struct RawLookupTable {
    table_size: usize,
    #[serde(default)]
    predicates: Vec<String>,
    #[serde(default)]
    pat_predicates: Vec<String>,
    #[serde(default)]
    patterns: Vec<RawPattern>,
    #[serde(default)]
    matchers: Vec<RawMatcher>,
}

#[derive(Debug, Deserialize)]
struct RawPattern {
    #[serde(default)]
    predicates: Vec<usize>,
    #[serde(default)]
    pat_predicate: Option<usize>,
    #[serde(default)]
    complexity: i64,
    #[serde(default)]
    path: String,
    #[serde(default)]
    pattern: String,
}

#[derive(Debug, Deserialize)]
struct RawMatcher {
    index: usize,
    size: usize,
    #[serde(default)]
    kind: Option<u32>,
    #[serde(default)]
    pattern: Option<usize>,
    #[serde(default)]
    predicate: Option<usize>,
    #[serde(default, rename = "case")]
    case_name: Option<String>,
}

impl LookupTable {
    /// Load and parse a lookup artifact from disk.
    ///
    /// `case_sensitive` controls named-predicate name folding; `verbosity`
    /// gates stderr diagnostics (unknown predicate literals print at 2+).
    ///
    /// # Errors
    ///
    /// All load failures are fatal: unreadable or empty file, schema
    /// violation, interval nesting violation, dangling references or an
    /// unparsable predicate expression.
    pub fn from_file(
        path: impl AsRef<Path>,
        case_sensitive: bool,
        verbosity: u8,
    ) -> MapearResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| MapearError::io(path, source))?;
        if text.trim().is_empty() {
            return Err(MapearError::EmptyLookupTable {
                path: path.to_path_buf(),
            });
        }
        Self::from_json_str(&text, case_sensitive, verbosity).map_err(|err| match err {
            MapearError::MalformedLookupTable { source, .. } => {
                MapearError::MalformedLookupTable {
                    path: path.to_path_buf(),
                    source,
                }
            }
            MapearError::EmptyLookupTable { .. } => MapearError::EmptyLookupTable {
                path: path.to_path_buf(),
            },
            other => other,
        })
    }

    /// Parse a lookup artifact from its JSON text
    ///
    /// # Errors
    ///
    /// Same failure surface as [`from_file`](Self::from_file), minus I/O.
    pub fn from_json_str(
        text: &str,
        case_sensitive: bool,
        verbosity: u8,
    ) -> MapearResult<Self> {
        let raw: RawLookupTable =
            serde_json::from_str(text).map_err(|source| MapearError::MalformedLookupTable {
                path: std::path::PathBuf::new(),
                source,
            })?;

        if raw.table_size == 0 {
            return Err(MapearError::EmptyLookupTable {
                path: std::path::PathBuf::new(),
            });
        }

        let mut matchers = build_matchers(&raw)?;
        matchers.sort_by(Matcher::table_order);
        if let Some(first) = matchers.first_mut() {
            // The terminating null byte after the outermost scope belongs to
            // the covered territory
            first.end += 1;
        }
        classify_structural_kinds(&mut matchers);
        check_nesting(&matchers)?;

        let patterns = build_patterns(&raw)?;

        let mut predicates = PredicateKeeper::new();
        predicates.set_case_sensitive(case_sensitive);
        predicates.set_verbosity(verbosity);
        if verbosity > 1 {
            eprintln!("NOTE: Adding named predicates.");
        }
        predicates.add_named_predicates(&raw.predicates)?;
        if verbosity > 1 {
            eprintln!("NOTE: Adding pattern predicates.");
        }
        predicates.add_pattern_predicates(&raw.pat_predicates)?;

        Ok(Self {
            matchers,
            patterns,
            matcher_table_size: raw.table_size,
            predicates,
        })
    }
}

fn build_matchers(raw: &RawLookupTable) -> MapearResult<Vec<Matcher>> {
    let mut matchers = Vec::with_capacity(raw.matchers.len());
    for entry in &raw.matchers {
        if entry.size == 0 {
            return Err(MapearError::ZeroSizeMatcher { index: entry.index });
        }
        // Entries without a kind code are structural (subscopes and switch
        // cases); they are provisionally subscopes until the sort reveals
        // their enclosing switch, if any.
        let kind = entry
            .kind
            .map_or(MatcherKind::Subscope, MatcherKind::from_code);
        let mut matcher = Matcher::new(entry.index, entry.index + entry.size - 1, kind);

        match kind {
            MatcherKind::CompleteMatch | MatcherKind::MorphNodeTo => {
                let index = entry.pattern.ok_or(MapearError::MissingPayload {
                    index: entry.index,
                    what: "pattern",
                })?;
                if index >= raw.patterns.len() {
                    return Err(MapearError::DanglingReference {
                        what: "pattern",
                        index,
                        count: raw.patterns.len(),
                    });
                }
                matcher.payload = MatcherPayload::Pattern(index);
            }
            MatcherKind::CheckPatternPredicate => {
                let index = entry.predicate.ok_or(MapearError::MissingPayload {
                    index: entry.index,
                    what: "pattern predicate",
                })?;
                if index >= raw.pat_predicates.len() {
                    return Err(MapearError::DanglingReference {
                        what: "pattern predicate",
                        index,
                        count: raw.pat_predicates.len(),
                    });
                }
                matcher.payload = MatcherPayload::PatternPredicate(index);
            }
            _ => {
                if let Some(name) = &entry.case_name {
                    matcher.payload = MatcherPayload::Case(name.clone());
                }
            }
        }
        matchers.push(matcher);
    }
    Ok(matchers)
}

/// Re-classify provisional subscopes by their innermost enclosing matcher:
/// a child of a `SwitchOpcode` or `SwitchType` is that switch's case kind.
fn classify_structural_kinds(matchers: &mut [Matcher]) {
    let mut stack: Vec<(usize, MatcherKind)> = Vec::new();
    for i in 0..matchers.len() {
        while let Some(&(end, _)) = stack.last() {
            if end < matchers[i].begin {
                stack.pop();
            } else {
                break;
            }
        }
        if matchers[i].kind == MatcherKind::Subscope {
            matchers[i].kind = match stack.last() {
                Some(&(_, MatcherKind::SwitchOpcode)) => MatcherKind::SwitchOpcodeCase,
                Some(&(_, MatcherKind::SwitchType)) => MatcherKind::SwitchTypeCase,
                _ => MatcherKind::Subscope,
            };
        }
        if !matchers[i].kind.is_leaf() {
            stack.push((matchers[i].end, matchers[i].kind));
        }
    }
}

/// Enforce the nesting invariant: any two intervals are disjoint or one
/// strictly contains the other
fn check_nesting(matchers: &[Matcher]) -> MapearResult<()> {
    let mut stack: Vec<usize> = Vec::new();
    for (i, matcher) in matchers.iter().enumerate() {
        while let Some(&top) = stack.last() {
            if matchers[top].end < matcher.begin {
                stack.pop();
            } else {
                break;
            }
        }
        if let Some(&top) = stack.last() {
            if !matchers[top].contains(matcher) {
                return Err(MapearError::MatcherOverlap {
                    first_index: top,
                    first_begin: matchers[top].begin,
                    first_end: matchers[top].end,
                    second_index: i,
                    second_begin: matcher.begin,
                    second_end: matcher.end,
                });
            }
        }
        stack.push(i);
    }
    Ok(())
}

fn build_patterns(raw: &RawLookupTable) -> MapearResult<Vec<Pattern>> {
    let mut patterns = Vec::with_capacity(raw.patterns.len());
    for (index, entry) in raw.patterns.iter().enumerate() {
        let pat_predicate = if entry.predicates.is_empty() {
            // No named predicates to satisfy; the gate is the True sentinel
            None
        } else {
            entry.pat_predicate
        };
        if let Some(pp) = pat_predicate {
            if pp >= raw.pat_predicates.len() {
                return Err(MapearError::DanglingReference {
                    what: "pattern predicate",
                    index: pp,
                    count: raw.pat_predicates.len(),
                });
            }
        }
        patterns.push(Pattern {
            index,
            named_predicates: entry.predicates.clone(),
            pat_predicate,
            path: entry.path.clone(),
            pattern: entry.pattern.clone(),
            complexity: entry.complexity,
        });
    }
    Ok(patterns)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn load(json: &str) -> LookupTable {
        LookupTable::from_json_str(json, false, 0).unwrap()
    }

    #[test]
    fn test_minimal_table() {
        let table = load(
            r#"{"table_size":8,"predicates":[],"pat_predicates":[],
                "patterns":[{"predicates":[],"complexity":1,"path":"X.td","pattern":"(a) -> (b)"}],
                "matchers":[{"index":0,"size":7,"kind":0},
                            {"index":6,"size":1,"kind":35,"pattern":0}]}"#,
        );
        assert_eq!(table.matcher_table_size, 8);
        assert_eq!(table.matchers.len(), 2);
        // Root scope end extended over the terminating null byte
        assert_eq!(table.matchers[0].begin, 0);
        assert_eq!(table.matchers[0].end, 7);
        assert_eq!(table.matchers[1].pattern_index(), Some(0));
        assert_eq!(table.patterns.len(), 1);
        assert_eq!(table.patterns[0].pattern, "(a) -> (b)");
    }

    #[test]
    fn test_empty_matcher_list_is_valid() {
        let table = load(
            r#"{"table_size":4,"predicates":[],"pat_predicates":[],"patterns":[],"matchers":[]}"#,
        );
        assert!(table.matchers.is_empty());
    }

    #[test]
    fn test_zero_table_size_is_fatal() {
        let err = LookupTable::from_json_str(
            r#"{"table_size":0,"predicates":[],"pat_predicates":[],"patterns":[],"matchers":[]}"#,
            false,
            0,
        )
        .unwrap_err();
        assert!(matches!(err, MapearError::EmptyLookupTable { .. }));
    }

    #[test]
    fn test_schema_violation_is_fatal() {
        let err = LookupTable::from_json_str(r#"{"matchers":"nope"}"#, false, 0).unwrap_err();
        assert!(matches!(err, MapearError::MalformedLookupTable { .. }));
    }

    #[test]
    fn test_sorted_preorder() {
        let table = load(
            r#"{"table_size":32,"predicates":[],"pat_predicates":[],"patterns":[],
                "matchers":[{"index":16,"size":15,"kind":13},
                            {"index":0,"size":31,"kind":0},
                            {"index":1,"size":15,"kind":13}]}"#,
        );
        let begins: Vec<usize> = table.matchers.iter().map(|m| m.begin).collect();
        assert_eq!(begins, vec![0, 1, 16]);
    }

    #[test]
    fn test_nesting_invariant_holds_after_load() {
        let table = load(
            r#"{"table_size":32,"predicates":[],"pat_predicates":[],"patterns":[],
                "matchers":[{"index":0,"size":31,"kind":0},
                            {"index":1,"size":10},
                            {"index":2,"size":4,"kind":13},
                            {"index":12,"size":10}]}"#,
        );
        for a in 0..table.matchers.len() {
            for b in a + 1..table.matchers.len() {
                assert!(
                    !table.matchers[a].overlaps(&table.matchers[b]),
                    "matchers {a} and {b} overlap"
                );
            }
        }
    }

    #[test]
    fn test_partial_overlap_is_fatal() {
        let err = LookupTable::from_json_str(
            r#"{"table_size":32,"predicates":[],"pat_predicates":[],"patterns":[],
                "matchers":[{"index":0,"size":16,"kind":0},
                            {"index":8,"size":16,"kind":13}]}"#,
            false,
            0,
        )
        .unwrap_err();
        assert!(matches!(err, MapearError::MatcherOverlap { .. }));
    }

    #[test]
    fn test_switch_case_kinds_inferred() {
        let table = load(
            r#"{"table_size":64,"predicates":[],"pat_predicates":[],"patterns":[],
                "matchers":[{"index":0,"size":63,"kind":0},
                            {"index":1,"size":30,"kind":12},
                            {"index":2,"size":14,"case":"ISD::ADD"},
                            {"index":16,"size":14,"case":"ISD::SUB"},
                            {"index":32,"size":20,"kind":14},
                            {"index":33,"size":9,"case":"i32"},
                            {"index":53,"size":8}]}"#,
        );
        let kinds: Vec<MatcherKind> = table.matchers.iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            vec![
                MatcherKind::Scope,
                MatcherKind::SwitchOpcode,
                MatcherKind::SwitchOpcodeCase,
                MatcherKind::SwitchOpcodeCase,
                MatcherKind::SwitchType,
                MatcherKind::SwitchTypeCase,
                MatcherKind::Subscope,
            ]
        );
        assert_eq!(table.matchers[2].case_name(), Some("ISD::ADD"));
        assert_eq!(table.matchers[5].case_name(), Some("i32"));
    }

    #[test]
    fn test_pattern_without_predicates_takes_no_gate() {
        let table = load(
            r#"{"table_size":8,"predicates":[],"pat_predicates":["cond"],
                "patterns":[{"predicates":[],"pat_predicate":0,"complexity":0,"path":"","pattern":""}],
                "matchers":[{"index":0,"size":7,"kind":0}]}"#,
        );
        assert_eq!(table.patterns[0].pat_predicate, None);
    }

    #[test]
    fn test_dangling_pattern_reference_is_fatal() {
        let err = LookupTable::from_json_str(
            r#"{"table_size":8,"predicates":[],"pat_predicates":[],"patterns":[],
                "matchers":[{"index":0,"size":7,"kind":0},
                            {"index":6,"size":1,"kind":35,"pattern":3}]}"#,
            false,
            0,
        )
        .unwrap_err();
        assert!(matches!(err, MapearError::DanglingReference { .. }));
    }

    #[test]
    fn test_predicates_parse_into_keeper() {
        let table = load(
            r#"{"table_size":8,
                "predicates":["HasA  string CondString = \"Subtarget->hasA()\";"],
                "pat_predicates":["Subtarget->hasA()"],
                "patterns":[{"predicates":[0],"pat_predicate":0,"complexity":0,"path":"","pattern":""}],
                "matchers":[{"index":0,"size":7,"kind":0}]}"#,
        );
        assert_eq!(table.predicates.named_count(), 1);
        assert_eq!(table.predicates.pattern_count(), 1);
        assert!(!table.predicates.pattern_satisfied(0));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = LookupTable::from_file("/nonexistent/lookup.json", false, 0).unwrap_err();
        assert!(matches!(err, MapearError::Io { .. }));
    }
}
