//! Mapear: matcher-table coverage analysis for instruction-selection fuzzing.
//!
//! A compiler backend's DAG instruction selector interprets a byte-addressed
//! matcher table; instrumentation produces shadow maps with one bit per table
//! byte (`1` = never executed). This crate loads the build-step lookup
//! artifact describing the table, answers how much of the table any execution
//! could reach under a predicate assignment, and localizes blame for the
//! bytes an observed corpus failed to reach, so a mutator can steer input
//! generation toward the unreached patterns.
//!
//! # Architecture
//!
//! ```text
//! lookup.json ──► LookupTable ──► MatcherTree ──► UpperBound / MapAnalysis
//!                     │                                   │
//!                     └── PredicateKeeper ◄── enable/...  └── blame reports
//! corpus maps ──► shadow_map codec ──► union / intersect / diff / stats
//! ```
//!
//! The fuzzer driver, mutation strategies and compiler harness live outside
//! this crate; they consume the blame data and the shadow-map algebra.

#![warn(missing_docs)]
// Lints are configured in the workspace Cargo.toml [workspace.lints] tables

pub mod error;
pub mod lookup;
pub mod matcher;
pub mod matcher_tree;
pub mod predicate;
pub mod shadow_map;
pub mod stats;

pub use error::{MapearError, MapearResult};
pub use lookup::{LookupTable, Pattern};
pub use matcher::{Matcher, MatcherKind, MatcherPayload, AFFECTS_EARLY_MATCH};
pub use matcher_tree::{Blamee, MapAnalysis, MatcherTree, PatternBlame, UpperBound};
pub use predicate::{PredicateKeeper, PredicateRef};
pub use shadow_map::{
    covered_count, do_map_op, map_diff, map_intersect, map_union, read_bit_vector,
    read_bit_vectors, write_bit_vector,
};
pub use stats::{MapStatPrinter, SortOrder};
