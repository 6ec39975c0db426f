//! Mapeador: command-line interface for matcher-table coverage analysis
//!
//! ## Usage
//!
//! ```bash
//! mapeador analyze table.json corpus.map      # blame uncovered bytes
//! mapeador upperbound table.json HasNeon -b   # reachability upper bound
//! mapeador union 64231 a.map b.map -o all.map # combine corpus maps
//! mapeador stat 64231 *.map --sort desc       # per-file coverage table
//! ```

#![warn(missing_docs)]

pub mod commands;
pub mod config;
pub mod error;
pub mod handlers;
pub mod output;

pub use commands::{
    AnalyzeArgs, Cli, ColorArg, Commands, MapOpArgs, SortArg, StatArgs, UpperboundArgs,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::Reporter;
