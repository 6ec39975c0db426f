//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Mapeador: shadow-map analyzer for matcher-table coverage
#[derive(Parser, Debug)]
#[command(name = "mapeador")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Localize coverage loss in an observed shadow map
    Analyze(AnalyzeArgs),

    /// Compute the coverage upper bound under a predicate assignment
    Upperbound(UpperboundArgs),

    /// Combine maps; a byte counts as covered when any input covered it
    Union(MapOpArgs),

    /// Combine maps; a byte counts as covered when every input covered it
    Intersect(MapOpArgs),

    /// Mark the coverage later maps add over the first
    Diff(MapOpArgs),

    /// Print coverage stats for shadow-map files
    Stat(StatArgs),
}

/// Arguments for the analyze command
#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Lookup table JSON emitted by the backend build
    pub lookup: PathBuf,

    /// Shadow map recorded by the instrumented selector
    pub map: PathBuf,

    /// Cap the number of rows per blame table
    #[arg(short = 'l', long)]
    pub limit: Option<usize>,

    /// Expand the blame to individual patterns
    #[arg(long)]
    pub patterns: bool,

    /// Split each blame entry's loss evenly across its patterns
    #[arg(long, requires = "patterns")]
    pub per_pattern_loss: bool,

    /// List the patterns still reachable by varying fuzzer input
    #[arg(long)]
    pub possible: bool,
}

/// Arguments for the upperbound command
#[derive(Parser, Debug)]
pub struct UpperboundArgs {
    /// Lookup table JSON emitted by the backend build
    pub lookup: PathBuf,

    /// Named predicates to assume true, by name or declaration index
    pub true_predicates: Vec<String>,

    /// Pattern-predicate assignment: a 0/1 string of exactly
    /// pattern-predicate count length, or a packed bit-vector file
    #[arg(short = 'p', long = "pat-predicates")]
    pub pat_predicates: Option<String>,

    /// Write the upper-bound shadow map here
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Treat predicate names as case-sensitive
    #[arg(short = 's', long)]
    pub case_sensitive: bool,

    /// Show the pattern-predicate blame list
    #[arg(short = 'b', long)]
    pub blame: bool,

    /// Cap the number of blame list rows
    #[arg(short = 'l', long)]
    pub limit: Option<usize>,
}

/// Arguments shared by the union, intersect and diff commands
#[derive(Parser, Debug)]
pub struct MapOpArgs {
    /// Matcher table size in bytes (bits per map)
    pub table_size: usize,

    /// Shadow maps to combine, in order
    #[arg(required = true, num_args = 1..)]
    pub maps: Vec<PathBuf>,

    /// Write the combined map here
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the stat command
#[derive(Parser, Debug)]
pub struct StatArgs {
    /// Matcher table size in bytes (bits per map)
    pub table_size: usize,

    /// Shadow maps to report on
    #[arg(required = true, num_args = 1..)]
    pub maps: Vec<PathBuf>,

    /// Sort rows by covered count
    #[arg(long, value_enum, default_value = "none")]
    pub sort: SortArg,
}

/// Sort order argument for the stat command
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortArg {
    /// Keep command-line order
    #[default]
    None,
    /// Ascending by covered count
    Asc,
    /// Descending by covered count
    Desc,
}

impl From<SortArg> for mapear::SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::None => Self::None,
            SortArg::Asc => Self::Asc,
            SortArg::Desc => Self::Desc,
        }
    }
}

/// Color output argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
