//! Console reporting for warnings and section headers

use console::style;

/// Stderr reporter with optional color
#[derive(Debug)]
pub struct Reporter {
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl Reporter {
    /// Create a new reporter
    #[must_use]
    pub const fn new(use_color: bool, quiet: bool) -> Self {
        Self { use_color, quiet }
    }

    /// Print an error message; never suppressed
    pub fn error(&self, message: &str) {
        let prefix = if self.use_color {
            style("ERROR:").red().bold().to_string()
        } else {
            "ERROR:".to_string()
        };
        eprintln!("{prefix} {message}");
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("WARNING:").yellow().bold().to_string()
        } else {
            "WARNING:".to_string()
        };
        eprintln!("{prefix} {message}");
    }

    /// Print an informational note
    pub fn note(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("NOTE:").cyan().to_string()
        } else {
            "NOTE:".to_string()
        };
        eprintln!("{prefix} {message}");
    }
}
