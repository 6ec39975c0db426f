//! Union, intersect and diff command handler

use crate::commands::MapOpArgs;
use crate::config::CliConfig;
use crate::error::CliResult;
use mapear::{map_diff, map_intersect, map_union, read_bit_vectors, write_bit_vector,
    MapStatPrinter};

/// Which elementwise combination to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapOp {
    /// Covered where any input covered
    Union,
    /// Covered where every input covered
    Intersect,
    /// Coverage later maps add over the first
    Diff,
}

impl MapOp {
    /// Summary-row label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Union => "Union",
            Self::Intersect => "Intersection",
            Self::Diff => "Diff",
        }
    }
}

/// Execute a map combination command over the listed shadow maps
pub fn execute_map_op(config: &CliConfig, op: MapOp, args: &MapOpArgs) -> CliResult<()> {
    let maps = read_bit_vectors(args.table_size, &args.maps)?;
    let result = match op {
        MapOp::Union => map_union(&maps),
        MapOp::Intersect => map_intersect(&maps),
        MapOp::Diff => map_diff(&maps),
    };

    if config.effective_level(args.output.is_some()) > 0 {
        let mut printer = MapStatPrinter::new();
        for (path, map) in args.maps.iter().zip(&maps) {
            printer.add_file_map(path, map);
        }
        printer.summarize_map(op.label(), &result, false);
        printer.print();
    }

    if let Some(output) = &args.output {
        write_bit_vector(&result, output)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::commands::MapOpArgs;
    use mapear::read_bit_vector;
    use std::path::PathBuf;

    fn write_map(dir: &tempfile::TempDir, name: &str, pattern: &str) -> PathBuf {
        let path = dir.path().join(name);
        let bits: Vec<bool> = pattern.chars().map(|c| c == '1').collect();
        write_bit_vector(&bits, &path).unwrap();
        path
    }

    #[test]
    fn test_union_writes_combined_map() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_map(&dir, "a.map", "11001100");
        let b = write_map(&dir, "b.map", "10101010");
        let out = dir.path().join("out.map");

        let args = MapOpArgs {
            table_size: 8,
            maps: vec![a, b],
            output: Some(out.clone()),
        };
        execute_map_op(&CliConfig::new(), MapOp::Union, &args).unwrap();

        let result = read_bit_vector(8, &out).unwrap();
        let expected: Vec<bool> = "10001000".chars().map(|c| c == '1').collect();
        assert_eq!(result, expected);
    }

    #[test]
    fn test_diff_writes_added_coverage() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_map(&dir, "a.map", "00110000");
        let b = write_map(&dir, "b.map", "00010000");
        let out = dir.path().join("out.map");

        let args = MapOpArgs {
            table_size: 8,
            maps: vec![a, b],
            output: Some(out.clone()),
        };
        execute_map_op(&CliConfig::new(), MapOp::Diff, &args).unwrap();

        let result = read_bit_vector(8, &out).unwrap();
        let expected: Vec<bool> = "00100000".chars().map(|c| c == '1').collect();
        assert_eq!(result, expected);
    }

    #[test]
    fn test_short_input_map_fails() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_map(&dir, "a.map", "1111");
        let args = MapOpArgs {
            table_size: 64,
            maps: vec![a],
            output: None,
        };
        assert!(execute_map_op(&CliConfig::new(), MapOp::Intersect, &args).is_err());
    }

    #[test]
    fn test_op_labels() {
        assert_eq!(MapOp::Union.label(), "Union");
        assert_eq!(MapOp::Intersect.label(), "Intersection");
        assert_eq!(MapOp::Diff.label(), "Diff");
    }
}
