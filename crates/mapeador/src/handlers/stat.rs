//! Stat command handler

use crate::commands::StatArgs;
use crate::config::CliConfig;
use crate::error::CliResult;
use mapear::MapStatPrinter;

/// Execute the stat command: one aligned coverage row per map file
pub fn execute_stat(_config: &CliConfig, args: &StatArgs) -> CliResult<()> {
    let mut printer = MapStatPrinter::new();
    for path in &args.maps {
        printer.add_file(path, args.table_size)?;
    }
    printer.sort(args.sort.into());
    printer.print();
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::commands::{SortArg, StatArgs};
    use mapear::write_bit_vector;

    #[test]
    fn test_stat_over_written_maps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cov.map");
        write_bit_vector(&[true, false, false, false, false, false, false, false], &path)
            .unwrap();
        let args = StatArgs {
            table_size: 8,
            maps: vec![path],
            sort: SortArg::Desc,
        };
        execute_stat(&CliConfig::new(), &args).unwrap();
    }

    #[test]
    fn test_stat_missing_map_fails() {
        let args = StatArgs {
            table_size: 8,
            maps: vec!["/nonexistent/cov.map".into()],
            sort: SortArg::None,
        };
        assert!(execute_stat(&CliConfig::new(), &args).is_err());
    }
}
