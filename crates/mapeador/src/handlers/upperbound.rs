//! Upperbound command handler

use crate::commands::UpperboundArgs;
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::Reporter;
use mapear::{read_bit_vector, write_bit_vector, LookupTable, MapStatPrinter, MatcherTree};
use std::path::Path;

/// Execute the upperbound command: assume the given predicates true,
/// compute the largest reachable fraction of the table, and optionally
/// persist the unreachable-byte map
pub fn execute_upperbound(config: &CliConfig, args: &UpperboundArgs) -> CliResult<()> {
    let verbosity = config.effective_level(args.output.is_some());
    let reporter = Reporter::new(config.color.should_color(), verbosity == 0);

    let mut table = LookupTable::from_file(&args.lookup, args.case_sensitive, verbosity)?;

    // Requested predicates, remembered for the post-resolve sanity pass
    let mut requested: Vec<(usize, &str)> = Vec::new();
    for predicate in &args.true_predicates {
        if predicate.is_empty() {
            continue;
        }
        if predicate.chars().all(|c| c.is_ascii_digit()) {
            let index: usize = predicate.parse().map_err(|_| {
                crate::error::CliError::invalid_argument(format!(
                    "predicate index {predicate} does not fit"
                ))
            })?;
            table.predicates.enable_index(index)?;
            requested.push((index, ""));
        } else {
            table.predicates.enable(predicate)?;
            if let Some(index) = table.predicates.named_index_of(predicate) {
                requested.push((index, predicate));
            }
        }
    }
    table.predicates.resolve();

    if verbosity > 0 {
        for (index, name) in &requested {
            if table.predicates.named_satisfied(*index) != Some(true) {
                let label = if name.is_empty() {
                    format!("{index}")
                } else {
                    format!("{index} ({name})")
                };
                reporter.error(&format!("Failed to satisfy named predicate {label}."));
            }
        }
    }

    if let Some(assignment) = &args.pat_predicates {
        let values = load_pattern_predicate_bits(&table, assignment)?;
        table.predicates.update_pattern_predicates(&values)?;
    }

    let tree = MatcherTree::new(&table);
    let upper_bound = tree.upper_bound();

    if verbosity > 0 || args.blame {
        let mut printer = MapStatPrinter::new();
        printer.summarize(
            "Upper bound",
            upper_bound.covered,
            upper_bound.shadow_map.len(),
            true,
        );
        printer.print();
    }

    if args.blame {
        println!();
        match args.limit {
            Some(limit) => println!("Loss from pattern predicate indices (top {limit}):"),
            None => println!("Loss from pattern predicate indices:"),
        }
        let mut printer = MapStatPrinter::new();
        if let Some(limit) = args.limit {
            printer.limit(limit);
        }
        let mut sum = 0;
        for (index, loss) in upper_bound.pattern_predicate_losses() {
            if printer.at_limit() {
                break;
            }
            sum += loss;
            printer.add_stat(index.to_string(), loss, table.matcher_table_size);
        }
        printer.summarize("Sum", sum, table.matcher_table_size, true);
        printer.print();
    }

    if let Some(output) = &args.output {
        write_bit_vector(&upper_bound.shadow_map, output)?;
    }
    Ok(())
}

/// An assignment is either an inline 0/1 string of exactly
/// pattern-predicate count characters, or a path to a packed bit vector
fn load_pattern_predicate_bits(
    table: &LookupTable,
    assignment: &str,
) -> CliResult<Vec<bool>> {
    let count = table.predicates.pattern_count();
    if assignment.len() == count && assignment.chars().all(|c| c == '0' || c == '1') {
        return Ok(assignment.chars().map(|c| c == '1').collect());
    }
    Ok(read_bit_vector(count, Path::new(assignment))?)
}
