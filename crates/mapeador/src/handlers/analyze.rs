//! Analyze command handler

use crate::commands::AnalyzeArgs;
use crate::config::CliConfig;
use crate::error::CliResult;
use mapear::{read_bit_vector, LookupTable, MapAnalysis, MapStatPrinter, MatcherTree};

/// Execute the analyze command: load the lookup table and an observed
/// shadow map, then print where the uncovered bytes came from
pub fn execute_analyze(config: &CliConfig, args: &AnalyzeArgs) -> CliResult<()> {
    let verbosity = config.verbosity.level();
    let table = LookupTable::from_file(&args.lookup, false, verbosity)?;
    let map = read_bit_vector(table.matcher_table_size, &args.map)?;
    let tree = MatcherTree::new(&table);
    let analysis = tree.analyze(&map);

    let mut printer = MapStatPrinter::new();
    printer.add_file_map(&args.map, &map);
    printer.print();
    println!();

    println!("Top coverage loss cause by matcher kind:");
    let mut sum = 0;
    if let Some(limit) = args.limit {
        printer.limit(limit);
    }
    for (kind, loss) in analysis.blame_matcher_kinds() {
        if printer.at_limit() {
            break;
        }
        printer.add_stat(kind.to_string(), loss, table.matcher_table_size);
        sum += loss;
    }
    printer.summarize("Sum", sum, table.matcher_table_size, true);
    printer.print();
    println!();

    println!("Loss from pattern predicate indices:");
    let mut sum = 0;
    if let Some(limit) = args.limit {
        printer.limit(limit);
    }
    for (index, loss) in analysis.blame_pattern_predicates() {
        if printer.at_limit() {
            break;
        }
        printer.add_stat(index.to_string(), loss, table.matcher_table_size);
        sum += loss;
    }
    printer.summarize("Sum", sum, table.matcher_table_size, true);
    printer.print();
    println!();

    println!("Loss by check depth:");
    for (depth, loss) in analysis.blame_depths(None) {
        printer.add_stat(depth.to_string(), loss, table.matcher_table_size);
    }
    printer.print();

    if args.patterns {
        println!();
        print_pattern_blame(&analysis, args);
    }

    if args.possible {
        println!();
        let possible = analysis.blame_possible_patterns();
        println!("Patterns reachable by input variation ({}):", possible.len());
        for source in possible {
            println!("  {source}");
        }
    }
    Ok(())
}

fn print_pattern_blame(analysis: &MapAnalysis<'_>, args: &AnalyzeArgs) {
    println!("Loss by pattern:");
    let entries = analysis.blame_patterns(args.per_pattern_loss);
    let shown = args.limit.unwrap_or(entries.len());
    for entry in entries.iter().take(shown) {
        println!(
            "{:>8}  matcher {:>6}  depth {:>3}  {:<22}  {}",
            entry.loss,
            entry.matcher,
            entry.depth,
            entry.kind.to_string(),
            entry.source
        );
    }
    if entries.len() > shown {
        println!("  ... {} more", entries.len() - shown);
    }
}
