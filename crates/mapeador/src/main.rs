//! Mapeador entry point

use clap::Parser;
use mapeador::handlers::{
    execute_analyze, execute_map_op, execute_stat, execute_upperbound, MapOp,
};
use mapeador::{Cli, CliConfig, CliResult, ColorChoice, Commands, Verbosity};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);

    match cli.command {
        Commands::Analyze(args) => execute_analyze(&config, &args),
        Commands::Upperbound(args) => execute_upperbound(&config, &args),
        Commands::Union(args) => execute_map_op(&config, MapOp::Union, &args),
        Commands::Intersect(args) => execute_map_op(&config, MapOp::Intersect, &args),
        Commands::Diff(args) => execute_map_op(&config, MapOp::Diff, &args),
        Commands::Stat(args) => execute_stat(&config, &args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else {
        match cli.verbose {
            0 => Verbosity::Normal,
            1 => Verbosity::Verbose,
            _ => Verbosity::Debug,
        }
    };
    let color: ColorChoice = cli.color.into();

    CliConfig::new().with_verbosity(verbosity).with_color(color)
}
