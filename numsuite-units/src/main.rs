//! Main binary for generating and checking fixtures

use clap::Parser;
use std::process;

use numsuite_harness::{Cli, Command, Harness};

fn main() {
    let cli = Cli::parse();

    let registry = numsuite_units::registry();
    for defect in registry.defects() {
        eprintln!("warning: {defect}");
    }

    let harness = match Harness::new(registry, &cli.fixture_dir, cli.seed) {
        Ok(harness) => harness.quiet(cli.quiet),
        Err(e) => {
            eprintln!("Failed to create harness: {}", e);
            process::exit(2);
        }
    };

    match cli.command {
        Command::Generate { units } => match harness.generate(units.as_deref()) {
            Ok(summary) => {
                if !cli.quiet {
                    summary.print();
                }
                if !summary.all_ok() {
                    process::exit(1);
                }
            }
            Err(e) => {
                eprintln!("Fixture generation failed: {}", e);
                process::exit(2);
            }
        },
        Command::Test { units, report } => match harness.test(units.as_deref()) {
            Ok(run) => {
                if !cli.quiet {
                    run.print_summary();
                }
                if cli.verbose {
                    run.print_detailed();
                }
                if let Some(path) = report {
                    if let Err(e) = run.save_to_file(&path) {
                        eprintln!("Failed to save report: {}", e);
                        process::exit(2);
                    }
                }
                if !run.statistics.all_ok() {
                    process::exit(1);
                }
            }
            Err(e) => {
                eprintln!("Test execution failed: {}", e);
                process::exit(2);
            }
        },
    }
}
