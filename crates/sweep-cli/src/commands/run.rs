use crate::cli::RunArgs;
use crate::config::PartialSweepConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use std::path::Path;
use tracing::info;
use vipersweep::engine::progress::ProgressReporter;
use vipersweep::engine::retry::RowOutcome;
use vipersweep::engine::runner::ProcessInvoker;
use vipersweep::workflows;
use vipersweep::workflows::sweep::SweepReport;

/// Configuration file picked up implicitly when present next to the sweep.
const DEFAULT_CONFIG_FILE: &str = "sweep.toml";

pub fn run(args: RunArgs) -> Result<()> {
    let partial = match &args.overrides.config {
        Some(path) => PartialSweepConfig::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            PartialSweepConfig::from_file(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => PartialSweepConfig::default(),
    };
    let config = partial.merge_with_cli(&args.overrides)?;

    let invoker = ProcessInvoker::new(config.solver.executable.clone());
    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting parameter sweep...");
    info!("Invoking the core sweep workflow...");
    let report = workflows::sweep::run(&config, &invoker, &reporter)?;

    print_summary(&report);

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&report).map_err(|e| CliError::Other(e.into()))?;
        std::fs::write(path, json)?;
        info!("Sweep report written to {:?}", path);
        println!("Sweep report written to: {}", path.display());
    }

    Ok(())
}

fn print_summary(report: &SweepReport) {
    println!(
        "All simulations completed: {} succeeded, {} skipped, {} failed, {} exhausted.",
        report.succeeded, report.skipped, report.failed, report.exhausted
    );

    for row in &report.rows {
        if row.outcome == RowOutcome::Success || row.outcome == RowOutcome::Skipped {
            continue;
        }
        match &row.failure {
            Some(reason) => println!(
                "  ✗ Sweep point {} ({:?}): {}",
                row.index + 1,
                row.outcome,
                reason
            ),
            None => println!(
                "  ✗ Sweep point {} ({:?}) after {} attempt(s), final dt {}",
                row.index + 1,
                row.outcome,
                row.attempts.len(),
                row.final_dt
            ),
        }
    }
}
