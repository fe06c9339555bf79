use crate::cli::CheckArgs;
use crate::config::PartialSweepConfig;
use crate::error::Result;
use tracing::info;
use vipersweep::core::io::table;
use vipersweep::engine::error::SweepError;
use vipersweep::workflows;

/// Validates the pre-flight file set and the parameter table, touching
/// nothing and invoking no solver.
pub fn run(args: CheckArgs) -> Result<()> {
    let partial = match &args.overrides.config {
        Some(path) => PartialSweepConfig::from_file(path)?,
        None => PartialSweepConfig::default(),
    };
    let config = partial.merge_with_cli(&args.overrides)?;

    info!("Checking pre-flight files...");
    workflows::sweep::preflight(&config)?;

    let rows = table::load(&config.parameter_table).map_err(SweepError::from)?;

    println!(
        "✓ All pre-flight files present; parameter table defines {} sweep point(s).",
        rows.len()
    );
    Ok(())
}
