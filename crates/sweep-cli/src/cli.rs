use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "vsweep - a batch driver for parameter sweeps of the Viper spectral-element flow solver.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute the parameter sweep defined by the parameter table.
    Run(RunArgs),
    /// Validate the pre-flight file set and the parameter table without
    /// invoking the solver.
    Check(CheckArgs),
}

/// Overrides shared by every subcommand; values given here win over the
/// configuration file.
#[derive(Args, Debug, Default)]
pub struct ConfigOverrides {
    /// Path to the sweep configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the parameter table path.
    #[arg(short, long, value_name = "PATH")]
    pub parameters: Option<PathBuf>,

    /// Override the solver executable path.
    #[arg(short, long, value_name = "PATH")]
    pub solver: Option<PathBuf>,

    /// Override the base directory run workspaces are created under.
    #[arg(short, long, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Override the maximum number of timestep reductions per sweep point.
    #[arg(long, value_name = "INT")]
    pub max_dt_reductions: Option<u32>,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub overrides: ConfigOverrides,

    /// Write a JSON sweep report to the given path after the run.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,
}

/// Arguments for the `check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_arguments_parse_with_overrides() {
        let cli = Cli::parse_from([
            "vsweep",
            "run",
            "-p",
            "other.csv",
            "--max-dt-reductions",
            "2",
            "--report",
            "sweep_report.json",
        ]);
        let Commands::Run(args) = cli.command else {
            panic!("expected the 'run' subcommand");
        };
        assert_eq!(args.overrides.parameters, Some(PathBuf::from("other.csv")));
        assert_eq!(args.overrides.max_dt_reductions, Some(2));
        assert_eq!(args.report, Some(PathBuf::from("sweep_report.json")));
    }

    #[test]
    fn verbosity_flags_accumulate_globally() {
        let cli = Cli::parse_from(["vsweep", "check", "-vv"]);
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
    }
}
