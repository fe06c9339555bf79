use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use crate::core::io::{table, template};
use crate::core::models::row::ParameterRow;
use crate::engine::classifier::{self, CrashCategory, CrashReport};
use crate::engine::config::SweepConfig;
use crate::engine::error::SweepError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::retry::{RowOutcome, SweepState, Verdict};
use crate::engine::runner::SolverInvoker;
use crate::engine::workspace::{Disposition, WorkspaceManager};

/// Name the solver expects its rendered configuration under, inside the
/// workspace it runs in.
const SOLVER_CONFIG_FILE: &str = "viper.cfg";

/// Classified crash output persisted inside a failing workspace.
pub const CRASH_SUMMARY_FILE: &str = "crash_summary.txt";

/// One solver invocation within a row's processing.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptRecord {
    pub dt: f64,
    pub workspace: PathBuf,
    pub exit_code: i32,
    pub crash_categories: Vec<CrashCategory>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnimationOutcome {
    NotRun,
    Success,
    Failed,
}

/// Everything recorded about one sweep point.
#[derive(Debug, Clone, Serialize)]
pub struct RowRecord {
    pub index: usize,
    pub label: String,
    pub outcome: RowOutcome,
    pub final_dt: f64,
    pub reductions: u32,
    pub attempts: Vec<AttemptRecord>,
    pub animation: AnimationOutcome,
    /// Row-scoped error that stopped processing, if any.
    pub failure: Option<String>,
}

/// Structured result of a whole sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub rows: Vec<RowRecord>,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub exhausted: usize,
}

impl SweepReport {
    fn from_rows(rows: Vec<RowRecord>) -> Self {
        let count = |outcome: RowOutcome| rows.iter().filter(|r| r.outcome == outcome).count();
        let (succeeded, skipped, failed, exhausted) = (
            count(RowOutcome::Success),
            count(RowOutcome::Skipped),
            count(RowOutcome::Failed),
            count(RowOutcome::Exhausted),
        );
        Self {
            rows,
            succeeded,
            skipped,
            failed,
            exhausted,
        }
    }
}

/// Verifies every pre-flight file exists.
///
/// A missing one aborts the whole sweep before any row is processed.
pub fn preflight(config: &SweepConfig) -> Result<(), SweepError> {
    for path in config.required_files() {
        if !path.is_file() {
            return Err(SweepError::MissingPrerequisite {
                path: path.to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Executes the full parameter sweep.
///
/// Rows are processed strictly sequentially, blocking on each solver
/// invocation; only pre-flight configuration problems abort the sweep, every
/// other failure is row-scoped and processing advances to the next row.
#[instrument(skip_all, name = "sweep_workflow")]
pub fn run(
    config: &SweepConfig,
    invoker: &dyn SolverInvoker,
    reporter: &ProgressReporter,
) -> Result<SweepReport, SweepError> {
    info!("Checking pre-flight files and loading the parameter table.");
    preflight(config)?;
    let rows = table::load(&config.parameter_table)?;

    reporter.report(Progress::SweepStart {
        total_rows: rows.len() as u64,
    });

    let manager = WorkspaceManager::new(config);
    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        info!("Processing sweep point {}", row.index + 1);
        let record = process_row(config, &manager, row, invoker, reporter);
        reporter.report(Progress::RowFinish {
            outcome: record.outcome,
        });
        records.push(record);
    }
    reporter.report(Progress::SweepFinish);

    let report = SweepReport::from_rows(records);
    info!(
        "Sweep complete: {} succeeded, {} skipped, {} failed, {} exhausted.",
        report.succeeded, report.skipped, report.failed, report.exhausted
    );
    Ok(report)
}

/// Drives one row through the retry state machine to a terminal outcome.
fn process_row(
    config: &SweepConfig,
    manager: &WorkspaceManager,
    row: &ParameterRow,
    invoker: &dyn SolverInvoker,
    reporter: &ProgressReporter,
) -> RowRecord {
    let mut state = SweepState::new(row.dt, config.max_dt_reductions);
    let mut attempts = Vec::new();
    let mut animation = AnimationOutcome::NotRun;
    let mut failure = None;
    let mut skipped = false;

    reporter.report(Progress::RowStart {
        index: row.index,
        directory: WorkspaceManager::run_directory_name(row, state.dt()),
    });

    loop {
        let dt = state.dt();
        let workspace = match manager.create_run_directory(row, dt) {
            Ok(Disposition::Created(path)) => path,
            Ok(Disposition::Skipped(path)) => {
                info!(
                    "Skipping sweep point {} - directory {:?} already exists.",
                    row.index + 1,
                    path
                );
                skipped = true;
                break;
            }
            Err(e) => {
                warn!("Sweep point {}: {}", row.index + 1, e);
                failure = Some(e.to_string());
                state.fail();
                break;
            }
        };

        state.begin_attempt();
        if let Err(e) = render_inputs(config, row, dt, &workspace) {
            warn!("Sweep point {}: {}", row.index + 1, e);
            failure = Some(e.to_string());
            state.fail();
            break;
        }
        if let Err(e) = manager.stage_mesh(row, &workspace) {
            warn!(
                "Sweep point {}: {}. Skipping this simulation.",
                row.index + 1,
                e
            );
            failure = Some(e.to_string());
            state.fail();
            break;
        }

        reporter.report(Progress::AttemptStart { dt });
        info!(
            "Running static simulation for sweep point {} with {}",
            row.index + 1,
            row.run_macro_name()
        );
        let output = match invoker.invoke(&workspace, &row.run_macro_name()) {
            Ok(output) => output,
            Err(e) => {
                warn!("Sweep point {}: {}", row.index + 1, e);
                failure = Some(e.to_string());
                state.fail();
                break;
            }
        };

        let report = classifier::classify(&output.stdout, &output.stderr);
        if let Some(report) = &report {
            persist_crash_summary(&workspace, report);
        }
        attempts.push(AttemptRecord {
            dt,
            workspace: workspace.clone(),
            exit_code: output.exit_code,
            crash_categories: report.as_ref().map(CrashReport::categories).unwrap_or_default(),
        });

        match state.assess(report.as_ref()) {
            Verdict::Success => {
                animation = run_animation(row, &workspace, invoker, &mut state);
                break;
            }
            Verdict::Retry { dt } => {
                info!("Reducing time step to {} and retrying.", dt);
                reporter.report(Progress::Message(format!(
                    "Reducing time step to {} and retrying.",
                    dt
                )));
                continue;
            }
            Verdict::Exhausted => {
                warn!(
                    "Maximum number of time step reductions reached. Moving to next parameter set."
                );
                break;
            }
            Verdict::Failed => {
                warn!(
                    "Simulation crashed. See {} in the output directory for details.",
                    CRASH_SUMMARY_FILE
                );
                break;
            }
        }
    }

    RowRecord {
        index: row.index,
        label: row.label.clone(),
        outcome: if skipped {
            RowOutcome::Skipped
        } else {
            state.outcome()
        },
        final_dt: state.dt(),
        reductions: state.reductions(),
        attempts,
        animation,
        failure,
    }
}

/// Renders the three workspace inputs for one attempt.
fn render_inputs(
    config: &SweepConfig,
    row: &ParameterRow,
    dt: f64,
    workspace: &Path,
) -> Result<(), SweepError> {
    template::render(
        &config.templates.configuration,
        &workspace.join(SOLVER_CONFIG_FILE),
        &template::config_tokens(row),
    )?;
    template::render(
        &config.templates.run_macro,
        &workspace.join(row.run_macro_name()),
        &template::run_macro_tokens(row, dt),
    )?;
    template::render(
        &config.templates.animation_macro,
        &workspace.join(row.animation_macro_name()),
        &template::animation_tokens(row, dt),
    )?;
    Ok(())
}

/// Runs the animation phase after a static-run success.
///
/// Its result is logged and recorded but never alters the row's outcome.
fn run_animation(
    row: &ParameterRow,
    workspace: &Path,
    invoker: &dyn SolverInvoker,
    state: &mut SweepState,
) -> AnimationOutcome {
    state.begin_animation();
    info!(
        "Running animation simulation for sweep point {} with {}",
        row.index + 1,
        row.animation_macro_name()
    );

    match invoker.invoke(workspace, &row.animation_macro_name()) {
        Ok(output) => match classifier::classify(&output.stdout, &output.stderr) {
            Some(report) => {
                persist_crash_summary(workspace, &report);
                warn!(
                    "Animation crashed. See {} in the output directory for details.",
                    CRASH_SUMMARY_FILE
                );
                state.finish_animation(true);
                AnimationOutcome::Failed
            }
            None => {
                state.finish_animation(false);
                AnimationOutcome::Success
            }
        },
        Err(e) => {
            warn!("Sweep point {}: animation: {}", row.index + 1, e);
            state.finish_animation(true);
            AnimationOutcome::Failed
        }
    }
}

fn persist_crash_summary(workspace: &Path, report: &CrashReport) {
    let path = workspace.join(CRASH_SUMMARY_FILE);
    if let Err(e) = fs::write(&path, report.summary()) {
        warn!("Failed to write {:?}: {}", path, e);
    }
}
