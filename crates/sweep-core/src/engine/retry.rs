use serde::Serialize;

use crate::engine::classifier::CrashReport;

/// Lifecycle states of one sweep point.
///
/// `Pending → Running → {Success, Retrying, Failed, Exhausted}`,
/// `Retrying → Running`, and after `Success` an independent animation phase
/// `AnimationRunning → {AnimationSuccess, AnimationFailed}` that never
/// reopens the static-run outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowState {
    Pending,
    Running,
    Retrying,
    Success,
    Failed,
    Exhausted,
    AnimationRunning,
    AnimationSuccess,
    AnimationFailed,
}

/// Terminal outcome recorded for a sweep point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RowOutcome {
    Success,
    Skipped,
    Failed,
    Exhausted,
}

/// What the state machine decided after one solver invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Clean run; proceed to the animation phase.
    Success,
    /// Timestep-related crash with budget left; rerun at the halved dt.
    Retry { dt: f64 },
    /// Crash unrelated to the timestep; no retry is attempted.
    Failed,
    /// Timestep-related crash with the reduction budget spent.
    Exhausted,
}

/// Per-row lifecycle tracker, held only for the duration of one row's
/// processing.
#[derive(Debug)]
pub struct SweepState {
    state: RowState,
    dt: f64,
    reductions: u32,
    max_reductions: u32,
}

impl SweepState {
    pub fn new(initial_dt: f64, max_reductions: u32) -> Self {
        Self {
            state: RowState::Pending,
            dt: initial_dt,
            reductions: 0,
            max_reductions,
        }
    }

    pub fn state(&self) -> RowState {
        self.state
    }

    /// Timestep the current (or next) attempt runs at.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn reductions(&self) -> u32 {
        self.reductions
    }

    /// Marks the start of a solver attempt.
    pub fn begin_attempt(&mut self) {
        debug_assert!(matches!(self.state, RowState::Pending | RowState::Retrying));
        self.state = RowState::Running;
    }

    /// Consumes one attempt's crash report and decides the next move.
    ///
    /// The reduction counter increases by exactly one per retry, so a row
    /// whose crashes are all timestep-related reaches a terminal state after
    /// at most `max_reductions + 1` invocations.
    pub fn assess(&mut self, report: Option<&CrashReport>) -> Verdict {
        debug_assert_eq!(self.state, RowState::Running);
        match report {
            None => {
                self.state = RowState::Success;
                Verdict::Success
            }
            Some(report) if report.is_timestep_related() => {
                if self.reductions < self.max_reductions {
                    self.dt /= 2.0;
                    self.reductions += 1;
                    self.state = RowState::Retrying;
                    Verdict::Retry { dt: self.dt }
                } else {
                    self.state = RowState::Exhausted;
                    Verdict::Exhausted
                }
            }
            Some(_) => {
                self.state = RowState::Failed;
                Verdict::Failed
            }
        }
    }

    /// Short-circuits the row to `Failed` without an invocation, e.g. when a
    /// required mesh asset is absent.
    pub fn fail(&mut self) {
        self.state = RowState::Failed;
    }

    /// Enters the animation phase; only legal after a static-run success.
    pub fn begin_animation(&mut self) {
        debug_assert_eq!(self.state, RowState::Success);
        self.state = RowState::AnimationRunning;
    }

    /// Records the animation phase's own classification result.
    pub fn finish_animation(&mut self, crashed: bool) {
        debug_assert_eq!(self.state, RowState::AnimationRunning);
        self.state = if crashed {
            RowState::AnimationFailed
        } else {
            RowState::AnimationSuccess
        };
    }

    /// Terminal outcome for the row; the animation phase never downgrades a
    /// static-run success.
    pub fn outcome(&self) -> RowOutcome {
        match self.state {
            RowState::Success
            | RowState::AnimationRunning
            | RowState::AnimationSuccess
            | RowState::AnimationFailed => RowOutcome::Success,
            RowState::Exhausted => RowOutcome::Exhausted,
            _ => RowOutcome::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::classifier::classify;

    fn timestep_report() -> CrashReport {
        classify("***** Viper terminating - try a smaller time step *****", "").unwrap()
    }

    fn divergence_report() -> CrashReport {
        classify("***** Proc 0: Divergence in pressure field. *****", "").unwrap()
    }

    #[test]
    fn a_clean_run_succeeds_on_the_first_attempt() {
        let mut state = SweepState::new(0.01, 4);
        state.begin_attempt();
        assert_eq!(state.assess(None), Verdict::Success);
        assert_eq!(state.state(), RowState::Success);
        assert_eq!(state.outcome(), RowOutcome::Success);
        assert_eq!(state.reductions(), 0);
    }

    #[test]
    fn timestep_crashes_halve_dt_and_count_one_reduction_each() {
        let mut state = SweepState::new(0.01, 2);
        let report = timestep_report();

        state.begin_attempt();
        assert_eq!(state.assess(Some(&report)), Verdict::Retry { dt: 0.005 });
        assert_eq!(state.reductions(), 1);

        state.begin_attempt();
        assert_eq!(state.assess(Some(&report)), Verdict::Retry { dt: 0.0025 });
        assert_eq!(state.reductions(), 2);
    }

    #[test]
    fn the_row_is_exhausted_once_the_reduction_budget_is_spent() {
        let mut state = SweepState::new(0.01, 2);
        let report = timestep_report();

        let mut invocations = 0;
        loop {
            state.begin_attempt();
            invocations += 1;
            match state.assess(Some(&report)) {
                Verdict::Retry { .. } => continue,
                verdict => {
                    assert_eq!(verdict, Verdict::Exhausted);
                    break;
                }
            }
        }
        // Terminal after at most max_reductions + 1 invocations.
        assert_eq!(invocations, 3);
        assert_eq!(state.state(), RowState::Exhausted);
        assert_eq!(state.outcome(), RowOutcome::Exhausted);
    }

    #[test]
    fn a_non_timestep_crash_fails_immediately_without_retry() {
        let mut state = SweepState::new(0.01, 4);
        state.begin_attempt();
        assert_eq!(state.assess(Some(&divergence_report())), Verdict::Failed);
        assert_eq!(state.state(), RowState::Failed);
        assert_eq!(state.reductions(), 0);
        assert_eq!(state.dt(), 0.01);
    }

    #[test]
    fn animation_failure_never_reopens_the_static_outcome() {
        let mut state = SweepState::new(0.01, 4);
        state.begin_attempt();
        state.assess(None);
        state.begin_animation();
        state.finish_animation(true);

        assert_eq!(state.state(), RowState::AnimationFailed);
        assert_eq!(state.outcome(), RowOutcome::Success);
    }

    #[test]
    fn a_zero_budget_row_exhausts_on_its_first_timestep_crash() {
        let mut state = SweepState::new(0.01, 0);
        state.begin_attempt();
        assert_eq!(state.assess(Some(&timestep_report())), Verdict::Exhausted);
    }
}
