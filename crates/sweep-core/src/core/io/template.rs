use crate::core::models::row::{ParameterRow, Termination};
use regex::Regex;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Loop count handed to the solver when a run terminates by convergence
/// rather than by iteration count.
pub const CONVERGENCE_LOOP_SENTINEL: u64 = 1_000_000;

/// Step-reporting granularity in verbose mode.
const VERBOSE_STEP_COUNT: &str = "10";
/// Step-reporting granularity otherwise.
const QUIET_STEP_COUNT: &str = "500";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// An ordered set of template tokens and their replacement values.
///
/// Tokens substitute as delimited placeholders: an occurrence is replaced
/// only when it is not embedded in a longer identifier, so `DT` never
/// rewrites the `DT` inside `SET_DT`.
#[derive(Debug, Default)]
pub struct TokenMap {
    entries: Vec<(Regex, String)>,
}

impl TokenMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `token` to substitute with the string form of `value`.
    pub fn set(&mut self, token: &str, value: impl Display) {
        let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(token)))
            .expect("token names are plain identifiers");
        self.entries.push((pattern, value.to_string()));
    }

    /// Applies every registered token to a single line.
    pub fn apply(&self, line: &str) -> String {
        let mut rendered = line.to_string();
        for (pattern, value) in &self.entries {
            rendered = pattern
                .replace_all(&rendered, regex::NoExpand(value))
                .into_owned();
        }
        rendered
    }
}

/// Renders `template` into `output`, substituting tokens line by line.
///
/// The template itself is never mutated; unmatched tokens are left untouched.
pub fn render(template: &Path, output: &Path, tokens: &TokenMap) -> Result<(), RenderError> {
    debug!("Rendering template {:?} -> {:?}", template, output);

    let io_err = |path: &Path, source: std::io::Error| RenderError::Io {
        path: path.to_string_lossy().to_string(),
        source,
    };

    let reader = BufReader::new(File::open(template).map_err(|e| io_err(template, e))?);
    let mut writer = BufWriter::new(File::create(output).map_err(|e| io_err(output, e))?);

    for line in reader.lines() {
        let line = line.map_err(|e| io_err(template, e))?;
        writeln!(writer, "{}", tokens.apply(&line)).map_err(|e| io_err(output, e))?;
    }
    writer.flush().map_err(|e| io_err(output, e))
}

/// Number of solver loops needed to reach `end_time` at timestep `dt`.
pub fn calculate_loops(dt: f64, end_time: f64) -> u64 {
    (end_time / (dt * 10.0)).ceil() as u64
}

/// Tokens for the solver configuration template.
pub fn config_tokens(row: &ParameterRow) -> TokenMap {
    let mut tokens = TokenMap::new();
    tokens.set("REYNOLDS", &row.reynolds);
    tokens.set("MESH", &row.mesh);
    tokens.set("ORDER", &row.order);
    tokens.set("AMP", &row.amplitude);
    tokens.set("FREQ", &row.frequency);
    tokens.set("BAL", &row.balance);
    tokens
}

/// Tokens for the static-run macro template at the current timestep.
///
/// In end-time mode the loop count is derived from the timestep and the
/// convergence token is disabled; in convergence mode the loop count is an
/// arbitrarily large sentinel and the run is expected to terminate by
/// convergence instead.
pub fn run_macro_tokens(row: &ParameterRow, dt: f64) -> TokenMap {
    let mut tokens = TokenMap::new();
    tokens.set("DT", dt);
    tokens.set(
        "STEP_COUNT",
        if row.verbose {
            VERBOSE_STEP_COUNT
        } else {
            QUIET_STEP_COUNT
        },
    );
    match &row.termination {
        Termination::EndTime(end_time) => {
            tokens.set("CRIT", "0");
            tokens.set("LOOP_COUNT", calculate_loops(dt, *end_time));
        }
        Termination::Convergence(criterion) => {
            tokens.set("CRIT", criterion);
            tokens.set("LOOP_COUNT", CONVERGENCE_LOOP_SENTINEL);
        }
    }
    tokens
}

/// Tokens for the animation macro template at the final timestep.
pub fn animation_tokens(row: &ParameterRow, dt: f64) -> TokenMap {
    let mut tokens = TokenMap::new();
    tokens.set("DT", dt);
    tokens.set("LOOPS", &row.animation_loops);
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn sample_row(termination: Termination, verbose: bool) -> ParameterRow {
        ParameterRow {
            index: 0,
            label: "1".to_string(),
            reynolds: "200".to_string(),
            mesh: "fine".to_string(),
            order: "7".to_string(),
            amplitude: "0.1".to_string(),
            frequency: "0.5".to_string(),
            balance: "1".to_string(),
            dt: 0.01,
            termination,
            animation_loops: "100".to_string(),
            override_existing: false,
            verbose,
        }
    }

    #[test]
    fn a_bare_token_substitutes_its_value() {
        let mut tokens = TokenMap::new();
        tokens.set("DT", 0.005);
        assert_eq!(tokens.apply("SET_DT DT"), "SET_DT 0.005");
    }

    #[test]
    fn a_token_embedded_in_a_longer_identifier_is_left_untouched() {
        let mut tokens = TokenMap::new();
        tokens.set("DT", 0.005);
        tokens.set("COUNT", 42);
        assert_eq!(tokens.apply("SET_DT LOOP_COUNT"), "SET_DT LOOP_COUNT");
    }

    #[test]
    fn unmatched_lines_pass_through_unchanged() {
        let mut tokens = TokenMap::new();
        tokens.set("REYNOLDS", "200");
        assert_eq!(tokens.apply("solver = spectral"), "solver = spectral");
    }

    #[test]
    fn calculate_loops_rounds_up_to_reach_the_end_time() {
        assert_eq!(calculate_loops(0.01, 5.0), 50);
        assert_eq!(calculate_loops(0.3, 1.0), 1);
        assert_eq!(calculate_loops(0.03, 1.0), 4);
    }

    #[test]
    fn end_time_mode_disables_the_convergence_token() {
        let row = sample_row(Termination::EndTime(5.0), true);
        let tokens = run_macro_tokens(&row, 0.01);
        assert_eq!(tokens.apply("CRIT"), "0");
        assert_eq!(tokens.apply("LOOP_COUNT"), "50");
        assert_eq!(tokens.apply("STEP_COUNT"), "10");
    }

    #[test]
    fn convergence_mode_uses_the_loop_sentinel() {
        let row = sample_row(Termination::Convergence("1e-8".to_string()), false);
        let tokens = run_macro_tokens(&row, 0.01);
        assert_eq!(tokens.apply("CRIT"), "1e-8");
        assert_eq!(tokens.apply("LOOP_COUNT"), "1000000");
        assert_eq!(tokens.apply("STEP_COUNT"), "500");
    }

    #[test]
    fn render_substitutes_per_line_and_preserves_the_template() {
        let dir = tempdir().unwrap();
        let template = dir.path().join("macro.txt");
        let output = dir.path().join("macro1.txt");
        fs::write(&template, "SET_DT DT\nRUN LOOP_COUNT\nplain line\n").unwrap();

        let row = sample_row(Termination::EndTime(5.0), true);
        render(&template, &output, &run_macro_tokens(&row, 0.01)).unwrap();

        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "SET_DT 0.01\nRUN 50\nplain line\n"
        );
        // The template is a read-only input.
        assert_eq!(
            fs::read_to_string(&template).unwrap(),
            "SET_DT DT\nRUN LOOP_COUNT\nplain line\n"
        );
    }

    #[test]
    fn animation_tokens_carry_dt_and_loop_count() {
        let row = sample_row(Termination::EndTime(5.0), true);
        let tokens = animation_tokens(&row, 0.0025);
        assert_eq!(tokens.apply("STEP DT LOOPS"), "STEP 0.0025 100");
    }
}
