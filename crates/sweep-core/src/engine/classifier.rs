use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt::Write as _;

/// Closed set of solver failure modes recognized in free-text output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrashCategory {
    NumericOverflow,
    FieldDivergence,
    TimestepTooLarge,
    SolverTerminated,
}

impl CrashCategory {
    pub fn label(&self) -> &'static str {
        match self {
            CrashCategory::NumericOverflow => "numeric-overflow",
            CrashCategory::FieldDivergence => "field-divergence",
            CrashCategory::TimestepTooLarge => "timestep-too-large",
            CrashCategory::SolverTerminated => "solver-terminated",
        }
    }
}

/// One output line matched by a signature, trimmed of surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrashLine {
    pub category: CrashCategory,
    pub text: String,
}

/// Every matching line found in a run's output, in encounter order.
///
/// Classification does not stop at the first match: multiple signatures can
/// co-occur and retry policy needs the complete picture.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CrashReport {
    pub lines: Vec<CrashLine>,
}

impl CrashReport {
    /// Whether any matched line indicates the timestep was too large; the
    /// only crash mode worth an adaptive retry.
    pub fn is_timestep_related(&self) -> bool {
        self.lines
            .iter()
            .any(|line| line.category == CrashCategory::TimestepTooLarge)
    }

    pub fn categories(&self) -> Vec<CrashCategory> {
        self.lines.iter().map(|line| line.category).collect()
    }

    /// Human-readable form persisted as `crash_summary.txt` in the workspace.
    pub fn summary(&self) -> String {
        let mut text = String::new();
        for line in &self.lines {
            let _ = writeln!(text, "[{}] {}", line.category.label(), line.text);
        }
        text
    }
}

/// Ordered signature table; the first matching pattern tags a line's
/// category. The timestep signature precedes the generic termination one so
/// a terminating line carrying the advice gets the specific tag.
static SIGNATURES: Lazy<Vec<(CrashCategory, Regex)>> = Lazy::new(|| {
    vec![
        (
            CrashCategory::NumericOverflow,
            Regex::new(r"Huge value .* at index \d+ of \d+").expect("valid overflow signature"),
        ),
        (
            CrashCategory::FieldDivergence,
            Regex::new(r"\*{5} Proc \d+: Divergence in .+ field\. \*{5}")
                .expect("valid divergence signature"),
        ),
        (
            CrashCategory::TimestepTooLarge,
            Regex::new(r"(?i)try a smaller time step").expect("valid timestep signature"),
        ),
        (
            CrashCategory::SolverTerminated,
            Regex::new(r"\*{5} Viper terminating .* \*{5}").expect("valid termination signature"),
        ),
    ]
});

/// Scans both output streams for crash signatures.
///
/// Returns `None` for a clean run; otherwise a report holding every matching
/// line (stdout first, then stderr) in encounter order.
pub fn classify(stdout: &str, stderr: &str) -> Option<CrashReport> {
    let mut report = CrashReport::default();

    for line in stdout.lines().chain(stderr.lines()) {
        for (category, pattern) in SIGNATURES.iter() {
            if pattern.is_match(line) {
                report.lines.push(CrashLine {
                    category: *category,
                    text: line.trim().to_string(),
                });
                break;
            }
        }
    }

    if report.lines.is_empty() {
        None
    } else {
        Some(report)
    }
}
