use crate::core::models::row::{ParameterRow, Termination};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Columns every sweep table must carry, addressed by name rather than
/// position. Termination columns are validated separately because the two
/// modes are mutually exclusive.
const REQUIRED_COLUMNS: [&str; 9] = [
    "Index",
    "Reynolds number",
    "mesh_file",
    "Polynomial order",
    "Control amplitude",
    "Control frequency",
    "Control up-down balance",
    "Time step",
    "Animation loops",
];

#[derive(Debug, Error)]
pub enum TableError {
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },

    #[error("Missing required column: '{0}'")]
    MissingColumn(&'static str),

    #[error("Parameter table needs an 'End time' or a 'Convergence criteria' column")]
    MissingTermination,

    #[error("Sweep point {row}: invalid value '{value}' for column '{column}'")]
    Value {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("Sweep point {row}: exactly one of 'End time' and 'Convergence criteria' must be set")]
    Termination { row: usize },
}

/// Loads the sweep definition into table order.
///
/// The first data record is a human-readable description and is skipped; every
/// following record becomes one [`ParameterRow`], index-stamped in table order.
/// A missing required column fails the whole load — no partial sweep is
/// attempted without a complete parameter definition.
pub fn load(path: &Path) -> Result<Vec<ParameterRow>, TableError> {
    debug!("Loading parameter table from {:?}", path);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| TableError::Csv {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;

    let headers = reader
        .headers()
        .map_err(|e| TableError::Csv {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?
        .clone();
    let columns: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(position, name)| (name.trim(), position))
        .collect();

    for name in REQUIRED_COLUMNS {
        if !columns.contains_key(name) {
            return Err(TableError::MissingColumn(name));
        }
    }
    if !columns.contains_key("End time") && !columns.contains_key("Convergence criteria") {
        return Err(TableError::MissingTermination);
    }

    let mut rows = Vec::new();
    for (position, result) in reader.records().enumerate() {
        let record = result.map_err(|e| TableError::Csv {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        if position == 0 {
            continue;
        }
        let index = position - 1;

        let cell = |name: &str| {
            columns
                .get(name)
                .and_then(|&i| record.get(i))
                .unwrap_or("")
                .trim()
                .to_string()
        };

        let dt_text = cell("Time step");
        let dt: f64 = dt_text.parse().map_err(|_| TableError::Value {
            row: index + 1,
            column: "Time step",
            value: dt_text.clone(),
        })?;

        let end_time = cell("End time");
        let criterion = cell("Convergence criteria");
        let termination = match (end_time.is_empty(), criterion.is_empty()) {
            (false, true) => Termination::EndTime(end_time.parse().map_err(|_| {
                TableError::Value {
                    row: index + 1,
                    column: "End time",
                    value: end_time.clone(),
                }
            })?),
            (true, false) => Termination::Convergence(criterion),
            _ => return Err(TableError::Termination { row: index + 1 }),
        };

        let verbose = cell("Verbose");
        rows.push(ParameterRow {
            index,
            label: cell("Index"),
            reynolds: cell("Reynolds number"),
            mesh: cell("mesh_file"),
            order: cell("Polynomial order"),
            amplitude: cell("Control amplitude"),
            frequency: cell("Control frequency"),
            balance: cell("Control up-down balance"),
            dt,
            termination,
            animation_loops: cell("Animation loops"),
            override_existing: cell("Override").eq_ignore_ascii_case("y"),
            verbose: verbose.is_empty() || verbose.eq_ignore_ascii_case("y"),
        });
    }

    debug!("Loaded {} sweep point(s) from {:?}", rows.len(), path);
    Ok(rows)
}
