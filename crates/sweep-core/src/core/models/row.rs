/// How a solver run is told to stop.
///
/// A sweep point specifies exactly one of the two modes; the table loader
/// rejects rows that carry both or neither.
#[derive(Debug, Clone, PartialEq)]
pub enum Termination {
    /// Run until the given physical end time is reached; the loop count is
    /// derived from it and the current timestep.
    EndTime(f64),
    /// Run until the solver's own convergence criterion (carried verbatim
    /// into the run macro) is satisfied.
    Convergence(String),
}

/// One sweep point, read once from the parameter table and never mutated.
///
/// `index` is the 0-based position in table order; it is reused for
/// deterministic workspace naming and for resuming partially-completed
/// sweeps. `label` is the table's own `Index` column value and only feeds
/// the rendered macro file names.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRow {
    pub index: usize,
    pub label: String,
    pub reynolds: String,
    pub mesh: String,
    pub order: String,
    pub amplitude: String,
    pub frequency: String,
    pub balance: String,
    /// Initial timestep; retries work on a halved copy, never on this field.
    pub dt: f64,
    pub termination: Termination,
    pub animation_loops: String,
    pub override_existing: bool,
    pub verbose: bool,
}

impl ParameterRow {
    /// File name of the rendered static-run macro inside a workspace.
    pub fn run_macro_name(&self) -> String {
        format!("macro{}.txt", self.label)
    }

    /// File name of the rendered animation macro inside a workspace.
    pub fn animation_macro_name(&self) -> String {
        format!("macro_animation{}.txt", self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> ParameterRow {
        ParameterRow {
            index: 0,
            label: "3".to_string(),
            reynolds: "200".to_string(),
            mesh: "fine".to_string(),
            order: "7".to_string(),
            amplitude: "0.1".to_string(),
            frequency: "0.5".to_string(),
            balance: "1".to_string(),
            dt: 0.01,
            termination: Termination::EndTime(5.0),
            animation_loops: "100".to_string(),
            override_existing: false,
            verbose: true,
        }
    }

    #[test]
    fn macro_names_embed_the_table_label() {
        let row = sample_row();
        assert_eq!(row.run_macro_name(), "macro3.txt");
        assert_eq!(row.animation_macro_name(), "macro_animation3.txt");
    }
}
