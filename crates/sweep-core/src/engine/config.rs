use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    pub executable: PathBuf,
    /// Shared library the solver needs at runtime; checked at pre-flight.
    pub runtime_library: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateConfig {
    pub configuration: PathBuf,
    pub run_macro: PathBuf,
    pub animation_macro: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshConfig {
    pub file_prefix: String,
    pub file_suffix: String,
}

impl MeshConfig {
    /// Mesh asset file name for a given mesh identifier.
    pub fn file_name(&self, mesh: &str) -> String {
        format!("{}{}{}", self.file_prefix, mesh, self.file_suffix)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub solver: SolverConfig,
    pub templates: TemplateConfig,
    pub mesh: MeshConfig,
    pub parameter_table: PathBuf,
    /// Directory run workspaces are created under; also where templates and
    /// mesh assets are resolved from when given as relative paths.
    pub base_dir: PathBuf,
    pub max_dt_reductions: u32,
}

impl SweepConfig {
    /// Files that must exist before any row is processed; a missing one
    /// aborts the whole sweep.
    pub fn required_files(&self) -> [&Path; 6] {
        [
            &self.solver.executable,
            &self.solver.runtime_library,
            &self.parameter_table,
            &self.templates.configuration,
            &self.templates.run_macro,
            &self.templates.animation_macro,
        ]
    }
}

#[derive(Default)]
pub struct SweepConfigBuilder {
    executable: Option<PathBuf>,
    runtime_library: Option<PathBuf>,
    configuration_template: Option<PathBuf>,
    run_macro_template: Option<PathBuf>,
    animation_macro_template: Option<PathBuf>,
    mesh_file_prefix: Option<String>,
    mesh_file_suffix: Option<String>,
    parameter_table: Option<PathBuf>,
    base_dir: Option<PathBuf>,
    max_dt_reductions: Option<u32>,
}

impl SweepConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn executable(mut self, path: PathBuf) -> Self {
        self.executable = Some(path);
        self
    }
    pub fn runtime_library(mut self, path: PathBuf) -> Self {
        self.runtime_library = Some(path);
        self
    }
    pub fn configuration_template(mut self, path: PathBuf) -> Self {
        self.configuration_template = Some(path);
        self
    }
    pub fn run_macro_template(mut self, path: PathBuf) -> Self {
        self.run_macro_template = Some(path);
        self
    }
    pub fn animation_macro_template(mut self, path: PathBuf) -> Self {
        self.animation_macro_template = Some(path);
        self
    }
    pub fn mesh_file_prefix(mut self, prefix: String) -> Self {
        self.mesh_file_prefix = Some(prefix);
        self
    }
    pub fn mesh_file_suffix(mut self, suffix: String) -> Self {
        self.mesh_file_suffix = Some(suffix);
        self
    }
    pub fn parameter_table(mut self, path: PathBuf) -> Self {
        self.parameter_table = Some(path);
        self
    }
    pub fn base_dir(mut self, path: PathBuf) -> Self {
        self.base_dir = Some(path);
        self
    }
    pub fn max_dt_reductions(mut self, n: u32) -> Self {
        self.max_dt_reductions = Some(n);
        self
    }

    pub fn build(self) -> Result<SweepConfig, ConfigError> {
        let solver = SolverConfig {
            executable: self
                .executable
                .ok_or(ConfigError::MissingParameter("executable"))?,
            runtime_library: self
                .runtime_library
                .ok_or(ConfigError::MissingParameter("runtime_library"))?,
        };
        let templates = TemplateConfig {
            configuration: self
                .configuration_template
                .ok_or(ConfigError::MissingParameter("configuration_template"))?,
            run_macro: self
                .run_macro_template
                .ok_or(ConfigError::MissingParameter("run_macro_template"))?,
            animation_macro: self
                .animation_macro_template
                .ok_or(ConfigError::MissingParameter("animation_macro_template"))?,
        };
        let mesh = MeshConfig {
            file_prefix: self
                .mesh_file_prefix
                .ok_or(ConfigError::MissingParameter("mesh_file_prefix"))?,
            file_suffix: self
                .mesh_file_suffix
                .ok_or(ConfigError::MissingParameter("mesh_file_suffix"))?,
        };
        Ok(SweepConfig {
            solver,
            templates,
            mesh,
            parameter_table: self
                .parameter_table
                .ok_or(ConfigError::MissingParameter("parameter_table"))?,
            base_dir: self.base_dir.ok_or(ConfigError::MissingParameter("base_dir"))?,
            max_dt_reductions: self
                .max_dt_reductions
                .ok_or(ConfigError::MissingParameter("max_dt_reductions"))?,
        })
    }
}
