use crate::cli::ConfigOverrides;
use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use vipersweep::engine::config::{SweepConfig, SweepConfigBuilder};

// Defaults mirror the solver's conventional file layout: everything lives
// next to the parameter table unless the config file or CLI says otherwise.
const DEFAULT_EXECUTABLE: &str = "viper.exe";
const DEFAULT_RUNTIME_LIBRARY: &str = "libiomp5md.dll";
const DEFAULT_PARAMETER_TABLE: &str = "parameters.csv";
const DEFAULT_CONFIG_TEMPLATE: &str = "viper.cfg";
const DEFAULT_RUN_MACRO_TEMPLATE: &str = "macro.txt";
const DEFAULT_ANIMATION_MACRO_TEMPLATE: &str = "macro_animation.txt";
const DEFAULT_MESH_PREFIX: &str = "fluidic_amplifier_res_";
const DEFAULT_MESH_SUFFIX: &str = ".msh";
const DEFAULT_MAX_DT_REDUCTIONS: u32 = 4;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialSolverSection {
    executable: Option<PathBuf>,
    #[serde(rename = "runtime-library")]
    runtime_library: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialSweepSection {
    parameters: Option<PathBuf>,
    #[serde(rename = "base-dir")]
    base_dir: Option<PathBuf>,
    #[serde(rename = "max-dt-reductions")]
    max_dt_reductions: Option<u32>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialTemplateSection {
    configuration: Option<PathBuf>,
    #[serde(rename = "run-macro")]
    run_macro: Option<PathBuf>,
    #[serde(rename = "animation-macro")]
    animation_macro: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialMeshSection {
    #[serde(rename = "file-prefix")]
    file_prefix: Option<String>,
    #[serde(rename = "file-suffix")]
    file_suffix: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialSweepConfig {
    solver: Option<PartialSolverSection>,
    sweep: Option<PartialSweepSection>,
    templates: Option<PartialTemplateSection>,
    mesh: Option<PartialMeshSection>,
}

impl PartialSweepConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Builds the final sweep configuration: CLI overrides win over the file,
    /// the file wins over the defaults.
    pub fn merge_with_cli(mut self, overrides: &ConfigOverrides) -> Result<SweepConfig> {
        let solver = self.solver.take().unwrap_or_default();
        let sweep = self.sweep.take().unwrap_or_default();
        let templates = self.templates.take().unwrap_or_default();
        let mesh = self.mesh.take().unwrap_or_default();

        let base_dir = overrides
            .base_dir
            .clone()
            .or(sweep.base_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        // Relative paths in the file or defaults resolve against the base
        // directory; explicit absolute paths pass through untouched.
        let resolve = |path: PathBuf| -> PathBuf {
            if path.is_absolute() {
                path
            } else {
                base_dir.join(path)
            }
        };

        let builder = SweepConfigBuilder::new()
            .executable(resolve(
                overrides
                    .solver
                    .clone()
                    .or(solver.executable)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_EXECUTABLE)),
            ))
            .runtime_library(resolve(
                solver
                    .runtime_library
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_RUNTIME_LIBRARY)),
            ))
            .parameter_table(resolve(
                overrides
                    .parameters
                    .clone()
                    .or(sweep.parameters)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_PARAMETER_TABLE)),
            ))
            .configuration_template(resolve(
                templates
                    .configuration
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_TEMPLATE)),
            ))
            .run_macro_template(resolve(
                templates
                    .run_macro
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_RUN_MACRO_TEMPLATE)),
            ))
            .animation_macro_template(resolve(
                templates
                    .animation_macro
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_ANIMATION_MACRO_TEMPLATE)),
            ))
            .mesh_file_prefix(mesh.file_prefix.unwrap_or_else(|| DEFAULT_MESH_PREFIX.to_string()))
            .mesh_file_suffix(mesh.file_suffix.unwrap_or_else(|| DEFAULT_MESH_SUFFIX.to_string()))
            .base_dir(base_dir)
            .max_dt_reductions(
                overrides
                    .max_dt_reductions
                    .or(sweep.max_dt_reductions)
                    .unwrap_or(DEFAULT_MAX_DT_REDUCTIONS),
            );

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }
}
