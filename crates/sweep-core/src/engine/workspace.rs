use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::models::row::ParameterRow;
use crate::engine::config::{MeshConfig, SweepConfig};
use crate::engine::error::SweepError;

/// Result of asking for a run directory.
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    /// The directory was created (parents included) and is ready for staging.
    Created(PathBuf),
    /// The directory already existed and the row's override flag is off; the
    /// attempt is to be skipped without rendering or spawning anything.
    Skipped(PathBuf),
}

/// Derives and prepares run workspaces under the sweep's base directory.
pub struct WorkspaceManager {
    base: PathBuf,
    mesh: MeshConfig,
}

impl WorkspaceManager {
    pub fn new(config: &SweepConfig) -> Self {
        Self {
            base: config.base_dir.clone(),
            mesh: config.mesh.clone(),
        }
    }

    /// Deterministic directory name for one attempt.
    ///
    /// A pure function of the row's identity and the current timestep, so a
    /// previously-completed run is recognized by path existence alone.
    pub fn run_directory_name(row: &ParameterRow, dt: f64) -> String {
        format!(
            "{}_Re{}_m{}_N{}_A{}_o{}_b{}_dt{}",
            row.index + 1,
            row.reynolds,
            row.mesh,
            row.order,
            row.amplitude,
            row.frequency,
            row.balance,
            dt
        )
    }

    /// Creates the run directory for `(row, dt)`, or signals a skip.
    pub fn create_run_directory(
        &self,
        row: &ParameterRow,
        dt: f64,
    ) -> Result<Disposition, SweepError> {
        let path = self.base.join(Self::run_directory_name(row, dt));

        if path.exists() && !row.override_existing {
            return Ok(Disposition::Skipped(path));
        }
        fs::create_dir_all(&path).map_err(|e| SweepError::Workspace {
            path: path.clone(),
            source: e,
        })?;
        debug!("Created run directory {:?}", path);
        Ok(Disposition::Created(path))
    }

    /// Where the mesh asset for this row is expected to live.
    pub fn mesh_source(&self, row: &ParameterRow) -> PathBuf {
        self.base.join(self.mesh.file_name(&row.mesh))
    }

    /// Copies the row's mesh asset into the workspace.
    ///
    /// A missing mesh short-circuits the row before any subprocess runs.
    pub fn stage_mesh(&self, row: &ParameterRow, workspace: &Path) -> Result<PathBuf, SweepError> {
        let source = self.mesh_source(row);
        if !source.is_file() {
            return Err(SweepError::AssetMissing { path: source });
        }
        let destination = workspace.join(self.mesh.file_name(&row.mesh));
        fs::copy(&source, &destination)?;
        Ok(destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::row::Termination;
    use crate::engine::config::SweepConfigBuilder;
    use tempfile::tempdir;

    fn sample_row(override_existing: bool) -> ParameterRow {
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
            termination: Termination::EndTime(5.0),
            animation_loops: "100".to_string(),
            override_existing,
            verbose: true,
        }
    }

    fn manager_in(base: &Path) -> WorkspaceManager {
        let config = SweepConfigBuilder::new()
            .executable(base.join("viper.exe"))
            .runtime_library(base.join("libiomp5md.dll"))
            .configuration_template(base.join("viper.cfg"))
            .run_macro_template(base.join("macro.txt"))
            .animation_macro_template(base.join("macro_animation.txt"))
            .mesh_file_prefix("fluidic_amplifier_res_".to_string())
            .mesh_file_suffix(".msh".to_string())
            .parameter_table(base.join("parameters.csv"))
            .base_dir(base.to_path_buf())
            .max_dt_reductions(4)
            .build()
            .unwrap();
        WorkspaceManager::new(&config)
    }

    #[test]
    fn directory_name_is_a_pure_function_of_row_and_dt() {
        let row = sample_row(false);
        let name = WorkspaceManager::run_directory_name(&row, 0.01);
        assert_eq!(name, "1_Re200_mfine_N7_A0.1_o0.5_b1_dt0.01");
        assert_eq!(WorkspaceManager::run_directory_name(&row, 0.01), name);
        // A halved timestep derives a distinct sibling directory.
        assert_eq!(
            WorkspaceManager::run_directory_name(&row, 0.005),
            "1_Re200_mfine_N7_A0.1_o0.5_b1_dt0.005"
        );
    }

    #[test]
    fn create_run_directory_creates_then_skips_without_override() {
        let dir = tempdir().unwrap();
        let manager = manager_in(dir.path());
        let row = sample_row(false);

        let first = manager.create_run_directory(&row, 0.01).unwrap();
        let Disposition::Created(path) = first else {
            panic!("expected a created workspace");
        };
        assert!(path.is_dir());

        let second = manager.create_run_directory(&row, 0.01).unwrap();
        assert_eq!(second, Disposition::Skipped(path));
    }

    #[test]
    fn create_run_directory_reuses_an_existing_path_with_override() {
        let dir = tempdir().unwrap();
        let manager = manager_in(dir.path());
        let row = sample_row(true);

        let first = manager.create_run_directory(&row, 0.01).unwrap();
        let second = manager.create_run_directory(&row, 0.01).unwrap();
        assert_eq!(first, second);
        assert!(matches!(second, Disposition::Created(_)));
    }

    #[test]
    fn stage_mesh_copies_the_asset_into_the_workspace() {
        let dir = tempdir().unwrap();
        let manager = manager_in(dir.path());
        let row = sample_row(false);
        std::fs::write(dir.path().join("fluidic_amplifier_res_fine.msh"), "mesh data").unwrap();

        let Disposition::Created(workspace) = manager.create_run_directory(&row, 0.01).unwrap()
        else {
            panic!("expected a created workspace");
        };
        let staged = manager.stage_mesh(&row, &workspace).unwrap();
        assert_eq!(staged, workspace.join("fluidic_amplifier_res_fine.msh"));
        assert_eq!(std::fs::read_to_string(&staged).unwrap(), "mesh data");
    }

    #[test]
    fn stage_mesh_fails_when_the_asset_is_absent() {
        let dir = tempdir().unwrap();
        let manager = manager_in(dir.path());
        let row = sample_row(false);

        let Disposition::Created(workspace) = manager.create_run_directory(&row, 0.01).unwrap()
        else {
            panic!("expected a created workspace");
        };
        let result = manager.stage_mesh(&row, &workspace);
        assert!(matches!(result, Err(SweepError::AssetMissing { .. })));
    }
}
