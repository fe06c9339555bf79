use std::path::PathBuf;
use thiserror::Error;

use crate::core::io::table::TableError;
use crate::core::io::template::RenderError;

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Required file not found: {path}", path = path.display())]
    MissingPrerequisite { path: PathBuf },

    #[error("Parameter table error: {source}")]
    Table {
        #[from]
        source: TableError,
    },

    #[error("Template rendering failed: {source}")]
    Render {
        #[from]
        source: RenderError,
    },

    #[error("Failed to create run directory '{path}': {source}", path = path.display())]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Mesh file not found: {path}", path = path.display())]
    AssetMissing { path: PathBuf },

    #[error("Solver launch failed: {0}")]
    Launch(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
