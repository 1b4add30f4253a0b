pub mod json;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};
use crate::ir::Program;

/// Serialized program-model formats understood by the loaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFormat {
    Json,
}

impl std::fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "JSON program model"),
        }
    }
}

/// A loader recognizes one program-model format and turns it into the
/// `Program` the analysis consumes.
pub trait ProgramLoader: Send + Sync {
    /// The format this loader handles.
    fn format(&self) -> ModelFormat;

    /// Check if this loader can handle the given file or directory.
    fn detect(&self, path: &Path) -> bool;

    /// Load the program model, lowering bodies and building the call graph.
    fn load(&self, path: &Path) -> Result<Program>;
}

/// All registered loaders.
pub fn all_loaders() -> Vec<Box<dyn ProgramLoader>> {
    vec![Box::new(json::JsonModelLoader)]
}

/// Load a program with the first loader that recognizes `path`.
pub fn load_program(path: &Path) -> Result<Program> {
    for loader in all_loaders() {
        if loader.detect(path) {
            tracing::debug!(format = %loader.format(), path = %path.display(), "loading program model");
            return loader.load(path);
        }
    }
    Err(ScanError::NoProgram(path.display().to_string()))
}
