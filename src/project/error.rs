use std::path::{Path, PathBuf};

use thiserror::Error;

/// File-system failures while loading a project.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
}

impl LoadError {
    /// The path the failure is about.
    pub fn path(&self) -> &Path {
        match self {
            LoadError::Read { path, .. } | LoadError::Walk { path, .. } => path,
            LoadError::NotADirectory(path) => path,
        }
    }
}
