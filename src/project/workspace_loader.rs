use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use walkdir::{DirEntry, WalkDir};

use super::{IndexConfig, LoadError};
use crate::syntax::{self, ParsedFile};

/// Finds and parses source files on disk.
pub struct WorkspaceLoader<'a> {
    config: &'a IndexConfig,
}

impl<'a> WorkspaceLoader<'a> {
    pub fn new(config: &'a IndexConfig) -> Self {
        Self { config }
    }

    /// All source files under `dir`, recursively, sorted.
    pub fn collect_files(&self, dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
        self.walk(dir, usize::MAX)
    }

    /// Source files directly inside `dir`: one package's members.
    pub fn collect_package_files(&self, dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
        self.walk(dir, 1)
    }

    fn walk(&self, dir: &Path, max_depth: usize) -> Result<Vec<PathBuf>, LoadError> {
        if !dir.is_dir() {
            return Err(LoadError::NotADirectory(dir.to_path_buf()));
        }

        let skip_hidden = self.config.skip_hidden;
        let walker = WalkDir::new(dir)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !(skip_hidden && entry.depth() > 0 && is_hidden_dir(entry)));

        let mut paths = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|source| LoadError::Walk {
                path: dir.to_path_buf(),
                source,
            })?;
            if entry.file_type().is_file() && self.config.is_source_file(entry.path()) {
                paths.push(entry.into_path());
            }
        }
        Ok(paths)
    }

    /// Read and parse one file.
    pub fn load_file(&self, path: &Path) -> Result<ParsedFile, LoadError> {
        let text = fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(syntax::parse(path, &text))
    }

    /// Read and parse many files in parallel, keeping their order.
    pub fn load_files(&self, paths: &[PathBuf]) -> Vec<(PathBuf, Result<ParsedFile, LoadError>)> {
        paths
            .par_iter()
            .map(|path| (path.clone(), self.load_file(path)))
            .collect()
    }
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}
