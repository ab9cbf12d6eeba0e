//! Index configuration.

use std::path::PathBuf;

use rustc_hash::FxHashMap;

/// How a project is walked and how collection imports are located.
///
/// Nothing here is read from disk; the embedding editor builds one and hands
/// it to [`Index::with_config`](crate::hir::Index::with_config).
#[derive(Clone, Debug)]
pub struct IndexConfig {
    /// Source file extension, without the dot.
    pub extension: String,
    /// Skip directories whose name starts with `.`.
    pub skip_hidden: bool,
    /// How many parent directories root detection may climb.
    pub root_search_depth: usize,
    /// Use this language root instead of searching for one.
    pub language_root: Option<PathBuf>,
    /// Extra collections, as with `-collection:name=path`.
    pub collections: FxHashMap<String, PathBuf>,
    /// Index the `core:`/`vendor:`/custom packages a project imports.
    pub load_imported_collections: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            extension: "odin".to_string(),
            skip_hidden: true,
            root_search_depth: 10,
            language_root: None,
            collections: FxHashMap::default(),
            load_imported_collections: true,
        }
    }
}

impl IndexConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_language_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.language_root = Some(root.into());
        self
    }

    pub fn with_collection(mut self, name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        self.collections.insert(name.into(), dir.into());
        self
    }

    pub fn with_imported_collections(mut self, load: bool) -> Self {
        self.load_imported_collections = load;
        self
    }

    pub fn with_root_search_depth(mut self, depth: usize) -> Self {
        self.root_search_depth = depth;
        self
    }

    pub fn with_hidden_dirs(mut self, include: bool) -> Self {
        self.skip_hidden = !include;
        self
    }

    /// Whether `path` has the configured source extension.
    pub fn is_source_file(&self, path: &std::path::Path) -> bool {
        path.extension().is_some_and(|ext| ext == self.extension.as_str())
    }
}
