//! AnalysisHost and Analysis: session state and query snapshots.
//!
//! The `AnalysisHost` owns the index and the completion cache for one
//! editing session. `Analysis` is an immutable snapshot for a batch of
//! queries: everything it answers comes from one index generation.
//!
//! ## Usage
//!
//! ```ignore
//! let host = AnalysisHost::new();
//! host.reindex_project(Path::new("/work/game"), &[]);
//! host.update_file(Path::new("/work/game/main.odin"), &text);
//!
//! let analysis = host.analysis();
//! let items = analysis.completions_at(Path::new("/work/game/main.odin"), &text, offset);
//! let hover = analysis.hover(Path::new("/work/game/main.odin"), "Clip");
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::completion::{CompletionCache, CompletionContext, CompletionItem, filter_prefix};
use super::context::{self, CompletionRequest};
use super::goto::{self, GotoResult};
use super::hover::{self, HoverResult};
use crate::base::TextSize;
use crate::hir::{Diagnostic, Index, ProjectSummary, Resolver, Scope, Snapshot, Symbol};
use crate::project::IndexConfig;

/// Owns all session state for the IDE layer.
///
/// Writes go through the index, which serialises them; the host itself
/// can be shared between threads.
pub struct AnalysisHost {
    index: Arc<Index>,
    completion_cache: Arc<CompletionCache>,
}

impl Default for AnalysisHost {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisHost {
    pub fn new() -> Self {
        Self::with_config(IndexConfig::default())
    }

    pub fn with_config(config: IndexConfig) -> Self {
        Self::from_index(Arc::new(Index::with_config(config)))
    }

    /// Wrap an index that is shared with other owners (a background
    /// indexing thread, for instance).
    pub fn from_index(index: Arc<Index>) -> Self {
        Self {
            index,
            completion_cache: Arc::new(CompletionCache::new()),
        }
    }

    pub fn index(&self) -> &Arc<Index> {
        &self.index
    }

    /// Index a whole project. See [`Index::reindex_project`].
    pub fn reindex_project(&self, root: &Path, extra_dirs: &[PathBuf]) -> ProjectSummary {
        self.index.reindex_project(root, extra_dirs)
    }

    /// Re-read one file from disk, e.g. after a save.
    pub fn reindex_file(&self, path: &Path) -> u64 {
        self.index.reindex_file(path)
    }

    /// Replace one file's contents with editor text.
    pub fn update_file(&self, path: &Path, text: &str) -> u64 {
        self.index.update_file(path, text)
    }

    pub fn remove_file(&self, path: &Path) -> u64 {
        self.index.remove_file(path)
    }

    /// Get a consistent snapshot for querying.
    pub fn analysis(&self) -> Analysis {
        Analysis {
            snapshot: self.index.snapshot(),
            completion_cache: self.completion_cache.clone(),
        }
    }
}

/// An immutable snapshot of the analysis state.
///
/// All IDE queries go through this struct to ensure consistent results.
#[derive(Clone)]
pub struct Analysis {
    snapshot: Snapshot,
    completion_cache: Arc<CompletionCache>,
}

impl Analysis {
    pub fn generation(&self) -> u64 {
        self.snapshot.generation()
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// A resolver for lookups made from `file`.
    pub fn resolver(&self, file: &Path) -> Resolver<'_> {
        Resolver::new(&self.snapshot, Scope::file(file))
    }

    // ==================== Completion ====================

    /// Completions for an already classified request.
    pub fn completions(&self, file: &Path, prefix: &str, context: &CompletionContext) -> Vec<CompletionItem> {
        self.completion_cache.complete(&self.resolver(file), prefix, context)
    }

    /// Classify the cursor at `offset` in `text` (the current contents of
    /// `file`) and complete it.
    pub fn completions_at(&self, file: &Path, text: &str, offset: TextSize) -> Vec<CompletionItem> {
        let CompletionRequest { prefix, context } = context::classify(text, offset);
        let resolver = self.resolver(file);
        let mut candidates = self.completion_cache.candidates(&resolver, &context);
        // An implicit selector nothing could type falls back to plain names,
        // as does a chain that did not resolve. An unresolved alias does not.
        let falls_back = !matches!(
            context,
            CompletionContext::Unscoped | CompletionContext::Package { .. }
        );
        if candidates.is_empty() && falls_back {
            candidates = self
                .completion_cache
                .candidates(&resolver, &CompletionContext::Unscoped);
        }
        filter_prefix(&candidates, &prefix)
    }

    // ==================== Navigation ====================

    /// Every declaration of `name` from the package in `package`, best first.
    pub fn definitions_of(&self, name: &str, package: &Path) -> Vec<Arc<Symbol>> {
        goto::definitions_of(&self.snapshot, name, package)
    }

    pub fn goto_definition(&self, file: &Path, name: &str) -> GotoResult {
        goto::goto_definition(&self.snapshot, &Scope::file(file), name)
    }

    /// Go to the definition of the name under the cursor.
    pub fn goto_definition_at(&self, file: &Path, text: &str, offset: TextSize) -> GotoResult {
        match context::word_at(text, offset) {
            Some(name) => self.goto_definition(file, &name),
            None => GotoResult::NotFound,
        }
    }

    pub fn hover(&self, file: &Path, name: &str) -> Option<HoverResult> {
        hover::hover(&self.snapshot, &Scope::file(file), name)
    }

    pub fn hover_at(&self, file: &Path, text: &str, offset: TextSize) -> Option<HoverResult> {
        self.hover(file, &context::word_at(text, offset)?)
    }

    // ==================== Project ====================

    pub fn project_summary(&self) -> ProjectSummary {
        self.snapshot.project_summary()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.snapshot.diagnostics()
    }
}
