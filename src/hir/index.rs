//! The package-scoped symbol index.
//!
//! One [`Index`] per session. Writers (a full project pass, a single file
//! reindex, a save notification) are serialised by a writer mutex and do
//! their file I/O and parsing outside the state lock. Each write builds a new
//! [`IndexState`] that shares every untouched [`Package`] by `Arc`, then
//! swaps it in under a short write lock. Readers take a [`Snapshot`] and see
//! one consistent state for as long as they hold it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info, warn};

use super::diagnostics::{Diagnostic, DiagnosticCollector};
use super::package::{FileEntry, Package};
use super::symbols::{Import, ImportSource, Symbol};
use crate::project::{self, IndexConfig, LoadError, WorkspaceLoader};
use crate::syntax::{self, ParsedFile};

/// Counts reported after a reindex and by [`Snapshot::project_summary`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProjectSummary {
    pub total_symbol_count: usize,
    pub package_count: usize,
    pub file_count: usize,
}

/// One immutable state of the index.
#[derive(Clone, Debug, Default)]
struct IndexState {
    packages: IndexMap<Arc<Path>, Arc<Package>>,
    generation: u64,
    project_root: Option<Arc<Path>>,
    language_root: Option<Arc<Path>>,
    /// Problems found while loading (unreadable files, missing root).
    load_diagnostics: Vec<Diagnostic>,
}

/// Key of the import-resolution cache. Relative specifiers also depend on
/// the importing directory.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ImportKey {
    specifier: String,
    base: Option<PathBuf>,
}

// ============================================================================
// INDEX
// ============================================================================

/// The symbol index: package directory → [`Package`].
pub struct Index {
    config: IndexConfig,
    state: RwLock<Arc<IndexState>>,
    writer: Mutex<()>,
    /// Language root per directory it was searched from.
    roots: Mutex<FxHashMap<PathBuf, Option<Arc<Path>>>>,
    import_cache: Mutex<FxHashMap<ImportKey, Arc<Path>>>,
}

impl Default for Index {
    fn default() -> Self {
        Self::new()
    }
}

impl Index {
    pub fn new() -> Self {
        Self::with_config(IndexConfig::default())
    }

    pub fn with_config(config: IndexConfig) -> Self {
        Self {
            config,
            state: RwLock::new(Arc::new(IndexState::default())),
            writer: Mutex::new(()),
            roots: Mutex::new(FxHashMap::default()),
            import_cache: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// An immutable view for a batch of queries.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state.read().clone(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    // ------------------------------------------------------------------------
    // Writers
    // ------------------------------------------------------------------------

    /// Walk `root` and `extra_dirs`, parse every source file, load the
    /// collection packages they import, and replace the whole index.
    #[tracing::instrument(skip(self, root, extra_dirs), fields(root = %root.display()))]
    pub fn reindex_project(&self, root: &Path, extra_dirs: &[PathBuf]) -> ProjectSummary {
        let _writer = self.writer.lock();
        let started = Instant::now();
        let previous = self.state.read().clone();

        self.import_cache.lock().clear();
        let mut diagnostics = DiagnosticCollector::new();
        let loader = WorkspaceLoader::new(&self.config);

        let language_root = self.language_root_for(root);
        if language_root.is_none() {
            warn!(root = %root.display(), "language root not found");
            diagnostics.root_not_found(root);
        }

        let mut paths = Vec::new();
        for dir in std::iter::once(root).chain(extra_dirs.iter().map(PathBuf::as_path)) {
            match loader.collect_files(dir) {
                Ok(found) => paths.extend(found),
                Err(err) => record_load_error(&mut diagnostics, &err),
            }
        }
        paths.sort();
        paths.dedup();

        let loaded = loader.load_files(&paths);
        let mut files = self.file_entries(loaded, language_root.as_deref(), &mut diagnostics);
        let collections = self.load_imported_collections(
            &loader,
            &files,
            |_| false,
            language_root.as_deref(),
            &mut diagnostics,
        );
        files.extend(collections);

        let mut grouped: IndexMap<Arc<Path>, Vec<(Arc<Path>, FileEntry)>> = IndexMap::new();
        for (file, entry) in files {
            grouped
                .entry(package_dir_of(&file))
                .or_default()
                .push((file, entry));
        }
        let packages: IndexMap<Arc<Path>, Arc<Package>> = grouped
            .into_iter()
            .map(|(dir, files)| {
                let package = Package::from_files(dir.clone(), files);
                (dir, Arc::new(package))
            })
            .collect();

        let state = IndexState {
            packages,
            generation: previous.generation + 1,
            project_root: Some(Arc::from(root)),
            language_root,
            load_diagnostics: diagnostics.take(),
        };
        let summary = summarize(&state);
        *self.state.write() = Arc::new(state);

        info!(
            "Indexed {} symbols in {} packages ({} files) in {:?}",
            summary.total_symbol_count,
            summary.package_count,
            summary.file_count,
            started.elapsed()
        );
        summary
    }

    /// Re-read and re-parse one file from disk. A file that can no longer be
    /// read is dropped from its package. Returns the new generation.
    pub fn reindex_file(&self, path: &Path) -> u64 {
        let loader = WorkspaceLoader::new(&self.config);
        match loader.load_file(path) {
            Ok(parsed) => self.apply_file(path, Some(parsed), None),
            Err(err) => {
                warn!("{err}");
                let reason = err.to_string();
                self.apply_file(path, None, Some(reason))
            }
        }
    }

    /// Reindex one file from text the editor already has.
    pub fn update_file(&self, path: &Path, text: &str) -> u64 {
        let parsed = syntax::parse(path, text);
        self.apply_file(path, Some(parsed), None)
    }

    /// Drop one file's contributions.
    pub fn remove_file(&self, path: &Path) -> u64 {
        self.apply_file(path, None, None)
    }

    fn apply_file(&self, path: &Path, parsed: Option<ParsedFile>, read_error: Option<String>) -> u64 {
        let _writer = self.writer.lock();
        let current = self.state.read().clone();
        let file: Arc<Path> = Arc::from(path);
        let dir = package_dir_of(&file);

        let mut next = IndexState::clone(&current);
        next.load_diagnostics.retain(|d| &*d.file != path);
        let mut diagnostics = DiagnosticCollector::new();
        if let Some(reason) = read_error {
            diagnostics.read_failed(path, reason);
        }

        match parsed {
            Some(parsed) => {
                let language_root = match &current.project_root {
                    Some(project) if dir.starts_with(project) => current.language_root.clone(),
                    _ => self.language_root_for(&dir),
                };
                let symbol_count = parsed.symbols.len();
                let entry = self.file_entry(path, parsed, language_root.as_deref());
                let fresh = vec![(file.clone(), entry.clone())];

                let package = match current.packages.get(&dir) {
                    Some(package) => package.with_file(file, entry),
                    None => Package::new(dir.clone()).with_file(file, entry),
                };
                next.packages.insert(dir.clone(), Arc::new(package));

                let loader = WorkspaceLoader::new(&self.config);
                let collections = self.load_imported_collections(
                    &loader,
                    &fresh,
                    |d| current.packages.contains_key(d),
                    language_root.as_deref(),
                    &mut diagnostics,
                );
                let mut grouped: IndexMap<Arc<Path>, Vec<(Arc<Path>, FileEntry)>> = IndexMap::new();
                for (file, entry) in collections {
                    grouped
                        .entry(package_dir_of(&file))
                        .or_default()
                        .push((file, entry));
                }
                for (dir, files) in grouped {
                    next.packages
                        .insert(dir.clone(), Arc::new(Package::from_files(dir, files)));
                }

                debug!("Reindexed {} ({} symbols)", path.display(), symbol_count);
            }
            None => {
                if let Some(updated) = current.packages.get(&dir).and_then(|p| p.without_file(path)) {
                    if updated.is_empty() {
                        next.packages.shift_remove(&dir);
                    } else {
                        next.packages.insert(dir.clone(), Arc::new(updated));
                    }
                    debug!("Removed {} from index", path.display());
                }
            }
        }

        next.load_diagnostics.extend(diagnostics.take());
        next.generation = current.generation + 1;
        let generation = next.generation;
        *self.state.write() = Arc::new(next);
        generation
    }

    // ------------------------------------------------------------------------
    // Loading helpers
    // ------------------------------------------------------------------------

    fn file_entries(
        &self,
        loaded: Vec<(PathBuf, Result<ParsedFile, LoadError>)>,
        language_root: Option<&Path>,
        diagnostics: &mut DiagnosticCollector,
    ) -> Vec<(Arc<Path>, FileEntry)> {
        let mut entries = Vec::with_capacity(loaded.len());
        for (path, result) in loaded {
            match result {
                Ok(parsed) => {
                    debug!(
                        "Parsed {}: {} symbols, {} imports",
                        path.display(),
                        parsed.symbols.len(),
                        parsed.imports.len()
                    );
                    let entry = self.file_entry(&path, parsed, language_root);
                    entries.push((Arc::from(path), entry));
                }
                Err(err) => record_load_error(diagnostics, &err),
            }
        }
        entries
    }

    fn file_entry(&self, path: &Path, parsed: ParsedFile, language_root: Option<&Path>) -> FileEntry {
        let dir = path.parent().unwrap_or(Path::new(""));
        let imports = parsed
            .imports
            .into_iter()
            .map(|mut import| {
                import.resolved = self.resolve_import_dir(dir, &import.source, language_root);
                import
            })
            .collect();
        FileEntry {
            package_name: parsed.package_name,
            symbols: parsed.symbols.into_iter().map(Arc::new).collect(),
            imports,
        }
    }

    /// Load the collection packages `files` import that are neither among
    /// `files` nor `already_indexed`. Only one level deep.
    fn load_imported_collections(
        &self,
        loader: &WorkspaceLoader<'_>,
        files: &[(Arc<Path>, FileEntry)],
        already_indexed: impl Fn(&Path) -> bool,
        language_root: Option<&Path>,
        diagnostics: &mut DiagnosticCollector,
    ) -> Vec<(Arc<Path>, FileEntry)> {
        if !self.config.load_imported_collections {
            return Vec::new();
        }

        let known: FxHashSet<Arc<Path>> = files.iter().map(|(file, _)| package_dir_of(file)).collect();
        let mut wanted: Vec<PathBuf> = Vec::new();
        for (_, entry) in files {
            for import in &entry.imports {
                let (ImportSource::Collection { .. }, Some(dir)) = (&import.source, &import.resolved) else {
                    continue;
                };
                if !known.contains(dir) && !already_indexed(&**dir) && !wanted.iter().any(|w| w == &**dir) {
                    wanted.push(dir.to_path_buf());
                }
            }
        }
        if wanted.is_empty() {
            return Vec::new();
        }

        debug!("Loading {} imported collection packages", wanted.len());
        let loaded = project::load_package_dirs(loader, &wanted);
        self.file_entries(loaded, language_root, diagnostics)
    }

    /// Directory an import points at, through the per-specifier cache.
    fn resolve_import_dir(
        &self,
        importing_dir: &Path,
        source: &ImportSource,
        language_root: Option<&Path>,
    ) -> Option<Arc<Path>> {
        let key = ImportKey {
            specifier: source.specifier(),
            base: match source {
                ImportSource::Relative(_) => Some(importing_dir.to_path_buf()),
                ImportSource::Collection { .. } => None,
            },
        };
        if let Some(hit) = self.import_cache.lock().get(&key) {
            return Some(hit.clone());
        }

        let resolved: Option<Arc<Path>> =
            project::import_dir(&self.config, language_root, importing_dir, source)
                .map(|dir| Arc::<Path>::from(dir.as_path()));
        match &resolved {
            Some(dir) => {
                debug!("Resolved import \"{}\" to {}", key.specifier, dir.display());
                self.import_cache.lock().insert(key, dir.clone());
            }
            // Not remembered: the directory may be created before the next save.
            None => debug!("Import \"{}\" did not resolve", key.specifier),
        }
        resolved
    }

    /// Language root for a project directory, searched once and cached.
    fn language_root_for(&self, dir: &Path) -> Option<Arc<Path>> {
        if let Some(root) = &self.config.language_root {
            return Some(Arc::from(root.as_path()));
        }
        self.roots
            .lock()
            .entry(dir.to_path_buf())
            .or_insert_with(|| {
                project::find_language_root(dir, self.config.root_search_depth)
                    .map(|root| Arc::from(root.as_path()))
            })
            .clone()
    }

    // ------------------------------------------------------------------------
    // Readers (each takes a fresh snapshot)
    // ------------------------------------------------------------------------

    /// All symbols named `name`, across packages in index order.
    pub fn lookup(&self, name: &str) -> Vec<Arc<Symbol>> {
        self.snapshot().lookup(name)
    }

    pub fn lookup_in_package(&self, package: &Path, name: &str) -> Vec<Arc<Symbol>> {
        self.snapshot().lookup_in_package(package, name).to_vec()
    }

    /// The package an import refers to, or `None` when it is unresolved or
    /// its package is not indexed.
    pub fn resolve_import(&self, file: &Path, import: &Import) -> Option<Arc<Package>> {
        let snapshot = self.snapshot();
        let dir = match &import.resolved {
            Some(dir) => dir.clone(),
            None => {
                let importing_dir = file.parent().unwrap_or(Path::new(""));
                let language_root = snapshot
                    .language_root()
                    .map(Arc::from)
                    .or_else(|| self.language_root_for(importing_dir));
                self.resolve_import_dir(importing_dir, &import.source, language_root.as_deref())?
            }
        };
        snapshot.package(&dir).cloned()
    }

    pub fn project_summary(&self) -> ProjectSummary {
        self.snapshot().project_summary()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.snapshot().diagnostics()
    }
}

fn package_dir_of(file: &Arc<Path>) -> Arc<Path> {
    Arc::from(file.parent().unwrap_or(Path::new("")))
}

fn record_load_error(diagnostics: &mut DiagnosticCollector, err: &LoadError) {
    warn!("{err}");
    diagnostics.read_failed(err.path(), err);
}

fn summarize(state: &IndexState) -> ProjectSummary {
    ProjectSummary {
        total_symbol_count: state.packages.values().map(|p| p.symbol_count()).sum(),
        package_count: state.packages.len(),
        file_count: state.packages.values().map(|p| p.files().count()).sum(),
    }
}

// ============================================================================
// SNAPSHOT
// ============================================================================

/// A consistent, immutable view of the index.
#[derive(Clone, Debug)]
pub struct Snapshot {
    state: Arc<IndexState>,
}

impl Snapshot {
    pub fn generation(&self) -> u64 {
        self.state.generation
    }

    pub fn project_root(&self) -> Option<&Path> {
        self.state.project_root.as_deref()
    }

    pub fn language_root(&self) -> Option<&Path> {
        self.state.language_root.as_deref()
    }

    /// Package by directory.
    pub fn package(&self, dir: &Path) -> Option<&Arc<Package>> {
        self.state.packages.get(dir)
    }

    /// Package containing `file`.
    pub fn package_of(&self, file: &Path) -> Option<&Arc<Package>> {
        self.package(file.parent()?)
    }

    /// Packages in index order.
    pub fn packages(&self) -> impl Iterator<Item = &Arc<Package>> {
        self.state.packages.values()
    }

    /// All symbols named `name`, across packages in index order.
    pub fn lookup(&self, name: &str) -> Vec<Arc<Symbol>> {
        self.packages()
            .flat_map(|package| package.lookup(name).iter().cloned())
            .collect()
    }

    pub fn lookup_in_package(&self, package: &Path, name: &str) -> &[Arc<Symbol>] {
        self.package(package).map_or(&[], |p| p.lookup(name))
    }

    /// Imports of one file.
    pub fn imports_of(&self, file: &Path) -> &[Import] {
        self.package_of(file).map_or(&[], |p| p.imports_of(file))
    }

    /// The package an already-resolved import refers to.
    pub fn resolve_import(&self, import: &Import) -> Option<&Arc<Package>> {
        self.package(import.resolved.as_deref()?)
    }

    /// The package `alias` names inside `file`. The last import with that
    /// alias wins.
    pub fn resolve_alias(&self, file: &Path, alias: &str) -> Option<&Arc<Package>> {
        let import = self
            .imports_of(file)
            .iter()
            .rev()
            .find(|import| &*import.alias == alias)?;
        self.resolve_import(import)
    }

    pub fn project_summary(&self) -> ProjectSummary {
        summarize(&self.state)
    }

    /// Load problems plus one warning per unresolved import.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut collector = DiagnosticCollector::new();
        for diagnostic in &self.state.load_diagnostics {
            collector.add(diagnostic.clone());
        }
        for package in self.packages() {
            for (file, entry) in package.files() {
                for import in entry.imports.iter().filter(|i| !i.is_resolved()) {
                    collector.unresolved_import(file, import);
                }
            }
        }
        collector.take()
    }
}
