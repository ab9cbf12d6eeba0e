//! Packages: one directory, one namespace.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;

use super::symbols::{Import, Symbol};

/// What one member file contributes to its package.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileEntry {
    /// Name from the file's `package` clause.
    pub package_name: Option<Arc<str>>,
    pub symbols: Vec<Arc<Symbol>>,
    /// Imports with `resolved` filled in by the index.
    pub imports: Vec<Import>,
}

/// A package directory and everything declared in it.
///
/// Packages are immutable once built. The index replaces a whole package
/// when one of its files changes ([`Package::with_file`]), so a reader
/// holding an `Arc<Package>` never sees it change.
#[derive(Clone, Debug)]
pub struct Package {
    path: Arc<Path>,
    name: Arc<str>,
    /// Member files, sorted by path.
    files: IndexMap<Arc<Path>, FileEntry>,
    /// Name → symbols, in file order then declaration order.
    by_name: IndexMap<Arc<str>, Vec<Arc<Symbol>>>,
    symbol_count: usize,
}

impl Package {
    pub fn new(path: impl Into<Arc<Path>>) -> Self {
        let path = path.into();
        let name = dir_name(&path);
        Self {
            path,
            name,
            files: IndexMap::new(),
            by_name: IndexMap::new(),
            symbol_count: 0,
        }
    }

    /// Build a package from all of its files at once.
    pub fn from_files(
        path: impl Into<Arc<Path>>,
        files: impl IntoIterator<Item = (Arc<Path>, FileEntry)>,
    ) -> Self {
        let mut package = Self::new(path);
        package.files.extend(files);
        package.files.sort_keys();
        package.rebuild();
        package
    }

    /// The package directory.
    pub fn path(&self) -> &Arc<Path> {
        &self.path
    }

    /// Declared package name, or the directory name if no file declares one.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn files(&self) -> impl Iterator<Item = (&Arc<Path>, &FileEntry)> {
        self.files.iter()
    }

    pub fn file(&self, path: &Path) -> Option<&FileEntry> {
        self.files.get(path)
    }

    pub fn contains_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    /// Imports of one member file.
    pub fn imports_of(&self, file: &Path) -> &[Import] {
        self.files.get(file).map_or(&[], |entry| &entry.imports)
    }

    /// Every member file's imports, in file order.
    pub fn imports(&self) -> impl Iterator<Item = &Import> {
        self.files.values().flat_map(|entry| entry.imports.iter())
    }

    /// All symbols named `name`, in file order.
    pub fn lookup(&self, name: &str) -> &[Arc<Symbol>] {
        self.by_name.get(name).map_or(&[], Vec::as_slice)
    }

    pub fn first(&self, name: &str) -> Option<&Arc<Symbol>> {
        self.lookup(name).first()
    }

    /// All symbols, in file order then declaration order.
    pub fn symbols(&self) -> impl Iterator<Item = &Arc<Symbol>> {
        self.files.values().flat_map(|entry| entry.symbols.iter())
    }

    /// Distinct symbol names, in first-declaration order.
    pub fn names(&self) -> impl Iterator<Item = &Arc<str>> {
        self.by_name.keys()
    }

    pub fn symbol_count(&self) -> usize {
        self.symbol_count
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// A copy of this package with `file`'s contribution replaced.
    pub fn with_file(&self, file: Arc<Path>, entry: FileEntry) -> Package {
        let mut next = self.clone();
        next.files.insert(file, entry);
        next.files.sort_keys();
        next.rebuild();
        next
    }

    /// A copy of this package without `file`, or `None` if it was not a member.
    pub fn without_file(&self, file: &Path) -> Option<Package> {
        if !self.files.contains_key(file) {
            return None;
        }
        let mut next = self.clone();
        next.files.shift_remove(file);
        next.rebuild();
        Some(next)
    }

    /// Rebuild the name map from the per-file lists. Only the file lists are
    /// state; everything else is derived, so the result does not depend on
    /// the order files were added in.
    fn rebuild(&mut self) {
        self.by_name.clear();
        self.symbol_count = 0;
        for entry in self.files.values() {
            for symbol in &entry.symbols {
                self.by_name
                    .entry(symbol.name.clone())
                    .or_default()
                    .push(symbol.clone());
                self.symbol_count += 1;
            }
        }
        self.name = self
            .files
            .values()
            .find_map(|entry| entry.package_name.clone())
            .unwrap_or_else(|| dir_name(&self.path));
    }
}

fn dir_name(path: &Path) -> Arc<str> {
    path.file_name()
        .map(|name| Arc::from(name.to_string_lossy().as_ref()))
        .unwrap_or_else(|| Arc::from(""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax;

    fn entry(file: &str, text: &str) -> (Arc<Path>, FileEntry) {
        let path: Arc<Path> = Arc::from(Path::new(file));
        let parsed = syntax::parse(&path, text);
        let entry = FileEntry {
            package_name: parsed.package_name,
            symbols: parsed.symbols.into_iter().map(Arc::new).collect(),
            imports: parsed.imports,
        };
        (path, entry)
    }

    #[test]
    fn test_lookup_in_file_order() {
        let (b, b_entry) = entry("/p/b.odin", "package p\ninit :: proc() {}\n");
        let (a, a_entry) = entry("/p/a.odin", "package p\ninit :: proc() {}\nhelper :: 1\n");

        let package = Package::new(Path::new("/p"))
            .with_file(b, b_entry)
            .with_file(a, a_entry);

        let inits = package.lookup("init");
        assert_eq!(inits.len(), 2);
        assert_eq!(&*inits[0].file, Path::new("/p/a.odin"));
        assert_eq!(package.symbol_count(), 3);
        assert_eq!(package.name(), "p");
    }

    #[test]
    fn test_rebuild_is_history_independent() {
        let (a, a_entry) = entry("/p/a.odin", "A :: 1\n");
        let (b, b_entry) = entry("/p/b.odin", "B :: 2\n");

        let one = Package::new(Path::new("/p"))
            .with_file(a.clone(), a_entry.clone())
            .with_file(b.clone(), b_entry.clone());
        let two = Package::new(Path::new("/p"))
            .with_file(b.clone(), b_entry.clone())
            .with_file(a.clone(), a_entry.clone())
            .without_file(&a)
            .unwrap()
            .with_file(a, a_entry);

        let names = |p: &Package| p.names().map(|n| n.to_string()).collect::<Vec<_>>();
        assert_eq!(names(&one), names(&two));
    }

    #[test]
    fn test_without_file() {
        let (a, a_entry) = entry("/p/a.odin", "A :: 1\n");
        let package = Package::new(Path::new("/p")).with_file(a.clone(), a_entry);

        assert!(package.without_file(Path::new("/p/zzz.odin")).is_none());
        let emptied = package.without_file(&a).unwrap();
        assert!(emptied.is_empty());
        assert!(emptied.lookup("A").is_empty());
        assert_eq!(package.lookup("A").len(), 1);
    }

    #[test]
    fn test_name_falls_back_to_directory() {
        let package = Package::new(Path::new("/proj/render"));
        assert_eq!(package.name(), "render");
    }
}
