use std::path::{Component, Path, PathBuf};

use rayon::prelude::*;

use crate::hir::ImportSource;
use crate::project::{IndexConfig, LoadError, WorkspaceLoader};
use crate::syntax::ParsedFile;

/// Directory an import refers to, if it exists.
///
/// Collection specifiers go to a configured collection directory first, then
/// to `<root>/<collection>/<path>`. Anything else is relative to the
/// importing file's directory.
pub fn import_dir(
    config: &IndexConfig,
    language_root: Option<&Path>,
    importing_dir: &Path,
    source: &ImportSource,
) -> Option<PathBuf> {
    let dir = match source {
        ImportSource::Collection { collection, path } => {
            let base = match config.collections.get(&**collection) {
                Some(dir) => dir.clone(),
                None => language_root?.join(&**collection),
            };
            normalize(&base.join(&**path))
        }
        ImportSource::Relative(path) => normalize(&importing_dir.join(&**path)),
    };
    dir.is_dir().then_some(dir)
}

/// Lexically resolve `.` and `..` components.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Parse the files of each package directory (not recursive), in parallel.
pub fn load_package_dirs(
    loader: &WorkspaceLoader<'_>,
    dirs: &[PathBuf],
) -> Vec<(PathBuf, Result<ParsedFile, LoadError>)> {
    dirs.par_iter()
        .flat_map_iter(|dir| match loader.collect_package_files(dir) {
            Ok(paths) => paths
                .into_iter()
                .map(|path| {
                    let parsed = loader.load_file(&path);
                    (path, parsed)
                })
                .collect::<Vec<_>>(),
            Err(err) => vec![(dir.clone(), Err(err))],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn collection(collection: &str, path: &str) -> ImportSource {
        ImportSource::Collection {
            collection: Arc::from(collection),
            path: Arc::from(path),
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
        assert_eq!(normalize(Path::new("../x")), PathBuf::from("../x"));
    }

    #[test]
    fn test_collection_import_under_root() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("core/math/linalg")).unwrap();
        let config = IndexConfig::default();

        let dir = import_dir(&config, Some(tmp.path()), Path::new("/x"), &collection("core", "math/linalg"));
        assert_eq!(dir, Some(tmp.path().join("core/math/linalg")));

        let missing = import_dir(&config, Some(tmp.path()), Path::new("/x"), &collection("core", "nope"));
        assert_eq!(missing, None);
        assert_eq!(import_dir(&config, None, Path::new("/x"), &collection("core", "math/linalg")), None);
    }

    #[test]
    fn test_custom_collection_wins() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("libs/ui")).unwrap();
        let config = IndexConfig::default().with_collection("shared", tmp.path().join("libs"));

        let dir = import_dir(&config, None, Path::new("/x"), &collection("shared", "ui"));
        assert_eq!(dir, Some(tmp.path().join("libs/ui")));
    }

    #[test]
    fn test_relative_import() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("app")).unwrap();
        fs::create_dir_all(tmp.path().join("jui")).unwrap();
        let source = ImportSource::Relative(Arc::from("../jui"));
        let config = IndexConfig::default();

        let dir = import_dir(&config, None, &tmp.path().join("app"), &source);
        assert_eq!(dir, Some(tmp.path().join("jui")));

        fs::remove_dir(tmp.path().join("jui")).unwrap();
        assert_eq!(import_dir(&config, None, &tmp.path().join("app"), &source), None);
    }
}
