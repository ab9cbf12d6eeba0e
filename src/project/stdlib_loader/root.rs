use std::path::{Path, PathBuf};

/// Search `start` and up to `max_depth` of its parents for the language root.
///
/// A root is a directory with both `core/` and `vendor/` in it, or an `Odin/`
/// child directory that has `core/`.
pub fn find_language_root(start: &Path, max_depth: usize) -> Option<PathBuf> {
    start.ancestors().take(max_depth + 1).find_map(root_at)
}

fn root_at(dir: &Path) -> Option<PathBuf> {
    if dir.join("core").is_dir() && dir.join("vendor").is_dir() {
        return Some(dir.to_path_buf());
    }
    let nested = dir.join("Odin");
    nested.join("core").is_dir().then_some(nested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_root_found_above_project() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("core/fmt")).unwrap();
        fs::create_dir_all(tmp.path().join("vendor")).unwrap();
        let project = tmp.path().join("work/game");
        fs::create_dir_all(&project).unwrap();

        assert_eq!(find_language_root(&project, 10), Some(tmp.path().to_path_buf()));
    }

    #[test]
    fn test_root_in_odin_subdirectory() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("Odin/core")).unwrap();
        let project = tmp.path().join("game");
        fs::create_dir_all(&project).unwrap();

        assert_eq!(find_language_root(&project, 10), Some(tmp.path().join("Odin")));
    }

    #[test]
    fn test_core_without_vendor_is_not_a_root() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("core")).unwrap();
        assert_eq!(find_language_root(tmp.path(), 0), None);
    }

    #[test]
    fn test_search_depth_is_bounded() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("core")).unwrap();
        fs::create_dir_all(tmp.path().join("vendor")).unwrap();
        let deep = tmp.path().join("a/b/c");
        fs::create_dir_all(&deep).unwrap();

        assert_eq!(find_language_root(&deep, 2), None);
        assert!(find_language_root(&deep, 3).is_some());
    }
}
