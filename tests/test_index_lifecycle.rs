//! Index lifecycle against real directories: project reindexing, collection
//! loading, per-file updates and diagnostics.

use std::fs;
use std::path::{Path, PathBuf};

use odex::hir::diagnostics::codes;
use odex::{Index, IndexConfig, SymbolKind};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, text: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, text).unwrap();
    path
}

/// A language root with `core/fmt` and an empty `vendor/`, and a project
/// below it that imports `core:fmt`.
fn fake_install() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "core/fmt/fmt.odin",
        "package fmt\n\nprintln :: proc(args: ..any) {}\nInfo :: struct { width: int }\n",
    );
    write(tmp.path(), "core/fmt/internal/deep.odin", "package internal\nDeep :: 1\n");
    write(tmp.path(), "core/os/os.odin", "package os\nexit :: proc(code: int) {}\n");
    fs::create_dir_all(tmp.path().join("vendor")).unwrap();

    let project = tmp.path().join("work/game");
    write(
        &project,
        "main.odin",
        "package game\n\nimport \"core:fmt\"\n\nmain :: proc() {\n\tfmt.println(\"hi\")\n}\n",
    );
    write(&project, "player.odin", "package game\n\nPlayer :: struct {\n\thp: int,\n}\n");
    (tmp, project)
}

#[test]
fn test_reindex_project_loads_imported_collections() {
    let (tmp, project) = fake_install();
    let index = Index::new();
    let summary = index.reindex_project(&project, &[]);

    // game + core/fmt. Neither core/os nor the nested package is imported.
    assert_eq!(summary.package_count, 2);
    assert_eq!(summary.file_count, 3);
    assert_eq!(summary.total_symbol_count, 4);

    let snapshot = index.snapshot();
    assert_eq!(snapshot.language_root(), Some(tmp.path()));
    assert!(snapshot.package(&tmp.path().join("core/fmt")).is_some());
    assert!(snapshot.package(&tmp.path().join("core/os")).is_none());
    assert!(snapshot.package(&tmp.path().join("core/fmt/internal")).is_none());

    let fmt = snapshot
        .resolve_alias(&project.join("main.odin"), "fmt")
        .expect("fmt alias resolves");
    assert_eq!(fmt.name(), "fmt");
    assert_eq!(fmt.first("println").map(|s| s.kind), Some(SymbolKind::Procedure));
    assert!(index.diagnostics().is_empty());
}

#[test]
fn test_collection_loading_can_be_turned_off() {
    let (_tmp, project) = fake_install();
    let index = Index::with_config(IndexConfig::default().with_imported_collections(false));
    let summary = index.reindex_project(&project, &[]);

    assert_eq!(summary.package_count, 1);
    // The import still resolves to a directory, there is just no package.
    assert!(index.diagnostics().is_empty());
    assert!(index.snapshot().resolve_alias(&project.join("main.odin"), "fmt").is_none());
}

#[test]
fn test_missing_root_is_reported_not_fatal() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "app/main.odin",
        "package app\nimport \"core:fmt\"\nmain :: proc() {}\n",
    );
    let index = Index::with_config(IndexConfig::default().with_root_search_depth(0));
    let summary = index.reindex_project(&tmp.path().join("app"), &[]);
    assert_eq!(summary.total_symbol_count, 1);

    let found: Vec<_> = index
        .diagnostics()
        .iter()
        .filter_map(|d| d.code.as_deref().map(str::to_string))
        .collect();
    assert!(found.contains(&codes::ROOT_NOT_FOUND.to_string()));
    assert!(found.contains(&codes::UNRESOLVED_IMPORT.to_string()));
}

#[test]
fn test_unresolved_relative_import_diagnostic() {
    let tmp = TempDir::new().unwrap();
    let main = write(
        tmp.path(),
        "app/main.odin",
        "package app\n\nimport gone \"../missing\"\n",
    );
    let index = Index::with_config(IndexConfig::default().with_language_root(tmp.path()));
    index.reindex_project(&tmp.path().join("app"), &[]);

    let diagnostics = index.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(&*diagnostics[0].file, main.as_path());
    assert_eq!(diagnostics[0].pos.line, 2);
    assert_eq!(diagnostics[0].code.as_deref(), Some(codes::UNRESOLVED_IMPORT));
    assert!(diagnostics[0].message.contains("../missing"));
}

#[test]
fn test_reindex_file_is_idempotent() {
    let (_tmp, project) = fake_install();
    let index = Index::new();
    index.reindex_project(&project, &[]);
    let before = index.project_summary();
    let symbols_before: Vec<_> = index
        .lookup("Player")
        .iter()
        .map(|s| (s.file.clone(), s.pos))
        .collect();

    let player = project.join("player.odin");
    let first = index.reindex_file(&player);
    let second = index.reindex_file(&player);

    assert_eq!(second, first + 1);
    assert_eq!(index.project_summary(), before);
    let symbols_after: Vec<_> = index
        .lookup("Player")
        .iter()
        .map(|s| (s.file.clone(), s.pos))
        .collect();
    assert_eq!(symbols_after, symbols_before);
}

#[test]
fn test_reindex_file_only_touches_that_file() {
    let (_tmp, project) = fake_install();
    let index = Index::new();
    index.reindex_project(&project, &[]);

    let player = project.join("player.odin");
    fs::write(&player, "package game\n\nEnemy :: struct { hp: int }\n").unwrap();
    index.reindex_file(&player);

    assert!(index.lookup("Player").is_empty());
    assert_eq!(index.lookup("Enemy").len(), 1);
    // main.odin's declarations are untouched.
    assert_eq!(index.lookup("main").len(), 1);
    assert_eq!(index.lookup("println").len(), 1);
}

#[test]
fn test_deleted_file_is_dropped_with_a_diagnostic() {
    let (_tmp, project) = fake_install();
    let index = Index::new();
    index.reindex_project(&project, &[]);

    let player = project.join("player.odin");
    fs::remove_file(&player).unwrap();
    index.reindex_file(&player);

    assert!(index.lookup("Player").is_empty());
    let diagnostics = index.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code.as_deref(), Some(codes::READ_FAILED));

    // Writing it back clears the problem.
    write(&project, "player.odin", "package game\nPlayer :: struct {}\n");
    index.reindex_file(&player);
    assert!(index.diagnostics().is_empty());
    assert_eq!(index.lookup("Player").len(), 1);
}

#[test]
fn test_update_file_pulls_in_new_collection_import() {
    let (tmp, project) = fake_install();
    let index = Index::new();
    index.reindex_project(&project, &[]);
    assert!(index.snapshot().package(&tmp.path().join("core/os")).is_none());

    index.update_file(
        &project.join("player.odin"),
        "package game\nimport \"core:os\"\nPlayer :: struct { hp: int }\n",
    );

    let snapshot = index.snapshot();
    assert!(snapshot.package(&tmp.path().join("core/os")).is_some());
    assert_eq!(snapshot.lookup("exit").len(), 1);
}

#[test]
fn test_snapshot_outlives_writes() {
    let (_tmp, project) = fake_install();
    let index = Index::new();
    index.reindex_project(&project, &[]);
    let old = index.snapshot();

    index.remove_file(&project.join("player.odin"));

    assert_eq!(old.lookup("Player").len(), 1);
    assert!(index.snapshot().lookup("Player").is_empty());
    assert!(index.generation() > old.generation());
}

#[test]
fn test_extra_dirs_are_indexed() {
    let (tmp, project) = fake_install();
    let shared = tmp.path().join("work/shared");
    write(&shared, "util.odin", "package shared\nclamp :: proc(x, lo, hi: f32) -> f32 { return x }\n");

    let index = Index::new();
    let summary = index.reindex_project(&project, &[shared.clone()]);

    assert_eq!(summary.package_count, 3);
    assert_eq!(index.lookup_in_package(&shared, "clamp").len(), 1);
}

#[test]
fn test_import_resolves_once_its_directory_exists() {
    let tmp = TempDir::new().unwrap();
    let text = "package app\n\nimport jui \"../jui\"\n";
    let main = write(tmp.path(), "app/main.odin", text);
    let index = Index::with_config(IndexConfig::default().with_language_root(tmp.path()));

    index.update_file(&main, text);
    assert!(index.snapshot().resolve_alias(&main, "jui").is_none());
    assert_eq!(index.diagnostics().len(), 1);

    let jui = write(tmp.path(), "jui/jui.odin", "package jui\ndraw_box :: proc() {}\n");
    index.reindex_file(&jui);
    index.reindex_file(&main);

    let snapshot = index.snapshot();
    let package = snapshot.resolve_alias(&main, "jui").expect("jui resolves after re-save");
    assert_eq!(package.first("draw_box").map(|s| &*s.name), Some("draw_box"));
    let import = snapshot.imports_of(&main)[0].clone();
    assert!(index.resolve_import(&main, &import).is_some());
    assert!(index.diagnostics().is_empty());
}
