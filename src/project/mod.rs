//! Project layout on disk: which files belong to a project, where the
//! language's own collections live, and how they are loaded.

mod config;
mod error;
pub mod stdlib_loader;
mod workspace_loader;

pub use config::IndexConfig;
pub use error::LoadError;
pub use stdlib_loader::{find_language_root, import_dir, load_package_dirs};
pub use workspace_loader::WorkspaceLoader;
