//! The language's own packages: finding the root that holds `core/` and
//! `vendor/`, mapping import specifiers to directories, and loading the
//! collection packages a project imports.

mod loader;
mod root;

pub use loader::{import_dir, load_package_dirs, normalize};
pub use root::find_language_root;
