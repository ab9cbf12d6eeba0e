//! High-level IR: the semantic model of an Odin project.
//!
//! - [`symbols`]: declarations and imports as the parser produces them
//! - [`Package`]: one directory's files and its name → symbol map
//! - [`Index`]: all packages, rebuilt incrementally, read through [`Snapshot`]s
//! - [`Resolver`]: names, type chains and expected enums
//! - [`diagnostics`]: recorded, non-fatal load problems

pub mod diagnostics;
mod index;
mod package;
mod resolve;
pub mod symbols;

pub use diagnostics::{Diagnostic, DiagnosticCollector, Severity};
pub use index::{Index, ProjectSummary, Snapshot};
pub use package::{FileEntry, Package};
pub use resolve::{ChainTarget, EnumContext, ResolveResult, Resolver, Scope};
pub use symbols::{
    Field, Import, ImportSource, Param, ProcSignature, Symbol, SymbolData, SymbolKind,
};
