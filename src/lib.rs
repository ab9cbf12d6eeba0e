//! # odex-base
//!
//! Core library for Odin source indexing, symbol resolution and completion.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! ide     → IDE features (completion, hover, goto-def, cursor context)
//!   ↓
//! hir     → Package index, name and type-chain resolution
//!   ↓
//! project → File enumeration, language root detection, collection loading
//!   ↓
//! syntax  → Line-oriented declaration parser
//!   ↓
//! hir::symbols → Plain symbol and import data
//!   ↓
//! base    → Primitives (LineCol, LineIndex, TextSize)
//! ```
//!
//! `hir::symbols` is the exception to the order: it is pure data with no
//! dependency above `base`, so the parser can produce it and the project
//! loader can map `ImportSource` specifiers to directories.
//!
//! The library logs through `tracing` and never installs a subscriber.

/// Foundation types: positions and line indexes
pub mod base;

/// Symbols, packages, the index and the resolver
pub mod hir;

/// IDE features: completion, hover, goto-definition
pub mod ide;

/// Workspace files on disk
pub mod project;

/// Source text to declarations
pub mod syntax;

// Re-export commonly needed items
pub use base::{LineCol, LineIndex, TextRange, TextSize};
pub use hir::{Index, Snapshot, Symbol, SymbolKind};
pub use ide::{Analysis, AnalysisHost};
pub use project::IndexConfig;
