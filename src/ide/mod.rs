//! IDE features: high-level queries for editor integrations.
//!
//! This module provides the interface between the symbol index (HIR) and
//! whatever editor front end sits on top. Each function answers one kind of
//! editor request.
//!
//! ## Design Principles
//!
//! 1. **Pure functions**: take a snapshot in, return data out
//! 2. **No editor types**: plain Rust types, converted at the boundary
//! 3. **Composable**: built on [`Resolver`](crate::hir::Resolver) queries
//!
//! ## Usage
//!
//! The recommended way to use this module is through `AnalysisHost`:
//!
//! ```ignore
//! use odex::ide::AnalysisHost;
//!
//! let host = AnalysisHost::new();
//! host.update_file(Path::new("/work/app/main.odin"), "package app\n");
//!
//! let analysis = host.analysis();
//! let items = analysis.completions_at(Path::new("/work/app/main.odin"), text, offset);
//! ```

mod analysis;
mod completion;
pub mod context;
mod goto;
mod hover;

pub use analysis::{Analysis, AnalysisHost};
pub use completion::{
    CompletionCache, CompletionContext, CompletionItem, CompletionKind, candidates, complete,
};
pub use context::{CompletionRequest, classify, word_at};
pub use goto::{GotoResult, GotoTarget, definitions_of, goto_definition};
pub use hover::{HoverResult, describe, hover};
