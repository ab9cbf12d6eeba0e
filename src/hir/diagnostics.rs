//! Diagnostics: recorded, non-fatal problems.
//!
//! Indexing never fails as a whole. Files that cannot be read, imports that
//! point nowhere and a missing language root are recorded here instead, so
//! an editor can surface them while every query keeps working.

use std::path::Path;
use std::sync::Arc;

use super::symbols::{Import, ImportSource};
use crate::base::LineCol;

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

/// A diagnostic message with location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// The file (or directory, for project-level problems) concerned.
    pub file: Arc<Path>,
    pub pos: LineCol,
    pub severity: Severity,
    /// Error/warning code (e.g., "W0101").
    pub code: Option<Arc<str>>,
    pub message: Arc<str>,
}

impl Diagnostic {
    pub fn error(file: impl Into<Arc<Path>>, pos: LineCol, message: impl Into<Arc<str>>) -> Self {
        Self::new(file, pos, Severity::Error, message)
    }

    pub fn warning(file: impl Into<Arc<Path>>, pos: LineCol, message: impl Into<Arc<str>>) -> Self {
        Self::new(file, pos, Severity::Warning, message)
    }

    fn new(
        file: impl Into<Arc<Path>>,
        pos: LineCol,
        severity: Severity,
        message: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            file: file.into(),
            pos,
            severity,
            code: None,
            message: message.into(),
        }
    }

    /// Set the error code.
    pub fn with_code(mut self, code: impl Into<Arc<str>>) -> Self {
        self.code = Some(code.into());
        self
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Standard diagnostic codes.
pub mod codes {
    /// A source file could not be read.
    pub const READ_FAILED: &str = "E0101";
    /// An import does not point at an existing package directory.
    pub const UNRESOLVED_IMPORT: &str = "W0101";
    /// No language root was found, so collection imports cannot resolve.
    pub const ROOT_NOT_FOUND: &str = "W0102";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics during a load pass.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Record a file that could not be read.
    pub fn read_failed(&mut self, path: &Path, reason: impl std::fmt::Display) {
        self.add(
            Diagnostic::error(path, LineCol::default(), format!("cannot read file: {reason}"))
                .with_code(codes::READ_FAILED),
        );
    }

    /// Record an import with no directory behind it.
    pub fn unresolved_import(&mut self, file: &Arc<Path>, import: &Import) {
        let what = match &import.source {
            ImportSource::Collection { .. } => "package",
            ImportSource::Relative(_) => "directory",
        };
        self.add(
            Diagnostic::warning(
                file.clone(),
                import.pos,
                format!(
                    "unresolved import '{}': {what} not found",
                    import.source.specifier()
                ),
            )
            .with_code(codes::UNRESOLVED_IMPORT),
        );
    }

    /// Record a project with no language root above it.
    pub fn root_not_found(&mut self, project_root: &Path) {
        self.add(
            Diagnostic::warning(
                project_root,
                LineCol::default(),
                "language root not found: collection imports will not resolve",
            )
            .with_code(codes::ROOT_NOT_FOUND),
        );
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Take all diagnostics, leaving the collector empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}
