//! Foundation types shared by every layer.
//!
//! - [`LineCol`] - declaration sites and cursor positions
//! - [`LineIndex`] - byte offset ⟷ line/column conversion
//! - [`TextSize`], [`TextRange`] - byte offsets into source text
//!
//! This module has NO dependencies on other odex modules.

mod span;

pub use span::{LineCol, LineIndex, TextRange, TextSize};

// Re-export text-size types for convenience
pub use text_size;
