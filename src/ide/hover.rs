//! Hover: a short description of the declaration a name refers to.

use std::fmt;
use std::sync::Arc;

use super::goto::{GotoResult, goto_definition};
use crate::hir::{Scope, Snapshot, Symbol, SymbolKind};

/// Members listed before the list is cut short.
const MAX_MEMBERS: usize = 15;

/// What a hover popup shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HoverResult {
    /// The declaration header, e.g. `Clip :: enum u32`.
    pub signature: Arc<str>,
    /// `name: type` per struct field, or one entry per enum variant. Ends
    /// with `... (N total)` when there were more than fit.
    pub members: Vec<String>,
    /// `package · file.odin:line`, with a 1-based line.
    pub location: String,
    pub symbol: Arc<Symbol>,
}

impl fmt::Display for HoverResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.signature)?;
        match self.symbol.kind {
            SymbolKind::Enum if !self.members.is_empty() => writeln!(f, "{}", self.members.join(", "))?,
            _ => {
                for member in &self.members {
                    writeln!(f, "  {member}")?;
                }
            }
        }
        write!(f, "{}", self.location)
    }
}

/// Hover for `name` (or `alias.name`) as written in `scope`'s file.
///
/// Uses the same candidate order as go-to-definition and describes the
/// first candidate.
pub fn hover(snapshot: &Snapshot, scope: &Scope, name: &str) -> Option<HoverResult> {
    let symbol = match goto_definition(snapshot, scope, name) {
        GotoResult::Direct(target) => target.symbol,
        GotoResult::Ambiguous(targets) => targets.into_iter().next()?.symbol,
        GotoResult::NotFound => return None,
    };
    Some(describe(snapshot, symbol))
}

/// Build the hover text for a known symbol.
pub fn describe(snapshot: &Snapshot, symbol: Arc<Symbol>) -> HoverResult {
    let signature = if symbol.signature.is_empty() {
        Arc::from(format!("{} :: {}", symbol.name, symbol.kind))
    } else {
        symbol.signature.clone()
    };

    let members = match symbol.kind {
        SymbolKind::Struct => truncated(symbol.fields().iter().map(|f| format!("{}: {}", f.name, f.ty))),
        SymbolKind::Enum => truncated(symbol.variants().iter().map(|v| v.to_string())),
        _ => Vec::new(),
    };

    let package = snapshot
        .package_of(&symbol.file)
        .map(|p| p.name().to_string())
        .or_else(|| {
            symbol
                .package_dir()
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .unwrap_or_default();
    let file = symbol
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let location = format!("{package} · {file}:{}", symbol.pos.line_one_indexed());

    HoverResult {
        signature,
        members,
        location,
        symbol,
    }
}

fn truncated(items: impl ExactSizeIterator<Item = String>) -> Vec<String> {
    let total = items.len();
    let mut shown: Vec<String> = items.take(MAX_MEMBERS).collect();
    if total > MAX_MEMBERS {
        shown.push(format!("... ({total} total)"));
    }
    shown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::Index;
    use crate::project::IndexConfig;
    use std::path::Path;

    fn index_with(text: &str) -> Index {
        let index = Index::with_config(IndexConfig::default().with_imported_collections(false));
        index.update_file(Path::new("/mem/app/shapes.odin"), text);
        index
    }

    fn scope() -> Scope {
        Scope::file(Path::new("/mem/app/shapes.odin"))
    }

    #[test]
    fn test_hover_struct_fields_and_location() {
        let index = index_with("package app\n\nRect :: struct {\n\tx, y: i32,\n\tusing base: Base,\n}\n");
        let result = hover(&index.snapshot(), &scope(), "Rect").unwrap();

        assert_eq!(&*result.signature, "Rect :: struct");
        assert_eq!(result.members, vec!["x: i32", "y: i32", "base: Base"]);
        assert_eq!(result.location, "app · shapes.odin:3");
    }

    #[test]
    fn test_hover_long_enum_is_cut_short() {
        let variants: Vec<String> = (0..20).map(|i| format!("V{i}")).collect();
        let text = format!("package app\nBig :: enum {{ {} }}\n", variants.join(", "));
        let index = index_with(&text);
        let result = hover(&index.snapshot(), &scope(), "Big").unwrap();

        assert_eq!(result.members.len(), MAX_MEMBERS + 1);
        assert_eq!(result.members[0], "V0");
        assert_eq!(result.members.last().map(String::as_str), Some("... (20 total)"));
        assert!(result.to_string().contains("V0, V1"));
    }

    #[test]
    fn test_hover_unknown_name() {
        let index = index_with("package app\n");
        assert!(hover(&index.snapshot(), &scope(), "Nope").is_none());
    }
}
