//! The symbol model: declarations and imports extracted from one file.
//!
//! These are plain data. The parser produces them, the index owns them
//! (behind `Arc`, so a symbol never changes after creation), and every query
//! layer reads them.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::base::LineCol;

/// The kind of a declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolKind {
    Procedure,
    Struct,
    Enum,
    Union,
    Constant,
    TypeAlias,
    Variable,
}

impl SymbolKind {
    /// Check if this kind names a type.
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            SymbolKind::Struct | SymbolKind::Enum | SymbolKind::Union | SymbolKind::TypeAlias
        )
    }

    pub fn display(&self) -> &'static str {
        match self {
            SymbolKind::Procedure => "proc",
            SymbolKind::Struct => "struct",
            SymbolKind::Enum => "enum",
            SymbolKind::Union => "union",
            SymbolKind::Constant => "const",
            SymbolKind::TypeAlias => "type",
            SymbolKind::Variable => "var",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}

/// A procedure parameter. `ty` is empty when only a default value was given.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Param {
    pub name: Arc<str>,
    pub ty: Arc<str>,
}

impl Param {
    /// A `..T` parameter absorbs every argument from its position on.
    pub fn is_variadic(&self) -> bool {
        self.ty.starts_with("..")
    }
}

/// A struct field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: Arc<str>,
    pub ty: Arc<str>,
    /// Declared with `using`: the field's own fields are promoted.
    pub embedded: bool,
}

/// Procedure header details.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ProcSignature {
    pub params: Vec<Param>,
    /// Empty when the procedure returns nothing.
    pub return_type: Arc<str>,
    /// Calling convention string, e.g. `"c"` or `"contextless"`.
    pub calling_convention: Option<Arc<str>>,
    /// Directives before `proc`, e.g. `#force_inline`.
    pub directives: Vec<Arc<str>>,
}

impl ProcSignature {
    /// Declared type of the parameter receiving argument `index`.
    pub fn param_type(&self, index: usize) -> Option<&str> {
        match self.params.get(index) {
            Some(param) => Some(param.ty.trim_start_matches("..")),
            None => self
                .params
                .last()
                .filter(|p| p.is_variadic())
                .map(|p| p.ty.trim_start_matches("..")),
        }
    }
}

/// Kind-specific payload of a symbol.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SymbolData {
    Procedure(ProcSignature),
    /// `name :: proc{a, b}`: the ordered member names.
    ProcGroup(Vec<Arc<str>>),
    Struct(Vec<Field>),
    Enum {
        variants: Vec<Arc<str>>,
        backing_type: Option<Arc<str>>,
    },
    /// Union members, alias target, constant value or variable type/value.
    Value(Arc<str>),
}

/// A named declaration site.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    pub name: Arc<str>,
    pub kind: SymbolKind,
    /// Display form of the declaration header, e.g. `Clip :: enum u32`.
    pub signature: Arc<str>,
    pub file: Arc<Path>,
    pub pos: LineCol,
    /// `@(...)` attributes attached to the declaration, without the `@`.
    pub attributes: Vec<Arc<str>>,
    pub is_private: bool,
    pub data: SymbolData,
}

impl Symbol {
    pub fn proc_signature(&self) -> Option<&ProcSignature> {
        match &self.data {
            SymbolData::Procedure(sig) => Some(sig),
            _ => None,
        }
    }

    pub fn fields(&self) -> &[Field] {
        match &self.data {
            SymbolData::Struct(fields) => fields,
            _ => &[],
        }
    }

    pub fn variants(&self) -> &[Arc<str>] {
        match &self.data {
            SymbolData::Enum { variants, .. } => variants,
            _ => &[],
        }
    }

    pub fn group_members(&self) -> &[Arc<str>] {
        match &self.data {
            SymbolData::ProcGroup(members) => members,
            _ => &[],
        }
    }

    /// The associated type-or-value string for unions, aliases, constants
    /// and variables.
    pub fn value(&self) -> Option<&str> {
        match &self.data {
            SymbolData::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Directory of the package declaring this symbol.
    pub fn package_dir(&self) -> &Path {
        self.file.parent().unwrap_or(Path::new(""))
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {} @ {}:{}",
            self.kind,
            self.name,
            self.file.display(),
            self.pos
        )
    }
}

/// Where an import points before it is resolved.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ImportSource {
    /// `"core:fmt"`, `"vendor:raylib"`, or a custom collection.
    Collection { collection: Arc<str>, path: Arc<str> },
    /// `"../jui"`, relative to the importing file's directory.
    Relative(Arc<str>),
}

impl ImportSource {
    /// The specifier as written between the quotes.
    pub fn specifier(&self) -> String {
        match self {
            ImportSource::Collection { collection, path } => format!("{collection}:{path}"),
            ImportSource::Relative(path) => path.to_string(),
        }
    }

    fn path(&self) -> &str {
        match self {
            ImportSource::Collection { path, .. } => path,
            ImportSource::Relative(path) => path,
        }
    }
}

/// One import statement.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Import {
    pub alias: Arc<str>,
    pub source: ImportSource,
    /// Absolute package directory, once the index has located it.
    pub resolved: Option<Arc<Path>>,
    pub pos: LineCol,
}

impl Import {
    pub fn new(alias: Option<&str>, source: ImportSource, pos: LineCol) -> Self {
        let alias = match alias {
            Some(alias) => Arc::from(alias),
            None => Arc::from(default_alias(source.path())),
        };
        Self {
            alias,
            source,
            resolved: None,
            pos,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }
}

/// Last segment of an import path: `math/linalg` → `linalg`.
fn default_alias(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}
