//! Name resolution: names and type chains to declarations.
//!
//! This is best-effort, name-based resolution against the nearest textual
//! type annotation. There is no type checker behind it: a type string such
//! as `^rl.Rectangle` is looked up by name in the scope of the declaration
//! that wrote it, and that is all.
//!
//! # Lookup order
//!
//! An unqualified name is looked up in the scope's own package first, then
//! in the packages the scope file imports, in import order. `alias.Name`
//! goes straight to the package bound to `alias` in that file.
//!
//! Type names found while walking a chain are always resolved in the scope
//! of the symbol that wrote them, so `using base: core_ui.Widget` inside a
//! struct from another package resolves through that package's imports.

use std::path::Path;
use std::sync::Arc;

use rustc_hash::FxHashSet;

use super::index::Snapshot;
use super::package::Package;
use super::symbols::{Field, Symbol, SymbolData, SymbolKind};
use crate::syntax::bit_set_element;

/// Bound on alias-to-alias hops.
const MAX_ALIAS_DEPTH: usize = 16;

// ============================================================================
// SCOPE
// ============================================================================

/// The place a lookup happens from: one file, which fixes both the package
/// and the set of imports in effect.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Scope {
    file: Arc<Path>,
}

impl Scope {
    pub fn file(path: impl Into<Arc<Path>>) -> Self {
        Self { file: path.into() }
    }

    /// The scope a symbol was declared in.
    pub fn of(symbol: &Symbol) -> Self {
        Self {
            file: symbol.file.clone(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    pub fn package_dir(&self) -> &Path {
        self.file.parent().unwrap_or(Path::new(""))
    }
}

// ============================================================================
// RESOLUTION RESULT
// ============================================================================

/// Result of resolving a reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveResult {
    /// Successfully resolved to a single symbol.
    Found(Arc<Symbol>),
    /// Several candidates, in lookup order.
    Ambiguous(Vec<Arc<Symbol>>),
    NotFound,
}

impl ResolveResult {
    fn from_candidates(mut candidates: Vec<Arc<Symbol>>) -> Self {
        match candidates.len() {
            0 => ResolveResult::NotFound,
            1 => ResolveResult::Found(candidates.remove(0)),
            _ => ResolveResult::Ambiguous(candidates),
        }
    }

    /// Get the resolved symbol if unambiguous.
    pub fn symbol(&self) -> Option<&Arc<Symbol>> {
        match self {
            ResolveResult::Found(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, ResolveResult::Found(_))
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, ResolveResult::Ambiguous(_))
    }

    /// All candidates, best first.
    pub fn into_candidates(self) -> Vec<Arc<Symbol>> {
        match self {
            ResolveResult::Found(s) => vec![s],
            ResolveResult::Ambiguous(all) => all,
            ResolveResult::NotFound => Vec::new(),
        }
    }
}

/// Where a field chain ends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChainTarget {
    /// Empty chain: the base type itself.
    Type(Arc<Symbol>),
    /// The last field, and the struct that declares it (which may be an
    /// embedded struct rather than the one the chain walked through).
    Field { owner: Arc<Symbol>, field: Field },
}

/// A position that expects an enum value, for `.VARIANT` completion.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EnumContext {
    /// Argument `index` of a known procedure (or procedure group).
    Argument { procedure: Arc<Symbol>, index: usize },
    /// Argument `index` of a call to `callee` (`name` or `alias.name`).
    Call { callee: Arc<str>, index: usize },
    /// `x: T = .`
    Declaration { declared_type: Arc<str> },
    /// `x == .` / `x != .`, with `x`'s declared type.
    Comparison { operand_type: Arc<str> },
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Resolver for lookups from one [`Scope`] against one [`Snapshot`].
#[derive(Clone, Debug)]
pub struct Resolver<'a> {
    snapshot: &'a Snapshot,
    scope: Scope,
}

impl<'a> Resolver<'a> {
    pub fn new(snapshot: &'a Snapshot, scope: Scope) -> Self {
        Self { snapshot, scope }
    }

    /// Same snapshot, another scope.
    pub fn with_scope(&self, scope: Scope) -> Self {
        Self {
            snapshot: self.snapshot,
            scope,
        }
    }

    /// A resolver for the scope `symbol` was declared in.
    fn rescoped(&self, symbol: &Symbol) -> Self {
        if *symbol.file == *self.scope.file {
            return self.clone();
        }
        self.with_scope(Scope::of(symbol))
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn snapshot(&self) -> &'a Snapshot {
        self.snapshot
    }

    pub fn own_package(&self) -> Option<&'a Arc<Package>> {
        self.snapshot.package(self.scope.package_dir())
    }

    /// The package bound to `alias` in the scope file.
    pub fn package_for_alias(&self, alias: &str) -> Option<&'a Arc<Package>> {
        self.snapshot.resolve_alias(self.scope.path(), alias)
    }

    /// Resolved packages imported by the scope file, in import order.
    pub fn imported_packages(&self) -> Vec<&'a Arc<Package>> {
        let own = self.scope.package_dir();
        let mut seen: FxHashSet<&Path> = FxHashSet::default();
        let mut packages = Vec::new();
        for import in self.snapshot.imports_of(self.scope.path()) {
            if let Some(package) = self.snapshot.resolve_import(import) {
                if &**package.path() != own && seen.insert(&**package.path()) {
                    packages.push(package);
                }
            }
        }
        packages
    }

    /// Every declaration `name` may refer to, best first.
    pub fn candidates(&self, name: &str) -> Vec<Arc<Symbol>> {
        if let Some((alias, member)) = name.split_once('.') {
            return self
                .package_for_alias(alias)
                .map(|package| package.lookup(member).to_vec())
                .unwrap_or_default();
        }

        let mut found: Vec<Arc<Symbol>> = self
            .own_package()
            .map(|package| package.lookup(name).to_vec())
            .unwrap_or_default();
        for package in self.imported_packages() {
            found.extend(package.lookup(name).iter().cloned());
        }
        found
    }

    /// Resolve a name (`name` or `alias.name`).
    pub fn resolve(&self, name: &str) -> ResolveResult {
        ResolveResult::from_candidates(self.candidates(name))
    }

    // ------------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------------

    /// The type declaration a type string names.
    ///
    /// One leading `^`, a `distinct` prefix and generic arguments are
    /// ignored. Only type-kind symbols are returned; there is no fallback to
    /// packages the scope file does not import.
    pub fn lookup_type(&self, ty: &str) -> Option<Arc<Symbol>> {
        let name = type_name(ty)?;
        let first_type = |symbols: &[Arc<Symbol>]| symbols.iter().find(|s| s.kind.is_type()).cloned();

        if let Some((alias, member)) = name.split_once('.') {
            return first_type(self.package_for_alias(alias)?.lookup(member));
        }
        if let Some(found) = self.own_package().and_then(|p| first_type(p.lookup(name))) {
            return Some(found);
        }
        self.imported_packages()
            .into_iter()
            .find_map(|package| first_type(package.lookup(name)))
    }

    /// Follow `Alias :: Other` / `Alias :: distinct Other` declarations to
    /// the first non-alias type. Stops at the last alias it could resolve.
    pub fn follow_aliases(&self, symbol: Arc<Symbol>) -> Arc<Symbol> {
        let mut current = symbol;
        for _ in 0..MAX_ALIAS_DEPTH {
            if current.kind != SymbolKind::TypeAlias {
                break;
            }
            let Some(target) = current.value() else { break };
            match self.rescoped(&current).lookup_type(target) {
                Some(next) if !Arc::ptr_eq(&next, &current) => current = next,
                _ => break,
            }
        }
        current
    }

    /// The struct a type string names, through aliases.
    pub fn struct_for_type(&self, ty: &str) -> Option<Arc<Symbol>> {
        let found = self.lookup_type(ty)?;
        let resolved = self.rescoped(&found).follow_aliases(found);
        (resolved.kind == SymbolKind::Struct).then_some(resolved)
    }

    /// The declared type of a field, as a symbol, resolved in the owning
    /// struct's scope.
    pub fn field_type(&self, owner: &Symbol, field: &Field) -> Option<Arc<Symbol>> {
        let scoped = self.rescoped(owner);
        let found = scoped.lookup_type(&field.ty)?;
        Some(scoped.rescoped(&found).follow_aliases(found))
    }

    // ------------------------------------------------------------------------
    // Fields
    // ------------------------------------------------------------------------

    /// Find `name` among `structure`'s fields or, breadth-first, among the
    /// fields of its embedded (`using`) structs. Returns the field and the
    /// struct declaring it. Cycles are cut by a visited set.
    pub fn find_field(&self, structure: &Arc<Symbol>, name: &str) -> Option<(Field, Arc<Symbol>)> {
        self.walk_fields(structure, |field, owner| {
            (&*field.name == name).then(|| (field.clone(), owner.clone()))
        })
    }

    /// All fields visible on `structure`, promoted ones included. The first
    /// field with a given name wins.
    pub fn all_fields(&self, structure: &Arc<Symbol>) -> Vec<(Field, Arc<Symbol>)> {
        let mut seen: FxHashSet<Arc<str>> = FxHashSet::default();
        let mut out = Vec::new();
        self.walk_fields::<()>(structure, |field, owner| {
            if seen.insert(field.name.clone()) {
                out.push((field.clone(), owner.clone()));
            }
            None
        });
        out
    }

    /// Breadth-first walk over a struct's fields and its embedded structs'
    /// fields, stopping at the first `Some` from `visit`.
    fn walk_fields<T>(
        &self,
        structure: &Arc<Symbol>,
        mut visit: impl FnMut(&Field, &Arc<Symbol>) -> Option<T>,
    ) -> Option<T> {
        let mut visited: FxHashSet<*const Symbol> = FxHashSet::default();
        let mut queue = std::collections::VecDeque::from([structure.clone()]);

        while let Some(current) = queue.pop_front() {
            if current.kind != SymbolKind::Struct || !visited.insert(Arc::as_ptr(&current)) {
                continue;
            }
            for field in current.fields() {
                if let Some(found) = visit(field, &current) {
                    return Some(found);
                }
            }
            for field in current.fields().iter().filter(|f| f.embedded) {
                if let Some(embedded) = self.field_type(&current, field) {
                    queue.push_back(embedded);
                }
            }
        }
        None
    }

    /// Walk `path` from `base_type` through struct fields.
    ///
    /// `Shape` + `["r", "x"]` and `Shape` + `["x"]` end at the same field
    /// when `Shape` has `using r: Rect`. An empty path gives the base type.
    pub fn resolve_type_chain(&self, base_type: &str, path: &[&str]) -> Option<ChainTarget> {
        let base = self.lookup_type(base_type)?;
        let mut current = self.rescoped(&base).follow_aliases(base);

        let Some((last, init)) = path.split_last() else {
            return Some(ChainTarget::Type(current));
        };
        for segment in init {
            let (field, owner) = self.find_field(&current, segment)?;
            current = self.field_type(&owner, &field)?;
        }
        let (field, owner) = self.find_field(&current, last)?;
        Some(ChainTarget::Field { owner, field })
    }

    /// The type symbol a chain ends in: the base type itself, or the
    /// declared type of the last field.
    pub fn chain_type(&self, target: &ChainTarget) -> Option<Arc<Symbol>> {
        match target {
            ChainTarget::Type(symbol) => Some(symbol.clone()),
            ChainTarget::Field { owner, field } => self.field_type(owner, field),
        }
    }

    // ------------------------------------------------------------------------
    // Enums
    // ------------------------------------------------------------------------

    /// The enum a type string denotes: an enum directly, through aliases, or
    /// as the element of a `bit_set[E]` / `distinct bit_set[E]`.
    pub fn enum_for_type(&self, ty: &str) -> Option<Arc<Symbol>> {
        if let Some(element) = bit_set_element(ty) {
            return self.enum_for_type(element);
        }
        let mut current = self.lookup_type(ty)?;
        for _ in 0..MAX_ALIAS_DEPTH {
            match current.kind {
                SymbolKind::Enum => return Some(current),
                SymbolKind::TypeAlias => {
                    let scoped = self.rescoped(&current);
                    let target = current.value()?;
                    if let Some(element) = bit_set_element(target) {
                        return scoped.enum_for_type(element);
                    }
                    let next = scoped.lookup_type(target)?;
                    if Arc::ptr_eq(&next, &current) {
                        return None;
                    }
                    current = next;
                }
                _ => return None,
            }
        }
        None
    }

    /// The enum expected at a position.
    pub fn enum_for_context(&self, context: &EnumContext) -> Option<Arc<Symbol>> {
        match context {
            EnumContext::Argument { procedure, index } => self.enum_for_argument(procedure, *index, 0),
            EnumContext::Call { callee, index } => self
                .candidates(callee)
                .iter()
                .filter(|s| s.kind == SymbolKind::Procedure)
                .find_map(|procedure| self.enum_for_argument(procedure, *index, 0)),
            EnumContext::Declaration { declared_type } => self.enum_for_type(declared_type),
            EnumContext::Comparison { operand_type } => self.enum_for_type(operand_type),
        }
    }

    fn enum_for_argument(&self, procedure: &Arc<Symbol>, index: usize, depth: usize) -> Option<Arc<Symbol>> {
        let scoped = self.rescoped(procedure);
        match &procedure.data {
            SymbolData::Procedure(signature) => scoped.enum_for_type(signature.param_type(index)?),
            // Members in declaration order; the first that takes an enum here wins.
            SymbolData::ProcGroup(members) if depth < MAX_ALIAS_DEPTH => members.iter().find_map(|member| {
                scoped
                    .candidates(member)
                    .iter()
                    .filter(|s| s.kind == SymbolKind::Procedure)
                    .find_map(|s| scoped.enum_for_argument(s, index, depth + 1))
            }),
            _ => None,
        }
    }
}

/// The name part of a type string: `^pkg.Node(int)` → `pkg.Node`.
fn type_name(ty: &str) -> Option<&str> {
    let mut ty = ty.trim();
    ty = ty.strip_prefix('^').unwrap_or(ty).trim_start();
    if let Some(rest) = ty.strip_prefix("distinct") {
        if rest.starts_with(char::is_whitespace) {
            ty = rest.trim_start();
        }
    }
    let end = ty
        .find(|c: char| !(c == '_' || c == '.' || unicode_ident::is_xid_continue(c)))
        .unwrap_or(ty.len());
    let name = ty[..end].trim_end_matches('.');
    (!name.is_empty()).then_some(name)
}
