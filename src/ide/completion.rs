//! Completion: candidate names for a cursor context.
//!
//! [`complete`] builds the full candidate list for a [`CompletionContext`],
//! sorted by kind and then label, and filters it by the typed prefix. The
//! unfiltered lists are what [`CompletionCache`] keeps between keystrokes.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use tracing::debug;

use crate::hir::{EnumContext, Resolver, Scope, Symbol, SymbolData, SymbolKind};

/// Longest annotation shown for constants, variables and aliases.
const MAX_DETAIL_LEN: usize = 60;

/// Kind of a completion item. Declaration order is display priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CompletionKind {
    Field,
    Variant,
    Variable,
    Constant,
    Procedure,
    Struct,
    Enum,
    Union,
    TypeAlias,
    Package,
}

impl From<SymbolKind> for CompletionKind {
    fn from(kind: SymbolKind) -> Self {
        match kind {
            SymbolKind::Procedure => CompletionKind::Procedure,
            SymbolKind::Struct => CompletionKind::Struct,
            SymbolKind::Enum => CompletionKind::Enum,
            SymbolKind::Union => CompletionKind::Union,
            SymbolKind::Constant => CompletionKind::Constant,
            SymbolKind::TypeAlias => CompletionKind::TypeAlias,
            SymbolKind::Variable => CompletionKind::Variable,
        }
    }
}

/// A completion suggestion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionItem {
    pub label: SmolStr,
    pub kind: CompletionKind,
    /// Field type, owning enum, parameter list or import specifier.
    pub detail: Option<Arc<str>>,
    /// The declaration behind the item. For fields this is the struct that
    /// declares the field; for variants, the enum.
    pub symbol: Option<Arc<Symbol>>,
}

impl CompletionItem {
    /// Item for a declaration.
    pub fn symbol(symbol: &Arc<Symbol>) -> Self {
        Self {
            label: SmolStr::new(&*symbol.name),
            kind: symbol.kind.into(),
            detail: symbol_detail(symbol).map(Arc::from),
            symbol: Some(symbol.clone()),
        }
    }

    pub fn field(name: &str, ty: &str, owner: &Arc<Symbol>) -> Self {
        Self {
            label: SmolStr::new(name),
            kind: CompletionKind::Field,
            detail: (!ty.is_empty()).then(|| Arc::from(ty)),
            symbol: Some(owner.clone()),
        }
    }

    pub fn variant(name: &str, owner: &Arc<Symbol>) -> Self {
        Self {
            label: SmolStr::new(name),
            kind: CompletionKind::Variant,
            detail: Some(owner.name.clone()),
            symbol: Some(owner.clone()),
        }
    }

    pub fn package(alias: &str, specifier: &str) -> Self {
        Self {
            label: SmolStr::new(alias),
            kind: CompletionKind::Package,
            detail: Some(Arc::from(specifier)),
            symbol: None,
        }
    }

    fn sort_key(&self) -> (CompletionKind, &str) {
        (self.kind, self.label.as_str())
    }
}

/// What kind of name the cursor position wants.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CompletionContext {
    /// A bare identifier: the current package's symbols and the file's
    /// import aliases.
    Unscoped,
    /// `alias.`: the non-private symbols of the aliased package.
    Package { alias: Arc<str> },
    /// `x.a.b.`: fields (or variants) of the type `path` ends in, starting
    /// from `base_type`.
    FieldChain {
        base_type: Arc<str>,
        path: Vec<Arc<str>>,
    },
    /// `Name.`: variants of the enum `enum_type` names.
    EnumVariant { enum_type: Arc<str> },
    /// `.` with nothing before it: variants of the enum the position expects.
    ImplicitEnum(EnumContext),
}

/// Complete `prefix` in `context`, from the resolver's scope.
///
/// The prefix filter is case-sensitive. Results are sorted by kind priority
/// and then by label.
pub fn complete(resolver: &Resolver<'_>, prefix: &str, context: &CompletionContext) -> Vec<CompletionItem> {
    filter_prefix(&candidates(resolver, context), prefix)
}

/// The unfiltered, sorted candidate list for `context`.
pub fn candidates(resolver: &Resolver<'_>, context: &CompletionContext) -> Vec<CompletionItem> {
    let mut items = match context {
        CompletionContext::Unscoped => unscoped(resolver),
        CompletionContext::Package { alias } => package_members(resolver, alias),
        CompletionContext::FieldChain { base_type, path } => field_chain(resolver, base_type, path),
        CompletionContext::EnumVariant { enum_type } => match resolver.enum_for_type(enum_type) {
            Some(enum_symbol) => variants(&enum_symbol),
            None => field_chain(resolver, enum_type, &[]),
        },
        CompletionContext::ImplicitEnum(expected) => resolver
            .enum_for_context(expected)
            .map(|enum_symbol| variants(&enum_symbol))
            .unwrap_or_default(),
    };
    items.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    items.dedup_by(|a, b| a.sort_key() == b.sort_key());
    items
}

pub(crate) fn filter_prefix(items: &[CompletionItem], prefix: &str) -> Vec<CompletionItem> {
    items
        .iter()
        .filter(|item| item.label.starts_with(prefix))
        .cloned()
        .collect()
}

fn unscoped(resolver: &Resolver<'_>) -> Vec<CompletionItem> {
    let mut items: Vec<CompletionItem> = resolver
        .own_package()
        .map(|package| package.symbols().map(CompletionItem::symbol).collect())
        .unwrap_or_default();

    let imports = resolver.snapshot().imports_of(resolver.scope().path());
    let mut aliases: FxHashSet<&str> = FxHashSet::default();
    // Last import with an alias wins, so walk backwards.
    for import in imports.iter().rev() {
        if aliases.insert(&*import.alias) {
            items.push(CompletionItem::package(&import.alias, &import.source.specifier()));
        }
    }
    items
}

fn package_members(resolver: &Resolver<'_>, alias: &str) -> Vec<CompletionItem> {
    let Some(package) = resolver.package_for_alias(alias) else {
        debug!("No package for alias '{}'", alias);
        return Vec::new();
    };
    package
        .symbols()
        .filter(|symbol| !symbol.is_private)
        .map(CompletionItem::symbol)
        .collect()
}

fn field_chain(resolver: &Resolver<'_>, base_type: &str, path: &[Arc<str>]) -> Vec<CompletionItem> {
    let segments: Vec<&str> = path.iter().map(|s| &**s).collect();
    let target = match resolver.resolve_type_chain(base_type, &segments) {
        Some(target) => target,
        None => {
            // `base_type` may be a package-level variable rather than a type.
            let Some(declared) = global_variable_type(resolver, base_type) else {
                return Vec::new();
            };
            match resolver.resolve_type_chain(&declared, &segments) {
                Some(target) => target,
                None => return Vec::new(),
            }
        }
    };
    let Some(ty) = resolver.chain_type(&target) else {
        return Vec::new();
    };
    members_of(resolver, &ty)
}

/// Declared type of a package-level variable `name`.
fn global_variable_type(resolver: &Resolver<'_>, name: &str) -> Option<String> {
    resolver
        .candidates(name)
        .into_iter()
        .filter(|symbol| symbol.kind == SymbolKind::Variable)
        .find_map(|symbol| {
            let declared = symbol.value()?;
            resolver.with_scope(Scope::of(&symbol)).lookup_type(declared)?;
            // Qualify through the variable's own file, which may differ from ours.
            Some(qualify_for(resolver, &symbol, declared))
        })
}

/// `ty` as written in `symbol`'s file, made resolvable from `resolver`'s
/// scope. Only unqualified names declared in another package need help.
fn qualify_for(resolver: &Resolver<'_>, symbol: &Symbol, ty: &str) -> String {
    if symbol.package_dir() == resolver.scope().package_dir() || ty.contains('.') {
        return ty.to_string();
    }
    let imports = resolver.snapshot().imports_of(resolver.scope().path());
    match imports
        .iter()
        .rev()
        .find(|import| import.resolved.as_deref() == Some(symbol.package_dir()))
    {
        Some(import) => format!("{}.{}", import.alias, ty.trim_start_matches('^')),
        None => ty.to_string(),
    }
}

/// Fields of a struct (promoted ones included) or variants of an enum.
fn members_of(resolver: &Resolver<'_>, ty: &Arc<Symbol>) -> Vec<CompletionItem> {
    match ty.kind {
        SymbolKind::Struct => resolver
            .all_fields(ty)
            .iter()
            .map(|(field, owner)| CompletionItem::field(&field.name, &field.ty, owner))
            .collect(),
        SymbolKind::Enum => variants(ty),
        _ => Vec::new(),
    }
}

fn variants(enum_symbol: &Arc<Symbol>) -> Vec<CompletionItem> {
    enum_symbol
        .variants()
        .iter()
        .map(|variant| CompletionItem::variant(variant, enum_symbol))
        .collect()
}

/// Annotation for a declaration item.
fn symbol_detail(symbol: &Symbol) -> Option<String> {
    match &symbol.data {
        SymbolData::Procedure(signature) => {
            let mut detail = String::from("(");
            for (i, param) in signature.params.iter().enumerate() {
                if i > 0 {
                    detail.push_str(", ");
                }
                detail.push_str(&param.name);
                if !param.ty.is_empty() {
                    let _ = write!(detail, ": {}", param.ty);
                }
            }
            detail.push(')');
            if !signature.return_type.is_empty() {
                let _ = write!(detail, " -> {}", signature.return_type);
            }
            Some(detail)
        }
        SymbolData::ProcGroup(_) => Some("proc group".to_string()),
        SymbolData::Struct(_) => Some("struct".to_string()),
        SymbolData::Enum { .. } => Some("enum".to_string()),
        SymbolData::Value(_) => {
            let (_, rhs) = symbol.signature.split_once("::").or_else(|| symbol.signature.split_once(':'))?;
            let rhs = rhs.trim_start_matches(['=', ':']).trim();
            (!rhs.is_empty()).then(|| truncate(rhs, MAX_DETAIL_LEN).to_string())
        }
    }
}

fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

// ============================================================================
// CACHE
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    file: Arc<Path>,
    context: CompletionContext,
}

#[derive(Debug, Default)]
struct CacheState {
    generation: u64,
    entries: FxHashMap<CacheKey, Arc<[CompletionItem]>>,
}

/// Unfiltered candidate lists, keyed by scope file and context and valid
/// for one index generation.
///
/// The first lookup at a newer generation discards every entry.
#[derive(Debug, Default)]
pub struct CompletionCache {
    state: Mutex<CacheState>,
}

impl CompletionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Complete `prefix`, reusing the unfiltered list for this scope and
    /// context when the index has not changed since it was built.
    pub fn complete(
        &self,
        resolver: &Resolver<'_>,
        prefix: &str,
        context: &CompletionContext,
    ) -> Vec<CompletionItem> {
        filter_prefix(&self.candidates(resolver, context), prefix)
    }

    /// The unfiltered candidate list, from the cache when it is current.
    pub fn candidates(&self, resolver: &Resolver<'_>, context: &CompletionContext) -> Arc<[CompletionItem]> {
        let generation = resolver.snapshot().generation();
        let key = CacheKey {
            file: Arc::from(resolver.scope().path()),
            context: context.clone(),
        };

        if let Some(hit) = self.lookup(generation, &key) {
            return hit;
        }
        let computed: Arc<[CompletionItem]> = candidates(resolver, context).into();
        let mut state = self.state.lock();
        // A newer generation may have arrived while we computed.
        if state.generation == generation {
            state.entries.insert(key, computed.clone());
        }
        computed
    }

    fn lookup(&self, generation: u64, key: &CacheKey) -> Option<Arc<[CompletionItem]>> {
        let mut state = self.state.lock();
        if generation < state.generation {
            // A stale snapshot: answer it without touching newer entries.
            return None;
        }
        if generation > state.generation {
            if !state.entries.is_empty() {
                debug!(
                    "Completion cache invalidated (generation {} -> {})",
                    state.generation, generation
                );
            }
            state.entries.clear();
            state.generation = generation;
            return None;
        }
        state.entries.get(key).cloned()
    }

    /// Number of cached lists.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.state.lock().entries.clear();
    }
}
