//! Go-to-definition.

use std::path::Path;
use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::base::LineCol;
use crate::hir::{Package, Resolver, Scope, Snapshot, Symbol};

/// A declaration site to jump to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GotoTarget {
    pub file: Arc<Path>,
    pub pos: LineCol,
    pub symbol: Arc<Symbol>,
}

impl From<&Arc<Symbol>> for GotoTarget {
    fn from(symbol: &Arc<Symbol>) -> Self {
        Self {
            file: symbol.file.clone(),
            pos: symbol.pos,
            symbol: symbol.clone(),
        }
    }
}

/// Result of a go-to-definition request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GotoResult {
    /// One obvious target.
    Direct(GotoTarget),
    /// Several candidates, best first, for the caller to choose from.
    Ambiguous(Vec<GotoTarget>),
    NotFound,
}

impl GotoResult {
    pub fn targets(&self) -> Vec<&GotoTarget> {
        match self {
            GotoResult::Direct(target) => vec![target],
            GotoResult::Ambiguous(targets) => targets.iter().collect(),
            GotoResult::NotFound => Vec::new(),
        }
    }

    pub fn is_found(&self) -> bool {
        !matches!(self, GotoResult::NotFound)
    }
}

/// Every declaration of `name`, seen from the package in `current_package`.
///
/// Ordered current package first, then the packages its files import (in
/// file order, then import order), then every other package in index order.
/// `alias.name` looks only in the package `alias` is bound to by one of the
/// current package's files.
pub fn definitions_of(snapshot: &Snapshot, name: &str, current_package: &Path) -> Vec<Arc<Symbol>> {
    let current = snapshot.package(current_package);

    if let Some((alias, member)) = name.split_once('.') {
        let aliased = current.and_then(|package| {
            let import = package.imports().filter(|i| &*i.alias == alias).last()?;
            snapshot.resolve_import(import)
        });
        return aliased
            .map(|package| package.lookup(member).to_vec())
            .unwrap_or_default();
    }

    let mut seen: FxHashSet<&Path> = FxHashSet::default();
    let mut ordered: Vec<&Arc<Package>> = Vec::new();
    if let Some(package) = current {
        seen.insert(&**package.path());
        ordered.push(package);
        for import in package.imports() {
            if let Some(imported) = snapshot.resolve_import(import) {
                if seen.insert(&**imported.path()) {
                    ordered.push(imported);
                }
            }
        }
    }
    for package in snapshot.packages() {
        if seen.insert(&**package.path()) {
            ordered.push(package);
        }
    }

    ordered
        .into_iter()
        .flat_map(|package| package.lookup(name).iter().cloned())
        .collect()
}

/// Resolve `name` (or `alias.name`) as written in `scope`'s file.
///
/// A name with exactly one declaration in the current package goes straight
/// there even when other packages declare it too.
pub fn goto_definition(snapshot: &Snapshot, scope: &Scope, name: &str) -> GotoResult {
    let candidates = if name.contains('.') {
        // Aliases are per file, so go through the scope file's imports.
        Resolver::new(snapshot, scope.clone()).candidates(name)
    } else {
        let own = snapshot.lookup_in_package(scope.package_dir(), name);
        if let [only] = own {
            return GotoResult::Direct(only.into());
        }
        definitions_of(snapshot, name, scope.package_dir())
    };

    match candidates.as_slice() {
        [] => GotoResult::NotFound,
        [only] => GotoResult::Direct(only.into()),
        all => GotoResult::Ambiguous(all.iter().map(GotoTarget::from).collect()),
    }
}
