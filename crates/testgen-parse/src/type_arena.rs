// crates/testgen-parse/src/type_arena.rs
// ============================================================================
// Module: Named Type Arena
// Description: Assigns stable integer handles to named types discovered
//              during parsing, so `Schema::Ref` can point at them.
// Purpose: Shared between the dynamic-source and typed-source parsers, both
//          of which resolve enum-class/model-class names to `Schema::Ref`.
// Dependencies: testgen-core, indexmap
// ============================================================================

use indexmap::IndexMap;
use indexmap::IndexSet;
use testgen_core::TypeDecl;
use testgen_core::TypeDeclKind;

use crate::error::ParseError;
use crate::error::ParseErrorKind;

/// Accumulates named type declarations and hands out stable handles.
///
/// Names are registered before their bodies are resolved (a first pass over
/// the input's type section), which is what lets later-declared types
/// reference earlier ones and vice versa without forward-declaration
/// ceremony. Only `Alias` bodies are expanded eagerly enough to need cycle
/// detection; `Object` and `Enum` bodies are self-contained once their own
/// fields are resolved, so a type that merely *contains* a `Ref` to itself
/// (a recursive structure) is not a cycle in the sense this arena rejects.
#[derive(Debug, Default)]
pub struct TypeArena {
    names: IndexMap<String, usize>,
    decls: Vec<TypeDecl>,
    resolving_aliases: IndexSet<String>,
}

impl TypeArena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a handle for `name`, registering a placeholder body. Returns
    /// the existing handle if `name` was already reserved.
    pub fn reserve(&mut self, name: &str) -> usize {
        if let Some(&index) = self.names.get(name) {
            return index;
        }
        let index = self.decls.len();
        self.decls.push(TypeDecl { name: name.to_string(), kind: TypeDeclKind::Alias(testgen_core::Schema::Any) });
        self.names.insert(name.to_string(), index);
        index
    }

    /// Looks up the handle for a previously reserved name.
    ///
    /// # Errors
    ///
    /// Returns [`ParseErrorKind::UnresolvedReference`] when `name` was never
    /// reserved.
    pub fn handle(&self, name: &str, path: &str) -> Result<usize, ParseError> {
        self.names.get(name).copied().ok_or_else(|| {
            ParseError::new(path, ParseErrorKind::UnresolvedReference, format!("unknown type reference '{name}'"))
        })
    }

    /// Fills in the body for a previously reserved name.
    pub fn define(&mut self, name: &str, kind: TypeDeclKind) {
        let index = self.reserve(name);
        self.decls[index] = TypeDecl { name: name.to_string(), kind };
    }

    /// Marks `name` as currently having its alias body resolved, running
    /// `body`, and clearing the mark afterward.
    ///
    /// # Errors
    ///
    /// Returns [`ParseErrorKind::UnsupportedFeature`] if `name` is already
    /// being resolved (an alias cycle).
    pub fn with_alias_guard<T>(
        &mut self,
        name: &str,
        path: &str,
        body: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if !self.resolving_aliases.insert(name.to_string()) {
            return Err(ParseError::new(
                path,
                ParseErrorKind::UnsupportedFeature,
                format!("cyclic type alias involving '{name}'"),
            ));
        }
        let result = body(self);
        self.resolving_aliases.shift_remove(name);
        result
    }

    /// Consumes the arena, returning the declarations in registration order.
    #[must_use]
    pub fn into_decls(self) -> Vec<TypeDecl> {
        self.decls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserving_the_same_name_twice_returns_the_same_handle() {
        let mut arena = TypeArena::new();
        let first = arena.reserve("Status");
        let second = arena.reserve("Status");
        assert_eq!(first, second);
    }

    #[test]
    fn nested_alias_guard_is_rejected() {
        let mut arena = TypeArena::new();
        arena.reserve("A");
        let result = arena.with_alias_guard("A", "/types/A", |inner| {
            inner.with_alias_guard("A", "/types/A", |_| Ok(()))
        });
        assert!(matches!(result, Err(ParseError { kind: ParseErrorKind::UnsupportedFeature, .. })));
    }
}
