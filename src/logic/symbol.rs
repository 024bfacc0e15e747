//! Symbol interning and the problem signature
//!
//! Function, predicate, and type-constructor symbols are interned into a
//! single `Signature` arena and referenced by `SymbolId`. IDs are `Copy`,
//! compare in O(1), and index directly into the arena. The signature grows
//! monotonically; symbols are never removed.

use super::ty::TypeId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// ID of an interned symbol
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub(crate) u32);

impl SymbolId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

impl Serialize for SymbolId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SymbolId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u32::deserialize(deserializer).map(SymbolId)
    }
}

/// Attributes attached to a symbol at interning time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SymbolAttrs {
    /// Builtin symbols ($true, $false, type constructors) never gain
    /// precedence from frequency counting
    pub builtin: bool,
    /// Skolem symbols introduced by the preprocessor
    pub skolem: bool,
}

/// An interned symbol: name, arity, type, attributes
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub arity: usize,
    pub ty: TypeId,
    pub attrs: SymbolAttrs,
    /// Occurrence count in the input problem, feeds precedence generation
    pub occurrences: u64,
}

/// The problem signature: an arena of interned symbols with name lookup
#[derive(Debug, Clone, Default)]
pub struct Signature {
    symbols: Vec<Symbol>,
    lookup: HashMap<String, SymbolId>,
}

impl Signature {
    pub fn new() -> Self {
        Signature {
            symbols: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    /// Intern a symbol, returning its ID (get-or-create). Re-interning an
    /// existing name returns the original ID; arity and type must agree.
    pub fn intern(&mut self, name: &str, arity: usize, ty: TypeId) -> SymbolId {
        self.intern_with_attrs(name, arity, ty, SymbolAttrs::default())
    }

    pub fn intern_with_attrs(
        &mut self,
        name: &str,
        arity: usize,
        ty: TypeId,
        attrs: SymbolAttrs,
    ) -> SymbolId {
        if let Some(&id) = self.lookup.get(name) {
            debug_assert_eq!(self.symbols[id.0 as usize].arity, arity);
            return id;
        }
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol {
            name: name.to_string(),
            arity,
            ty,
            attrs,
            occurrences: 0,
        });
        self.lookup.insert(name.to_string(), id);
        id
    }

    /// Get the ID for an already-interned name
    pub fn get(&self, name: &str) -> Option<SymbolId> {
        self.lookup.get(name).copied()
    }

    pub fn name(&self, id: SymbolId) -> &str {
        &self.symbols[id.0 as usize].name
    }

    pub fn arity(&self, id: SymbolId) -> usize {
        self.symbols[id.0 as usize].arity
    }

    pub fn ty(&self, id: SymbolId) -> TypeId {
        self.symbols[id.0 as usize].ty
    }

    pub fn attrs(&self, id: SymbolId) -> SymbolAttrs {
        self.symbols[id.0 as usize].attrs
    }

    pub fn occurrences(&self, id: SymbolId) -> u64 {
        self.symbols[id.0 as usize].occurrences
    }

    /// Bump the occurrence count of a symbol (called by the frontend)
    pub fn record_occurrence(&mut self, id: SymbolId) {
        self.symbols[id.0 as usize].occurrences += 1;
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Iterate over all interned symbol IDs
    pub fn ids(&self) -> impl Iterator<Item = SymbolId> {
        (0..self.symbols.len() as u32).map(SymbolId)
    }
}
