//! Core logic types: symbols, types, terms, literals, clauses, substitutions

pub mod clause;
pub mod literal;
pub mod subst;
pub mod symbol;
pub mod term;
pub mod ty;

pub use clause::{Clause, ClauseRole, Trail};
pub use literal::Literal;
pub use subst::{Renaming, ScopedVar, Substitution};
pub use symbol::{Signature, Symbol, SymbolAttrs, SymbolId};
pub use term::{TermBank, TermId, TermNode};
pub use ty::{TypeBank, TypeId, TypeNode};

/// All interning state of one problem: signature, type bank, term bank,
/// and the well-known builtin types and constants.
///
/// There is no global state; the context is created per problem and passed
/// explicitly (tests create a fresh context each).
#[derive(Debug, Clone)]
pub struct LogicContext {
    pub signature: Signature,
    pub types: TypeBank,
    pub terms: TermBank,
    /// Type of individuals (`$i`)
    pub itype: TypeId,
    /// Type of propositions (`$o`)
    pub otype: TypeId,
    /// The constant `$true`
    pub true_: TermId,
    /// The constant `$false`
    pub false_: TermId,
}

impl LogicContext {
    pub fn new() -> Self {
        let mut types = TypeBank::new();
        let ttype = types.ttype();
        let mut signature = Signature::new();
        let builtin = SymbolAttrs {
            builtin: true,
            skolem: false,
        };

        let i_sym = signature.intern_with_attrs("$i", 0, ttype, builtin);
        let o_sym = signature.intern_with_attrs("$o", 0, ttype, builtin);
        let itype = types.base(i_sym);
        let otype = types.base(o_sym);

        let mut terms = TermBank::new();
        let true_sym = signature.intern_with_attrs("$true", 0, otype, builtin);
        let false_sym = signature.intern_with_attrs("$false", 0, otype, builtin);
        let true_ = terms.const_(true_sym, otype);
        let false_ = terms.const_(false_sym, otype);

        LogicContext {
            signature,
            types,
            terms,
            itype,
            otype,
            true_,
            false_,
        }
    }

    // === Construction helpers (frontend and tests) ===

    /// A named variable of individual type
    pub fn var(&mut self, n: u32) -> TermId {
        self.terms.var(n, self.itype)
    }

    /// Intern a constant of individual type and return its term
    pub fn const_(&mut self, name: &str) -> TermId {
        let sym = self.signature.intern(name, 0, self.itype);
        self.terms.const_(sym, self.itype)
    }

    /// Intern a function symbol `$i^arity -> $i` and return its head term
    pub fn func(&mut self, name: &str, arity: usize) -> TermId {
        let args = vec![self.itype; arity];
        let ty = self.types.arrow(args, self.itype);
        let sym = self.signature.intern(name, arity, ty);
        self.terms.const_(sym, ty)
    }

    /// Intern a predicate symbol `$i^arity -> $o` and return its head term
    pub fn pred(&mut self, name: &str, arity: usize) -> TermId {
        let args = vec![self.itype; arity];
        let ty = self.types.arrow(args, self.otype);
        let sym = self.signature.intern(name, arity, ty);
        self.terms.const_(sym, ty)
    }

    /// Apply a head term to arguments
    pub fn app(&mut self, head: TermId, args: Vec<TermId>) -> TermId {
        self.terms.app(&mut self.types, head, args)
    }
}

impl Default for LogicContext {
    fn default() -> Self {
        Self::new()
    }
}
