//! Scoped substitutions
//!
//! Binary inference rules never rename their premises up front. Instead,
//! each premise is placed in a *scope* (a small namespace tag), and a
//! substitution maps scoped variables to scoped terms. Two clauses with the
//! same variable numbers but different scopes are variable-disjoint by
//! construction, which removes the clone-and-rename cost from every failed
//! unification attempt.
//!
//! Application always goes through a `Renaming` that maps every unbound
//! scoped variable it encounters to a fresh variable in a single output
//! scope. Two applications sharing one renaming agree on the fresh
//! variables they produce, so the conclusion of an inference is assembled
//! from several `apply` calls without variable clashes.

use super::term::{TermBank, TermId, TermNode};
use super::ty::{TypeBank, TypeId};
use std::collections::HashMap;

/// A variable tagged with the scope of its parent clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopedVar {
    pub var: u32,
    pub scope: u8,
}

impl ScopedVar {
    pub fn new(var: u32, scope: u8) -> Self {
        ScopedVar { var, scope }
    }
}

/// A finite map from scoped variables to scoped terms
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitution {
    map: HashMap<ScopedVar, (TermId, u8)>,
}

impl Substitution {
    pub fn new() -> Self {
        Substitution::default()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn bind(&mut self, v: ScopedVar, term: TermId, scope: u8) {
        debug_assert!(!self.map.contains_key(&v));
        self.map.insert(v, (term, scope));
    }

    pub fn get(&self, v: ScopedVar) -> Option<(TermId, u8)> {
        self.map.get(&v).copied()
    }

    /// Remove a binding (backtracking in matching)
    pub fn unbind(&mut self, v: ScopedVar) {
        self.map.remove(&v);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ScopedVar, &(TermId, u8))> {
        self.map.iter()
    }

    /// Chase variable-to-variable bindings: resolve `(t, scope)` until the
    /// head is not a bound variable.
    pub fn walk(&self, bank: &TermBank, t: TermId, scope: u8) -> (TermId, u8) {
        let mut cur = (t, scope);
        loop {
            match bank.node(cur.0) {
                TermNode::Var { var, .. } => {
                    match self.get(ScopedVar::new(*var, cur.1)) {
                        Some(next) => cur = next,
                        None => return cur,
                    }
                }
                _ => return cur,
            }
        }
    }
}

/// Maps scoped variables to fresh variables in a single output scope.
/// Shared across all `apply` calls of one inference.
#[derive(Debug, Default)]
pub struct Renaming {
    map: HashMap<ScopedVar, (u32, TypeId)>,
    next: u32,
}

impl Renaming {
    pub fn new() -> Self {
        Renaming::default()
    }

    /// A renaming whose fresh variables start at `n` (used when the output
    /// must not collide with any existing variable number)
    pub fn starting_at(n: u32) -> Self {
        Renaming {
            map: HashMap::new(),
            next: n,
        }
    }

    /// Every renamed variable with its fresh number and type
    pub fn iter(&self) -> impl Iterator<Item = (&ScopedVar, &(u32, TypeId))> {
        self.map.iter()
    }

    fn fresh(&mut self, v: ScopedVar, ty: TypeId) -> u32 {
        if let Some(&(n, _)) = self.map.get(&v) {
            return n;
        }
        let n = self.next;
        self.next += 1;
        self.map.insert(v, (n, ty));
        n
    }
}

/// Apply `subst` to `t` at `scope`, renaming every surviving variable into
/// the output scope via `renaming`. Beta-normalizes afterwards so that a
/// variable bound to a lambda does not leave a redex in the result.
pub fn apply(
    terms: &mut TermBank,
    types: &mut TypeBank,
    subst: &Substitution,
    renaming: &mut Renaming,
    t: TermId,
    scope: u8,
) -> TermId {
    let applied = apply_rec(terms, types, subst, renaming, t, scope, 0);
    terms.beta_reduce(types, applied)
}

fn apply_rec(
    terms: &mut TermBank,
    types: &mut TypeBank,
    subst: &Substitution,
    renaming: &mut Renaming,
    t: TermId,
    scope: u8,
    depth: u32,
) -> TermId {
    match terms.node(t).clone() {
        TermNode::Var { var, ty } => {
            match subst.get(ScopedVar::new(var, scope)) {
                Some((bound, bound_scope)) => {
                    let inner = apply_rec(terms, types, subst, renaming, bound, bound_scope, 0);
                    // A binding inserted under `depth` binders must have its
                    // loose indices lifted past them
                    if depth > 0 && !terms.is_closed(inner) {
                        terms.shift(types, inner, depth)
                    } else {
                        inner
                    }
                }
                None => {
                    let fresh = renaming.fresh(ScopedVar::new(var, scope), ty);
                    terms.var(fresh, ty)
                }
            }
        }
        TermNode::BVar { .. } | TermNode::Const { .. } => t,
        TermNode::App { head, args } => {
            let head = apply_rec(terms, types, subst, renaming, head, scope, depth);
            let args = args
                .into_iter()
                .map(|a| apply_rec(terms, types, subst, renaming, a, scope, depth))
                .collect();
            terms.app(types, head, args)
        }
        TermNode::Fun { arg_ty, body } => {
            let body = apply_rec(terms, types, subst, renaming, body, scope, depth + 1);
            terms.fun(types, arg_ty, body)
        }
    }
}

/// Apply a *matching* substitution without renaming: unbound variables are
/// kept verbatim. Used by rewriting (demodulation) and subsumption checks,
/// where the bindings already live in the target clause's variable
/// namespace and the result is spliced back into that clause.
pub fn apply_match(
    terms: &mut TermBank,
    types: &mut TypeBank,
    subst: &Substitution,
    t: TermId,
    scope: u8,
) -> TermId {
    let applied = apply_match_rec(terms, types, subst, t, scope, 0);
    terms.beta_reduce(types, applied)
}

fn apply_match_rec(
    terms: &mut TermBank,
    types: &mut TypeBank,
    subst: &Substitution,
    t: TermId,
    scope: u8,
    depth: u32,
) -> TermId {
    match terms.node(t).clone() {
        TermNode::Var { var, .. } => match subst.get(ScopedVar::new(var, scope)) {
            Some((bound, bound_scope)) => {
                let inner = apply_match_rec(terms, types, subst, bound, bound_scope, 0);
                if depth > 0 && !terms.is_closed(inner) {
                    terms.shift(types, inner, depth)
                } else {
                    inner
                }
            }
            None => t,
        },
        TermNode::BVar { .. } | TermNode::Const { .. } => t,
        TermNode::App { head, args } => {
            let head = apply_match_rec(terms, types, subst, head, scope, depth);
            let args = args
                .into_iter()
                .map(|a| apply_match_rec(terms, types, subst, a, scope, depth))
                .collect();
            terms.app(types, head, args)
        }
        TermNode::Fun { arg_ty, body } => {
            let body = apply_match_rec(terms, types, subst, body, scope, depth + 1);
            terms.fun(types, arg_ty, body)
        }
    }
}

/// Occurs check through the substitution: does the scoped variable `v`
/// occur in `(t, scope)` after resolving bindings?
pub fn occurs(bank: &TermBank, subst: &Substitution, v: ScopedVar, t: TermId, scope: u8) -> bool {
    match bank.node(t) {
        TermNode::Var { var, .. } => {
            let sv = ScopedVar::new(*var, scope);
            if sv == v {
                return true;
            }
            match subst.get(sv) {
                Some((bound, bound_scope)) => occurs(bank, subst, v, bound, bound_scope),
                None => false,
            }
        }
        TermNode::BVar { .. } | TermNode::Const { .. } => false,
        TermNode::App { head, args } => {
            occurs(bank, subst, v, *head, scope)
                || args.iter().any(|&a| occurs(bank, subst, v, a, scope))
        }
        TermNode::Fun { body, .. } => occurs(bank, subst, v, *body, scope),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::LogicContext;

    #[test]
    fn test_identity_substitution_renames_only() {
        let mut ctx = LogicContext::new();
        let f = ctx.func("f", 2);
        let x = ctx.var(7);
        let y = ctx.var(9);
        let t = ctx.app(f, vec![x, y]);

        let subst = Substitution::new();
        let mut renaming = Renaming::new();
        let r = apply(&mut ctx.terms, &mut ctx.types, &subst, &mut renaming, t, 0);

        // Shape preserved, variables renamed to 0, 1 in first-occurrence order
        let x0 = ctx.var(0);
        let x1 = ctx.var(1);
        let expected = ctx.app(f, vec![x0, x1]);
        assert_eq!(r, expected);
    }

    #[test]
    fn test_shared_renaming_is_consistent() {
        let mut ctx = LogicContext::new();
        let f = ctx.func("f", 1);
        let x = ctx.var(3);
        let fx = ctx.app(f, vec![x]);

        let subst = Substitution::new();
        let mut renaming = Renaming::new();
        let r1 = apply(&mut ctx.terms, &mut ctx.types, &subst, &mut renaming, x, 0);
        let r2 = apply(&mut ctx.terms, &mut ctx.types, &subst, &mut renaming, fx, 0);

        // The same scoped variable maps to the same fresh variable
        let x0 = ctx.var(0);
        assert_eq!(r1, x0);
        assert_eq!(r2, ctx.app(f, vec![x0]));
    }

    #[test]
    fn test_scopes_are_disjoint() {
        let mut ctx = LogicContext::new();
        let x = ctx.var(0);

        let subst = Substitution::new();
        let mut renaming = Renaming::new();
        let r0 = apply(&mut ctx.terms, &mut ctx.types, &subst, &mut renaming, x, 0);
        let r1 = apply(&mut ctx.terms, &mut ctx.types, &subst, &mut renaming, x, 1);

        assert_ne!(r0, r1, "same variable in different scopes must stay distinct");
    }

    #[test]
    fn test_binding_chase() {
        let mut ctx = LogicContext::new();
        let a = ctx.const_("a");
        let x = ctx.var(0);
        let y = ctx.var(1);

        let mut subst = Substitution::new();
        // X@0 -> Y@1, Y@1 -> a
        subst.bind(ScopedVar::new(0, 0), y, 1);
        subst.bind(ScopedVar::new(1, 1), a, 0);

        let (t, _scope) = subst.walk(&ctx.terms, x, 0);
        assert_eq!(t, a);

        let mut renaming = Renaming::new();
        let r = apply(&mut ctx.terms, &mut ctx.types, &subst, &mut renaming, x, 0);
        assert_eq!(r, a);
    }

    #[test]
    fn test_occurs_through_bindings() {
        let mut ctx = LogicContext::new();
        let f = ctx.func("f", 1);
        let x = ctx.var(0);
        let y = ctx.var(1);
        let fy = ctx.app(f, vec![y]);

        let mut subst = Substitution::new();
        subst.bind(ScopedVar::new(1, 0), x, 0); // Y -> X

        // X occurs in f(Y) because Y is bound to X
        assert!(occurs(&ctx.terms, &subst, ScopedVar::new(0, 0), fy, 0));
        assert!(!occurs(&ctx.terms, &subst, ScopedVar::new(5, 0), fy, 0));
    }
}
