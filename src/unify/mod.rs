//! Unification and matching over scoped terms
//!
//! `unify` is Robinson unification with occurs check; it works on scoped
//! terms, so the two inputs never need renaming apart. `match_term` is
//! one-sided: only variables of the pattern scope may be bound. Both return
//! `Result` values — failure is an expected, rule-local outcome, caught at
//! the rule boundary and never propagated further.
//!
//! Terms outside the first-order fragment (flex heads, open binders) make
//! the syntactic algorithms fail with `NotInFragment`; callers that care
//! retry with the higher-order pattern unifier in [`pattern`].

pub mod pattern;

use crate::logic::{ScopedVar, Substitution, TermBank, TermId, TermNode};
use std::collections::HashSet;
use thiserror::Error;

/// Why a unification or matching attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UnificationError {
    #[error("clashing head symbols")]
    ClashingSymbols,
    #[error("arity mismatch")]
    ArityMismatch,
    #[error("occurs check failed")]
    OccursCheck,
    #[error("type mismatch")]
    TypeMismatch,
    #[error("outside the pattern fragment")]
    NotInFragment,
}

pub type UnifyResult<T> = Result<T, UnificationError>;

/// Compute the most general unifier of `(t1, scope1)` and `(t2, scope2)`
pub fn unify(
    bank: &TermBank,
    t1: TermId,
    scope1: u8,
    t2: TermId,
    scope2: u8,
) -> UnifyResult<Substitution> {
    let mut subst = Substitution::new();
    unify_into(bank, &mut subst, t1, scope1, t2, scope2)?;
    Ok(subst)
}

/// Unify under an existing substitution (shared across literal arguments)
pub fn unify_into(
    bank: &TermBank,
    subst: &mut Substitution,
    t1: TermId,
    scope1: u8,
    t2: TermId,
    scope2: u8,
) -> UnifyResult<()> {
    let (t1, scope1) = subst.walk(bank, t1, scope1);
    let (t2, scope2) = subst.walk(bank, t2, scope2);

    if t1 == t2 && scope1 == scope2 {
        return Ok(());
    }

    match (bank.node(t1).clone(), bank.node(t2).clone()) {
        (TermNode::Var { var, .. }, _) => bind(bank, subst, ScopedVar::new(var, scope1), t1, t2, scope2),
        (_, TermNode::Var { var, .. }) => bind(bank, subst, ScopedVar::new(var, scope2), t2, t1, scope1),

        (TermNode::Const { sym: f, .. }, TermNode::Const { sym: g, .. }) => {
            if f == g {
                Ok(())
            } else {
                Err(UnificationError::ClashingSymbols)
            }
        }

        (TermNode::BVar { index: i, .. }, TermNode::BVar { index: j, .. }) => {
            if i == j {
                Ok(())
            } else {
                Err(UnificationError::ClashingSymbols)
            }
        }

        (
            TermNode::App { head: h1, args: a1 },
            TermNode::App { head: h2, args: a2 },
        ) => {
            // Flex-headed applications belong to the pattern unifier
            if bank.is_var(h1) || bank.is_var(h2) {
                return Err(UnificationError::NotInFragment);
            }
            if a1.len() != a2.len() {
                return Err(UnificationError::ArityMismatch);
            }
            unify_into(bank, subst, h1, scope1, h2, scope2)?;
            for (x, y) in a1.into_iter().zip(a2) {
                unify_into(bank, subst, x, scope1, y, scope2)?;
            }
            Ok(())
        }

        (
            TermNode::Fun { arg_ty: ty1, body: b1 },
            TermNode::Fun { arg_ty: ty2, body: b2 },
        ) => {
            if ty1 != ty2 {
                return Err(UnificationError::TypeMismatch);
            }
            unify_into(bank, subst, b1, scope1, b2, scope2)
        }

        _ => {
            if is_flex(bank, t1) || is_flex(bank, t2) {
                Err(UnificationError::NotInFragment)
            } else {
                Err(UnificationError::ClashingSymbols)
            }
        }
    }
}

/// A flex term: a variable-headed application or a lambda (mixed cases are
/// left to the pattern unifier)
fn is_flex(bank: &TermBank, t: TermId) -> bool {
    match bank.node(t) {
        TermNode::App { head, .. } => bank.is_var(*head),
        TermNode::Fun { .. } => true,
        _ => false,
    }
}

/// Bind `v` to `(t, t_scope)` after type and occurs checks. `v_term` is the
/// variable's own term (for its type).
fn bind(
    bank: &TermBank,
    subst: &mut Substitution,
    v: ScopedVar,
    v_term: TermId,
    t: TermId,
    t_scope: u8,
) -> UnifyResult<()> {
    if bank.ty(v_term) != bank.ty(t) {
        return Err(UnificationError::TypeMismatch);
    }
    // Binding a named variable to a term with loose bound variables would
    // let the binder escape; only the pattern unifier may do that safely
    if !bank.is_closed(t) {
        return Err(UnificationError::NotInFragment);
    }
    if crate::logic::subst::occurs(bank, subst, v, t, t_scope) {
        return Err(UnificationError::OccursCheck);
    }
    subst.bind(v, t, t_scope);
    Ok(())
}

/// Match `(pattern, pscope)` onto `(subject, sscope)`: find bindings of
/// pattern-scope variables only, such that `pattern σ = subject`.
pub fn match_term(
    bank: &TermBank,
    pattern: TermId,
    pscope: u8,
    subject: TermId,
    sscope: u8,
) -> UnifyResult<Substitution> {
    let mut subst = Substitution::new();
    let locked = HashSet::new();
    match_into(bank, &mut subst, &locked, pattern, pscope, subject, sscope)?;
    Ok(subst)
}

/// Matching that additionally refuses to bind variables in `locked`
/// (demodulation and subsumption use this to protect target variables).
pub fn match_locked(
    bank: &TermBank,
    locked: &HashSet<ScopedVar>,
    pattern: TermId,
    pscope: u8,
    subject: TermId,
    sscope: u8,
) -> UnifyResult<Substitution> {
    let mut subst = Substitution::new();
    match_into(bank, &mut subst, locked, pattern, pscope, subject, sscope)?;
    Ok(subst)
}

/// Matching step under an existing substitution (shared across the two
/// sides of a literal, or across literals in subsumption).
pub fn match_into(
    bank: &TermBank,
    subst: &mut Substitution,
    locked: &HashSet<ScopedVar>,
    pattern: TermId,
    pscope: u8,
    subject: TermId,
    sscope: u8,
) -> UnifyResult<()> {
    if pattern == subject && pscope == sscope {
        return Ok(());
    }

    match (bank.node(pattern).clone(), bank.node(subject).clone()) {
        (TermNode::Var { var, .. }, _) => {
            let v = ScopedVar::new(var, pscope);
            if let Some((bound, bound_scope)) = subst.get(v) {
                // Already bound: the binding must coincide with the subject
                if bound == subject && bound_scope == sscope {
                    Ok(())
                } else {
                    Err(UnificationError::ClashingSymbols)
                }
            } else if locked.contains(&v) {
                Err(UnificationError::OccursCheck)
            } else if bank.ty(pattern) != bank.ty(subject) {
                Err(UnificationError::TypeMismatch)
            } else if !bank.is_closed(subject) {
                Err(UnificationError::NotInFragment)
            } else {
                subst.bind(v, subject, sscope);
                Ok(())
            }
        }

        (TermNode::Const { sym: f, .. }, TermNode::Const { sym: g, .. }) => {
            if f == g {
                Ok(())
            } else {
                Err(UnificationError::ClashingSymbols)
            }
        }

        (TermNode::BVar { index: i, .. }, TermNode::BVar { index: j, .. }) => {
            if i == j {
                Ok(())
            } else {
                Err(UnificationError::ClashingSymbols)
            }
        }

        (
            TermNode::App { head: h1, args: a1 },
            TermNode::App { head: h2, args: a2 },
        ) => {
            if bank.is_var(h1) {
                return Err(UnificationError::NotInFragment);
            }
            if a1.len() != a2.len() {
                return Err(UnificationError::ArityMismatch);
            }
            match_into(bank, subst, locked, h1, pscope, h2, sscope)?;
            for (p, s) in a1.into_iter().zip(a2) {
                match_into(bank, subst, locked, p, pscope, s, sscope)?;
            }
            Ok(())
        }

        (
            TermNode::Fun { arg_ty: ty1, body: b1 },
            TermNode::Fun { arg_ty: ty2, body: b2 },
        ) => {
            if ty1 != ty2 {
                return Err(UnificationError::TypeMismatch);
            }
            match_into(bank, subst, locked, b1, pscope, b2, sscope)
        }

        _ => {
            if is_flex(bank, pattern) || is_flex(bank, subject) {
                Err(UnificationError::NotInFragment)
            } else {
                Err(UnificationError::ClashingSymbols)
            }
        }
    }
}

/// Cheap prefilter: can these terms possibly unify? (Head symbol and arity
/// comparison only; used before full unification in tight loops.)
pub fn could_unify(bank: &TermBank, t1: TermId, t2: TermId) -> bool {
    match (bank.node(t1), bank.node(t2)) {
        (TermNode::Var { .. }, _) | (_, TermNode::Var { .. }) => true,
        (TermNode::Const { sym: f, .. }, TermNode::Const { sym: g, .. }) => f == g,
        (TermNode::App { head: h1, args: a1 }, TermNode::App { head: h2, args: a2 }) => {
            a1.len() == a2.len() && could_unify(bank, *h1, *h2)
        }
        (TermNode::Fun { .. }, TermNode::Fun { .. }) => true,
        (TermNode::BVar { index: i, .. }, TermNode::BVar { index: j, .. }) => i == j,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::subst::{apply, Renaming};
    use crate::logic::LogicContext;

    /// Apply a substitution to both unified terms and check they coincide
    fn joined(ctx: &mut LogicContext, subst: &Substitution, t1: TermId, s1: u8, t2: TermId, s2: u8) -> bool {
        let mut renaming = Renaming::new();
        let r1 = apply(&mut ctx.terms, &mut ctx.types, subst, &mut renaming, t1, s1);
        let r2 = apply(&mut ctx.terms, &mut ctx.types, subst, &mut renaming, t2, s2);
        r1 == r2
    }

    #[test]
    fn test_unify_var_with_term() {
        let mut ctx = LogicContext::new();
        let f = ctx.func("f", 1);
        let a = ctx.const_("a");
        let x = ctx.var(0);
        let fa = ctx.app(f, vec![a]);

        let subst = unify(&ctx.terms, x, 0, fa, 0).unwrap();
        assert!(joined(&mut ctx, &subst, x, 0, fa, 0));
    }

    #[test]
    fn test_unify_same_var_different_scopes() {
        let mut ctx = LogicContext::new();
        let f = ctx.func("f", 2);
        let a = ctx.const_("a");
        let x = ctx.var(0);

        // f(X, a) @0 with f(a, X) @1: X@0 = a, X@1 = a
        let t1 = ctx.app(f, vec![x, a]);
        let t2 = ctx.app(f, vec![a, x]);

        let subst = unify(&ctx.terms, t1, 0, t2, 1).unwrap();
        assert!(joined(&mut ctx, &subst, t1, 0, t2, 1));
    }

    #[test]
    fn test_occurs_check() {
        let mut ctx = LogicContext::new();
        let f = ctx.func("f", 1);
        let x = ctx.var(0);
        let fx = ctx.app(f, vec![x]);

        assert_eq!(
            unify(&ctx.terms, x, 0, fx, 0),
            Err(UnificationError::OccursCheck)
        );
        // In different scopes the variables are distinct: unifiable
        assert!(unify(&ctx.terms, x, 0, fx, 1).is_ok());
    }

    #[test]
    fn test_clash_and_arity() {
        let mut ctx = LogicContext::new();
        let f = ctx.func("f", 1);
        let g = ctx.func("g", 1);
        let a = ctx.const_("a");
        let fa = ctx.app(f, vec![a]);
        let ga = ctx.app(g, vec![a]);

        assert_eq!(
            unify(&ctx.terms, fa, 0, ga, 0),
            Err(UnificationError::ClashingSymbols)
        );
    }

    #[test]
    fn test_unifier_is_most_general_shape() {
        let mut ctx = LogicContext::new();
        let f = ctx.func("f", 2);
        let x = ctx.var(0);
        let y = ctx.var(1);

        // f(X, X) with f(Y, Y): pure variable renaming, both sides join
        let t1 = ctx.app(f, vec![x, x]);
        let t2 = ctx.app(f, vec![y, y]);
        let subst = unify(&ctx.terms, t1, 0, t2, 1).unwrap();
        assert!(joined(&mut ctx, &subst, t1, 0, t2, 1));
    }

    #[test]
    fn test_match_is_one_sided() {
        let mut ctx = LogicContext::new();
        let f = ctx.func("f", 1);
        let a = ctx.const_("a");
        let x = ctx.var(0);
        let fx = ctx.app(f, vec![x]);
        let fa = ctx.app(f, vec![a]);

        // f(X) matches f(a)
        let subst = match_term(&ctx.terms, fx, 1, fa, 0).unwrap();
        let mut renaming = Renaming::new();
        let instantiated = apply(&mut ctx.terms, &mut ctx.types, &subst, &mut renaming, fx, 1);
        assert_eq!(instantiated, fa);

        // but f(a) does not match f(X): subject variables never bind
        assert!(match_term(&ctx.terms, fa, 1, fx, 0).is_err());
    }

    #[test]
    fn test_match_locked_blocks_bindings() {
        let mut ctx = LogicContext::new();
        let f = ctx.func("f", 1);
        let a = ctx.const_("a");
        let x = ctx.var(0);
        let fx = ctx.app(f, vec![x]);
        let fa = ctx.app(f, vec![a]);

        let mut locked = HashSet::new();
        locked.insert(ScopedVar::new(0, 1));
        assert!(match_locked(&ctx.terms, &locked, fx, 1, fa, 0).is_err());
    }

    #[test]
    fn test_match_consistency_across_occurrences() {
        let mut ctx = LogicContext::new();
        let f = ctx.func("f", 2);
        let a = ctx.const_("a");
        let b = ctx.const_("b");
        let x = ctx.var(0);

        // f(X, X) matches f(a, a) but not f(a, b)
        let pat = ctx.app(f, vec![x, x]);
        let good = ctx.app(f, vec![a, a]);
        let bad = ctx.app(f, vec![a, b]);

        assert!(match_term(&ctx.terms, pat, 1, good, 0).is_ok());
        assert!(match_term(&ctx.terms, pat, 1, bad, 0).is_err());
    }

    #[test]
    fn test_flex_head_is_not_in_fragment() {
        let mut ctx = LogicContext::new();
        let ity = ctx.itype;
        let a = ctx.const_("a");
        let arrow = ctx.types.arrow(vec![ity], ity);
        let fvar = ctx.terms.var(0, arrow);
        let fx = ctx.terms.app(&mut ctx.types, fvar, vec![a]);

        assert_eq!(
            unify(&ctx.terms, fx, 0, a, 1),
            Err(UnificationError::NotInFragment)
        );
    }
}
