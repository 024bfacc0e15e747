//! Higher-order pattern unification
//!
//! Unification for the Miller pattern fragment: flex heads (free variables)
//! applied to sequences of *distinct bound variables*. Within the fragment
//! most general unifiers exist and are unique up to renaming, which is what
//! makes the algorithm usable inside a saturation loop.
//!
//! Flex-rigid pairs perform *pruning*: a flex subterm of the rigid side
//! whose arguments mention bound variables outside the outer argument
//! sequence is replaced by a fresh flex variable over the surviving
//! arguments, and the original variable is bound accordingly. A rigid bound
//! variable that cannot be mapped makes the pair non-unifiable; a flex
//! subterm whose arguments are not distinct bound variables is outside the
//! fragment and reported as `NotInFragment` so the caller can skip the
//! inference.
//!
//! Both inputs are renamed into one scope up front (pattern problems are
//! rare enough that the rename cost does not matter), so the solver works
//! on plain terms; the returned substitution is re-keyed to the original
//! scoped variables.

use super::{UnificationError, UnifyResult};
use crate::logic::subst::{apply, Renaming};
use crate::logic::{LogicContext, ScopedVar, Substitution, TermId, TermNode, TypeId};

/// Unify two scoped terms in the higher-order pattern fragment.
pub fn unify_ho(
    ctx: &mut LogicContext,
    t1: TermId,
    scope1: u8,
    t2: TermId,
    scope2: u8,
) -> UnifyResult<Substitution> {
    // Rename both sides into a single scope, with fresh variables above
    // every existing number so the re-keying below cannot collide.
    let empty = Substitution::new();
    let mut renaming = Renaming::starting_at(ctx.terms.var_upper_bound());
    let u1 = apply(&mut ctx.terms, &mut ctx.types, &empty, &mut renaming, t1, scope1);
    let u2 = apply(&mut ctx.terms, &mut ctx.types, &empty, &mut renaming, t2, scope2);

    let mut subst = Substitution::new();
    solve(ctx, &mut subst, u1, u2, 0)?;

    // Route the original scoped variables through the renaming; fresh
    // numbers start above every original, so no key can collide.
    let mut out = subst;
    for (&orig, &(fresh, ty)) in renaming.iter() {
        let fresh_term = ctx.terms.var(fresh, ty);
        out.bind(orig, fresh_term, 0);
    }
    Ok(out)
}

/// A flex term decomposed as head variable + argument terms
struct Flex {
    var: u32,
    args: Vec<TermId>,
}

fn as_flex(ctx: &LogicContext, t: TermId) -> Option<Flex> {
    match ctx.terms.node(t) {
        TermNode::Var { var, .. } => Some(Flex {
            var: *var,
            args: Vec::new(),
        }),
        TermNode::App { head, args } => match ctx.terms.node(*head) {
            TermNode::Var { var, .. } => Some(Flex {
                var: *var,
                args: args.clone(),
            }),
            _ => None,
        },
        _ => None,
    }
}

/// Resolve the head through the substitution and beta-reduce
fn deref(ctx: &mut LogicContext, subst: &Substitution, t: TermId) -> TermId {
    let mut t = ctx.terms.whnf(&mut ctx.types, t);
    loop {
        let replaced = match ctx.terms.node(t).clone() {
            TermNode::Var { var, .. } => subst.get(ScopedVar::new(var, 0)).map(|(b, _)| b),
            TermNode::App { head, args } => match ctx.terms.node(head).clone() {
                TermNode::Var { var, .. } => subst
                    .get(ScopedVar::new(var, 0))
                    .map(|(b, _)| ctx.terms.app(&mut ctx.types, b, args)),
                _ => None,
            },
            _ => None,
        };
        match replaced {
            Some(r) => t = ctx.terms.whnf(&mut ctx.types, r),
            None => return t,
        }
    }
}

/// The argument sequence of a flex term, required to be distinct bound
/// variables (the pattern condition). Returns their de Bruijn indices.
fn pattern_args(ctx: &mut LogicContext, subst: &Substitution, args: &[TermId]) -> UnifyResult<Vec<(u32, TypeId)>> {
    let mut out = Vec::with_capacity(args.len());
    for &a in args {
        let a = deref(ctx, subst, a);
        match ctx.terms.node(a) {
            TermNode::BVar { index, ty } => {
                if out.iter().any(|&(i, _)| i == *index) {
                    return Err(UnificationError::NotInFragment);
                }
                out.push((*index, *ty));
            }
            _ => return Err(UnificationError::NotInFragment),
        }
    }
    Ok(out)
}

fn solve(
    ctx: &mut LogicContext,
    subst: &mut Substitution,
    t1: TermId,
    t2: TermId,
    depth: u32,
) -> UnifyResult<()> {
    let t1 = deref(ctx, subst, t1);
    let t2 = deref(ctx, subst, t2);
    if t1 == t2 {
        return Ok(());
    }

    // Strip lambdas together, eta-expanding a lone non-lambda side
    match (ctx.terms.node(t1).clone(), ctx.terms.node(t2).clone()) {
        (
            TermNode::Fun { arg_ty: ty1, body: b1 },
            TermNode::Fun { arg_ty: ty2, body: b2 },
        ) => {
            if ty1 != ty2 {
                return Err(UnificationError::TypeMismatch);
            }
            return solve(ctx, subst, b1, b2, depth + 1);
        }
        (TermNode::Fun { arg_ty, body }, _) => {
            let expanded = eta_body(ctx, t2, arg_ty);
            return solve(ctx, subst, body, expanded, depth + 1);
        }
        (_, TermNode::Fun { arg_ty, body }) => {
            let expanded = eta_body(ctx, t1, arg_ty);
            return solve(ctx, subst, expanded, body, depth + 1);
        }
        _ => {}
    }

    let f1 = as_flex(ctx, t1);
    let f2 = as_flex(ctx, t2);

    match (f1, f2) {
        (Some(flex), None) => flex_rigid(ctx, subst, flex, t2),
        (None, Some(flex)) => flex_rigid(ctx, subst, flex, t1),
        (Some(fa), Some(fb)) => flex_flex(ctx, subst, fa, fb, t1, t2),
        (None, None) => rigid_rigid(ctx, subst, t1, t2, depth),
    }
}

/// Body of the eta-expansion of `t` (to be compared under one more binder)
fn eta_body(ctx: &mut LogicContext, t: TermId, arg_ty: TypeId) -> TermId {
    let shifted = ctx.terms.shift(&mut ctx.types, t, 1);
    let b0 = ctx.terms.bvar(0, arg_ty);
    ctx.terms.app(&mut ctx.types, shifted, vec![b0])
}

fn rigid_rigid(
    ctx: &mut LogicContext,
    subst: &mut Substitution,
    t1: TermId,
    t2: TermId,
    depth: u32,
) -> UnifyResult<()> {
    match (ctx.terms.node(t1).clone(), ctx.terms.node(t2).clone()) {
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
            if a1.len() != a2.len() {
                return Err(UnificationError::ArityMismatch);
            }
            solve(ctx, subst, h1, h2, depth)?;
            for (x, y) in a1.into_iter().zip(a2) {
                solve(ctx, subst, x, y, depth)?;
            }
            Ok(())
        }
        _ => Err(UnificationError::ClashingSymbols),
    }
}

/// Flex-rigid: bind `F(xs) := rigid`, abstracting the argument bound
/// variables out of the rigid side and pruning flex subterms.
fn flex_rigid(
    ctx: &mut LogicContext,
    subst: &mut Substitution,
    flex: Flex,
    rigid: TermId,
) -> UnifyResult<()> {
    let xs = pattern_args(ctx, subst, &flex.args)?;
    let body = abstract_rigid(ctx, subst, flex.var, &xs, rigid, 0)?;
    let binding = close_lambda(ctx, &xs, body);
    if !ctx.terms.is_closed(binding) {
        return Err(UnificationError::ClashingSymbols);
    }
    subst.bind(ScopedVar::new(flex.var, 0), binding, 0);
    Ok(())
}

/// Wrap `body` in one lambda per argument variable (types from `xs`)
fn close_lambda(ctx: &mut LogicContext, xs: &[(u32, TypeId)], body: TermId) -> TermId {
    let mut t = body;
    for &(_, ty) in xs.iter().rev() {
        t = ctx.terms.fun(&mut ctx.types, ty, t);
    }
    t
}

/// Rewrite `r` so that ambient bound variables are remapped into the
/// binding's own binders. `off` counts binders crossed inside `r`.
fn abstract_rigid(
    ctx: &mut LogicContext,
    subst: &mut Substitution,
    flex_var: u32,
    xs: &[(u32, TypeId)],
    r: TermId,
    off: u32,
) -> UnifyResult<TermId> {
    let r = deref(ctx, subst, r);
    match ctx.terms.node(r).clone() {
        TermNode::Const { .. } => Ok(r),
        TermNode::Var { var, .. } => {
            if var == flex_var {
                Err(UnificationError::OccursCheck)
            } else {
                Ok(r)
            }
        }
        TermNode::BVar { index, ty } => {
            if index < off {
                Ok(r)
            } else {
                let ambient = index - off;
                match xs.iter().position(|&(x, _)| x == ambient) {
                    Some(p) => {
                        let mapped = off + (xs.len() as u32 - 1 - p as u32);
                        Ok(ctx.terms.bvar(mapped, ty))
                    }
                    // A bound variable the binding cannot capture
                    None => Err(UnificationError::ClashingSymbols),
                }
            }
        }
        TermNode::App { head, args } => {
            if let TermNode::Var { var: g, .. } = ctx.terms.node(head).clone() {
                if g == flex_var {
                    return Err(UnificationError::OccursCheck);
                }
                return prune_flex(ctx, subst, flex_var, xs, head, g, &args, off);
            }
            let head = abstract_rigid(ctx, subst, flex_var, xs, head, off)?;
            let mut out_args = Vec::with_capacity(args.len());
            for a in args {
                out_args.push(abstract_rigid(ctx, subst, flex_var, xs, a, off)?);
            }
            Ok(ctx.terms.app(&mut ctx.types, head, out_args))
        }
        TermNode::Fun { arg_ty, body } => {
            let body = abstract_rigid(ctx, subst, flex_var, xs, body, off + 1)?;
            Ok(ctx.terms.fun(&mut ctx.types, arg_ty, body))
        }
    }
}

/// Pruning: a flex subterm `G(ys)` of the rigid side keeps only the
/// arguments that the outer binding can express; the dropped ones are cut
/// off by binding `G` to a fresh variable over the survivors.
#[allow(clippy::too_many_arguments)]
fn prune_flex(
    ctx: &mut LogicContext,
    subst: &mut Substitution,
    flex_var: u32,
    xs: &[(u32, TypeId)],
    g_term: TermId,
    g: u32,
    ys: &[TermId],
    off: u32,
) -> UnifyResult<TermId> {
    let ys = pattern_args(ctx, subst, ys)?;

    // An argument survives if it is bound inside the rigid term itself or
    // the outer argument sequence covers it
    let survives = |&(i, _ty): &(u32, TypeId)| -> bool {
        i < off || xs.iter().any(|&(x, _)| x == i - off)
    };

    let mapped_arg = |ctx: &mut LogicContext, (i, ty): (u32, TypeId)| -> UnifyResult<TermId> {
        if i < off {
            Ok(ctx.terms.bvar(i, ty))
        } else {
            let ambient = i - off;
            match xs.iter().position(|&(x, _)| x == ambient) {
                Some(p) => Ok(ctx.terms.bvar(off + (xs.len() as u32 - 1 - p as u32), ty)),
                None => Err(UnificationError::ClashingSymbols),
            }
        }
    };

    if ys.iter().all(survives) {
        // No pruning needed: just remap the arguments
        let mut args = Vec::with_capacity(ys.len());
        for &y in &ys {
            args.push(mapped_arg(ctx, y)?);
        }
        return Ok(ctx.terms.app(&mut ctx.types, g_term, args));
    }

    // Fresh H over the surviving arguments
    let kept: Vec<(usize, (u32, TypeId))> = ys
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, y)| survives(y))
        .collect();
    let ret_ty = result_type(ctx, g_term, ys.len());
    let kept_tys: Vec<TypeId> = kept.iter().map(|&(_, (_, ty))| ty).collect();
    let h_ty = ctx.types.arrow(kept_tys, ret_ty);
    let h = ctx.terms.fresh_var(h_ty);

    // G := λ y_0 .. y_{m-1}. H(y_{kept})
    let m = ys.len() as u32;
    let inner_args: Vec<TermId> = kept
        .iter()
        .map(|&(j, (_, ty))| ctx.terms.bvar(m - 1 - j as u32, ty))
        .collect();
    let mut g_body = ctx.terms.app(&mut ctx.types, h, inner_args);
    for &(_, ty) in ys.iter().rev() {
        g_body = ctx.terms.fun(&mut ctx.types, ty, g_body);
    }
    subst.bind(ScopedVar::new(g, 0), g_body, 0);

    // Emit H applied to the remapped survivors
    let mut out_args = Vec::with_capacity(kept.len());
    for &(_, y) in &kept {
        out_args.push(mapped_arg(ctx, y)?);
    }
    let result = ctx.terms.app(&mut ctx.types, h, out_args);
    // The pruned binding may re-expose the flex variable; re-check
    abstract_rigid(ctx, subst, flex_var, xs, result, off)
}

/// Result type of a head applied to `n` arguments
fn result_type(ctx: &mut LogicContext, head: TermId, n: usize) -> TypeId {
    let ty = ctx.terms.ty(head);
    ctx.types.apply_n(ty, n).unwrap_or(ty)
}

/// Flex-flex pairs: equal heads keep the agreeing argument positions;
/// distinct heads intersect their argument sequences.
fn flex_flex(
    ctx: &mut LogicContext,
    subst: &mut Substitution,
    fa: Flex,
    fb: Flex,
    t1: TermId,
    t2: TermId,
) -> UnifyResult<()> {
    let xs = pattern_args(ctx, subst, &fa.args)?;
    let ys = pattern_args(ctx, subst, &fb.args)?;

    if ctx.terms.ty(t1) != ctx.terms.ty(t2) {
        return Err(UnificationError::TypeMismatch);
    }
    let ret_ty = ctx.terms.ty(t1);

    if fa.var == fb.var {
        // F(xs) = F(ys): keep positions where both sequences agree
        if xs.len() != ys.len() {
            return Err(UnificationError::ArityMismatch);
        }
        let kept: Vec<(usize, (u32, TypeId))> = xs
            .iter()
            .copied()
            .enumerate()
            .filter(|&(p, (x, _))| ys[p].0 == x)
            .collect();
        if kept.len() == xs.len() {
            return Ok(()); // identical argument sequences
        }
        let kept_tys: Vec<TypeId> = kept.iter().map(|&(_, (_, ty))| ty).collect();
        let h_ty = ctx.types.arrow(kept_tys, ret_ty);
        let h = ctx.terms.fresh_var(h_ty);
        let k = xs.len() as u32;
        let inner: Vec<TermId> = kept
            .iter()
            .map(|&(p, (_, ty))| ctx.terms.bvar(k - 1 - p as u32, ty))
            .collect();
        let mut body = ctx.terms.app(&mut ctx.types, h, inner);
        for &(_, ty) in xs.iter().rev() {
            body = ctx.terms.fun(&mut ctx.types, ty, body);
        }
        subst.bind(ScopedVar::new(fa.var, 0), body, 0);
        return Ok(());
    }

    // F(xs) = G(ys): common variables, in xs order
    let common: Vec<(u32, TypeId)> = xs
        .iter()
        .copied()
        .filter(|&(x, _)| ys.iter().any(|&(y, _)| y == x))
        .collect();
    let common_tys: Vec<TypeId> = common.iter().map(|&(_, ty)| ty).collect();
    let h_ty = ctx.types.arrow(common_tys, ret_ty);
    let h = ctx.terms.fresh_var(h_ty);

    let mk_binding = |ctx: &mut LogicContext, args: &[(u32, TypeId)]| -> TermId {
        let k = args.len() as u32;
        // Every common variable occurs in `args` by construction
        let inner: Vec<TermId> = common
            .iter()
            .filter_map(|&(z, ty)| {
                args.iter()
                    .position(|&(a, _)| a == z)
                    .map(|p| ctx.terms.bvar(k - 1 - p as u32, ty))
            })
            .collect();
        let mut body = ctx.terms.app(&mut ctx.types, h, inner);
        for &(_, ty) in args.iter().rev() {
            body = ctx.terms.fun(&mut ctx.types, ty, body);
        }
        body
    };

    let f_binding = mk_binding(ctx, &xs);
    subst.bind(ScopedVar::new(fa.var, 0), f_binding, 0);
    let g_binding = mk_binding(ctx, &ys);
    subst.bind(ScopedVar::new(fb.var, 0), g_binding, 0);
    Ok(())
}
