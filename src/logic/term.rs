//! Hash-consed terms with de Bruijn binders
//!
//! All terms live in a `TermBank` arena. Structurally equal terms share the
//! same `TermId`, so term equality is an integer comparison and terms can be
//! used as hash-map keys for free. Each node caches its type, weight (symbol
//! count), depth, sorted free named variables, and the maximal loose de
//! Bruijn index; the caches are computed once at construction from the
//! children's caches.
//!
//! Named variables (`Var`) are free variables of clauses; `BVar` indices
//! refer to enclosing `Fun` binders. A term with no loose `BVar` is closed;
//! clause-level terms are always closed.

use super::symbol::SymbolId;
use super::ty::{TypeBank, TypeId};
use crate::logic::Signature;
use std::collections::HashMap;
use std::fmt;

/// ID of a hash-consed term
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(pub(crate) u32);

impl TermId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// Structure of a term node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TermNode {
    /// Free named variable
    Var { var: u32, ty: TypeId },
    /// Bound variable (de Bruijn index into enclosing `Fun` binders)
    BVar { index: u32, ty: TypeId },
    /// Constant or function symbol
    Const { sym: SymbolId, ty: TypeId },
    /// Application in spine form: `head` is never itself an `App`,
    /// `args` is non-empty
    App { head: TermId, args: Vec<TermId> },
    /// Lambda abstraction over one argument
    Fun { arg_ty: TypeId, body: TermId },
}

#[derive(Debug, Clone)]
struct TermData {
    node: TermNode,
    ty: TypeId,
    weight: u32,
    depth: u32,
    /// Sorted, deduplicated free named variables
    vars: Vec<u32>,
    /// Maximal loose de Bruijn index, -1 if closed
    max_bvar: i32,
}

/// Arena of hash-consed terms
#[derive(Debug, Clone, Default)]
pub struct TermBank {
    data: Vec<TermData>,
    lookup: HashMap<TermNode, TermId>,
    /// Smallest variable number guaranteed unused (for fresh variables)
    fresh_counter: u32,
}

fn merge_vars(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

impl TermBank {
    pub fn new() -> Self {
        TermBank::default()
    }

    fn intern(&mut self, node: TermNode, ty: TypeId) -> TermId {
        if let Some(&id) = self.lookup.get(&node) {
            return id;
        }
        let (weight, depth, vars, max_bvar) = match &node {
            TermNode::Var { var, .. } => {
                self.fresh_counter = self.fresh_counter.max(var + 1);
                (1, 0, vec![*var], -1)
            }
            TermNode::BVar { index, .. } => (1, 0, Vec::new(), *index as i32),
            TermNode::Const { .. } => (1, 0, Vec::new(), -1),
            TermNode::App { head, args } => {
                let hd = &self.data[head.0 as usize];
                let mut weight = hd.weight;
                let mut depth = 0;
                let mut vars = hd.vars.clone();
                let mut max_bvar = hd.max_bvar;
                for &a in args {
                    let ad = &self.data[a.0 as usize];
                    weight += ad.weight;
                    depth = depth.max(ad.depth);
                    max_bvar = max_bvar.max(ad.max_bvar);
                    vars = merge_vars(&vars, &ad.vars);
                }
                (weight, depth + 1, vars, max_bvar)
            }
            TermNode::Fun { body, .. } => {
                let bd = &self.data[body.0 as usize];
                // The binder captures index 0; loose indices shift down by one
                let max_bvar = if bd.max_bvar <= 0 { -1 } else { bd.max_bvar - 1 };
                (bd.weight + 1, bd.depth + 1, bd.vars.clone(), max_bvar)
            }
        };
        let id = TermId(self.data.len() as u32);
        self.data.push(TermData {
            node: node.clone(),
            ty,
            weight,
            depth,
            vars,
            max_bvar,
        });
        self.lookup.insert(node, id);
        id
    }

    // === Constructors ===

    pub fn var(&mut self, var: u32, ty: TypeId) -> TermId {
        self.intern(TermNode::Var { var, ty }, ty)
    }

    pub fn bvar(&mut self, index: u32, ty: TypeId) -> TermId {
        self.intern(TermNode::BVar { index, ty }, ty)
    }

    pub fn const_(&mut self, sym: SymbolId, ty: TypeId) -> TermId {
        self.intern(TermNode::Const { sym, ty }, ty)
    }

    /// Apply `head` to `args`, flattening nested applications into spine
    /// form. An empty argument list returns `head` unchanged.
    pub fn app(&mut self, types: &mut TypeBank, head: TermId, args: Vec<TermId>) -> TermId {
        if args.is_empty() {
            return head;
        }
        let (head, args) = match self.node(head).clone() {
            TermNode::App {
                head: inner,
                args: mut inner_args,
            } => {
                inner_args.extend(args);
                (inner, inner_args)
            }
            _ => (head, args),
        };
        let head_ty = self.ty(head);
        let ty = types.apply_n(head_ty, args.len()).unwrap_or(head_ty);
        self.intern(TermNode::App { head, args }, ty)
    }

    /// Lambda abstraction: `fun (x : arg_ty) -> body`
    pub fn fun(&mut self, types: &mut TypeBank, arg_ty: TypeId, body: TermId) -> TermId {
        let body_ty = self.ty(body);
        let ty = types.arrow(vec![arg_ty], body_ty);
        self.intern(TermNode::Fun { arg_ty, body }, ty)
    }

    /// A fresh named variable, distinct from every variable interned so far
    pub fn fresh_var(&mut self, ty: TypeId) -> TermId {
        let v = self.fresh_counter;
        self.fresh_counter += 1;
        self.var(v, ty)
    }

    /// Every interned variable number is strictly below this bound
    pub fn var_upper_bound(&self) -> u32 {
        self.fresh_counter
    }

    // === Accessors (O(1)) ===

    pub fn node(&self, t: TermId) -> &TermNode {
        &self.data[t.0 as usize].node
    }

    pub fn ty(&self, t: TermId) -> TypeId {
        self.data[t.0 as usize].ty
    }

    pub fn weight(&self, t: TermId) -> u32 {
        self.data[t.0 as usize].weight
    }

    pub fn depth(&self, t: TermId) -> u32 {
        self.data[t.0 as usize].depth
    }

    pub fn free_vars(&self, t: TermId) -> &[u32] {
        &self.data[t.0 as usize].vars
    }

    /// Does the named variable `v` occur free in `t`?
    pub fn has_free_var(&self, t: TermId, v: u32) -> bool {
        self.free_vars(t).binary_search(&v).is_ok()
    }

    pub fn is_closed(&self, t: TermId) -> bool {
        self.data[t.0 as usize].max_bvar < 0
    }

    pub fn is_ground(&self, t: TermId) -> bool {
        self.is_closed(t) && self.free_vars(t).is_empty()
    }

    pub fn is_var(&self, t: TermId) -> bool {
        matches!(self.node(t), TermNode::Var { .. })
    }

    /// Head symbol of a constant or constant-headed application
    pub fn head_symbol(&self, t: TermId) -> Option<SymbolId> {
        match self.node(t) {
            TermNode::Const { sym, .. } => Some(*sym),
            TermNode::App { head, .. } => match self.node(*head) {
                TermNode::Const { sym, .. } => Some(*sym),
                _ => None,
            },
            _ => None,
        }
    }

    /// Number of terms interned so far
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // === De Bruijn operations ===

    /// Add `k` to every loose de Bruijn index in `t`
    pub fn shift(&mut self, types: &mut TypeBank, t: TermId, k: u32) -> TermId {
        self.shift_above(types, t, k, 0)
    }

    fn shift_above(&mut self, types: &mut TypeBank, t: TermId, k: u32, cutoff: u32) -> TermId {
        if k == 0 || self.data[t.0 as usize].max_bvar < cutoff as i32 {
            return t;
        }
        match self.node(t).clone() {
            TermNode::BVar { index, ty } => {
                if index >= cutoff {
                    self.bvar(index + k, ty)
                } else {
                    t
                }
            }
            TermNode::Var { .. } | TermNode::Const { .. } => t,
            TermNode::App { head, args } => {
                let head = self.shift_above(types, head, k, cutoff);
                let args = args
                    .into_iter()
                    .map(|a| self.shift_above(types, a, k, cutoff))
                    .collect();
                self.app(types, head, args)
            }
            TermNode::Fun { arg_ty, body } => {
                let body = self.shift_above(types, body, k, cutoff + 1);
                self.fun(types, arg_ty, body)
            }
        }
    }

    /// Evaluate `t` under an environment of optional terms indexed by de
    /// Bruijn position. `env[i]` replaces the loose index `i`; `None` leaves
    /// the index in place (shifted down past consumed binders is the
    /// caller's concern — this is raw environment lookup).
    pub fn eval(&mut self, types: &mut TypeBank, t: TermId, env: &[Option<TermId>]) -> TermId {
        self.eval_at(types, t, env, 0)
    }

    fn eval_at(
        &mut self,
        types: &mut TypeBank,
        t: TermId,
        env: &[Option<TermId>],
        depth: u32,
    ) -> TermId {
        if self.data[t.0 as usize].max_bvar < depth as i32 {
            return t;
        }
        match self.node(t).clone() {
            TermNode::BVar { index, .. } => {
                if index >= depth {
                    let pos = (index - depth) as usize;
                    match env.get(pos).copied().flatten() {
                        Some(u) => self.shift(types, u, depth),
                        None => t,
                    }
                } else {
                    t
                }
            }
            TermNode::Var { .. } | TermNode::Const { .. } => t,
            TermNode::App { head, args } => {
                let head = self.eval_at(types, head, env, depth);
                let args = args
                    .into_iter()
                    .map(|a| self.eval_at(types, a, env, depth))
                    .collect();
                let applied = self.app(types, head, args);
                // The environment may have exposed a redex at the head
                self.whnf(types, applied)
            }
            TermNode::Fun { arg_ty, body } => {
                let body = self.eval_at(types, body, env, depth + 1);
                self.fun(types, arg_ty, body)
            }
        }
    }

    /// Substitute the outermost bound variable of `t` (index 0) by `by`,
    /// shifting remaining loose indices down by one.
    pub fn subst_db(&mut self, types: &mut TypeBank, t: TermId, by: TermId) -> TermId {
        self.subst_db_at(types, t, by, 0)
    }

    fn subst_db_at(&mut self, types: &mut TypeBank, t: TermId, by: TermId, depth: u32) -> TermId {
        if self.data[t.0 as usize].max_bvar < depth as i32 {
            return t;
        }
        match self.node(t).clone() {
            TermNode::BVar { index, ty } => {
                if index == depth {
                    self.shift(types, by, depth)
                } else if index > depth {
                    self.bvar(index - 1, ty)
                } else {
                    t
                }
            }
            TermNode::Var { .. } | TermNode::Const { .. } => t,
            TermNode::App { head, args } => {
                let head = self.subst_db_at(types, head, by, depth);
                let args = args
                    .into_iter()
                    .map(|a| self.subst_db_at(types, a, by, depth))
                    .collect();
                self.app(types, head, args)
            }
            TermNode::Fun { arg_ty, body } => {
                let body = self.subst_db_at(types, body, by, depth + 1);
                self.fun(types, arg_ty, body)
            }
        }
    }

    /// Weak head normal form: contract top-level beta redexes
    pub fn whnf(&mut self, types: &mut TypeBank, t: TermId) -> TermId {
        let mut t = t;
        loop {
            match self.node(t).clone() {
                TermNode::App { head, args } => match self.node(head).clone() {
                    TermNode::Fun { body, .. } => {
                        let reduced = self.subst_db(types, body, args[0]);
                        t = self.app(types, reduced, args[1..].to_vec());
                    }
                    _ => return t,
                },
                _ => return t,
            }
        }
    }

    /// Full beta normalization
    pub fn beta_reduce(&mut self, types: &mut TypeBank, t: TermId) -> TermId {
        let t = self.whnf(types, t);
        match self.node(t).clone() {
            TermNode::Var { .. } | TermNode::BVar { .. } | TermNode::Const { .. } => t,
            TermNode::App { head, args } => {
                let head = self.beta_reduce(types, head);
                let args = args
                    .into_iter()
                    .map(|a| self.beta_reduce(types, a))
                    .collect();
                self.app(types, head, args)
            }
            TermNode::Fun { arg_ty, body } => {
                let body = self.beta_reduce(types, body);
                self.fun(types, arg_ty, body)
            }
        }
    }

    // === Positions and replacement ===

    /// Collect all rewritable subterm positions of `t` in preorder. A path
    /// element selects an argument of an `App`. Positions below binders are
    /// not collected: rewriting under a lambda could capture bound
    /// variables, so demodulation and superposition stay above them.
    pub fn rewrite_positions(&self, t: TermId) -> Vec<(TermId, Vec<u32>)> {
        let mut out = Vec::new();
        self.collect_positions(t, Vec::new(), &mut out);
        out
    }

    fn collect_positions(&self, t: TermId, path: Vec<u32>, out: &mut Vec<(TermId, Vec<u32>)>) {
        match self.node(t) {
            TermNode::BVar { .. } | TermNode::Fun { .. } => {}
            TermNode::Var { .. } | TermNode::Const { .. } => out.push((t, path)),
            TermNode::App { args, .. } => {
                out.push((t, path.clone()));
                for (i, &a) in args.iter().enumerate() {
                    let mut p = path.clone();
                    p.push(i as u32);
                    self.collect_positions(a, p, out);
                }
            }
        }
    }

    /// The subterm of `t` at `path` (inverse of `rewrite_positions` paths)
    pub fn subterm_at(&self, t: TermId, path: &[u32]) -> Option<TermId> {
        if path.is_empty() {
            return Some(t);
        }
        match self.node(t) {
            TermNode::App { args, .. } => {
                let i = path[0] as usize;
                args.get(i).and_then(|&a| self.subterm_at(a, &path[1..]))
            }
            _ => None,
        }
    }

    /// Replace the subterm of `t` at `path` by `replacement`
    pub fn replace_at(
        &mut self,
        types: &mut TypeBank,
        t: TermId,
        path: &[u32],
        replacement: TermId,
    ) -> TermId {
        if path.is_empty() {
            return replacement;
        }
        match self.node(t).clone() {
            TermNode::App { head, args } => {
                let i = path[0] as usize;
                let mut args = args;
                args[i] = self.replace_at(types, args[i], &path[1..], replacement);
                self.app(types, head, args)
            }
            _ => t,
        }
    }

    /// Replace every occurrence of `from` in `t` by `to` (used by tests and
    /// congruence-style rewriting; does not descend below binders)
    pub fn replace_term(&mut self, types: &mut TypeBank, t: TermId, from: TermId, to: TermId) -> TermId {
        if t == from {
            return to;
        }
        match self.node(t).clone() {
            TermNode::App { head, args } => {
                let head = self.replace_term(types, head, from, to);
                let args = args
                    .into_iter()
                    .map(|a| self.replace_term(types, a, from, to))
                    .collect();
                self.app(types, head, args)
            }
            _ => t,
        }
    }

    /// Display a term with symbol names resolved
    pub fn display<'a>(&'a self, sig: &'a Signature, t: TermId) -> TermDisplay<'a> {
        TermDisplay { bank: self, sig, t }
    }
}

pub struct TermDisplay<'a> {
    bank: &'a TermBank,
    sig: &'a Signature,
    t: TermId,
}

impl fmt::Display for TermDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bank.node(self.t) {
            TermNode::Var { var, .. } => write!(f, "X{}", var),
            TermNode::BVar { index, .. } => write!(f, "Y{}", index),
            TermNode::Const { sym, .. } => write!(f, "{}", self.sig.name(*sym)),
            TermNode::App { head, args } => {
                write!(f, "{}(", self.bank.display(self.sig, *head))?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", self.bank.display(self.sig, *a))?;
                }
                write!(f, ")")
            }
            TermNode::Fun { body, .. } => {
                write!(f, "^[Y]: {}", self.bank.display(self.sig, *body))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::LogicContext;

    #[test]
    fn test_hash_consing_identity() {
        let mut ctx = LogicContext::new();
        let a = ctx.const_("a");
        let f = ctx.func("f", 2);

        let x = ctx.var(0);
        let t1 = ctx.app(f, vec![a, x]);
        let t2 = ctx.app(f, vec![a, x]);
        assert_eq!(t1, t2);

        let b = ctx.const_("b");
        let t3 = ctx.app(f, vec![b, x]);
        assert_ne!(t1, t3);
    }

    #[test]
    fn test_cached_statistics() {
        let mut ctx = LogicContext::new();
        let a = ctx.const_("a");
        let f = ctx.func("f", 1);
        let x = ctx.var(0);

        // f(f(a))
        let fa = ctx.app(f, vec![a]);
        let ffa = ctx.app(f, vec![fa]);
        assert_eq!(ctx.terms.weight(ffa), 3);
        assert_eq!(ctx.terms.depth(ffa), 2);
        assert!(ctx.terms.is_ground(ffa));
        assert!(ctx.terms.free_vars(ffa).is_empty());

        let fx = ctx.app(f, vec![x]);
        assert!(!ctx.terms.is_ground(fx));
        assert_eq!(ctx.terms.free_vars(fx), &[0]);
        assert!(ctx.terms.has_free_var(fx, 0));
        assert!(!ctx.terms.has_free_var(fx, 1));
    }

    #[test]
    fn test_shift_and_subst_db() {
        let mut ctx = LogicContext::new();
        let ity = ctx.itype;
        let a = ctx.const_("a");
        let f = ctx.func("f", 1);

        let b0 = ctx.terms.bvar(0, ity);
        let fb0 = ctx.app(f, vec![b0]);
        assert!(!ctx.terms.is_closed(fb0));

        // shift by 2: f(Y0) -> f(Y2)
        let shifted = ctx.terms.shift(&mut ctx.types, fb0, 2);
        let b2 = ctx.terms.bvar(2, ity);
        let fb2 = ctx.app(f, vec![b2]);
        assert_eq!(shifted, fb2);

        // subst_db: f(Y0)[Y0 := a] = f(a)
        let substituted = ctx.terms.subst_db(&mut ctx.types, fb0, a);
        let fa = ctx.app(f, vec![a]);
        assert_eq!(substituted, fa);
    }

    #[test]
    fn test_beta_reduction() {
        let mut ctx = LogicContext::new();
        let ity = ctx.itype;
        let a = ctx.const_("a");
        let f = ctx.func("f", 1);

        // (^[Y]: f(Y)) @ a  reduces to  f(a)
        let b0 = ctx.terms.bvar(0, ity);
        let fb0 = ctx.app(f, vec![b0]);
        let lam = ctx.terms.fun(&mut ctx.types, ity, fb0);
        let redex = ctx.terms.app(&mut ctx.types, lam, vec![a]);
        let reduced = ctx.terms.beta_reduce(&mut ctx.types, redex);

        let fa = ctx.app(f, vec![a]);
        assert_eq!(reduced, fa);
        // A lambda term at clause level must end up closed
        assert!(ctx.terms.is_closed(lam));
    }

    #[test]
    fn test_eval_under_environment() {
        let mut ctx = LogicContext::new();
        let ity = ctx.itype;
        let a = ctx.const_("a");
        let f = ctx.func("f", 2);

        // f(Y0, Y1) under env [Some(a), None] = f(a, Y1)
        let b0 = ctx.terms.bvar(0, ity);
        let b1 = ctx.terms.bvar(1, ity);
        let t = ctx.app(f, vec![b0, b1]);
        let evaled = ctx.terms.eval(&mut ctx.types, t, &[Some(a), None]);
        let expected = ctx.app(f, vec![a, b1]);
        assert_eq!(evaled, expected);
    }

    #[test]
    fn test_rewrite_positions_skip_binders() {
        let mut ctx = LogicContext::new();
        let ity = ctx.itype;
        let a = ctx.const_("a");
        let g = ctx.func("g", 2);

        let b0 = ctx.terms.bvar(0, ity);
        let lam = ctx.terms.fun(&mut ctx.types, ity, b0);
        let t = ctx.app(g, vec![a, lam]);

        let positions = ctx.terms.rewrite_positions(t);
        // g(a, ^[Y]: Y) itself and the subterm a; nothing under the lambda
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].0, t);
        assert_eq!(positions[1].0, a);
    }

    #[test]
    fn test_replace_at_path() {
        let mut ctx = LogicContext::new();
        let a = ctx.const_("a");
        let b = ctx.const_("b");
        let f = ctx.func("f", 1);
        let g = ctx.func("g", 2);

        // g(f(a), b), replace at path [0, 0]: g(f(b), b)
        let fa = ctx.app(f, vec![a]);
        let t = ctx.app(g, vec![fa, b]);
        let replaced = ctx.terms.replace_at(&mut ctx.types, t, &[0, 0], b);

        let fb = ctx.app(f, vec![b]);
        let expected = ctx.app(g, vec![fb, b]);
        assert_eq!(replaced, expected);
    }
}
