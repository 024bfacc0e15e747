//! Clauses: multisets of literals with a trail and a proof record
//!
//! The literal vector is semantically a multiset; its representation order
//! is fixed at construction (renaming-invariant sort, then canonical
//! variable renaming in first-occurrence order) so that renamed variants of
//! the same clause usually share one representation and the clause database
//! can intern them by structural key.

use super::literal::Literal;
use super::subst::{Renaming, Substitution};
use super::term::TermBank;
use crate::logic::{LogicContext, Signature};
use crate::order::{SimplificationOrdering, TermOrdering};
use crate::proof::ProofStep;
use crate::logic::term::TermId;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Role of a clause in the problem (from the input or derived)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub enum ClauseRole {
    #[default]
    Axiom,
    Hypothesis,
    NegatedConjecture,
    Derived,
}

impl ClauseRole {
    pub fn from_tptp_role(role: &str) -> Self {
        match role {
            "hypothesis" => ClauseRole::Hypothesis,
            "negated_conjecture" | "conjecture" => ClauseRole::NegatedConjecture,
            _ => ClauseRole::Axiom,
        }
    }

    pub fn is_goal(&self) -> bool {
        matches!(self, ClauseRole::NegatedConjecture)
    }
}

/// Set of boolean assumption ids under which a clause holds.
/// Empty means the clause is unconditional.
pub type Trail = BTreeSet<u32>;

/// A clause: disjunction of literals under a trail of assumptions
#[derive(Debug, Clone)]
pub struct Clause {
    pub id: Option<usize>,
    pub literals: Vec<Literal>,
    pub trail: Trail,
    pub role: ClauseRole,
    /// Iteration at which the clause was created (0 for input clauses)
    pub age: usize,
    /// Indexes of literals chosen by the selection function
    pub selected: Vec<usize>,
    pub proof: Arc<ProofStep>,
}

impl Clause {
    /// Build a clause in canonical form: duplicate literals removed,
    /// literals sorted by a renaming-invariant key, variables renamed to
    /// 0..n in first-occurrence order.
    pub fn new(ctx: &mut LogicContext, literals: Vec<Literal>, trail: Trail, proof: Arc<ProofStep>) -> Self {
        let mut literals = literals;

        // Renaming-invariant sort: polarity, side weights, side depths, head symbols
        literals.sort_by_key(|lit| approx_key(&ctx.terms, lit));

        // Canonical variable renaming via an empty substitution with a
        // shared renaming (allocates 0, 1, ... in traversal order)
        let subst = Substitution::new();
        let mut renaming = Renaming::new();
        for lit in literals.iter_mut() {
            lit.lhs = super::subst::apply(&mut ctx.terms, &mut ctx.types, &subst, &mut renaming, lit.lhs, 0);
            lit.rhs = super::subst::apply(&mut ctx.terms, &mut ctx.types, &subst, &mut renaming, lit.rhs, 0);
        }

        // Duplicate removal after renaming (catches renamed duplicates)
        let mut seen: Vec<Literal> = Vec::with_capacity(literals.len());
        for lit in literals {
            if !seen.contains(&lit) {
                seen.push(lit);
            }
        }

        Clause {
            id: None,
            literals: seen,
            trail,
            role: ClauseRole::Derived,
            age: 0,
            selected: Vec::new(),
            proof,
        }
    }

    /// An input clause with an axiom proof step
    pub fn input(ctx: &mut LogicContext, literals: Vec<Literal>, name: &str, role: ClauseRole) -> Self {
        let proof = Arc::new(ProofStep::Axiom {
            name: name.to_string(),
            role,
        });
        let mut clause = Clause::new(ctx, literals, Trail::new(), proof);
        clause.role = role;
        clause
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// An empty clause refutes the problem only when unconditional
    pub fn is_refutation(&self) -> bool {
        self.is_empty() && self.trail.is_empty()
    }

    pub fn weight(&self, bank: &TermBank) -> u32 {
        self.literals.iter().map(|l| l.weight(bank)).sum()
    }

    pub fn max_depth(&self, bank: &TermBank) -> u32 {
        self.literals
            .iter()
            .map(|l| bank.depth(l.lhs).max(bank.depth(l.rhs)))
            .max()
            .unwrap_or(0)
    }

    /// Sorted free variables of the clause
    pub fn vars(&self, bank: &TermBank) -> Vec<u32> {
        let mut vars = Vec::new();
        for lit in &self.literals {
            lit.collect_vars(bank, &mut vars);
        }
        vars
    }

    pub fn is_ground(&self, bank: &TermBank) -> bool {
        self.literals.iter().all(|l| l.is_ground(bank))
    }

    /// Tautology: a trivially true literal or a complementary pair
    pub fn is_tautology(&self) -> bool {
        for (i, lit) in self.literals.iter().enumerate() {
            if lit.is_trivially_true() {
                return true;
            }
            for other in &self.literals[i + 1..] {
                if lit.lhs == other.lhs
                    && lit.rhs == other.rhs
                    && lit.positive != other.positive
                {
                    return true;
                }
            }
        }
        false
    }

    /// Unit positive equations feed the simplification set
    pub fn is_unit_positive_eq(&self) -> bool {
        self.literals.len() == 1 && self.literals[0].positive
    }

    /// Refresh every literal's cached orientation under `ord`, swapping
    /// sides so the larger side comes first where the ordering decides.
    pub fn orient(&mut self, ord: &dyn SimplificationOrdering, bank: &TermBank) {
        for lit in self.literals.iter_mut() {
            match ord.compare(bank, lit.lhs, lit.rhs) {
                TermOrdering::Less => {
                    std::mem::swap(&mut lit.lhs, &mut lit.rhs);
                    lit.orientation = TermOrdering::Greater;
                }
                other => lit.orientation = other,
            }
        }
        // Side swaps may perturb the representation order
        self.literals.sort_by_key(|lit| approx_key(bank, lit));
        self.selected.clear();
    }

    /// Structural key for clause interning: literal triples plus trail.
    /// Clauses with identical canonical forms collide here.
    pub fn canonical_key(&self) -> (Vec<(bool, u32, u32)>, Vec<u32>) {
        let lits = self
            .literals
            .iter()
            .map(|l| (l.positive, l.lhs.as_u32(), l.rhs.as_u32()))
            .collect();
        let trail = self.trail.iter().copied().collect();
        (lits, trail)
    }

    pub fn display<'a>(&'a self, bank: &'a TermBank, sig: &'a Signature, true_: TermId) -> ClauseDisplay<'a> {
        ClauseDisplay {
            clause: self,
            bank,
            sig,
            true_,
        }
    }
}

fn approx_key(bank: &TermBank, lit: &Literal) -> (bool, u32, u32, u32, u32, u32, u32) {
    (
        lit.positive,
        lit.weight(bank),
        bank.depth(lit.lhs),
        bank.depth(lit.rhs),
        bank.head_symbol(lit.lhs).map(|s| s.as_u32() + 1).unwrap_or(0),
        bank.head_symbol(lit.rhs).map(|s| s.as_u32() + 1).unwrap_or(0),
        bank.weight(lit.lhs),
    )
}

pub struct ClauseDisplay<'a> {
    clause: &'a Clause,
    bank: &'a TermBank,
    sig: &'a Signature,
    true_: TermId,
}

impl fmt::Display for ClauseDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clause.is_empty() {
            return write!(f, "$false");
        }
        for (i, lit) in self.clause.literals.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", lit.display(self.bank, self.sig, self.true_))?;
        }
        if !self.clause.trail.is_empty() {
            write!(f, " <- [")?;
            for (i, a) in self.clause.trail.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "a{}", a)?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::LogicContext;
    use crate::proof::ProofStep;

    fn axiom() -> Arc<ProofStep> {
        Arc::new(ProofStep::Axiom {
            name: "c".into(),
            role: ClauseRole::Axiom,
        })
    }

    #[test]
    fn test_canonical_renaming_merges_variants() {
        let mut ctx = LogicContext::new();
        let p = ctx.pred("p", 2);
        let x = ctx.var(4);
        let y = ctx.var(9);
        let atom1 = ctx.app(p, vec![x, y]);

        let u = ctx.var(1);
        let v = ctx.var(7);
        let atom2 = ctx.app(p, vec![u, v]);

        let lit1 = vec![Literal::prop(&ctx, atom1, true)];
        let c1 = Clause::new(&mut ctx, lit1, Trail::new(), axiom());
        let lit2 = vec![Literal::prop(&ctx, atom2, true)];
        let c2 = Clause::new(&mut ctx, lit2, Trail::new(), axiom());

        assert_eq!(c1.canonical_key(), c2.canonical_key());
        assert_eq!(c1.vars(&ctx.terms), vec![0, 1]);
    }

    #[test]
    fn test_duplicate_literals_removed() {
        let mut ctx = LogicContext::new();
        let p = ctx.pred("p", 1);
        let x = ctx.var(0);
        let y = ctx.var(3);
        let px = ctx.app(p, vec![x]);
        let py = ctx.app(p, vec![y]);

        // p(X) | p(Y) where both rename to p(X0) after canonicalization? No:
        // distinct variables stay distinct. But p(X) | p(X) collapses.
        let lits1 = vec![Literal::prop(&ctx, px, true), Literal::prop(&ctx, px, true)];
        let c = Clause::new(&mut ctx, lits1, Trail::new(), axiom());
        assert_eq!(c.literals.len(), 1);

        let lits2 = vec![Literal::prop(&ctx, px, true), Literal::prop(&ctx, py, true)];
        let c2 = Clause::new(&mut ctx, lits2, Trail::new(), axiom());
        assert_eq!(c2.literals.len(), 2);
    }

    #[test]
    fn test_tautology_detection() {
        let mut ctx = LogicContext::new();
        let p = ctx.pred("p", 1);
        let a = ctx.const_("a");
        let pa = ctx.app(p, vec![a]);

        let taut_lits = vec![Literal::prop(&ctx, pa, true), Literal::prop(&ctx, pa, false)];
        let taut = Clause::new(&mut ctx, taut_lits, Trail::new(), axiom());
        assert!(taut.is_tautology());

        let refl = Clause::new(&mut ctx, vec![Literal::eqn(a, a, true)], Trail::new(), axiom());
        assert!(refl.is_tautology());

        let fine_lits = vec![Literal::prop(&ctx, pa, true)];
        let fine = Clause::new(&mut ctx, fine_lits, Trail::new(), axiom());
        assert!(!fine.is_tautology());
    }

    #[test]
    fn test_refutation_requires_empty_trail() {
        let mut ctx = LogicContext::new();
        let empty = Clause::new(&mut ctx, vec![], Trail::new(), axiom());
        assert!(empty.is_refutation());

        let mut trail = Trail::new();
        trail.insert(3);
        let conditional = Clause::new(&mut ctx, vec![], trail, axiom());
        assert!(conditional.is_empty());
        assert!(!conditional.is_refutation());
    }
}
