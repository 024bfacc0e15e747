//! Clause and term indexes for the saturation loop

pub mod disc_tree;
pub mod feature_vector;

pub use disc_tree::{DiscTree, FlatKey};
pub use feature_vector::{FeatureIndex, FeatureVector};

use crate::logic::{Clause, LogicContext, TermId};
use crate::order::{SimplificationOrdering, TermOrdering};
use crate::select::eligible_literals;

/// A root position of an (eligible, positive) equation side in the active
/// set: superposition *from* this equation rewrites other clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EqSideEntry {
    pub clause: usize,
    pub lit: usize,
    /// true = the literal's lhs, false = its rhs
    pub lhs_side: bool,
}

/// A rewritable subterm position inside an eligible literal of an active
/// clause: superposition *into* this position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtermEntry {
    pub clause: usize,
    pub lit: usize,
    pub lhs_side: bool,
    pub path: Vec<u32>,
}

/// Sides of a literal usable for rewriting under its cached orientation:
/// the larger side, or both when incomparable. Shared by the indexes and
/// the superposition rule so insertion and retrieval agree.
pub fn oriented_sides(lit: &crate::logic::Literal) -> Vec<(TermId, bool)> {
    match lit.orientation {
        TermOrdering::Greater | TermOrdering::Equal => vec![(lit.lhs, true)],
        TermOrdering::Less => vec![(lit.rhs, false)],
        TermOrdering::Incomparable => vec![(lit.lhs, true), (lit.rhs, false)],
    }
}

enum Entry {
    From(TermId, EqSideEntry),
    Into(TermId, SubtermEntry),
}

/// All index entries contributed by one active clause. Eligibility is
/// recomputed from the stored selection and orientation, so removal
/// mirrors insertion exactly as long as the clause is not re-oriented in
/// between.
fn clause_entries(
    ctx: &LogicContext,
    ord: &dyn SimplificationOrdering,
    idx: usize,
    clause: &Clause,
) -> Vec<Entry> {
    let mut out = Vec::new();
    for lit_idx in eligible_literals(ord, &ctx.terms, clause) {
        let lit = &clause.literals[lit_idx];

        // Superposition-from: positive equations only
        if lit.positive {
            for (side, lhs_side) in oriented_sides(lit) {
                out.push(Entry::From(
                    side,
                    EqSideEntry {
                        clause: idx,
                        lit: lit_idx,
                        lhs_side,
                    },
                ));
            }
        }

        // Superposition-into: every non-variable subterm on a maximal side
        for (side, lhs_side) in oriented_sides(lit) {
            for (sub, path) in ctx.terms.rewrite_positions(side) {
                if ctx.terms.is_var(sub) || sub == ctx.true_ {
                    continue;
                }
                out.push(Entry::Into(
                    sub,
                    SubtermEntry {
                        clause: idx,
                        lit: lit_idx,
                        lhs_side,
                        path,
                    },
                ));
            }
        }
    }
    out
}

/// The index family maintained over the active set plus the demodulation
/// index over the unit-equation simplification set.
#[derive(Debug, Default)]
pub struct ActiveIndexes {
    /// Maximal sides of unit positive equations (the simplification set)
    pub demod: DiscTree<EqSideEntry>,
    /// Eligible positive equation sides in Active (superposition "from")
    pub sup_from: DiscTree<EqSideEntry>,
    /// Rewritable subterm positions of eligible literals (superposition "into")
    pub sup_into: DiscTree<SubtermEntry>,
    /// Subsumption candidate filter
    pub features: FeatureIndex,
}

impl ActiveIndexes {
    pub fn new() -> Self {
        ActiveIndexes::default()
    }

    /// Index a clause entering the active set
    pub fn add_active(
        &mut self,
        ctx: &LogicContext,
        ord: &dyn SimplificationOrdering,
        idx: usize,
        clause: &Clause,
    ) {
        self.features.insert(&ctx.terms, idx, clause);
        for entry in clause_entries(ctx, ord, idx, clause) {
            match entry {
                Entry::From(term, e) => self.sup_from.insert(&ctx.terms, term, e),
                Entry::Into(term, e) => self.sup_into.insert(&ctx.terms, term, e),
            }
        }
    }

    /// Remove a clause leaving the active set
    pub fn remove_active(
        &mut self,
        ctx: &LogicContext,
        ord: &dyn SimplificationOrdering,
        idx: usize,
        clause: &Clause,
    ) {
        self.features.remove(idx);
        for entry in clause_entries(ctx, ord, idx, clause) {
            match entry {
                Entry::From(term, e) => self.sup_from.remove(&ctx.terms, term, &e),
                Entry::Into(term, e) => self.sup_into.remove(&ctx.terms, term, &e),
            }
        }
    }

    /// Add a unit positive equation to the simplification set. Sides of
    /// propositional type are not rewrite sources and stay unindexed.
    pub fn add_simpl(&mut self, ctx: &LogicContext, idx: usize, clause: &Clause) {
        debug_assert!(clause.is_unit_positive_eq());
        let lit = &clause.literals[0];
        for (side, lhs_side) in oriented_sides(lit) {
            if ctx.terms.is_var(side) || ctx.terms.ty(side) == ctx.otype {
                continue;
            }
            self.demod.insert(
                &ctx.terms,
                side,
                EqSideEntry {
                    clause: idx,
                    lit: 0,
                    lhs_side,
                },
            );
        }
    }

    pub fn remove_simpl(&mut self, ctx: &LogicContext, idx: usize, clause: &Clause) {
        if !clause.is_unit_positive_eq() {
            return;
        }
        let lit = &clause.literals[0];
        for (side, lhs_side) in oriented_sides(lit) {
            if ctx.terms.is_var(side) || ctx.terms.ty(side) == ctx.otype {
                continue;
            }
            self.demod.remove(
                &ctx.terms,
                side,
                &EqSideEntry {
                    clause: idx,
                    lit: 0,
                    lhs_side,
                },
            );
        }
    }
}
