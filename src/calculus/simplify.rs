//! Simplification rules
//!
//! Each rule rewrites a clause to a simpler one or deletes it, preserving
//! logical consequence and never increasing the clause ordering. The
//! engine drives forward rules to a fixpoint on every clause leaving
//! Passive, and runs backward rules with each freshly activated clause.

use super::subsumption::{subsumes, subsumption_resolution};
use super::{BackwardChange, Simplification, SimplifyingRule};
use crate::index::ActiveIndexes;
use crate::logic::literal::Literal;
use crate::logic::subst::apply_match;
use crate::logic::{Clause, LogicContext, ScopedVar, Substitution, TermId, Trail};
use crate::order::{SimplificationOrdering, TermOrdering};
use crate::proof::ProofStep;
use crate::saturation::state::ProofState;
use crate::unify::{match_into, match_locked, unify_into};
use std::collections::HashSet;
use std::sync::Arc;

/// Cheap clean-up applied to every generated clause before it is stored:
/// trivially false literals disappear. Not an inference of its own — the
/// conclusion keeps the generating step's proof.
pub fn basic_simplify(ctx: &mut LogicContext, clause: Clause) -> Clause {
    if !clause.literals.iter().any(|l| l.is_trivially_false()) {
        return clause;
    }
    let lits: Vec<Literal> = clause
        .literals
        .iter()
        .copied()
        .filter(|l| !l.is_trivially_false())
        .collect();
    let proof = clause.proof.clone();
    let trail = clause.trail.clone();
    let mut simplified = Clause::new(ctx, lits, trail, proof);
    simplified.role = clause.role;
    simplified
}

/// Proof parents for a simplification of `clause` by `other`
fn simpl_parents(other: usize, clause: &Clause) -> Vec<usize> {
    let mut parents = vec![other];
    if let Some(id) = clause.id {
        parents.push(id);
    }
    parents
}

// =============================================================================
// Tautology deletion
// =============================================================================

/// Delete clauses containing `t ≈ t` or a complementary literal pair
pub struct TautologyRule;

impl SimplifyingRule for TautologyRule {
    fn name(&self) -> &'static str {
        "tautology_deletion"
    }

    fn simplify_forward(
        &self,
        _ctx: &mut LogicContext,
        _ord: &dyn SimplificationOrdering,
        _state: &ProofState,
        _indexes: &ActiveIndexes,
        clause: &Clause,
    ) -> Option<Simplification> {
        if clause.is_tautology() {
            Some(Simplification::Deleted {
                rule: "tautology_deletion",
            })
        } else {
            None
        }
    }
}

// =============================================================================
// Demodulation
// =============================================================================

/// Rewriting with oriented unit equations from the simplification set
pub struct DemodulationRule;

/// Try to rewrite one subterm of `clause` with the unit equation
/// `unit_idx`. Returns the rewritten clause on success.
fn rewrite_with_unit(
    ctx: &mut LogicContext,
    ord: &dyn SimplificationOrdering,
    unit_idx: usize,
    unit: &Clause,
    clause: &Clause,
) -> Option<Clause> {
    let ulit = unit.literals[0];
    let directions: Vec<(TermId, TermId)> = match ulit.orientation {
        TermOrdering::Greater => vec![(ulit.lhs, ulit.rhs)],
        TermOrdering::Incomparable => vec![(ulit.lhs, ulit.rhs), (ulit.rhs, ulit.lhs)],
        _ => return None,
    };

    // Variables of the rewritten clause must never be bound
    let locked: HashSet<ScopedVar> = clause
        .vars(&ctx.terms)
        .into_iter()
        .map(|v| ScopedVar::new(v, 0))
        .collect();

    for (li, lit) in clause.literals.iter().enumerate() {
        for lhs_side in [true, false] {
            let side = if lhs_side { lit.lhs } else { lit.rhs };
            for (sub, path) in ctx.terms.rewrite_positions(side) {
                // Rewriting happens at term positions only; atom-level
                // replacement is superposition's and subsumption's job
                if ctx.terms.is_var(sub) || ctx.terms.ty(sub) == ctx.otype {
                    continue;
                }
                for &(l, r) in &directions {
                    if ctx.terms.is_var(l) {
                        continue;
                    }
                    let subst = match match_locked(&ctx.terms, &locked, l, 1, sub, 0) {
                        Ok(s) => s,
                        Err(_) => continue,
                    };
                    let r_inst = apply_match(&mut ctx.terms, &mut ctx.types, &subst, r, 1);
                    // lσ ≻ rσ, so the rewrite strictly decreases the clause
                    if ord.compare(&ctx.terms, sub, r_inst) != TermOrdering::Greater {
                        continue;
                    }
                    let new_side = ctx.terms.replace_at(&mut ctx.types, side, &path, r_inst);
                    let mut lits = clause.literals.clone();
                    lits[li] = if lhs_side {
                        Literal::eqn(new_side, lit.rhs, lit.positive)
                    } else {
                        Literal::eqn(lit.lhs, new_side, lit.positive)
                    };
                    let trail: Trail = clause.trail.union(&unit.trail).copied().collect();
                    let proof = Arc::new(ProofStep::Inference {
                        rule: "demodulation",
                        parents: simpl_parents(unit_idx, clause),
                    });
                    let mut out = Clause::new(ctx, lits, trail, proof);
                    out.role = clause.role;
                    return Some(out);
                }
            }
        }
    }
    None
}

impl SimplifyingRule for DemodulationRule {
    fn name(&self) -> &'static str {
        "demodulation"
    }

    fn simplify_forward(
        &self,
        ctx: &mut LogicContext,
        ord: &dyn SimplificationOrdering,
        state: &ProofState,
        indexes: &ActiveIndexes,
        clause: &Clause,
    ) -> Option<Simplification> {
        // Find candidate units through the demodulation index
        for lit in &clause.literals {
            for side in [lit.lhs, lit.rhs] {
                for (sub, _path) in ctx.terms.rewrite_positions(side) {
                    if ctx.terms.is_var(sub) || ctx.terms.ty(sub) == ctx.otype {
                        continue;
                    }
                    for entry in indexes.demod.retrieve_generalizations(&ctx.terms, sub) {
                        if Some(entry.clause) == clause.id {
                            continue;
                        }
                        let unit = state.clause(entry.clause);
                        if let Some(rewritten) =
                            rewrite_with_unit(ctx, ord, entry.clause, unit, clause)
                        {
                            return Some(Simplification::Replaced(rewritten));
                        }
                    }
                }
            }
        }
        None
    }

    fn simplify_backward(
        &self,
        ctx: &mut LogicContext,
        ord: &dyn SimplificationOrdering,
        state: &ProofState,
        _indexes: &ActiveIndexes,
        given: usize,
    ) -> Vec<BackwardChange> {
        let unit = state.clause(given);
        if !unit.is_unit_positive_eq() {
            return Vec::new();
        }
        let mut changes = Vec::new();
        let unit = unit.clone();
        for target_idx in state.active.iter().copied() {
            if target_idx == given {
                continue;
            }
            let target = state.clause(target_idx).clone();
            if let Some(rewritten) = rewrite_with_unit(ctx, ord, given, &unit, &target) {
                changes.push(BackwardChange {
                    target: target_idx,
                    replacement: Some(rewritten),
                    rule: "demodulation",
                });
            }
        }
        changes
    }
}

// =============================================================================
// Simplify-reflect
// =============================================================================

/// Positive and negative simplify-reflect: a unit equation (or unit
/// disequation) refutes one literal of the clause, which is removed.
pub struct SimplifyReflectRule;

/// Match both sides of a unit equation onto both sides of a literal,
/// sharing one substitution (unit in scope 1, literal in scope 0).
fn double_match(
    ctx: &LogicContext,
    l: TermId,
    r: TermId,
    s: TermId,
    t: TermId,
) -> Option<Substitution> {
    let locked = HashSet::new();
    for (a, b) in [(s, t), (t, s)] {
        let mut subst = Substitution::new();
        if match_into(&ctx.terms, &mut subst, &locked, l, 1, a, 0).is_ok()
            && match_into(&ctx.terms, &mut subst, &locked, r, 1, b, 0).is_ok()
        {
            return Some(subst);
        }
    }
    None
}

impl SimplifyingRule for SimplifyReflectRule {
    fn name(&self) -> &'static str {
        "simplify_reflect"
    }

    fn simplify_forward(
        &self,
        ctx: &mut LogicContext,
        _ord: &dyn SimplificationOrdering,
        state: &ProofState,
        _indexes: &ActiveIndexes,
        clause: &Clause,
    ) -> Option<Simplification> {
        for (li, lit) in clause.literals.iter().enumerate() {
            // Positive simplify-reflect: unit l ≈ r eliminates s ≉ t
            // when (l ≈ r)σ = (s ≈ t)
            let units = if lit.positive {
                &state.neg_units
            } else {
                &state.simpl_set
            };
            for &unit_idx in units.iter() {
                if Some(unit_idx) == clause.id {
                    continue;
                }
                let unit = state.clause(unit_idx);
                let ulit = unit.literals[0];
                if double_match(ctx, ulit.lhs, ulit.rhs, lit.lhs, lit.rhs).is_some() {
                    let lits: Vec<Literal> = clause
                        .literals
                        .iter()
                        .copied()
                        .enumerate()
                        .filter(|&(i, _)| i != li)
                        .map(|(_, l)| l)
                        .collect();
                    let trail: Trail = clause.trail.union(&unit.trail).copied().collect();
                    let proof = Arc::new(ProofStep::Inference {
                        rule: "simplify_reflect",
                        parents: simpl_parents(unit_idx, clause),
                    });
                    let mut out = Clause::new(ctx, lits, trail, proof);
                    out.role = clause.role;
                    return Some(Simplification::Replaced(out));
                }
            }
        }
        None
    }
}

// =============================================================================
// Contextual literal cutting (subsumption resolution)
// =============================================================================

/// Remove a literal `L` from `C` when some active clause subsumes
/// `C` with `¬L` in place of `L`.
pub struct LiteralCuttingRule;

impl SimplifyingRule for LiteralCuttingRule {
    fn name(&self) -> &'static str {
        "subsumption_resolution"
    }

    fn simplify_forward(
        &self,
        ctx: &mut LogicContext,
        _ord: &dyn SimplificationOrdering,
        state: &ProofState,
        indexes: &ActiveIndexes,
        clause: &Clause,
    ) -> Option<Simplification> {
        // The feature filter is approximate here (the flipped literal moves
        // a polarity count), so this misses some cuts; never unsound.
        let candidates = indexes.features.potential_subsumers(&ctx.terms, clause);
        for d_idx in candidates {
            if Some(d_idx) == clause.id {
                continue;
            }
            let d = state.clause(d_idx);
            if let Some(cut) = subsumption_resolution(ctx, d, clause) {
                let lits: Vec<Literal> = clause
                    .literals
                    .iter()
                    .copied()
                    .enumerate()
                    .filter(|&(i, _)| i != cut)
                    .map(|(_, l)| l)
                    .collect();
                let trail: Trail = clause.trail.union(&d.trail).copied().collect();
                let proof = Arc::new(ProofStep::Inference {
                    rule: "subsumption_resolution",
                    parents: simpl_parents(d_idx, clause),
                });
                let mut out = Clause::new(ctx, lits, trail, proof);
                out.role = clause.role;
                return Some(Simplification::Replaced(out));
            }
        }
        None
    }
}

// =============================================================================
// Condensation
// =============================================================================

/// Internal subsumption: unifying two literals of the clause yields a
/// strictly smaller clause that subsumes the original.
pub struct CondensationRule;

impl SimplifyingRule for CondensationRule {
    fn name(&self) -> &'static str {
        "condensation"
    }

    fn simplify_forward(
        &self,
        ctx: &mut LogicContext,
        _ord: &dyn SimplificationOrdering,
        _state: &ProofState,
        _indexes: &ActiveIndexes,
        clause: &Clause,
    ) -> Option<Simplification> {
        let n = clause.literals.len();
        if n < 2 {
            return None;
        }
        for i in 0..n {
            for j in (i + 1)..n {
                let a = clause.literals[i];
                let b = clause.literals[j];
                if a.positive != b.positive {
                    continue;
                }
                // Straight and swapped pairings of the equation sides
                for (bl, br) in [(b.lhs, b.rhs), (b.rhs, b.lhs)] {
                    let mut subst = Substitution::new();
                    if unify_into(&ctx.terms, &mut subst, a.lhs, 0, bl, 0).is_err()
                        || unify_into(&ctx.terms, &mut subst, a.rhs, 0, br, 0).is_err()
                    {
                        continue;
                    }
                    let mut renaming = crate::logic::Renaming::new();
                    let lits: Vec<Literal> = clause
                        .literals
                        .iter()
                        .enumerate()
                        .filter(|&(k, _)| k != j)
                        .map(|(_, lit)| {
                            let lhs = crate::logic::subst::apply(
                                &mut ctx.terms,
                                &mut ctx.types,
                                &subst,
                                &mut renaming,
                                lit.lhs,
                                0,
                            );
                            let rhs = crate::logic::subst::apply(
                                &mut ctx.terms,
                                &mut ctx.types,
                                &subst,
                                &mut renaming,
                                lit.rhs,
                                0,
                            );
                            Literal::eqn(lhs, rhs, lit.positive)
                        })
                        .collect();
                    let proof = Arc::new(ProofStep::Inference {
                        rule: "condensation",
                        parents: clause.id.into_iter().collect(),
                    });
                    let mut candidate =
                        Clause::new(ctx, lits, clause.trail.clone(), proof);
                    candidate.role = clause.role;
                    if candidate.literals.len() < n && subsumes(ctx, &candidate, clause) {
                        return Some(Simplification::Replaced(candidate));
                    }
                }
            }
        }
        None
    }
}
