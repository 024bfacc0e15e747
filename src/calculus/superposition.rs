//! Generating rules: superposition, equality resolution, equality factoring
//!
//! Superposition: from `C ∨ l ≈ r` and `D[s]` with `σ = mgu(l, s)`, `s` not
//! a variable, `lσ ⊀ rσ`, `(l ≈ r)σ` strictly maximal in the first premise,
//! and the rewritten position on a maximal side of an eligible literal of
//! `D`, derive `(C ∨ D[r])σ`. Equality resolution and factoring are the two
//! unary rules of the calculus. Unification failure is rule-local; pairs
//! outside the first-order fragment are retried with the higher-order
//! pattern unifier and skipped if still inapplicable.

use super::GeneratingRule;
use crate::index::{oriented_sides, ActiveIndexes};
use crate::logic::literal::Literal;
use crate::logic::subst::{apply, Renaming};
use crate::logic::{Clause, LogicContext, Substitution, TermId, Trail};
use crate::order::{
    compare_literals, SimplificationOrdering, TermOrdering,
};
use crate::proof::ProofStep;
use crate::saturation::state::ProofState;
use crate::select::eligible_literals;
use crate::unify::{pattern, unify, UnificationError};
use std::sync::Arc;

/// Unify, falling back to higher-order pattern unification when the pair
/// is outside the first-order fragment. `None` means the inference is
/// inapplicable.
pub fn full_unify(
    ctx: &mut LogicContext,
    t1: TermId,
    scope1: u8,
    t2: TermId,
    scope2: u8,
) -> Option<Substitution> {
    match unify(&ctx.terms, t1, scope1, t2, scope2) {
        Ok(s) => Some(s),
        Err(UnificationError::NotInFragment) => pattern::unify_ho(ctx, t1, scope1, t2, scope2).ok(),
        Err(_) => None,
    }
}

/// Apply `subst` to every literal of a clause at `scope`, sharing the
/// renaming across calls so variables stay coherent within one inference.
fn instantiate_literals(
    ctx: &mut LogicContext,
    subst: &Substitution,
    renaming: &mut Renaming,
    clause: &Clause,
    scope: u8,
) -> Vec<Literal> {
    clause
        .literals
        .iter()
        .map(|lit| {
            let lhs = apply(&mut ctx.terms, &mut ctx.types, subst, renaming, lit.lhs, scope);
            let rhs = apply(&mut ctx.terms, &mut ctx.types, subst, renaming, lit.rhs, scope);
            Literal::eqn(lhs, rhs, lit.positive)
        })
        .collect()
}

fn strictly_maximal(
    ord: &dyn SimplificationOrdering,
    ctx: &LogicContext,
    lits: &[Literal],
    idx: usize,
) -> bool {
    lits.iter().enumerate().all(|(j, other)| {
        j == idx || compare_literals(ord, &ctx.terms, &lits[idx], other) == TermOrdering::Greater
    })
}

fn maximal(
    ord: &dyn SimplificationOrdering,
    ctx: &LogicContext,
    lits: &[Literal],
    idx: usize,
) -> bool {
    lits.iter().enumerate().all(|(j, other)| {
        j == idx || compare_literals(ord, &ctx.terms, other, &lits[idx]) != TermOrdering::Greater
    })
}

/// Superposition between the given clause and the active set (and the
/// given clause with itself; it is active by the time generation runs)
pub struct SuperpositionRule;

impl GeneratingRule for SuperpositionRule {
    fn name(&self) -> &'static str {
        "superposition"
    }

    fn generate(
        &self,
        ctx: &mut LogicContext,
        ord: &dyn SimplificationOrdering,
        state: &ProofState,
        indexes: &ActiveIndexes,
        given: usize,
    ) -> Vec<Clause> {
        let mut out = Vec::new();
        let given_clause = state.clause(given).clone();
        let eligible = eligible_literals(ord, &ctx.terms, &given_clause);

        // Direction 1: the given clause is the equation premise
        for &lit_idx in &eligible {
            let lit = given_clause.literals[lit_idx];
            if !lit.positive {
                continue;
            }
            for (l, lhs_side) in oriented_sides(&lit) {
                if ctx.terms.is_var(l) || l == ctx.true_ {
                    continue;
                }
                let r = if lhs_side { lit.rhs } else { lit.lhs };
                for entry in indexes.sup_into.retrieve_unifiable(&ctx.terms, l) {
                    let into_clause = state.clause(entry.clause);
                    let into_side = if entry.lhs_side {
                        into_clause.literals[entry.lit].lhs
                    } else {
                        into_clause.literals[entry.lit].rhs
                    };
                    let s = match ctx.terms.subterm_at(into_side, &entry.path) {
                        Some(s) => s,
                        None => continue,
                    };
                    superpose(
                        ctx,
                        ord,
                        (given, &given_clause, lit_idx, l, r),
                        (entry.clause, into_clause, entry.lit, entry.lhs_side, &entry.path, s),
                        &mut out,
                    );
                }
            }
        }

        // Direction 2: the given clause is rewritten by active equations
        for &lit_idx in &eligible {
            let lit = given_clause.literals[lit_idx];
            for (side, lhs_side) in oriented_sides(&lit) {
                for (s, path) in ctx.terms.rewrite_positions(side) {
                    if ctx.terms.is_var(s) || s == ctx.true_ {
                        continue;
                    }
                    for entry in indexes.sup_from.retrieve_unifiable(&ctx.terms, s) {
                        // Given-with-given pairs are covered by direction 1
                        if entry.clause == given {
                            continue;
                        }
                        let from_clause = state.clause(entry.clause);
                        let from_lit = from_clause.literals[entry.lit];
                        let (l, r) = if entry.lhs_side {
                            (from_lit.lhs, from_lit.rhs)
                        } else {
                            (from_lit.rhs, from_lit.lhs)
                        };
                        if ctx.terms.is_var(l) || l == ctx.true_ {
                            continue;
                        }
                        superpose(
                            ctx,
                            ord,
                            (entry.clause, from_clause, entry.lit, l, r),
                            (given, &given_clause, lit_idx, lhs_side, &path, s),
                            &mut out,
                        );
                    }
                }
            }
        }

        out
    }
}

/// One superposition attempt. The equation premise lives in scope 0, the
/// rewritten premise in scope 1.
fn superpose(
    ctx: &mut LogicContext,
    ord: &dyn SimplificationOrdering,
    from: (usize, &Clause, usize, TermId, TermId),
    into: (usize, &Clause, usize, bool, &[u32], TermId),
    out: &mut Vec<Clause>,
) {
    let (from_idx, from_clause, from_lit_idx, l, r) = from;
    let (into_idx, into_clause, into_lit_idx, into_lhs_side, path, s) = into;

    if ctx.terms.is_var(s) {
        return;
    }
    let subst = match full_unify(ctx, l, 0, s, 1) {
        Some(s) => s,
        None => return,
    };

    let mut renaming = Renaming::new();
    let l_inst = apply(&mut ctx.terms, &mut ctx.types, &subst, &mut renaming, l, 0);
    let r_inst = apply(&mut ctx.terms, &mut ctx.types, &subst, &mut renaming, r, 0);

    // The equation must be positively oriented after instantiation
    match ord.compare(&ctx.terms, l_inst, r_inst) {
        TermOrdering::Less | TermOrdering::Equal => return,
        _ => {}
    }

    let from_lits = instantiate_literals(ctx, &subst, &mut renaming, from_clause, 0);
    let into_lits = instantiate_literals(ctx, &subst, &mut renaming, into_clause, 1);

    // (l ≈ r)σ strictly maximal in the instantiated equation premise
    // (positive literals are only eligible when nothing is selected)
    if !strictly_maximal(ord, ctx, &from_lits, from_lit_idx) {
        return;
    }

    // The rewritten literal stays eligible after instantiation
    if into_clause.selected.is_empty() {
        let ok = if into_clause.literals[into_lit_idx].positive {
            strictly_maximal(ord, ctx, &into_lits, into_lit_idx)
        } else {
            maximal(ord, ctx, &into_lits, into_lit_idx)
        };
        if !ok {
            return;
        }
    }

    // The rewritten position must be on a non-smaller side
    let into_lit_inst = into_lits[into_lit_idx];
    let (target_side, other_side) = if into_lhs_side {
        (into_lit_inst.lhs, into_lit_inst.rhs)
    } else {
        (into_lit_inst.rhs, into_lit_inst.lhs)
    };
    if ord.compare(&ctx.terms, target_side, other_side) == TermOrdering::Less {
        return;
    }

    // Build the conclusion: (C ∨ D[r])σ
    let rewritten = ctx
        .terms
        .replace_at(&mut ctx.types, target_side, path, r_inst);
    let new_lit = if into_lhs_side {
        Literal::eqn(rewritten, other_side, into_lit_inst.positive)
    } else {
        Literal::eqn(other_side, rewritten, into_lit_inst.positive)
    };

    let mut lits: Vec<Literal> = Vec::with_capacity(from_lits.len() + into_lits.len() - 1);
    for (i, lit) in from_lits.into_iter().enumerate() {
        if i != from_lit_idx {
            lits.push(lit);
        }
    }
    lits.push(new_lit);
    for (i, lit) in into_lits.into_iter().enumerate() {
        if i != into_lit_idx {
            lits.push(lit);
        }
    }

    let trail: Trail = from_clause.trail.union(&into_clause.trail).copied().collect();
    let proof = Arc::new(ProofStep::Inference {
        rule: "superposition",
        parents: vec![from_idx, into_idx],
    });
    out.push(Clause::new(ctx, lits, trail, proof));
}

/// Equality resolution: from `C ∨ s ≉ t` with `σ = mgu(s, t)` derive `Cσ`
pub struct EqualityResolutionRule;

impl GeneratingRule for EqualityResolutionRule {
    fn name(&self) -> &'static str {
        "equality_resolution"
    }

    fn generate(
        &self,
        ctx: &mut LogicContext,
        ord: &dyn SimplificationOrdering,
        state: &ProofState,
        _indexes: &ActiveIndexes,
        given: usize,
    ) -> Vec<Clause> {
        let mut out = Vec::new();
        let clause = state.clause(given).clone();

        for lit_idx in eligible_literals(ord, &ctx.terms, &clause) {
            let lit = clause.literals[lit_idx];
            if lit.positive {
                continue;
            }
            let subst = match full_unify(ctx, lit.lhs, 0, lit.rhs, 0) {
                Some(s) => s,
                None => continue,
            };

            let mut renaming = Renaming::new();
            let lits_inst = instantiate_literals(ctx, &subst, &mut renaming, &clause, 0);

            // Without selection the resolved literal must stay maximal
            if clause.selected.is_empty() && !maximal(ord, ctx, &lits_inst, lit_idx) {
                continue;
            }

            let lits: Vec<Literal> = lits_inst
                .into_iter()
                .enumerate()
                .filter(|&(i, _)| i != lit_idx)
                .map(|(_, l)| l)
                .collect();
            let proof = Arc::new(ProofStep::Inference {
                rule: "equality_resolution",
                parents: vec![given],
            });
            out.push(Clause::new(ctx, lits, clause.trail.clone(), proof));
        }
        out
    }
}

/// Equality factoring: from `C ∨ s ≈ t ∨ u ≈ v` with `σ = mgu(s, u)` and
/// `sσ ⊀ tσ` derive `(C ∨ t ≉ v ∨ u ≈ v)σ`
pub struct EqualityFactoringRule;

impl GeneratingRule for EqualityFactoringRule {
    fn name(&self) -> &'static str {
        "equality_factoring"
    }

    fn generate(
        &self,
        ctx: &mut LogicContext,
        ord: &dyn SimplificationOrdering,
        state: &ProofState,
        _indexes: &ActiveIndexes,
        given: usize,
    ) -> Vec<Clause> {
        let mut out = Vec::new();
        let clause = state.clause(given).clone();
        if clause.literals.len() < 2 || !clause.selected.is_empty() {
            // Factoring acts on positive literals, which selection disables
            return out;
        }

        for lit_idx in eligible_literals(ord, &ctx.terms, &clause) {
            let lit = clause.literals[lit_idx];
            if !lit.positive {
                continue;
            }
            for (s, s_lhs) in oriented_sides(&lit) {
                let t = if s_lhs { lit.rhs } else { lit.lhs };
                for (j, partner) in clause.literals.iter().enumerate() {
                    if j == lit_idx || !partner.positive {
                        continue;
                    }
                    for (u, u_lhs) in oriented_sides(partner) {
                        let v = if u_lhs { partner.rhs } else { partner.lhs };
                        let subst = match full_unify(ctx, s, 0, u, 0) {
                            Some(sb) => sb,
                            None => continue,
                        };

                        let mut renaming = Renaming::new();
                        let s_inst =
                            apply(&mut ctx.terms, &mut ctx.types, &subst, &mut renaming, s, 0);
                        let t_inst =
                            apply(&mut ctx.terms, &mut ctx.types, &subst, &mut renaming, t, 0);
                        if ord.compare(&ctx.terms, s_inst, t_inst) == TermOrdering::Less {
                            continue;
                        }
                        let lits_inst =
                            instantiate_literals(ctx, &subst, &mut renaming, &clause, 0);
                        if !maximal(ord, ctx, &lits_inst, lit_idx) {
                            continue;
                        }
                        let v_inst =
                            apply(&mut ctx.terms, &mut ctx.types, &subst, &mut renaming, v, 0);

                        // (C ∨ t ≉ v ∨ u ≈ v)σ: drop s ≈ t, add t ≉ v
                        let mut lits: Vec<Literal> = lits_inst
                            .into_iter()
                            .enumerate()
                            .filter(|&(i, _)| i != lit_idx)
                            .map(|(_, l)| l)
                            .collect();
                        lits.push(Literal::eqn(t_inst, v_inst, false));

                        let proof = Arc::new(ProofStep::Inference {
                            rule: "equality_factoring",
                            parents: vec![given],
                        });
                        out.push(Clause::new(ctx, lits, clause.trail.clone(), proof));
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PrecedenceMode, ProverConfig};
    use crate::logic::ClauseRole;
    use crate::order::{Kbo, KboParams, Precedence};
    use crate::select::make_selector;

    struct Setup {
        ctx: LogicContext,
        state: ProofState,
        indexes: ActiveIndexes,
        kbo: Kbo,
    }

    impl Setup {
        fn new(ctx: LogicContext) -> Self {
            let prec = Precedence::from_signature(&ctx.signature, PrecedenceMode::ById);
            Setup {
                ctx,
                state: ProofState::new(5),
                indexes: ActiveIndexes::new(),
                kbo: Kbo::new(KboParams::new(prec)),
            }
        }

        /// Store, orient, select, activate, index
        fn activate(&mut self, mut clause: Clause) -> usize {
            clause.orient(&self.kbo, &self.ctx.terms);
            let selector = make_selector(ProverConfig::default().selection);
            clause.selected = selector.select(&self.ctx.terms, &clause.literals);
            let idx = self.state.store(clause, 0).unwrap();
            self.state.activate(idx);
            self.indexes
                .add_active(&self.ctx, &self.kbo, idx, &self.state.clauses[idx]);
            idx
        }
    }

    #[test]
    fn test_equality_resolution_refl() {
        // { ~(a = a) } resolves to the empty clause
        let mut ctx = LogicContext::new();
        let a = ctx.const_("a");
        let clause = Clause::input(&mut ctx, vec![Literal::eqn(a, a, false)], "goal", ClauseRole::NegatedConjecture);

        let mut setup = Setup::new(ctx);
        let given = setup.activate(clause);

        let out = EqualityResolutionRule.generate(
            &mut setup.ctx,
            &setup.kbo,
            &setup.state,
            &setup.indexes,
            given,
        );
        assert!(out.iter().any(|c| c.is_empty()), "expected the empty clause");
    }

    #[test]
    fn test_equality_resolution_unifies_sides() {
        // { f(X) != f(a) | p(X) } derives p(a)
        let mut ctx = LogicContext::new();
        let f = ctx.func("f", 1);
        let p = ctx.pred("p", 1);
        let a = ctx.const_("a");
        let x = ctx.var(0);
        let fx = ctx.app(f, vec![x]);
        let fa = ctx.app(f, vec![a]);
        let px = ctx.app(p, vec![x]);
        let pa = ctx.app(p, vec![a]);

        let lits = vec![Literal::eqn(fx, fa, false), Literal::prop(&ctx, px, true)];
        let clause = Clause::input(&mut ctx, lits, "c", ClauseRole::Axiom);

        let mut setup = Setup::new(ctx);
        let given = setup.activate(clause);
        let out = EqualityResolutionRule.generate(
            &mut setup.ctx,
            &setup.kbo,
            &setup.state,
            &setup.indexes,
            given,
        );
        assert!(out
            .iter()
            .any(|c| c.literals.len() == 1 && c.literals[0].lhs == pa));
    }

    #[test]
    fn test_superposition_rewrites_atom_argument() {
        // From f(a) = b and p(f(a)), derive p(b)
        let mut ctx = LogicContext::new();
        let f = ctx.func("f", 1);
        let p = ctx.pred("p", 1);
        let a = ctx.const_("a");
        let b = ctx.const_("b");
        let fa = ctx.app(f, vec![a]);
        let pfa = ctx.app(p, vec![fa]);
        let pb_atom = ctx.app(p, vec![b]);

        let eq = Clause::input(&mut ctx, vec![Literal::eqn(fa, b, true)], "eq", ClauseRole::Axiom);
        let fact_lits = vec![Literal::prop(&ctx, pfa, true)];
        let fact = Clause::input(&mut ctx, fact_lits, "fact", ClauseRole::Axiom);

        let mut setup = Setup::new(ctx);
        let _fact_idx = setup.activate(fact);
        let eq_idx = setup.activate(eq);

        let out = SuperpositionRule.generate(
            &mut setup.ctx,
            &setup.kbo,
            &setup.state,
            &setup.indexes,
            eq_idx,
        );
        assert!(
            out.iter().any(|c| c.literals.len() == 1 && c.literals[0].lhs == pb_atom),
            "expected p(b) among conclusions"
        );
    }

    #[test]
    fn test_superposition_as_resolution() {
        // p(a) and ~p(X) | q(X) give q(a) through the equational encoding
        let mut ctx = LogicContext::new();
        let p = ctx.pred("p", 1);
        let q = ctx.pred("q", 1);
        let a = ctx.const_("a");
        let x = ctx.var(0);
        let pa = ctx.app(p, vec![a]);
        let px = ctx.app(p, vec![x]);
        let qx = ctx.app(q, vec![x]);
        let qa = ctx.app(q, vec![a]);

        let fact_lits = vec![Literal::prop(&ctx, pa, true)];
        let fact = Clause::input(&mut ctx, fact_lits, "fact", ClauseRole::Axiom);
        let rule_lits = vec![Literal::prop(&ctx, px, false), Literal::prop(&ctx, qx, true)];
        let rule_clause = Clause::input(&mut ctx, rule_lits, "rule", ClauseRole::Axiom);

        let mut setup = Setup::new(ctx);
        let _rule_idx = setup.activate(rule_clause);
        let fact_idx = setup.activate(fact);

        let out = SuperpositionRule.generate(
            &mut setup.ctx,
            &setup.kbo,
            &setup.state,
            &setup.indexes,
            fact_idx,
        );

        // The raw conclusion is $true != $true | q(a); basic simplification
        // (exercised by the engine) strips the trivially false literal.
        let found = out.iter().any(|c| {
            c.literals.iter().any(|l| l.lhs == qa && l.positive)
                && c.literals.iter().all(|l| l.positive || l.is_trivially_false())
        });
        assert!(found, "expected a conclusion containing q(a)");
    }

    #[test]
    fn test_equality_factoring() {
        // f(X) = a | f(b) = a factors
        let mut ctx = LogicContext::new();
        let f = ctx.func("f", 1);
        let a = ctx.const_("a");
        let b = ctx.const_("b");
        let x = ctx.var(0);
        let fx = ctx.app(f, vec![x]);
        let fb = ctx.app(f, vec![b]);

        let clause = Clause::input(
            &mut ctx,
            vec![Literal::eqn(fx, a, true), Literal::eqn(fb, a, true)],
            "c",
            ClauseRole::Axiom,
        );

        let mut setup = Setup::new(ctx);
        // Use no selection so the positive literals stay eligible
        let mut clause = clause;
        clause.orient(&setup.kbo, &setup.ctx.terms);
        let idx = setup.state.store(clause, 0).unwrap();
        setup.state.activate(idx);

        let out = EqualityFactoringRule.generate(
            &mut setup.ctx,
            &setup.kbo,
            &setup.state,
            &setup.indexes,
            idx,
        );
        // Expect a conclusion with a disequation a != a (after σ = {X -> b})
        assert!(
            out.iter().any(|c| c
                .literals
                .iter()
                .any(|l| !l.positive && l.lhs == l.rhs)),
            "expected factoring conclusion with trivial disequation"
        );
    }
}
