//! Proof state: clause storage and the Active/Passive/SimplSet partition

use super::passive::PassiveQueue;
use crate::logic::{Clause, TermBank};
use crate::proof::Proof;
use indexmap::IndexSet;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Which resource ended the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LimitReason {
    Timeout,
    Steps,
    Clauses,
    Memory,
    Cancelled,
}

impl fmt::Display for LimitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LimitReason::Timeout => "timeout",
            LimitReason::Steps => "step limit",
            LimitReason::Clauses => "clause limit",
            LimitReason::Memory => "memory limit",
            LimitReason::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of a saturation run
#[derive(Debug)]
pub enum SaturationResult {
    /// An unconditional empty clause was derived
    Refutation(Proof),
    /// Passive is exhausted: the clause set is saturated
    Saturated,
    /// A resource limit or cancellation ended the run
    ResourceOut(LimitReason),
}

/// Counters of one saturation run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SaturationStats {
    pub initial_clauses: usize,
    pub iterations: usize,
    pub generated: usize,
    pub kept: usize,
    pub forward_simplified: usize,
    pub forward_subsumed: usize,
    pub backward_simplified: usize,
    pub backward_subsumed: usize,
    pub tautologies_deleted: usize,
    pub rederived: usize,
    pub max_active: usize,
    pub max_passive: usize,
    pub time_ms: u64,
}

type ClauseKey = (Vec<(bool, u32, u32)>, Vec<u32>);

/// Clause storage plus the three clause sets of the given-clause loop.
/// Every clause ever created stays in `clauses` (the proof DAG references
/// discarded ancestors); set membership determines liveness.
pub struct ProofState {
    pub clauses: Vec<Clause>,
    /// Fully processed clauses, used for generating inferences
    pub active: IndexSet<usize>,
    /// Clauses awaiting selection
    pub passive: PassiveQueue,
    /// Unit positive equations usable for demodulation (subset of Active)
    pub simpl_set: IndexSet<usize>,
    /// Unit negative equations in Active (negative simplify-reflect)
    pub neg_units: IndexSet<usize>,
    /// Interning of canonical clause forms
    keys: HashMap<ClauseKey, usize>,
    /// First unconditional empty clause, if any
    pub empty_clause: Option<usize>,
    pub stats: SaturationStats,
}

impl ProofState {
    pub fn new(age_ratio: u32) -> Self {
        ProofState {
            clauses: Vec::new(),
            active: IndexSet::new(),
            passive: PassiveQueue::new(age_ratio),
            simpl_set: IndexSet::new(),
            neg_units: IndexSet::new(),
            keys: HashMap::new(),
            empty_clause: None,
            stats: SaturationStats::default(),
        }
    }

    pub fn clause(&self, idx: usize) -> &Clause {
        &self.clauses[idx]
    }

    /// Intern a clause: assign an id and store it, or report the existing
    /// id of an identical stored clause. Returns `None` for rederivations
    /// (the clause was seen before and is redundant).
    pub fn store(&mut self, mut clause: Clause, age: usize) -> Option<usize> {
        let key = clause.canonical_key();
        if !clause.is_empty() {
            if self.keys.contains_key(&key) {
                self.stats.rederived += 1;
                return None;
            }
        }
        let idx = self.clauses.len();
        clause.id = Some(idx);
        clause.age = age;
        if clause.is_refutation() && self.empty_clause.is_none() {
            self.empty_clause = Some(idx);
        }
        self.keys.insert(key, idx);
        self.clauses.push(clause);
        Some(idx)
    }

    /// Enqueue a stored clause into Passive
    pub fn enqueue_passive(&mut self, bank: &TermBank, idx: usize) {
        let weight = self.clauses[idx].weight(bank);
        self.passive.push(idx, weight);
        self.stats.max_passive = self.stats.max_passive.max(self.passive.len());
    }

    /// Move a clause into Active (caller updates the term indexes)
    pub fn activate(&mut self, idx: usize) {
        self.active.insert(idx);
        if self.clauses[idx].is_unit_positive_eq() {
            self.simpl_set.insert(idx);
        }
        let c = &self.clauses[idx];
        if c.literals.len() == 1 && !c.literals[0].positive {
            self.neg_units.insert(idx);
        }
        self.stats.max_active = self.stats.max_active.max(self.active.len());
    }

    /// Drop a clause from Active and its derived sets
    pub fn deactivate(&mut self, idx: usize) {
        self.active.shift_remove(&idx);
        self.simpl_set.shift_remove(&idx);
        self.neg_units.shift_remove(&idx);
    }

    /// The refutation from the recorded empty clause
    pub fn extract_refutation(&self) -> Option<Proof> {
        self.empty_clause
            .map(|idx| Proof::extract(&self.clauses, idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::literal::Literal;
    use crate::logic::{ClauseRole, LogicContext};

    #[test]
    fn test_store_dedupes_rederivations() {
        let mut ctx = LogicContext::new();
        let p = ctx.pred("p", 1);
        let x = ctx.var(0);
        let px = ctx.app(p, vec![x]);

        let mut state = ProofState::new(5);
        let c1_lits = vec![Literal::prop(&ctx, px, true)];
        let c1 = Clause::input(&mut ctx, c1_lits, "c1", ClauseRole::Axiom);

        // Same clause with a different variable: canonical forms coincide
        let y = ctx.var(9);
        let py = ctx.app(p, vec![y]);
        let c2_lits = vec![Literal::prop(&ctx, py, true)];
        let c2 = Clause::input(&mut ctx, c2_lits, "c2", ClauseRole::Axiom);

        assert!(state.store(c1, 0).is_some());
        assert!(state.store(c2, 0).is_none());
        assert_eq!(state.stats.rederived, 1);
    }

    #[test]
    fn test_empty_clause_is_recorded() {
        let mut ctx = LogicContext::new();
        let mut state = ProofState::new(5);
        let empty = Clause::input(&mut ctx, vec![], "goal", ClauseRole::NegatedConjecture);
        let idx = state.store(empty, 0).unwrap();
        assert_eq!(state.empty_clause, Some(idx));
        assert!(state.extract_refutation().is_some());
    }

    #[test]
    fn test_activate_feeds_simpl_set() {
        let mut ctx = LogicContext::new();
        let a = ctx.const_("a");
        let b = ctx.const_("b");
        let mut state = ProofState::new(5);

        let unit = Clause::input(&mut ctx, vec![Literal::eqn(a, b, true)], "c", ClauseRole::Axiom);
        let idx = state.store(unit, 0).unwrap();
        state.activate(idx);
        assert!(state.simpl_set.contains(&idx));

        let neg = Clause::input(&mut ctx, vec![Literal::eqn(a, b, false)], "d", ClauseRole::Axiom);
        let nidx = state.store(neg, 0).unwrap();
        state.activate(nidx);
        assert!(state.neg_units.contains(&nidx));
        assert!(!state.simpl_set.contains(&nidx));

        state.deactivate(idx);
        assert!(!state.simpl_set.contains(&idx));
    }
}
