//! Feature-vector index for subsumption candidate retrieval
//!
//! If clause C subsumes clause D then feature(C) ≤ feature(D)
//! componentwise, for features that are counts: number of literals,
//! positive/negative literal counts, maximal term depth, and per-symbol
//! occurrence counts. A trie over the feature components answers the two
//! range queries (potential subsumers of a clause, potential subsumees of
//! a clause) without touching most of the clause set.

use crate::logic::{Clause, SymbolId, TermBank, TermId, TermNode};
use std::collections::{HashMap, HashSet};

/// Feature vector of a clause: fixed prefix + per-symbol counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureVector {
    /// [literal count, positive count, negative count, max depth]
    pub prefix: [u16; 4],
    /// Occurrence count per indexed symbol
    pub counts: Vec<u16>,
}

/// Maps symbols to positions in the counts vector
#[derive(Debug, Clone, Default)]
struct SymbolSlots {
    slots: HashMap<SymbolId, usize>,
}

impl SymbolSlots {
    fn get_or_create(&mut self, sym: SymbolId) -> usize {
        let next = self.slots.len();
        *self.slots.entry(sym).or_insert(next)
    }

    fn get(&self, sym: SymbolId) -> Option<usize> {
        self.slots.get(&sym).copied()
    }

    fn len(&self) -> usize {
        self.slots.len()
    }
}

fn prefix_of(bank: &TermBank, clause: &Clause) -> [u16; 4] {
    let mut prefix = [0u16; 4];
    prefix[0] = clause.literals.len() as u16;
    prefix[1] = clause.literals.iter().filter(|l| l.positive).count() as u16;
    prefix[2] = prefix[0] - prefix[1];
    prefix[3] = clause.max_depth(bank) as u16;
    prefix
}

fn count_symbols_creating(
    slots: &mut SymbolSlots,
    bank: &TermBank,
    t: TermId,
    counts: &mut Vec<u16>,
) {
    match bank.node(t) {
        TermNode::Var { .. } | TermNode::BVar { .. } => {}
        TermNode::Const { sym, .. } => {
            let slot = slots.get_or_create(*sym);
            if slot >= counts.len() {
                counts.resize(slot + 1, 0);
            }
            counts[slot] = counts[slot].saturating_add(1);
        }
        TermNode::App { head, args } => {
            count_symbols_creating(slots, bank, *head, counts);
            for &a in args {
                count_symbols_creating(slots, bank, a, counts);
            }
        }
        TermNode::Fun { body, .. } => count_symbols_creating(slots, bank, *body, counts),
    }
}

fn count_symbols_readonly(slots: &SymbolSlots, bank: &TermBank, t: TermId, counts: &mut [u16]) {
    match bank.node(t) {
        TermNode::Var { .. } | TermNode::BVar { .. } => {}
        TermNode::Const { sym, .. } => {
            if let Some(slot) = slots.get(*sym) {
                counts[slot] = counts[slot].saturating_add(1);
            }
        }
        TermNode::App { head, args } => {
            count_symbols_readonly(slots, bank, *head, counts);
            for &a in args {
                count_symbols_readonly(slots, bank, a, counts);
            }
        }
        TermNode::Fun { body, .. } => count_symbols_readonly(slots, bank, *body, counts),
    }
}

#[derive(Debug, Default)]
struct TrieNode {
    children: HashMap<u16, TrieNode>,
    clauses: Vec<usize>,
}

impl TrieNode {
    fn collect_all(&self, live: &HashSet<usize>, out: &mut Vec<usize>) {
        out.extend(self.clauses.iter().filter(|c| live.contains(c)));
        for child in self.children.values() {
            child.collect_all(live, out);
        }
    }
}

/// Feature-vector trie over live clauses
#[derive(Debug, Default)]
pub struct FeatureIndex {
    slots: SymbolSlots,
    root: TrieNode,
    features: HashMap<usize, FeatureVector>,
    live: HashSet<usize>,
}

impl FeatureIndex {
    pub fn new() -> Self {
        FeatureIndex::default()
    }

    /// Compute the feature vector of a clause, creating symbol slots for
    /// unseen symbols (the trie grows monotonically with the signature).
    pub fn extract(&mut self, bank: &TermBank, clause: &Clause) -> FeatureVector {
        let mut counts = vec![0u16; self.slots.len()];
        for lit in &clause.literals {
            for side in [lit.lhs, lit.rhs] {
                count_symbols_creating(&mut self.slots, bank, side, &mut counts);
            }
        }
        FeatureVector {
            prefix: prefix_of(bank, clause),
            counts,
        }
    }

    /// Feature vector for a query clause, without touching the slot table.
    /// Symbols without a slot are ignored, which only widens the candidate
    /// set (a symbol unknown to the index occurs in no indexed clause).
    fn extract_query(&self, bank: &TermBank, clause: &Clause) -> FeatureVector {
        let mut counts = vec![0u16; self.slots.len()];
        for lit in &clause.literals {
            for side in [lit.lhs, lit.rhs] {
                count_symbols_readonly(&self.slots, bank, side, &mut counts);
            }
        }
        FeatureVector {
            prefix: prefix_of(bank, clause),
            counts,
        }
    }

    pub fn insert(&mut self, bank: &TermBank, idx: usize, clause: &Clause) {
        let fv = self.extract(bank, clause);
        let mut node = &mut self.root;
        for &p in &fv.prefix {
            node = node.children.entry(p).or_default();
        }
        for &c in &fv.counts {
            node = node.children.entry(c).or_default();
        }
        node.clauses.push(idx);
        self.features.insert(idx, fv);
        self.live.insert(idx);
    }

    /// Removal only marks the clause dead; trie branches are filtered on
    /// retrieval.
    pub fn remove(&mut self, idx: usize) {
        self.live.remove(&idx);
        self.features.remove(&idx);
    }

    pub fn contains(&self, idx: usize) -> bool {
        self.live.contains(&idx)
    }

    /// Live clauses C with feature(C) ≤ feature(target): subsumer candidates
    pub fn potential_subsumers(&self, bank: &TermBank, target: &Clause) -> Vec<usize> {
        let fv = self.extract_query(bank, target);
        let mut out = Vec::new();
        self.walk_le(&self.root, &fv, 0, &mut out);
        out
    }

    /// Live clauses D with feature(source) ≤ feature(D), for a clause that
    /// is not itself indexed (backward subsumption by the given clause)
    pub fn potential_subsumed_by(&self, bank: &TermBank, source: &Clause) -> Vec<usize> {
        let fv = self.extract_query(bank, source);
        let mut out = Vec::new();
        self.walk_ge(&self.root, &fv, 0, &mut out);
        out
    }

    /// Live clauses D with feature(source) ≤ feature(D): subsumee candidates
    pub fn potential_subsumed(&self, idx: usize) -> Vec<usize> {
        let fv = match self.features.get(&idx) {
            Some(fv) => fv.clone(),
            None => return Vec::new(),
        };
        let mut out = Vec::new();
        self.walk_ge(&self.root, &fv, 0, &mut out);
        out.retain(|&c| c != idx);
        out
    }

    fn component(fv: &FeatureVector, depth: usize) -> Option<u16> {
        if depth < 4 {
            Some(fv.prefix[depth])
        } else {
            fv.counts.get(depth - 4).copied()
        }
    }

    fn walk_le(&self, node: &TrieNode, fv: &FeatureVector, depth: usize, out: &mut Vec<usize>) {
        out.extend(node.clauses.iter().filter(|c| self.live.contains(c)));
        match Self::component(fv, depth) {
            Some(bound) => {
                for (&val, child) in &node.children {
                    if val <= bound {
                        self.walk_le(child, fv, depth + 1, out);
                    }
                }
            }
            None => {
                // Query exhausted: deeper branches hold clauses with extra
                // non-zero counts, which cannot be ≤ the implicit zeros
                for (&val, child) in &node.children {
                    if val == 0 {
                        self.walk_le(child, fv, depth + 1, out);
                    }
                }
            }
        }
    }

    fn walk_ge(&self, node: &TrieNode, fv: &FeatureVector, depth: usize, out: &mut Vec<usize>) {
        out.extend(node.clauses.iter().filter(|c| self.live.contains(c)));
        match Self::component(fv, depth) {
            Some(bound) => {
                for (&val, child) in &node.children {
                    if val >= bound {
                        self.walk_ge(child, fv, depth + 1, out);
                    }
                }
            }
            None => {
                // Source exhausted: its implicit zeros are ≤ anything
                node.collect_all(&self.live, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::literal::Literal;
    use crate::logic::{ClauseRole, LogicContext};

    fn clause(ctx: &mut LogicContext, lits: Vec<Literal>) -> Clause {
        Clause::input(ctx, lits, "c", ClauseRole::Axiom)
    }

    #[test]
    fn test_subsumer_candidates_are_superset() {
        let mut ctx = LogicContext::new();
        let p = ctx.pred("p", 1);
        let q = ctx.pred("q", 1);
        let a = ctx.const_("a");
        let b = ctx.const_("b");
        let x = ctx.var(0);
        let px = ctx.app(p, vec![x]);
        let pa = ctx.app(p, vec![a]);
        let qb = ctx.app(q, vec![b]);

        // p(X) should be a candidate subsumer of p(a) | q(b)
        let unit_lits = vec![Literal::prop(&ctx, px, true)];
        let unit = clause(&mut ctx, unit_lits);
        let target_lits = vec![Literal::prop(&ctx, pa, true), Literal::prop(&ctx, qb, true)];
        let target = clause(&mut ctx, target_lits);

        let mut index = FeatureIndex::new();
        index.insert(&ctx.terms, 0, &unit);
        let candidates = index.potential_subsumers(&ctx.terms, &target);
        assert_eq!(candidates, vec![0]);

        // The reverse direction must be filtered out: target has more
        // literals than the unit
        index.insert(&ctx.terms, 1, &target);
        let rev = index.potential_subsumers(&ctx.terms, &unit);
        assert!(!rev.contains(&1));
    }

    #[test]
    fn test_backward_candidates() {
        let mut ctx = LogicContext::new();
        let p = ctx.pred("p", 1);
        let q = ctx.pred("q", 1);
        let a = ctx.const_("a");
        let b = ctx.const_("b");
        let x = ctx.var(0);
        let px = ctx.app(p, vec![x]);
        let pa = ctx.app(p, vec![a]);
        let qb = ctx.app(q, vec![b]);

        let unit_lits = vec![Literal::prop(&ctx, px, true)];
        let unit = clause(&mut ctx, unit_lits);
        let wide_lits = vec![Literal::prop(&ctx, pa, true), Literal::prop(&ctx, qb, true)];
        let wide = clause(&mut ctx, wide_lits);

        let mut index = FeatureIndex::new();
        index.insert(&ctx.terms, 0, &unit);
        index.insert(&ctx.terms, 1, &wide);

        let subsumed = index.potential_subsumed(0);
        assert_eq!(subsumed, vec![1]);
    }

    #[test]
    fn test_removal_hides_clause() {
        let mut ctx = LogicContext::new();
        let p = ctx.pred("p", 1);
        let a = ctx.const_("a");
        let pa = ctx.app(p, vec![a]);

        let c_lits = vec![Literal::prop(&ctx, pa, true)];
        let c = clause(&mut ctx, c_lits);
        let mut index = FeatureIndex::new();
        index.insert(&ctx.terms, 0, &c);
        assert!(!index.potential_subsumers(&ctx.terms, &c).is_empty());

        index.remove(0);
        assert!(index.potential_subsumers(&ctx.terms, &c).is_empty());
    }
}
