//! Literal selection
//!
//! A selection function picks a subset of a clause's literals on which
//! generating inferences are allowed. Only negative literals are ever
//! selected; when nothing is selected, eligibility falls back to the
//! maximal literals under the term ordering. Selections are recomputed
//! whenever a clause is (re)oriented.

use crate::config::SelectionStrategy;
use crate::logic::literal::Literal;
use crate::logic::{Clause, TermBank};
use crate::order::{is_maximal_in, SimplificationOrdering};

pub trait LiteralSelector {
    fn name(&self) -> &'static str;
    /// Indexes of the selected literals (possibly empty)
    fn select(&self, bank: &TermBank, literals: &[Literal]) -> Vec<usize>;
}

/// No selection: all eligibility comes from maximality
pub struct NoSelection;

impl LiteralSelector for NoSelection {
    fn name(&self) -> &'static str {
        "none"
    }

    fn select(&self, _bank: &TermBank, _literals: &[Literal]) -> Vec<usize> {
        Vec::new()
    }
}

/// Select the first negative literal, if any
pub struct SelectFirstNegative;

impl LiteralSelector for SelectFirstNegative {
    fn name(&self) -> &'static str {
        "first-neg"
    }

    fn select(&self, _bank: &TermBank, literals: &[Literal]) -> Vec<usize> {
        literals
            .iter()
            .position(|l| !l.positive)
            .map(|i| vec![i])
            .unwrap_or_default()
    }
}

/// Select every negative literal
pub struct SelectAllNegative;

impl LiteralSelector for SelectAllNegative {
    fn name(&self) -> &'static str {
        "all-neg"
    }

    fn select(&self, _bank: &TermBank, literals: &[Literal]) -> Vec<usize> {
        literals
            .iter()
            .enumerate()
            .filter(|(_, l)| !l.positive)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Select the heaviest negative literal (ties broken by position)
pub struct SelectMaxNegative;

impl LiteralSelector for SelectMaxNegative {
    fn name(&self) -> &'static str {
        "max-neg"
    }

    fn select(&self, bank: &TermBank, literals: &[Literal]) -> Vec<usize> {
        literals
            .iter()
            .enumerate()
            .filter(|(_, l)| !l.positive)
            .max_by_key(|(i, l)| (l.weight(bank), usize::MAX - i))
            .map(|(i, _)| vec![i])
            .unwrap_or_default()
    }
}

/// Construct the configured selector
pub fn make_selector(strategy: SelectionStrategy) -> Box<dyn LiteralSelector> {
    match strategy {
        SelectionStrategy::NoSelection => Box::new(NoSelection),
        SelectionStrategy::SelectFirstNegative => Box::new(SelectFirstNegative),
        SelectionStrategy::SelectAllNegative => Box::new(SelectAllNegative),
        SelectionStrategy::SelectMaxNegative => Box::new(SelectMaxNegative),
    }
}

/// Literals on which generating inferences may act: the selected literals
/// when the selection is non-empty, otherwise the maximal literals.
pub fn eligible_literals(
    ord: &dyn SimplificationOrdering,
    bank: &TermBank,
    clause: &Clause,
) -> Vec<usize> {
    if !clause.selected.is_empty() {
        return clause.selected.clone();
    }
    (0..clause.literals.len())
        .filter(|&i| is_maximal_in(ord, bank, &clause.literals, i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PrecedenceMode;
    use crate::logic::{Clause, LogicContext, Trail};
    use crate::order::{Kbo, KboParams, Precedence};
    use crate::proof::ProofStep;
    use std::sync::Arc;

    fn axiom() -> Arc<ProofStep> {
        Arc::new(ProofStep::Axiom {
            name: "c".into(),
            role: crate::logic::ClauseRole::Axiom,
        })
    }

    #[test]
    fn test_selection_policies() {
        let mut ctx = LogicContext::new();
        let p = ctx.pred("p", 1);
        let q = ctx.pred("q", 1);
        let f = ctx.func("f", 1);
        let a = ctx.const_("a");
        let fa = ctx.app(f, vec![a]);
        let pa = ctx.app(p, vec![a]);
        let qfa = ctx.app(q, vec![fa]);

        // p(a) | ~q(f(a)) | ~p(a)
        let lits = vec![
            Literal::prop(&ctx, pa, true),
            Literal::prop(&ctx, qfa, false),
            Literal::prop(&ctx, pa, false),
        ];

        assert!(NoSelection.select(&ctx.terms, &lits).is_empty());

        let first = SelectFirstNegative.select(&ctx.terms, &lits);
        assert_eq!(first.len(), 1);
        assert!(!lits[first[0]].positive);

        let all = SelectAllNegative.select(&ctx.terms, &lits);
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|&i| !lits[i].positive));

        // ~q(f(a)) is the heaviest negative literal
        let max = SelectMaxNegative.select(&ctx.terms, &lits);
        assert_eq!(max.len(), 1);
        assert_eq!(lits[max[0]].lhs, qfa);
    }

    #[test]
    fn test_eligible_falls_back_to_maximal() {
        let mut ctx = LogicContext::new();
        let p = ctx.pred("p", 1);
        let f = ctx.func("f", 1);
        let a = ctx.const_("a");
        let fa = ctx.app(f, vec![a]);
        let pa = ctx.app(p, vec![a]);
        let pfa = ctx.app(p, vec![fa]);

        let lits = vec![
            Literal::prop(&ctx, pa, true),
            Literal::prop(&ctx, pfa, true),
        ];
        let clause = Clause::new(&mut ctx, lits, Trail::new(), axiom());

        let prec = Precedence::from_signature(&ctx.signature, PrecedenceMode::ById);
        let kbo = Kbo::new(KboParams::new(prec));

        // Nothing selected (all positive): only the maximal literal p(f(a))
        let eligible = eligible_literals(&kbo, &ctx.terms, &clause);
        assert_eq!(eligible.len(), 1);
        assert_eq!(clause.literals[eligible[0]].lhs, pfa);
    }
}
