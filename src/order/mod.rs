//! Simplification orderings on terms, literals, and clauses
//!
//! The calculus is parameterized by a reduction ordering that is total on
//! ground terms: KBO (weights + precedence) or LPO (precedence only). Both
//! satisfy the subterm property, stability under substitution, and
//! monotonicity, which is what makes demodulation and the superposition
//! side conditions sound.

pub mod kbo;
pub mod lpo;
pub mod precedence;

pub use kbo::{Kbo, KboParams};
pub use lpo::Lpo;
pub use precedence::Precedence;

use crate::config::OrderingKind;
use crate::logic::literal::Literal;
use crate::logic::{Signature, TermBank, TermId};

/// Result of comparing two terms under a partial order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum TermOrdering {
    Greater,
    Less,
    Equal,
    Incomparable,
}

impl TermOrdering {
    pub fn flip(self) -> TermOrdering {
        match self {
            TermOrdering::Greater => TermOrdering::Less,
            TermOrdering::Less => TermOrdering::Greater,
            other => other,
        }
    }
}

/// A reduction ordering usable by the superposition calculus
pub trait SimplificationOrdering {
    fn name(&self) -> &'static str;
    fn compare(&self, bank: &TermBank, s: TermId, t: TermId) -> TermOrdering;
}

/// Construct the configured ordering from the problem signature
pub fn make_ordering(
    kind: OrderingKind,
    mode: crate::config::PrecedenceMode,
    sig: &Signature,
) -> Box<dyn SimplificationOrdering> {
    let prec = Precedence::from_signature(sig, mode);
    match kind {
        OrderingKind::Kbo => Box::new(Kbo::new(KboParams::new(prec))),
        OrderingKind::Lpo => Box::new(Lpo::new(prec)),
    }
}

/// Multiset extension of the term ordering. `Greater` iff after removing
/// pairwise equal elements, every remaining right element is dominated by
/// some remaining left element (and something remains on the left).
pub fn compare_multisets(
    ord: &dyn SimplificationOrdering,
    bank: &TermBank,
    left: &[TermId],
    right: &[TermId],
) -> TermOrdering {
    let mut l: Vec<Option<TermId>> = left.iter().copied().map(Some).collect();
    let mut r: Vec<Option<TermId>> = right.iter().copied().map(Some).collect();

    // Cancel equal elements pairwise
    for li in l.iter_mut() {
        if let Some(lt) = *li {
            if let Some(slot) = r.iter_mut().find(|x| **x == Some(lt)) {
                *slot = None;
                *li = None;
            }
        }
    }

    let l: Vec<TermId> = l.into_iter().flatten().collect();
    let r: Vec<TermId> = r.into_iter().flatten().collect();

    match (l.is_empty(), r.is_empty()) {
        (true, true) => TermOrdering::Equal,
        (false, true) => TermOrdering::Greater,
        (true, false) => TermOrdering::Less,
        (false, false) => {
            let l_dominates = r.iter().all(|&rt| {
                l.iter()
                    .any(|&lt| ord.compare(bank, lt, rt) == TermOrdering::Greater)
            });
            if l_dominates {
                return TermOrdering::Greater;
            }
            let r_dominates = l.iter().all(|&lt| {
                r.iter()
                    .any(|&rt| ord.compare(bank, rt, lt) == TermOrdering::Greater)
            });
            if r_dominates {
                TermOrdering::Less
            } else {
                TermOrdering::Incomparable
            }
        }
    }
}

/// Literal ordering: a positive literal `s ≈ t` is the multiset `{s, t}`,
/// a negative one `{s, s, t, t}` (negative literals dominate positive ones
/// over the same atoms, the standard encoding).
pub fn compare_literals(
    ord: &dyn SimplificationOrdering,
    bank: &TermBank,
    a: &Literal,
    b: &Literal,
) -> TermOrdering {
    let ms = |lit: &Literal| -> Vec<TermId> {
        if lit.positive {
            vec![lit.lhs, lit.rhs]
        } else {
            vec![lit.lhs, lit.lhs, lit.rhs, lit.rhs]
        }
    };
    compare_multisets(ord, bank, &ms(a), &ms(b))
}

/// Is the literal at `idx` maximal in the clause (no other literal is
/// strictly greater)?
pub fn is_maximal_in(
    ord: &dyn SimplificationOrdering,
    bank: &TermBank,
    literals: &[Literal],
    idx: usize,
) -> bool {
    literals.iter().enumerate().all(|(j, other)| {
        j == idx || compare_literals(ord, bank, other, &literals[idx]) != TermOrdering::Greater
    })
}

/// Is the literal at `idx` strictly maximal (greater than every other)?
pub fn is_strictly_maximal_in(
    ord: &dyn SimplificationOrdering,
    bank: &TermBank,
    literals: &[Literal],
    idx: usize,
) -> bool {
    literals.iter().enumerate().all(|(j, other)| {
        j == idx || compare_literals(ord, bank, &literals[idx], other) == TermOrdering::Greater
    })
}
