//! Literals: signed equations over terms
//!
//! Every literal is an equation `lhs ≈ rhs` or a disequation `lhs ≉ rhs`.
//! A propositional atom `p(ts)` is stored as `p(ts) ≈ $true` with
//! orientation `Greater`; no separate predicate-literal representation
//! exists, so indexing, inference, and printing treat atoms and equations
//! uniformly. The spec's `True`/`False` literals are the trivial equations
//! `$true ≈ $true` and `$true ≉ $true`.
//!
//! The `orientation` field caches the comparison of `lhs` and `rhs` under
//! the active simplification ordering; it is refreshed by `Clause::orient`
//! whenever the ordering changes.

use super::term::{TermBank, TermId};
use crate::logic::{LogicContext, Signature};
use crate::order::TermOrdering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Literal {
    pub lhs: TermId,
    pub rhs: TermId,
    pub positive: bool,
    pub orientation: TermOrdering,
}

impl Literal {
    /// A raw equation literal with unknown orientation
    pub fn eqn(lhs: TermId, rhs: TermId, positive: bool) -> Self {
        Literal {
            lhs,
            rhs,
            positive,
            orientation: TermOrdering::Incomparable,
        }
    }

    /// A propositional literal `atom ≈ $true`; atoms are always the larger
    /// side, so the orientation is fixed at construction.
    pub fn prop(ctx: &LogicContext, atom: TermId, positive: bool) -> Self {
        Literal {
            lhs: atom,
            rhs: ctx.true_,
            positive,
            orientation: TermOrdering::Greater,
        }
    }

    /// The trivially true literal `$true ≈ $true`
    pub fn mk_true(ctx: &LogicContext) -> Self {
        Literal {
            lhs: ctx.true_,
            rhs: ctx.true_,
            positive: true,
            orientation: TermOrdering::Equal,
        }
    }

    /// The trivially false literal `$true ≉ $true`
    pub fn mk_false(ctx: &LogicContext) -> Self {
        Literal {
            lhs: ctx.true_,
            rhs: ctx.true_,
            positive: false,
            orientation: TermOrdering::Equal,
        }
    }

    /// Is this a propositional atom encoded as `atom ≈ $true`?
    pub fn is_prop(&self, ctx: &LogicContext) -> bool {
        self.rhs == ctx.true_ && self.lhs != ctx.true_
    }

    pub fn is_trivially_true(&self) -> bool {
        self.positive && self.lhs == self.rhs
    }

    pub fn is_trivially_false(&self) -> bool {
        !self.positive && self.lhs == self.rhs
    }

    pub fn complement(&self) -> Literal {
        Literal {
            positive: !self.positive,
            ..*self
        }
    }

    /// Both term ends, larger-oriented side first when known
    pub fn sides(&self) -> [TermId; 2] {
        match self.orientation {
            TermOrdering::Less => [self.rhs, self.lhs],
            _ => [self.lhs, self.rhs],
        }
    }

    /// Symbol-count weight of the literal
    pub fn weight(&self, bank: &TermBank) -> u32 {
        bank.weight(self.lhs) + bank.weight(self.rhs)
    }

    /// Collect free variables of both sides into `vars` (sorted merge)
    pub fn collect_vars(&self, bank: &TermBank, vars: &mut Vec<u32>) {
        for side in [self.lhs, self.rhs] {
            for &v in bank.free_vars(side) {
                if let Err(pos) = vars.binary_search(&v) {
                    vars.insert(pos, v);
                }
            }
        }
    }

    pub fn is_ground(&self, bank: &TermBank) -> bool {
        bank.is_ground(self.lhs) && bank.is_ground(self.rhs)
    }

    pub fn display<'a>(&'a self, bank: &'a TermBank, sig: &'a Signature, true_: TermId) -> LiteralDisplay<'a> {
        LiteralDisplay {
            lit: self,
            bank,
            sig,
            true_,
        }
    }
}

pub struct LiteralDisplay<'a> {
    lit: &'a Literal,
    bank: &'a TermBank,
    sig: &'a Signature,
    true_: TermId,
}

impl fmt::Display for LiteralDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lit = self.lit;
        // Propositional atoms print without the ≈ $true encoding
        if lit.rhs == self.true_ && lit.lhs != self.true_ {
            if !lit.positive {
                write!(f, "~")?;
            }
            return write!(f, "{}", self.bank.display(self.sig, lit.lhs));
        }
        write!(
            f,
            "{} {} {}",
            self.bank.display(self.sig, lit.lhs),
            if lit.positive { "=" } else { "!=" },
            self.bank.display(self.sig, lit.rhs)
        )
    }
}
