//! Lexicographic path ordering

use super::precedence::Precedence;
use super::{SimplificationOrdering, TermOrdering};
use crate::logic::{TermBank, TermId, TermNode};

/// LPO: precedence-driven path ordering with left-to-right lexicographic
/// status for all symbols.
pub struct Lpo {
    precedence: Precedence,
}

impl Lpo {
    pub fn new(precedence: Precedence) -> Self {
        Lpo { precedence }
    }

    /// Strict LPO: `s > t`
    fn gt(&self, bank: &TermBank, s: TermId, t: TermId) -> bool {
        if s == t {
            return false;
        }
        // s > x iff x occurs in s
        if let TermNode::Var { var, .. } = bank.node(t) {
            return bank.has_free_var(s, *var);
        }
        let (s_head, s_args) = match bank.node(s) {
            TermNode::App { head, args } => (*head, args.as_slice()),
            TermNode::Const { .. } => (s, &[][..]),
            // Variables, bound variables, and lambdas never dominate here
            _ => return false,
        };
        let s_sym = match bank.node(s_head) {
            TermNode::Const { sym, .. } => *sym,
            _ => return false,
        };

        // LPO1: some argument of s already dominates or equals t
        if s_args.iter().any(|&si| si == t || self.gt(bank, si, t)) {
            return true;
        }

        let (t_head, t_args) = match bank.node(t) {
            TermNode::App { head, args } => (*head, args.as_slice()),
            TermNode::Const { .. } => (t, &[][..]),
            _ => return false,
        };
        let t_sym = match bank.node(t_head) {
            TermNode::Const { sym, .. } => *sym,
            _ => return false,
        };

        let rank_cmp = self
            .precedence
            .rank(s_sym)
            .cmp(&self.precedence.rank(t_sym))
            .then(s_sym.as_u32().cmp(&t_sym.as_u32()));

        match rank_cmp {
            // LPO2: bigger head, s must dominate every argument of t
            std::cmp::Ordering::Greater => t_args.iter().all(|&ti| self.gt(bank, s, ti)),
            // LPO3: same head, lexicographic on arguments
            std::cmp::Ordering::Equal => {
                for (i, (&si, &ti)) in s_args.iter().zip(t_args.iter()).enumerate() {
                    if si == ti {
                        continue;
                    }
                    return self.gt(bank, si, ti)
                        && t_args[i + 1..].iter().all(|&tj| self.gt(bank, s, tj));
                }
                false
            }
            std::cmp::Ordering::Less => false,
        }
    }
}

impl SimplificationOrdering for Lpo {
    fn name(&self) -> &'static str {
        "lpo"
    }

    fn compare(&self, bank: &TermBank, s: TermId, t: TermId) -> TermOrdering {
        if s == t {
            TermOrdering::Equal
        } else if self.gt(bank, s, t) {
            TermOrdering::Greater
        } else if self.gt(bank, t, s) {
            TermOrdering::Less
        } else {
            TermOrdering::Incomparable
        }
    }
}
