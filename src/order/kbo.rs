//! Knuth-Bendix ordering

use super::precedence::Precedence;
use super::{SimplificationOrdering, TermOrdering};
use crate::logic::{SymbolId, TermBank, TermId, TermNode};
use std::collections::HashMap;

/// KBO parameters: symbol weights (default 1), variable weight, precedence
#[derive(Debug, Clone)]
pub struct KboParams {
    pub weights: HashMap<SymbolId, u32>,
    pub var_weight: u32,
    pub precedence: Precedence,
}

impl KboParams {
    pub fn new(precedence: Precedence) -> Self {
        KboParams {
            weights: HashMap::new(),
            var_weight: 1,
            precedence,
        }
    }
}

/// Knuth-Bendix ordering: weight comparison guarded by the variable-count
/// condition, with precedence-then-lexicographic tie-breaking.
pub struct Kbo {
    params: KboParams,
}

impl Kbo {
    pub fn new(params: KboParams) -> Self {
        Kbo { params }
    }

    fn symbol_weight(&self, sym: SymbolId) -> u32 {
        self.params.weights.get(&sym).copied().unwrap_or(1)
    }

    /// KBO weight of a term. With all-default weights this is exactly the
    /// cached symbol count, which avoids the traversal entirely.
    fn term_weight(&self, bank: &TermBank, t: TermId) -> u32 {
        if self.params.weights.is_empty() && self.params.var_weight == 1 {
            return bank.weight(t);
        }
        match bank.node(t) {
            TermNode::Var { .. } | TermNode::BVar { .. } => self.params.var_weight,
            TermNode::Const { sym, .. } => self.symbol_weight(*sym),
            TermNode::App { head, args } => {
                let mut w = self.term_weight(bank, *head);
                for &a in args {
                    w += self.term_weight(bank, a);
                }
                w
            }
            TermNode::Fun { body, .. } => 1 + self.term_weight(bank, *body),
        }
    }

    fn count_vars(&self, bank: &TermBank, t: TermId, counts: &mut HashMap<u32, usize>) {
        match bank.node(t) {
            TermNode::Var { var, .. } => {
                *counts.entry(*var).or_insert(0) += 1;
            }
            TermNode::BVar { .. } | TermNode::Const { .. } => {}
            TermNode::App { head, args } => {
                self.count_vars(bank, *head, counts);
                for &a in args {
                    self.count_vars(bank, a, counts);
                }
            }
            TermNode::Fun { body, .. } => self.count_vars(bank, *body, counts),
        }
    }

    fn precedence_cmp(&self, f: SymbolId, g: SymbolId) -> std::cmp::Ordering {
        self.params
            .precedence
            .rank(f)
            .cmp(&self.params.precedence.rank(g))
            .then(f.as_u32().cmp(&g.as_u32()))
    }

    /// Lexicographic tie-break for terms of equal weight. Only meaningful
    /// under the variable-count guards applied by `compare`.
    fn compare_lex(&self, bank: &TermBank, s: TermId, t: TermId) -> TermOrdering {
        if s == t {
            return TermOrdering::Equal;
        }
        let (s_head, s_args) = spine(bank, s);
        let (t_head, t_args) = spine(bank, t);

        match (bank.node(s_head), bank.node(t_head)) {
            (TermNode::Var { .. }, _) | (_, TermNode::Var { .. }) => TermOrdering::Incomparable,
            (TermNode::Fun { .. }, _) | (_, TermNode::Fun { .. }) => {
                // Lambdas compare only structurally
                match (bank.node(s), bank.node(t)) {
                    (TermNode::Fun { body: b1, .. }, TermNode::Fun { body: b2, .. }) => {
                        self.compare(bank, *b1, *b2)
                    }
                    _ => TermOrdering::Incomparable,
                }
            }
            (TermNode::BVar { index: i1, .. }, TermNode::BVar { index: i2, .. }) => {
                if i1 == i2 {
                    TermOrdering::Equal
                } else {
                    TermOrdering::Incomparable
                }
            }
            (TermNode::BVar { .. }, _) | (_, TermNode::BVar { .. }) => TermOrdering::Incomparable,
            (TermNode::Const { sym: f, .. }, TermNode::Const { sym: g, .. }) => {
                if f == g {
                    // Same head: first differing argument decides
                    for (&a, &b) in s_args.iter().zip(t_args.iter()) {
                        match self.compare(bank, a, b) {
                            TermOrdering::Equal => continue,
                            other => return other,
                        }
                    }
                    match s_args.len().cmp(&t_args.len()) {
                        std::cmp::Ordering::Equal => TermOrdering::Equal,
                        std::cmp::Ordering::Greater => TermOrdering::Greater,
                        std::cmp::Ordering::Less => TermOrdering::Less,
                    }
                } else {
                    match self.precedence_cmp(*f, *g) {
                        std::cmp::Ordering::Greater => TermOrdering::Greater,
                        std::cmp::Ordering::Less => TermOrdering::Less,
                        std::cmp::Ordering::Equal => TermOrdering::Incomparable,
                    }
                }
            }
            _ => TermOrdering::Incomparable,
        }
    }
}

fn spine<'a>(bank: &'a TermBank, t: TermId) -> (TermId, &'a [TermId]) {
    match bank.node(t) {
        TermNode::App { head, args } => (*head, args.as_slice()),
        _ => (t, &[]),
    }
}

impl SimplificationOrdering for Kbo {
    fn name(&self) -> &'static str {
        "kbo"
    }

    fn compare(&self, bank: &TermBank, s: TermId, t: TermId) -> TermOrdering {
        if s == t {
            return TermOrdering::Equal;
        }

        // Variable cases: x < t iff x occurs in t (subterm property)
        if let TermNode::Var { var, .. } = bank.node(s) {
            return if bank.has_free_var(t, *var) {
                TermOrdering::Less
            } else {
                TermOrdering::Incomparable
            };
        }
        if bank.is_var(t) {
            return self.compare(bank, t, s).flip();
        }

        let mut vars_s = HashMap::new();
        let mut vars_t = HashMap::new();
        self.count_vars(bank, s, &mut vars_s);
        self.count_vars(bank, t, &mut vars_t);

        // s > t requires #(x, s) >= #(x, t) for every variable x
        let s_covers_t = vars_t
            .iter()
            .all(|(v, c)| vars_s.get(v).copied().unwrap_or(0) >= *c);
        let t_covers_s = vars_s
            .iter()
            .all(|(v, c)| vars_t.get(v).copied().unwrap_or(0) >= *c);

        let w_s = self.term_weight(bank, s);
        let w_t = self.term_weight(bank, t);

        if w_s > w_t {
            if s_covers_t {
                TermOrdering::Greater
            } else {
                TermOrdering::Incomparable
            }
        } else if w_t > w_s {
            if t_covers_s {
                TermOrdering::Less
            } else {
                TermOrdering::Incomparable
            }
        } else {
            match self.compare_lex(bank, s, t) {
                TermOrdering::Greater if s_covers_t => TermOrdering::Greater,
                TermOrdering::Less if t_covers_s => TermOrdering::Less,
                TermOrdering::Equal => TermOrdering::Equal,
                _ => TermOrdering::Incomparable,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PrecedenceMode;
    use crate::logic::LogicContext;

    fn kbo(ctx: &LogicContext) -> Kbo {
        let prec = Precedence::from_signature(&ctx.signature, PrecedenceMode::ById);
        Kbo::new(KboParams::new(prec))
    }

    #[test]
    fn test_subterm_property() {
        let mut ctx = LogicContext::new();
        let f = ctx.func("f", 1);
        let x = ctx.var(0);
        let fx = ctx.app(f, vec![x]);

        let ord = kbo(&ctx);
        assert_eq!(ord.compare(&ctx.terms, fx, x), TermOrdering::Greater);
        assert_eq!(ord.compare(&ctx.terms, x, fx), TermOrdering::Less);
    }

    #[test]
    fn test_variable_condition_blocks() {
        let mut ctx = LogicContext::new();
        let a = ctx.const_("a");
        let x = ctx.var(0);
        let y = ctx.var(1);

        let ord = kbo(&ctx);
        // Distinct variables are incomparable
        assert_eq!(ord.compare(&ctx.terms, x, y), TermOrdering::Incomparable);
        // A ground constant never dominates a variable
        assert_eq!(ord.compare(&ctx.terms, a, x), TermOrdering::Incomparable);
    }

    #[test]
    fn test_weight_decides() {
        let mut ctx = LogicContext::new();
        let f = ctx.func("f", 1);
        let a = ctx.const_("a");
        let fa = ctx.app(f, vec![a]);
        let ffa = ctx.app(f, vec![fa]);

        let ord = kbo(&ctx);
        assert_eq!(ord.compare(&ctx.terms, ffa, fa), TermOrdering::Greater);
        assert_eq!(ord.compare(&ctx.terms, fa, ffa), TermOrdering::Less);
    }

    #[test]
    fn test_precedence_breaks_weight_ties() {
        let mut ctx = LogicContext::new();
        let f = ctx.func("f", 1);
        let g = ctx.func("g", 1);
        let a = ctx.const_("a");
        let fa = ctx.app(f, vec![a]);
        let ga = ctx.app(g, vec![a]);

        let ord = kbo(&ctx);
        // Same weight; g interned after f, so g ranks higher under ById
        assert_eq!(ord.compare(&ctx.terms, ga, fa), TermOrdering::Greater);
        assert_eq!(ord.compare(&ctx.terms, fa, ga), TermOrdering::Less);
    }

    #[test]
    fn test_same_head_lex() {
        let mut ctx = LogicContext::new();
        let f = ctx.func("f", 2);
        let g = ctx.func("g", 1);
        let a = ctx.const_("a");
        let ga = ctx.app(g, vec![a]);

        // f(g(a), a) vs f(a, g(a)): first argument decides
        let t1 = ctx.app(f, vec![ga, a]);
        let t2 = ctx.app(f, vec![a, ga]);

        let ord = kbo(&ctx);
        assert_eq!(ord.compare(&ctx.terms, t1, t2), TermOrdering::Greater);
    }

    #[test]
    fn test_stability_under_substitution_example() {
        let mut ctx = LogicContext::new();
        let f = ctx.func("f", 1);
        let x = ctx.var(0);
        let a = ctx.const_("a");

        let fx = ctx.app(f, vec![x]);
        let fa = ctx.app(f, vec![a]);

        let ord = kbo(&ctx);
        // f(X) > X; instantiating X with a preserves the direction
        assert_eq!(ord.compare(&ctx.terms, fx, x), TermOrdering::Greater);
        assert_eq!(ord.compare(&ctx.terms, fa, a), TermOrdering::Greater);
    }
}
