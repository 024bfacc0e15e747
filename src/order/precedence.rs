//! Symbol precedence derived from the problem signature

use crate::config::PrecedenceMode;
use crate::logic::{Signature, SymbolId};

/// A total precedence on signature symbols. Higher rank = larger symbol.
#[derive(Debug, Clone)]
pub struct Precedence {
    ranks: Vec<u32>,
}

impl Precedence {
    /// Derive a precedence from the signature under the given mode.
    /// Builtin symbols ($true, $false, type constructors) always rank at
    /// the bottom, which keeps `atom ≈ $true` oriented left-to-right under
    /// every mode. Ties are broken by interning order, so the precedence
    /// is total.
    pub fn from_signature(sig: &Signature, mode: PrecedenceMode) -> Self {
        let mut ids: Vec<SymbolId> = sig.ids().collect();
        ids.sort_by_key(|&id| {
            let builtin = if sig.attrs(id).builtin { 0u64 } else { 1 };
            let occ = sig.occurrences(id);
            let arity = sig.arity(id) as u64;
            let key = match mode {
                PrecedenceMode::ByFrequency => (occ, arity, id.as_u32() as u64),
                PrecedenceMode::ByInvFrequency => (u64::MAX - occ, arity, id.as_u32() as u64),
                PrecedenceMode::ByArity => (arity, occ, id.as_u32() as u64),
                PrecedenceMode::ById => (id.as_u32() as u64, 0, 0),
            };
            (builtin, key)
        });

        let mut ranks = vec![0u32; sig.len()];
        for (rank, id) in ids.into_iter().enumerate() {
            ranks[id.as_u32() as usize] = rank as u32;
        }
        Precedence { ranks }
    }

    /// Rank of a symbol. Symbols interned after precedence generation
    /// (e.g. fresh Skolems) rank above all existing ones, by id.
    pub fn rank(&self, sym: SymbolId) -> u32 {
        let idx = sym.as_u32() as usize;
        if idx < self.ranks.len() {
            self.ranks[idx]
        } else {
            self.ranks.len() as u32 + sym.as_u32()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::LogicContext;

    #[test]
    fn test_invfreq_puts_rare_symbols_high() {
        let mut ctx = LogicContext::new();
        let f = ctx.func("f", 1);
        let g = ctx.func("g", 1);
        let f_sym = ctx.terms.head_symbol(f).unwrap();
        let g_sym = ctx.terms.head_symbol(g).unwrap();

        // f occurs three times, g once
        for _ in 0..3 {
            ctx.signature.record_occurrence(f_sym);
        }
        ctx.signature.record_occurrence(g_sym);

        let prec = Precedence::from_signature(&ctx.signature, PrecedenceMode::ByInvFrequency);
        assert!(prec.rank(g_sym) > prec.rank(f_sym));

        let freq = Precedence::from_signature(&ctx.signature, PrecedenceMode::ByFrequency);
        assert!(freq.rank(f_sym) > freq.rank(g_sym));
    }

    #[test]
    fn test_precedence_is_total() {
        let mut ctx = LogicContext::new();
        let a = ctx.const_("a");
        let b = ctx.const_("b");
        let a_sym = ctx.terms.head_symbol(a).unwrap();
        let b_sym = ctx.terms.head_symbol(b).unwrap();

        let prec = Precedence::from_signature(&ctx.signature, PrecedenceMode::ByArity);
        assert_ne!(prec.rank(a_sym), prec.rank(b_sym));
    }
}
