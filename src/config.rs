//! Prover configuration types.

use std::time::Duration;

/// Which simplification ordering drives the calculus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingKind {
    /// Knuth-Bendix ordering (weights + precedence)
    Kbo,
    /// Lexicographic path ordering (precedence only)
    Lpo,
}

/// How the symbol precedence is derived from the problem signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecedenceMode {
    /// More frequent symbols are larger
    ByFrequency,
    /// More frequent symbols are smaller
    ByInvFrequency,
    /// Higher-arity symbols are larger, ties by id
    ByArity,
    /// Interning order
    ById,
}

/// Literal selection strategies (spec policies; only negative literals are
/// ever selected so selection stays coherent with ordering eligibility)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStrategy {
    /// No selection: eligibility falls back to maximal literals
    NoSelection,
    /// Select the first negative literal, if any
    SelectFirstNegative,
    /// Select all negative literals
    SelectAllNegative,
    /// Select the heaviest negative literal
    SelectMaxNegative,
}

/// Configuration for the saturation loop
#[derive(Debug, Clone)]
pub struct ProverConfig {
    /// Wall-clock limit for the whole run
    pub timeout: Duration,
    /// Maximum number of given-clause iterations (0 means no limit)
    pub max_steps: usize,
    /// Maximum number of stored clauses (0 means no limit)
    pub max_clauses: usize,
    /// Memory limit for clause storage in MB
    pub memory_limit_mb: Option<usize>,
    /// Clauses with more literals than this are dropped on generation
    pub max_clause_literals: usize,
    pub ordering: OrderingKind,
    pub precedence: PrecedenceMode,
    pub selection: SelectionStrategy,
    /// Every `age_ratio`-th passive pick is by age instead of weight
    pub age_ratio: u32,
    pub enable_subsumption: bool,
    pub enable_demodulation: bool,
    pub enable_simplify_reflect: bool,
    pub enable_condensation: bool,
    pub enable_literal_cutting: bool,
}

impl Default for ProverConfig {
    fn default() -> Self {
        ProverConfig {
            timeout: Duration::from_secs(60),
            max_steps: 0,
            max_clauses: 0,
            memory_limit_mb: None,
            max_clause_literals: 64,
            ordering: OrderingKind::Kbo,
            precedence: PrecedenceMode::ByInvFrequency,
            selection: SelectionStrategy::SelectMaxNegative,
            age_ratio: 5,
            enable_subsumption: true,
            enable_demodulation: true,
            enable_simplify_reflect: true,
            enable_condensation: true,
            enable_literal_cutting: true,
        }
    }
}

/// Get current process RSS in MB. Returns None if unavailable.
pub fn process_memory_mb() -> Option<usize> {
    #[cfg(target_os = "linux")]
    {
        let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
        let rss_pages: usize = statm.split_whitespace().nth(1)?.parse().ok()?;
        let page_size = 4096usize;
        Some(rss_pages * page_size / (1024 * 1024))
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}
