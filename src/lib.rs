//! satforge: a superposition-based saturation theorem prover
//!
//! The crate implements the given-clause saturation loop over hash-consed
//! first-order terms (with a lambda/de Bruijn extension), the superposition
//! inference rules with literal selection and a simplification ordering
//! (KBO or LPO), the standard simplification rules (demodulation,
//! simplify-reflect, subsumption, condensation, tautology deletion), and
//! discrimination-tree / feature-vector indexing.

pub mod calculus;
pub mod config;
pub mod error;
pub mod frontend;
pub mod index;
pub mod logic;
pub mod order;
pub mod proof;
pub mod saturation;
pub mod select;
pub mod unify;

// Core types
pub use config::{OrderingKind, PrecedenceMode, ProverConfig, SelectionStrategy};
pub use error::{ProverError, Result};
pub use logic::{
    Clause, ClauseRole, Literal, LogicContext, Renaming, ScopedVar, Signature, Substitution,
    SymbolId, TermBank, TermId, Trail, TypeBank, TypeId,
};

// Ordering and selection
pub use order::{Kbo, KboParams, Lpo, Precedence, SimplificationOrdering, TermOrdering};
pub use select::{make_selector, LiteralSelector};

// Unification
pub use unify::{match_locked, match_term, pattern::unify_ho, unify, UnificationError};

// Calculus and saturation
pub use calculus::{Calculus, GeneratingRule, SimplifyingRule, SuperpositionCalculus};
pub use proof::{Proof, ProofStep};
pub use saturation::{
    ClauseEvent, LimitReason, Prover, SaturationResult, SaturationStats,
};

// Frontend
pub use frontend::{parse_problem, parse_problem_file, ParsedProblem};
