//! Inference rules of the superposition calculus
//!
//! Rules come in two families behind small traits: generating rules
//! produce new clauses from the given clause and its active partners;
//! simplifying rules rewrite or delete clauses while preserving logical
//! consequence and never increasing the clause ordering. The `Calculus`
//! trait bundles one coherent rule set and is the registration seam for
//! extensions.

pub mod simplify;
pub mod subsumption;
pub mod superposition;

pub use simplify::{
    basic_simplify, CondensationRule, DemodulationRule, LiteralCuttingRule, SimplifyReflectRule,
    TautologyRule,
};
pub use subsumption::{subsumes, SubsumptionRule};
pub use superposition::{EqualityFactoringRule, EqualityResolutionRule, SuperpositionRule};

use crate::config::ProverConfig;
use crate::index::ActiveIndexes;
use crate::logic::{Clause, LogicContext};
use crate::order::SimplificationOrdering;
use crate::saturation::state::ProofState;

/// Outcome of one forward simplification attempt
#[derive(Debug)]
pub enum Simplification {
    /// The clause is redundant and disappears (subsumption, tautology)
    Deleted { rule: &'static str },
    /// The clause is replaced by a simpler one (demodulation, reflect, ...)
    Replaced(Clause),
}

/// A backward simplification: an active clause is removed and optionally
/// replaced by a simpler clause that re-enters Passive.
#[derive(Debug)]
pub struct BackwardChange {
    pub target: usize,
    pub replacement: Option<Clause>,
    pub rule: &'static str,
}

/// A generating inference rule
pub trait GeneratingRule {
    fn name(&self) -> &'static str;

    /// All conclusions between the given clause and the active set
    /// (including the given clause with itself, which is active by the
    /// time generation runs)
    fn generate(
        &self,
        ctx: &mut LogicContext,
        ord: &dyn SimplificationOrdering,
        state: &ProofState,
        indexes: &ActiveIndexes,
        given: usize,
    ) -> Vec<Clause>;
}

/// A simplifying inference rule
pub trait SimplifyingRule {
    fn name(&self) -> &'static str;

    /// Simplify a clause against the active sets; `None` = not applicable
    fn simplify_forward(
        &self,
        ctx: &mut LogicContext,
        ord: &dyn SimplificationOrdering,
        state: &ProofState,
        indexes: &ActiveIndexes,
        clause: &Clause,
    ) -> Option<Simplification>;

    /// Use the freshly activated clause to simplify the active set
    fn simplify_backward(
        &self,
        _ctx: &mut LogicContext,
        _ord: &dyn SimplificationOrdering,
        _state: &ProofState,
        _indexes: &ActiveIndexes,
        _given: usize,
    ) -> Vec<BackwardChange> {
        Vec::new()
    }
}

/// A coherent rule set for the saturation engine. The default
/// implementation is the superposition calculus; extensions provide their
/// own or wrap this one.
pub trait Calculus {
    fn generating_rules(&self) -> &[Box<dyn GeneratingRule>];
    fn simplifying_rules(&self) -> &[Box<dyn SimplifyingRule>];

    /// Cheap triviality test applied to every clause
    fn is_trivial(&self, clause: &Clause) -> bool;

    /// Redundancy against the active set (forward subsumption); returns
    /// the subsuming clause
    fn is_redundant(
        &self,
        ctx: &LogicContext,
        state: &ProofState,
        indexes: &ActiveIndexes,
        clause: &Clause,
    ) -> Option<usize>;

    /// One-time conversion pass over the input clauses
    fn preprocess(&self, ctx: &mut LogicContext, clauses: Vec<Clause>) -> Vec<Clause>;
}

/// The superposition calculus with its standard simplification rules,
/// assembled according to the configuration toggles.
pub struct SuperpositionCalculus {
    generating: Vec<Box<dyn GeneratingRule>>,
    simplifying: Vec<Box<dyn SimplifyingRule>>,
    subsumption_enabled: bool,
}

impl SuperpositionCalculus {
    pub fn new(config: &ProverConfig) -> Self {
        let generating: Vec<Box<dyn GeneratingRule>> = vec![
            Box::new(EqualityResolutionRule),
            Box::new(EqualityFactoringRule),
            Box::new(SuperpositionRule),
        ];

        let mut simplifying: Vec<Box<dyn SimplifyingRule>> = Vec::new();
        if config.enable_demodulation {
            simplifying.push(Box::new(DemodulationRule));
        }
        if config.enable_simplify_reflect {
            simplifying.push(Box::new(SimplifyReflectRule));
        }
        if config.enable_literal_cutting {
            simplifying.push(Box::new(LiteralCuttingRule));
        }
        if config.enable_condensation {
            simplifying.push(Box::new(CondensationRule));
        }
        simplifying.push(Box::new(TautologyRule));
        if config.enable_subsumption {
            simplifying.push(Box::new(SubsumptionRule));
        }

        SuperpositionCalculus {
            generating,
            simplifying,
            subsumption_enabled: config.enable_subsumption,
        }
    }
}

impl Calculus for SuperpositionCalculus {
    fn generating_rules(&self) -> &[Box<dyn GeneratingRule>] {
        &self.generating
    }

    fn simplifying_rules(&self) -> &[Box<dyn SimplifyingRule>] {
        &self.simplifying
    }

    fn is_trivial(&self, clause: &Clause) -> bool {
        clause.is_tautology()
    }

    fn is_redundant(
        &self,
        ctx: &LogicContext,
        state: &ProofState,
        indexes: &ActiveIndexes,
        clause: &Clause,
    ) -> Option<usize> {
        if !self.subsumption_enabled {
            return None;
        }
        let candidates = indexes.features.potential_subsumers(&ctx.terms, clause);
        candidates
            .into_iter()
            .find(|&d| subsumes(ctx, &state.clauses[d], clause))
    }

    fn preprocess(&self, _ctx: &mut LogicContext, clauses: Vec<Clause>) -> Vec<Clause> {
        clauses
    }
}
