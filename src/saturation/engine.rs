//! The saturation engine: a single-threaded given-clause loop
//!
//! One step pops a clause from Passive, forward-simplifies it to a
//! fixpoint against the active sets, discards it if trivial or redundant,
//! uses it to backward-simplify Active, activates it, and generates all
//! inferences with the active set. Resource limits and the cooperative
//! cancellation flag are checked at step boundaries only; within a step,
//! backward simplification always completes before generation starts, and
//! freshly generated clauses never take part in the current step's
//! simplifications.

use crate::calculus::{basic_simplify, Calculus, Simplification, SuperpositionCalculus};
use crate::config::{process_memory_mb, ProverConfig};
use crate::index::ActiveIndexes;
use crate::logic::{Clause, LogicContext};
use crate::order::{make_ordering, SimplificationOrdering};
use crate::saturation::state::{LimitReason, ProofState, SaturationResult};
use crate::select::{make_selector, LiteralSelector};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace};

/// Lifecycle notifications delivered to registered event hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseEvent {
    /// The clause entered the proof state (Passive)
    Added,
    /// The clause left the live sets (simplified away or subsumed)
    Removed,
}

/// A hook run at every step boundary; returned clauses enter Passive
pub type StepHook = Box<dyn FnMut(&mut LogicContext, &ProofState) -> Vec<Clause>>;

/// A hook observing clause add/remove events
pub type EventHook = Box<dyn FnMut(ClauseEvent, &Clause)>;

/// The saturation prover: proof state, indexes, rules, and the loop
pub struct Prover {
    pub ctx: LogicContext,
    pub config: ProverConfig,
    pub state: ProofState,
    ord: Box<dyn SimplificationOrdering>,
    selector: Box<dyn LiteralSelector>,
    calculus: Box<dyn Calculus>,
    indexes: ActiveIndexes,
    cancel: Arc<AtomicBool>,
    start: Option<Instant>,
    step_hooks: Vec<StepHook>,
    event_hooks: Vec<EventHook>,
}

impl Prover {
    /// Build a prover over an already-populated logic context. The ordering
    /// precedence is derived from the signature, so the input problem must
    /// be fully interned before this call.
    pub fn new(ctx: LogicContext, config: ProverConfig) -> Self {
        let ord = make_ordering(config.ordering, config.precedence, &ctx.signature);
        let selector = make_selector(config.selection);
        let calculus: Box<dyn Calculus> = Box::new(SuperpositionCalculus::new(&config));
        let state = ProofState::new(config.age_ratio);
        Prover {
            ctx,
            state,
            ord,
            selector,
            calculus,
            indexes: ActiveIndexes::new(),
            cancel: Arc::new(AtomicBool::new(false)),
            start: None,
            step_hooks: Vec::new(),
            event_hooks: Vec::new(),
            config,
        }
    }

    /// Replace the calculus (extension point for variant rule sets)
    pub fn with_calculus(mut self, calculus: Box<dyn Calculus>) -> Self {
        self.calculus = calculus;
        self
    }

    /// Shared flag for cooperative cancellation; setting it ends the run
    /// at the next step boundary with `LimitReason::Cancelled`.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Register a hook run after each step; its clauses enter Passive
    pub fn register_step_hook(&mut self, hook: StepHook) {
        self.step_hooks.push(hook);
    }

    /// Register a clause add/remove observer
    pub fn register_event_hook(&mut self, hook: EventHook) {
        self.event_hooks.push(hook);
    }

    /// Feed input clauses into Passive (runs the calculus preprocessing
    /// pass first)
    pub fn add_passive(&mut self, clauses: Vec<Clause>) {
        let clauses = {
            let calculus = &self.calculus;
            let ctx = &mut self.ctx;
            calculus.preprocess(ctx, clauses)
        };
        for clause in clauses {
            self.state.stats.initial_clauses += 1;
            self.insert_new(clause);
        }
    }

    /// Run the loop to completion
    pub fn saturate(&mut self) -> SaturationResult {
        let start = *self.start.get_or_insert_with(Instant::now);
        let result = loop {
            if let Some(result) = self.step() {
                break result;
            }
        };
        self.state.stats.time_ms = start.elapsed().as_millis() as u64;
        match &result {
            SaturationResult::Refutation(p) => {
                info!(steps = p.len(), "refutation found")
            }
            SaturationResult::Saturated => info!("clause set saturated"),
            SaturationResult::ResourceOut(reason) => info!(%reason, "resource limit"),
        }
        result
    }

    /// One iteration of the given-clause loop. `None` means continue.
    pub fn step(&mut self) -> Option<SaturationResult> {
        self.start.get_or_insert_with(Instant::now);

        if self.state.empty_clause.is_some() {
            return self.state.extract_refutation().map(SaturationResult::Refutation);
        }
        if let Some(reason) = self.check_limits() {
            return Some(SaturationResult::ResourceOut(reason));
        }

        // === Select the given clause ===
        let popped = match self.state.passive.pop() {
            Some(idx) => idx,
            None => return Some(SaturationResult::Saturated),
        };
        self.state.stats.iterations += 1;

        // === Forward simplification to fixpoint ===
        let given = match self.forward_simplify(popped) {
            Some(idx) => idx,
            None => return None, // discarded
        };
        let given_clause = self.state.clauses[given].clone();

        if given_clause.is_refutation() {
            return self.state.extract_refutation().map(SaturationResult::Refutation);
        }

        // === Redundancy checks ===
        if self.calculus.is_trivial(&given_clause) {
            self.state.stats.tautologies_deleted += 1;
            self.notify(ClauseEvent::Removed, given);
            return None;
        }
        if let Some(subsumer) = self.calculus.is_redundant(
            &self.ctx,
            &self.state,
            &self.indexes,
            &given_clause,
        ) {
            trace!(given, subsumer, "forward subsumed");
            self.state.stats.forward_subsumed += 1;
            self.notify(ClauseEvent::Removed, given);
            return None;
        }

        debug!(
            given,
            clause = %given_clause.display(&self.ctx.terms, &self.ctx.signature, self.ctx.true_),
            "given clause"
        );

        // === Backward simplification (completes before generation) ===
        self.backward_simplify(given);

        // === Activate the given clause ===
        self.state.activate(given);
        let stored = self.state.clauses[given].clone();
        self.indexes
            .add_active(&self.ctx, self.ord.as_ref(), given, &stored);
        if stored.is_unit_positive_eq() {
            self.indexes.add_simpl(&self.ctx, given, &stored);
        }

        // === Generate ===
        let mut conclusions = Vec::new();
        for rule in self.calculus.generating_rules() {
            let found = rule.generate(
                &mut self.ctx,
                self.ord.as_ref(),
                &self.state,
                &self.indexes,
                given,
            );
            trace!(rule = rule.name(), count = found.len(), "generated");
            conclusions.extend(found);
        }
        self.state.stats.generated += conclusions.len();
        for clause in conclusions {
            self.insert_new(clause);
        }

        // === Step hooks (extensions) ===
        let mut hook_clauses = Vec::new();
        for hook in self.step_hooks.iter_mut() {
            hook_clauses.extend(hook(&mut self.ctx, &self.state));
        }
        for clause in hook_clauses {
            self.insert_new(clause);
        }

        None
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Basic-simplify, orient, select, store, and enqueue a clause.
    /// Returns the stored id, or `None` when the clause was dropped
    /// (tautology, rederivation, or over the literal limit).
    fn insert_new(&mut self, clause: Clause) -> Option<usize> {
        let mut clause = basic_simplify(&mut self.ctx, clause);
        if clause.is_tautology() {
            self.state.stats.tautologies_deleted += 1;
            return None;
        }
        if clause.literals.len() > self.config.max_clause_literals {
            return None;
        }
        clause.orient(self.ord.as_ref(), &self.ctx.terms);
        clause.selected = self.selector.select(&self.ctx.terms, &clause.literals);

        let age = self.state.stats.iterations;
        let idx = self.state.store(clause, age)?;
        self.state.stats.kept += 1;
        self.state.enqueue_passive(&self.ctx.terms, idx);
        self.notify(ClauseEvent::Added, idx);
        Some(idx)
    }

    /// Forward-simplify the popped clause to a fixpoint. Each replacement
    /// is stored as a new clause (the proof DAG keeps the chain). Returns
    /// the surviving clause id, or `None` if the clause was deleted.
    fn forward_simplify(&mut self, popped: usize) -> Option<usize> {
        let mut current_idx = popped;
        let mut current = self.state.clauses[popped].clone();

        loop {
            let mut outcome = None;
            for rule in self.calculus.simplifying_rules() {
                outcome = rule.simplify_forward(
                    &mut self.ctx,
                    self.ord.as_ref(),
                    &self.state,
                    &self.indexes,
                    &current,
                );
                if outcome.is_some() {
                    break;
                }
            }
            match outcome {
                Some(Simplification::Deleted { rule }) => {
                    trace!(clause = current_idx, rule, "forward deleted");
                    self.state.stats.tautologies_deleted += 1;
                    self.notify(ClauseEvent::Removed, current_idx);
                    return None;
                }
                Some(Simplification::Replaced(replacement)) => {
                    self.state.stats.forward_simplified += 1;
                    self.notify(ClauseEvent::Removed, current_idx);

                    let mut replacement = basic_simplify(&mut self.ctx, replacement);
                    if replacement.is_tautology() {
                        self.state.stats.tautologies_deleted += 1;
                        return None;
                    }
                    replacement.orient(self.ord.as_ref(), &self.ctx.terms);
                    replacement.selected = self
                        .selector
                        .select(&self.ctx.terms, &replacement.literals);

                    let age = self.state.stats.iterations;
                    match self.state.store(replacement, age) {
                        // Rederivation of something already seen
                        None => return None,
                        Some(idx) => {
                            current_idx = idx;
                            current = self.state.clauses[idx].clone();
                        }
                    }
                }
                None => break,
            }
        }
        Some(current_idx)
    }

    /// Run all backward simplifications with the given clause: simplified
    /// active clauses are deactivated, their replacements re-enter Passive.
    fn backward_simplify(&mut self, given: usize) {
        let mut changes = Vec::new();
        for rule in self.calculus.simplifying_rules() {
            changes.extend(rule.simplify_backward(
                &mut self.ctx,
                self.ord.as_ref(),
                &self.state,
                &self.indexes,
                given,
            ));
        }

        for change in changes {
            let target = change.target;
            if !self.state.active.contains(&target) {
                continue; // already removed by an earlier change
            }
            let clause = self.state.clauses[target].clone();
            self.state.deactivate(target);
            self.indexes
                .remove_active(&self.ctx, self.ord.as_ref(), target, &clause);
            if clause.is_unit_positive_eq() {
                self.indexes.remove_simpl(&self.ctx, target, &clause);
            }
            self.notify(ClauseEvent::Removed, target);

            match change.replacement {
                Some(replacement) => {
                    trace!(target, rule = change.rule, "backward simplified");
                    self.state.stats.backward_simplified += 1;
                    self.insert_new(replacement);
                }
                None => {
                    trace!(target, rule = change.rule, "backward subsumed");
                    self.state.stats.backward_subsumed += 1;
                }
            }
        }
    }

    fn notify(&mut self, event: ClauseEvent, idx: usize) {
        if self.event_hooks.is_empty() {
            return;
        }
        let clause = self.state.clauses[idx].clone();
        for hook in self.event_hooks.iter_mut() {
            hook(event, &clause);
        }
    }

    fn check_limits(&self) -> Option<LimitReason> {
        if self.cancel.load(AtomicOrdering::Relaxed) {
            return Some(LimitReason::Cancelled);
        }
        if let Some(start) = self.start {
            if start.elapsed() > self.config.timeout {
                return Some(LimitReason::Timeout);
            }
        }
        if self.config.max_steps > 0 && self.state.stats.iterations >= self.config.max_steps {
            return Some(LimitReason::Steps);
        }
        if self.config.max_clauses > 0 && self.state.clauses.len() >= self.config.max_clauses {
            return Some(LimitReason::Clauses);
        }
        if let Some(limit) = self.config.memory_limit_mb {
            if let Some(rss) = process_memory_mb() {
                if rss >= limit {
                    return Some(LimitReason::Memory);
                }
            }
        }
        None
    }
}
