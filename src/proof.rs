//! Proof steps and proof reconstruction
//!
//! Every clause carries a shared handle to its proof step; the union of
//! steps over all live clauses forms a DAG whose leaves are the input
//! clauses. Parents are strictly older than their conclusions, so the DAG
//! is acyclic by construction. After an empty clause is derived, a walk
//! from it yields the refutation, which can be printed as a derivation
//! listing or as TPTP-style `cnf` lines.

use crate::logic::{Clause, ClauseRole, LogicContext};
use serde::Serialize;

/// How a clause came to exist
#[derive(Debug, Clone)]
pub enum ProofStep {
    /// Input clause, with its source name and role
    Axiom { name: String, role: ClauseRole },
    /// Conclusion of an inference or simplification
    Inference {
        rule: &'static str,
        /// IDs of the parent clauses (strictly older than the conclusion)
        parents: Vec<usize>,
    },
}

impl ProofStep {
    pub fn rule_name(&self) -> &str {
        match self {
            ProofStep::Axiom { .. } => "input",
            ProofStep::Inference { rule, .. } => rule,
        }
    }

    pub fn parents(&self) -> &[usize] {
        match self {
            ProofStep::Axiom { .. } => &[],
            ProofStep::Inference { parents, .. } => parents,
        }
    }
}

/// A reconstructed proof: the clauses of the derivation in id order,
/// ending with the empty clause.
#[derive(Debug, Clone)]
pub struct Proof {
    pub steps: Vec<Clause>,
}

impl Proof {
    /// Walk the DAG from `root` and collect the derivation in ascending id
    /// order (parents always precede conclusions).
    pub fn extract(clauses: &[Clause], root: usize) -> Proof {
        let mut needed = vec![false; clauses.len()];
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            if needed[idx] {
                continue;
            }
            needed[idx] = true;
            for &p in clauses[idx].proof.parents() {
                stack.push(p);
            }
        }
        let steps = (0..clauses.len())
            .filter(|&i| needed[i])
            .map(|i| clauses[i].clone())
            .collect();
        Proof { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Human-readable derivation listing
    pub fn listing(&self, ctx: &LogicContext) -> String {
        use std::fmt::Write;
        let mut out = String::new();
        for clause in &self.steps {
            let id = clause.id.unwrap_or(0);
            let parents = clause.proof.parents();
            let _ = write!(out, "{:>4}. {}", id, clause.display(&ctx.terms, &ctx.signature, ctx.true_));
            if parents.is_empty() {
                let _ = writeln!(out, "  [{}]", self.step_source(clause));
            } else {
                let parent_list: Vec<String> = parents.iter().map(|p| p.to_string()).collect();
                let _ = writeln!(
                    out,
                    "  [{} {}]",
                    clause.proof.rule_name(),
                    parent_list.join(",")
                );
            }
        }
        out
    }

    fn step_source(&self, clause: &Clause) -> String {
        match clause.proof.as_ref() {
            ProofStep::Axiom { name, .. } => format!("input {}", name),
            ProofStep::Inference { rule, .. } => (*rule).to_string(),
        }
    }

    /// TPTP-style output: one `cnf` line per step
    pub fn tptp(&self, ctx: &LogicContext) -> String {
        use std::fmt::Write;
        let mut out = String::new();
        for clause in &self.steps {
            let id = clause.id.unwrap_or(0);
            let body = clause.display(&ctx.terms, &ctx.signature, ctx.true_).to_string();
            match clause.proof.as_ref() {
                ProofStep::Axiom { name, role } => {
                    let role = match role {
                        ClauseRole::NegatedConjecture => "negated_conjecture",
                        ClauseRole::Hypothesis => "hypothesis",
                        _ => "axiom",
                    };
                    let _ = writeln!(out, "cnf(c{}, {}, ({})). % {}", id, role, body, name);
                }
                ProofStep::Inference { rule, parents } => {
                    let parent_list: Vec<String> =
                        parents.iter().map(|p| format!("c{}", p)).collect();
                    let _ = writeln!(
                        out,
                        "cnf(c{}, plain, ({}), inference({}, [status(thm)], [{}])).",
                        id,
                        body,
                        rule,
                        parent_list.join(",")
                    );
                }
            }
        }
        out
    }

    /// JSON wire format
    pub fn to_json(&self, ctx: &LogicContext) -> Vec<ProofStepJson> {
        self.steps
            .iter()
            .map(|clause| ProofStepJson {
                id: clause.id.unwrap_or(0),
                clause: clause.display(&ctx.terms, &ctx.signature, ctx.true_).to_string(),
                rule: clause.proof.rule_name().to_string(),
                parents: clause.proof.parents().to_vec(),
            })
            .collect()
    }
}

/// One proof step in the JSON output
#[derive(Debug, Clone, Serialize)]
pub struct ProofStepJson {
    pub id: usize,
    pub clause: String,
    pub rule: String,
    pub parents: Vec<usize>,
}
