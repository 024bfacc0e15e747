//! Input frontend
//!
//! The preprocessor collaborator of the core: parses CNF-form TPTP input,
//! declares symbols into the signature, and produces clauses the prover
//! consumes via `Prover::add_passive`. FOF parsing and clause-form
//! conversion belong to an external preprocessor and are rejected with a
//! clear error.

pub mod tptp;

pub use tptp::{parse_problem, parse_problem_file, ParsedProblem};
