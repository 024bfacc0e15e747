//! The given-clause saturation loop

pub mod engine;
pub mod passive;
pub mod state;

pub use engine::{ClauseEvent, Prover};
pub use passive::PassiveQueue;
pub use state::{LimitReason, ProofState, SaturationResult, SaturationStats};
