//! # Workflows Module
//!
//! High-level entry points that drive a fully built [`ReactionNetwork`](crate::engine::network::ReactionNetwork)
//! through a complete run.
//!
//! - **Simulation Workflow** ([`simulate`]) - Initializes the network when
//!   needed, runs it to a step budget or time horizon, and reports final copy
//!   numbers together with per-reaction firing counts.

pub mod simulate;
