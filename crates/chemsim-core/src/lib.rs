//! # chemsim Core Library
//!
//! Exact stochastic simulation of well-mixed chemical reaction networks, with a
//! choice between Gillespie's direct method and the Gibson-Bruck next reaction
//! method.
//!
//! ## Architecture
//!
//! The library is split into three layers:
//!
//! - **[`core`]: The Data Model.** Species, reactions and the arena that owns
//!   them (`ChemicalSystem`). Pure propensity evaluation, atomic firing and
//!   the lazily cached reaction dependency sets live here.
//!
//! - **[`engine`]: The Simulation Engine.** The stateful layer that decides
//!   what fires next: the schedulers, the indexed priority queue behind the
//!   next reaction method, firing observers and the `ReactionNetwork` facade
//!   that owns the clock and the random number generator.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures that drive a
//!   network to a step budget or time horizon and summarize the outcome.

pub mod core;
pub mod engine;
pub mod workflows;
