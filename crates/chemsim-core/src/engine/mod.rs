//! # Engine Module
//!
//! The stateful simulation layer. A [`network::ReactionNetwork`] owns a
//! [`ChemicalSystem`](crate::core::system::ChemicalSystem), a scheduler, the
//! observer hub and a seedable random number generator, and advances simulated
//! time one firing at a time.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Scheduler choice, seeding and run limits
//! - **Scheduling** ([`scheduler`]) - The direct method and the next reaction method
//! - **Priority Queue** ([`heap`]) - Addressable min-heap of firing times
//! - **Observers** ([`signals`]) - Subscriptions to firings and copy-number changes
//! - **Error Handling** ([`error`]) - Engine-level error types
//!
//! Runs are single-threaded: a step (firing, dependent rescheduling and
//! notifications) completes before the next one starts, and a network is
//! driven by one owner at a time.

pub mod config;
pub mod error;
pub mod heap;
pub mod network;
pub mod scheduler;
pub mod signals;
