//! # Core Module
//!
//! The data model of a well-mixed chemical reaction network: species with
//! integer copy numbers, reactions with fixed stoichiometry, and the arena that
//! owns both and keeps the species-reaction incidence consistent.
//!
//! ## Key Components
//!
//! - [`ids`] - Generation-checked handles for species and reactions
//! - [`species`] - Copy-number cells and the reactions they participate in
//! - [`reaction`] - Stoichiometry, rate constants and passivation state
//! - [`system`] - The owning arena; propensities, firing and dependency sets
//!
//! Handles stay valid only while the entity they name is alive. Removing a
//! reaction or species invalidates its handle, so stale lookups fail with an
//! error instead of reaching freed state.

pub mod ids;
pub mod reaction;
pub mod species;
pub mod system;
