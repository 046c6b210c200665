//! Shared test fixtures and utilities for serik crates.
//!
//! Provides reusable chain builders, goal helpers, and deterministic RNG
//! setup.

pub mod chains;
pub mod rng;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use chains::{goal_distance, offset, straight_chain, three_link_chain};
pub use rng::{random_chain, random_goal, seeded_rng};
