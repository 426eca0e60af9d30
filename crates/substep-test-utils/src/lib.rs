//! Shared test fixtures for the substep crates.
//!
//! Provides a recording mock host body and deterministic RNG setup.

pub mod mocks;
pub mod rng;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use mocks::{MockBody, unit_body};
pub use rng::{random_vectors, seeded_rng};
