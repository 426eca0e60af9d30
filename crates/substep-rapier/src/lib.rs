//! Rapier3D host for the substep solver.
//!
//! [`RapierBody`](body::RapierBody) exposes one rapier rigid body through
//! [`RigidBodyHost`](substep_core::traits::RigidBodyHost).
//! [`RapierWorld`](world::RapierWorld) owns the pipeline and runs the solver
//! before each pipeline step. [`Scenario`](scenario::Scenario) builds both
//! from a TOML description.

pub mod body;
pub mod scenario;
pub mod world;

pub use body::{RapierBody, body_state};
pub use scenario::{Scenario, ScenarioConfig, ScenarioSummary, ThrustConfig};
pub use world::RapierWorld;
