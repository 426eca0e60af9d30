// substep-core: Types, host trait, config, time, errors for the substep solver.

pub mod config;
pub mod error;
pub mod time;
pub mod traits;
pub mod types;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        config::{BodyConfig, MAX_OPERATIONS, MIN_OPERATIONS, SolverConfig},
        error::{BodyError, ConfigError, SubstepError},
        time::{SimTime, SubstepClock},
        traits::RigidBodyHost,
        types::{Axis, RigidBodyState, Wrench},
    };
}
