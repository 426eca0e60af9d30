//! Fixed-rate force accumulation and kinematic prediction between host
//! physics steps.
//!
//! The host engine integrates a rigid body at its own fixed rate. Between
//! those steps, [`SubstepSolver`](solver::SubstepSolver) runs a configurable
//! number of logical sub-steps per second, collects forces submitted by
//! sub-step callbacks or any other caller, estimates how the body's velocity
//! evolves under them, and hands the averaged wrench to the host once per
//! host step.
//!
//! ```ignore
//! let mut solver = SubstepSolver::initialize(SolverConfig::new(250), SimTime::ZERO, &body)?;
//! solver.subscribe(|s: &mut Substep<'_>| s.add_force(Vector3::new(0.0, 9.81, 0.0)));
//! loop {
//!     now += host_dt;
//!     solver.on_host_step(now, &mut body)?;
//!     host.integrate(host_dt);
//!     solver.sync(&body)?;
//! }
//! ```

pub mod accumulator;
pub mod extrapolate;
pub mod predictor;
pub mod registry;
pub mod remote;
pub mod scheduler;
pub mod solver;
pub mod substep;

pub use solver::{StepReport, SubstepSolver};

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use substep_core::prelude::*;

    pub use crate::{
        accumulator::ForceAccumulator,
        extrapolate::PositionExtrapolator,
        predictor::{KinematicPredictor, Prediction},
        registry::{CallbackRegistry, SubscriptionId, SubstepCallback},
        remote::WrenchHandle,
        scheduler::SubstepScheduler,
        solver::{StepReport, SubstepSolver},
        substep::Substep,
    };
}
