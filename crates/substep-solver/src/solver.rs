//! The solver facade driven once per host physics step.

use nalgebra::Vector3;
use substep_core::config::SolverConfig;
use substep_core::error::BodyError;
use substep_core::time::SimTime;
use substep_core::traits::RigidBodyHost;
use substep_core::types::{RigidBodyState, Wrench};
use tracing::{debug, trace, warn};

use crate::accumulator::ForceAccumulator;
use crate::extrapolate::PositionExtrapolator;
use crate::predictor::{KinematicPredictor, Prediction};
use crate::registry::{CallbackRegistry, Pass, SubscriptionId};
use crate::remote::WrenchHandle;
use crate::scheduler::SubstepScheduler;
use crate::substep::Substep;

// ---------------------------------------------------------------------------
// StepReport
// ---------------------------------------------------------------------------

/// Outcome of one host step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// Logical sub-steps run during the host step.
    pub substeps: u32,
    /// Averaged wrench handed to the host, `None` if no sub-step ran.
    pub applied: Option<Wrench>,
    /// Linear velocity estimate at the end of the host step, before the host
    /// integrated.
    pub predicted_velocity: Vector3<f32>,
}

impl StepReport {
    /// `true` if the host step was too short for a single sub-step.
    pub const fn is_idle(&self) -> bool {
        self.substeps == 0
    }
}

// ---------------------------------------------------------------------------
// SubstepSolver
// ---------------------------------------------------------------------------

/// Fixed-rate wrench accumulation and velocity prediction for one host body.
///
/// Call [`on_host_step`](Self::on_host_step) from the host engine's fixed
/// step with the current simulation time. The solver runs every logical
/// sub-step that fits since the last one, fires the subscribed callbacks for
/// each, refines its velocity estimate after each, and finally applies the
/// wrench accumulated over the host step, averaged per sub-step, to the host.
///
/// If a host step is shorter than one sub-step nothing runs and nothing is
/// applied; accumulated forces carry over to the next host step that runs at
/// least one sub-step.
///
/// Queries read the snapshot taken by the last `on_host_step` or
/// [`sync`](Self::sync). Call `sync` once the host has integrated so they
/// reflect the body's current pose between host steps.
pub struct SubstepSolver {
    config: SolverConfig,
    scheduler: SubstepScheduler,
    registry: CallbackRegistry,
    accumulator: ForceAccumulator,
    body: RigidBodyState,
    prediction: Prediction,
    inbox: WrenchHandle,
}

impl SubstepSolver {
    /// Set up against `host` at simulation time `now`.
    ///
    /// The rate is clamped into range. Fails if the host body has a
    /// non-positive or non-finite mass or inertia.
    pub fn initialize<H>(config: SolverConfig, now: SimTime, host: &H) -> Result<Self, BodyError>
    where
        H: RigidBodyHost + ?Sized,
    {
        let config = config.clamped();
        let body = host.state();
        body.validate()?;
        debug!(
            operations = config.operations,
            mass = body.mass,
            start = %now,
            "sub-step solver initialized"
        );
        Ok(Self {
            scheduler: SubstepScheduler::new(&config, now),
            config,
            registry: CallbackRegistry::new(),
            accumulator: ForceAccumulator::new(),
            prediction: Prediction::from_body(&body),
            body,
            inbox: WrenchHandle::new(),
        })
    }

    /// Run one host step ending at `now`.
    ///
    /// On a body error the step is skipped: no callbacks, nothing applied,
    /// and the sub-steps due by `now` are dropped so a later valid step does
    /// not replay them. Accumulated forces are kept.
    pub fn on_host_step<H>(&mut self, now: SimTime, host: &mut H) -> Result<StepReport, BodyError>
    where
        H: RigidBodyHost + ?Sized,
    {
        let body = host.state();
        let predictor = match KinematicPredictor::new(&body) {
            Ok(predictor) => predictor,
            Err(err) => {
                let dropped = self.scheduler.skip(now);
                warn!(%err, time = %now, dropped, "host body invalid, skipping host step");
                return Err(err);
            }
        };
        self.body = body;
        self.accumulator.resolve(&self.body.center_of_mass);
        self.accumulator.add_wrench(self.inbox.drain());
        self.prediction = predictor.initial();

        let dt = self.scheduler.substep_secs();
        while self.scheduler.is_due(now) {
            self.registry.dispatch(Pass {
                index: self.scheduler.steps(),
                dt,
                body: &self.body,
                prediction: &self.prediction,
                accumulator: &mut self.accumulator,
            });
            let steps = self.scheduler.complete_substep();
            self.prediction = predictor.refine(self.accumulator.total(), steps, dt);
            trace!(
                steps,
                elapsed = self.prediction.elapsed,
                vx = self.prediction.linear_velocity.x,
                vy = self.prediction.linear_velocity.y,
                vz = self.prediction.linear_velocity.z,
                "sub-step"
            );
        }

        let substeps = self.scheduler.finish_host_step();
        let applied = self.accumulator.averaged(substeps);
        match applied {
            Some(wrench) => {
                host.apply_wrench(wrench);
                self.accumulator.reset();
                self.prediction.elapsed = 0.0;
            }
            None if !self.accumulator.is_empty() => {
                debug!(time = %now, "no sub-step fits, carrying wrench to next host step");
            }
            None => {}
        }

        debug!(
            time = %now,
            substeps,
            force = ?applied.map(|w| w.force),
            torque = ?applied.map(|w| w.torque),
            "host step"
        );
        Ok(StepReport {
            substeps,
            applied,
            predicted_velocity: self.prediction.linear_velocity,
        })
    }

    /// Refresh the body snapshot from `host` without running a host step.
    ///
    /// Velocities restart from the host's, so `new_position_after(0.0)` is
    /// the host position exactly. An invalid body leaves the old snapshot.
    pub fn sync<H>(&mut self, host: &H) -> Result<(), BodyError>
    where
        H: RigidBodyHost + ?Sized,
    {
        let body = host.state();
        body.validate()?;
        self.prediction = Prediction::from_body(&body);
        self.body = body;
        Ok(())
    }

    // -- configuration -------------------------------------------------------

    pub const fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Change the sub-step rate, clamped into range. Takes effect from the
    /// next sub-step.
    pub fn set_operations(&mut self, operations: u32) {
        self.config = SolverConfig::new(operations);
        self.scheduler.reconfigure(&self.config);
    }

    /// Fixed sub-step duration in seconds.
    pub const fn substep_secs(&self) -> f32 {
        self.scheduler.substep_secs()
    }

    // -- forces --------------------------------------------------------------

    pub fn add_force(&mut self, force: Vector3<f32>) {
        self.accumulator.add_force(force);
    }

    pub fn add_torque(&mut self, torque: Vector3<f32>) {
        self.accumulator.add_torque(torque);
    }

    /// Force at a world point. The lever arm is taken about the center of
    /// mass the host reports at the start of the next host step.
    pub fn add_force_at_position(&mut self, force: Vector3<f32>, position: Vector3<f32>) {
        self.accumulator.add_force_at_position_deferred(force, position);
    }

    /// Wrench accumulated since the last application. Point forces not yet
    /// resolved are taken about the current snapshot's center of mass.
    pub fn accumulated(&self) -> Wrench {
        self.accumulator.resolved_about(&self.body.center_of_mass)
    }

    /// Handle for submitting forces from other threads.
    pub fn wrench_handle(&self) -> WrenchHandle {
        self.inbox.clone()
    }

    // -- callbacks -----------------------------------------------------------

    /// Register a callback fired once per sub-step, after those already
    /// registered.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&mut Substep<'_>) + 'static,
    {
        self.registry.subscribe(callback)
    }

    /// Remove a callback. Unknown ids are ignored.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.registry.unsubscribe(id)
    }

    pub const fn registry(&self) -> &CallbackRegistry {
        &self.registry
    }

    // -- queries -------------------------------------------------------------

    /// Predicted linear velocity.
    pub const fn velocity(&self) -> Vector3<f32> {
        self.prediction.linear_velocity
    }

    /// Predicted angular velocity.
    pub const fn angular_velocity(&self) -> Vector3<f32> {
        self.prediction.angular_velocity
    }

    pub const fn prediction(&self) -> &Prediction {
        &self.prediction
    }

    /// Host body snapshot from the last host step or [`sync`](Self::sync).
    pub const fn body(&self) -> &RigidBodyState {
        &self.body
    }

    pub const fn extrapolator(&self) -> PositionExtrapolator<'_> {
        PositionExtrapolator::new(&self.body, &self.prediction)
    }

    pub fn velocity_at_point(&self, point: &Vector3<f32>) -> Vector3<f32> {
        self.extrapolator().velocity_at_point(point)
    }

    pub fn new_position(&self) -> Vector3<f32> {
        self.extrapolator().new_position()
    }

    pub fn new_position_after(&self, delta: f32) -> Vector3<f32> {
        self.extrapolator().new_position_after(delta)
    }

    pub fn new_position_at_point(&self, point: &Vector3<f32>) -> Vector3<f32> {
        self.extrapolator().new_position_at_point(point)
    }
}

impl std::fmt::Debug for SubstepSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubstepSolver")
            .field("config", &self.config)
            .field("scheduler", &self.scheduler)
            .field("registry", &self.registry)
            .field("accumulator", &self.accumulator)
            .field("prediction", &self.prediction)
            .finish_non_exhaustive()
    }
}
