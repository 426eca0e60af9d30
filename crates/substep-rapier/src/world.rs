//! Owned rapier pipeline state plus a host clock.

use std::time::Duration;

use nalgebra::{Isometry3, Point3, Translation3, Vector3};
use rapier3d::prelude::{
    CCDSolver, ColliderSet, DefaultBroadPhase, ImpulseJointSet, IntegrationParameters,
    IslandManager, MassProperties, MultibodyJointSet, NarrowPhase, PhysicsPipeline,
    RigidBodyBuilder, RigidBodyHandle, RigidBodySet,
};
use substep_core::config::{BodyConfig, SolverConfig};
use substep_core::error::{BodyError, SubstepError};
use substep_core::time::SimTime;
use substep_core::types::RigidBodyState;
use substep_solver::{StepReport, SubstepSolver};
use tracing::debug;

use crate::body::{RapierBody, body_state};

// ---------------------------------------------------------------------------
// RapierWorld
// ---------------------------------------------------------------------------

/// All rapier state needed to step a scene, plus the host simulation time.
///
/// `PhysicsPipeline::step()` requires mutable access to every set
/// simultaneously, so they live together.
pub struct RapierWorld {
    // -- Rapier sets --
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,

    // -- Pipeline objects --
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub ccd_solver: CCDSolver,

    // -- Parameters --
    pub integration_parameters: IntegrationParameters,
    pub gravity: Vector3<f32>,

    host_step: Duration,
    time: SimTime,
}

impl RapierWorld {
    /// Create an empty world stepping `dt` seconds per host step.
    pub fn new(gravity: Vector3<f32>, dt: f32) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = dt;

        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            ccd_solver: CCDSolver::new(),
            integration_parameters,
            gravity,
            host_step: Duration::from_nanos(SimTime::from_secs(f64::from(dt)).nanos()),
            time: SimTime::ZERO,
        }
    }

    /// Host time after the last [`step`](Self::step).
    pub const fn time(&self) -> SimTime {
        self.time
    }

    pub const fn dt(&self) -> f32 {
        self.integration_parameters.dt
    }

    /// Insert a free dynamic body described by `config`.
    ///
    /// The body has no colliders; its mass properties come entirely from the
    /// config and are available before the first step.
    pub fn insert_body(&mut self, config: &BodyConfig) -> Result<RigidBodyHandle, BodyError> {
        config.validate()?;
        let state = config.to_state();

        let mass_properties = MassProperties::with_principal_inertia_frame(
            Point3::from(Vector3::from(config.center_of_mass)),
            state.mass,
            state.principal_inertia,
            state.inertia_rotation,
        );
        let body = RigidBodyBuilder::dynamic()
            .position(Isometry3::from_parts(
                Translation3::from(state.position),
                state.orientation,
            ))
            .linvel(state.linear_velocity)
            .angvel(state.angular_velocity)
            .can_sleep(false)
            .additional_mass_properties(mass_properties)
            .build();

        let handle = self.rigid_body_set.insert(body);
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.recompute_mass_properties_from_colliders(&self.collider_set);
        }
        debug!(?handle, mass = state.mass, "inserted host body");
        Ok(handle)
    }

    /// Current state of the body under `handle`.
    pub fn state(&self, handle: RigidBodyHandle) -> Option<RigidBodyState> {
        self.rigid_body_set.get(handle).map(body_state)
    }

    /// Host view of the body under `handle`.
    pub fn body_mut(&mut self, handle: RigidBodyHandle) -> Option<RapierBody<'_>> {
        self.rigid_body_set.get_mut(handle).map(RapierBody::new)
    }

    /// Initialize a solver for the body under `handle` at the current time.
    pub fn attach_solver(
        &mut self,
        config: SolverConfig,
        handle: RigidBodyHandle,
    ) -> Result<SubstepSolver, BodyError> {
        let time = self.time;
        let body = self.body_mut(handle).ok_or(BodyError::Missing)?;
        SubstepSolver::initialize(config, time, &body)
    }

    /// Advance host time by one step: run `solver` against the body, step the
    /// pipeline once, then sync the solver to the integrated body.
    ///
    /// The pipeline is stepped even if the solver rejects the body, and the
    /// applied wrench is cleared afterwards so it acts for exactly one step.
    pub fn step(
        &mut self,
        solver: &mut SubstepSolver,
        handle: RigidBodyHandle,
    ) -> Result<StepReport, SubstepError> {
        self.time += self.host_step;
        let time = self.time;
        let report = match self.body_mut(handle) {
            Some(mut body) => solver.on_host_step(time, &mut body),
            None => Err(BodyError::Missing),
        };

        self.step_pipeline();
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.reset_forces(false);
            body.reset_torques(false);
        }
        let report = report?;
        if let Some(body) = self.body_mut(handle) {
            solver.sync(&body)?;
        }
        Ok(report)
    }

    /// Run one raw pipeline step without touching host time.
    pub fn step_pipeline(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }
}
