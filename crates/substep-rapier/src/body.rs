//! [`RigidBodyHost`] over a single rapier rigid body.

use rapier3d::prelude::RigidBody;
use substep_core::traits::RigidBodyHost;
use substep_core::types::{RigidBodyState, Wrench};

/// Mutable view of one rapier body, usable as the solver's host.
///
/// The applied wrench is added to the body's user force and torque. Rapier
/// keeps those across steps, so whoever steps the pipeline has to clear them
/// afterwards (see [`RapierWorld::step`](crate::world::RapierWorld::step)).
pub struct RapierBody<'a> {
    body: &'a mut RigidBody,
}

impl<'a> RapierBody<'a> {
    pub const fn new(body: &'a mut RigidBody) -> Self {
        Self { body }
    }
}

/// Snapshot of a rapier body in solver terms.
pub fn body_state(body: &RigidBody) -> RigidBodyState {
    let local = &body.mass_properties().local_mprops;
    RigidBodyState {
        position: *body.translation(),
        orientation: *body.rotation(),
        linear_velocity: *body.linvel(),
        angular_velocity: *body.angvel(),
        mass: local.mass(),
        principal_inertia: local.principal_inertia(),
        inertia_rotation: local.principal_inertia_local_frame,
        center_of_mass: (body.position() * local.local_com).coords,
    }
}

impl RigidBodyHost for RapierBody<'_> {
    fn state(&self) -> RigidBodyState {
        body_state(self.body)
    }

    fn apply_wrench(&mut self, wrench: Wrench) {
        self.body.add_force(wrench.force, true);
        self.body.add_torque(wrench.torque, true);
    }
}
