//! Mock host bodies.

use nalgebra::Vector3;
use substep_core::traits::RigidBodyHost;
use substep_core::types::{RigidBodyState, Wrench};

// ---------------------------------------------------------------------------
// MockBody
// ---------------------------------------------------------------------------

/// In-memory host body that records every wrench applied to it.
///
/// By default the state never changes. With [`integrating`](Self::integrating)
/// each applied wrench is integrated with explicit Euler over the given host
/// step, standing in for the host engine's integrator.
#[derive(Debug, Clone)]
pub struct MockBody {
    state: RigidBodyState,
    applied: Vec<Wrench>,
    host_dt: Option<f32>,
}

impl MockBody {
    pub const fn new(state: RigidBodyState) -> Self {
        Self {
            state,
            applied: Vec::new(),
            host_dt: None,
        }
    }

    /// Unit mass and inertia, at rest at the origin.
    pub fn unit() -> Self {
        Self::new(unit_body())
    }

    /// Integrate applied wrenches over `host_dt` seconds each.
    #[must_use]
    pub const fn integrating(mut self, host_dt: f32) -> Self {
        self.host_dt = Some(host_dt);
        self
    }

    /// Every wrench applied so far, oldest first.
    pub fn applied(&self) -> &[Wrench] {
        &self.applied
    }

    pub fn last_applied(&self) -> Option<&Wrench> {
        self.applied.last()
    }

    pub const fn state_mut(&mut self) -> &mut RigidBodyState {
        &mut self.state
    }

    pub fn set_state(&mut self, state: RigidBodyState) {
        self.state = state;
    }

    fn integrate(&mut self, wrench: &Wrench, dt: f32) {
        let s = &mut self.state;
        s.linear_velocity += wrench.force * (dt / s.mass);
        let frame = s.inertia_world_rotation();
        let alpha = frame.inverse_transform_vector(&wrench.torque).component_div(&s.principal_inertia);
        s.angular_velocity += frame * alpha * dt;
        let step = s.linear_velocity * dt;
        s.position += step;
        s.center_of_mass += step;
    }
}

impl RigidBodyHost for MockBody {
    fn state(&self) -> RigidBodyState {
        self.state
    }

    fn apply_wrench(&mut self, wrench: Wrench) {
        if let Some(dt) = self.host_dt {
            self.integrate(&wrench, dt);
        }
        self.applied.push(wrench);
    }
}

/// Unit mass, unit inertia, at rest at the origin.
pub fn unit_body() -> RigidBodyState {
    RigidBodyState::at_rest(Vector3::zeros(), 1.0, Vector3::new(1.0, 1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn records_applied_wrenches() {
        let mut body = MockBody::unit();
        body.apply_wrench(Wrench::from_force(Vector3::x()));
        body.apply_wrench(Wrench::from_torque(Vector3::y()));
        assert_eq!(body.applied().len(), 2);
        assert_eq!(body.last_applied(), Some(&Wrench::from_torque(Vector3::y())));
        assert_eq!(body.state(), unit_body());
    }

    #[test]
    fn integrating_body_moves() {
        let mut body = MockBody::new(RigidBodyState::at_rest(
            Vector3::zeros(),
            2.0,
            Vector3::new(1.0, 1.0, 1.0),
        ))
        .integrating(0.5);
        body.apply_wrench(Wrench::from_force(Vector3::new(4.0, 0.0, 0.0)));
        assert_relative_eq!(body.state().linear_velocity, Vector3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(body.state().position, Vector3::new(0.5, 0.0, 0.0));
    }
}
