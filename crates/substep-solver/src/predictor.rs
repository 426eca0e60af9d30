//! Velocity prediction from an averaged external wrench.
//!
//! Every estimate starts again from the host-authoritative velocity read at
//! the beginning of the host step, so successive calls within one host step
//! are independent estimates at increasing elapsed time rather than a running
//! integration.

use nalgebra::{UnitQuaternion, Vector3};
use substep_core::error::BodyError;
use substep_core::types::{RigidBodyState, Wrench};

// ---------------------------------------------------------------------------
// Prediction
// ---------------------------------------------------------------------------

/// Latest velocity estimate and how far into the host step it reaches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted linear velocity (world frame).
    pub linear_velocity: Vector3<f32>,
    /// Predicted angular velocity (world frame).
    pub angular_velocity: Vector3<f32>,
    /// Time covered by the sub-steps run so far in the current host step.
    pub elapsed: f32,
}

impl Prediction {
    /// No prediction yet: the host velocities, zero elapsed time.
    pub const fn from_body(body: &RigidBodyState) -> Self {
        Self {
            linear_velocity: body.linear_velocity,
            angular_velocity: body.angular_velocity,
            elapsed: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// KinematicPredictor
// ---------------------------------------------------------------------------

/// Predicts body velocities for one host step.
///
/// Can only be built from a body whose mass and principal inertia are
/// strictly positive, so the divisions below always produce finite values
/// for finite input.
#[derive(Debug, Clone, Copy)]
pub struct KinematicPredictor {
    linear_velocity: Vector3<f32>,
    angular_velocity: Vector3<f32>,
    mass: f32,
    principal_inertia: Vector3<f32>,
    inertia_world_rotation: UnitQuaternion<f32>,
}

impl KinematicPredictor {
    pub fn new(body: &RigidBodyState) -> Result<Self, BodyError> {
        body.validate()?;
        Ok(Self {
            linear_velocity: body.linear_velocity,
            angular_velocity: body.angular_velocity,
            mass: body.mass,
            principal_inertia: body.principal_inertia,
            inertia_world_rotation: body.inertia_world_rotation(),
        })
    }

    /// `v + elapsed * force / mass`.
    pub fn predict_velocity(&self, force: &Vector3<f32>, elapsed: f32) -> Vector3<f32> {
        self.linear_velocity + force * (elapsed / self.mass)
    }

    /// Angular velocity after `torque` acts for `elapsed`, resolved in the
    /// principal inertia frame.
    pub fn predict_angular_velocity(&self, torque: &Vector3<f32>, elapsed: f32) -> Vector3<f32> {
        let torque_principal = self.inertia_world_rotation.inverse_transform_vector(torque);
        let accel_principal = torque_principal.component_div(&self.principal_inertia);
        self.angular_velocity + (self.inertia_world_rotation * accel_principal) * elapsed
    }

    /// The estimate before any sub-step has run.
    pub const fn initial(&self) -> Prediction {
        Prediction {
            linear_velocity: self.linear_velocity,
            angular_velocity: self.angular_velocity,
            elapsed: 0.0,
        }
    }

    /// Estimate after `steps` sub-steps of `substep` seconds, using the wrench
    /// accumulated so far averaged over `steps`.
    #[allow(clippy::cast_precision_loss)]
    pub fn refine(&self, accumulated: &Wrench, steps: u32, substep: f32) -> Prediction {
        if steps == 0 {
            return self.initial();
        }
        let average = *accumulated / steps as f32;
        let elapsed = substep * steps as f32;
        Prediction {
            linear_velocity: self.predict_velocity(&average.force, elapsed),
            angular_velocity: self.predict_angular_velocity(&average.torque, elapsed),
            elapsed,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use substep_core::types::Axis;

    use super::*;

    fn body(mass: f32, inertia: [f32; 3]) -> RigidBodyState {
        RigidBodyState::at_rest(Vector3::zeros(), mass, Vector3::from(inertia))
    }

    #[test]
    fn rejects_zero_mass() {
        let err = KinematicPredictor::new(&body(0.0, [1.0, 1.0, 1.0])).unwrap_err();
        assert_eq!(err, BodyError::NonPositiveMass(0.0));
    }

    #[test]
    fn rejects_zero_inertia() {
        let err = KinematicPredictor::new(&body(1.0, [1.0, 1.0, 0.0])).unwrap_err();
        assert!(matches!(
            err,
            BodyError::NonPositiveInertia { axis: Axis::Z, .. }
        ));
    }

    #[test]
    fn linear_prediction_mass_two() {
        // mass 2, 0.01s, F = (0, 4, 0)  ->  v = (0, 0.02, 0)
        let p = KinematicPredictor::new(&body(2.0, [1.0, 1.0, 1.0])).unwrap();
        let v = p.predict_velocity(&Vector3::new(0.0, 4.0, 0.0), 0.01);
        assert_relative_eq!(v, Vector3::new(0.0, 0.02, 0.0), epsilon = 1e-7);
    }

    #[test]
    fn linear_prediction_starts_from_host_velocity() {
        let b = body(1.0, [1.0, 1.0, 1.0]).with_linear_velocity(Vector3::new(1.0, 0.0, 0.0));
        let p = KinematicPredictor::new(&b).unwrap();
        let v = p.predict_velocity(&Vector3::new(10.0, 0.0, 0.0), 0.1);
        assert_relative_eq!(v, Vector3::new(2.0, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn zero_force_keeps_zero_velocity() {
        let p = KinematicPredictor::new(&body(3.0, [1.0, 2.0, 3.0])).unwrap();
        for steps in 1..20 {
            let pred = p.refine(&Wrench::zero(), steps, 0.004);
            assert_eq!(pred.linear_velocity, Vector3::zeros());
            assert_eq!(pred.angular_velocity, Vector3::zeros());
        }
    }

    #[test]
    fn angular_prediction_axis_aligned() {
        // Identity frames: alpha = tau / I per axis.
        let p = KinematicPredictor::new(&body(1.0, [2.0, 4.0, 8.0])).unwrap();
        let w = p.predict_angular_velocity(&Vector3::new(2.0, 2.0, 2.0), 1.0);
        assert_relative_eq!(w, Vector3::new(1.0, 0.5, 0.25), epsilon = 1e-6);
    }

    #[test]
    fn angular_prediction_uses_principal_frame() {
        // Rotate the body a quarter turn about z: the body x axis points
        // along world y. A world-y torque then acts on the small x inertia.
        let b = body(1.0, [1.0, 10.0, 10.0]).with_orientation(UnitQuaternion::from_axis_angle(
            &Vector3::z_axis(),
            std::f32::consts::FRAC_PI_2,
        ));
        let p = KinematicPredictor::new(&b).unwrap();
        let w = p.predict_angular_velocity(&Vector3::new(0.0, 1.0, 0.0), 1.0);
        assert_relative_eq!(w, Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-5);

        // Same torque with inertia frame rotated back: large inertia again.
        let b = b.with_inertia_rotation(UnitQuaternion::from_axis_angle(
            &Vector3::z_axis(),
            -std::f32::consts::FRAC_PI_2,
        ));
        let p = KinematicPredictor::new(&b).unwrap();
        let w = p.predict_angular_velocity(&Vector3::new(0.0, 1.0, 0.0), 1.0);
        assert_relative_eq!(w, Vector3::new(0.0, 0.1, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn refine_averages_over_steps() {
        let p = KinematicPredictor::new(&body(2.0, [1.0, 1.0, 1.0])).unwrap();
        let total = Wrench::from_force(Vector3::new(0.0, 12.0, 0.0));
        // avg = 4, elapsed = 0.03  ->  v = 4 * 0.03 / 2
        let pred = p.refine(&total, 3, 0.01);
        assert_relative_eq!(pred.elapsed, 0.03, epsilon = 1e-7);
        assert_relative_eq!(pred.linear_velocity, Vector3::new(0.0, 0.06, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn refine_zero_steps_is_initial() {
        let b = body(1.0, [1.0, 1.0, 1.0]).with_angular_velocity(Vector3::new(0.0, 0.0, 3.0));
        let p = KinematicPredictor::new(&b).unwrap();
        let pred = p.refine(&Wrench::from_force(Vector3::x()), 0, 0.01);
        assert_eq!(pred, Prediction::from_body(&b));
    }
}
