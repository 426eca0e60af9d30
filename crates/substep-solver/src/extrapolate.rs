//! Position and point-velocity queries between host steps.

use nalgebra::{Rotation3, Vector3};
use substep_core::types::RigidBodyState;

use crate::predictor::Prediction;

/// Rotate `v` about the world X axis by `angle` radians.
pub fn rotate_x(v: &Vector3<f32>, angle: f32) -> Vector3<f32> {
    Rotation3::from_axis_angle(&Vector3::x_axis(), angle) * v
}

/// Rotate `v` about the world Y axis by `angle` radians.
pub fn rotate_y(v: &Vector3<f32>, angle: f32) -> Vector3<f32> {
    Rotation3::from_axis_angle(&Vector3::y_axis(), angle) * v
}

/// Rotate `v` about the world Z axis by `angle` radians.
pub fn rotate_z(v: &Vector3<f32>, angle: f32) -> Vector3<f32> {
    Rotation3::from_axis_angle(&Vector3::z_axis(), angle) * v
}

/// Extrapolates the body from its last host snapshot using the latest
/// prediction.
///
/// Best-effort only: it ignores contacts and anything else the host
/// integrator would resolve.
#[derive(Debug, Clone, Copy)]
pub struct PositionExtrapolator<'a> {
    body: &'a RigidBodyState,
    prediction: &'a Prediction,
}

impl<'a> PositionExtrapolator<'a> {
    pub const fn new(body: &'a RigidBodyState, prediction: &'a Prediction) -> Self {
        Self { body, prediction }
    }

    /// Body position advanced over the time elapsed in the current host step.
    pub fn new_position(&self) -> Vector3<f32> {
        self.new_position_after(self.prediction.elapsed)
    }

    /// Body position advanced by `delta` seconds at the predicted velocity.
    pub fn new_position_after(&self, delta: f32) -> Vector3<f32> {
        self.body.position + self.prediction.linear_velocity * delta
    }

    /// Where a point rigidly attached to the body ends up after the time
    /// elapsed in the current host step.
    ///
    /// The rotation is three elementary rotations applied X, then Y, then Z.
    /// They do not commute, so this is only close to the true rotation for
    /// small angles.
    pub fn new_position_at_point(&self, point: &Vector3<f32>) -> Vector3<f32> {
        let elapsed = self.prediction.elapsed;
        let delta_theta = self.prediction.angular_velocity * elapsed;
        let com = self.body.center_of_mass;

        let mut r = point - com;
        r = rotate_x(&r, delta_theta.x);
        r = rotate_y(&r, delta_theta.y);
        r = rotate_z(&r, delta_theta.z);

        r + com + self.prediction.linear_velocity * elapsed
    }

    /// Rigid-body velocity of a world point, no extrapolation in time.
    pub fn velocity_at_point(&self, point: &Vector3<f32>) -> Vector3<f32> {
        self.prediction.linear_velocity
            + self
                .prediction
                .angular_velocity
                .cross(&(point - self.body.center_of_mass))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
