use std::fmt;
use std::ops::{Add, AddAssign, Div};

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::BodyError;

// ---------------------------------------------------------------------------
// Axis
// ---------------------------------------------------------------------------

/// Principal axis label, used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Self; 3] = [Self::X, Self::Y, Self::Z];

    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        })
    }
}

// ---------------------------------------------------------------------------
// Wrench
// ---------------------------------------------------------------------------

/// A force and a torque acting together on a rigid body (world frame).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wrench {
    pub force: Vector3<f32>,
    pub torque: Vector3<f32>,
}

impl Wrench {
    pub const fn new(force: Vector3<f32>, torque: Vector3<f32>) -> Self {
        Self { force, torque }
    }

    pub fn zero() -> Self {
        Self::new(Vector3::zeros(), Vector3::zeros())
    }

    /// Pure force through the center of mass.
    pub fn from_force(force: Vector3<f32>) -> Self {
        Self::new(force, Vector3::zeros())
    }

    /// Pure torque.
    pub fn from_torque(torque: Vector3<f32>) -> Self {
        Self::new(Vector3::zeros(), torque)
    }

    /// Force applied at `position`, expressed as the equivalent force + torque
    /// pair about `center_of_mass`.
    pub fn at_point(force: Vector3<f32>, position: Vector3<f32>, center_of_mass: Vector3<f32>) -> Self {
        Self::new(force, (position - center_of_mass).cross(&force))
    }

    pub fn is_zero(&self) -> bool {
        self.force == Vector3::zeros() && self.torque == Vector3::zeros()
    }
}

impl Default for Wrench {
    fn default() -> Self {
        Self::zero()
    }
}

impl Add for Wrench {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.force + rhs.force, self.torque + rhs.torque)
    }
}

impl AddAssign for Wrench {
    fn add_assign(&mut self, rhs: Self) {
        self.force += rhs.force;
        self.torque += rhs.torque;
    }
}

impl Div<f32> for Wrench {
    type Output = Self;

    fn div(self, rhs: f32) -> Self {
        Self::new(self.force / rhs, self.torque / rhs)
    }
}

// ---------------------------------------------------------------------------
// RigidBodyState
// ---------------------------------------------------------------------------

/// Snapshot of the host engine's rigid body, read once per host step.
///
/// All vectors are in world space except `principal_inertia`, which holds the
/// diagonal of the inertia tensor in its principal frame. That frame is
/// `orientation * inertia_rotation` in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidBodyState {
    /// Body origin in world frame (meters).
    pub position: Vector3<f32>,
    /// Body orientation in world frame.
    pub orientation: UnitQuaternion<f32>,
    /// Linear velocity in world frame (m/s).
    pub linear_velocity: Vector3<f32>,
    /// Angular velocity in world frame (rad/s).
    pub angular_velocity: Vector3<f32>,
    /// Mass in kilograms.
    pub mass: f32,
    /// Principal moments of inertia (kg·m²).
    pub principal_inertia: Vector3<f32>,
    /// Rotation from the principal inertia frame to the body frame.
    pub inertia_rotation: UnitQuaternion<f32>,
    /// Center of mass in world frame.
    pub center_of_mass: Vector3<f32>,
}

impl RigidBodyState {
    /// Body at rest at `position`, identity orientation, center of mass at the
    /// body origin.
    pub fn at_rest(position: Vector3<f32>, mass: f32, principal_inertia: Vector3<f32>) -> Self {
        Self {
            position,
            orientation: UnitQuaternion::identity(),
            linear_velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            mass,
            principal_inertia,
            inertia_rotation: UnitQuaternion::identity(),
            center_of_mass: position,
        }
    }

    #[must_use]
    pub const fn with_orientation(mut self, orientation: UnitQuaternion<f32>) -> Self {
        self.orientation = orientation;
        self
    }

    #[must_use]
    pub const fn with_linear_velocity(mut self, velocity: Vector3<f32>) -> Self {
        self.linear_velocity = velocity;
        self
    }

    #[must_use]
    pub const fn with_angular_velocity(mut self, velocity: Vector3<f32>) -> Self {
        self.angular_velocity = velocity;
        self
    }

    #[must_use]
    pub const fn with_inertia_rotation(mut self, rotation: UnitQuaternion<f32>) -> Self {
        self.inertia_rotation = rotation;
        self
    }

    #[must_use]
    pub const fn with_center_of_mass(mut self, center_of_mass: Vector3<f32>) -> Self {
        self.center_of_mass = center_of_mass;
        self
    }

    /// World-space rotation of the principal inertia axes.
    pub fn inertia_world_rotation(&self) -> UnitQuaternion<f32> {
        self.orientation * self.inertia_rotation
    }

    /// Check that every field prediction divides by or extrapolates from is
    /// usable.
    pub fn validate(&self) -> Result<(), BodyError> {
        if !self.mass.is_finite() {
            return Err(BodyError::NonFinite("mass"));
        }
        if self.mass <= 0.0 {
            return Err(BodyError::NonPositiveMass(self.mass));
        }
        for axis in Axis::ALL {
            let value = self.principal_inertia[axis.index()];
            if !value.is_finite() {
                return Err(BodyError::NonFinite("principal_inertia"));
            }
            if value <= 0.0 {
                return Err(BodyError::NonPositiveInertia { axis, value });
            }
        }
        let rotations = [
            ("orientation", &self.orientation),
            ("inertia_rotation", &self.inertia_rotation),
        ];
        for (name, q) in rotations {
            if q.coords.iter().any(|c| !c.is_finite()) {
                return Err(BodyError::NonFinite(name));
            }
        }
        let vectors = [
            ("position", &self.position),
            ("linear_velocity", &self.linear_velocity),
            ("angular_velocity", &self.angular_velocity),
            ("center_of_mass", &self.center_of_mass),
        ];
        for (name, v) in vectors {
            if v.iter().any(|c| !c.is_finite()) {
                return Err(BodyError::NonFinite(name));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
