//! Wrench accumulation between host steps.
//!
//! Callers submit forces and torques at any rate; the sum is averaged over
//! the sub-steps of a host step and handed to the host once.
//!
//! Forces at a world point submitted while the center of mass is not known
//! yet are kept as `(ΣF, Σ p × F)` and resolved later with
//! `Σ (p - c) × F = Σ p × F - c × ΣF`.

use nalgebra::Vector3;
use substep_core::types::Wrench;

/// Running force/torque sum since the last flush.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ForceAccumulator {
    total: Wrench,
    unresolved: PointForces,
}

/// Point forces whose lever arm has not been taken yet.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct PointForces {
    force: Vector3<f32>,
    moment: Vector3<f32>,
}

impl PointForces {
    fn about(&self, center_of_mass: &Vector3<f32>) -> Wrench {
        Wrench::new(self.force, self.moment - center_of_mass.cross(&self.force))
    }

    fn is_zero(&self) -> bool {
        self.force == Vector3::zeros() && self.moment == Vector3::zeros()
    }
}

impl ForceAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a force through the center of mass. No unit conversion.
    pub fn add_force(&mut self, force: Vector3<f32>) {
        self.total.force += force;
    }

    pub fn add_torque(&mut self, torque: Vector3<f32>) {
        self.total.torque += torque;
    }

    /// Add a force acting at `position`, plus the torque it exerts about
    /// `center_of_mass`.
    pub fn add_force_at_position(
        &mut self,
        force: Vector3<f32>,
        position: Vector3<f32>,
        center_of_mass: Vector3<f32>,
    ) {
        self.total += Wrench::at_point(force, position, center_of_mass);
    }

    /// Add a force acting at `position` whose lever arm is taken by the next
    /// [`resolve`](Self::resolve).
    pub fn add_force_at_position_deferred(&mut self, force: Vector3<f32>, position: Vector3<f32>) {
        self.unresolved.force += force;
        self.unresolved.moment += position.cross(&force);
    }

    /// Fold deferred point forces into the total, lever arms about
    /// `center_of_mass`.
    pub fn resolve(&mut self, center_of_mass: &Vector3<f32>) {
        self.total += self.unresolved.about(center_of_mass);
        self.unresolved = PointForces::default();
    }

    /// Total as it would read after resolving against `center_of_mass`.
    pub fn resolved_about(&self, center_of_mass: &Vector3<f32>) -> Wrench {
        self.total + self.unresolved.about(center_of_mass)
    }

    pub fn add_wrench(&mut self, wrench: Wrench) {
        self.total += wrench;
    }

    /// Resolved sum. Deferred point forces are not included.
    pub const fn total(&self) -> &Wrench {
        &self.total
    }

    pub const fn force(&self) -> &Vector3<f32> {
        &self.total.force
    }

    pub const fn torque(&self) -> &Vector3<f32> {
        &self.total.torque
    }

    /// Sum divided by `steps`, or `None` when no sub-step ran.
    #[allow(clippy::cast_precision_loss)]
    pub fn averaged(&self, steps: u32) -> Option<Wrench> {
        (steps > 0).then(|| self.total / steps as f32)
    }

    pub fn is_empty(&self) -> bool {
        self.total.is_zero() && self.unresolved.is_zero()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
