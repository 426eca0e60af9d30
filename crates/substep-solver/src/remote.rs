//! Thread-safe wrench submission from outside the host step.

use std::sync::Arc;

use nalgebra::Vector3;
use parking_lot::Mutex;
use substep_core::types::Wrench;

/// Cloneable handle for submitting forces from other threads.
///
/// Submissions are buffered and folded into the solver's accumulator at the
/// start of the next host step.
#[derive(Debug, Clone, Default)]
pub struct WrenchHandle {
    pending: Arc<Mutex<Wrench>>,
}

impl WrenchHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_force(&self, force: Vector3<f32>) {
        self.pending.lock().force += force;
    }

    pub fn add_torque(&self, torque: Vector3<f32>) {
        self.pending.lock().torque += torque;
    }

    pub fn add_wrench(&self, wrench: Wrench) {
        *self.pending.lock() += wrench;
    }

    /// Buffered wrench not yet picked up by the solver.
    pub fn pending(&self) -> Wrench {
        *self.pending.lock()
    }

    /// Take everything buffered so far, leaving zero behind.
    pub(crate) fn drain(&self) -> Wrench {
        std::mem::take(&mut *self.pending.lock())
    }
}
