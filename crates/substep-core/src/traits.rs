use crate::types::{RigidBodyState, Wrench};

// ---------------------------------------------------------------------------
// RigidBodyHost
// ---------------------------------------------------------------------------

/// Read/write capability over the single host rigid body the solver drives.
///
/// The host engine stays authoritative: the solver only reads snapshots and
/// hands back one averaged wrench per host step.
pub trait RigidBodyHost {
    /// Current host-authoritative state of the body.
    fn state(&self) -> RigidBodyState;

    /// Apply an external force and torque (world frame, through the center of
    /// mass) for the upcoming host integration step.
    fn apply_wrench(&mut self, wrench: Wrench);
}

impl<T: RigidBodyHost + ?Sized> RigidBodyHost for &mut T {
    fn state(&self) -> RigidBodyState {
        (**self).state()
    }

    fn apply_wrench(&mut self, wrench: Wrench) {
        (**self).apply_wrench(wrench);
    }
}

impl<T: RigidBodyHost + ?Sized> RigidBodyHost for Box<T> {
    fn state(&self) -> RigidBodyState {
        (**self).state()
    }

    fn apply_wrench(&mut self, wrench: Wrench) {
        (**self).apply_wrench(wrench);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use nalgebra::Vector3;

    use super::*;

    struct FixedBody {
        state: RigidBodyState,
        applied: Vec<Wrench>,
    }

    impl RigidBodyHost for FixedBody {
        fn state(&self) -> RigidBodyState {
            self.state
        }

        fn apply_wrench(&mut self, wrench: Wrench) {
            self.applied.push(wrench);
        }
    }

    fn fixed_body() -> FixedBody {
        FixedBody {
            state: RigidBodyState::at_rest(Vector3::zeros(), 1.0, Vector3::new(1.0, 1.0, 1.0)),
            applied: Vec::new(),
        }
    }

    /// Verify the trait is object-safe (can be used as `dyn RigidBodyHost`).
    #[test]
    fn trait_is_object_safe() {
        fn _accepts_boxed(_: Box<dyn RigidBodyHost>) {}
        let mut boxed: Box<dyn RigidBodyHost> = Box::new(fixed_body());
        boxed.apply_wrench(Wrench::zero());
        assert!((boxed.state().mass - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn mut_ref_forwards() {
        fn push_force<H: RigidBodyHost>(mut host: H) {
            host.apply_wrench(Wrench::from_force(Vector3::x()));
        }

        let mut body = fixed_body();
        push_force(&mut body);
        assert_eq!(body.applied.len(), 1);
        assert_eq!(body.applied[0].force, Vector3::x());
    }
}
