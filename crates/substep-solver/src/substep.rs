//! Per-callback view of the solver during one sub-step.

use nalgebra::Vector3;
use substep_core::types::RigidBodyState;

use crate::accumulator::ForceAccumulator;
use crate::extrapolate::PositionExtrapolator;
use crate::predictor::Prediction;
use crate::registry::{PendingChanges, SubscriptionId, SubstepCallback};

/// What a sub-step callback can see and do.
///
/// Forces added here count towards the current host step. Registry changes
/// are deferred until every callback of this sub-step has run.
pub struct Substep<'a> {
    index: u32,
    dt: f32,
    subscription: SubscriptionId,
    body: &'a RigidBodyState,
    prediction: &'a Prediction,
    accumulator: &'a mut ForceAccumulator,
    pending: PendingChanges<'a>,
}

impl<'a> Substep<'a> {
    pub(crate) const fn new(
        index: u32,
        dt: f32,
        subscription: SubscriptionId,
        body: &'a RigidBodyState,
        prediction: &'a Prediction,
        accumulator: &'a mut ForceAccumulator,
        pending: PendingChanges<'a>,
    ) -> Self {
        Self {
            index,
            dt,
            subscription,
            body,
            prediction,
            accumulator,
            pending,
        }
    }

    /// Fixed sub-step duration in seconds.
    pub const fn dt(&self) -> f32 {
        self.dt
    }

    /// Zero-based position of this sub-step within the current host step.
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// The subscription this callback was registered under.
    pub const fn subscription(&self) -> SubscriptionId {
        self.subscription
    }

    /// Host body snapshot taken at the start of the host step.
    pub const fn body(&self) -> &RigidBodyState {
        self.body
    }

    /// Prediction after the previous sub-step (host velocities on the first).
    pub const fn prediction(&self) -> &Prediction {
        self.prediction
    }

    pub const fn velocity(&self) -> Vector3<f32> {
        self.prediction.linear_velocity
    }

    pub const fn angular_velocity(&self) -> Vector3<f32> {
        self.prediction.angular_velocity
    }

    pub const fn extrapolator(&self) -> PositionExtrapolator<'_> {
        PositionExtrapolator::new(self.body, self.prediction)
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

    pub fn add_force(&mut self, force: Vector3<f32>) {
        self.accumulator.add_force(force);
    }

    pub fn add_torque(&mut self, torque: Vector3<f32>) {
        self.accumulator.add_torque(torque);
    }

    /// Force at a world point; the lever arm is taken about the snapshot's
    /// center of mass.
    pub fn add_force_at_position(&mut self, force: Vector3<f32>, position: Vector3<f32>) {
        self.accumulator
            .add_force_at_position(force, position, self.body.center_of_mass);
    }

    /// Queue a new subscriber. It first fires on the next sub-step.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&mut Substep<'_>) + 'static,
    {
        let boxed: SubstepCallback = Box::new(callback);
        self.pending.subscribe(boxed)
    }

    /// Queue removal of `id` once this sub-step's pass completes.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.pending.unsubscribe(id);
    }

    /// Queue removal of the calling callback.
    pub fn unsubscribe_self(&mut self) {
        self.pending.unsubscribe(self.subscription);
    }
}
