//! Ordered sub-step subscriber list.
//!
//! Mutation policy: changes requested *from inside a callback* (through
//! [`Substep::subscribe`] / [`Substep::unsubscribe`]) are queued and applied
//! once the current pass over the list has finished, in request order. Every
//! entry present when a pass starts fires in that pass; entries added during a
//! pass first fire on the next sub-step. Changes made directly on the registry
//! outside a pass take effect immediately.

use std::fmt;

use substep_core::types::RigidBodyState;
use tracing::debug;

use crate::accumulator::ForceAccumulator;
use crate::predictor::Prediction;
use crate::substep::Substep;

/// Callback invoked once per logical sub-step.
pub type SubstepCallback = Box<dyn FnMut(&mut Substep<'_>)>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub const fn raw(self) -> u64 {
        self.0
    }

    fn allocate(next: &mut u64) -> Self {
        let id = Self(*next);
        *next += 1;
        id
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

pub(crate) struct Entry {
    id: SubscriptionId,
    callback: SubstepCallback,
}

/// Registry change requested during a pass.
pub(crate) enum Request {
    Subscribe(Entry),
    Unsubscribe(SubscriptionId),
}

/// Deferred-change queue handed to callbacks through [`Substep`].
pub(crate) struct PendingChanges<'a> {
    requests: &'a mut Vec<Request>,
    next_id: &'a mut u64,
}

impl PendingChanges<'_> {
    pub(crate) fn subscribe(&mut self, callback: SubstepCallback) -> SubscriptionId {
        let id = SubscriptionId::allocate(self.next_id);
        self.requests.push(Request::Subscribe(Entry { id, callback }));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) {
        self.requests.push(Request::Unsubscribe(id));
    }
}

/// Data shared by every callback of one sub-step pass.
pub(crate) struct Pass<'a> {
    pub index: u32,
    pub dt: f32,
    pub body: &'a RigidBodyState,
    pub prediction: &'a Prediction,
    pub accumulator: &'a mut ForceAccumulator,
}

// ---------------------------------------------------------------------------
// CallbackRegistry
// ---------------------------------------------------------------------------

/// Subscribers in insertion order. No de-duplication.
#[derive(Default)]
pub struct CallbackRegistry {
    entries: Vec<Entry>,
    next_id: u64,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a callback. It fires after every callback already registered.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&mut Substep<'_>) + 'static,
    {
        let id = SubscriptionId::allocate(&mut self.next_id);
        self.entries.push(Entry {
            id,
            callback: Box::new(callback),
        });
        id
    }

    /// Remove the entry for `id`. Returns `false` (and does nothing) if it is
    /// not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        match self.entries.iter().position(|e| e.id == id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => {
                debug!(%id, "unsubscribe of unknown subscription ignored");
                false
            }
        }
    }

    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered ids in invocation order.
    pub fn ids(&self) -> impl Iterator<Item = SubscriptionId> + '_ {
        self.entries.iter().map(|e| e.id)
    }

    /// Invoke every callback once, then apply the changes they requested.
    pub(crate) fn dispatch(&mut self, pass: Pass<'_>) {
        let mut requests = Vec::new();
        let Self { entries, next_id } = self;
        let Pass {
            index,
            dt,
            body,
            prediction,
            accumulator,
        } = pass;

        for entry in entries.iter_mut() {
            let mut substep = Substep::new(
                index,
                dt,
                entry.id,
                body,
                prediction,
                &mut *accumulator,
                PendingChanges {
                    requests: &mut requests,
                    next_id: &mut *next_id,
                },
            );
            (entry.callback)(&mut substep);
        }

        for request in requests {
            match request {
                Request::Subscribe(entry) => self.entries.push(entry),
                Request::Unsubscribe(id) => {
                    self.unsubscribe(id);
                }
            }
        }
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("ids", &self.ids().collect::<Vec<_>>())
            .field("next_id", &self.next_id)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use nalgebra::Vector3;

    use super::*;

    fn body() -> RigidBodyState {
        RigidBodyState::at_rest(Vector3::zeros(), 1.0, Vector3::new(1.0, 1.0, 1.0))
    }

    fn run_pass(registry: &mut CallbackRegistry, index: u32, acc: &mut ForceAccumulator) {
        let body = body();
        let prediction = Prediction::from_body(&body);
        registry.dispatch(Pass {
            index,
            dt: 0.004,
            body: &body,
            prediction: &prediction,
            accumulator: acc,
        });
    }

    type Log = Rc<RefCell<Vec<&'static str>>>;

    fn logger(log: Log, name: &'static str) -> impl FnMut(&mut Substep<'_>) + 'static {
        move |_| log.borrow_mut().push(name)
    }

    #[test]
    fn invocation_follows_insertion_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = CallbackRegistry::new();
        registry.subscribe(logger(Rc::clone(&log), "a"));
        registry.subscribe(logger(Rc::clone(&log), "b"));
        registry.subscribe(logger(Rc::clone(&log), "c"));

        run_pass(&mut registry, 0, &mut ForceAccumulator::new());
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn duplicates_are_kept() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = CallbackRegistry::new();
        let first = registry.subscribe(logger(Rc::clone(&log), "a"));
        let second = registry.subscribe(logger(Rc::clone(&log), "a"));
        assert_ne!(first, second);
        assert_eq!(registry.len(), 2);

        run_pass(&mut registry, 0, &mut ForceAccumulator::new());
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn unsubscribe_unknown_is_noop() {
        let mut registry = CallbackRegistry::new();
        let id = registry.subscribe(|_| {});
        assert!(registry.unsubscribe(id));
        assert!(!registry.unsubscribe(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn unsubscribe_keeps_order_of_rest() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = CallbackRegistry::new();
        registry.subscribe(logger(Rc::clone(&log), "a"));
        let b = registry.subscribe(logger(Rc::clone(&log), "b"));
        registry.subscribe(logger(Rc::clone(&log), "c"));
        registry.unsubscribe(b);

        run_pass(&mut registry, 0, &mut ForceAccumulator::new());
        assert_eq!(*log.borrow(), vec!["a", "c"]);
        assert_eq!(registry.ids().count(), 2);
    }

    #[test]
    fn self_unsubscribe_is_deferred_to_end_of_pass() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = CallbackRegistry::new();

        let first_log = Rc::clone(&log);
        let first = registry.subscribe(move |s: &mut Substep<'_>| {
            first_log.borrow_mut().push("first");
            s.unsubscribe_self();
        });
        let second = registry.subscribe(logger(Rc::clone(&log), "second"));

        run_pass(&mut registry, 0, &mut ForceAccumulator::new());
        assert_eq!(*log.borrow(), vec!["first", "second"]);
        assert!(!registry.contains(first));
        assert!(registry.contains(second));

        run_pass(&mut registry, 1, &mut ForceAccumulator::new());
        assert_eq!(*log.borrow(), vec!["first", "second", "second"]);
    }

    #[test]
    fn unsubscribing_a_later_entry_mid_pass_still_fires_it_once() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = CallbackRegistry::new();
        let target = Rc::new(RefCell::new(None));

        let target_in = Rc::clone(&target);
        registry.subscribe(move |s: &mut Substep<'_>| {
            if let Some(id) = target_in.borrow_mut().take() {
                s.unsubscribe(id);
            }
        });
        let victim = registry.subscribe(logger(Rc::clone(&log), "victim"));
        *target.borrow_mut() = Some(victim);

        run_pass(&mut registry, 0, &mut ForceAccumulator::new());
        run_pass(&mut registry, 1, &mut ForceAccumulator::new());
        assert_eq!(*log.borrow(), vec!["victim"]);
        assert!(!registry.contains(victim));
    }

    #[test]
    fn subscribe_mid_pass_fires_next_pass() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = CallbackRegistry::new();

        let spawn_log = Rc::clone(&log);
        let mut spawned = false;
        registry.subscribe(move |s: &mut Substep<'_>| {
            if !spawned {
                spawned = true;
                s.subscribe(logger(Rc::clone(&spawn_log), "child"));
            }
        });

        run_pass(&mut registry, 0, &mut ForceAccumulator::new());
        assert!(log.borrow().is_empty());
        assert_eq!(registry.len(), 2);

        run_pass(&mut registry, 1, &mut ForceAccumulator::new());
        assert_eq!(*log.borrow(), vec!["child"]);
    }

    #[test]
    fn callbacks_accumulate_forces() {
        let mut registry = CallbackRegistry::new();
        registry.subscribe(|s: &mut Substep<'_>| s.add_force(Vector3::new(1.0, 0.0, 0.0)));
        registry.subscribe(|s: &mut Substep<'_>| s.add_torque(Vector3::new(0.0, 0.0, 2.0)));

        let mut acc = ForceAccumulator::new();
        run_pass(&mut registry, 0, &mut acc);
        run_pass(&mut registry, 1, &mut acc);
        assert_eq!(*acc.force(), Vector3::new(2.0, 0.0, 0.0));
        assert_eq!(*acc.torque(), Vector3::new(0.0, 0.0, 4.0));
    }

    #[test]
    fn ids_are_displayable() {
        let mut registry = CallbackRegistry::new();
        let id = registry.subscribe(|_| {});
        assert_eq!(id.to_string(), "sub#0");
        assert_eq!(id.raw(), 0);
    }
}
