//! Generic state container with subscriber notification and disposal.

use crate::core::{State, TransitionHistory, TransitionRecord};
use crate::engine::transition::{Action, StepResult, Transition};
use crate::error::MachineError;
use chrono::Utc;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

type Listener<S> = Box<dyn FnMut(&S) + Send>;

struct ListenerEntry<S> {
    active: Arc<AtomicBool>,
    listener: Listener<S>,
}

/// Handle returned by [`Machine::subscribe`].
///
/// Dropping the handle does not unsubscribe.
#[derive(Debug, Clone)]
pub struct Subscription {
    active: Arc<AtomicBool>,
}

impl Subscription {
    pub(crate) fn new() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Flag shared with the publisher side.
    pub(crate) fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.active)
    }

    /// Stop receiving states. Calling this more than once is harmless.
    pub fn unsubscribe(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// A single machine instance.
///
/// Actions go in through [`send`](Self::send); snapshots come out through
/// [`subscribe`](Self::subscribe). Applying an action either replaces the
/// state and notifies every active listener in subscription order, or does
/// nothing at all.
pub struct Machine<S, A, T> {
    name: String,
    state: S,
    transition: T,
    listeners: Vec<ListenerEntry<S>>,
    history: TransitionHistory,
    disposed: bool,
    _action: PhantomData<fn(&A)>,
}

impl<S, A, T> Machine<S, A, T>
where
    S: State,
    A: Action,
    T: Transition<S, A>,
{
    pub fn new(name: impl Into<String>, initial: S, transition: T) -> Self {
        Self {
            name: name.into(),
            state: initial,
            transition,
            listeners: Vec::new(),
            history: TransitionHistory::new(),
            disposed: false,
            _action: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Current state.
    pub fn state(&self) -> Result<&S, MachineError> {
        self.ensure_live()?;
        Ok(&self.state)
    }

    /// Applied transitions so far.
    pub fn history(&self) -> Result<&TransitionHistory, MachineError> {
        self.ensure_live()?;
        Ok(&self.history)
    }

    /// Read access to the transition table and whatever it owns.
    pub fn transition(&self) -> Result<&T, MachineError> {
        self.ensure_live()?;
        Ok(&self.transition)
    }

    /// Apply an action. Returns `true` when the state changed.
    pub fn send(&mut self, action: A) -> Result<bool, MachineError> {
        self.ensure_live()?;

        let next = match self.transition.apply(&self.state, &action) {
            StepResult::Transitioned(next) => next,
            StepResult::Ignored => {
                debug!(
                    machine = %self.name,
                    state = self.state.name(),
                    action = action.name(),
                    "action ignored"
                );
                return Ok(false);
            }
        };

        debug!(
            machine = %self.name,
            from = self.state.name(),
            to = next.name(),
            action = action.name(),
            "transition applied"
        );
        self.history.record(TransitionRecord {
            from: self.state.name().to_string(),
            to: next.name().to_string(),
            action: action.name().to_string(),
            timestamp: Utc::now(),
        });
        self.state = next;
        self.notify();
        Ok(true)
    }

    /// Register a listener. It is called immediately with the current
    /// state, then once per applied transition.
    pub fn subscribe<F>(&mut self, listener: F) -> Result<Subscription, MachineError>
    where
        F: FnMut(&S) + Send + 'static,
    {
        self.ensure_live()?;
        self.prune();

        let subscription = Subscription::new();
        let mut listener: Listener<S> = Box::new(listener);
        listener(&self.state);
        self.listeners.push(ListenerEntry {
            active: subscription.flag(),
            listener,
        });

        Ok(subscription)
    }

    /// Release listeners and owned resources. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.transition.dispose();
        self.listeners.clear();
        self.disposed = true;
        info!(machine = %self.name, state = self.state.name(), "machine disposed");
    }

    fn notify(&mut self) {
        for entry in &mut self.listeners {
            if entry.active.load(Ordering::Acquire) {
                (entry.listener)(&self.state);
            }
        }
        self.prune();
    }

    fn prune(&mut self) {
        self.listeners
            .retain(|entry| entry.active.load(Ordering::Acquire));
    }

    fn ensure_live(&self) -> Result<(), MachineError> {
        if self.disposed {
            return Err(MachineError::Disposed {
                machine: self.name.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    crate::status_enum! {
        enum Lamp {
            Off => "lamp:off",
            On => "lamp:on",
            Broken => "lamp:broken",
        }
        final: [Broken]
    }

    #[derive(Debug)]
    enum Switch {
        Toggle,
        Smash,
        Nothing,
    }

    impl Action for Switch {
        fn name(&self) -> &str {
            match self {
                Self::Toggle => "TOGGLE",
                Self::Smash => "SMASH",
                Self::Nothing => "NOTHING",
            }
        }
    }

    fn lamp_transition(state: &Lamp, action: &Switch) -> StepResult<Lamp> {
        match (state, action) {
            (Lamp::Off, Switch::Toggle) => StepResult::Transitioned(Lamp::On),
            (Lamp::On, Switch::Toggle) => StepResult::Transitioned(Lamp::Off),
            (Lamp::Broken, _) => StepResult::Ignored,
            (_, Switch::Smash) => StepResult::Transitioned(Lamp::Broken),
            (_, Switch::Nothing) => StepResult::Ignored,
        }
    }

    type LampMachine = Machine<Lamp, Switch, fn(&Lamp, &Switch) -> StepResult<Lamp>>;

    fn lamp() -> LampMachine {
        Machine::new("lamp", Lamp::Off, lamp_transition as fn(&Lamp, &Switch) -> StepResult<Lamp>)
    }

    fn recorder() -> (Arc<Mutex<Vec<Lamp>>>, impl FnMut(&Lamp) + Send + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |s: &Lamp| sink.lock().unwrap().push(*s))
    }

    #[test]
    fn send_applies_transition() {
        let mut machine = lamp();
        assert!(machine.send(Switch::Toggle).unwrap());
        assert_eq!(machine.state().unwrap(), &Lamp::On);
    }

    #[test]
    fn subscribe_replays_current_state() {
        let mut machine = lamp();
        machine.send(Switch::Toggle).unwrap();

        let (seen, listener) = recorder();
        machine.subscribe(listener).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![Lamp::On]);
    }

    #[test]
    fn ignored_action_does_not_notify() {
        let mut machine = lamp();
        let (seen, listener) = recorder();
        machine.subscribe(listener).unwrap();

        assert!(!machine.send(Switch::Nothing).unwrap());
        assert_eq!(*seen.lock().unwrap(), vec![Lamp::Off]);
        assert!(machine.history().unwrap().is_empty());
    }

    #[test]
    fn listeners_are_notified_in_subscription_order() {
        let mut machine = lamp();
        let order = Arc::new(Mutex::new(Vec::new()));

        for id in 0..3 {
            let order = Arc::clone(&order);
            machine
                .subscribe(move |s: &Lamp| order.lock().unwrap().push((id, *s)))
                .unwrap();
        }
        order.lock().unwrap().clear();

        machine.send(Switch::Toggle).unwrap();
        assert_eq!(
            *order.lock().unwrap(),
            vec![(0, Lamp::On), (1, Lamp::On), (2, Lamp::On)]
        );
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let mut machine = lamp();
        let (seen, listener) = recorder();
        let subscription = machine.subscribe(listener).unwrap();

        subscription.unsubscribe();
        subscription.unsubscribe();
        assert!(!subscription.is_active());

        machine.send(Switch::Toggle).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![Lamp::Off]);
    }

    #[test]
    fn history_records_applied_transitions() {
        let mut machine = lamp();
        machine.send(Switch::Toggle).unwrap();
        machine.send(Switch::Nothing).unwrap();
        machine.send(Switch::Smash).unwrap();

        let history = machine.history().unwrap();
        assert_eq!(history.path(), vec!["lamp:off", "lamp:on", "lamp:broken"]);
        assert_eq!(history.last().unwrap().action, "SMASH");
    }

    #[test]
    fn dispose_is_idempotent_and_blocks_everything() {
        let mut machine = lamp();
        machine.dispose();
        machine.dispose();

        assert!(machine.is_disposed());
        assert!(matches!(
            machine.state(),
            Err(MachineError::Disposed { .. })
        ));
        assert!(machine.send(Switch::Toggle).is_err());
        assert!(machine.subscribe(|_: &Lamp| {}).is_err());
        assert!(machine.history().is_err());
    }

    #[test]
    fn dispose_runs_transition_hook_once() {
        struct Counting {
            disposed: Arc<Mutex<u32>>,
        }

        impl Transition<Lamp, Switch> for Counting {
            fn apply(&mut self, state: &Lamp, action: &Switch) -> StepResult<Lamp> {
                lamp_transition(state, action)
            }

            fn dispose(&mut self) {
                *self.disposed.lock().unwrap() += 1;
            }
        }

        let disposed = Arc::new(Mutex::new(0));
        let mut machine: Machine<Lamp, Switch, Counting> = Machine::new(
            "counting",
            Lamp::Off,
            Counting {
                disposed: Arc::clone(&disposed),
            },
        );
        machine.dispose();
        machine.dispose();

        assert_eq!(*disposed.lock().unwrap(), 1);
    }
}
