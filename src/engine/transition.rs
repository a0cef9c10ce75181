//! Transition contract between the engine and a machine definition.

use std::fmt::Debug;

/// An input accepted by a machine.
pub trait Action: Debug {
    /// Wire name of the action, e.g. `"START_OAUTH"`.
    fn name(&self) -> &str;
}

/// Outcome of applying one action to one state.
///
/// `Ignored` is the no-op signal: the engine keeps the current state
/// untouched and notifies nobody.
#[derive(Clone, Debug, PartialEq)]
pub enum StepResult<S> {
    /// Move to the given state
    Transitioned(S),

    /// The action does not apply to the current state
    Ignored,
}

impl<S> StepResult<S> {
    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored)
    }

    pub fn into_state(self) -> Option<S> {
        match self {
            Self::Transitioned(state) => Some(state),
            Self::Ignored => None,
        }
    }
}

/// A machine's transition table.
///
/// Implementations must be synchronous and must not perform I/O. The
/// only mutable data they may touch is data they own (a parent machine
/// owning its child machine).
pub trait Transition<S, A> {
    fn apply(&mut self, state: &S, action: &A) -> StepResult<S>;

    /// Called once when the owning machine is disposed.
    fn dispose(&mut self) {}
}

impl<S, A, F> Transition<S, A> for F
where
    F: FnMut(&S, &A) -> StepResult<S>,
{
    fn apply(&mut self, state: &S, action: &A) -> StepResult<S> {
        self(state, action)
    }
}
