//! The flow machine: one connect-and-withdraw run.

use crate::config::FlowConfig;
use crate::core::TransitionHistory;
use crate::engine::{Machine, Subscription};
use crate::error::MachineError;
use crate::flow::transition::FlowTransition;
use crate::flow::types::{FlowAction, FlowContext, FlowState};
use crate::withdrawal::WithdrawalState;

/// Orchestrates exchange selection, OAuth, wallet loading, quoting and
/// the withdrawal itself.
///
/// The host translates every API response and push message into exactly
/// one [`send`](Self::send) call and renders whatever
/// [`subscribe`](Self::subscribe) delivers.
pub struct FlowMachine {
    machine: Machine<FlowState, FlowAction, FlowTransition>,
}

impl FlowMachine {
    /// Create a flow with the default configuration.
    pub fn new(org_id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self::with_config(org_id, project_id, &FlowConfig::default())
    }

    pub fn with_config(
        org_id: impl Into<String>,
        project_id: impl Into<String>,
        config: &FlowConfig,
    ) -> Self {
        let context = FlowContext::new(org_id, project_id, config.withdrawal.max_retries);
        Self {
            machine: Machine::new("flow", FlowState::initial(context), FlowTransition::new()),
        }
    }

    pub fn state(&self) -> Result<&FlowState, MachineError> {
        self.machine.state()
    }

    /// Apply an action. Returns `true` when the flow state changed.
    pub fn send(&mut self, action: FlowAction) -> Result<bool, MachineError> {
        self.machine.send(action)
    }

    pub fn subscribe<F>(&mut self, listener: F) -> Result<Subscription, MachineError>
    where
        F: FnMut(&FlowState) + Send + 'static,
    {
        self.machine.subscribe(listener)
    }

    pub fn history(&self) -> Result<&TransitionHistory, MachineError> {
        self.machine.history()
    }

    /// Snapshot of the withdrawal sub-machine, if one is running.
    pub fn withdrawal(&self) -> Result<Option<&WithdrawalState>, MachineError> {
        Ok(self
            .machine
            .transition()?
            .withdrawal()
            .and_then(|child| child.state().ok()))
    }

    pub fn is_disposed(&self) -> bool {
        self.machine.is_disposed()
    }

    /// Dispose the flow and its withdrawal sub-machine. Idempotent.
    pub fn dispose(&mut self) {
        self.machine.dispose();
    }
}
