use tracing::{debug, info};

use crate::composer::Composer;
use crate::domain::{ConnectionState, MessagePayload, Receipt, SubmissionState};
use crate::error::FlowError;
use crate::state_machine::{submission_transition, Completion, StateTransition, SubmissionAction};

/// Handle for one in-flight submission. Carries the exact payload to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionTicket {
    generation: u64,
    payload: MessagePayload,
}

impl SubmissionTicket {
    pub fn payload(&self) -> &MessagePayload {
        &self.payload
    }
}

#[derive(Debug, Default)]
pub struct Submitter {
    state: SubmissionState,
    generation: u64,
}

impl Submitter {
    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// Precondition order: pending, then message validity, then connection.
    /// A rejected call leaves the state untouched.
    pub fn begin(
        &mut self,
        connection: &ConnectionState,
        composer: &Composer,
    ) -> Result<(SubmissionTicket, StateTransition), FlowError> {
        if self.state.is_pending() {
            return Err(FlowError::AlreadyPending);
        }
        if !composer.is_valid() {
            return Err(FlowError::ValidationFailed);
        }
        let from = connection.address().ok_or(FlowError::NotConnected)?.clone();

        let transition = self.apply(SubmissionAction::Begin)?;
        let ticket = SubmissionTicket {
            generation: self.generation,
            payload: MessagePayload {
                text: composer.text().to_owned(),
                from,
            },
        };
        Ok((ticket, transition))
    }

    pub fn complete(
        &mut self,
        ticket: &SubmissionTicket,
        outcome: Result<Receipt, FlowError>,
    ) -> Result<Completion, FlowError> {
        if ticket.generation != self.generation || !self.state.is_pending() {
            info!(
                ticket = ticket.generation,
                current = self.generation,
                "dropping stale submission result"
            );
            return Ok(Completion::Stale);
        }

        let action = match outcome {
            Ok(receipt) => SubmissionAction::Confirm(receipt),
            Err(err) => SubmissionAction::Fail(err),
        };
        Ok(Completion::Applied(self.apply(action)?))
    }

    /// Back to Idle. Any ticket handed out before this call becomes stale.
    /// Returns `None` when already Idle.
    pub fn reset(&mut self) -> Result<Option<StateTransition>, FlowError> {
        self.generation = self.generation.saturating_add(1);
        if self.state == SubmissionState::Idle {
            return Ok(None);
        }
        self.apply(SubmissionAction::Reset).map(Some)
    }

    fn apply(&mut self, action: SubmissionAction) -> Result<StateTransition, FlowError> {
        let (next, transition) = submission_transition(&self.state, action)?;
        debug!(
            from = transition.from,
            to = transition.to,
            reason = transition.reason,
            "submission transition"
        );
        self.state = next;
        Ok(transition)
    }
}
