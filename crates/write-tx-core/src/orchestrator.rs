use std::collections::VecDeque;

use tracing::{info, warn};

use crate::composer::Composer;
use crate::connection::{ConnectStart, ConnectTicket, ConnectionManager};
use crate::domain::{
    ConnectionState, FlowSnapshot, Machine, Receipt, SubmissionState, TimestampMs,
    TransitionRecord, WalletAddress,
};
use crate::error::FlowError;
use crate::ports::{ClockPort, ProviderError, WalletProvider};
use crate::state_machine::{Completion, StateTransition};
use crate::submitter::{SubmissionTicket, Submitter};

pub const HISTORY_LIMIT: usize = 256;

/// Drives connect, compose and submit against one wallet provider.
///
/// The flow has a single owner. Each request is split into a `begin_*` step
/// that hands out a ticket and a `complete_*` step that applies the provider's
/// answer, so a UI loop can await the provider elsewhere and feed the result
/// back. Results for tickets invalidated by `set_text` or `disconnect` are
/// dropped. `connect` and `submit` chain both steps for callers that can hold
/// `&mut self` across the await.
pub struct WriteFlow<P, C>
where
    P: WalletProvider,
    C: ClockPort,
{
    pub provider: P,
    pub clock: C,
    connection: ConnectionManager,
    composer: Composer,
    submitter: Submitter,
    history: VecDeque<TransitionRecord>,
    next_seq: u64,
}

impl<P, C> WriteFlow<P, C>
where
    P: WalletProvider,
    C: ClockPort,
{
    pub fn new(provider: P, clock: C) -> Self {
        Self {
            provider,
            clock,
            connection: ConnectionManager::default(),
            composer: Composer::default(),
            submitter: Submitter::default(),
            history: VecDeque::new(),
            next_seq: 1,
        }
    }

    pub fn connection(&self) -> &ConnectionState {
        self.connection.state()
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn submission(&self) -> &SubmissionState {
        self.submitter.state()
    }

    pub fn history(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.history.iter()
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        FlowSnapshot {
            connection: self.connection.state().clone(),
            message: self.composer.text().to_owned(),
            message_valid: self.composer.is_valid(),
            submission: self.submitter.state().clone(),
        }
    }

    pub async fn connect(&mut self) -> Result<WalletAddress, FlowError> {
        let ticket = match self.begin_connect()? {
            ConnectStart::AlreadyConnected(address) => return Ok(address),
            ConnectStart::Started(ticket, _) => ticket,
        };
        let outcome = self.provider.connect().await;
        self.complete_connect(&ticket, outcome)?;
        match self.connection.state() {
            ConnectionState::Connected(address) => Ok(address.clone()),
            ConnectionState::Error(err) => Err(err.clone()),
            other => Err(FlowError::IllegalTransition {
                machine: "connection".to_owned(),
                from: other.label().to_owned(),
                action: "Complete".to_owned(),
            }),
        }
    }

    pub fn begin_connect(&mut self) -> Result<ConnectStart, FlowError> {
        let start = self.connection.begin_connect()?;
        if let ConnectStart::Started(_, transition) = &start {
            self.record(Machine::Connection, transition);
        }
        Ok(start)
    }

    pub fn complete_connect(
        &mut self,
        ticket: &ConnectTicket,
        outcome: Result<Vec<WalletAddress>, ProviderError>,
    ) -> Result<Completion, FlowError> {
        if let Err(err) = &outcome {
            warn!(error = %err, "wallet connect failed");
        }
        let completion = self
            .connection
            .complete_connect(ticket, outcome.map_err(FlowError::from))?;
        if let Completion::Applied(transition) = &completion {
            self.record(Machine::Connection, transition);
        }
        Ok(completion)
    }

    /// Drops the session. An in-flight submission is abandoned with it.
    pub fn disconnect(&mut self) -> Result<(), FlowError> {
        let transition = self.connection.disconnect()?;
        self.record(Machine::Connection, &transition);
        self.reset_submission()
    }

    /// Replaces the message. Any change resets the submission to Idle.
    pub fn set_text(&mut self, text: impl Into<String>) -> Result<(), FlowError> {
        let text = text.into();
        if text == self.composer.text() {
            return Ok(());
        }
        self.composer.set_text(text);
        self.reset_submission()
    }

    pub async fn submit(&mut self) -> Result<Receipt, FlowError> {
        let ticket = self.begin_submit()?;
        let outcome = self.provider.send_message(ticket.payload()).await;
        self.complete_submit(&ticket, outcome)?;
        match self.submitter.state() {
            SubmissionState::Confirmed(receipt) => Ok(receipt.clone()),
            SubmissionState::Failed(err) => Err(err.clone()),
            other => Err(FlowError::IllegalTransition {
                machine: "submission".to_owned(),
                from: other.label().to_owned(),
                action: "Complete".to_owned(),
            }),
        }
    }

    pub fn begin_submit(&mut self) -> Result<SubmissionTicket, FlowError> {
        let (ticket, transition) = self
            .submitter
            .begin(self.connection.state(), &self.composer)?;
        self.record(Machine::Submission, &transition);
        Ok(ticket)
    }

    pub fn complete_submit(
        &mut self,
        ticket: &SubmissionTicket,
        outcome: Result<Receipt, ProviderError>,
    ) -> Result<Completion, FlowError> {
        match &outcome {
            Ok(receipt) => info!(%receipt, "message accepted by provider"),
            Err(err) => warn!(error = %err, "message submission failed"),
        }
        let completion = self
            .submitter
            .complete(ticket, outcome.map_err(FlowError::from))?;
        if let Completion::Applied(transition) = &completion {
            self.record(Machine::Submission, transition);
        }
        Ok(completion)
    }

    /// Applies provider callbacks (account switches, disconnects) queued since
    /// the last call. Returns how many events were drained.
    pub fn recover_provider_events(&mut self) -> Result<usize, FlowError> {
        let events = self.provider.drain_events()?;
        let drained = events.len();
        for event in events {
            let transition = self.connection.apply_event(event.kind)?;
            if transition.reason != "event_ignored" {
                self.record(Machine::Connection, &transition);
            }
        }
        Ok(drained)
    }

    fn reset_submission(&mut self) -> Result<(), FlowError> {
        if let Some(transition) = self.submitter.reset()? {
            self.record(Machine::Submission, &transition);
        }
        Ok(())
    }

    fn record(&mut self, machine: Machine, transition: &StateTransition) {
        let at_ms = match self.clock.now_ms() {
            Ok(now) => now,
            Err(err) => {
                warn!(error = %err, "clock unavailable; recording transition at 0");
                0
            }
        };
        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);
        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(TransitionRecord {
            seq,
            machine,
            from: transition.from.to_owned(),
            to: transition.to.to_owned(),
            reason: transition.reason.to_owned(),
            at_ms: TimestampMs(at_ms),
        });
    }
}
