use tracing::{debug, info};

use crate::domain::{ConnectionState, ProviderEventKind, WalletAddress};
use crate::error::FlowError;
use crate::state_machine::{connection_transition, Completion, ConnectionAction, StateTransition};

/// Handle for one outstanding `connect` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectTicket {
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectStart {
    /// Already connected; no provider call is needed.
    AlreadyConnected(WalletAddress),
    Started(ConnectTicket, StateTransition),
}

#[derive(Debug, Default)]
pub struct ConnectionManager {
    state: ConnectionState,
    generation: u64,
}

impl ConnectionManager {
    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn begin_connect(&mut self) -> Result<ConnectStart, FlowError> {
        if let ConnectionState::Connected(address) = &self.state {
            return Ok(ConnectStart::AlreadyConnected(address.clone()));
        }
        let transition = self.apply(ConnectionAction::Request)?;
        Ok(ConnectStart::Started(
            ConnectTicket {
                generation: self.generation,
            },
            transition,
        ))
    }

    pub fn complete_connect(
        &mut self,
        ticket: &ConnectTicket,
        outcome: Result<Vec<WalletAddress>, FlowError>,
    ) -> Result<Completion, FlowError> {
        if ticket.generation != self.generation || self.state != ConnectionState::Connecting {
            info!(
                ticket = ticket.generation,
                current = self.generation,
                "dropping stale connect result"
            );
            return Ok(Completion::Stale);
        }

        let action = match outcome {
            Ok(accounts) => match accounts.into_iter().next() {
                Some(address) => ConnectionAction::Approve(address),
                None => ConnectionAction::Fail(FlowError::ProviderError(
                    "no accounts returned".to_owned(),
                )),
            },
            Err(err) => ConnectionAction::Fail(err),
        };
        Ok(Completion::Applied(self.apply(action)?))
    }

    pub fn disconnect(&mut self) -> Result<StateTransition, FlowError> {
        self.generation = self.generation.saturating_add(1);
        self.apply(ConnectionAction::Disconnect)
    }

    pub fn apply_event(&mut self, kind: ProviderEventKind) -> Result<StateTransition, FlowError> {
        let action = match kind {
            ProviderEventKind::AccountsChanged(accounts) => {
                ConnectionAction::AccountsChanged(accounts)
            }
            ProviderEventKind::Disconnected => ConnectionAction::ProviderDisconnected,
        };
        self.apply(action)
    }

    fn apply(&mut self, action: ConnectionAction) -> Result<StateTransition, FlowError> {
        let (next, transition) = connection_transition(&self.state, action)?;
        debug!(
            from = transition.from,
            to = transition.to,
            reason = transition.reason,
            "connection transition"
        );
        self.state = next;
        Ok(transition)
    }
}
