use crate::domain::{ConnectionState, Receipt, SubmissionState, WalletAddress};
use crate::error::FlowError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAction {
    Request,
    Approve(WalletAddress),
    Fail(FlowError),
    Disconnect,
    /// Provider callback; an empty list means the wallet revoked access.
    AccountsChanged(Vec<WalletAddress>),
    ProviderDisconnected,
}

impl ConnectionAction {
    fn name(&self) -> &'static str {
        match self {
            ConnectionAction::Request => "Request",
            ConnectionAction::Approve(_) => "Approve",
            ConnectionAction::Fail(_) => "Fail",
            ConnectionAction::Disconnect => "Disconnect",
            ConnectionAction::AccountsChanged(_) => "AccountsChanged",
            ConnectionAction::ProviderDisconnected => "ProviderDisconnected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionAction {
    Begin,
    Confirm(Receipt),
    Fail(FlowError),
    Reset,
}

impl SubmissionAction {
    fn name(&self) -> &'static str {
        match self {
            SubmissionAction::Begin => "Begin",
            SubmissionAction::Confirm(_) => "Confirm",
            SubmissionAction::Fail(_) => "Fail",
            SubmissionAction::Reset => "Reset",
        }
    }
}

/// Outcome of feeding a provider response back into a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Applied(StateTransition),
    /// The request was superseded (reset, disconnect) before it resolved.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub from: &'static str,
    pub to: &'static str,
    pub reason: &'static str,
}

pub fn connection_transition(
    state: &ConnectionState,
    action: ConnectionAction,
) -> Result<(ConnectionState, StateTransition), FlowError> {
    use ConnectionState as S;

    let from = state.label();
    let (next, reason) = match (state, action) {
        (S::Connecting, ConnectionAction::Request) => return Err(FlowError::AlreadyPending),
        (S::Disconnected | S::Error(_), ConnectionAction::Request) => {
            (S::Connecting, "connect_requested")
        }
        (S::Connecting, ConnectionAction::Approve(address)) => {
            (S::Connected(address), "provider_approved")
        }
        (S::Connecting, ConnectionAction::Fail(err)) => (S::Error(err), "provider_failed"),
        (_, ConnectionAction::Disconnect) => (S::Disconnected, "user_disconnected"),
        (S::Connected(_), ConnectionAction::AccountsChanged(accounts)) => {
            match accounts.into_iter().next() {
                Some(address) => (S::Connected(address), "accounts_changed"),
                None => (S::Disconnected, "accounts_revoked"),
            }
        }
        (S::Connected(_), ConnectionAction::ProviderDisconnected) => {
            (S::Disconnected, "provider_disconnected")
        }
        // Callbacks outside of an established session carry no information.
        (
            current,
            ConnectionAction::AccountsChanged(_) | ConnectionAction::ProviderDisconnected,
        ) => (current.clone(), "event_ignored"),
        (current, action) => {
            return Err(FlowError::IllegalTransition {
                machine: "connection".to_owned(),
                from: current.label().to_owned(),
                action: action.name().to_owned(),
            })
        }
    };

    let to = next.label();
    Ok((next, StateTransition { from, to, reason }))
}

pub fn submission_transition(
    state: &SubmissionState,
    action: SubmissionAction,
) -> Result<(SubmissionState, StateTransition), FlowError> {
    use SubmissionState as S;

    let from = state.label();
    let (next, reason) = match (state, action) {
        (S::Pending, SubmissionAction::Begin) => return Err(FlowError::AlreadyPending),
        (S::Idle | S::Confirmed(_) | S::Failed(_), SubmissionAction::Begin) => {
            (S::Pending, "submit_started")
        }
        (S::Pending, SubmissionAction::Confirm(receipt)) => {
            (S::Confirmed(receipt), "provider_confirmed")
        }
        (S::Pending, SubmissionAction::Fail(err)) => (S::Failed(err), "provider_failed"),
        (_, SubmissionAction::Reset) => (S::Idle, "reset"),
        (current, action) => {
            return Err(FlowError::IllegalTransition {
                machine: "submission".to_owned(),
                from: current.label().to_owned(),
                action: action.name().to_owned(),
            })
        }
    };

    let to = next.label();
    Ok((next, StateTransition { from, to, reason }))
}
