pub mod composer;
pub mod connection;
pub mod domain;
pub mod error;
pub mod orchestrator;
pub mod ports;
pub mod state_machine;
pub mod submitter;

pub use composer::Composer;
pub use connection::{ConnectStart, ConnectTicket, ConnectionManager};
pub use domain::{
    ConnectionState, FlowSnapshot, Machine, MessagePayload, ProviderEvent, ProviderEventKind,
    Receipt, SubmissionState, TimestampMs, TransitionRecord, WalletAddress,
};
pub use error::FlowError;
pub use orchestrator::{WriteFlow, HISTORY_LIMIT};
pub use ports::{ClockPort, ProviderError, WalletProvider};
pub use state_machine::{
    connection_transition, submission_transition, Completion, ConnectionAction, StateTransition,
    SubmissionAction,
};
pub use submitter::{SubmissionTicket, Submitter};
