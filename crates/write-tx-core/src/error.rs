use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ports::ProviderError;

/// User-facing failure of a connect or submit attempt.
///
/// Every variant is recoverable: the user retries by calling connect or
/// submit again.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum FlowError {
    #[error("wallet provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("request rejected by user")]
    UserRejected,
    #[error("message is empty")]
    ValidationFailed,
    #[error("a request is already pending")]
    AlreadyPending,
    #[error("wallet is not connected")]
    NotConnected,
    #[error("provider error: {0}")]
    ProviderError(String),
    #[error("illegal {machine} transition: {action} from {from}")]
    IllegalTransition {
        machine: String,
        from: String,
        action: String,
    },
}

impl From<ProviderError> for FlowError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Unavailable(reason) => FlowError::ProviderUnavailable(reason),
            ProviderError::Rejected(_) => FlowError::UserRejected,
            other => FlowError::ProviderError(other.to_string()),
        }
    }
}
