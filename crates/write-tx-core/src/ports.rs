use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{MessagePayload, ProviderEvent, Receipt, WalletAddress};

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
}

/// The external wallet (browser extension, proxy, hardware bridge...).
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Asks the wallet for access; resolves with the selected accounts.
    async fn connect(&self) -> Result<Vec<WalletAddress>, ProviderError>;

    async fn send_message(&self, payload: &MessagePayload) -> Result<Receipt, ProviderError>;

    /// Callbacks observed since the last drain, oldest first.
    fn drain_events(&self) -> Result<Vec<ProviderEvent>, ProviderError> {
        Ok(Vec::new())
    }
}

pub trait ClockPort {
    fn now_ms(&self) -> Result<u64, ProviderError>;
}
