use std::env;

use alloy::primitives::Address;
use thiserror::Error;
use tracing::warn;

pub const ENV_RUNTIME_PROFILE: &str = "WRITE_TX_RUNTIME_PROFILE";
pub const ENV_EIP1193_PROXY_URL: &str = "WRITE_TX_EIP1193_PROXY_URL";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "WRITE_TX_REQUEST_TIMEOUT_MS";
pub const ENV_DELIVERY: &str = "WRITE_TX_DELIVERY";
pub const ENV_RECIPIENT: &str = "WRITE_TX_RECIPIENT";
pub const ENV_CHAIN_ID: &str = "WRITE_TX_CHAIN_ID";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeProfile {
    #[default]
    Development,
    Production,
}

/// How a composed message reaches the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageDelivery {
    /// `personal_sign`; the receipt is the signature.
    #[default]
    PersonalSign,
    /// `eth_sendTransaction` with the UTF-8 text as calldata; the receipt is
    /// the transaction hash. Without a recipient the sender pays itself.
    Transaction { recipient: Option<Address> },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct WalletAdapterConfig {
    pub runtime_profile: RuntimeProfile,
    pub eip1193_proxy_url: Option<String>,
    pub request_timeout_ms: u64,
    pub delivery: MessageDelivery,
    pub expected_chain_id: Option<u64>,
}

impl Default for WalletAdapterConfig {
    fn default() -> Self {
        Self {
            runtime_profile: RuntimeProfile::Development,
            eip1193_proxy_url: None,
            request_timeout_ms: 120_000,
            delivery: MessageDelivery::PersonalSign,
            expected_chain_id: None,
        }
    }
}

impl WalletAdapterConfig {
    /// Reads the environment, falling back to defaults on malformed input.
    pub fn from_env() -> Self {
        Self::try_from_env().unwrap_or_else(|e| {
            warn!(error = %e, "ignoring wallet adapter environment");
            Self::default()
        })
    }

    pub fn try_from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        let runtime_profile = match get(ENV_RUNTIME_PROFILE).as_deref() {
            None => defaults.runtime_profile,
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "development" | "dev" => RuntimeProfile::Development,
                "production" | "prod" => RuntimeProfile::Production,
                other => {
                    return Err(ConfigError::Invalid {
                        key: ENV_RUNTIME_PROFILE,
                        reason: format!("unknown profile {other:?}"),
                    })
                }
            },
        };

        let request_timeout_ms = match get(ENV_REQUEST_TIMEOUT_MS) {
            None => defaults.request_timeout_ms,
            Some(raw) => raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
                key: ENV_REQUEST_TIMEOUT_MS,
                reason: format!("{e}"),
            })?,
        };

        let recipient = match get(ENV_RECIPIENT) {
            None => None,
            Some(raw) => Some(raw.parse::<Address>().map_err(|e| ConfigError::Invalid {
                key: ENV_RECIPIENT,
                reason: format!("{e}"),
            })?),
        };

        let delivery = match get(ENV_DELIVERY).as_deref() {
            None | Some("personal_sign") => {
                if recipient.is_some() {
                    warn!("{ENV_RECIPIENT} is only used with transaction delivery");
                }
                MessageDelivery::PersonalSign
            }
            Some("transaction") => MessageDelivery::Transaction { recipient },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: ENV_DELIVERY,
                    reason: format!("unknown delivery {other:?}"),
                })
            }
        };

        let expected_chain_id = match get(ENV_CHAIN_ID) {
            None => None,
            Some(raw) => Some(parse_chain_id(&raw).map_err(|reason| ConfigError::Invalid {
                key: ENV_CHAIN_ID,
                reason,
            })?),
        };

        Ok(Self {
            runtime_profile,
            eip1193_proxy_url: get(ENV_EIP1193_PROXY_URL),
            request_timeout_ms,
            delivery,
            expected_chain_id,
        })
    }

    pub fn strict_runtime_required(&self) -> bool {
        self.runtime_profile == RuntimeProfile::Production
    }
}

/// Accepts both `0x`-prefixed hex (as returned by `eth_chainId`) and decimal.
pub(crate) fn parse_chain_id(raw: &str) -> Result<u64, String> {
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).map_err(|e| format!("invalid hex chain id: {e}"))
    } else {
        raw.parse()
            .map_err(|e| format!("invalid chain id: {e}"))
    }
}
