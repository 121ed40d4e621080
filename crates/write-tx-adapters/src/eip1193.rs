use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use alloy::primitives::{keccak256, Address};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use write_tx_core::{
    MessagePayload, ProviderError, ProviderEvent, ProviderEventKind, Receipt, WalletAddress,
    WalletProvider,
};

use crate::config::{parse_chain_id, MessageDelivery, WalletAdapterConfig};

/// EIP-1193 wallet behind a JSON-RPC proxy, or a deterministic stand-in for
/// development and tests.
#[derive(Debug, Clone)]
pub struct Eip1193Adapter {
    mode: ProviderMode,
    delivery: MessageDelivery,
    expected_chain_id: Option<u64>,
    state: Arc<Mutex<ProviderState>>,
}

#[derive(Debug, Clone)]
enum ProviderMode {
    Disabled(String),
    Deterministic,
    Proxy(ProxyRuntime),
}

#[derive(Debug, Clone)]
struct ProxyRuntime {
    base_url: String,
    client: reqwest::Client,
    next_id: Arc<AtomicU64>,
}

#[derive(Debug)]
struct ProviderState {
    accounts: Vec<Address>,
    chain_id: u64,
    event_seq: u64,
    events: Vec<ProviderEvent>,
    reject_next: Option<ProviderError>,
}

impl ProviderState {
    fn deterministic() -> Self {
        Self {
            accounts: vec![Address::with_last_byte(1)],
            chain_id: 1,
            event_seq: 0,
            events: Vec::new(),
            reject_next: None,
        }
    }

    fn empty() -> Self {
        Self {
            accounts: Vec::new(),
            chain_id: 0,
            event_seq: 0,
            events: Vec::new(),
            reject_next: None,
        }
    }

    fn push_event(&mut self, kind: ProviderEventKind) {
        self.event_seq = self.event_seq.saturating_add(1);
        let sequence = self.event_seq;
        self.events.push(ProviderEvent { sequence, kind });
    }
}

impl Default for Eip1193Adapter {
    fn default() -> Self {
        Self::with_config(WalletAdapterConfig::from_env())
    }
}

impl Eip1193Adapter {
    pub fn with_config(config: WalletAdapterConfig) -> Self {
        let mode = if let Some(ref base_url) = config.eip1193_proxy_url {
            let timeout = Duration::from_millis(config.request_timeout_ms);
            match reqwest::Client::builder().timeout(timeout).build() {
                Ok(client) => ProviderMode::Proxy(ProxyRuntime {
                    base_url: base_url.clone(),
                    client,
                    next_id: Arc::new(AtomicU64::new(1)),
                }),
                Err(e) => {
                    if config.strict_runtime_required() {
                        ProviderMode::Disabled(format!(
                            "failed to initialize EIP-1193 proxy client in production profile: {e}"
                        ))
                    } else {
                        warn!(error = %e, "EIP-1193 proxy client unavailable; using deterministic wallet");
                        ProviderMode::Deterministic
                    }
                }
            }
        } else if config.strict_runtime_required() {
            ProviderMode::Disabled(
                "EIP-1193 proxy URL not configured in production runtime profile".to_owned(),
            )
        } else {
            ProviderMode::Deterministic
        };

        let state = match mode {
            ProviderMode::Deterministic => ProviderState::deterministic(),
            _ => ProviderState::empty(),
        };

        Self {
            mode,
            delivery: config.delivery,
            expected_chain_id: config.expected_chain_id,
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn is_deterministic(&self) -> bool {
        matches!(self.mode, ProviderMode::Deterministic)
    }

    fn check_mode(&self) -> Result<(), ProviderError> {
        if let ProviderMode::Disabled(reason) = &self.mode {
            return Err(ProviderError::Unavailable(reason.clone()));
        }
        Ok(())
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, ProviderState>, ProviderError> {
        self.state
            .lock()
            .map_err(|e| ProviderError::Transport(format!("provider lock poisoned: {e}")))
    }

    pub fn debug_inject_accounts_changed(&self, accounts: Vec<Address>) -> Result<(), ProviderError> {
        let mut g = self.lock_state()?;
        g.accounts = accounts.clone();
        g.push_event(ProviderEventKind::AccountsChanged(to_wallet_addresses(&accounts)));
        Ok(())
    }

    pub fn debug_inject_chain_changed(&self, chain_id: u64) -> Result<(), ProviderError> {
        self.lock_state()?.chain_id = chain_id;
        Ok(())
    }

    pub fn debug_inject_disconnect(&self) -> Result<(), ProviderError> {
        let mut g = self.lock_state()?;
        g.accounts.clear();
        g.push_event(ProviderEventKind::Disconnected);
        Ok(())
    }

    /// Fails the next connect or send with `err`, as a wallet popup would.
    pub fn debug_reject_next(&self, err: ProviderError) -> Result<(), ProviderError> {
        self.lock_state()?.reject_next = Some(err);
        Ok(())
    }

    fn take_scripted_rejection(&self) -> Result<(), ProviderError> {
        match self.lock_state()?.reject_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Polls `eth_accounts` (no wallet prompt) and queues an `AccountsChanged`
    /// event when the selection moved since the last call. Proxy wallets have
    /// no push channel, so this stands in for the browser callback.
    pub async fn refresh_accounts(&self) -> Result<(), ProviderError> {
        self.check_mode()?;
        if !matches!(self.mode, ProviderMode::Proxy(_)) {
            return Ok(());
        }
        let result = self.proxy_call("eth_accounts", serde_json::json!([])).await?;
        let accounts = parse_accounts(&result)?;
        let mut g = self.lock_state()?;
        if g.accounts != accounts {
            g.accounts = accounts.clone();
            if accounts.is_empty() {
                g.push_event(ProviderEventKind::Disconnected);
            } else {
                g.push_event(ProviderEventKind::AccountsChanged(to_wallet_addresses(&accounts)));
            }
        }
        Ok(())
    }

    pub async fn chain_id(&self) -> Result<u64, ProviderError> {
        self.check_mode()?;
        if matches!(self.mode, ProviderMode::Proxy(_)) {
            let result = self.proxy_call("eth_chainId", serde_json::json!([])).await?;
            let chain_id = json_chain_id_to_u64(&result)?;
            self.lock_state()?.chain_id = chain_id;
            return Ok(chain_id);
        }
        Ok(self.lock_state()?.chain_id)
    }

    async fn ensure_expected_chain(&self) -> Result<(), ProviderError> {
        let Some(expected) = self.expected_chain_id else {
            return Ok(());
        };
        let actual = self.chain_id().await?;
        if actual != expected {
            return Err(ProviderError::Validation(format!(
                "chain mismatch: expected {expected}, wallet is on {actual}"
            )));
        }
        Ok(())
    }

    async fn proxy_call(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let proxy = match &self.mode {
            ProviderMode::Proxy(proxy) => proxy,
            ProviderMode::Disabled(reason) => {
                return Err(ProviderError::Unavailable(reason.clone()))
            }
            ProviderMode::Deterministic => {
                return Err(ProviderError::Unavailable(
                    "eip1193 proxy runtime not enabled".to_owned(),
                ))
            }
        };

        let id = proxy.next_id.fetch_add(1, Ordering::SeqCst);
        debug!(method, id, "eip1193 proxy request");
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        let response = proxy
            .client
            .post(&proxy.base_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ProviderError::Unavailable(format!("eip1193 proxy unreachable: {e}"))
                } else {
                    ProviderError::Transport(format!("eip1193 proxy request failed: {e}"))
                }
            })?;
        let status = response.status();
        let body: Value = response.json().await.map_err(|e| {
            ProviderError::Transport(format!("eip1193 proxy json decode failed: {e}"))
        })?;
        if let Some(err) = body.get("error") {
            let code = err.get("code").and_then(Value::as_i64).unwrap_or(-32603);
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown provider error")
                .to_owned();
            return Err(map_rpc_error(code, message));
        }
        if !status.is_success() {
            return Err(ProviderError::Transport(format!(
                "eip1193 proxy status {status}: {body}"
            )));
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| ProviderError::Transport("eip1193 proxy missing result".to_owned()))
    }

    fn deterministic_receipt(&self, request: &Value) -> Result<Receipt, ProviderError> {
        let canonical = serde_json::to_vec(request)
            .map_err(|e| ProviderError::Validation(format!("payload serialization failed: {e}")))?;
        let hash = keccak256(canonical);
        let receipt = match self.delivery {
            MessageDelivery::PersonalSign => {
                let mut sig = Vec::with_capacity(65);
                sig.extend_from_slice(hash.as_slice());
                sig.extend_from_slice(hash.as_slice());
                sig.push(27);
                format!("0x{}", alloy::hex::encode(sig))
            }
            MessageDelivery::Transaction { .. } => hash.to_string(),
        };
        Ok(Receipt::new(receipt))
    }
}

#[async_trait]
impl WalletProvider for Eip1193Adapter {
    async fn connect(&self) -> Result<Vec<WalletAddress>, ProviderError> {
        self.check_mode()?;
        self.take_scripted_rejection()?;

        if matches!(self.mode, ProviderMode::Proxy(_)) {
            let result = self
                .proxy_call("eth_requestAccounts", serde_json::json!([]))
                .await?;
            let accounts = parse_accounts(&result)?;
            self.lock_state()?.accounts = accounts.clone();
            return Ok(to_wallet_addresses(&accounts));
        }

        Ok(to_wallet_addresses(&self.lock_state()?.accounts))
    }

    async fn send_message(&self, payload: &MessagePayload) -> Result<Receipt, ProviderError> {
        self.check_mode()?;
        self.take_scripted_rejection()?;
        self.ensure_expected_chain().await?;

        let from: Address = payload
            .from
            .as_str()
            .parse()
            .map_err(|e| ProviderError::Validation(format!("invalid sender address: {e}")))?;
        let data = format!("0x{}", alloy::hex::encode(payload.text.as_bytes()));
        let (method, params) = match self.delivery {
            MessageDelivery::PersonalSign => {
                ("personal_sign", serde_json::json!([data, from.to_string()]))
            }
            MessageDelivery::Transaction { recipient } => (
                "eth_sendTransaction",
                serde_json::json!([{
                    "from": from.to_string(),
                    "to": recipient.unwrap_or(from).to_string(),
                    "value": "0x0",
                    "data": data,
                }]),
            ),
        };

        if !matches!(self.mode, ProviderMode::Proxy(_)) {
            return self.deterministic_receipt(&serde_json::json!({
                "method": method,
                "params": params,
            }));
        }

        let result = self.proxy_call(method, params).await?;
        let raw = result.as_str().ok_or_else(|| {
            ProviderError::Transport(format!("{method} must return a hex string"))
        })?;
        if !raw.starts_with("0x") || alloy::hex::decode(raw).is_err() {
            return Err(ProviderError::Validation(format!(
                "{method} returned malformed hex: {raw}"
            )));
        }
        Ok(Receipt::new(raw))
    }

    fn drain_events(&self) -> Result<Vec<ProviderEvent>, ProviderError> {
        // A disabled provider never queues anything.
        if matches!(self.mode, ProviderMode::Disabled(_)) {
            return Ok(Vec::new());
        }
        let mut g = self.lock_state()?;
        Ok(std::mem::take(&mut g.events))
    }
}

/// EIP-1193 provider error codes; anything else stays a plain RPC error.
pub(crate) fn map_rpc_error(code: i64, message: String) -> ProviderError {
    match code {
        // User Rejected Request / Unauthorized
        4001 | 4100 => ProviderError::Rejected(message),
        // Disconnected / Chain Disconnected
        4900 | 4901 => ProviderError::Unavailable(message),
        _ => ProviderError::Rpc { code, message },
    }
}

fn parse_accounts(result: &Value) -> Result<Vec<Address>, ProviderError> {
    let arr = result
        .as_array()
        .ok_or_else(|| ProviderError::Transport("accounts: array expected".to_owned()))?;
    let mut accounts = Vec::with_capacity(arr.len());
    for item in arr {
        let raw = item
            .as_str()
            .ok_or_else(|| ProviderError::Transport("accounts: string expected".to_owned()))?;
        let parsed: Address = raw
            .parse()
            .map_err(|e| ProviderError::Validation(format!("invalid account address: {e}")))?;
        accounts.push(parsed);
    }
    Ok(accounts)
}

fn to_wallet_addresses(accounts: &[Address]) -> Vec<WalletAddress> {
    accounts
        .iter()
        .map(|a| WalletAddress::new(a.to_string()))
        .collect()
}

fn json_chain_id_to_u64(value: &Value) -> Result<u64, ProviderError> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    let s = value
        .as_str()
        .ok_or_else(|| ProviderError::Validation("chain id must be string or number".to_owned()))?;
    parse_chain_id(s).map_err(ProviderError::Validation)
}
