#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use write_tx_core::{
    ClockPort, MessagePayload, ProviderError, ProviderEvent, ProviderEventKind, Receipt,
    WalletAddress, WalletProvider, WriteFlow,
};

#[derive(Debug, Default)]
pub struct TestClock {
    now: AtomicU64,
}

impl ClockPort for TestClock {
    fn now_ms(&self) -> Result<u64, ProviderError> {
        Ok(self.now.fetch_add(1, Ordering::SeqCst) + 1_739_750_400_000)
    }
}

/// Provider that answers from pre-loaded scripts and records what it was sent.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    connect_results: Mutex<VecDeque<Result<Vec<WalletAddress>, ProviderError>>>,
    send_results: Mutex<VecDeque<Result<Receipt, ProviderError>>>,
    events: Mutex<Vec<ProviderEvent>>,
    sent: Mutex<Vec<MessagePayload>>,
    connect_calls: AtomicU64,
}

impl ScriptedProvider {
    pub fn push_connect(&self, result: Result<Vec<WalletAddress>, ProviderError>) {
        self.connect_results
            .lock()
            .expect("connect script lock")
            .push_back(result);
    }

    pub fn push_send(&self, result: Result<Receipt, ProviderError>) {
        self.send_results
            .lock()
            .expect("send script lock")
            .push_back(result);
    }

    pub fn push_event(&self, kind: ProviderEventKind) {
        let mut events = self.events.lock().expect("events lock");
        let sequence = events.len() as u64 + 1;
        events.push(ProviderEvent { sequence, kind });
    }

    pub fn sent(&self) -> Vec<MessagePayload> {
        self.sent.lock().expect("sent lock").clone()
    }

    pub fn connect_calls(&self) -> u64 {
        self.connect_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletProvider for ScriptedProvider {
    async fn connect(&self) -> Result<Vec<WalletAddress>, ProviderError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        self.connect_results
            .lock()
            .expect("connect script lock")
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Unavailable("script exhausted".to_owned())))
    }

    async fn send_message(&self, payload: &MessagePayload) -> Result<Receipt, ProviderError> {
        self.sent.lock().expect("sent lock").push(payload.clone());
        self.send_results
            .lock()
            .expect("send script lock")
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Unavailable("script exhausted".to_owned())))
    }

    fn drain_events(&self) -> Result<Vec<ProviderEvent>, ProviderError> {
        Ok(std::mem::take(&mut *self.events.lock().expect("events lock")))
    }
}

pub type TestFlow = WriteFlow<ScriptedProvider, TestClock>;

pub fn new_flow() -> TestFlow {
    WriteFlow::new(ScriptedProvider::default(), TestClock::default())
}

pub fn address(raw: &str) -> WalletAddress {
    WalletAddress::new(raw)
}

/// Flow already connected as `0xABC`.
pub async fn connected_flow() -> TestFlow {
    let mut flow = new_flow();
    flow.provider.push_connect(Ok(vec![address("0xABC")]));
    flow.connect().await.expect("connect");
    flow
}
