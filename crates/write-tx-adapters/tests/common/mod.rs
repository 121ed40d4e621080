#![allow(dead_code)]

use std::io::Read;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::{json, Value};
use tiny_http::{Response, Server, StatusCode};

use write_tx_adapters::{Eip1193Adapter, MessageDelivery, WalletAdapterConfig};
use write_tx_core::{ClockPort, ProviderError, WriteFlow};

pub const OWNER: &str = "0x1000000000000000000000000000000000000001";
pub const OTHER: &str = "0x2000000000000000000000000000000000000002";
pub const TX_HASH: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

#[derive(Debug, Default)]
pub struct TestClock {
    now: AtomicU64,
}

impl ClockPort for TestClock {
    fn now_ms(&self) -> Result<u64, ProviderError> {
        Ok(self.now.fetch_add(1, Ordering::SeqCst) + 1_739_750_400_000)
    }
}

pub type AdapterFlow = WriteFlow<Eip1193Adapter, TestClock>;

pub fn deterministic_adapter() -> Eip1193Adapter {
    Eip1193Adapter::with_config(WalletAdapterConfig::default())
}

pub fn proxy_adapter(base_url: &str, delivery: MessageDelivery) -> Eip1193Adapter {
    Eip1193Adapter::with_config(WalletAdapterConfig {
        eip1193_proxy_url: Some(base_url.to_owned()),
        request_timeout_ms: 5_000,
        delivery,
        ..WalletAdapterConfig::default()
    })
}

/// A JSON-RPC call as seen by the mock wallet.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub params: Value,
}

/// Serves JSON-RPC until idle for five seconds. `handler` returns either the
/// `result` value or an EIP-1193 `(code, message)` error.
pub fn spawn_mock_wallet<F>(handler: F) -> (String, Arc<Mutex<Vec<RecordedCall>>>)
where
    F: Fn(&str, &Value) -> Result<Value, (i64, &'static str)> + Send + 'static,
{
    let server = Server::http("127.0.0.1:0").expect("start server");
    let addr = format!("http://{}", server.server_addr());
    let calls = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&calls);

    thread::spawn(move || loop {
        let mut req = match server.recv_timeout(Duration::from_secs(5)) {
            Ok(Some(r)) => r,
            _ => break,
        };
        let mut body = String::new();
        if req.as_reader().read_to_string(&mut body).is_err() {
            break;
        }
        let call: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
        let method = call["method"].as_str().unwrap_or_default().to_owned();
        let params = call["params"].clone();
        if let Ok(mut g) = recorded.lock() {
            g.push(RecordedCall {
                method: method.clone(),
                params: params.clone(),
            });
        }

        let payload = match handler(&method, &params) {
            Ok(result) => json!({"jsonrpc": "2.0", "id": call["id"], "result": result}),
            Err((code, message)) => json!({
                "jsonrpc": "2.0",
                "id": call["id"],
                "error": {"code": code, "message": message},
            }),
        };
        let response =
            Response::from_string(payload.to_string()).with_status_code(StatusCode(200));
        let _ = req.respond(response);
    });

    (addr, calls)
}

/// Wallet that approves everything on chain 1 with `OWNER` selected.
pub fn approving_wallet(method: &str, _params: &Value) -> Result<Value, (i64, &'static str)> {
    match method {
        "eth_requestAccounts" | "eth_accounts" => Ok(json!([OWNER])),
        "eth_chainId" => Ok(json!("0x1")),
        "personal_sign" => Ok(json!(format!("0x{}", "11".repeat(65)))),
        "eth_sendTransaction" => Ok(json!(TX_HASH)),
        _ => Err((4200, "unsupported method")),
    }
}

pub fn methods(calls: &Arc<Mutex<Vec<RecordedCall>>>) -> Vec<String> {
    calls
        .lock()
        .expect("calls lock")
        .iter()
        .map(|c| c.method.clone())
        .collect()
}
