mod common;

use alloy::primitives::Address;
use serde_json::json;

use write_tx_adapters::{Eip1193Adapter, MessageDelivery, RuntimeProfile, WalletAdapterConfig};
use write_tx_core::{
    ConnectionState, FlowError, MessagePayload, ProviderError, ProviderEventKind, Receipt,
    SubmissionState, WalletAddress, WalletProvider, WriteFlow,
};

use common::{
    approving_wallet, methods, proxy_adapter, spawn_mock_wallet, TestClock, OTHER, OWNER, TX_HASH,
};

fn owner() -> WalletAddress {
    let parsed: Address = OWNER.parse().expect("owner address");
    WalletAddress::new(parsed.to_string())
}

#[tokio::test]
async fn connect_requests_accounts_over_json_rpc() {
    let (url, calls) = spawn_mock_wallet(approving_wallet);
    let adapter = proxy_adapter(&url, MessageDelivery::PersonalSign);

    let accounts = adapter.connect().await.expect("connect");
    assert_eq!(accounts, vec![owner()]);
    assert_eq!(methods(&calls), vec!["eth_requestAccounts"]);
}

#[tokio::test]
async fn personal_sign_sends_hex_text_and_returns_signature() {
    let (url, calls) = spawn_mock_wallet(approving_wallet);
    let adapter = proxy_adapter(&url, MessageDelivery::PersonalSign);

    let receipt = adapter
        .send_message(&MessagePayload {
            text: "hello".to_owned(),
            from: owner(),
        })
        .await
        .expect("personal_sign");
    assert_eq!(receipt.as_str(), format!("0x{}", "11".repeat(65)));

    let recorded = calls.lock().expect("calls lock").clone();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].method, "personal_sign");
    assert_eq!(recorded[0].params[0], json!("0x68656c6c6f"));
    assert_eq!(
        recorded[0].params[1].as_str().map(str::to_ascii_lowercase),
        Some(OWNER.to_owned())
    );
}

#[tokio::test]
async fn transaction_delivery_targets_recipient_and_returns_hash() {
    let (url, calls) = spawn_mock_wallet(approving_wallet);
    let recipient: Address = OTHER.parse().expect("recipient");
    let adapter = proxy_adapter(
        &url,
        MessageDelivery::Transaction {
            recipient: Some(recipient),
        },
    );

    let receipt = adapter
        .send_message(&MessagePayload {
            text: "hi".to_owned(),
            from: owner(),
        })
        .await
        .expect("eth_sendTransaction");
    assert_eq!(receipt, Receipt::new(TX_HASH));

    let recorded = calls.lock().expect("calls lock").clone();
    assert_eq!(recorded[0].method, "eth_sendTransaction");
    let tx = &recorded[0].params[0];
    assert_eq!(tx["data"], json!("0x6869"));
    assert_eq!(tx["value"], json!("0x0"));
    assert_eq!(
        tx["to"].as_str().map(str::to_ascii_lowercase),
        Some(OTHER.to_owned())
    );
}

#[tokio::test]
async fn user_rejection_code_maps_to_user_rejected() {
    let (url, _calls) = spawn_mock_wallet(|method, params| match method {
        "eth_requestAccounts" => approving_wallet(method, params),
        _ => Err((4001, "User rejected the request.")),
    });
    let mut flow = WriteFlow::new(
        proxy_adapter(&url, MessageDelivery::PersonalSign),
        TestClock::default(),
    );

    flow.connect().await.expect("connect");
    flow.set_text("hello").expect("set text");
    assert_eq!(flow.submit().await, Err(FlowError::UserRejected));
    assert_eq!(
        flow.submission(),
        &SubmissionState::Failed(FlowError::UserRejected)
    );
}

#[tokio::test]
async fn disconnected_wallet_maps_to_provider_unavailable() {
    let (url, _calls) = spawn_mock_wallet(|_, _| Err((4900, "Disconnected")));
    let mut flow = WriteFlow::new(
        proxy_adapter(&url, MessageDelivery::PersonalSign),
        TestClock::default(),
    );

    let err = flow.connect().await.expect_err("must fail");
    assert_eq!(err, FlowError::ProviderUnavailable("Disconnected".to_owned()));
    assert_eq!(flow.connection(), &ConnectionState::Error(err));
}

#[tokio::test]
async fn chain_mismatch_blocks_submission() {
    let (url, calls) = spawn_mock_wallet(approving_wallet);
    let adapter = Eip1193Adapter::with_config(WalletAdapterConfig {
        eip1193_proxy_url: Some(url),
        request_timeout_ms: 5_000,
        expected_chain_id: Some(8453),
        ..WalletAdapterConfig::default()
    });

    let err = adapter
        .send_message(&MessagePayload {
            text: "hello".to_owned(),
            from: owner(),
        })
        .await
        .expect_err("wrong chain");
    assert!(matches!(err, ProviderError::Validation(ref m) if m.contains("chain mismatch")));
    assert_eq!(methods(&calls), vec!["eth_chainId"]);
}

#[tokio::test]
async fn refresh_accounts_queues_change_events() {
    let (url, _calls) = spawn_mock_wallet(|method, params| match method {
        "eth_accounts" => Ok(json!([OTHER])),
        _ => approving_wallet(method, params),
    });
    let adapter = proxy_adapter(&url, MessageDelivery::PersonalSign);

    adapter.connect().await.expect("connect");
    adapter.refresh_accounts().await.expect("refresh");
    adapter.refresh_accounts().await.expect("refresh unchanged");

    let events = adapter.drain_events().expect("drain events");
    assert_eq!(events.len(), 1);
    let other: Address = OTHER.parse().expect("other");
    assert_eq!(
        events[0].kind,
        ProviderEventKind::AccountsChanged(vec![WalletAddress::new(other.to_string())])
    );
}

#[tokio::test]
async fn unreachable_proxy_is_provider_unavailable() {
    // Bind then drop to get a port nobody listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .expect("bind")
        .local_addr()
        .expect("local addr")
        .port();
    let adapter = proxy_adapter(&format!("http://127.0.0.1:{port}"), MessageDelivery::PersonalSign);

    let err = adapter.connect().await.expect_err("nobody listening");
    assert!(matches!(err, ProviderError::Unavailable(_)), "got {err:?}");
}

#[tokio::test]
async fn production_profile_without_proxy_is_disabled() {
    let adapter = Eip1193Adapter::with_config(WalletAdapterConfig {
        runtime_profile: RuntimeProfile::Production,
        ..WalletAdapterConfig::default()
    });
    let err = adapter.connect().await.expect_err("disabled");
    assert!(matches!(err, ProviderError::Unavailable(ref m) if m.contains("not configured")));
    assert!(adapter.drain_events().expect("nothing to drain").is_empty());
}

#[test]
fn disabled_provider_recovers_events_quietly() {
    let adapter = Eip1193Adapter::with_config(WalletAdapterConfig {
        runtime_profile: RuntimeProfile::Production,
        ..WalletAdapterConfig::default()
    });
    let mut flow = WriteFlow::new(adapter, TestClock::default());
    for _ in 0..3 {
        assert_eq!(flow.recover_provider_events().expect("recover"), 0);
    }
    assert_eq!(flow.connection(), &ConnectionState::Disconnected);
}
