use write_tx_core::{
    ConnectionState, FlowError, FlowSnapshot, Machine, Receipt, SubmissionState, TimestampMs,
    TransitionRecord, WalletAddress,
};

#[test]
fn newtypes_serialize_as_plain_strings() {
    let json = serde_json::to_string(&WalletAddress::new("0xABC")).expect("serialize address");
    assert_eq!(json, "\"0xABC\"");
    let json = serde_json::to_string(&Receipt::new("tx123")).expect("serialize receipt");
    assert_eq!(json, "\"tx123\"");
}

#[test]
fn snapshot_roundtrip_keeps_error_reasons() {
    let snapshot = FlowSnapshot {
        connection: ConnectionState::Error(FlowError::ProviderUnavailable(
            "extension missing".to_owned(),
        )),
        message: "hello".to_owned(),
        message_valid: true,
        submission: SubmissionState::Failed(FlowError::ProviderError("reverted".to_owned())),
    };

    let encoded = serde_json::to_vec(&snapshot).expect("serialize snapshot");
    let decoded: FlowSnapshot = serde_json::from_slice(&encoded).expect("deserialize snapshot");
    assert_eq!(decoded, snapshot);
}

#[test]
fn transition_record_serializes_machine_and_timestamp() {
    let record = TransitionRecord {
        seq: 3,
        machine: Machine::Submission,
        from: "Idle".to_owned(),
        to: "Pending".to_owned(),
        reason: "submit_started".to_owned(),
        at_ms: TimestampMs(1739750400000),
    };
    let json = serde_json::to_string(&record).expect("serialize record");
    assert!(json.contains("\"machine\":\"Submission\""));
    assert!(json.contains("\"at_ms\":1739750400000"));
}
