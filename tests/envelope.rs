// tests/envelope.rs

use chrono::{TimeZone, Utc};
use serde_json::json;

use pipeline_console::conn::envelope::{decode_frame, parse_timestamp, FrameError};
use pipeline_console::conn::{ControlFrame, Inbound, MessageKind};
use pipeline_console::types::{LogLevel, LogSource};

fn received_at() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

#[test]
fn decodes_log_envelope() {
    let text = json!({
        "type": "log",
        "timestamp": "2024-05-01T12:30:45.250",
        "payload": {
            "level": "warning",
            "source": "dbt",
            "message": "model took 30s",
            "job_id": "job-9"
        }
    })
    .to_string();

    let Inbound::Log(event) = decode_frame(&text, received_at()).unwrap() else {
        panic!("expected a log message");
    };
    assert_eq!(event.level, LogLevel::Warning);
    assert_eq!(event.source, LogSource::TransformRunner);
    assert_eq!(event.message, "model took 30s");
    assert_eq!(event.job_id.as_deref(), Some("job-9"));
    assert_eq!(
        event.timestamp,
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 45).unwrap() + chrono::Duration::milliseconds(250)
    );
}

#[test]
fn accepts_spelled_out_source_names_and_warn_alias() {
    let text = json!({
        "type": "log",
        "payload": { "level": "warn", "source": "pipeline-loader", "message": "x" }
    })
    .to_string();

    let Inbound::Log(event) = decode_frame(&text, received_at()).unwrap() else {
        panic!("expected a log message");
    };
    assert_eq!(event.level, LogLevel::Warning);
    assert_eq!(event.source, LogSource::PipelineLoader);
}

#[test]
fn missing_timestamp_uses_receive_time() {
    let text = json!({ "type": "status", "payload": { "job_id": "job-1", "status": "running" } })
        .to_string();
    let message = decode_frame(&text, received_at()).unwrap();
    assert_eq!(message.kind(), MessageKind::Status);
    assert_eq!(message.timestamp(), received_at());
    assert_eq!(message.job_id(), Some("job-1"));
}

#[test]
fn passthrough_kinds_keep_their_payload() {
    for kind in ["progress", "status", "complete", "error", "pong"] {
        let text = json!({ "type": kind, "payload": { "anything": [1, 2, 3] } }).to_string();
        let message = decode_frame(&text, received_at()).unwrap();
        let payload = match &message {
            Inbound::Progress(p)
            | Inbound::Status(p)
            | Inbound::Complete(p)
            | Inbound::Error(p)
            | Inbound::Pong(p) => &p.payload,
            Inbound::Log(_) => panic!("{kind} decoded as a log"),
        };
        assert_eq!(payload, &json!({ "anything": [1, 2, 3] }));
    }
}

#[test]
fn rejects_invalid_json_and_unknown_kinds() {
    assert!(matches!(
        decode_frame("{", received_at()),
        Err(FrameError::Envelope(_))
    ));
    assert!(matches!(
        decode_frame(r#"{"type":"telemetry","payload":{}}"#, received_at()),
        Err(FrameError::Envelope(_))
    ));
}

#[test]
fn rejects_log_without_message() {
    let text =
        json!({ "type": "log", "payload": { "level": "info", "source": "dlt" } }).to_string();
    assert!(matches!(
        decode_frame(&text, received_at()),
        Err(FrameError::LogPayload(_))
    ));
}

#[test]
fn parses_offset_and_naive_timestamps() {
    let expected = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    assert_eq!(parse_timestamp(Some("2024-05-01T12:00:00+02:00")), Some(expected));
    assert_eq!(parse_timestamp(Some("2024-05-01T10:00:00Z")), Some(expected));
    assert_eq!(parse_timestamp(Some("2024-05-01T10:00:00")), Some(expected));
    assert_eq!(parse_timestamp(Some("yesterday")), None);
    assert_eq!(parse_timestamp(Some("  ")), None);
    assert_eq!(parse_timestamp(None), None);
}

#[test]
fn control_frames_serialize_with_action_tag() {
    let subscribe = ControlFrame::Subscribe {
        job_id: "job-1".into(),
    };
    let value: serde_json::Value = serde_json::from_str(&subscribe.to_json().unwrap()).unwrap();
    assert_eq!(value, json!({ "action": "subscribe", "job_id": "job-1" }));

    let ping: serde_json::Value =
        serde_json::from_str(&ControlFrame::Ping.to_json().unwrap()).unwrap();
    assert_eq!(ping, json!({ "action": "ping" }));
}
