use serde_json::{Value, json};
use tokio::sync::mpsc;
use tungstenite::protocol::Message as WsMessage;

use super::decoder;
use super::message::{ClientMessage, ServerMessage};
use super::sender;
use crate::application::{ApplicationError, MockApplication};
use crate::broker::event::Payload;
use crate::client::ClientHandle;
use crate::utils::RelayError;

fn parse(frame: &WsMessage) -> Value {
    serde_json::from_str(frame.to_text().unwrap()).unwrap()
}

#[test]
fn test_decode_known_commands() {
    assert_eq!(
        decoder::decode(r#"{"msgType":"calibrateHoloLens"}"#).unwrap(),
        ClientMessage::CalibrateHoloLens
    );
    assert_eq!(
        decoder::decode(r#"{"msgType":"startNode","startNode":"mapper"}"#).unwrap(),
        ClientMessage::StartNode {
            name: "mapper".to_string()
        }
    );
    assert_eq!(
        decoder::decode(r#"{"msgType":"quitApplication","extra":1}"#).unwrap(),
        ClientMessage::QuitApplication
    );
}

#[test]
fn test_decode_rejects_bad_frames() {
    for raw in [
        r#"{"msgType":"bogus"}"#,
        r#"{"msgType":"startNode"}"#,
        r#"{"startNode":"mapper"}"#,
        r#"{"msgType":"startNode","startNode":7}"#,
        "[]",
        "{",
        "",
    ] {
        assert!(
            matches!(decoder::decode(raw), Err(RelayError::Decode(_))),
            "expected decode error for {raw:?}"
        );
    }
}

#[test]
fn test_excerpt_truncates_on_char_boundary() {
    let raw = "é".repeat(250);
    let short = decoder::excerpt(&raw);
    assert_eq!(short.chars().count(), 100);
    assert_eq!(decoder::excerpt("{}"), "{}");
}

#[test]
fn test_invoke_routes_each_command() {
    let mut app = MockApplication::new();
    app.expect_calibrate().times(1).returning(|| Ok(()));
    app.expect_start_node()
        .withf(|name| name == "mapper")
        .times(1)
        .returning(|_| Err(ApplicationError::Failed("no such launch file".to_string())));
    app.expect_quit_application().times(1).returning(|| Ok(()));

    let client_id = crate::client::ClientId::new();
    assert!(decoder::invoke(&app, &ClientMessage::CalibrateHoloLens, client_id));
    assert!(!decoder::invoke(
        &app,
        &ClientMessage::StartNode {
            name: "mapper".to_string()
        },
        client_id
    ));
    assert!(decoder::invoke(&app, &ClientMessage::QuitApplication, client_id));
}

#[test]
fn test_encode_server_messages() {
    let frame = sender::encode(&ServerMessage::Initialization).unwrap();
    assert_eq!(parse(&frame), json!({"msgType": "initialization"}));

    let mut payload = Payload::new();
    payload.insert("battery".to_string(), json!(0.82));
    let frame = sender::encode(&ServerMessage::Status(&payload)).unwrap();
    assert_eq!(parse(&frame), json!({"msgType": "status", "battery": 0.82}));

    let frame = sender::encode(&ServerMessage::Pose(&Payload::new())).unwrap();
    assert_eq!(parse(&frame), json!({"msgType": "pose"}));
}

#[test]
fn test_send_to_one_reports_closed_channel() {
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();
    let client = ClientHandle::new(tx);

    sender::send_to_one(&client, WsMessage::text("hello")).unwrap();
    assert_eq!(rx.try_recv().unwrap().to_text().unwrap(), "hello");

    drop(rx);
    match sender::send_to_one(&client, WsMessage::text("again")) {
        Err(RelayError::Send { client_id }) => assert_eq!(client_id, client.id()),
        other => panic!("Expected a send error, got {other:?}"),
    }
}

#[test]
fn test_broadcast_isolates_failures() {
    let (tx1, mut rx1) = mpsc::unbounded_channel::<WsMessage>();
    let (tx2, rx2) = mpsc::unbounded_channel::<WsMessage>();
    let (tx3, mut rx3) = mpsc::unbounded_channel::<WsMessage>();
    let clients = [
        ClientHandle::new(tx1),
        ClientHandle::new(tx2),
        ClientHandle::new(tx3),
    ];
    let weak: Vec<_> = clients.iter().map(ClientHandle::downgrade).collect();

    drop(rx2);

    let report = sender::broadcast(&weak, &WsMessage::text("tick"));
    assert_eq!(report.attempted(), 3);
    assert_eq!(report.delivered, 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, clients[1].id());
    assert!(rx1.try_recv().is_ok());
    assert!(rx3.try_recv().is_ok());
}
