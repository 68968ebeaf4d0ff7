use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use holorelay::Relay;
use holorelay::application::ConsoleApplication;
use holorelay::transport::serve;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

type Client = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn start() -> (String, Arc<Relay>, Arc<ConsoleApplication>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let app = Arc::new(ConsoleApplication::new());
    let relay = Arc::new(Relay::with_application(app.clone()));
    tokio::spawn(serve(listener, relay.clone()));
    (url, relay, app)
}

async fn connect(url: &str) -> Client {
    let (mut ws, _) = connect_async(url).await.expect("client connect");
    assert_eq!(next_json(&mut ws).await["msgType"], "initialization");
    ws
}

async fn next_json(ws: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("read error");
        if let WsMessage::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn wait_for_clients(relay: &Relay, count: usize) {
    for _ in 0..200 {
        if relay.clients().len() == count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("registry never reached {count} clients");
}

async fn send(ws: &mut Client, frame: Value) {
    ws.send(WsMessage::Text(frame.to_string().into()))
        .await
        .unwrap();
}

#[tokio::test]
async fn integration_status_and_pose_follow_membership() {
    let (url, relay, _app) = start().await;

    let mut c1 = connect(&url).await;
    wait_for_clients(&relay, 1).await;
    relay.queue_message(json!({"msgType": "status", "x": 1}));
    assert_eq!(next_json(&mut c1).await, json!({"msgType": "status", "x": 1}));

    let mut c2 = connect(&url).await;
    wait_for_clients(&relay, 2).await;
    relay.queue_message(json!({"msgType": "pose", "p": [0, 0, 0]}));
    assert_eq!(next_json(&mut c1).await, json!({"msgType": "pose", "p": [0, 0, 0]}));
    assert_eq!(next_json(&mut c2).await, json!({"msgType": "pose", "p": [0, 0, 0]}));

    c1.close(None).await.unwrap();
    wait_for_clients(&relay, 1).await;
    relay.queue_message(json!({"msgType": "status", "x": 2}));
    assert_eq!(next_json(&mut c2).await, json!({"msgType": "status", "x": 2}));

    relay.close();
    let stats = relay.join().await.expect("dispatch loop stats");
    assert_eq!(stats.clients_at_shutdown, 1);
}

#[tokio::test]
async fn integration_commands_reach_application() {
    let (url, relay, app) = start().await;

    let mut a = connect(&url).await;
    let mut b = connect(&url).await;
    wait_for_clients(&relay, 2).await;

    send(&mut a, json!({"msgType": "bogus"})).await;
    send(&mut a, json!({"msgType": "startNode", "startNode": "mapper"})).await;

    // queued by the application, broadcast to everyone
    for ws in [&mut a, &mut b] {
        let status = next_json(ws).await;
        assert_eq!(status["msgType"], "status");
        assert_eq!(status["node"], "mapper");
    }
    assert_eq!(app.nodes(), vec!["mapper".to_string()]);

    send(&mut b, json!({"msgType": "calibrateHoloLens"})).await;
    for ws in [&mut a, &mut b] {
        let status = next_json(ws).await;
        assert_eq!(status["calibration"], "requested");
    }

    send(&mut b, json!({"msgType": "quitApplication"})).await;
    tokio::time::timeout(Duration::from_secs(2), app.quit_requested())
        .await
        .expect("quit request reached the application");

    relay.close();
    assert!(relay.join().await.is_some());
}
