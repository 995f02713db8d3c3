//! End-to-end tests using real WebSocket clients against a running server.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};

use live_signal::{AppConfig, Identity, LiveSession, ServerHandle};

const TIMEOUT: Duration = Duration::from_secs(5);
const QUIET: Duration = Duration::from_millis(200);

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Boot a server on an ephemeral port.
async fn boot_server() -> ServerHandle {
    let mut config = AppConfig::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.server.shutdown_timeout = 2;
    ServerHandle::start(config).await.unwrap()
}

async fn connect(server: &ServerHandle, caller_id: &str) -> WsStream {
    let url = format!("ws://{}/socket?callerId={}", server.local_addr, caller_id);
    let (ws, _) = timeout(TIMEOUT, connect_async(url))
        .await
        .expect("connect timed out")
        .expect("connect failed");
    ws
}

async fn recv(ws: &mut WsStream) -> Value {
    loop {
        let msg = timeout(TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("websocket error");
        match msg {
            Message::Text(text) => return serde_json::from_str(&text).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {:?}", other),
        }
    }
}

async fn recv_text(ws: &mut WsStream) -> String {
    loop {
        let msg = timeout(TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return text.to_string();
        }
    }
}

async fn assert_quiet(ws: &mut WsStream) {
    if let Ok(Some(Ok(Message::Text(text)))) = timeout(QUIET, ws.next()).await {
        panic!("unexpected frame: {}", text);
    }
}

async fn send(ws: &mut WsStream, frame: Value) {
    ws.send(Message::Text(frame.to_string())).await.unwrap();
}

#[tokio::test]
async fn missing_caller_id_is_rejected_before_upgrade() {
    let server = boot_server().await;

    for url in [
        format!("ws://{}/socket", server.local_addr),
        format!("ws://{}/socket?callerId=", server.local_addr),
    ] {
        match connect_async(url).await {
            Err(tungstenite::Error::Http(response)) => assert_eq!(response.status(), 401),
            other => panic!("expected HTTP 401, got {:?}", other.map(|_| ())),
        }
    }

    assert_eq!(server.router.registry().connection_count(), 0);
    server.shutdown().await;
}

#[tokio::test]
async fn first_frame_is_session_snapshot() {
    let server = boot_server().await;

    let mut a = connect(&server, "A").await;
    assert_eq!(
        recv(&mut a).await,
        json!({ "event": "live-sessions", "data": { "liveSessions": [] } })
    );

    send(&mut a, json!({ "event": "start-live", "data": { "sessionName": "demo" } })).await;
    recv(&mut a).await;

    let mut b = connect(&server, "B").await;
    assert_eq!(
        recv(&mut b).await,
        json!({
            "event": "live-sessions",
            "data": { "liveSessions": [{ "hostId": "A", "sessionName": "demo" }] }
        })
    );

    server.shutdown().await;
}

#[tokio::test]
async fn live_session_walkthrough() {
    let server = boot_server().await;

    let mut a = connect(&server, "A").await;
    let mut b = connect(&server, "B").await;
    recv(&mut a).await;
    recv(&mut b).await;

    // A goes live; everyone hears about it
    send(&mut a, json!({ "event": "start-live", "data": { "sessionName": "demo" } })).await;
    let announced = json!({
        "event": "new-live-session",
        "data": { "hostId": "A", "sessionName": "demo" }
    });
    assert_eq!(recv(&mut a).await, announced);
    assert_eq!(recv(&mut b).await, announced);
    assert_eq!(
        server.router.live_sessions().await,
        vec![LiveSession::new(Identity::from("A"), "demo")]
    );

    // B joins; only A is told
    send(&mut b, json!({ "event": "join-live", "data": { "hostId": "A" } })).await;
    assert_eq!(
        recv(&mut a).await,
        json!({ "event": "incoming-viewer", "data": { "viewerId": "B" } })
    );

    // Offer / answer / candidate exchange, payloads untouched
    send(
        &mut a,
        json!({ "event": "offer", "data": { "to": "B", "offer": { "type": "offer", "sdp": "v=0" } } }),
    )
    .await;
    assert_eq!(
        recv(&mut b).await,
        json!({ "event": "offer", "data": { "from": "A", "offer": { "type": "offer", "sdp": "v=0" } } })
    );

    send(
        &mut b,
        json!({ "event": "answer", "data": { "to": "A", "answer": { "type": "answer", "sdp": "v=0" } } }),
    )
    .await;
    assert_eq!(
        recv(&mut a).await,
        json!({ "event": "answer", "data": { "from": "B", "answer": { "type": "answer", "sdp": "v=0" } } })
    );

    b.send(Message::Text(
        r#"{"event":"ice-candidate","data":{"to":"A","candidate":{"candidate":"candidate:0 1 UDP 2122252543 192.0.2.1 54321 typ host",  "sdpMLineIndex":0}}}"#.to_string(),
    ))
    .await
    .unwrap();
    assert_eq!(
        recv_text(&mut a).await,
        r#"{"event":"ice-candidate","data":{"from":"B","candidate":{"candidate":"candidate:0 1 UDP 2122252543 192.0.2.1 54321 typ host",  "sdpMLineIndex":0}}}"#
    );
    assert_quiet(&mut b).await;

    // A leaves; the session is gone and B is told once
    a.close(None).await.unwrap();
    assert_eq!(
        recv(&mut b).await,
        json!({ "event": "live-session-ended", "data": { "hostId": "A" } })
    );
    assert!(server.router.live_sessions().await.is_empty());
    assert_quiet(&mut b).await;

    // A newcomer sees an empty registry
    let mut c = connect(&server, "C").await;
    assert_eq!(
        recv(&mut c).await,
        json!({ "event": "live-sessions", "data": { "liveSessions": [] } })
    );

    server.shutdown().await;
}

#[tokio::test]
async fn malformed_frames_keep_connection_open() {
    let server = boot_server().await;

    let mut a = connect(&server, "A").await;
    recv(&mut a).await;

    send(&mut a, json!({ "event": "start-live" })).await;
    send(&mut a, json!({ "event": "teleport", "data": {} })).await;
    a.send(Message::Text("not json".to_string())).await.unwrap();
    a.send(Message::Binary(vec![1, 2, 3])).await.unwrap();
    assert_quiet(&mut a).await;
    assert!(server.router.live_sessions().await.is_empty());

    // Still usable afterwards
    send(&mut a, json!({ "event": "start-live", "data": { "sessionName": "late" } })).await;
    assert_eq!(recv(&mut a).await["event"], "new-live-session");

    server.shutdown().await;
}

#[tokio::test]
async fn relay_to_offline_identity_is_dropped() {
    let server = boot_server().await;

    let mut a = connect(&server, "A").await;
    let mut b = connect(&server, "B").await;
    recv(&mut a).await;
    recv(&mut b).await;

    send(&mut a, json!({ "event": "offer", "data": { "to": "nobody", "offer": {} } })).await;
    assert_quiet(&mut a).await;
    assert_quiet(&mut b).await;

    server.shutdown().await;
}

#[tokio::test]
async fn shutdown_closes_open_sockets() {
    let server = boot_server().await;

    let mut a = connect(&server, "A").await;
    recv(&mut a).await;
    let router = server.router.clone();

    server.shutdown().await;

    let closed = timeout(TIMEOUT, async {
        loop {
            match a.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "socket was not closed on shutdown");
    assert_eq!(router.registry().connection_count(), 0);
}
