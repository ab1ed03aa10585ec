//! Push channel against in-process Socket.IO stubs.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use humble_heroes::push::{PushChannel, PushConfig, PushEvent, PushEvents, TransportKind};

const OPEN: &str =
    r#"0{"sid":"eio-stub","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;
const HERO: &str =
    r#"42["newSuperhero",{"id":3,"name":"Quiet Quill","superpower":"Editing","humilityScore":9.3}]"#;

#[derive(Clone, Default)]
struct Stub {
    /// Every frame the client sent, in order
    received: Arc<Mutex<Vec<String>>>,
    connections: Arc<AtomicUsize>,
    /// Drop the first connection right after the namespace connect
    drop_first: bool,
    /// Leave the namespace from the server side after the first event
    kick: bool,
    namespace_requested: Arc<AtomicBool>,
    delivered: Arc<AtomicBool>,
}

impl Stub {
    fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn ws_handler(ws: WebSocketUpgrade, State(stub): State<Stub>) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, stub))
}

async fn serve_socket(mut socket: WebSocket, stub: Stub) {
    let connection = stub.connections.fetch_add(1, Ordering::SeqCst);
    if socket.send(Message::Text(OPEN.to_string())).await.is_err() {
        return;
    }

    while let Some(Ok(message)) = socket.recv().await {
        let Message::Text(text) = message else {
            continue;
        };
        stub.received.lock().unwrap().push(text.clone());

        if text == "40" {
            let sid = format!(r#"40{{"sid":"sock-{}"}}"#, connection);
            let _ = socket.send(Message::Text(sid)).await;
            if stub.drop_first && connection == 0 {
                return;
            }
            let _ = socket.send(Message::Text("2".to_string())).await;
            let _ = socket.send(Message::Text(HERO.to_string())).await;
            if stub.kick {
                let _ = socket.send(Message::Text("41".to_string())).await;
            }
        }
    }
}

/// Long-polling only; WebSocket upgrades get a plain 200 and fail.
async fn polling_get(
    Query(params): Query<HashMap<String, String>>,
    State(stub): State<Stub>,
) -> impl IntoResponse {
    if !params.contains_key("sid") {
        stub.connections.fetch_add(1, Ordering::SeqCst);
        return OPEN.to_string();
    }

    if stub.namespace_requested.load(Ordering::SeqCst) && !stub.delivered.swap(true, Ordering::SeqCst) {
        return format!("40{{\"sid\":\"poll-sock\"}}\u{1e}{}", HERO);
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    "6".to_string()
}

async fn polling_post(State(stub): State<Stub>, body: String) -> &'static str {
    for frame in body.split('\u{1e}') {
        if frame == "40" {
            stub.namespace_requested.store(true, Ordering::SeqCst);
        }
        stub.received.lock().unwrap().push(frame.to_string());
    }
    "ok"
}

async fn spawn_ws(stub: Stub) -> String {
    let router = Router::new()
        .route("/socket.io/", get(ws_handler))
        .with_state(stub);
    spawn(router).await
}

async fn spawn_polling(stub: Stub) -> String {
    let router = Router::new()
        .route("/socket.io/", get(polling_get).post(polling_post))
        .with_state(stub);
    spawn(router).await
}

fn config(base: &str) -> PushConfig {
    let mut config = PushConfig::new(base);
    config.handshake_timeout = Duration::from_secs(3);
    config
}

async fn next_event(events: &mut PushEvents) -> PushEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for push event")
        .expect("push channel ended")
}

async fn wait_until(mut check: impl FnMut() -> bool) {
    for _ in 0..100 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not met in time");
}

#[tokio::test]
async fn test_websocket_delivers_new_hero() {
    let stub = Stub::default();
    let base = spawn_ws(stub.clone()).await;

    let (channel, mut events) = PushChannel::open(config(&base));

    assert_eq!(
        next_event(&mut events).await,
        PushEvent::Connected {
            sid: "sock-0".to_string()
        }
    );
    match next_event(&mut events).await {
        PushEvent::NewHero(hero) => {
            assert_eq!(hero.name, "Quiet Quill");
            assert_eq!(hero.humility_score, 9.3);
        }
        other => panic!("Expected NewHero, got {:?}", other),
    }

    channel.close().await;
    wait_until(|| stub.received().contains(&"1".to_string())).await;

    assert_eq!(stub.received(), vec!["40", "3", "41", "1"]);
    assert_eq!(stub.connections.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_falls_back_to_polling() {
    let stub = Stub::default();
    let base = spawn_polling(stub.clone()).await;

    let (channel, mut events) = PushChannel::open(config(&base));

    assert!(matches!(next_event(&mut events).await, PushEvent::Connected { .. }));
    match next_event(&mut events).await {
        PushEvent::NewHero(hero) => assert_eq!(hero.name, "Quiet Quill"),
        other => panic!("Expected NewHero, got {:?}", other),
    }

    channel.close().await;
    let received = stub.received();
    assert_eq!(received.first().map(String::as_str), Some("40"));
    assert!(received.ends_with(&["41".to_string(), "1".to_string()]));
}

#[tokio::test]
async fn test_polling_only_when_configured() {
    let stub = Stub::default();
    let base = spawn_polling(stub.clone()).await;

    let (channel, mut events) =
        PushChannel::open(config(&base).transports(vec![TransportKind::Polling]));

    assert!(matches!(next_event(&mut events).await, PushEvent::Connected { .. }));
    channel.close().await;
    assert_eq!(stub.connections.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_reconnects_after_drop() {
    let stub = Stub {
        drop_first: true,
        ..Default::default()
    };
    let base = spawn_ws(stub.clone()).await;

    let (channel, mut events) = PushChannel::open(config(&base));

    assert!(matches!(next_event(&mut events).await, PushEvent::Connected { .. }));
    assert!(matches!(next_event(&mut events).await, PushEvent::Disconnected { .. }));
    assert_eq!(
        next_event(&mut events).await,
        PushEvent::Connected {
            sid: "sock-1".to_string()
        }
    );
    assert!(matches!(next_event(&mut events).await, PushEvent::NewHero(_)));

    channel.close().await;
    assert_eq!(stub.connections.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_server_disconnect_is_final() {
    let stub = Stub {
        kick: true,
        ..Default::default()
    };
    let base = spawn_ws(stub.clone()).await;

    let (channel, mut events) = PushChannel::open(config(&base));

    assert!(matches!(next_event(&mut events).await, PushEvent::Connected { .. }));
    assert!(matches!(next_event(&mut events).await, PushEvent::NewHero(_)));
    assert_eq!(
        next_event(&mut events).await,
        PushEvent::Disconnected {
            reason: "io server disconnect".to_string()
        }
    );

    wait_until(|| channel.is_finished()).await;
    assert_eq!(stub.connections.load(Ordering::SeqCst), 1);

    // Nothing left to send on close
    channel.close().await;
    assert!(!stub.received().contains(&"41".to_string()));
}
