//! End-to-end controller tests against a local WebSocket server.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tokio_test::assert_ok;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use button_overlay::{
    ButtonDescriptor, ConnectionState, Controller, ControllerEvent, HeadlessSurface, LinkStatus,
    ReconnectPolicy,
};

// ============================================================================
// Helpers
// ============================================================================

type Recorded = Arc<Mutex<Vec<ControllerEvent>>>;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn catalog() -> Vec<ButtonDescriptor> {
    vec![
        ButtonDescriptor::new("btn_a", "/a.png"),
        ButtonDescriptor::new("btn_b", "/b.png"),
        ButtonDescriptor::new("lever_0", "/l0.png"),
    ]
}

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    (listener, format!("ws://127.0.0.1:{port}/ws/hid/"))
}

async fn accept(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = timeout(Duration::from_secs(5), listener.accept())
        .await
        .expect("client connects")
        .expect("accept");
    accept_async(stream).await.expect("upgrade")
}

async fn next_json(ws: &mut WebSocketStream<TcpStream>) -> Value {
    let message = timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("frame arrives")
        .expect("stream open")
        .expect("frame ok");
    let text = message.into_text().expect("text frame");
    serde_json::from_str(&text).expect("json frame")
}

async fn send(ws: &mut WebSocketStream<TcpStream>, text: &str) {
    ws.send(Message::Text(text.to_string().into()))
        .await
        .expect("send");
}

/// Keeps the server side open until the client goes away.
async fn drain(mut ws: WebSocketStream<TcpStream>) {
    while let Some(Ok(message)) = ws.next().await {
        if message.is_close() {
            break;
        }
    }
}

async fn eventually(what: &str, condition: impl Fn() -> bool) {
    let waited = timeout(Duration::from_secs(5), async {
        while !condition() {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "timed out waiting for {what}");
}

/// Collects the messages of every WARN event.
#[derive(Clone, Default)]
struct WarningLog {
    messages: Arc<Mutex<Vec<String>>>,
}

impl WarningLog {
    fn count(&self, message: &str) -> usize {
        self.messages.lock().iter().filter(|m| *m == message).count()
    }
}

struct MessageField(Option<String>);

impl Visit for MessageField {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = Some(format!("{value:?}"));
        }
    }
}

impl<S: Subscriber> Layer<S> for WarningLog {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::WARN {
            return;
        }

        let mut field = MessageField(None);
        event.record(&mut field);
        if let Some(message) = field.0 {
            self.messages.lock().push(message);
        }
    }
}

fn recorder() -> (Recorded, impl Fn(ControllerEvent) + Send + Sync + 'static) {
    let events: Recorded = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    (events, move |event| sink.lock().push(event))
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_handshake_and_batch_applied() {
    init_logging();
    let (listener, url) = bind().await;
    let (events, handler) = recorder();

    let controller = assert_ok!(
        Controller::builder()
            .catalog(vec![ButtonDescriptor::new("btn_a", "/a.png")])
            .endpoint(url)
            .on_event(handler)
            .build()
    );
    assert!(controller.start());

    let mut ws = accept(&listener).await;

    let handshake = next_json(&mut ws).await;
    assert_eq!(handshake["type"], "performance_config");
    assert_eq!(handshake["high_priority"], true);
    assert!(handshake["timestamp"].as_u64().is_some());

    send(
        &mut ws,
        r#"{"type":"batch_display_update","events":[{"key":"btn_a","visible":true}],"total_events":1}"#,
    )
    .await;

    eventually("btn_a visible", || controller.is_visible("btn_a")).await;

    let element = controller.element("btn_a").expect("btn_a");
    assert!(element.has_class("visible"));
    assert!(!element.has_class("hidden"));
    assert!(controller.is_connected());
    assert_eq!(events.lock().first(), Some(&ControllerEvent::Connected));

    let server = tokio::spawn(drain(ws));
    controller.shutdown().await;
    assert_ok!(assert_ok!(timeout(Duration::from_secs(5), server).await));
}

#[tokio::test]
async fn test_malformed_frames_keep_connection() {
    // Current-thread runtime: the event loop task logs on this thread.
    let warnings = WarningLog::default();
    let _subscriber =
        tracing::subscriber::set_default(tracing_subscriber::registry().with(warnings.clone()));

    let (listener, url) = bind().await;
    let surface = Arc::new(Mutex::new(HeadlessSurface::new()));

    let controller = Controller::builder()
        .catalog(catalog())
        .endpoint(url)
        .shared_surface(surface.clone())
        .build()
        .expect("build");
    controller.start();

    let mut ws = accept(&listener).await;
    let _handshake = next_json(&mut ws).await;

    send(&mut ws, r#"{"type":"batch_display_update","events":"not-an-array"}"#).await;
    send(&mut ws, "{definitely not json").await;
    send(&mut ws, r#"{"type":"mystery","events":[{"key":"btn_a","visible":true}]}"#).await;
    send(
        &mut ws,
        r#"{"type":"batch_display_update","events":[{"key":"ghost","visible":true},{"key":"btn_b","visible":true}]}"#,
    )
    .await;

    eventually("batch committed", || surface.lock().commits() == 1).await;

    assert!(controller.is_visible("btn_b"));
    assert!(!controller.is_visible("btn_a"));
    assert!(!controller.is_visible("lever_0"));
    assert!(controller.is_connected());
    {
        let surface = surface.lock();
        assert_eq!(surface.commits(), 1);
        assert!(surface.stage_revealed());
        assert_eq!(surface.link_status(), LinkStatus::Connected);
    }

    assert_eq!(warnings.count("Rejected message payload"), 1);
    assert_eq!(warnings.count("Dropping malformed frame"), 1);
    assert_eq!(warnings.count("Ignoring unknown message type"), 1);

    let server = tokio::spawn(drain(ws));
    controller.shutdown().await;
    let _ = timeout(Duration::from_secs(5), server).await;
}

#[tokio::test]
async fn test_last_write_wins_within_batch() {
    init_logging();
    let (listener, url) = bind().await;
    let surface = Arc::new(Mutex::new(HeadlessSurface::new()));

    let controller = Controller::builder()
        .catalog(catalog())
        .endpoint(url)
        .handshake(false)
        .shared_surface(surface.clone())
        .build()
        .expect("build");
    controller.start();

    let mut ws = accept(&listener).await;
    send(
        &mut ws,
        r#"{"type":"batch_display_update","events":[
            {"key":"btn_a","visible":true},
            {"key":"lever_0","visible":true},
            {"key":"btn_a","visible":false}
        ]}"#,
    )
    .await;

    eventually("batch committed", || surface.lock().commits() == 1).await;

    assert!(!controller.is_visible("btn_a"));
    assert!(controller.is_visible("lever_0"));
    assert_eq!(surface.lock().visible(), ["lever_0"]);

    let server = tokio::spawn(drain(ws));
    controller.shutdown().await;
    let _ = timeout(Duration::from_secs(5), server).await;
}

#[tokio::test]
async fn test_notifications_reach_observer() {
    init_logging();
    let (listener, url) = bind().await;
    let (events, handler) = recorder();

    let controller = Controller::builder()
        .catalog(catalog())
        .endpoint(url)
        .on_event(handler)
        .build()
        .expect("build");
    controller.start();

    let mut ws = accept(&listener).await;
    let _handshake = next_json(&mut ws).await;

    send(&mut ws, r#"{"type":"connection_established","client_type":"web_client","message":"hi"}"#).await;
    send(&mut ws, r#"{"type":"processing_result","message":"done","display_events_count":2}"#).await;
    send(&mut ws, r#"{"type":"error","message":"bad input"}"#).await;

    eventually("server error event", || {
        events
            .lock()
            .iter()
            .any(|e| matches!(e, ControllerEvent::ServerError { .. }))
    })
    .await;

    assert_eq!(
        *events.lock(),
        vec![
            ControllerEvent::Connected,
            ControllerEvent::Notification {
                message: "done".into()
            },
            ControllerEvent::ServerError {
                message: "bad input".into()
            },
        ]
    );

    let server = tokio::spawn(drain(ws));
    controller.shutdown().await;
    let _ = timeout(Duration::from_secs(5), server).await;
}

#[tokio::test]
async fn test_connected_reported_without_handshake() {
    init_logging();
    let (listener, url) = bind().await;
    let (events, handler) = recorder();

    let controller = Controller::builder()
        .catalog(catalog())
        .endpoint(url)
        .handshake(false)
        .on_event(handler)
        .build()
        .expect("build");
    controller.start();

    let mut ws = accept(&listener).await;

    eventually("connected event", || {
        events.lock().first() == Some(&ControllerEvent::Connected)
    })
    .await;
    assert!(
        timeout(Duration::from_millis(100), ws.next()).await.is_err(),
        "no handshake frame expected"
    );

    let server = tokio::spawn(drain(ws));
    controller.shutdown().await;
    let _ = timeout(Duration::from_secs(5), server).await;
}

#[tokio::test]
async fn test_reconnects_after_server_close() {
    init_logging();
    let (listener, url) = bind().await;

    let controller = Controller::builder()
        .catalog(catalog())
        .endpoint(url)
        .reconnect(ReconnectPolicy::new(
            Duration::from_millis(10),
            Duration::from_millis(100),
            5,
        ))
        .build()
        .expect("build");
    controller.start();

    let mut first = accept(&listener).await;
    let _handshake = next_json(&mut first).await;
    first.close(None).await.expect("close");
    drop(first);

    let mut second = accept(&listener).await;
    let handshake = next_json(&mut second).await;
    assert_eq!(handshake["type"], "performance_config");

    eventually("reopened", || controller.is_connected()).await;
    assert_eq!(controller.link().attempts(), 0);

    send(
        &mut second,
        r#"{"type":"batch_display_update","events":[{"key":"btn_b","visible":true}]}"#,
    )
    .await;
    eventually("btn_b visible", || controller.is_visible("btn_b")).await;

    let server = tokio::spawn(drain(second));
    controller.shutdown().await;
    let _ = timeout(Duration::from_secs(5), server).await;
}

#[tokio::test]
async fn test_reconnection_exhausts_after_max_attempts() {
    init_logging();
    let (listener, url) = bind().await;
    drop(listener);

    let (events, handler) = recorder();
    let surface = Arc::new(Mutex::new(HeadlessSurface::new()));

    let controller = Controller::builder()
        .catalog(catalog())
        .endpoint(url)
        .reconnect(ReconnectPolicy::new(
            Duration::from_millis(5),
            Duration::from_millis(12),
            3,
        ))
        .shared_surface(surface.clone())
        .on_event(handler)
        .build()
        .expect("build");
    controller.start();

    eventually("exhaustion", || {
        events
            .lock()
            .iter()
            .any(|e| matches!(e, ControllerEvent::ReconnectExhausted { .. }))
    })
    .await;

    // Nothing else is scheduled afterwards.
    sleep(Duration::from_millis(100)).await;

    let recorded = events.lock().clone();
    let scheduled: Vec<(u32, u64)> = recorded
        .iter()
        .filter_map(|e| match e {
            ControllerEvent::ReconnectScheduled { attempt, delay } => {
                Some((*attempt, delay.as_millis() as u64))
            }
            _ => None,
        })
        .collect();

    assert_eq!(scheduled, vec![(1, 5), (2, 10), (3, 12)]);
    assert_eq!(
        recorded.last(),
        Some(&ControllerEvent::ReconnectExhausted { attempts: 3 })
    );
    assert_eq!(
        recorded
            .iter()
            .filter(|e| **e == ControllerEvent::Disconnected)
            .count(),
        4
    );
    assert!(!recorded.contains(&ControllerEvent::Connected));

    assert_eq!(controller.state(), ConnectionState::Closed);
    assert!(controller.link().is_exhausted());
    assert_eq!(surface.lock().link_status(), LinkStatus::Lost);
    assert!(!controller.start());

    controller.shutdown().await;
}

#[tokio::test]
async fn test_teardown_is_idempotent() {
    init_logging();
    let (listener, url) = bind().await;
    let (events, handler) = recorder();
    let surface = Arc::new(Mutex::new(HeadlessSurface::new()));

    let controller = Controller::builder()
        .catalog(catalog())
        .endpoint(url)
        .shared_surface(surface.clone())
        .on_event(handler)
        .build()
        .expect("build");
    controller.start();

    let mut ws = accept(&listener).await;
    let _handshake = next_json(&mut ws).await;
    eventually("open", || controller.is_connected()).await;

    assert!(controller.stop());
    assert!(!controller.stop());

    // The server sees exactly one close.
    let (closed_tx, mut closed_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(message) = ws.next().await {
            match message {
                Ok(m) if m.is_close() => {
                    let _ = closed_tx.send(());
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
    });
    assert!(timeout(Duration::from_secs(5), closed_rx.recv()).await.is_ok());

    controller.shutdown().await;
    assert!(closed_rx.try_recv().is_err());

    assert_eq!(controller.element_count(), 0);
    assert!(surface.lock().mounted().is_empty());
    assert!(!controller.start());
    assert_eq!(*events.lock(), vec![ControllerEvent::Connected]);
}
