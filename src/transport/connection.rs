//! Connection manager and event loop.
//!
//! The manager owns the single channel to the server. Once connected it
//! spawns one tokio task that does everything else: it opens the socket,
//! sends the handshake, classifies frames, applies batches and schedules
//! reconnection. All state mutation happens on that task.
//!
//! # Event Loop
//!
//! ```text
//! Connecting ─ok─► Open ── frames ──► classify ──► apply / notify
//!     │                │
//!   error            close/error
//!     ▼                ▼
//!   Closed ◄───────────┘
//!     │
//!     ├─ attempts < max ──► sleep(delay) ──► Connecting
//!     └─ attempts == max ─► Lost (terminal)
//! ```
//!
//! A `Shutdown` command is raced against every await point, so teardown
//! cancels a pending connect, an open session, or a backoff timer.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Instant;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, trace, warn};

use crate::display::{DisplaySynchronizer, LinkStatus, SharedSurface};
use crate::error::{Error, Result};
use crate::protocol::{InboundMessage, PerformanceConfig, parse};

use super::backoff::ReconnectPolicy;
use super::endpoint::Endpoint;
use super::events::{ControllerEvent, EventSink};
use super::state::{ConnectionState, LinkState};

// ============================================================================
// Types
// ============================================================================

/// Client-side WebSocket stream.
type ChannelStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Link state shared between the manager and its event loop.
type SharedLink = Arc<Mutex<LinkState>>;

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
#[derive(Debug)]
enum ConnectionCommand {
    /// Close the channel and stop for good.
    Shutdown,
}

/// How a session ended.
#[derive(Debug)]
enum Interrupt {
    /// Channel went away; reconnection may follow.
    Closed(Error),
    /// Teardown requested.
    Shutdown,
}

// ============================================================================
// ConnectionManager
// ============================================================================

/// Owner of the channel lifecycle.
///
/// Created in `Disconnected`. [`connect`](Self::connect) starts the event
/// loop once; [`teardown`](Self::teardown) stops it for good.
pub struct ConnectionManager {
    /// Guarded state shared with the event loop.
    link: SharedLink,
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// Loop body, present until the first successful `connect`.
    pending: Mutex<Option<(EventLoop, mpsc::UnboundedReceiver<ConnectionCommand>)>>,
    /// Spawned event loop task.
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionManager {
    /// Creates a manager in `Disconnected`.
    #[must_use]
    pub fn new(
        endpoint: Endpoint,
        policy: ReconnectPolicy,
        send_handshake: bool,
        sync: DisplaySynchronizer,
        surface: SharedSurface,
        events: EventSink,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let link: SharedLink = Arc::new(Mutex::new(LinkState::new()));

        let event_loop = EventLoop {
            endpoint,
            policy,
            send_handshake,
            link: Arc::clone(&link),
            sync,
            surface,
            events,
        };

        Self {
            link,
            command_tx,
            pending: Mutex::new(Some((event_loop, command_rx))),
            task: Mutex::new(None),
        }
    }

    /// Starts connecting.
    ///
    /// A no-op returning `false` unless the manager is still
    /// `Disconnected`: calls while connecting, open, reconnecting or after
    /// teardown do nothing. Must be called within a tokio runtime.
    pub fn connect(&self) -> bool {
        let mut link = self.link.lock();

        if link.state() != ConnectionState::Disconnected {
            debug!(state = ?link.state(), "connect() ignored");
            return false;
        }

        if let Err(e) = link.transition(ConnectionState::Connecting) {
            debug!(error = %e, "connect() rejected");
            return false;
        }

        let Some((event_loop, command_rx)) = self.pending.lock().take() else {
            return false;
        };
        drop(link);

        info!(endpoint = %event_loop.endpoint, "Connecting");
        *self.task.lock() = Some(tokio::spawn(event_loop.run(command_rx)));
        true
    }

    /// Closes the channel and cancels any pending reconnection.
    ///
    /// Returns `false` if the manager was already torn down.
    pub fn teardown(&self) -> bool {
        if !self.link.lock().tear_down() {
            return false;
        }

        // Never started: drop the loop body so nothing can run it.
        self.pending.lock().take();

        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
        info!("Connection torn down");
        true
    }

    /// Waits for the event loop task to finish.
    ///
    /// Returns immediately if the loop was never started.
    pub async fn join(&self) {
        let task = self.task.lock().take();
        if let Some(task) = task
            && let Err(e) = task.await
        {
            error!(error = %e, "Event loop task failed");
        }
    }

    /// Returns the current connection state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.link.lock().state()
    }

    /// Returns a snapshot of the link state.
    #[inline]
    #[must_use]
    pub fn link(&self) -> LinkState {
        *self.link.lock()
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("link", &*self.link.lock())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// EventLoop
// ============================================================================

/// Opens the channel to `endpoint`.
///
/// # Errors
///
/// Returns [`Error::Connection`] if the TCP connect or the upgrade fails.
async fn open_channel(endpoint: &Endpoint) -> Result<ChannelStream> {
    let (stream, _response) = connect_async(endpoint.as_str())
        .await
        .map_err(|e| Error::connection(format!("{endpoint}: {e}")))?;
    Ok(stream)
}

/// Everything the event loop task owns.
struct EventLoop {
    endpoint: Endpoint,
    policy: ReconnectPolicy,
    send_handshake: bool,
    link: SharedLink,
    sync: DisplaySynchronizer,
    surface: SharedSurface,
    events: EventSink,
}

impl EventLoop {
    /// Runs connect / session / backoff rounds until shutdown or exhaustion.
    ///
    /// Entered in `Connecting`.
    async fn run(mut self, mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>) {
        loop {
            let connected = tokio::select! {
                result = open_channel(&self.endpoint) => result,
                _ = command_rx.recv() => break,
            };

            match connected {
                Ok(stream) => {
                    if !self.on_open() {
                        break;
                    }

                    match self.run_session(stream, &mut command_rx).await {
                        Interrupt::Shutdown => break,
                        Interrupt::Closed(reason) => {
                            debug!(
                                reason = %reason,
                                recoverable = reason.is_recoverable(),
                                "Session ended"
                            );
                        }
                    }
                }

                Err(e) => {
                    warn!(
                        error = %e,
                        recoverable = e.is_recoverable(),
                        "Channel could not be opened"
                    );
                }
            }

            if !self.on_close() {
                break;
            }

            let next = self.link.lock().reserve_attempt(&self.policy);
            let Some((attempt, delay)) = next else {
                self.on_exhausted();
                break;
            };

            warn!(
                attempt,
                max_attempts = self.policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                "Reconnection scheduled"
            );
            self.events
                .emit(ControllerEvent::ReconnectScheduled { attempt, delay });

            tokio::select! {
                () = sleep(delay) => {}
                _ = command_rx.recv() => break,
            }

            if let Err(e) = self.link.lock().transition(ConnectionState::Connecting) {
                debug!(error = %e, "Reconnection abandoned");
                break;
            }

            debug!(attempt, "Reconnecting");
        }

        debug!("Event loop terminated");
    }

    /// Reads frames until the channel ends or shutdown is requested.
    async fn run_session(
        &mut self,
        stream: ChannelStream,
        command_rx: &mut mpsc::UnboundedReceiver<ConnectionCommand>,
    ) -> Interrupt {
        let (mut ws_write, mut ws_read) = stream.split();

        if self.send_handshake {
            match PerformanceConfig::now().to_json() {
                Ok(json) => {
                    if let Err(e) = ws_write.send(Message::Text(json.into())).await {
                        let err = Error::from(e);
                        warn!(error = %err, "Failed to send handshake");
                        return Interrupt::Closed(err);
                    }
                    trace!("Handshake sent");
                }
                Err(e) => warn!(error = %e, "Failed to encode handshake"),
            }
        }

        loop {
            tokio::select! {
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_frame(&text, Instant::now());
                        }

                        Some(Ok(Message::Binary(bytes))) => {
                            let received_at = Instant::now();
                            match std::str::from_utf8(&bytes) {
                                Ok(text) => self.handle_frame(text, received_at),
                                Err(e) => warn!(error = %e, len = bytes.len(), "Dropping non-UTF-8 binary frame"),
                            }
                        }

                        Some(Ok(Message::Close(frame))) => {
                            debug!(?frame, "Channel closed by server");
                            return Interrupt::Closed(Error::ConnectionClosed);
                        }

                        Some(Err(e)) => {
                            let err = Error::from(e);
                            warn!(error = %err, "Channel error");
                            return Interrupt::Closed(err);
                        }

                        None => {
                            debug!("Channel stream ended");
                            return Interrupt::Closed(Error::ConnectionClosed);
                        }

                        // Ping/Pong are answered by tungstenite
                        _ => {}
                    }
                }

                _ = command_rx.recv() => {
                    debug!("Shutdown command received");
                    let _ = ws_write.close().await;
                    return Interrupt::Shutdown;
                }
            }
        }
    }

    /// Classifies one frame and applies its effect.
    fn handle_frame(&mut self, raw: &str, received_at: Instant) {
        if self.link.lock().is_torn_down() {
            trace!("Frame ignored after teardown");
            return;
        }

        let message = match parse(raw) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Dropping malformed frame");
                return;
            }
        };

        match message {
            InboundMessage::BatchDisplayUpdate(batch) => {
                // Held across the batch so teardown cannot interleave with it.
                let link = self.link.lock();
                if link.is_torn_down() {
                    return;
                }
                self.sync.apply_batch(&batch, received_at);
                drop(link);
            }

            InboundMessage::ProcessingResult { message } => {
                info!(%message, "Processing result");
                self.events.emit(ControllerEvent::Notification { message });
            }

            InboundMessage::ServerError { message } => {
                warn!(%message, "Server reported an error");
                self.events.emit(ControllerEvent::ServerError { message });
            }

            InboundMessage::ConnectionEstablished {
                client_type,
                message,
            } => {
                debug!(%client_type, %message, "Server confirmed connection");
            }

            InboundMessage::PerformanceMode { enabled } => {
                debug!(enabled, "Server performance mode");
            }

            InboundMessage::PerformanceAck { status } => {
                debug!(%status, "Handshake acknowledged");
            }

            InboundMessage::Rejected { kind, reason } => {
                warn!(%kind, %reason, "Rejected message payload");
            }

            InboundMessage::Unknown { kind, .. } => {
                warn!(?kind, "Ignoring unknown message type");
            }
        }
    }

    /// Enters `Open`. Returns `false` if the link refused.
    fn on_open(&mut self) -> bool {
        if let Err(e) = self.link.lock().open() {
            debug!(error = %e, "Open rejected");
            return false;
        }

        info!(endpoint = %self.endpoint, "Channel open");
        self.surface.lock().show_link_status(LinkStatus::Connected);
        self.events.emit(ControllerEvent::Connected);
        true
    }

    /// Enters `Closed`. Returns `false` if the link refused.
    fn on_close(&mut self) -> bool {
        if let Err(e) = self.link.lock().transition(ConnectionState::Closed) {
            debug!(error = %e, "Close rejected");
            return false;
        }

        info!("Channel closed");
        self.surface.lock().show_link_status(LinkStatus::Disconnected);
        self.events.emit(ControllerEvent::Disconnected);
        true
    }

    /// Surfaces the terminal failure.
    fn on_exhausted(&mut self) {
        let link = *self.link.lock();
        if link.is_torn_down() {
            return;
        }

        error!(
            attempts = link.attempts(),
            "Reconnection exhausted, giving up"
        );
        self.surface.lock().show_link_status(LinkStatus::Lost);
        self.events.emit(ControllerEvent::ReconnectExhausted {
            attempts: link.attempts(),
        });
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::RwLock;

    use crate::display::{
        ButtonCatalog, ButtonDescriptor, DisplaySynchronizer, ElementRegistry, HeadlessSurface,
    };

    fn manager() -> ConnectionManager {
        let catalog = ButtonCatalog::new(vec![ButtonDescriptor::new("btn_a", "/a.png")]);
        let registry = Arc::new(RwLock::new(ElementRegistry::build(&catalog)));
        let surface: SharedSurface = Arc::new(Mutex::new(HeadlessSurface::new()));
        let sync = DisplaySynchronizer::new(registry, Arc::clone(&surface));

        ConnectionManager::new(
            Endpoint::parse("ws://127.0.0.1:9/ws/hid/").expect("endpoint"),
            ReconnectPolicy::default(),
            true,
            sync,
            surface,
            EventSink::new(),
        )
    }

    #[test]
    fn test_starts_disconnected() {
        let manager = manager();
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert_eq!(manager.link().attempts(), 0);
    }

    #[test]
    fn test_teardown_before_connect() {
        let manager = manager();

        assert!(manager.teardown());
        assert!(!manager.teardown());
        assert!(!manager.connect());
        assert!(manager.link().is_torn_down());
    }

    #[tokio::test]
    async fn test_open_channel_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);

        let endpoint =
            Endpoint::parse(&format!("ws://127.0.0.1:{port}/ws/hid/")).expect("endpoint");
        let err = open_channel(&endpoint).await.unwrap_err();

        assert!(matches!(err, Error::Connection { .. }));
        assert!(err.is_connection_error());
        assert!(err.is_recoverable());
        assert!(err.to_string().contains(&port.to_string()));
    }

    #[test]
    fn test_channel_errors_are_recoverable() {
        use tokio_tungstenite::tungstenite::Error as WsError;

        let err = Error::from(WsError::AlreadyClosed);
        assert!(err.is_connection_error());
        assert!(err.is_recoverable());
        assert!(Error::ConnectionClosed.is_recoverable());
    }

    #[tokio::test]
    async fn test_connect_is_idempotent() {
        let manager = manager();

        assert!(manager.connect());
        assert!(!manager.connect());

        assert!(manager.teardown());
        manager.join().await;
        assert!(!manager.connect());
    }
}
