//! HTTP/WebSocket front end with statum state machine for the server lifecycle
//!
//! ```text
//! Binding ──► Serving ──► (shutdown)
//! ```
//!
//! `/` and `/dashboard` serve the browser pages; the same paths upgrade to a
//! WebSocket for the page scripts. One task per socket drains the client's
//! outbound queue and forwards inbound text frames to the router.
//!
//! ```text
//! socket ──► RouterHandle ──► ClientHub ──► outbox ──► socket
//! ```

use crate::config::AppConfig;
use crate::controller::registry::SessionId;
use crate::controller::router::ConnectOutcome;
use crate::controller::router_handle::RouterHandle;
use crate::server::hub::ClientKind;
use crate::server::protocol::ServerMessage;
use axum::body::Bytes;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::http::Uri;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use statum::{machine, state};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const GAMEPAD_PAGE: &str = include_str!("../../static/gamepad.html");
const DASHBOARD_PAGE: &str = include_str!("../../static/dashboard.html");

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("listener missing in serving state")]
    NotBound,

    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
}

/// Transport part of [`AppConfig`]
#[derive(Clone, Debug)]
pub struct TransportSettings {
    pub host: String,
    pub port: u16,
    pub outbound_queue: usize,
    pub ping_interval: Duration,
    pub liveness_timeout: Option<Duration>,
}

impl From<&AppConfig> for TransportSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            outbound_queue: config.outbound_queue.max(1),
            ping_interval: config.ping_interval(),
            liveness_timeout: config.liveness_timeout(),
        }
    }
}

/// Shared by every request handler
#[derive(Clone)]
struct ConnectionContext {
    router: RouterHandle,
    settings: TransportSettings,
    shutdown: CancellationToken,
}

#[state]
#[derive(Debug, Clone)]
pub enum ServerState {
    Binding,
    Serving,
}

#[machine]
pub struct WebSocketServer<S: ServerState> {
    settings: TransportSettings,
    router: RouterHandle,
    listener: Option<TcpListener>,
    shutdown: CancellationToken,
}

impl WebSocketServer<Binding> {
    pub fn create(
        settings: TransportSettings,
        router: RouterHandle,
        shutdown: CancellationToken,
    ) -> Self {
        debug!("Creating websocket server with {:?}", settings);
        Self::new(settings, router, None, shutdown)
    }

    pub async fn bind(mut self) -> Result<WebSocketServer<Serving>, ServerError> {
        let addr = format!("{}:{}", self.settings.host, self.settings.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        info!("Listening on http://{}", listener.local_addr()?);

        self.listener = Some(listener);
        Ok(self.transition())
    }
}

impl WebSocketServer<Serving> {
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        let listener = self.listener.as_ref().ok_or(ServerError::NotBound)?;
        Ok(listener.local_addr()?)
    }

    /// Serves pages and sockets until the shutdown token fires
    pub async fn run_until_shutdown(mut self) -> Result<(), ServerError> {
        let listener = self.listener.take().ok_or(ServerError::NotBound)?;
        let context = ConnectionContext {
            router: self.router.clone(),
            settings: self.settings.clone(),
            shutdown: self.shutdown.clone(),
        };
        let app = Router::new()
            .route("/", get(entry))
            .route("/dashboard", get(entry))
            .with_state(context);

        let shutdown = self.shutdown.clone();
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            info!("Shutdown requested, no longer accepting connections");
        })
        .await?;
        Ok(())
    }
}

/// Page for a plain browser request, socket for an upgrade request
async fn entry(
    State(context): State<ConnectionContext>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    uri: Uri,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let kind = ClientKind::from_path(uri.path());
    match upgrade {
        Ok(upgrade) => upgrade
            .on_upgrade(move |socket| handle_socket(socket, peer, kind, context))
            .into_response(),
        Err(_) => {
            debug!("Serving {:?} page to {}", kind, peer);
            match kind {
                ClientKind::Player => Html(GAMEPAD_PAGE).into_response(),
                ClientKind::Dashboard => Html(DASHBOARD_PAGE).into_response(),
            }
        }
    }
}

async fn handle_socket(
    socket: WebSocket,
    peer: SocketAddr,
    kind: ClientKind,
    context: ConnectionContext,
) {
    let ConnectionContext {
        router,
        settings,
        shutdown,
    } = context;
    let session = router.next_session();
    let (mut ws_sink, mut ws_stream) = socket.split();
    let (outbox, mut outbox_rx) = mpsc::channel::<ServerMessage>(settings.outbound_queue);

    match router.connect(session, kind, outbox).await {
        Ok(ConnectOutcome::Player(slot)) => {
            info!("{} joined from {} as player {}", session, peer, slot)
        }
        Ok(ConnectOutcome::Dashboard) => info!("{} joined from {} as dashboard", session, peer),
        Err(e) => {
            let frame = CloseFrame {
                code: close_code::POLICY,
                reason: e.to_string().into(),
            };
            let _ = ws_sink.send(Message::Close(Some(frame))).await;
            return;
        }
    }

    let mut ping = tokio::time::interval(settings.ping_interval);
    // first tick completes immediately
    ping.tick().await;
    let mut liveness = Liveness::new(settings.liveness_timeout);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                let _ = ws_sink.send(Message::Close(None)).await;
                break;
            }

            outbound = outbox_rx.recv() => {
                let Some(message) = outbound else { break };
                match message.to_json() {
                    Ok(text) => {
                        if ws_sink.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => error!("Failed to encode {}: {}", message.kind(), e),
                }
            }

            inbound = ws_stream.next() => {
                match inbound {
                    Some(Ok(frame)) => {
                        liveness.heard();
                        match frame {
                            Message::Text(text) => router.dispatch_text(session, text.as_str()).await,
                            Message::Close(_) => break,
                            // pings are answered by the socket itself
                            _ => {}
                        }
                    }
                    Some(Err(e)) => {
                        warn!("{} socket error: {}", session, e);
                        break;
                    }
                    None => break,
                }
            }

            _ = ping.tick() => {
                if liveness.expired() {
                    warn!("{} silent for {:?}, dropping", session, liveness.silence());
                    break;
                }
                if ws_sink.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
                liveness.pinged();
            }
        }
    }

    disconnect(&router, session).await;
}

/// Silence tracking for one socket.
///
/// A client expires only after it left at least one ping unanswered and
/// nothing arrived for the whole timeout.
#[derive(Debug)]
struct Liveness {
    timeout: Option<Duration>,
    last_seen: Instant,
    last_ping: Option<Instant>,
}

impl Liveness {
    fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            last_seen: Instant::now(),
            last_ping: None,
        }
    }

    fn heard(&mut self) {
        self.last_seen = Instant::now();
    }

    fn pinged(&mut self) {
        self.last_ping = Some(Instant::now());
    }

    fn silence(&self) -> Duration {
        self.last_seen.elapsed()
    }

    fn expired(&self) -> bool {
        let (Some(timeout), Some(last_ping)) = (self.timeout, self.last_ping) else {
            return false;
        };
        self.last_seen < last_ping && self.silence() >= timeout
    }
}

async fn disconnect(router: &RouterHandle, session: SessionId) {
    match router.disconnect(session).await {
        Some(slot) => debug!("{} released player {}", session, slot),
        None => debug!("{} closed", session),
    }
}
