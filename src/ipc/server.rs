//! Unix domain socket server for IPC
//!
//! Provides request-response communication and push notifications of guide
//! events to subscribed clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::OwnedReadHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::events::GuideEvent;
use crate::guide::{GuideInput, HostCapabilities, OpenSignal};

use super::protocol::{GuideStatus, Notification, Request, Response};

/// Largest accepted request body
const MAX_MESSAGE_LEN: usize = 1024 * 1024;

/// Handles the server needs to reach the guide
#[derive(Clone)]
pub struct GuideLink {
    pub input_tx: mpsc::Sender<GuideInput>,
    pub events: broadcast::Sender<GuideEvent>,
    pub open_signal: OpenSignal,
    pub capabilities: HostCapabilities,
}

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: Option<UnixListener>,
    state: Arc<RwLock<ServerState>>,
    link: GuideLink,
    shutdown_tx: broadcast::Sender<()>,
}

/// Shared server state
struct ServerState {
    status: GuideStatus,
    start_time: std::time::Instant,
}

impl Server {
    /// Create a new IPC server
    pub fn new(socket_path: &Path, link: GuideLink) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path)
            .context("failed to bind Unix socket")?;

        // Set socket permissions to owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        let state = Arc::new(RwLock::new(ServerState {
            status: GuideStatus::default(),
            start_time: std::time::Instant::now(),
        }));

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener: Some(listener),
            state,
            link,
            shutdown_tx,
        })
    }

    /// Fold a guide event into the status snapshot
    pub async fn apply_event(&self, event: &GuideEvent) {
        let mut server_state = self.state.write().await;
        let old_state = server_state.status.state;
        server_state.status.apply(event);

        if old_state != server_state.status.state {
            debug!(
                from = %old_state,
                to = %server_state.status.state,
                "IPC server: guide state updated"
            );
        }
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        let listener = self.listener.as_ref()
            .context("server not initialized")?;

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let state = Arc::clone(&self.state);
                    let link = self.link.clone();
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(stream, state, link) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Handle a single client connection
    async fn handle_client(
        stream: UnixStream,
        state: Arc<RwLock<ServerState>>,
        link: GuideLink,
    ) -> Result<()> {
        let (mut reader, mut writer) = stream.into_split();

        // All writes go through one task so responses and notifications never interleave
        let (out_tx, mut out_rx) = mpsc::channel::<Vec<u8>>(64);
        let writer_task = tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                if let Err(e) = writer.write_all(&frame).await {
                    debug!(?e, "client write failed");
                    break;
                }
            }
        });

        let mut forwarder: Option<JoinHandle<()>> = None;
        let result = Self::serve_requests(&mut reader, &out_tx, &mut forwarder, &state, &link).await;

        if let Some(forwarder) = forwarder {
            forwarder.abort();
        }
        drop(out_tx);
        let _ = writer_task.await;

        result
    }

    /// Read and answer requests until the client goes away
    async fn serve_requests(
        reader: &mut OwnedReadHalf,
        out_tx: &mpsc::Sender<Vec<u8>>,
        forwarder: &mut Option<JoinHandle<()>>,
        state: &Arc<RwLock<ServerState>>,
        link: &GuideLink,
    ) -> Result<()> {
        let mut len_buf = [0u8; 4];

        loop {
            // Read message length (4-byte little-endian)
            match reader.read_exact(&mut len_buf).await {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    debug!("client disconnected");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }

            let len = u32::from_le_bytes(len_buf) as usize;
            if len > MAX_MESSAGE_LEN {
                warn!(len, "message too large, disconnecting");
                return Ok(());
            }

            // Read message body
            let mut msg_buf = vec![0u8; len];
            reader.read_exact(&mut msg_buf).await?;

            // Parse request
            let request: Request = match serde_json::from_slice(&msg_buf) {
                Ok(request) => request,
                Err(e) => {
                    warn!(?e, "failed to parse request");
                    let response = Response::Error {
                        code: "bad_request".to_string(),
                        message: e.to_string(),
                    };
                    if out_tx.send(encode_frame(&response)?).await.is_err() {
                        return Ok(());
                    }
                    continue;
                }
            };

            debug!(?request, "received request");

            if matches!(request, Request::Subscribe) && forwarder.is_none() {
                // Subscribe before acknowledging so no event is missed
                let events = link.events.subscribe();
                if out_tx.send(encode_frame(&Response::Subscribed)?).await.is_err() {
                    return Ok(());
                }
                *forwarder = Some(tokio::spawn(forward_events(events, out_tx.clone())));
                debug!("client subscribed to notifications");
                continue;
            }

            let response = Self::process_request(request, state, link).await;
            if out_tx.send(encode_frame(&response)?).await.is_err() {
                return Ok(());
            }
        }
    }

    /// Process a request and return a response
    async fn process_request(
        request: Request,
        state: &Arc<RwLock<ServerState>>,
        link: &GuideLink,
    ) -> Response {
        match request {
            Request::Ping => Response::Pong,

            Request::GetStatus => {
                let mut state = state.write().await;
                state.status.uptime_secs = state.start_time.elapsed().as_secs();
                Response::Status(state.status.clone())
            }

            Request::Subscribe => Response::Subscribed,

            Request::OpenGuide => {
                if link.open_signal.notify() {
                    Response::Ack
                } else {
                    guide_unavailable()
                }
            }

            Request::ReportCapabilities { recognition } => {
                info!(recognition, "host capabilities reported");
                link.capabilities.set_recognition(recognition);
                state.write().await.status.recognition_supported = recognition;
                Response::Ack
            }

            other => match other.into_input() {
                Some(input) => match link.input_tx.send(input).await {
                    Ok(()) => Response::Ack,
                    Err(_) => guide_unavailable(),
                },
                None => Response::Error {
                    code: "unsupported".to_string(),
                    message: "request has no handler".to_string(),
                },
            },
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}

fn guide_unavailable() -> Response {
    Response::Error {
        code: "guide_unavailable".to_string(),
        message: "the guide controller is not running".to_string(),
    }
}

/// Push every guide event to one subscribed client
async fn forward_events(mut events: broadcast::Receiver<GuideEvent>, out_tx: mpsc::Sender<Vec<u8>>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                let frame = match encode_frame(&Notification::Event { event }) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!(?e, "failed to encode notification");
                        continue;
                    }
                };
                if out_tx.send(frame).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(skipped = n, "subscriber lagged, events dropped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Encode a length-prefixed JSON message
fn encode_frame<T: serde::Serialize>(msg: &T) -> Result<Vec<u8>> {
    let msg_bytes = serde_json::to_vec(msg)?;
    let mut frame = Vec::with_capacity(4 + msg_bytes.len());
    frame.extend_from_slice(&(msg_bytes.len() as u32).to_le_bytes());
    frame.extend_from_slice(&msg_bytes);
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    struct TestServer {
        server: Arc<Server>,
        socket_path: PathBuf,
        input_rx: mpsc::Receiver<GuideInput>,
        events: broadcast::Sender<GuideEvent>,
        open_signal: OpenSignal,
        capabilities: HostCapabilities,
    }

    fn start(name: &str) -> TestServer {
        let socket_path = std::env::temp_dir().join(format!(
            "guide-daemon-{}-{}.sock",
            name,
            std::process::id()
        ));
        let (input_tx, input_rx) = mpsc::channel(8);
        let (events, _) = broadcast::channel(16);
        let open_signal = OpenSignal::new();
        let capabilities = HostCapabilities::default();

        let link = GuideLink {
            input_tx,
            events: events.clone(),
            open_signal: open_signal.clone(),
            capabilities: capabilities.clone(),
        };
        let server = Arc::new(Server::new(&socket_path, link).unwrap());
        let runner = Arc::clone(&server);
        tokio::spawn(async move {
            let _ = runner.run().await;
        });

        TestServer {
            server,
            socket_path,
            input_rx,
            events,
            open_signal,
            capabilities,
        }
    }

    async fn send(stream: &mut UnixStream, json: &str) {
        stream
            .write_all(&(json.len() as u32).to_le_bytes())
            .await
            .unwrap();
        stream.write_all(json.as_bytes()).await.unwrap();
    }

    async fn recv(stream: &mut UnixStream) -> Value {
        let mut len_buf = [0u8; 4];
        stream.read_exact(&mut len_buf).await.unwrap();
        let mut body = vec![0u8; u32::from_le_bytes(len_buf) as usize];
        stream.read_exact(&mut body).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_ping_and_status() {
        let test = start("ping");
        let mut stream = UnixStream::connect(&test.socket_path).await.unwrap();

        send(&mut stream, r#"{"type":"ping"}"#).await;
        assert_eq!(recv(&mut stream).await["type"], "pong");

        test.server
            .apply_event(&GuideEvent::Reply {
                text: "hello".to_string(),
            })
            .await;
        send(&mut stream, r#"{"type":"get_status"}"#).await;
        let status = recv(&mut stream).await;
        assert_eq!(status["type"], "status");
        assert_eq!(status["reply"], "hello");
        assert_eq!(status["state"], "closed");

        test.server.shutdown().await;
        assert!(!test.socket_path.exists());
    }

    #[tokio::test]
    async fn test_requests_reach_controller() {
        let mut test = start("forward");
        let mut stream = UnixStream::connect(&test.socket_path).await.unwrap();

        send(
            &mut stream,
            r#"{"type":"recognition_result","finals":["next"],"interim":"sl"}"#,
        )
        .await;
        assert_eq!(recv(&mut stream).await["type"], "ack");

        match test.input_rx.recv().await.unwrap() {
            GuideInput::RecognitionResult(update) => {
                assert_eq!(update.finals, ["next"]);
                assert_eq!(update.interim.as_deref(), Some("sl"));
            }
            other => panic!("unexpected input: {other:?}"),
        }

        send(&mut stream, r#"{"type":"report_capabilities","recognition":true}"#).await;
        assert_eq!(recv(&mut stream).await["type"], "ack");
        assert!(test.capabilities.recognition());

        test.server.shutdown().await;
    }

    #[tokio::test]
    async fn test_open_guide_without_listener() {
        let test = start("open");
        let mut stream = UnixStream::connect(&test.socket_path).await.unwrap();

        send(&mut stream, r#"{"type":"open_guide"}"#).await;
        let response = recv(&mut stream).await;
        assert_eq!(response["type"], "error");
        assert_eq!(response["code"], "guide_unavailable");

        let mut opened = test.open_signal.subscribe();
        send(&mut stream, r#"{"type":"open_guide"}"#).await;
        assert_eq!(recv(&mut stream).await["type"], "ack");
        assert!(opened.try_recv().is_ok());

        test.server.shutdown().await;
    }

    #[tokio::test]
    async fn test_subscriber_receives_events() {
        let test = start("subscribe");
        let mut stream = UnixStream::connect(&test.socket_path).await.unwrap();

        send(&mut stream, r#"{"type":"subscribe"}"#).await;
        assert_eq!(recv(&mut stream).await["type"], "subscribed");

        test.events
            .send(GuideEvent::CallingBackend { active: true })
            .unwrap();
        let notification = recv(&mut stream).await;
        assert_eq!(notification["type"], "event");
        assert_eq!(notification["event"]["type"], "calling_backend");
        assert_eq!(notification["event"]["active"], true);

        test.server.shutdown().await;
    }

    #[tokio::test]
    async fn test_status_tracks_reported_capabilities() {
        let test = start("capabilities");
        let mut stream = UnixStream::connect(&test.socket_path).await.unwrap();

        send(&mut stream, r#"{"type":"get_status"}"#).await;
        assert_eq!(recv(&mut stream).await["recognition_supported"], false);

        send(&mut stream, r#"{"type":"report_capabilities","recognition":true}"#).await;
        assert_eq!(recv(&mut stream).await["type"], "ack");
        send(&mut stream, r#"{"type":"get_status"}"#).await;
        assert_eq!(recv(&mut stream).await["recognition_supported"], true);

        send(&mut stream, r#"{"type":"report_capabilities","recognition":false}"#).await;
        assert_eq!(recv(&mut stream).await["type"], "ack");
        send(&mut stream, r#"{"type":"get_status"}"#).await;
        assert_eq!(recv(&mut stream).await["recognition_supported"], false);
        assert!(!test.capabilities.recognition());

        test.server.shutdown().await;
    }

    #[tokio::test]
    async fn test_disconnect_stops_event_forwarding() {
        let test = start("forwarder");
        let mut stream = UnixStream::connect(&test.socket_path).await.unwrap();

        send(&mut stream, r#"{"type":"subscribe"}"#).await;
        assert_eq!(recv(&mut stream).await["type"], "subscribed");
        assert_eq!(test.events.receiver_count(), 1);

        // An oversized frame ends the connection from the server side
        stream.write_all(&u32::MAX.to_le_bytes()).await.unwrap();
        let mut rest = Vec::new();
        stream.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());

        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while test.events.receiver_count() > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("forwarder still subscribed after disconnect");

        test.server.shutdown().await;
    }

    #[tokio::test]
    async fn test_bad_request_keeps_connection() {
        let test = start("bad");
        let mut stream = UnixStream::connect(&test.socket_path).await.unwrap();

        send(&mut stream, r#"{"type":"launch_rockets"}"#).await;
        assert_eq!(recv(&mut stream).await["code"], "bad_request");

        send(&mut stream, r#"{"type":"ping"}"#).await;
        assert_eq!(recv(&mut stream).await["type"], "pong");

        test.server.shutdown().await;
    }
}
