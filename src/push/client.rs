//! Push Channel Client
//!
//! Native client for the push channel. Tries each configured transport in
//! order (WebSocket via tokio-tungstenite, then HTTP long-polling via reqwest),
//! reconnects with backoff when an established channel drops, and closes
//! exactly once.

use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;

use super::packet::{decode_payload, encode_payload, EnginePacket, PacketError};
use super::protocol::{ProtocolOutput, ProtocolState, PushEvent, PushProtocol};
use super::transport::{
    endpoint_url, Backoff, TransportKind, DEFAULT_TRANSPORTS, HANDSHAKE_TIMEOUT_MS,
};
use crate::api::normalize_base_url;

/// Receiving end of a push channel
pub type PushEvents = mpsc::UnboundedReceiver<PushEvent>;

/// Push-channel settings
#[derive(Debug, Clone)]
pub struct PushConfig {
    /// API origin, e.g. `http://localhost:3000`
    pub base_url: String,
    /// Transports to try, in order
    pub transports: Vec<TransportKind>,
    /// Consecutive reconnect attempts before giving up
    pub reconnect_attempts: u32,
    /// How long to wait for the server's open packet
    pub handshake_timeout: Duration,
}

impl PushConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            transports: DEFAULT_TRANSPORTS.to_vec(),
            reconnect_attempts: 5,
            handshake_timeout: Duration::from_millis(HANDSHAKE_TIMEOUT_MS),
        }
    }

    pub fn transports(mut self, transports: Vec<TransportKind>) -> Self {
        self.transports = transports;
        self
    }

    pub fn reconnect_attempts(mut self, attempts: u32) -> Self {
        self.reconnect_attempts = attempts;
        self
    }
}

/// Errors while establishing a push transport
#[derive(Error, Debug)]
pub enum PushError {
    #[error("No push transport configured")]
    NoTransports,

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Polling request failed: {0}")]
    Polling(#[from] reqwest::Error),

    #[error("Polling request returned status {0}")]
    PollingStatus(u16),

    #[error("Packet error: {0}")]
    Packet(#[from] PacketError),

    #[error("Server never completed the handshake")]
    NoHandshake,

    #[error("Transport closed before the handshake: {0}")]
    ClosedEarly(String),
}

/// How an established session ended
#[derive(Debug, PartialEq)]
enum SessionEnd {
    /// We closed it
    Shutdown,
    /// Server left on purpose; do not come back
    Final,
    /// Connection lost; try again
    Lost,
}

/// Handle to a running push channel. Owned by exactly one view.
pub struct PushChannel {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PushChannel {
    /// Open the channel in the background. Must be called inside a tokio runtime.
    pub fn open(config: PushConfig) -> (Self, PushEvents) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(drive(config, events_tx, shutdown_rx));

        (
            Self {
                shutdown: Some(shutdown_tx),
                task: Some(task),
            },
            events_rx,
        )
    }

    /// Whether the background task has stopped (gave up or closed)
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map(|t| t.is_finished()).unwrap_or(true)
    }

    /// Leave the namespace and close the transport, waiting briefly for the
    /// goodbye packets to go out.
    pub async fn close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(mut task) = self.task.take() {
            if tokio::time::timeout(Duration::from_secs(5), &mut task).await.is_err() {
                tracing::warn!("Push channel did not close in time, aborting");
                task.abort();
            }
        }
        tracing::debug!("Push channel closed");
    }
}

impl Drop for PushChannel {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn drive(
    config: PushConfig,
    events: mpsc::UnboundedSender<PushEvent>,
    mut shutdown: oneshot::Receiver<()>,
) {
    if config.transports.is_empty() {
        tracing::error!(error = %PushError::NoTransports, "Push channel not started");
        return;
    }

    let mut backoff = Backoff::new(config.reconnect_attempts);

    loop {
        let mut established = None;

        for kind in &config.transports {
            let result = match kind {
                TransportKind::Websocket => {
                    run_websocket(&config, &events, &mut shutdown, &mut backoff).await
                }
                TransportKind::Polling => {
                    run_polling(&config, &events, &mut shutdown, &mut backoff).await
                }
            };

            match result {
                Ok(end) => {
                    established = Some(end);
                    break;
                }
                Err(e) => {
                    tracing::warn!(transport = %kind, error = %e, "Push transport failed, trying next");
                }
            }
        }

        match established {
            Some(SessionEnd::Shutdown) | Some(SessionEnd::Final) => return,
            Some(SessionEnd::Lost) | None => {}
        }

        let Some(delay) = backoff.next_delay_ms() else {
            tracing::error!(
                attempts = backoff.attempts(),
                "Push channel gave up reconnecting"
            );
            let _ = events.send(PushEvent::Disconnected {
                reason: "reconnect attempts exhausted".to_string(),
            });
            return;
        };

        tracing::info!(delay_ms = delay, attempt = backoff.attempts(), "Reconnecting push channel");
        tokio::select! {
            _ = &mut shutdown => return,
            _ = tokio::time::sleep(Duration::from_millis(delay)) => {}
        }
    }
}

/// Forward events to the view and collect packets for the transport
fn route(
    outputs: Vec<ProtocolOutput>,
    events: &mpsc::UnboundedSender<PushEvent>,
    backoff: &mut Backoff,
) -> Vec<EnginePacket> {
    let mut outgoing = Vec::new();
    for output in outputs {
        match output {
            ProtocolOutput::Send(packet) => outgoing.push(packet),
            ProtocolOutput::Event(event) => {
                if let PushEvent::Connected { sid } = &event {
                    tracing::info!(sid = %sid, "Push channel connected");
                    backoff.reset();
                }
                // Receiver gone means the view is gone; nothing left to tell.
                let _ = events.send(event);
            }
        }
    }
    outgoing
}

/// Wrap up after the transport itself failed
fn transport_lost(
    protocol: &PushProtocol,
    reason: &str,
    events: &mpsc::UnboundedSender<PushEvent>,
) -> Result<SessionEnd, PushError> {
    match protocol.state() {
        ProtocolState::AwaitingOpen => Err(PushError::ClosedEarly(reason.to_string())),
        ProtocolState::Closed => Ok(closed_end(protocol)),
        ProtocolState::Connecting | ProtocolState::Connected => {
            let _ = events.send(PushEvent::Disconnected {
                reason: reason.to_string(),
            });
            Ok(SessionEnd::Lost)
        }
    }
}

fn closed_end(protocol: &PushProtocol) -> SessionEnd {
    if protocol.may_reconnect() {
        SessionEnd::Lost
    } else {
        SessionEnd::Final
    }
}

/// Time allowed before the next frame must arrive
fn frame_deadline(protocol: &PushProtocol, config: &PushConfig) -> Instant {
    let handshake_ms = config.handshake_timeout.as_millis() as u64;
    Instant::now() + Duration::from_millis(protocol.frame_timeout_ms(handshake_ms))
}

async fn run_websocket(
    config: &PushConfig,
    events: &mpsc::UnboundedSender<PushEvent>,
    shutdown: &mut oneshot::Receiver<()>,
    backoff: &mut Backoff,
) -> Result<SessionEnd, PushError> {
    let url = endpoint_url(&config.base_url, TransportKind::Websocket, None);
    tracing::debug!(url = %url, "Opening WebSocket push transport");

    let connect = tokio_tungstenite::connect_async(url.as_str());
    let (socket, _) = tokio::time::timeout(config.handshake_timeout, connect)
        .await
        .map_err(|_| PushError::NoHandshake)?
        .map_err(|e| PushError::WebSocket(e.to_string()))?;
    let (mut sink, mut stream) = socket.split();

    let mut protocol = PushProtocol::new();
    let mut deadline = frame_deadline(&protocol, config);

    loop {
        tokio::select! {
            _ = &mut *shutdown => {
                for packet in route(protocol.close(), events, backoff) {
                    let _ = sink.send(Message::Text(packet.encode().into())).await;
                }
                let _ = sink.close().await;
                return Ok(SessionEnd::Shutdown);
            }
            _ = tokio::time::sleep_until(deadline) => {
                if protocol.state() == ProtocolState::AwaitingOpen {
                    return Err(PushError::NoHandshake);
                }
                let _ = sink.close().await;
                return transport_lost(&protocol, "ping timeout", events);
            }
            frame = stream.next() => {
                let text = match frame {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => {
                        return transport_lost(&protocol, "transport close", events);
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        return transport_lost(&protocol, &format!("transport error: {}", e), events);
                    }
                };

                let outgoing = route(protocol.handle_text(text.as_str()), events, backoff);
                deadline = frame_deadline(&protocol, config);

                for packet in outgoing {
                    if let Err(e) = sink.send(Message::Text(packet.encode().into())).await {
                        return transport_lost(&protocol, &format!("transport error: {}", e), events);
                    }
                }

                if protocol.is_closed() {
                    let _ = sink.close().await;
                    return Ok(closed_end(&protocol));
                }
            }
        }
    }
}

async fn poll_get(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<String, PushError> {
    let response = client.get(url).timeout(timeout).send().await?;
    if !response.status().is_success() {
        return Err(PushError::PollingStatus(response.status().as_u16()));
    }
    Ok(response.text().await?)
}

async fn poll_post(
    client: &reqwest::Client,
    url: &str,
    packets: &[EnginePacket],
    timeout: Duration,
) -> Result<(), PushError> {
    let response = client
        .post(url)
        .header(reqwest::header::CONTENT_TYPE, "text/plain;charset=UTF-8")
        .body(encode_payload(packets))
        .timeout(timeout)
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(PushError::PollingStatus(response.status().as_u16()));
    }
    Ok(())
}

async fn run_polling(
    config: &PushConfig,
    events: &mpsc::UnboundedSender<PushEvent>,
    shutdown: &mut oneshot::Receiver<()>,
    backoff: &mut Backoff,
) -> Result<SessionEnd, PushError> {
    let client = reqwest::Client::new();
    let handshake_url = endpoint_url(&config.base_url, TransportKind::Polling, None);
    tracing::debug!(url = %handshake_url, "Opening polling push transport");

    let mut protocol = PushProtocol::new();
    let body = poll_get(&client, &handshake_url, config.handshake_timeout).await?;
    let mut outgoing = Vec::new();
    for packet in decode_payload(&body)? {
        outgoing.extend(route(protocol.handle(packet), events, backoff));
    }

    let Some(handshake) = protocol.handshake().cloned() else {
        return Err(PushError::NoHandshake);
    };
    let session_url =
        endpoint_url(&config.base_url, TransportKind::Polling, Some(&handshake.sid));
    let long_poll = Duration::from_millis(handshake.heartbeat_timeout_ms());

    loop {
        if !outgoing.is_empty() {
            let packets = std::mem::take(&mut outgoing);
            if let Err(e) = poll_post(&client, &session_url, &packets, config.handshake_timeout).await {
                return transport_lost(&protocol, &format!("transport error: {}", e), events);
            }
        }

        if protocol.is_closed() {
            return Ok(closed_end(&protocol));
        }

        tokio::select! {
            _ = &mut *shutdown => {
                let packets = route(protocol.close(), events, backoff);
                if !packets.is_empty() {
                    let _ = poll_post(&client, &session_url, &packets, config.handshake_timeout).await;
                }
                return Ok(SessionEnd::Shutdown);
            }
            result = poll_get(&client, &session_url, long_poll) => {
                let body = match result {
                    Ok(body) => body,
                    Err(e) => {
                        return transport_lost(&protocol, &format!("transport error: {}", e), events);
                    }
                };
                match decode_payload(&body) {
                    Ok(packets) => {
                        for packet in packets {
                            outgoing.extend(route(protocol.handle(packet), events, backoff));
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Ignoring undecodable polling payload");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = PushConfig::new("http://localhost:3000/");
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.transports, DEFAULT_TRANSPORTS.to_vec());
        assert_eq!(config.reconnect_attempts, 5);
    }

    #[test]
    fn test_route_splits_outputs() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut backoff = Backoff::new(3);
        backoff.next_delay_ms();

        let outgoing = route(
            vec![
                ProtocolOutput::Send(EnginePacket::Pong(String::new())),
                ProtocolOutput::Event(PushEvent::Connected {
                    sid: "s".to_string(),
                }),
            ],
            &tx,
            &mut backoff,
        );

        assert_eq!(outgoing, vec![EnginePacket::Pong(String::new())]);
        assert_eq!(backoff.attempts(), 0);
        assert!(matches!(rx.try_recv(), Ok(PushEvent::Connected { .. })));
    }

    #[test]
    fn test_transport_lost_before_open_is_an_error() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let protocol = PushProtocol::new();
        assert!(matches!(
            transport_lost(&protocol, "gone", &tx),
            Err(PushError::ClosedEarly(_))
        ));
    }
}
