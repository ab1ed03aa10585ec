//! Push Protocol
//!
//! Transport-independent client state machine for the push channel. Feed it
//! every text frame the transport receives; it answers with packets to send
//! and events for the view. The WebSocket client, the polling client and the
//! page's browser transport all drive this same machine.

use crate::hero::HeroEntry;

use super::packet::{EnginePacket, Handshake, SocketPacket, DEFAULT_NAMESPACE};

/// Event announcing a freshly created hero
pub const NEW_HERO_EVENT: &str = "newSuperhero";

/// What the view hears from the push channel
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    /// Namespace connect acknowledged
    Connected { sid: String },
    /// A hero was created somewhere
    NewHero(HeroEntry),
    /// The channel is gone
    Disconnected { reason: String },
}

/// Connection phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolState {
    AwaitingOpen,
    Connecting,
    Connected,
    Closed,
}

/// Work requested by the machine
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolOutput {
    Send(EnginePacket),
    Event(PushEvent),
}

/// Client-side protocol state for one push-channel connection
#[derive(Debug, Clone)]
pub struct PushProtocol {
    state: ProtocolState,
    handshake: Option<Handshake>,
    reconnect: bool,
}

impl PushProtocol {
    pub fn new() -> Self {
        Self {
            state: ProtocolState::AwaitingOpen,
            handshake: None,
            reconnect: true,
        }
    }

    pub fn state(&self) -> ProtocolState {
        self.state
    }

    pub fn handshake(&self) -> Option<&Handshake> {
        self.handshake.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.state == ProtocolState::Closed
    }

    /// Whether a lost connection should be re-established. False once either
    /// side has deliberately left the namespace.
    pub fn may_reconnect(&self) -> bool {
        self.reconnect
    }

    /// Milliseconds the transport may stay silent before it counts as dead.
    /// Until the open packet arrives that is `handshake_timeout_ms`; after it,
    /// the server's ping interval plus ping timeout.
    pub fn frame_timeout_ms(&self, handshake_timeout_ms: u64) -> u64 {
        match &self.handshake {
            Some(handshake) => handshake.heartbeat_timeout_ms(),
            None => handshake_timeout_ms,
        }
    }

    /// Handle one received text frame
    pub fn handle_text(&mut self, raw: &str) -> Vec<ProtocolOutput> {
        match EnginePacket::decode(raw) {
            Ok(packet) => self.handle(packet),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring undecodable push packet");
                Vec::new()
            }
        }
    }

    /// Handle one decoded engine packet
    pub fn handle(&mut self, packet: EnginePacket) -> Vec<ProtocolOutput> {
        if self.state == ProtocolState::Closed {
            return Vec::new();
        }

        match packet {
            EnginePacket::Open(handshake) => {
                if self.state != ProtocolState::AwaitingOpen {
                    tracing::warn!("Ignoring repeated open packet");
                    return Vec::new();
                }
                tracing::debug!(sid = %handshake.sid, "Push transport open");
                self.handshake = Some(handshake);
                self.state = ProtocolState::Connecting;
                vec![ProtocolOutput::Send(EnginePacket::message(&SocketPacket::connect()))]
            }
            EnginePacket::Ping(data) => vec![ProtocolOutput::Send(EnginePacket::Pong(data))],
            EnginePacket::Close => {
                self.state = ProtocolState::Closed;
                vec![disconnected("transport close")]
            }
            EnginePacket::Message(data) => match SocketPacket::decode(&data) {
                Ok(packet) => self.handle_socket(packet),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring undecodable socket packet");
                    Vec::new()
                }
            },
            EnginePacket::Pong(_) | EnginePacket::Upgrade | EnginePacket::Noop => Vec::new(),
        }
    }

    fn handle_socket(&mut self, packet: SocketPacket) -> Vec<ProtocolOutput> {
        if packet.namespace() != DEFAULT_NAMESPACE {
            tracing::debug!(namespace = %packet.namespace(), "Ignoring packet for another namespace");
            return Vec::new();
        }

        match packet {
            SocketPacket::Connect { data, .. } => {
                if self.state != ProtocolState::Connecting {
                    return Vec::new();
                }
                self.state = ProtocolState::Connected;
                let sid = data
                    .as_ref()
                    .and_then(|d| d.get("sid"))
                    .and_then(|s| s.as_str())
                    .unwrap_or_default()
                    .to_string();
                vec![ProtocolOutput::Event(PushEvent::Connected { sid })]
            }
            SocketPacket::ConnectError { data, .. } => {
                self.state = ProtocolState::Closed;
                self.reconnect = false;
                let reason = data
                    .as_ref()
                    .and_then(|d| d.get("message"))
                    .and_then(|m| m.as_str())
                    .unwrap_or("connect error")
                    .to_string();
                vec![
                    disconnected(&reason),
                    ProtocolOutput::Send(EnginePacket::Close),
                ]
            }
            SocketPacket::Disconnect { .. } => {
                self.state = ProtocolState::Closed;
                self.reconnect = false;
                vec![
                    disconnected("io server disconnect"),
                    ProtocolOutput::Send(EnginePacket::Close),
                ]
            }
            SocketPacket::Event { name, args, .. } => {
                if self.state != ProtocolState::Connected || name != NEW_HERO_EVENT {
                    return Vec::new();
                }
                let Some(payload) = args.into_iter().next() else {
                    tracing::warn!(event = %name, "Push event without a payload");
                    return Vec::new();
                };
                match serde_json::from_value::<HeroEntry>(payload) {
                    Ok(hero) => vec![ProtocolOutput::Event(PushEvent::NewHero(hero))],
                    Err(e) => {
                        tracing::warn!(error = %e, "Dropping malformed hero payload");
                        Vec::new()
                    }
                }
            }
            SocketPacket::Ack { .. } => Vec::new(),
        }
    }

    /// Leave the channel. Only the first call produces packets.
    pub fn close(&mut self) -> Vec<ProtocolOutput> {
        let previous = std::mem::replace(&mut self.state, ProtocolState::Closed);
        self.reconnect = false;
        match previous {
            ProtocolState::Connecting | ProtocolState::Connected => vec![
                ProtocolOutput::Send(EnginePacket::message(&SocketPacket::disconnect())),
                ProtocolOutput::Send(EnginePacket::Close),
            ],
            ProtocolState::AwaitingOpen | ProtocolState::Closed => Vec::new(),
        }
    }
}

impl Default for PushProtocol {
    fn default() -> Self {
        Self::new()
    }
}

fn disconnected(reason: &str) -> ProtocolOutput {
    ProtocolOutput::Event(PushEvent::Disconnected {
        reason: reason.to_string(),
    })
}
