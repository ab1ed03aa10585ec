//! Push Transports
//!
//! Endpoint addressing and reconnect pacing for the two transport modes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::api::normalize_base_url;

/// Engine.IO protocol revision spoken by the client
pub const ENGINE_IO_VERSION: u8 = 4;

/// Path the server mounts the push channel on
pub const PUSH_PATH: &str = "/socket.io/";

/// How long a fresh transport may stay silent before its open packet
pub const HANDSHAKE_TIMEOUT_MS: u64 = 10_000;

/// Transport modes, tried in order until one opens
pub const DEFAULT_TRANSPORTS: [TransportKind; 2] = [TransportKind::Websocket, TransportKind::Polling];

/// How the push channel moves frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Websocket,
    Polling,
}

impl TransportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransportKind::Websocket => "websocket",
            TransportKind::Polling => "polling",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "websocket" | "ws" => Ok(TransportKind::Websocket),
            "polling" => Ok(TransportKind::Polling),
            other => Err(format!("unknown transport: {}", other)),
        }
    }
}

/// Parse a comma-separated transport list, e.g. `"websocket,polling"`
pub fn parse_transport_list(raw: &str) -> Result<Vec<TransportKind>, String> {
    raw.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(str::parse)
        .collect()
}

/// Rewrite an HTTP origin to its WebSocket equivalent
pub fn to_ws_scheme(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        url.to_string()
    }
}

/// Full endpoint URL for a transport, with the session id once one is known
pub fn endpoint_url(base: &str, kind: TransportKind, sid: Option<&str>) -> String {
    let base = normalize_base_url(base);
    let origin = match kind {
        TransportKind::Websocket => to_ws_scheme(&base),
        TransportKind::Polling => base,
    };

    let mut url = format!(
        "{}{}?EIO={}&transport={}",
        origin,
        PUSH_PATH,
        ENGINE_IO_VERSION,
        kind.as_str()
    );
    if let Some(sid) = sid {
        url.push_str("&sid=");
        url.push_str(&urlencoding::encode(sid));
    }
    url
}

/// Exponential reconnect delays: 1s, 2s, 4s, then 5s until attempts run out
#[derive(Debug, Clone)]
pub struct Backoff {
    attempt: u32,
    max_attempts: u32,
    initial_ms: u64,
    max_ms: u64,
}

impl Backoff {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempt: 0,
            max_attempts,
            initial_ms: 1000,
            max_ms: 5000,
        }
    }

    /// Delay before the next attempt, or `None` once attempts are used up
    pub fn next_delay_ms(&mut self) -> Option<u64> {
        if self.attempt >= self.max_attempts {
            return None;
        }
        let delay = self
            .initial_ms
            .saturating_mul(1u64 << self.attempt.min(16))
            .min(self.max_ms);
        self.attempt += 1;
        Some(delay)
    }

    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    /// Call after a connection was established
    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}
