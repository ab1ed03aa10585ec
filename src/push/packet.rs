//! Push-Channel Packets
//!
//! Engine.IO v4 framing with Socket.IO v5 packets carried inside engine
//! `message` packets. Only the text encoding is supported.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Separates packets inside one polling payload
pub const RECORD_SEPARATOR: char = '\u{1e}';

/// Namespace used when a packet names none
pub const DEFAULT_NAMESPACE: &str = "/";

/// Errors while decoding packets
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PacketError {
    #[error("Empty packet")]
    Empty,

    #[error("Unknown engine packet type: {0:?}")]
    UnknownEngineType(char),

    #[error("Unknown socket packet type: {0:?}")]
    UnknownSocketType(char),

    #[error("Unsupported packet: {0}")]
    Unsupported(&'static str),

    #[error("Malformed packet: {0}")]
    Malformed(String),
}

/// Result type for packet decoding
pub type PacketResult<T> = Result<T, PacketError>;

/// Payload of the engine `open` packet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    #[serde(default = "default_ping_interval")]
    pub ping_interval: u64,
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout: u64,
    #[serde(default)]
    pub max_payload: u64,
}

fn default_ping_interval() -> u64 {
    25_000
}

fn default_ping_timeout() -> u64 {
    20_000
}

impl Handshake {
    /// How long to wait for the next ping before calling the server gone
    pub fn heartbeat_timeout_ms(&self) -> u64 {
        self.ping_interval + self.ping_timeout
    }
}

/// Engine.IO packet
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(Handshake),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    /// Decode one text packet
    pub fn decode(raw: &str) -> PacketResult<Self> {
        let kind = raw.chars().next().ok_or(PacketError::Empty)?;
        let data = &raw[kind.len_utf8()..];

        match kind {
            '0' => serde_json::from_str(data)
                .map(EnginePacket::Open)
                .map_err(|e| PacketError::Malformed(format!("open handshake: {}", e))),
            '1' => Ok(EnginePacket::Close),
            '2' => Ok(EnginePacket::Ping(data.to_string())),
            '3' => Ok(EnginePacket::Pong(data.to_string())),
            '4' => Ok(EnginePacket::Message(data.to_string())),
            '5' => Ok(EnginePacket::Upgrade),
            '6' => Ok(EnginePacket::Noop),
            'b' => Err(PacketError::Unsupported("binary engine packet")),
            other => Err(PacketError::UnknownEngineType(other)),
        }
    }

    /// Encode as text
    pub fn encode(&self) -> String {
        match self {
            EnginePacket::Open(handshake) => {
                // Serializing a plain struct of strings and integers cannot fail
                format!("0{}", serde_json::to_string(handshake).unwrap_or_default())
            }
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping(data) => format!("2{}", data),
            EnginePacket::Pong(data) => format!("3{}", data),
            EnginePacket::Message(data) => format!("4{}", data),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }

    /// Wrap a socket packet in an engine message
    pub fn message(packet: &SocketPacket) -> Self {
        EnginePacket::Message(packet.encode())
    }
}

/// Split a polling response body into packets
pub fn decode_payload(body: &str) -> PacketResult<Vec<EnginePacket>> {
    body.split(RECORD_SEPARATOR)
        .filter(|part| !part.is_empty())
        .map(EnginePacket::decode)
        .collect()
}

/// Join packets into one polling request body
pub fn encode_payload(packets: &[EnginePacket]) -> String {
    packets
        .iter()
        .map(EnginePacket::encode)
        .collect::<Vec<_>>()
        .join(&RECORD_SEPARATOR.to_string())
}

/// Socket.IO packet
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        data: Option<Value>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        id: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    Ack {
        namespace: String,
        id: u64,
        args: Vec<Value>,
    },
    ConnectError {
        namespace: String,
        data: Option<Value>,
    },
}

impl SocketPacket {
    /// Connect request for the default namespace
    pub fn connect() -> Self {
        SocketPacket::Connect {
            namespace: DEFAULT_NAMESPACE.to_string(),
            data: None,
        }
    }

    /// Disconnect notice for the default namespace
    pub fn disconnect() -> Self {
        SocketPacket::Disconnect {
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    pub fn namespace(&self) -> &str {
        match self {
            SocketPacket::Connect { namespace, .. }
            | SocketPacket::Disconnect { namespace }
            | SocketPacket::Event { namespace, .. }
            | SocketPacket::Ack { namespace, .. }
            | SocketPacket::ConnectError { namespace, .. } => namespace,
        }
    }

    /// Decode the data of an engine `message` packet
    pub fn decode(raw: &str) -> PacketResult<Self> {
        let kind = raw.chars().next().ok_or(PacketError::Empty)?;
        let mut rest = &raw[kind.len_utf8()..];

        if matches!(kind, '5' | '6') {
            return Err(PacketError::Unsupported("binary socket packet"));
        }
        if !matches!(kind, '0'..='4') {
            return Err(PacketError::UnknownSocketType(kind));
        }

        let namespace = if rest.starts_with('/') {
            match rest.find(',') {
                Some(idx) => {
                    let ns = &rest[..idx];
                    rest = &rest[idx + 1..];
                    ns.to_string()
                }
                None => {
                    let ns = rest.to_string();
                    rest = "";
                    ns
                }
            }
        } else {
            DEFAULT_NAMESPACE.to_string()
        };

        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        let id = if digits > 0 {
            let parsed = rest[..digits]
                .parse::<u64>()
                .map_err(|e| PacketError::Malformed(format!("ack id: {}", e)))?;
            rest = &rest[digits..];
            Some(parsed)
        } else {
            None
        };

        let data = if rest.is_empty() {
            None
        } else {
            Some(
                serde_json::from_str::<Value>(rest)
                    .map_err(|e| PacketError::Malformed(format!("payload: {}", e)))?,
            )
        };

        match kind {
            '0' => Ok(SocketPacket::Connect { namespace, data }),
            '1' => Ok(SocketPacket::Disconnect { namespace }),
            '2' => {
                let mut args = match data {
                    Some(Value::Array(items)) => items,
                    _ => return Err(PacketError::Malformed("event payload is not an array".into())),
                };
                if args.is_empty() {
                    return Err(PacketError::Malformed("event without a name".into()));
                }
                let name = match args.remove(0) {
                    Value::String(name) => name,
                    _ => return Err(PacketError::Malformed("event name is not a string".into())),
                };
                Ok(SocketPacket::Event {
                    namespace,
                    id,
                    name,
                    args,
                })
            }
            '3' => {
                let id = id.ok_or_else(|| PacketError::Malformed("ack without id".into()))?;
                let args = match data {
                    Some(Value::Array(items)) => items,
                    None => Vec::new(),
                    _ => return Err(PacketError::Malformed("ack payload is not an array".into())),
                };
                Ok(SocketPacket::Ack {
                    namespace,
                    id,
                    args,
                })
            }
            _ => Ok(SocketPacket::ConnectError { namespace, data }),
        }
    }

    /// Encode as the data of an engine `message` packet
    pub fn encode(&self) -> String {
        let mut out = String::new();
        let (kind, id, data) = match self {
            SocketPacket::Connect { data, .. } => ('0', None, data.clone()),
            SocketPacket::Disconnect { .. } => ('1', None, None),
            SocketPacket::Event { id, name, args, .. } => {
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(Value::String(name.clone()));
                items.extend(args.iter().cloned());
                ('2', *id, Some(Value::Array(items)))
            }
            SocketPacket::Ack { id, args, .. } => ('3', Some(*id), Some(Value::Array(args.clone()))),
            SocketPacket::ConnectError { data, .. } => ('4', None, data.clone()),
        };

        out.push(kind);
        let namespace = self.namespace();
        if namespace != DEFAULT_NAMESPACE {
            out.push_str(namespace);
            out.push(',');
        }
        if let Some(id) = id {
            out.push_str(&id.to_string());
        }
        if let Some(data) = data {
            out.push_str(&data.to_string());
        }
        out
    }
}
