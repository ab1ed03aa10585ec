//! Push Channel
//!
//! Server-initiated "new hero" notifications over Socket.IO.
//!
//! ## Architecture
//!
//! - **Packets**: Engine.IO / Socket.IO text framing
//! - **Protocol**: transport-independent client state machine
//! - **Transport**: endpoint addressing, transport order, reconnect pacing
//! - **Client** (native only): tokio driver for WebSocket and long-polling
//!
//! ## Wire example
//!
//! ```text
//! <- 0{"sid":"lv_VI97","upgrades":[],"pingInterval":25000,"pingTimeout":20000}
//! -> 40
//! <- 40{"sid":"q8Fh"}
//! <- 2
//! -> 3
//! <- 42["newSuperhero",{"name":"Quiet Quill","superpower":"Editing","humilityScore":9.3}]
//! -> 41
//! -> 1
//! ```

mod packet;
mod protocol;
mod transport;

#[cfg(feature = "native")]
mod client;

pub use packet::{
    decode_payload, encode_payload, EnginePacket, Handshake, PacketError, PacketResult,
    SocketPacket, DEFAULT_NAMESPACE, RECORD_SEPARATOR,
};
pub use protocol::{ProtocolOutput, ProtocolState, PushEvent, PushProtocol, NEW_HERO_EVENT};
pub use transport::{
    endpoint_url, parse_transport_list, to_ws_scheme, Backoff, TransportKind, DEFAULT_TRANSPORTS,
    ENGINE_IO_VERSION, HANDSHAKE_TIMEOUT_MS, PUSH_PATH,
};

#[cfg(feature = "native")]
pub use client::{PushChannel, PushConfig, PushError, PushEvents};
