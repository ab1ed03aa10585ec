//! State Management
//!
//! Page state and the push-channel connection.

pub mod global;
pub mod realtime;

pub use global::{provide_global_state, GlobalState};
pub use realtime::PushClient;
