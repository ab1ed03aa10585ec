//! Leaderboard
//!
//! View-local state shared by the page and the terminal session.

mod liveness;
mod state;

pub use liveness::Liveness;
pub use state::{sort_by_score, Leaderboard, LoadTicket};

/// Delay between a successful submission and the refresh load
pub const REFRESH_DELAY_MS: u64 = 500;
