//! # Humble Heroes
//!
//! Client for the Humble Superhero leaderboard: a sorted list of heroes ranked
//! by humility score, a recent list fed live by the server's push channel, and
//! a validated form for adding new heroes.
//!
//! ## Modules
//!
//! - [`hero`]: hero entries, star ratings and the submission form
//! - [`leaderboard`]: sorted and recent lists, load tickets, liveness guard
//! - [`push`]: Socket.IO push channel (wire format, protocol machine, native client)
//! - [`api`]: REST client for the `/superheroes` collection
//! - [`session`]: native leaderboard session tying the above together
//! - [`config`]: file and environment configuration
//!
//! The `native` feature (on by default) carries everything that needs tokio.
//! Without it only the platform-neutral core is built, which is what the
//! browser page links against.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use humble_heroes::{Config, HeroForm, HttpHeroApi, LeaderboardSession, SessionOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let api = HttpHeroApi::new(&config.api.base_url, config.api.request_timeout())?;
//!     let mut session = LeaderboardSession::new(api, SessionOptions::default());
//!
//!     let mut form = HeroForm::new();
//!     form.name = "Quiet Quill".to_string();
//!     form.superpower = "Editing".to_string();
//!     form.humility_score = "9.3".to_string();
//!     session.submit(&mut form).await?;
//!
//!     for hero in session.sorted().await {
//!         println!("{} {}", hero.name, hero.rating());
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod hero;
pub mod leaderboard;
pub mod push;

#[cfg(feature = "native")]
pub mod config;
#[cfg(feature = "native")]
pub mod session;

pub use hero::{
    decode_hero_list, format_score, star_states, FormField, HeroEntry, HeroForm, HeroId, NewHero, StarRating,
    StarState, ValidationError,
};

pub use leaderboard::{sort_by_score, Leaderboard, Liveness, LoadTicket, REFRESH_DELAY_MS};

pub use push::{PushEvent, PushProtocol, TransportKind};

pub use api::{normalize_base_url, superheroes_url, DEFAULT_API_BASE};

#[cfg(feature = "native")]
pub use api::{ApiError, ApiResult, HeroApi, HttpHeroApi};

#[cfg(feature = "native")]
pub use push::{PushChannel, PushConfig, PushError};

#[cfg(feature = "native")]
pub use config::{Config, ConfigError};

#[cfg(feature = "native")]
pub use session::{LeaderboardSession, SessionEvent, SessionOptions, SubmitError};
