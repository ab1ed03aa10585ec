//! Superhero API
//!
//! Addressing for the remote collection and, on native targets, an HTTP client
//! for it.
//!
//! # Endpoints
//!
//! - `GET /superheroes` - List every hero (unordered)
//! - `POST /superheroes` - Create a hero from `{name, superpower, humilityScore}`
//!
//! # Example
//!
//! ```rust,no_run
//! use humble_heroes::api::{HeroApi, HttpHeroApi};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api = HttpHeroApi::new("http://localhost:3000", std::time::Duration::from_secs(10))?;
//!     for hero in api.list_heroes().await? {
//!         println!("{} ({})", hero.name, hero.humility_score);
//!     }
//!     Ok(())
//! }
//! ```

#[cfg(feature = "native")]
mod client;
#[cfg(feature = "native")]
mod error;

#[cfg(feature = "native")]
pub use client::{HeroApi, HttpHeroApi};
#[cfg(feature = "native")]
pub use error::{ApiError, ApiResult};

/// API origin used when nothing else is configured
pub const DEFAULT_API_BASE: &str = "http://localhost:3000";

/// Collection path, relative to the API origin
pub const SUPERHEROES_PATH: &str = "/superheroes";

/// Strip surrounding whitespace and trailing slashes from an origin
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// `{base}/superheroes`
pub fn superheroes_url(base: &str) -> String {
    format!("{}{}", normalize_base_url(base), SUPERHEROES_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_superheroes_url() {
        assert_eq!(superheroes_url("http://localhost:3000"), "http://localhost:3000/superheroes");
        assert_eq!(superheroes_url(" https://x.dev// "), "https://x.dev/superheroes");
    }
}
