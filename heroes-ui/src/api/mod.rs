//! API Client
//!
//! Browser-side access to the superhero REST API.

pub mod client;

pub use client::{api_base, create_hero, fetch_heroes};
