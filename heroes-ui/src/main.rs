//! Humble Heroes Page
//!
//! Superhero leaderboard built with Leptos (WASM).
//!
//! # Features
//!
//! - Leaderboard sorted by humility score, with star ratings
//! - Validated form for adding a hero
//! - Live "recently added" list over the Socket.IO push channel
//!
//! # Architecture
//!
//! This is a client-side rendered (CSR) Leptos application that compiles to
//! WebAssembly. Leaderboard rules, validation and the push protocol come from
//! the `humble-heroes` core; this crate only adds browser I/O and views.

use leptos::*;

mod api;
mod app;
mod components;
mod state;

fn main() {
    // Set up panic hook for better error messages in WASM
    console_error_panic_hook::set_once();

    mount_to_body(|| view! { <app::App /> });
}
