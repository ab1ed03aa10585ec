//! HTTP API Client
//!
//! Functions for talking to the superhero REST API with gloo-net.

use gloo_net::http::Request;
use humble_heroes::{
    decode_hero_list, normalize_base_url, superheroes_url, HeroEntry, NewHero, DEFAULT_API_BASE,
};

/// API origin baked in at build time from `HEROES_API_BASE_URL`
pub fn api_base() -> String {
    resolve_base(option_env!("HEROES_API_BASE_URL"))
}

fn resolve_base(configured: Option<&str>) -> String {
    match configured {
        Some(url) if !url.trim().is_empty() => normalize_base_url(url),
        _ => DEFAULT_API_BASE.to_string(),
    }
}

/// Fetch every hero (unsorted)
pub async fn fetch_heroes() -> Result<Vec<HeroEntry>, String> {
    let response = Request::get(&superheroes_url(&api_base()))
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if !response.ok() {
        let body = response.text().await.unwrap_or_default();
        return Err(format!("Server error {}: {}", response.status(), body));
    }

    let body = response
        .text()
        .await
        .map_err(|e| format!("Read error: {}", e))?;
    decode_hero_list(&body).map_err(|e| format!("Parse error: {}", e))
}

/// Create a hero. The response body is ignored.
pub async fn create_hero(hero: &NewHero) -> Result<(), String> {
    let response = Request::post(&superheroes_url(&api_base()))
        .json(hero)
        .map_err(|e| format!("Request build error: {}", e))?
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if !response.ok() {
        let body = response.text().await.unwrap_or_default();
        return Err(format!("Server error {}: {}", response.status(), body));
    }

    Ok(())
}
