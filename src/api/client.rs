//! Superhero REST API Client
//!
//! HTTP client for the remote `/superheroes` collection.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::error::{ApiError, ApiResult};
use super::{normalize_base_url, superheroes_url};
use crate::hero::{decode_hero_list, HeroEntry, NewHero};

/// Remote hero collection
#[async_trait]
pub trait HeroApi: Send + Sync {
    /// Fetch every hero, in whatever order the server keeps them
    async fn list_heroes(&self) -> ApiResult<Vec<HeroEntry>>;

    /// Create a hero. The response body is not used.
    async fn create_hero(&self, hero: &NewHero) -> ApiResult<()>;
}

/// reqwest-backed [`HeroApi`]
#[derive(Debug, Clone)]
pub struct HttpHeroApi {
    client: Client,
    base_url: String,
}

impl HttpHeroApi {
    /// Create a client for the API at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn error_from_response(response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .ok()
            .filter(|body| !body.trim().is_empty())
            .unwrap_or_else(|| "Unknown error".to_string());
        ApiError::Status { status, message }
    }
}

#[async_trait]
impl HeroApi for HttpHeroApi {
    async fn list_heroes(&self) -> ApiResult<Vec<HeroEntry>> {
        let url = superheroes_url(&self.base_url);
        tracing::debug!(url = %url, "Fetching superheroes");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        let heroes = decode_hero_list(&body).map_err(|e| ApiError::Decode(e.to_string()))?;

        tracing::debug!(count = heroes.len(), "Fetched superheroes");
        Ok(heroes)
    }

    async fn create_hero(&self, hero: &NewHero) -> ApiResult<()> {
        let url = superheroes_url(&self.base_url);
        tracing::debug!(url = %url, name = %hero.name, "Creating superhero");

        let response = self
            .client
            .post(&url)
            .json(hero)
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        Ok(())
    }
}
