use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use super::provider::MatchSource;
use crate::models::{FetchError, MatchesResponse, Player};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Match-history source backed by the aoe2companion REST API.
/// Each player carries its own fully-formed query URL.
#[derive(Clone)]
pub struct CompanionApi {
    http: Client,
}

impl CompanionApi {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(CompanionApi { http })
    }
}

#[async_trait]
impl MatchSource for CompanionApi {
    fn name(&self) -> &str {
        "aoe2companion"
    }

    async fn fetch_matches(&self, player: &Player) -> Result<MatchesResponse, FetchError> {
        debug!("Fetching matches for {} from {}", player.name, player.api_url);

        let resp = self.http.get(&player.api_url).send().await.map_err(|e| {
            warn!("Request error for {}: {}", player.name, e);
            FetchError::RequestFailed
        })?;

        let status = resp.status();
        if !status.is_success() {
            warn!("Request error for {}: HTTP {}", player.name, status);
            return Err(FetchError::RequestFailed);
        }

        let body = resp.bytes().await.map_err(|e| {
            warn!("Failed to read response body for {}: {}", player.name, e);
            FetchError::RequestFailed
        })?;

        parse_matches_body(&body).map_err(|e| {
            warn!("JSON decode error for {}: {}", player.name, e);
            FetchError::InvalidResponse
        })
    }
}

fn parse_matches_body(body: &[u8]) -> serde_json::Result<MatchesResponse> {
    serde_json::from_slice(body)
}
