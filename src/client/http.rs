//! HTTP client for the picks service.

use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};

use super::ParlayApi;
use crate::config::Config;
use crate::error::ApiError;
use crate::metrics;
use crate::odds::OddsSnapshot;
use crate::parlay::{BuildResponse, Pick, PickId};

const LIVE_ODDS_PATH: &str = "/odds/live";
const PICKS_TODAY_PATH: &str = "/picks/today";
const BUILD_PARLAY_PATH: &str = "/parlays/build";

/// Client for the picks service REST API.
#[derive(Debug, Clone)]
pub struct DeskClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Base URL including the version prefix.
    base_url: String,
}

#[derive(Debug, Serialize)]
struct BuildBody<'a> {
    pick_ids: &'a [PickId],
}

impl DeskClient {
    /// Create a client from config.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.http_timeout_ms))
            .connect_timeout(Duration::from_secs(5))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url().to_string(),
        })
    }

    /// Base URL requests are made against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the latest snapshot batch.
    ///
    /// Records that fail to decode are dropped individually; see
    /// [`OddsSnapshot::decode_batch`].
    #[instrument(skip(self))]
    pub async fn fetch_live_odds(&self) -> Result<Vec<OddsSnapshot>, ApiError> {
        let body = self.get_body(LIVE_ODDS_PATH).await?;
        let snapshots = OddsSnapshot::decode_batch(&body).map_err(|e| parse_error(LIVE_ODDS_PATH, e))?;
        debug!(count = snapshots.len(), "Fetched live odds");
        Ok(snapshots)
    }

    /// Fetch today's picks.
    #[instrument(skip(self))]
    pub async fn fetch_picks_today(&self) -> Result<Vec<Pick>, ApiError> {
        let picks: Vec<Pick> = self.get_json(PICKS_TODAY_PATH).await?;
        debug!(count = picks.len(), "Fetched picks");
        Ok(picks)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let body = self.get_body(path).await?;
        serde_json::from_str(&body).map_err(|e| parse_error(path, e))
    }

    async fn get_body(&self, path: &str) -> Result<String, ApiError> {
        let start = Instant::now();
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;
        metrics::record_http_latency(start, path);

        success_body(path, response).await
    }
}

impl ParlayApi for DeskClient {
    #[instrument(skip(self))]
    async fn build_parlay(&self, pick_ids: &[PickId]) -> Result<BuildResponse, ApiError> {
        let start = Instant::now();
        let response = self
            .http
            .post(format!("{}{}", self.base_url, BUILD_PARLAY_PATH))
            .json(&BuildBody { pick_ids })
            .send()
            .await?;
        metrics::record_http_latency(start, BUILD_PARLAY_PATH);

        let body = success_body(BUILD_PARLAY_PATH, response).await?;
        serde_json::from_str(&body).map_err(|e| parse_error(BUILD_PARLAY_PATH, e))
    }
}

async fn success_body(path: &str, response: reqwest::Response) -> Result<String, ApiError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(ApiError::RequestFailed {
            endpoint: path.to_string(),
            reason: format!("HTTP {}: {}", status, body),
        });
    }

    Ok(body)
}

fn parse_error(path: &str, e: serde_json::Error) -> ApiError {
    ApiError::ParseError {
        endpoint: path.to_string(),
        reason: e.to_string(),
    }
}
