//! Football statistics REST client.
//!
//! Fetches per-market team match logs with rate limiting, retry logic,
//! and domain type conversion. The upstream feed is forgiving about
//! missing fields, so deserialization uses `Option` liberally and drops
//! rows it cannot use.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::config::{AppConfig, RateLimitConfig, Secrets};
use crate::markets::models::{MatchRecord, TeamMatchLog};
use crate::markets::Market;
use crate::stats::{MarketStats, StatsProvider};

pub(crate) type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Backoff settings shared by the stats and odds clients.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
}

impl RetryPolicy {
    pub(crate) fn from_config(config: &RateLimitConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_base_ms: config.backoff_base_ms,
            backoff_max_ms: config.backoff_max_ms,
        }
    }
}

pub struct StatsApiClient {
    http: reqwest::Client,
    base_url: String,
    league: String,
    api_key: Option<SecretString>,
    limiter: Arc<Limiter>,
    retry: RetryPolicy,
}

impl StatsApiClient {
    pub fn new(config: &AppConfig, secrets: &Secrets) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.providers.stats.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: config.providers.stats.base_url.trim_end_matches('/').to_string(),
            league: config.providers.stats.league.clone(),
            api_key: secrets.stats_api_key.clone(),
            limiter: create_rate_limiter(&config.rate_limit),
            retry: RetryPolicy::from_config(&config.rate_limit),
        })
    }
}

#[async_trait]
impl StatsProvider for StatsApiClient {
    #[instrument(skip(self), fields(market = %market.key()))]
    async fn market_stats(&self, market: Market) -> Result<MarketStats> {
        self.limiter.until_ready().await;

        let url = format!(
            "{}/leagues/{}/stats/{}",
            self.base_url,
            urlencoding::encode(&self.league),
            market.key()
        );

        let response: StatsResponse = with_retry(self.retry, || {
            let url = url.clone();
            async move {
                let mut request = self.http.get(&url);
                if let Some(key) = &self.api_key {
                    request = request.header("X-Api-Key", key.expose_secret());
                }

                let resp = request
                    .send()
                    .await
                    .map_err(|e| anyhow::anyhow!("HTTP error: {e}"))?;

                if !resp.status().is_success() {
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    return Err(anyhow::anyhow!("Stats API {status}: {body}"));
                }

                resp.json::<StatsResponse>()
                    .await
                    .map_err(|e| anyhow::anyhow!("Deserialization error: {e}"))
            }
        })
        .await
        .with_context(|| format!("Failed to fetch {} team logs", market.key()))?;

        let stats = convert_stats_response(market, response);
        info!(
            market = %market.key(),
            teams = stats.teams.len(),
            "Team logs fetched"
        );
        Ok(stats)
    }

    fn name(&self) -> &str {
        "stats-api"
    }
}

// === Rate Limiting ===

pub(crate) fn create_rate_limiter(config: &RateLimitConfig) -> Arc<Limiter> {
    let rps = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::new(10).unwrap());
    let burst = NonZeroU32::new(config.burst_size).unwrap_or(NonZeroU32::new(20).unwrap());

    let quota = Quota::per_second(rps).allow_burst(burst);
    Arc::new(RateLimiter::direct(quota))
}

// === Retry Logic ===

pub(crate) async fn with_retry<F, Fut, T>(policy: RetryPolicy, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                attempt += 1;

                let err_str = e.to_string();

                // Non-retryable errors
                if err_str.contains("401") || err_str.contains("403") || err_str.contains("auth") {
                    return Err(e.context("Authentication failure, not retrying"));
                }

                if attempt > policy.max_retries {
                    return Err(e.context(format!("Failed after {} retries", policy.max_retries)));
                }

                let backoff_ms = std::cmp::min(
                    policy.backoff_base_ms.saturating_mul(2u64.pow(attempt - 1)),
                    policy.backoff_max_ms,
                );

                warn!(
                    attempt,
                    backoff_ms,
                    error = %e,
                    "Retrying after transient failure"
                );

                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
        }
    }
}

// === Response Conversion ===

/// Stats feed payload. Every value field is optional; rows missing the
/// pieces we need are dropped during conversion.
#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(default)]
    teams: Vec<TeamLogResponse>,
}

#[derive(Debug, Deserialize)]
struct TeamLogResponse {
    name: Option<String>,
    #[serde(default)]
    matches: Vec<MatchResponse>,
}

#[derive(Debug, Deserialize)]
struct MatchResponse {
    opponent: Option<String>,
    /// ISO date string, e.g. "2025-08-12"
    date: Option<String>,
    #[serde(default)]
    home: bool,
    #[serde(rename = "for")]
    value_for: Option<f64>,
    #[serde(rename = "against")]
    value_against: Option<f64>,
}

fn convert_stats_response(market: Market, response: StatsResponse) -> MarketStats {
    let mut teams = HashMap::new();
    for team in response.teams {
        let Some(name) = team.name else { continue };
        let matches: Vec<MatchRecord> = team.matches.iter().filter_map(convert_match).collect();
        teams.insert(
            name.clone(),
            TeamMatchLog {
                team: name,
                matches,
            },
        );
    }
    MarketStats {
        market,
        teams,
        fetched_at: Utc::now(),
    }
}

fn convert_match(m: &MatchResponse) -> Option<MatchRecord> {
    let opponent = m.opponent.clone()?;
    let value_for = m.value_for?;
    let value_against = m.value_against?;
    let date = m
        .date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());

    Some(MatchRecord {
        opponent,
        date,
        is_home: m.home,
        value_for,
        value_against,
    })
}
