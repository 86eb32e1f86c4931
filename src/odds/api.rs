//! Bookmaker odds REST client.
//!
//! Shares the rate-limiter and retry plumbing with the stats client.
//! A fixture the book does not list is a normal outcome, not an error.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::{AppConfig, Secrets};
use crate::markets::models::{BinaryPrices, MatchOdds, TotalsLine};
use crate::markets::Market;
use crate::odds::OddsProvider;
use crate::stats::api::{create_rate_limiter, with_retry, Limiter, RetryPolicy};

pub struct OddsApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    limiter: Arc<Limiter>,
    retry: RetryPolicy,
}

impl OddsApiClient {
    pub fn new(config: &AppConfig, secrets: &Secrets) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.providers.odds.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: config.providers.odds.base_url.trim_end_matches('/').to_string(),
            api_key: secrets.odds_api_key.clone(),
            limiter: create_rate_limiter(&config.rate_limit),
            retry: RetryPolicy::from_config(&config.rate_limit),
        })
    }
}

#[async_trait]
impl OddsProvider for OddsApiClient {
    #[instrument(skip(self))]
    async fn match_odds(&self, home_team: &str, away_team: &str) -> Result<Option<MatchOdds>> {
        self.limiter.until_ready().await;

        let url = format!("{}/odds", self.base_url);

        let response: Option<OddsResponse> = with_retry(self.retry, || {
            let url = url.clone();
            async move {
                let mut request = self
                    .http
                    .get(&url)
                    .query(&[("home", home_team), ("away", away_team)]);
                if let Some(key) = &self.api_key {
                    request = request.header("X-Api-Key", key.expose_secret());
                }

                let resp = request
                    .send()
                    .await
                    .map_err(|e| anyhow::anyhow!("HTTP error: {e}"))?;

                if resp.status() == reqwest::StatusCode::NOT_FOUND {
                    return Ok(None);
                }
                if !resp.status().is_success() {
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    return Err(anyhow::anyhow!("Odds API {status}: {body}"));
                }

                resp.json::<OddsResponse>()
                    .await
                    .map(Some)
                    .map_err(|e| anyhow::anyhow!("Deserialization error: {e}"))
            }
        })
        .await
        .with_context(|| format!("Failed to fetch odds for {home_team} vs {away_team}"))?;

        let Some(response) = response else {
            debug!(home = home_team, away = away_team, "Fixture not listed by the book");
            return Ok(None);
        };

        Ok(Some(convert_odds_response(home_team, away_team, response)))
    }

    fn name(&self) -> &str {
        "odds-api"
    }
}

// === Response Conversion ===

#[derive(Debug, Deserialize)]
struct OddsResponse {
    home_team: Option<String>,
    away_team: Option<String>,
    #[serde(default)]
    totals: Vec<TotalsLineResponse>,
    btts: Option<BinaryPricesResponse>,
}

#[derive(Debug, Deserialize)]
struct TotalsLineResponse {
    market: Option<String>,
    line: Option<f64>,
    over: Option<f64>,
    under: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct BinaryPricesResponse {
    yes: Option<f64>,
    no: Option<f64>,
}

fn convert_odds_response(home_team: &str, away_team: &str, resp: OddsResponse) -> MatchOdds {
    let totals = resp
        .totals
        .into_iter()
        .filter_map(|row| {
            let market = Market::from_key(row.market.as_deref()?)?;
            Some(TotalsLine {
                market,
                line: row.line?,
                over: row.over?,
                under: row.under?,
            })
        })
        .collect();

    let btts = resp.btts.and_then(|prices| {
        Some(BinaryPrices {
            yes: prices.yes?,
            no: prices.no?,
        })
    });

    MatchOdds {
        home_team: resp.home_team.unwrap_or_else(|| home_team.to_string()),
        away_team: resp.away_team.unwrap_or_else(|| away_team.to_string()),
        fetched_at: Utc::now(),
        totals,
        btts,
    }
}
