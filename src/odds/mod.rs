//! Bookmaker odds providers.
//!
//! Odds are optional throughout the pipeline: a provider may return
//! `None` for an unlisted fixture, and the analysis falls back to pure
//! pattern value when no price is available.

pub mod api;

use anyhow::Result;
use async_trait::async_trait;

use crate::markets::models::MatchOdds;

#[async_trait]
pub trait OddsProvider: Send + Sync {
    /// Latest prices for a fixture, `None` when the book has no listing.
    async fn match_odds(&self, home_team: &str, away_team: &str) -> Result<Option<MatchOdds>>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

/// Stand-in used when odds lookups are disabled in config.
pub struct NullOddsProvider;

#[async_trait]
impl OddsProvider for NullOddsProvider {
    async fn match_odds(&self, _home_team: &str, _away_team: &str) -> Result<Option<MatchOdds>> {
        Ok(None)
    }

    fn name(&self) -> &str {
        "disabled"
    }
}
