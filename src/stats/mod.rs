//! Team statistics providers.
//!
//! A [`StatsProvider`] hands back one season of per-team match logs for a
//! single market. The REST implementation lives in [`api`]; the caching
//! wrapper keeps recent snapshots in SQLite so a fixture analysis does not
//! hammer the upstream feed once per market.

pub mod api;

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::db::Store;
use crate::markets::models::TeamMatchLog;
use crate::markets::Market;

/// One market's match logs for every team in the competition.
#[derive(Debug, Clone)]
pub struct MarketStats {
    pub market: Market,
    pub teams: HashMap<String, TeamMatchLog>,
    pub fetched_at: DateTime<Utc>,
}

impl MarketStats {
    /// Case-insensitive team lookup; feed spellings vary in casing.
    pub fn team(&self, name: &str) -> Option<&TeamMatchLog> {
        let wanted = name.trim();
        if let Some(log) = self.teams.get(wanted) {
            return Some(log);
        }
        self.teams
            .values()
            .find(|log| log.team.eq_ignore_ascii_case(wanted))
    }
}

#[async_trait]
pub trait StatsProvider: Send + Sync {
    /// Fetch the full team-log table for one market.
    async fn market_stats(&self, market: Market) -> Result<MarketStats>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

/// Wraps a provider with a SQLite snapshot cache.
pub struct CachingProvider<P> {
    inner: P,
    store: Store,
    ttl_minutes: i64,
    clock: fn() -> DateTime<Utc>,
}

impl<P: StatsProvider> CachingProvider<P> {
    pub fn new(inner: P, store: Store, ttl_minutes: i64) -> Self {
        Self {
            inner,
            store,
            ttl_minutes,
            clock: Utc::now,
        }
    }

    /// Test constructor with a pinned clock.
    #[cfg(test)]
    pub fn with_clock(inner: P, store: Store, ttl_minutes: i64, clock: fn() -> DateTime<Utc>) -> Self {
        Self {
            inner,
            store,
            ttl_minutes,
            clock,
        }
    }
}

#[async_trait]
impl<P: StatsProvider> StatsProvider for CachingProvider<P> {
    async fn market_stats(&self, market: Market) -> Result<MarketStats> {
        let now = (self.clock)();
        if let Some(cached) = self.store.load_snapshot(market, self.ttl_minutes, now).await? {
            debug!(market = %market.key(), "Serving team logs from cache");
            return Ok(cached);
        }

        let fresh = self.inner.market_stats(market).await?;
        self.store.save_snapshot(&fresh).await?;
        Ok(fresh)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
