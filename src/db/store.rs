use std::collections::HashMap;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};

use crate::markets::models::TeamMatchLog;
use crate::markets::Market;
use crate::stats::MarketStats;

pub struct Store {
    pool: SqlitePool,
}

/// One completed analysis, recorded for the run history.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RunRecord {
    pub id: Option<i64>,
    pub kind: String,
    pub home_team: String,
    pub away_team: Option<String>,
    pub insights_found: i64,
    pub high_confidence: i64,
    pub summary: Option<String>,
    pub duration_ms: Option<i64>,
    pub created_at: Option<String>,
}

impl Store {
    pub async fn new(database_path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{database_path}"))
            .context("Invalid database path")?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        let store = Self { pool };
        store.migrate().await?;

        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        let migration_sql = include_str!("../../migrations/001_init.sql");
        // Execute each statement separately (sqlx doesn't support multiple statements in one call)
        for statement in migration_sql.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                sqlx::query(trimmed)
                    .execute(&self.pool)
                    .await
                    .with_context(|| format!("Failed to execute migration: {trimmed}"))?;
            }
        }
        Ok(())
    }

    // --- Snapshot operations ---

    pub async fn save_snapshot(&self, stats: &MarketStats) -> Result<()> {
        let payload =
            serde_json::to_string(&stats.teams).context("Failed to serialize stats snapshot")?;

        sqlx::query(
            "INSERT INTO stats_snapshots (market, payload, fetched_at) VALUES (?, ?, ?)
             ON CONFLICT(market) DO UPDATE SET payload = excluded.payload, fetched_at = excluded.fetched_at",
        )
        .bind(stats.market.key())
        .bind(payload)
        .bind(stats.fetched_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save stats snapshot")?;

        Ok(())
    }

    /// Load a cached snapshot no older than `ttl_minutes` as of `now`.
    /// `now` comes from the caller rather than the wall clock so expiry
    /// is testable.
    pub async fn load_snapshot(
        &self,
        market: Market,
        ttl_minutes: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<MarketStats>> {
        let row: Option<(String, String)> = sqlx::query_as(
            "SELECT payload, fetched_at FROM stats_snapshots
             WHERE market = ? AND (julianday(?) - julianday(fetched_at)) * 1440.0 <= ?",
        )
        .bind(market.key())
        .bind(now.to_rfc3339())
        .bind(ttl_minutes as f64)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load stats snapshot")?;

        let Some((payload, fetched_at)) = row else {
            return Ok(None);
        };

        let teams: HashMap<String, TeamMatchLog> =
            serde_json::from_str(&payload).context("Corrupt stats snapshot payload")?;
        let fetched_at = DateTime::parse_from_rfc3339(&fetched_at)
            .context("Corrupt stats snapshot timestamp")?
            .with_timezone(&Utc);

        Ok(Some(MarketStats {
            market,
            teams,
            fetched_at,
        }))
    }

    // --- Run operations ---

    pub async fn record_run(&self, run: &RunRecord) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO runs (kind, home_team, away_team, insights_found, high_confidence, summary, duration_ms)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&run.kind)
        .bind(&run.home_team)
        .bind(&run.away_team)
        .bind(run.insights_found)
        .bind(run.high_confidence)
        .bind(&run.summary)
        .bind(run.duration_ms)
        .execute(&self.pool)
        .await
        .context("Failed to record run")?;

        Ok(result.last_insert_rowid())
    }

    pub async fn recent_runs(&self, limit: i64) -> Result<Vec<RunRecord>> {
        let runs = sqlx::query_as::<_, RunRecord>("SELECT * FROM runs ORDER BY id DESC LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch recent runs")?;
        Ok(runs)
    }
}
