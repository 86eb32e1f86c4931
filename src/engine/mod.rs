//! Analysis engine.
//!
//! Orchestrates the full pipeline: fetch season stats and fixture odds,
//! detect patterns per team and market, grade every candidate against the
//! opposition, resolve conflicts, and record the run.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::analysis::{dedup, patterns, threshold};
use crate::context::btts::{self, TeamGoalRates};
use crate::context::matchup::{self, OppositionProfile};
use crate::context::{ContextualInsight, DataQuality, MatchContext, StrengthOfMatch};
use crate::db::store::{RunRecord, Store};
use crate::markets::models::{
    BettingInsight, ConfidenceLevel, MatchOdds, TeamMatchLog, ThresholdAnalysis,
};
use crate::markets::Market;
use crate::odds::OddsProvider;
use crate::resolver;
use crate::stats::{MarketStats, StatsProvider};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("a fixture needs two different teams")]
    SameTeam,
    #[error("no match data found for {0}")]
    UnknownTeam(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Season-wide pattern profile for a single team.
#[derive(Debug, Clone, Serialize)]
pub struct TeamReport {
    pub team: String,
    pub insights: Vec<BettingInsight>,
    pub thresholds: Vec<ThresholdAnalysis>,
    pub generated_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Resolved, opposition-graded insight list for one fixture.
#[derive(Debug, Clone, Serialize)]
pub struct FixtureReport {
    pub home_team: String,
    pub away_team: String,
    pub insights: Vec<ContextualInsight>,
    pub summary: String,
    pub duplicates_dropped: usize,
    pub conflicts_dropped: usize,
    pub generated_at: DateTime<Utc>,
    pub duration_ms: u64,
}

pub struct InsightsEngine {
    stats: Arc<dyn StatsProvider>,
    odds: Arc<dyn OddsProvider>,
    store: Option<Store>,
}

impl InsightsEngine {
    pub fn new(stats: Arc<dyn StatsProvider>, odds: Arc<dyn OddsProvider>) -> Self {
        Self {
            stats,
            odds,
            store: None,
        }
    }

    /// Enable run bookkeeping.
    pub fn with_store(mut self, store: Store) -> Self {
        self.store = Some(store);
        self
    }

    #[instrument(skip(self))]
    pub async fn analyze_fixture(
        &self,
        home_team: &str,
        away_team: &str,
    ) -> Result<FixtureReport, EngineError> {
        let start = Instant::now();

        let home_input = home_team.trim();
        let away_input = away_team.trim();
        if home_input.is_empty() {
            return Err(EngineError::UnknownTeam(home_team.to_string()));
        }
        if away_input.is_empty() {
            return Err(EngineError::UnknownTeam(away_team.to_string()));
        }
        if home_input.eq_ignore_ascii_case(away_input) {
            return Err(EngineError::SameTeam);
        }

        let (season, odds) = tokio::join!(
            self.fetch_season(),
            self.fetch_odds(home_input, away_input)
        );
        let season = season?;

        // Carry the feed's spelling from here on so team comparisons are exact
        let (home, away) = match (season.canonical(home_input), season.canonical(away_input)) {
            (None, None) => {
                return Err(EngineError::UnknownTeam(format!(
                    "{home_input} or {away_input}"
                )))
            }
            (h, a) => (
                h.unwrap_or_else(|| home_input.to_string()),
                a.unwrap_or_else(|| away_input.to_string()),
            ),
        };

        let mut candidates = team_candidates(&season, &home, odds.as_ref());
        candidates.extend(team_candidates(&season, &away, odds.as_ref()));
        let candidates = dedup::filter_redundant(candidates);

        let contextualized: Vec<ContextualInsight> = candidates
            .into_iter()
            .map(|insight| contextualize(insight, &season, &home, &away))
            .collect();

        let resolved = resolver::resolve(contextualized);

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            home = %home,
            away = %away,
            insights = resolved.insights.len(),
            dropped = resolved.duplicates_dropped + resolved.conflicts_dropped,
            duration_ms,
            "Fixture analysis complete"
        );

        let report = FixtureReport {
            home_team: home,
            away_team: away,
            insights: resolved.insights,
            summary: resolved.summary,
            duplicates_dropped: resolved.duplicates_dropped,
            conflicts_dropped: resolved.conflicts_dropped,
            generated_at: Utc::now(),
            duration_ms,
        };

        self.record_fixture_run(&report).await;

        Ok(report)
    }

    #[instrument(skip(self))]
    pub async fn analyze_team(&self, team: &str) -> Result<TeamReport, EngineError> {
        let start = Instant::now();

        let input = team.trim();
        if input.is_empty() {
            return Err(EngineError::UnknownTeam(team.to_string()));
        }

        let season = self.fetch_season().await?;
        let team = season
            .canonical(input)
            .ok_or_else(|| EngineError::UnknownTeam(input.to_string()))?;

        let mut insights = dedup::filter_redundant(team_candidates(&season, &team, None));
        resolver::rank(&mut insights);

        let thresholds: Vec<ThresholdAnalysis> = Market::fetched()
            .filter_map(|market| season.log(market, &team).map(|log| (market, log)))
            .flat_map(|(market, log)| threshold::sweep(market, &log.matches, None))
            .collect();

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            team = %team,
            insights = insights.len(),
            duration_ms,
            "Team analysis complete"
        );

        let report = TeamReport {
            team,
            insights,
            thresholds,
            generated_at: Utc::now(),
            duration_ms,
        };

        self.record_team_run(&report).await;

        Ok(report)
    }

    /// Run history, newest first. Empty when bookkeeping is disabled.
    pub async fn recent_runs(&self, limit: i64) -> Result<Vec<RunRecord>, EngineError> {
        match &self.store {
            Some(store) => Ok(store.recent_runs(limit).await?),
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_season(&self) -> Result<SeasonStats, EngineError> {
        let (goals, cards, corners, fouls, shots_on_target, total_shots) = tokio::join!(
            self.stats.market_stats(Market::Goals),
            self.stats.market_stats(Market::Cards),
            self.stats.market_stats(Market::Corners),
            self.stats.market_stats(Market::Fouls),
            self.stats.market_stats(Market::ShotsOnTarget),
            self.stats.market_stats(Market::TotalShots),
        );

        let mut by_market = HashMap::new();
        for stats in [goals?, cards?, corners?, fouls?, shots_on_target?, total_shots?] {
            by_market.insert(stats.market, stats);
        }
        Ok(SeasonStats { by_market })
    }

    /// A dark book is not an analysis failure; degrade to pattern value.
    async fn fetch_odds(&self, home: &str, away: &str) -> Option<MatchOdds> {
        match self.odds.match_odds(home, away).await {
            Ok(odds) => odds,
            Err(e) => {
                warn!(error = %e, provider = self.odds.name(), "Odds lookup failed; proceeding without prices");
                None
            }
        }
    }

    async fn record_fixture_run(&self, report: &FixtureReport) {
        let Some(store) = &self.store else { return };
        let high = report
            .insights
            .iter()
            .filter(|c| c.insight.confidence == ConfidenceLevel::High)
            .count();
        let run = RunRecord {
            id: None,
            kind: "fixture".to_string(),
            home_team: report.home_team.clone(),
            away_team: Some(report.away_team.clone()),
            insights_found: report.insights.len() as i64,
            high_confidence: high as i64,
            summary: Some(report.summary.clone()),
            duration_ms: Some(report.duration_ms as i64),
            created_at: None,
        };
        if let Err(e) = store.record_run(&run).await {
            warn!(error = %e, "Failed to record fixture run");
        }
    }

    async fn record_team_run(&self, report: &TeamReport) {
        let Some(store) = &self.store else { return };
        let high = report
            .insights
            .iter()
            .filter(|i| i.confidence == ConfidenceLevel::High)
            .count();
        let run = RunRecord {
            id: None,
            kind: "team".to_string(),
            home_team: report.team.clone(),
            away_team: None,
            insights_found: report.insights.len() as i64,
            high_confidence: high as i64,
            summary: None,
            duration_ms: Some(report.duration_ms as i64),
            created_at: None,
        };
        if let Err(e) = store.record_run(&run).await {
            warn!(error = %e, "Failed to record team run");
        }
    }
}

struct SeasonStats {
    by_market: HashMap<Market, MarketStats>,
}

impl SeasonStats {
    fn log(&self, market: Market, team: &str) -> Option<&TeamMatchLog> {
        self.by_market.get(&market).and_then(|stats| stats.team(team))
    }

    /// Resolve user input to the feed's spelling of the team name.
    fn canonical(&self, team: &str) -> Option<String> {
        self.by_market
            .values()
            .find_map(|stats| stats.team(team))
            .map(|log| log.team.clone())
    }
}

fn team_candidates(
    season: &SeasonStats,
    team: &str,
    odds: Option<&MatchOdds>,
) -> Vec<BettingInsight> {
    let mut candidates = Vec::new();
    for market in Market::fetched() {
        if let Some(log) = season.log(market, team) {
            candidates.extend(patterns::detect_market(team, market, &log.matches, odds));
        }
    }
    // Both-teams-to-score patterns read off the goals log
    if let Some(goals) = season.log(Market::Goals, team) {
        candidates.extend(patterns::detect_market(
            team,
            Market::BothTeamsToScore,
            &goals.matches,
            odds,
        ));
    }
    candidates
}

fn contextualize(
    insight: BettingInsight,
    season: &SeasonStats,
    home_team: &str,
    away_team: &str,
) -> ContextualInsight {
    let team_is_home = insight.team == home_team;
    let opponent = if team_is_home { away_team } else { home_team };

    let evaluated = if insight.market == Market::BothTeamsToScore {
        let home_rates = goal_rates(season, home_team, true);
        let away_rates = goal_rates(season, away_team, false);
        btts::evaluate(&insight, &home_rates, &away_rates)
    } else {
        let profile = match season.log(insight.market, opponent) {
            Some(log) => OppositionProfile::from_log(log, team_is_home),
            None => OppositionProfile::missing(opponent, team_is_home),
        };
        matchup::evaluate(&insight, &profile)
    };

    let context = match evaluated {
        Ok(context) => context,
        Err(e) => {
            warn!(
                team = %insight.team,
                market = %insight.market.key(),
                error = %e,
                "Context evaluation failed"
            );
            fallback_context(&insight, opponent, team_is_home)
        }
    };

    ContextualInsight { insight, context }
}

fn goal_rates(season: &SeasonStats, team: &str, at_home: bool) -> TeamGoalRates {
    match season.log(Market::Goals, team) {
        Some(log) => TeamGoalRates::from_log(log, at_home),
        None => TeamGoalRates::from_log(
            &TeamMatchLog {
                team: team.to_string(),
                matches: Vec::new(),
            },
            at_home,
        ),
    }
}

fn fallback_context(insight: &BettingInsight, opponent: &str, is_home: bool) -> MatchContext {
    MatchContext {
        opponent: opponent.to_string(),
        is_home,
        opposition_allows_avg: 0.0,
        opposition_matches: 0,
        venue_specific: false,
        data_quality: DataQuality::Insufficient,
        strength: StrengthOfMatch::Poor,
        recommendation: format!("Context unavailable for {}", insight.outcome),
    }
}
