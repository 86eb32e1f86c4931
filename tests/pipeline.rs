//! Integration tests for the full analysis pipeline: scripted season
//! stats in, ranked and opposition-graded insights out.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;

use betform::context::{DataQuality, StrengthOfMatch};
use betform::db::Store;
use betform::engine::{FixtureReport, InsightsEngine};
use betform::markets::models::{MatchOdds, MatchRecord, Side, TeamMatchLog, TotalsLine};
use betform::markets::{Comparison, Market};
use betform::odds::{NullOddsProvider, OddsProvider};
use betform::stats::{MarketStats, StatsProvider};

// ──────────────────────────────────────────
// Scripted providers and log builders
// ──────────────────────────────────────────

struct ScriptedStats {
    markets: HashMap<Market, MarketStats>,
}

#[async_trait]
impl StatsProvider for ScriptedStats {
    async fn market_stats(&self, market: Market) -> Result<MarketStats> {
        Ok(self.markets.get(&market).cloned().unwrap_or(MarketStats {
            market,
            teams: HashMap::new(),
            fetched_at: Utc::now(),
        }))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

struct FixedOdds(MatchOdds);

#[async_trait]
impl OddsProvider for FixedOdds {
    async fn match_odds(&self, _home_team: &str, _away_team: &str) -> Result<Option<MatchOdds>> {
        Ok(Some(self.0.clone()))
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Log rows are (value_for, value_against), newest first, alternating
/// home/away starting at home.
fn team_log(team: &str, rows: &[(f64, f64)]) -> TeamMatchLog {
    TeamMatchLog {
        team: team.to_string(),
        matches: rows
            .iter()
            .enumerate()
            .map(|(i, &(value_for, value_against))| MatchRecord {
                opponent: format!("Opponent {i}"),
                date: None,
                is_home: i % 2 == 0,
                value_for,
                value_against,
            })
            .collect(),
    }
}

fn market_stats(market: Market, logs: Vec<TeamMatchLog>) -> MarketStats {
    MarketStats {
        market,
        teams: logs.into_iter().map(|l| (l.team.clone(), l)).collect(),
        fetched_at: Utc::now(),
    }
}

fn engine(markets: HashMap<Market, MarketStats>) -> InsightsEngine {
    InsightsEngine::new(
        Arc::new(ScriptedStats { markets }),
        Arc::new(NullOddsProvider),
    )
}

fn season_of(per_market: Vec<MarketStats>) -> HashMap<Market, MarketStats> {
    per_market.into_iter().map(|s| (s.market, s)).collect()
}

// ──────────────────────────────────────────
// Pattern detection through the engine
// ──────────────────────────────────────────

#[tokio::test]
async fn seven_match_streak_reports_its_run() {
    // Seven straight matches over 2.5 cards, then three quiet ones
    let cards = team_log(
        "Arsenal",
        &[
            (3.0, 2.0),
            (3.0, 1.0),
            (4.0, 2.0),
            (3.0, 3.0),
            (5.0, 2.0),
            (3.0, 1.0),
            (4.0, 2.0),
            (1.0, 2.0),
            (2.0, 1.0),
            (1.0, 3.0),
        ],
    );
    let engine = engine(season_of(vec![market_stats(Market::Cards, vec![cards])]));
    let report = engine.analyze_team("Arsenal").await.unwrap();

    // The shallower over lines collapse into the deepest one that holds
    assert_eq!(report.insights.len(), 1);
    let insight = &report.insights[0];
    assert_eq!(insight.outcome, "Over 2.5 Cards");
    assert!(insight.is_streak);
    assert_eq!(insight.streak_length, Some(7));
    assert_eq!(insight.matches_analyzed, 7);
    assert_eq!(insight.hit_rate, 100.0);
    assert!((insight.average_value - 25.0 / 7.0).abs() < 1e-9);
    // Season-wide the line only hit 70%, which caps the confidence score
    assert!((insight.confidence_score - 70.0).abs() < 1e-9);

    // The threshold profile still reads every cards line
    assert_eq!(report.thresholds.len(), 5);
    let line = report
        .thresholds
        .iter()
        .find(|t| t.threshold == 2.5)
        .unwrap();
    assert_eq!(line.bet_type, Comparison::Over);
    assert!((line.percentage - 70.0).abs() < 1e-9);
}

#[tokio::test]
async fn perfect_window_is_an_insight_without_streak_status() {
    // Five of the last five over 2.5, but the run stops there
    let cards = team_log(
        "Arsenal",
        &[
            (3.0, 2.0),
            (4.0, 1.0),
            (3.0, 2.0),
            (5.0, 1.0),
            (3.0, 2.0),
            (1.0, 1.0),
            (3.0, 2.0),
            (1.0, 1.0),
            (3.0, 2.0),
            (1.0, 1.0),
        ],
    );
    let engine = engine(season_of(vec![market_stats(Market::Cards, vec![cards])]));
    let report = engine.analyze_team("Arsenal").await.unwrap();

    assert_eq!(report.insights.len(), 1);
    let insight = &report.insights[0];
    assert_eq!(insight.threshold, 2.5);
    assert!(!insight.is_streak);
    assert_eq!(insight.streak_length, None);
    assert_eq!(insight.matches_analyzed, 5);
    assert!((insight.average_value - 3.6).abs() < 1e-9);
}

#[tokio::test]
async fn four_of_five_recent_is_noise() {
    // One miss inside the recency window and no line sustains a pattern
    let cards = team_log(
        "Arsenal",
        &[
            (6.0, 2.0),
            (4.0, 1.0),
            (0.0, 2.0),
            (4.0, 1.0),
            (6.0, 2.0),
            (4.0, 1.0),
            (0.0, 2.0),
            (0.0, 1.0),
            (0.0, 2.0),
            (0.0, 1.0),
        ],
    );
    let engine = engine(season_of(vec![market_stats(Market::Cards, vec![cards])]));
    let report = engine.analyze_team("Arsenal").await.unwrap();

    assert!(report.insights.is_empty());
    // The threshold profile is unaffected by pattern detection
    assert_eq!(report.thresholds.len(), 5);
}

#[tokio::test]
async fn sweep_wide_patterns_collapse_to_one_line() {
    // Nine corners every match clears the whole sweep; only 8.5 survives
    let corners = team_log("Arsenal", &[(9.0, 4.0); 10]);
    let engine = engine(season_of(vec![market_stats(Market::Corners, vec![corners])]));
    let report = engine.analyze_team("Arsenal").await.unwrap();

    assert_eq!(report.insights.len(), 1);
    assert_eq!(report.insights[0].market, Market::Corners);
    assert_eq!(report.insights[0].threshold, 8.5);
    assert_eq!(report.insights[0].comparison, Comparison::Over);
}

// ──────────────────────────────────────────
// Fixture grading and conflict resolution
// ──────────────────────────────────────────

#[tokio::test]
async fn fixture_grading_reads_the_opposition_venue() {
    // Arsenal land 13+ fouls every week; Leeds concede heavily on the road
    let arsenal = team_log(
        "Arsenal",
        &[
            (14.0, 10.0),
            (13.0, 9.0),
            (15.0, 11.0),
            (14.0, 10.0),
            (13.0, 9.0),
            (14.0, 10.0),
            (15.0, 11.0),
        ],
    );
    let leeds = team_log(
        "Leeds",
        &[
            (6.0, 5.0),
            (9.0, 15.0),
            (6.0, 5.0),
            (9.0, 14.0),
            (6.0, 5.0),
            (9.0, 15.0),
            (6.0, 5.0),
            (9.0, 14.0),
            (6.0, 5.0),
            (9.0, 15.0),
        ],
    );
    let engine = engine(season_of(vec![market_stats(
        Market::Fouls,
        vec![arsenal, leeds],
    )]));
    let report = engine.analyze_fixture("Arsenal", "Leeds").await.unwrap();

    assert_eq!(report.insights.len(), 1);
    let contextual = &report.insights[0];
    assert_eq!(contextual.insight.outcome, "12+ Fouls");
    assert_eq!(contextual.insight.team, "Arsenal");

    // The context reads Leeds's five away matches, not the full log
    let ctx = &contextual.context;
    assert_eq!(ctx.opponent, "Leeds");
    assert!(ctx.is_home);
    assert!(ctx.venue_specific);
    assert_eq!(ctx.opposition_matches, 5);
    assert!((ctx.opposition_allows_avg - 14.6).abs() < 1e-9);
    assert_eq!(ctx.data_quality, DataQuality::Fair);
    assert_eq!(ctx.strength, StrengthOfMatch::Excellent);
    assert!(ctx.recommendation.contains("Excellent matchup"));

    assert_eq!(report.duplicates_dropped, 0);
    assert_eq!(report.conflicts_dropped, 0);
    assert!(report.summary.contains("1 high"));
}

#[tokio::test]
async fn btts_disagreement_keeps_the_stronger_side() {
    // Both teams have scored in every Arsenal match; Leeds kept it
    // one-sided for seven straight before three open games
    let arsenal_goals = team_log(
        "Arsenal",
        &[
            (2.0, 1.0),
            (1.0, 2.0),
            (3.0, 1.0),
            (2.0, 2.0),
            (1.0, 1.0),
            (2.0, 1.0),
            (1.0, 2.0),
            (2.0, 1.0),
            (1.0, 1.0),
            (2.0, 2.0),
        ],
    );
    let leeds_goals = team_log(
        "Leeds",
        &[
            (0.0, 2.0),
            (2.0, 0.0),
            (0.0, 1.0),
            (1.0, 0.0),
            (0.0, 3.0),
            (3.0, 0.0),
            (0.0, 2.0),
            (1.0, 1.0),
            (2.0, 2.0),
            (1.0, 1.0),
        ],
    );
    let engine = engine(season_of(vec![market_stats(
        Market::Goals,
        vec![arsenal_goals, leeds_goals],
    )]));
    let report = engine.analyze_fixture("Arsenal", "Leeds").await.unwrap();

    // The weaker No signal is removed outright
    assert_eq!(report.conflicts_dropped, 1);
    assert!(report
        .insights
        .iter()
        .all(|c| c.insight.side != Some(Side::No)));
    assert!(report.summary.contains("conflicting signal(s) removed"));

    let yes = report
        .insights
        .iter()
        .find(|c| c.insight.side == Some(Side::Yes))
        .expect("the stronger side should survive");
    assert_eq!(yes.insight.team, "Arsenal");
    assert_eq!(yes.insight.streak_length, Some(10));
    // Venue-aware projection: 1.0 home / 1.4 away expected
    assert_eq!(yes.context.strength, StrengthOfMatch::Good);
    assert!(yes.context.venue_specific);
}

// ──────────────────────────────────────────
// Odds integration
// ──────────────────────────────────────────

#[tokio::test]
async fn quoted_prices_tilt_the_value_ranking() {
    let cards_season = || {
        let arsenal = team_log(
            "Arsenal",
            &[
                (3.0, 2.0),
                (4.0, 2.0),
                (3.0, 2.0),
                (4.0, 2.0),
                (3.0, 2.0),
                (4.0, 2.0),
                (3.0, 2.0),
                (4.0, 2.0),
                (3.0, 2.0),
                (4.0, 2.0),
            ],
        );
        let chelsea = team_log(
            "Chelsea",
            &[
                (2.0, 3.0),
                (0.0, 3.0),
                (2.0, 3.0),
                (0.0, 3.0),
                (2.0, 3.0),
                (0.0, 3.0),
                (2.0, 3.0),
                (0.0, 3.0),
                (2.0, 3.0),
                (0.0, 3.0),
            ],
        );
        season_of(vec![market_stats(Market::Cards, vec![arsenal, chelsea])])
    };
    let over_price_ten = MatchOdds {
        home_team: "Arsenal".to_string(),
        away_team: "Chelsea".to_string(),
        fetched_at: Utc::now(),
        totals: vec![TotalsLine {
            market: Market::Cards,
            line: 2.5,
            over: 10.0,
            under: 1.01,
        }],
        btts: None,
    };

    let without = engine(cards_season())
        .analyze_fixture("Arsenal", "Chelsea")
        .await
        .unwrap();
    let with = InsightsEngine::new(
        Arc::new(ScriptedStats {
            markets: cards_season(),
        }),
        Arc::new(FixedOdds(over_price_ten)),
    )
    .analyze_fixture("Arsenal", "Chelsea")
    .await
    .unwrap();

    let over_value = |report: &FixtureReport| {
        report
            .insights
            .iter()
            .find(|c| {
                c.insight.team == "Arsenal"
                    && c.insight.comparison == Comparison::Over
                    && c.insight.threshold == 2.5
            })
            .map(|c| c.insight.value)
            .expect("over 2.5 cards should be detected")
    };

    // A 100% pattern priced at 10.0 is a huge edge: full bonus applied
    let bonus = over_value(&with) - over_value(&without);
    assert!((bonus - 25.0).abs() < 1e-9);
    assert_eq!(with.insights[0].insight.outcome, "Over 2.5 Cards");

    // Chelsea's under is quoted at 1.01, below the sanity floor: untouched
    let under_value = |report: &FixtureReport| {
        report
            .insights
            .iter()
            .find(|c| c.insight.team == "Chelsea" && c.insight.comparison == Comparison::Under)
            .map(|c| c.insight.value)
            .expect("Chelsea under should be detected")
    };
    assert!((under_value(&with) - under_value(&without)).abs() < 1e-9);
}

// ──────────────────────────────────────────
// Run bookkeeping
// ──────────────────────────────────────────

#[tokio::test]
async fn run_history_captures_both_analysis_kinds() {
    let arsenal = team_log("Arsenal", &[(3.0, 2.0); 10]);
    let chelsea = team_log("Chelsea", &[(1.0, 3.0); 10]);
    let season = season_of(vec![market_stats(Market::Cards, vec![arsenal, chelsea])]);

    let store = Store::new(":memory:").await.unwrap();
    let engine = engine(season).with_store(store);

    let team_report = engine.analyze_team("Arsenal").await.unwrap();
    let fixture_report = engine.analyze_fixture("Arsenal", "Chelsea").await.unwrap();

    let runs = engine.recent_runs(10).await.unwrap();
    assert_eq!(runs.len(), 2);

    // Newest first: the fixture run sits on top
    assert_eq!(runs[0].kind, "fixture");
    assert_eq!(runs[0].away_team.as_deref(), Some("Chelsea"));
    assert_eq!(runs[0].insights_found, fixture_report.insights.len() as i64);
    assert_eq!(runs[0].summary.as_deref(), Some(fixture_report.summary.as_str()));

    assert_eq!(runs[1].kind, "team");
    assert_eq!(runs[1].home_team, "Arsenal");
    assert_eq!(runs[1].away_team, None);
    assert_eq!(runs[1].insights_found, team_report.insights.len() as i64);
}
