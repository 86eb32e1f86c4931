//! Streak and rolling-window pattern detection.
//!
//! Two rules, checked in priority order against a hit series on a team's
//! log (newest first):
//!
//! 1. An unbroken run of hits from the most recent match, at least seven
//!    long, becomes a streak insight covering exactly the run.
//! 2. Otherwise, a perfect recency window (five of the last five) becomes
//!    a window insight. Four of five is noise, not a pattern.

use uuid::Uuid;

use crate::analysis::scoring;
use crate::markets::models::{BettingInsight, InsightMatch, MatchOdds, MatchRecord, Side};
use crate::markets::{Comparison, Market, MarketKind};

/// Minimum unbroken run for a streak insight.
pub const STREAK_MIN: usize = 7;

/// Most evidence matches attached to an insight payload.
const EVIDENCE_CAP: usize = 10;

/// Detect a pattern for one threshold line.
pub fn detect(
    team: &str,
    market: Market,
    log: &[MatchRecord],
    threshold: f64,
    comparison: Comparison,
    odds: Option<f64>,
) -> Option<BettingInsight> {
    let hits: Vec<bool> = log
        .iter()
        .map(|m| comparison.hit(m.value_for, threshold))
        .collect();
    detect_series(
        team,
        market,
        log,
        &hits,
        SeriesSpec {
            threshold,
            comparison,
            side: None,
            odds,
        },
    )
}

/// Detect BTTS patterns from the goals log.
///
/// Both-teams-scored is read straight off each goals record; the Yes and
/// No sides are scanned independently and can in principle never both fire.
pub fn detect_btts(
    team: &str,
    goals_log: &[MatchRecord],
    odds: Option<&MatchOdds>,
) -> Vec<BettingInsight> {
    let flags: Vec<bool> = goals_log
        .iter()
        .map(|m| m.value_for > 0.0 && m.value_against > 0.0)
        .collect();

    let mut insights = Vec::new();
    for side in [Side::Yes, Side::No] {
        let series: Vec<bool> = match side {
            Side::Yes => flags.clone(),
            Side::No => flags.iter().map(|f| !f).collect(),
        };
        let price = odds.and_then(|o| o.btts_price(side));
        if let Some(insight) = detect_series(
            team,
            Market::BothTeamsToScore,
            goals_log,
            &series,
            SeriesSpec {
                threshold: 0.5,
                comparison: Comparison::Binary,
                side: Some(side),
                odds: price,
            },
        ) {
            insights.push(insight);
        }
    }
    insights
}

/// Every pattern a (team, market) pair yields across its threshold sweep.
pub fn detect_market(
    team: &str,
    market: Market,
    log: &[MatchRecord],
    odds: Option<&MatchOdds>,
) -> Vec<BettingInsight> {
    let price = |cmp: Comparison, t: f64| odds.and_then(|o| o.price_for(market, t, cmp));

    match market.kind() {
        MarketKind::Binary => detect_btts(team, log, odds),
        MarketKind::DecimalSweep { thresholds } => {
            let mut insights = Vec::new();
            for &t in thresholds {
                for cmp in [Comparison::Over, Comparison::Under] {
                    if let Some(i) = detect(team, market, log, t, cmp, price(cmp, t)) {
                        insights.push(i);
                    }
                }
            }
            insights
        }
        MarketKind::WholeNumberSweep { thresholds } => {
            let mut insights = Vec::new();
            for &t in thresholds {
                let cmp = Comparison::OrMore;
                if let Some(i) = detect(team, market, log, t, cmp, price(cmp, t)) {
                    insights.push(i);
                }
            }
            insights
        }
    }
}

/// One scannable line: threshold, direction, optional binary side and price.
struct SeriesSpec {
    threshold: f64,
    comparison: Comparison,
    side: Option<Side>,
    odds: Option<f64>,
}

fn detect_series(
    team: &str,
    market: Market,
    log: &[MatchRecord],
    hits: &[bool],
    spec: SeriesSpec,
) -> Option<BettingInsight> {
    let SeriesSpec {
        threshold,
        comparison,
        side,
        odds,
    } = spec;
    let streak = hits.iter().take_while(|h| **h).count();

    let (covered, is_streak) = if streak >= STREAK_MIN {
        (streak, true)
    } else if hits.len() >= scoring::RECENT_WINDOW
        && hits[..scoring::RECENT_WINDOW].iter().all(|h| *h)
    {
        (scoring::RECENT_WINDOW, false)
    } else {
        return None;
    };

    let season_hits = hits.iter().filter(|h| **h).count();
    let season_rate = season_hits as f64 / hits.len() as f64 * 100.0;

    let window = hits.len().min(scoring::RECENT_WINDOW);
    let recent_hits = hits[..window].iter().filter(|h| **h).count();
    let consistency = scoring::consistency(recent_hits, window);

    let difficulty = scoring::threshold_difficulty(market, threshold, comparison);
    let value = scoring::expected_value(season_rate, consistency, difficulty, odds);
    let confidence = scoring::confidence_level(100.0, consistency);
    let confidence_score = scoring::confidence_score(season_rate, consistency);

    let average_value = match comparison {
        // For binary markets the season share of hits is the useful average
        Comparison::Binary => season_hits as f64 / hits.len() as f64,
        _ => {
            let sum: f64 = log[..covered].iter().map(|m| m.value_for).sum();
            sum / covered as f64
        }
    };

    let recent_matches: Vec<InsightMatch> = log[..covered]
        .iter()
        .zip(hits[..covered].iter())
        .take(EVIDENCE_CAP)
        .map(|(m, hit)| InsightMatch {
            opponent: m.opponent.clone(),
            date: m.date,
            is_home: m.is_home,
            value: match comparison {
                Comparison::Binary => {
                    if m.value_for > 0.0 && m.value_against > 0.0 {
                        1.0
                    } else {
                        0.0
                    }
                }
                _ => m.value_for,
            },
            hit: *hit,
        })
        .collect();

    let outcome = match side {
        Some(side) => format!("{}: {side}", market.label()),
        None => market.outcome_label(comparison, threshold),
    };

    Some(BettingInsight {
        id: Uuid::new_v4(),
        team: team.to_string(),
        market,
        outcome,
        comparison,
        threshold,
        side,
        hit_rate: 100.0,
        matches_analyzed: covered,
        is_streak,
        streak_length: if is_streak { Some(streak) } else { None },
        average_value,
        confidence,
        confidence_score,
        value,
        recent_matches,
    })
}
