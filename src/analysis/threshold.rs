//! Per-market threshold analysis.
//!
//! Walks a market's threshold sweep over a team's match log and produces
//! one read per line: hit percentage over the full log, consistency over
//! the recency window, a confidence tier and an expected-value score.

use crate::analysis::scoring;
use crate::markets::models::{ConfidenceLevel, MatchOdds, MatchRecord, ThresholdAnalysis};
use crate::markets::{Comparison, Market, MarketKind};

/// Analyze one threshold line.
///
/// An empty log yields a zero-valued read at low confidence; no history is
/// a normal state early in the season, not an error.
pub fn analyze(
    market: Market,
    log: &[MatchRecord],
    threshold: f64,
    bet_type: Comparison,
    odds: Option<f64>,
) -> ThresholdAnalysis {
    if log.is_empty() {
        return ThresholdAnalysis {
            market,
            threshold,
            bet_type,
            percentage: 0.0,
            consistency: 0.0,
            confidence: ConfidenceLevel::Low,
            recent_form: Vec::new(),
            value: 0.0,
            matches_analyzed: 0,
        };
    }

    let hits = log
        .iter()
        .filter(|m| bet_type.hit(m.value_for, threshold))
        .count();
    let percentage = hits as f64 / log.len() as f64 * 100.0;

    let window = log.len().min(scoring::RECENT_WINDOW);
    let recent_form: Vec<bool> = log[..window]
        .iter()
        .map(|m| bet_type.hit(m.value_for, threshold))
        .collect();
    let recent_hits = recent_form.iter().filter(|h| **h).count();
    let consistency = scoring::consistency(recent_hits, window);

    let confidence = scoring::confidence_level(percentage, consistency);
    let difficulty = scoring::threshold_difficulty(market, threshold, bet_type);
    let value = scoring::expected_value(percentage, consistency, difficulty, odds);

    ThresholdAnalysis {
        market,
        threshold,
        bet_type,
        percentage,
        consistency,
        confidence,
        recent_form,
        value,
        matches_analyzed: log.len(),
    }
}

/// Pick the stronger direction of an over/under pair on the same line.
///
/// The higher confidence tier wins outright; within a tier the higher
/// expected-value score decides.
pub fn select_direction(over: ThresholdAnalysis, under: ThresholdAnalysis) -> ThresholdAnalysis {
    if over.confidence != under.confidence {
        if over.confidence > under.confidence {
            over
        } else {
            under
        }
    } else if over.value >= under.value {
        over
    } else {
        under
    }
}

/// Full sweep for a market.
///
/// Decimal sweeps read both directions per line and keep the stronger one;
/// whole-number sweeps are or-more only. Binary markets have no sweep.
pub fn sweep(market: Market, log: &[MatchRecord], odds: Option<&MatchOdds>) -> Vec<ThresholdAnalysis> {
    let price = |cmp: Comparison, t: f64| odds.and_then(|o| o.price_for(market, t, cmp));

    match market.kind() {
        MarketKind::DecimalSweep { thresholds } => thresholds
            .iter()
            .map(|&t| {
                let over = analyze(market, log, t, Comparison::Over, price(Comparison::Over, t));
                let under =
                    analyze(market, log, t, Comparison::Under, price(Comparison::Under, t));
                select_direction(over, under)
            })
            .collect(),
        MarketKind::WholeNumberSweep { thresholds } => thresholds
            .iter()
            .map(|&t| analyze(market, log, t, Comparison::OrMore, price(Comparison::OrMore, t)))
            .collect(),
        MarketKind::Binary => Vec::new(),
    }
}
