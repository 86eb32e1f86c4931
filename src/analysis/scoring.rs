//! Statistical scoring utilities.
//!
//! Pure functions shared by the threshold analyzer, the pattern detector
//! and the context evaluator. All percentages are 0..100, all consistency
//! factors 0..1.

use crate::markets::models::ConfidenceLevel;
use crate::markets::{Comparison, Market};

/// Recency window used for consistency and form, in matches.
pub const RECENT_WINDOW: usize = 5;

/// Percentage cutoffs (as fractions) for the confidence ladder.
pub const PERCENT_HIGH: f64 = 0.75;
pub const PERCENT_MEDIUM: f64 = 0.60;
pub const PERCENT_LOW: f64 = 0.45;

/// Consistency cutoffs for the confidence ladder.
pub const CONSISTENCY_EXCELLENT: f64 = 0.8;
pub const CONSISTENCY_GOOD: f64 = 0.6;
pub const CONSISTENCY_POOR: f64 = 0.4;

/// Odds below this are treated as malformed and ignored.
pub const MIN_DECIMAL_ODDS: f64 = 1.05;

/// Implied-probability edge that earns the odds bonus.
const EDGE_BONUS_CUTOFF: f64 = 0.05;
/// Implied-probability edge (negative) that triggers the odds penalty.
const EDGE_PENALTY_CUTOFF: f64 = -0.10;
const EDGE_BONUS_WEIGHT: f64 = 25.0;
const EDGE_PENALTY: f64 = 10.0;

const DIFFICULTY_WEIGHT: f64 = 10.0;
const DIFFICULTY_CAP: f64 = 30.0;

/// Consistency of a hit count over a sample, 0..1.
///
/// Small samples are scaled down proportionally below the recency window,
/// so two hits from two matches scores well under five from five. For a
/// fixed hit rate the result is monotonic in sample size.
pub fn consistency(hits: usize, sample: usize) -> f64 {
    if sample == 0 {
        return 0.0;
    }
    let rate = hits as f64 / sample as f64;
    let penalised = if sample < RECENT_WINDOW {
        rate * sample as f64 / RECENT_WINDOW as f64
    } else {
        rate
    };
    penalised.clamp(0.0, 1.0)
}

/// Confidence tier for a hit percentage (0..100) and consistency (0..1).
///
/// High needs at least 75% with consistency 0.6; medium at least 60% with
/// consistency 0.4. Both legs must hold, boundaries inclusive.
pub fn confidence_level(percentage: f64, consistency: f64) -> ConfidenceLevel {
    if percentage >= PERCENT_HIGH * 100.0 && consistency >= CONSISTENCY_GOOD {
        ConfidenceLevel::High
    } else if percentage >= PERCENT_MEDIUM * 100.0 && consistency >= CONSISTENCY_POOR {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    }
}

/// Difficulty bonus for a threshold relative to the market's typical line.
///
/// Deeper overs (and lower unders) are harder to land and score more.
pub fn threshold_difficulty(market: Market, threshold: f64, comparison: Comparison) -> f64 {
    let reference = market.reference_line();
    if reference <= 0.0 || threshold <= 0.0 {
        return 0.0;
    }
    let ratio = match comparison {
        Comparison::Under => reference / threshold,
        _ => threshold / reference,
    };
    (ratio * DIFFICULTY_WEIGHT).min(DIFFICULTY_CAP)
}

/// Expected-value score for ranking insights and threshold reads.
///
/// # Formula
/// base = percentage x consistency + difficulty bonus. When usable odds are
/// present, edge = percentage/100 - 1/odds; an edge of +0.05 or better adds
/// a bonus scaled by consistency, an edge of -0.10 or worse subtracts a
/// flat penalty. Odds at or below 1.05 are ignored entirely.
pub fn expected_value(
    percentage: f64,
    consistency: f64,
    difficulty: f64,
    odds: Option<f64>,
) -> f64 {
    let mut value = percentage * consistency + difficulty;

    if let Some(odds) = odds {
        if odds > MIN_DECIMAL_ODDS {
            let edge = percentage / 100.0 - 1.0 / odds;
            if edge >= EDGE_BONUS_CUTOFF {
                value += EDGE_BONUS_WEIGHT * consistency;
            } else if edge <= EDGE_PENALTY_CUTOFF {
                value -= EDGE_PENALTY;
            }
        }
    }

    value
}

/// Season-weighted confidence score, 0..100.
///
/// A pattern is only as trustworthy as the season behind it: the full-log
/// hit rate carries the score, recent consistency can lift it by up to half.
pub fn confidence_score(season_hit_rate: f64, recent_consistency: f64) -> f64 {
    (season_hit_rate * (0.5 + 0.5 * recent_consistency)).clamp(0.0, 100.0)
}

/// Display grade for a hit percentage (0..100).
pub fn percentage_grade(percentage: f64) -> &'static str {
    if percentage >= PERCENT_HIGH * 100.0 {
        "strong"
    } else if percentage >= PERCENT_MEDIUM * 100.0 {
        "solid"
    } else if percentage >= PERCENT_LOW * 100.0 {
        "lean"
    } else {
        "weak"
    }
}

/// Display grade for a consistency factor (0..1).
pub fn consistency_grade(consistency: f64) -> &'static str {
    if consistency >= CONSISTENCY_EXCELLENT {
        "excellent"
    } else if consistency >= CONSISTENCY_GOOD {
        "good"
    } else if consistency >= CONSISTENCY_POOR {
        "fair"
    } else {
        "poor"
    }
}
