use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Comparison, Market};

/// One entry from a team's match log for a single market.
///
/// Logs are always ordered most recent first: index 0 is the latest match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub opponent: String,
    pub date: Option<NaiveDate>,
    /// True when the logged team played at home.
    pub is_home: bool,
    /// The team's own count for the market stat (goals scored, cards shown...).
    pub value_for: f64,
    /// What the opposition produced against them in the same match.
    pub value_against: f64,
}

/// A team's full match log for one market, most recent first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMatchLog {
    pub team: String,
    pub matches: Vec<MatchRecord>,
}

impl TeamMatchLog {
    /// Matches played at the given venue, order preserved.
    pub fn at_venue(&self, home: bool) -> Vec<&MatchRecord> {
        self.matches.iter().filter(|m| m.is_home == home).collect()
    }
}

/// Confidence tier assigned to an analysis or insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    /// One step down the ladder; low stays low.
    pub fn downgraded(self) -> Self {
        match self {
            Self::High => Self::Medium,
            Self::Medium => Self::Low,
            Self::Low => Self::Low,
        }
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// Yes/No side of a binary market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Yes,
    No,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yes => write!(f, "Yes"),
            Self::No => write!(f, "No"),
        }
    }
}

/// Read of a single threshold line for one team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdAnalysis {
    pub market: Market,
    pub threshold: f64,
    pub bet_type: Comparison,
    /// Hit rate across every supplied match, 0..100.
    pub percentage: f64,
    /// Recency-window consistency, 0..1.
    pub consistency: f64,
    pub confidence: ConfidenceLevel,
    /// Hit/miss over the most recent matches, newest first, at most five.
    pub recent_form: Vec<bool>,
    /// Expected-value score used for ranking.
    pub value: f64,
    pub matches_analyzed: usize,
}

/// A detected betting pattern for one team and market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BettingInsight {
    pub id: Uuid,
    pub team: String,
    pub market: Market,
    /// Display label, e.g. "Over 2.5 Cards" or "Both Teams To Score: Yes".
    pub outcome: String,
    pub comparison: Comparison,
    pub threshold: f64,
    /// Yes/No side for binary markets, None otherwise.
    pub side: Option<Side>,
    /// Hit rate across the covered matches, 0..100.
    pub hit_rate: f64,
    /// How many matches the pattern covers (streak length, or the window).
    pub matches_analyzed: usize,
    pub is_streak: bool,
    pub streak_length: Option<usize>,
    /// The team's average stat value over the covered matches.
    pub average_value: f64,
    pub confidence: ConfidenceLevel,
    /// Season-weighted confidence score, 0..100. Feeds the context gate.
    pub confidence_score: f64,
    /// Expected-value score used for ranking.
    pub value: f64,
    pub recent_matches: Vec<InsightMatch>,
}

/// Per-match evidence attached to an insight, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightMatch {
    pub opponent: String,
    pub date: Option<NaiveDate>,
    pub is_home: bool,
    pub value: f64,
    pub hit: bool,
}

impl BettingInsight {
    /// Binary insights on the Yes side.
    pub fn is_yes(&self) -> bool {
        matches!(self.side, Some(Side::Yes))
    }
}

/// Bookmaker odds snapshot for one fixture. Absence of a line is normal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOdds {
    pub home_team: String,
    pub away_team: String,
    pub fetched_at: DateTime<Utc>,
    pub totals: Vec<TotalsLine>,
    pub btts: Option<BinaryPrices>,
}

/// Over/under prices for one market line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalsLine {
    pub market: Market,
    pub line: f64,
    pub over: f64,
    pub under: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BinaryPrices {
    pub yes: f64,
    pub no: f64,
}

impl MatchOdds {
    /// Decimal price for a bet, if the book quotes the line.
    ///
    /// Or-more bets map to the bookmaker line half a unit below the whole
    /// number: "10+ fouls" is priced as over 9.5.
    pub fn price_for(&self, market: Market, threshold: f64, comparison: Comparison) -> Option<f64> {
        let wanted = match comparison {
            Comparison::Over | Comparison::Under => threshold,
            Comparison::OrMore => threshold - 0.5,
            Comparison::Binary => return None,
        };
        let line = self
            .totals
            .iter()
            .find(|l| l.market == market && (l.line - wanted).abs() < 1e-6)?;
        Some(match comparison {
            Comparison::Under => line.under,
            _ => line.over,
        })
    }

    pub fn btts_price(&self, side: Side) -> Option<f64> {
        self.btts.as_ref().map(|p| match side {
            Side::Yes => p.yes,
            Side::No => p.no,
        })
    }
}
