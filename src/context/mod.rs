//! Fixture context evaluation.
//!
//! A pattern on its own says what a team has been doing; context says how
//! that projects onto a specific opponent at a specific venue.

pub mod btts;
pub mod matchup;
pub mod quality;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::markets::models::BettingInsight;

/// How well a detected pattern projects onto the fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrengthOfMatch {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl std::fmt::Display for StrengthOfMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Poor => write!(f, "Poor"),
            Self::Fair => write!(f, "Fair"),
            Self::Good => write!(f, "Good"),
            Self::Excellent => write!(f, "Excellent"),
        }
    }
}

/// Trust tier for the opposition sample behind a context read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataQuality {
    Insufficient,
    Poor,
    Fair,
    Good,
    Excellent,
}

impl std::fmt::Display for DataQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Insufficient => write!(f, "Insufficient"),
            Self::Poor => write!(f, "Poor"),
            Self::Fair => write!(f, "Fair"),
            Self::Good => write!(f, "Good"),
            Self::Excellent => write!(f, "Excellent"),
        }
    }
}

/// Fixture context attached to one insight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchContext {
    pub opponent: String,
    /// True when the insight's team plays this fixture at home.
    pub is_home: bool,
    /// What the opposition allows in this market, per match.
    pub opposition_allows_avg: f64,
    pub opposition_matches: usize,
    /// False when the venue sample was empty and the full log was used.
    pub venue_specific: bool,
    pub data_quality: DataQuality,
    pub strength: StrengthOfMatch,
    pub recommendation: String,
}

/// An insight paired with its fixture context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextualInsight {
    pub insight: BettingInsight,
    pub context: MatchContext,
}

/// Context evaluation failures. These never abort a batch; the engine
/// converts them into Poor-strength, error-flagged insights.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("threshold {0} cannot anchor margin ratios")]
    BadThreshold(f64),
    #[error("non-finite average in context inputs")]
    BadInput,
    #[error("binary markets use the bilateral evaluator")]
    BinaryMarket,
    #[error("team {0} is not part of this fixture")]
    UnknownFixtureTeam(String),
}
