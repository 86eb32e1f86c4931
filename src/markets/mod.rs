//! Betting market catalog.
//!
//! Each market carries its own threshold sweep and comparison mode, so
//! analysis code never dispatches on string keys.

pub mod models;

use serde::{Deserialize, Serialize};

/// How a stat value is compared against a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Over,
    Under,
    OrMore,
    Binary,
}

impl Comparison {
    /// Whether `value` satisfies this comparison at `threshold`.
    ///
    /// Over is strictly above, under strictly below, or-more inclusive.
    /// Binary reads the value as a 0/1 flag.
    pub fn hit(&self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Over => value > threshold,
            Self::Under => value < threshold,
            Self::OrMore => value >= threshold,
            Self::Binary => value >= 0.5,
        }
    }
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Over => write!(f, "over"),
            Self::Under => write!(f, "under"),
            Self::OrMore => write!(f, "or_more"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// Threshold structure of a market.
///
/// Decimal sweeps produce an over and an under read per line; whole-number
/// sweeps are inclusive "N or more" lines; binary markets have no sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarketKind {
    DecimalSweep { thresholds: &'static [f64] },
    WholeNumberSweep { thresholds: &'static [f64] },
    Binary,
}

/// The markets the engine analyzes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    Goals,
    Cards,
    Corners,
    Fouls,
    ShotsOnTarget,
    TotalShots,
    BothTeamsToScore,
}

const GOALS_SWEEP: [f64; 4] = [0.5, 1.5, 2.5, 3.5];
const CARDS_SWEEP: [f64; 5] = [0.5, 1.5, 2.5, 3.5, 4.5];
const CORNERS_SWEEP: [f64; 6] = [3.5, 4.5, 5.5, 6.5, 7.5, 8.5];
const FOULS_SWEEP: [f64; 5] = [8.0, 9.0, 10.0, 11.0, 12.0];
const SHOTS_ON_TARGET_SWEEP: [f64; 5] = [2.0, 3.0, 4.0, 5.0, 6.0];
const TOTAL_SHOTS_SWEEP: [f64; 5] = [8.0, 10.0, 12.0, 14.0, 16.0];

impl Market {
    pub const ALL: [Market; 7] = [
        Market::Goals,
        Market::Cards,
        Market::Corners,
        Market::Fouls,
        Market::ShotsOnTarget,
        Market::TotalShots,
        Market::BothTeamsToScore,
    ];

    pub fn kind(&self) -> MarketKind {
        match self {
            Market::Goals => MarketKind::DecimalSweep {
                thresholds: &GOALS_SWEEP,
            },
            Market::Cards => MarketKind::DecimalSweep {
                thresholds: &CARDS_SWEEP,
            },
            Market::Corners => MarketKind::DecimalSweep {
                thresholds: &CORNERS_SWEEP,
            },
            Market::Fouls => MarketKind::WholeNumberSweep {
                thresholds: &FOULS_SWEEP,
            },
            Market::ShotsOnTarget => MarketKind::WholeNumberSweep {
                thresholds: &SHOTS_ON_TARGET_SWEEP,
            },
            Market::TotalShots => MarketKind::WholeNumberSweep {
                thresholds: &TOTAL_SHOTS_SWEEP,
            },
            Market::BothTeamsToScore => MarketKind::Binary,
        }
    }

    /// Stable identifier used in cache keys, URLs and config.
    pub fn key(&self) -> &'static str {
        match self {
            Market::Goals => "goals",
            Market::Cards => "cards",
            Market::Corners => "corners",
            Market::Fouls => "fouls",
            Market::ShotsOnTarget => "shots_on_target",
            Market::TotalShots => "total_shots",
            Market::BothTeamsToScore => "btts",
        }
    }

    pub fn from_key(key: &str) -> Option<Market> {
        Market::ALL.iter().copied().find(|m| m.key() == key)
    }

    /// Display name used in outcome labels and recommendations.
    pub fn label(&self) -> &'static str {
        match self {
            Market::Goals => "Goals",
            Market::Cards => "Cards",
            Market::Corners => "Corners",
            Market::Fouls => "Fouls",
            Market::ShotsOnTarget => "Shots On Target",
            Market::TotalShots => "Total Shots",
            Market::BothTeamsToScore => "Both Teams To Score",
        }
    }

    /// Typical line for this market, the anchor for threshold difficulty.
    pub fn reference_line(&self) -> f64 {
        match self {
            Market::Goals => 1.5,
            Market::Cards => 2.5,
            Market::Corners => 5.5,
            Market::Fouls => 10.0,
            Market::ShotsOnTarget => 4.0,
            Market::TotalShots => 12.0,
            Market::BothTeamsToScore => 0.5,
        }
    }

    /// Markets whose stats come from the per-team match logs.
    /// BTTS is derived from the goals log rather than fetched separately.
    pub fn fetched() -> impl Iterator<Item = Market> {
        Market::ALL
            .iter()
            .copied()
            .filter(|m| *m != Market::BothTeamsToScore)
    }

    /// Human label for a single bet on this market, e.g. "Over 2.5 Cards",
    /// "10+ Fouls" or "Both Teams To Score: Yes".
    pub fn outcome_label(&self, comparison: Comparison, threshold: f64) -> String {
        match comparison {
            Comparison::Over => format!("Over {threshold} {}", self.label()),
            Comparison::Under => format!("Under {threshold} {}", self.label()),
            Comparison::OrMore => format!("{threshold:.0}+ {}", self.label()),
            Comparison::Binary => self.label().to_string(),
        }
    }
}

impl std::fmt::Display for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
