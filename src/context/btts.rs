//! Bilateral both-teams-to-score evaluation.
//!
//! A BTTS pattern belongs to one team, but whether it projects onto a
//! fixture depends on both: each side's expected scoring is the mean of
//! its own scoring average and the opposite defence's conceding average,
//! venue-aware where the sample allows.

use crate::context::{matchup, quality, ContextError, DataQuality, MatchContext, StrengthOfMatch};
use crate::markets::models::{BettingInsight, Side, TeamMatchLog};

/// Venue samples smaller than this fall back to the season log.
pub const MIN_VENUE_SAMPLE: usize = 3;

const SIDE_FLOOR: f64 = 0.5;

const YES_EXCELLENT_VENUE: f64 = 1.5;
const YES_GOOD_VENUE: f64 = 1.2;
const YES_EXCELLENT_FALLBACK: f64 = 2.0;
const YES_GOOD_FALLBACK: f64 = 1.5;
const YES_FAIR: f64 = 0.8;

const NO_EXCELLENT: f64 = 0.5;
const NO_GOOD: f64 = 0.7;
const NO_FAIR: f64 = 0.8;

/// Venue-aware scoring and conceding rates for one side of a fixture.
#[derive(Debug, Clone)]
pub struct TeamGoalRates {
    pub team: String,
    pub scored_avg: f64,
    pub conceded_avg: f64,
    pub sample: usize,
    pub venue_specific: bool,
}

impl TeamGoalRates {
    /// Rates from the goals log at the venue the team will play.
    pub fn from_log(log: &TeamMatchLog, at_home: bool) -> Self {
        let venue = log.at_venue(at_home);
        let (records, venue_specific): (Vec<_>, bool) = if venue.len() >= MIN_VENUE_SAMPLE {
            (venue, true)
        } else {
            (log.matches.iter().collect(), false)
        };

        let sample = records.len();
        let (scored, conceded) = records
            .iter()
            .fold((0.0, 0.0), |(s, c), m| (s + m.value_for, c + m.value_against));

        Self {
            team: log.team.clone(),
            scored_avg: if sample == 0 { 0.0 } else { scored / sample as f64 },
            conceded_avg: if sample == 0 { 0.0 } else { conceded / sample as f64 },
            sample,
            venue_specific,
        }
    }
}

/// Expected scoring for both sides of a fixture.
#[derive(Debug, Clone, Copy)]
pub struct BttsProjection {
    pub home_expected: f64,
    pub away_expected: f64,
    pub venue_specific: bool,
}

/// Blend each attack with the defence it will face.
pub fn project(home: &TeamGoalRates, away: &TeamGoalRates) -> BttsProjection {
    BttsProjection {
        home_expected: (home.scored_avg + away.conceded_avg) / 2.0,
        away_expected: (away.scored_avg + home.conceded_avg) / 2.0,
        venue_specific: home.venue_specific && away.venue_specific,
    }
}

/// Grade a BTTS side against the projection.
///
/// Yes needs both sides clearing 0.5 before the combined mean decides the
/// tier; fallback samples face higher bars. No grades on how far the
/// weaker side sits below 0.8.
pub fn classify(side: Side, projection: &BttsProjection) -> StrengthOfMatch {
    let min_side = projection.home_expected.min(projection.away_expected);
    let combined = (projection.home_expected + projection.away_expected) / 2.0;

    match side {
        Side::Yes => {
            if min_side < SIDE_FLOOR {
                return StrengthOfMatch::Poor;
            }
            let (excellent, good) = if projection.venue_specific {
                (YES_EXCELLENT_VENUE, YES_GOOD_VENUE)
            } else {
                (YES_EXCELLENT_FALLBACK, YES_GOOD_FALLBACK)
            };
            if combined >= excellent {
                StrengthOfMatch::Excellent
            } else if combined >= good {
                StrengthOfMatch::Good
            } else if combined >= YES_FAIR {
                StrengthOfMatch::Fair
            } else {
                StrengthOfMatch::Poor
            }
        }
        Side::No => {
            if min_side <= NO_EXCELLENT {
                StrengthOfMatch::Excellent
            } else if min_side <= NO_GOOD {
                StrengthOfMatch::Good
            } else if min_side < NO_FAIR {
                StrengthOfMatch::Fair
            } else {
                StrengthOfMatch::Poor
            }
        }
    }
}

/// Full fixture context for a BTTS insight.
pub fn evaluate(
    insight: &BettingInsight,
    home: &TeamGoalRates,
    away: &TeamGoalRates,
) -> Result<MatchContext, ContextError> {
    let side = insight.side.ok_or(ContextError::BinaryMarket)?;

    let (is_home, opponent) = if insight.team == home.team {
        (true, away)
    } else if insight.team == away.team {
        (false, home)
    } else {
        return Err(ContextError::UnknownFixtureTeam(insight.team.clone()));
    };

    let projection = project(home, away);
    if !projection.home_expected.is_finite() || !projection.away_expected.is_finite() {
        return Err(ContextError::BadInput);
    }

    let sample = home.sample.min(away.sample);
    let data_quality = quality::assess(sample, projection.venue_specific);
    if data_quality == DataQuality::Insufficient {
        return Ok(MatchContext {
            opponent: opponent.team.clone(),
            is_home,
            opposition_allows_avg: opponent.conceded_avg,
            opposition_matches: opponent.sample,
            venue_specific: projection.venue_specific,
            data_quality,
            strength: StrengthOfMatch::Poor,
            recommendation: format!(
                "Insufficient data: only {sample} matches behind the {} projection",
                insight.outcome
            ),
        });
    }

    let classified = classify(side, &projection);
    let strength = matchup::apply_confidence_gate(classified, insight.confidence_score);

    let mut recommendation = format!(
        "{strength} matchup for {}: expected scoring {:.2} home / {:.2} away",
        insight.outcome, projection.home_expected, projection.away_expected,
    );
    if !projection.venue_specific {
        recommendation.push_str(", season-wide sample");
    }
    if strength < classified {
        recommendation.push_str(&format!(
            "; capped by a {:.0} confidence score",
            insight.confidence_score
        ));
    }

    Ok(MatchContext {
        opponent: opponent.team.clone(),
        is_home,
        opposition_allows_avg: opponent.conceded_avg,
        opposition_matches: opponent.sample,
        venue_specific: projection.venue_specific,
        data_quality,
        strength,
        recommendation,
    })
}
