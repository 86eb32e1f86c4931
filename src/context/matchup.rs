//! Threshold-insight matchup evaluation.
//!
//! Projects a team's pattern average and the opposition's allowed average
//! onto the bet's threshold, then grades the fixture. Margins are relative
//! to the threshold so a 0.5-goal line and a 10-foul line grade on the
//! same scale.

use crate::context::{quality, ContextError, DataQuality, MatchContext, StrengthOfMatch};
use crate::markets::models::{BettingInsight, TeamMatchLog};
use crate::markets::Comparison;

const MARGIN_EXCELLENT: f64 = 0.15;
const MARGIN_GOOD_TEAM: f64 = 0.10;
const MARGIN_GOOD_OPP: f64 = 0.05;

/// Dominance override: a team so far above the line that a weak opposition
/// read cannot talk the bet all the way down.
const DOMINANCE_STRONG: f64 = 1.8;
const DOMINANCE_STRONG_MARGIN: f64 = 0.25;
const DOMINANCE_MODERATE: f64 = 1.5;

/// Confidence-score gate, applied after classification.
const GATE_FAIR_BELOW: f64 = 60.0;
const GATE_POOR_BELOW: f64 = 40.0;

/// Venue-aware view of what an opponent allows in one market.
#[derive(Debug, Clone)]
pub struct OppositionProfile {
    pub opponent: String,
    /// True when the insight's team plays this fixture at home.
    pub team_at_home: bool,
    pub allows_avg: f64,
    pub sample: usize,
    pub venue_specific: bool,
}

impl OppositionProfile {
    /// Build from the opponent's match log.
    ///
    /// The opponent plays at the opposite venue to the insight team. An
    /// empty venue sample falls back to the full log.
    pub fn from_log(opponent_log: &TeamMatchLog, team_at_home: bool) -> Self {
        let opponent_home = !team_at_home;
        let venue = opponent_log.at_venue(opponent_home);
        let (sample, allows_avg, venue_specific) = if venue.is_empty() {
            let n = opponent_log.matches.len();
            (n, mean_against(opponent_log.matches.iter()), false)
        } else {
            (venue.len(), mean_against(venue.iter().copied()), true)
        };
        Self {
            opponent: opponent_log.team.clone(),
            team_at_home,
            allows_avg,
            sample,
            venue_specific,
        }
    }

    /// Profile for an opponent with no data in this market at all.
    pub fn missing(opponent: &str, team_at_home: bool) -> Self {
        Self {
            opponent: opponent.to_string(),
            team_at_home,
            allows_avg: 0.0,
            sample: 0,
            venue_specific: false,
        }
    }
}

fn mean_against<'a>(records: impl Iterator<Item = &'a crate::markets::models::MatchRecord>) -> f64 {
    let mut sum = 0.0;
    let mut n = 0usize;
    for record in records {
        sum += record.value_against;
        n += 1;
    }
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Evaluate a threshold insight against the fixture opposition.
pub fn evaluate(
    insight: &BettingInsight,
    opposition: &OppositionProfile,
) -> Result<MatchContext, ContextError> {
    if insight.comparison == Comparison::Binary {
        return Err(ContextError::BinaryMarket);
    }
    if !insight.threshold.is_finite() || insight.threshold <= 0.0 {
        return Err(ContextError::BadThreshold(insight.threshold));
    }
    if !insight.average_value.is_finite() || !opposition.allows_avg.is_finite() {
        return Err(ContextError::BadInput);
    }

    let data_quality = quality::assess(opposition.sample, opposition.venue_specific);
    if data_quality == DataQuality::Insufficient {
        return Ok(MatchContext {
            opponent: opposition.opponent.clone(),
            is_home: opposition.team_at_home,
            opposition_allows_avg: opposition.allows_avg,
            opposition_matches: opposition.sample,
            venue_specific: opposition.venue_specific,
            data_quality,
            strength: StrengthOfMatch::Poor,
            recommendation: format!(
                "Insufficient data: only {} matches on record for {}",
                opposition.sample, opposition.opponent
            ),
        });
    }

    let classified = match insight.comparison {
        Comparison::Under => classify_under(
            insight.average_value,
            opposition.allows_avg,
            insight.threshold,
        ),
        _ => classify_over(
            insight.average_value,
            opposition.allows_avg,
            insight.threshold,
        ),
    };
    let strength = apply_confidence_gate(classified, insight.confidence_score);

    let mut recommendation = format!(
        "{strength} matchup for {}: averaging {:.1} while {} allow {:.1} {} ({} matches)",
        insight.outcome,
        insight.average_value,
        opposition.opponent,
        opposition.allows_avg,
        if opposition.team_at_home { "away" } else { "at home" },
        opposition.sample,
    );
    if !opposition.venue_specific {
        recommendation.push_str(", season-wide sample");
    }
    if strength < classified {
        recommendation.push_str(&format!(
            "; capped by a {:.0} confidence score",
            insight.confidence_score
        ));
    }

    Ok(MatchContext {
        opponent: opposition.opponent.clone(),
        is_home: opposition.team_at_home,
        opposition_allows_avg: opposition.allows_avg,
        opposition_matches: opposition.sample,
        venue_specific: opposition.venue_specific,
        data_quality,
        strength,
        recommendation,
    })
}

/// Grade an over or or-more bet. Margins are threshold-relative.
fn classify_over(pattern_avg: f64, allows_avg: f64, threshold: f64) -> StrengthOfMatch {
    let team_margin = (pattern_avg - threshold) / threshold;
    let opp_margin = (allows_avg - threshold) / threshold;

    if team_margin >= MARGIN_EXCELLENT && opp_margin >= MARGIN_EXCELLENT {
        StrengthOfMatch::Excellent
    } else if team_margin >= MARGIN_GOOD_TEAM && opp_margin >= MARGIN_GOOD_OPP {
        StrengthOfMatch::Good
    } else if pattern_avg > threshold && allows_avg >= threshold {
        StrengthOfMatch::Fair
    } else {
        // The opposition read alone cannot bury a team miles above the line
        let dominance = pattern_avg / threshold;
        if dominance >= DOMINANCE_STRONG && team_margin >= DOMINANCE_STRONG_MARGIN {
            StrengthOfMatch::Good
        } else if dominance >= DOMINANCE_MODERATE {
            StrengthOfMatch::Fair
        } else {
            StrengthOfMatch::Poor
        }
    }
}

/// Grade an under bet: the mirrored ladder, with no dominance override.
fn classify_under(pattern_avg: f64, allows_avg: f64, threshold: f64) -> StrengthOfMatch {
    let team_margin = (threshold - pattern_avg) / threshold;
    let opp_margin = (threshold - allows_avg) / threshold;

    if team_margin >= MARGIN_EXCELLENT && opp_margin >= MARGIN_EXCELLENT {
        StrengthOfMatch::Excellent
    } else if team_margin >= MARGIN_GOOD_TEAM && opp_margin >= MARGIN_GOOD_OPP {
        StrengthOfMatch::Good
    } else if pattern_avg < threshold && allows_avg <= threshold {
        StrengthOfMatch::Fair
    } else {
        StrengthOfMatch::Poor
    }
}

/// Downgrade a classification whose underlying confidence score is weak.
pub(crate) fn apply_confidence_gate(strength: StrengthOfMatch, score: f64) -> StrengthOfMatch {
    if score < GATE_POOR_BELOW {
        return StrengthOfMatch::Poor;
    }
    if score < GATE_FAIR_BELOW && strength > StrengthOfMatch::Fair {
        return StrengthOfMatch::Fair;
    }
    strength
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markets::models::{ConfidenceLevel, MatchRecord};
    use crate::markets::Market;
    use uuid::Uuid;

    fn insight(
        comparison: Comparison,
        threshold: f64,
        average_value: f64,
        confidence_score: f64,
    ) -> BettingInsight {
        BettingInsight {
            id: Uuid::new_v4(),
            team: "Arsenal".to_string(),
            market: Market::Fouls,
            outcome: Market::Fouls.outcome_label(comparison, threshold),
            comparison,
            threshold,
            side: None,
            hit_rate: 100.0,
            matches_analyzed: 8,
            is_streak: true,
            streak_length: Some(8),
            average_value,
            confidence: ConfidenceLevel::High,
            confidence_score,
            value: 100.0,
            recent_matches: Vec::new(),
        }
    }

    fn opposition(allows_avg: f64, sample: usize, venue_specific: bool) -> OppositionProfile {
        OppositionProfile {
            opponent: "West Ham".to_string(),
            team_at_home: true,
            allows_avg,
            sample,
            venue_specific,
        }
    }

    #[test]
    fn test_excellent_needs_both_margins() {
        let i = insight(Comparison::Over, 10.0, 11.6, 100.0);
        let ctx = evaluate(&i, &opposition(11.6, 10, true)).unwrap();
        assert_eq!(ctx.strength, StrengthOfMatch::Excellent);

        // Opposition margin just under 15%: only Good
        let ctx = evaluate(&i, &opposition(11.0, 10, true)).unwrap();
        assert_eq!(ctx.strength, StrengthOfMatch::Good);
    }

    #[test]
    fn test_fair_when_both_sides_clear_the_line() {
        let i = insight(Comparison::Over, 10.0, 10.5, 100.0);
        let ctx = evaluate(&i, &opposition(10.0, 10, true)).unwrap();
        assert_eq!(ctx.strength, StrengthOfMatch::Fair);
    }

    #[test]
    fn test_dominance_override_rescues_strong_team() {
        // Team averages 9.0 on a 4.5 line against an opponent allowing 3.0:
        // the base ladder says Poor, dominance 2.0 lifts it to Good
        let i = insight(Comparison::Over, 4.5, 9.0, 100.0);
        let ctx = evaluate(&i, &opposition(3.0, 10, true)).unwrap();
        assert_eq!(ctx.strength, StrengthOfMatch::Good);
    }

    #[test]
    fn test_moderate_dominance_gives_fair() {
        let i = insight(Comparison::Over, 4.5, 7.2, 100.0);
        let ctx = evaluate(&i, &opposition(2.0, 10, true)).unwrap();
        assert_eq!(ctx.strength, StrengthOfMatch::Fair);
    }

    #[test]
    fn test_no_dominance_without_margin() {
        let i = insight(Comparison::Over, 2.5, 2.6, 100.0);
        let ctx = evaluate(&i, &opposition(2.0, 10, true)).unwrap();
        assert_eq!(ctx.strength, StrengthOfMatch::Poor);
    }

    #[test]
    fn test_unders_have_no_override() {
        // Team far below the line, opponent well above it: Poor, no rescue
        let i = insight(Comparison::Under, 4.5, 1.0, 100.0);
        let ctx = evaluate(&i, &opposition(6.0, 10, true)).unwrap();
        assert_eq!(ctx.strength, StrengthOfMatch::Poor);
    }

    #[test]
    fn test_under_ladder_mirrors_over() {
        let i = insight(Comparison::Under, 4.5, 3.5, 100.0);
        let ctx = evaluate(&i, &opposition(3.5, 10, true)).unwrap();
        assert_eq!(ctx.strength, StrengthOfMatch::Excellent);
    }

    #[test]
    fn test_confidence_gate_downgrades_excellent() {
        let i = insight(Comparison::Over, 10.0, 11.6, 50.0);
        let ctx = evaluate(&i, &opposition(11.6, 10, true)).unwrap();
        assert_eq!(ctx.strength, StrengthOfMatch::Fair);
        assert!(ctx.recommendation.contains("confidence score"));
    }

    #[test]
    fn test_confidence_gate_floors_at_poor() {
        let i = insight(Comparison::Over, 10.0, 11.6, 35.0);
        let ctx = evaluate(&i, &opposition(11.6, 10, true)).unwrap();
        assert_eq!(ctx.strength, StrengthOfMatch::Poor);

        // Fair follows the same floor
        let i = insight(Comparison::Over, 10.0, 10.5, 35.0);
        let ctx = evaluate(&i, &opposition(10.0, 10, true)).unwrap();
        assert_eq!(ctx.strength, StrengthOfMatch::Poor);
    }

    #[test]
    fn test_gate_leaves_scores_above_sixty_alone() {
        let i = insight(Comparison::Over, 10.0, 11.6, 60.0);
        let ctx = evaluate(&i, &opposition(11.6, 10, true)).unwrap();
        assert_eq!(ctx.strength, StrengthOfMatch::Excellent);
    }

    #[test]
    fn test_insufficient_sample_skips_classification() {
        let i = insight(Comparison::Over, 4.5, 9.0, 100.0);
        let ctx = evaluate(&i, &opposition(3.0, 2, true)).unwrap();
        assert_eq!(ctx.strength, StrengthOfMatch::Poor);
        assert_eq!(ctx.data_quality, DataQuality::Insufficient);
        assert!(ctx.recommendation.contains("Insufficient data"));
    }

    #[test]
    fn test_binary_insights_are_rejected() {
        let mut i = insight(Comparison::Binary, 0.5, 0.8, 100.0);
        i.market = Market::BothTeamsToScore;
        assert!(matches!(
            evaluate(&i, &opposition(1.0, 10, true)),
            Err(ContextError::BinaryMarket)
        ));
    }

    #[test]
    fn test_bad_threshold_is_an_error() {
        let i = insight(Comparison::Over, 0.0, 9.0, 100.0);
        assert!(matches!(
            evaluate(&i, &opposition(3.0, 10, true)),
            Err(ContextError::BadThreshold(_))
        ));
    }

    fn record(is_home: bool, value_against: f64) -> MatchRecord {
        MatchRecord {
            opponent: "Someone".to_string(),
            date: None,
            is_home,
            value_for: 1.0,
            value_against,
        }
    }

    #[test]
    fn test_opposition_profile_uses_their_venue() {
        // Insight team plays at home, so the opponent's away matches count
        let log = TeamMatchLog {
            team: "West Ham".to_string(),
            matches: vec![
                record(true, 20.0),
                record(false, 10.0),
                record(false, 12.0),
                record(true, 22.0),
            ],
        };
        let profile = OppositionProfile::from_log(&log, true);
        assert!(profile.venue_specific);
        assert_eq!(profile.sample, 2);
        assert!((profile.allows_avg - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_opposition_profile_falls_back_to_full_log() {
        let log = TeamMatchLog {
            team: "West Ham".to_string(),
            matches: vec![record(true, 20.0), record(true, 10.0)],
        };
        let profile = OppositionProfile::from_log(&log, true);
        assert!(!profile.venue_specific);
        assert_eq!(profile.sample, 2);
        assert!((profile.allows_avg - 15.0).abs() < 1e-9);
    }
}
