//! Redundancy filtering across threshold sweeps.
//!
//! A streak over 0.5 cards says nothing new once the same streak holds
//! over 2.5. Each (team, market, direction) group keeps its single most
//! informative line.

use std::collections::HashMap;

use crate::markets::models::BettingInsight;
use crate::markets::{Comparison, Market};

/// A dedup group key: overs, unders and or-mores never collapse into each
/// other, and the two binary sides stay separate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Direction {
    Over,
    Under,
    OrMore,
    Binary(bool),
}

fn direction_of(insight: &BettingInsight) -> Direction {
    match insight.comparison {
        Comparison::Over => Direction::Over,
        Comparison::Under => Direction::Under,
        Comparison::OrMore => Direction::OrMore,
        Comparison::Binary => Direction::Binary(insight.is_yes()),
    }
}

/// Keep the extremum per (team, market, direction).
///
/// Overs and or-mores keep the highest threshold, unders the lowest. The
/// whole group is scanned; input order carries no meaning here.
pub fn filter_redundant(insights: Vec<BettingInsight>) -> Vec<BettingInsight> {
    let mut best: HashMap<(String, Market, Direction), BettingInsight> = HashMap::new();
    // First-seen group order, so output stays stable for callers
    let mut order: Vec<(String, Market, Direction)> = Vec::new();

    for insight in insights {
        let key = (insight.team.clone(), insight.market, direction_of(&insight));
        match best.get_mut(&key) {
            None => {
                order.push(key.clone());
                best.insert(key, insight);
            }
            Some(current) => {
                if prefer(&insight, current) {
                    *current = insight;
                }
            }
        }
    }

    order.into_iter().filter_map(|k| best.remove(&k)).collect()
}

fn prefer(candidate: &BettingInsight, current: &BettingInsight) -> bool {
    match direction_of(candidate) {
        Direction::Over | Direction::OrMore => candidate.threshold > current.threshold,
        Direction::Under => candidate.threshold < current.threshold,
        // Binary lines share a nominal threshold; the longer pattern wins,
        // then the better value score
        Direction::Binary(_) => {
            candidate.matches_analyzed > current.matches_analyzed
                || (candidate.matches_analyzed == current.matches_analyzed
                    && candidate.value > current.value)
        }
    }
}
