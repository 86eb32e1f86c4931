//! Conflict resolution and final ranking.
//!
//! Takes the full contextualized candidate list for a fixture, removes
//! duplicates and contradictory signals, and hands back a ranked list plus
//! a human-readable summary. Confidence and value fields pass through
//! untouched; this layer only selects and orders.

use std::collections::HashMap;

use crate::context::ContextualInsight;
use crate::markets::models::{BettingInsight, ConfidenceLevel, Side};
use crate::markets::{Comparison, Market};

/// Output of a resolution pass.
#[derive(Debug, Clone)]
pub struct ResolvedInsights {
    pub insights: Vec<ContextualInsight>,
    pub summary: String,
    pub duplicates_dropped: usize,
    pub conflicts_dropped: usize,
}

type DupKey = (String, Market, Comparison, u64, Option<Side>);

fn dup_key(insight: &BettingInsight) -> DupKey {
    (
        insight.team.clone(),
        insight.market,
        insight.comparison,
        insight.threshold.to_bits(),
        insight.side,
    )
}

/// Whether `a` outranks `b`: higher confidence tier, then higher value.
fn beats(a: &ContextualInsight, b: &ContextualInsight) -> bool {
    a.insight.confidence > b.insight.confidence
        || (a.insight.confidence == b.insight.confidence && a.insight.value > b.insight.value)
}

/// Over and under on the same team, market and line cannot both stand.
fn opposed(a: &BettingInsight, b: &BettingInsight) -> bool {
    a.team == b.team
        && a.market == b.market
        && (a.threshold - b.threshold).abs() < 1e-9
        && matches!(
            (a.comparison, b.comparison),
            (Comparison::Over, Comparison::Under) | (Comparison::Under, Comparison::Over)
        )
}

/// Resolve a fixture's candidate list.
pub fn resolve(candidates: Vec<ContextualInsight>) -> ResolvedInsights {
    // 1. Exact duplicates: same team, market, direction and line
    let mut by_key: HashMap<DupKey, ContextualInsight> = HashMap::new();
    let mut order: Vec<DupKey> = Vec::new();
    let mut duplicates_dropped = 0usize;

    for candidate in candidates {
        let key = dup_key(&candidate.insight);
        match by_key.get_mut(&key) {
            None => {
                order.push(key.clone());
                by_key.insert(key, candidate);
            }
            Some(existing) => {
                duplicates_dropped += 1;
                if beats(&candidate, existing) {
                    *existing = candidate;
                }
            }
        }
    }
    let kept: Vec<ContextualInsight> = order.into_iter().filter_map(|k| by_key.remove(&k)).collect();

    // 2. Contradictions: opposite directions on one line keep the stronger
    let mut dropped = vec![false; kept.len()];
    let mut conflicts_dropped = 0usize;
    for i in 0..kept.len() {
        for j in (i + 1)..kept.len() {
            if dropped[i] || dropped[j] {
                continue;
            }
            if opposed(&kept[i].insight, &kept[j].insight) {
                let loser = if beats(&kept[j], &kept[i]) { i } else { j };
                dropped[loser] = true;
                conflicts_dropped += 1;
            }
        }
    }

    // 3. A fixture cannot lean BTTS Yes and BTTS No at once; the stronger
    //    side wins regardless of which team carried the pattern
    let strongest_side = |side: Side| {
        kept.iter()
            .enumerate()
            .filter(|(i, c)| {
                !dropped[*i]
                    && c.insight.market == Market::BothTeamsToScore
                    && c.insight.side == Some(side)
            })
            .max_by(|(_, a), (_, b)| {
                a.insight
                    .confidence
                    .cmp(&b.insight.confidence)
                    .then(a.insight.value.total_cmp(&b.insight.value))
            })
            .map(|(i, _)| i)
    };
    if let (Some(yes_idx), Some(no_idx)) = (strongest_side(Side::Yes), strongest_side(Side::No)) {
        let losing_side = if beats(&kept[yes_idx], &kept[no_idx]) {
            Side::No
        } else {
            Side::Yes
        };
        for (i, candidate) in kept.iter().enumerate() {
            if !dropped[i]
                && candidate.insight.market == Market::BothTeamsToScore
                && candidate.insight.side == Some(losing_side)
            {
                dropped[i] = true;
                conflicts_dropped += 1;
            }
        }
    }

    let mut insights: Vec<ContextualInsight> = kept
        .into_iter()
        .zip(dropped)
        .filter(|(_, dropped)| !dropped)
        .map(|(c, _)| c)
        .collect();

    // 4. Final order: confidence tier, then expected value
    insights.sort_by(|a, b| {
        b.insight
            .confidence
            .cmp(&a.insight.confidence)
            .then(b.insight.value.total_cmp(&a.insight.value))
    });

    let summary = summarize(&insights, duplicates_dropped, conflicts_dropped);

    ResolvedInsights {
        insights,
        summary,
        duplicates_dropped,
        conflicts_dropped,
    }
}

/// Order a plain insight list by confidence tier, then value.
pub fn rank(insights: &mut [BettingInsight]) {
    insights.sort_by(|a, b| {
        b.confidence
            .cmp(&a.confidence)
            .then(b.value.total_cmp(&a.value))
    });
}

fn summarize(
    insights: &[ContextualInsight],
    duplicates_dropped: usize,
    conflicts_dropped: usize,
) -> String {
    if insights.is_empty() {
        return "No insights survived resolution".to_string();
    }

    let count_tier = |tier: ConfidenceLevel| {
        insights
            .iter()
            .filter(|c| c.insight.confidence == tier)
            .count()
    };
    let mut summary = format!(
        "{} insights ranked ({} high, {} medium, {} low confidence)",
        insights.len(),
        count_tier(ConfidenceLevel::High),
        count_tier(ConfidenceLevel::Medium),
        count_tier(ConfidenceLevel::Low),
    );
    if duplicates_dropped > 0 {
        summary.push_str(&format!(", {duplicates_dropped} duplicate(s) removed"));
    }
    if conflicts_dropped > 0 {
        summary.push_str(&format!(", {conflicts_dropped} conflicting signal(s) removed"));
    }
    summary
}
