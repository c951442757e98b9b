use serde::{Deserialize, Serialize};

use crate::grading::{Grade, grade};
use crate::impact_registry::{BannedSet, BoostTable, normalize_name};
use crate::lines::LineEntry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionResult {
    pub player: String,
    pub baseline: f64,
    pub boost: f64,
    pub projection: f64,
    pub edge_pct: f64,
    pub grade: Grade,
}

/// Edge is boost over baseline, in percent. Boost is the numerator even if
/// projections stop being additive. A non-positive baseline yields 0.
pub fn edge_pct(baseline: f64, boost: f64) -> f64 {
    if baseline > 0.0 {
        boost / baseline * 100.0
    } else {
        0.0
    }
}

/// Projects every non-banned line. Banned players are dropped entirely and
/// the remaining entries keep their input order.
pub fn project(lines: &[LineEntry], boosts: &BoostTable, banned: &BannedSet) -> Vec<ProjectionResult> {
    let banned_norm: BannedSet = banned.iter().map(|s| normalize_name(s)).collect();
    lines
        .iter()
        .filter(|line| !banned_norm.contains(&normalize_name(&line.player)))
        .map(|line| {
            let boost = boosts
                .get(&normalize_name(&line.player))
                .copied()
                .unwrap_or(0.0);
            let edge = edge_pct(line.baseline, boost);
            ProjectionResult {
                player: line.player.clone(),
                baseline: line.baseline,
                boost,
                projection: line.baseline + boost,
                edge_pct: edge,
                grade: grade(edge),
            }
        })
        .collect()
}
