use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::EdgeError;
use crate::impact_registry::{ImpactRegistry, normalize_name};
use crate::projection::ProjectionResult;

const WEIGHTS_VERSION: u32 = 1;

/// Observation error (points) beyond which a weight is nudged.
pub const CORRECTION_THRESHOLD: f64 = 5.0;
pub const CORRECTION_STEP: f64 = 0.5;
/// Starting weight for a player the memory has never seen.
pub const DEFAULT_WEIGHT: f64 = 5.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WeightsFile {
    version: u32,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default)]
    weights: BTreeMap<String, WeightEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WeightEntry {
    player: String,
    boost: f64,
}

/// Player -> learned boost. Keys are normalized names; the display name from
/// the last write is kept alongside.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightsMemory {
    entries: BTreeMap<String, (String, f64)>,
}

impl WeightsMemory {
    /// Default memory: every teammate starts at its registry magnitude.
    pub fn from_registry(registry: &ImpactRegistry) -> Self {
        let mut memory = Self::default();
        for edge in registry.edges() {
            if memory.get(&edge.teammate).is_none() {
                memory.set(&edge.teammate, edge.boost);
            }
        }
        memory
    }

    pub fn get(&self, player: &str) -> Option<f64> {
        self.entries.get(&normalize_name(player)).map(|(_, w)| *w)
    }

    pub fn set(&mut self, player: &str, boost: f64) {
        self.entries
            .insert(normalize_name(player), (player.trim().to_string(), boost));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.values().map(|(name, w)| (name.as_str(), *w))
    }
}

/// Single-step nudge of each weight whose projection missed the observed
/// value by more than [`CORRECTION_THRESHOLD`].
///
/// `actuals` is keyed by player name in any spelling `normalize_name` folds
/// together. Returns the updated memory and whether anything moved.
pub fn correct(
    memory: &WeightsMemory,
    results: &[ProjectionResult],
    actuals: &HashMap<String, f64>,
) -> (WeightsMemory, bool) {
    let observed: HashMap<String, f64> = actuals
        .iter()
        .map(|(name, v)| (normalize_name(name), *v))
        .collect();

    let mut updated = memory.clone();
    let mut changed = false;
    let mut seen = HashSet::new();
    for result in results {
        let key = normalize_name(&result.player);
        if !seen.insert(key.clone()) {
            continue;
        }
        let Some(actual) = observed.get(&key).copied() else {
            continue;
        };
        let diff = actual - result.projection;
        if diff.abs() <= CORRECTION_THRESHOLD {
            continue;
        }
        let current = updated.get(&result.player).unwrap_or(DEFAULT_WEIGHT);
        let step = if diff > 0.0 {
            CORRECTION_STEP
        } else {
            -CORRECTION_STEP
        };
        updated.set(&result.player, current + step);
        changed = true;
        info!(
            player = %result.player,
            projection = result.projection,
            actual,
            from = current,
            to = current + step,
            "weight corrected"
        );
    }
    (updated, changed)
}

/// File-backed weights. Not safe against concurrent writers; one run at a
/// time is assumed.
#[derive(Debug, Clone)]
pub struct WeightsStore {
    path: PathBuf,
}

impl WeightsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: an absent or unreadable file yields `defaults`.
    pub fn load(&self, defaults: &WeightsMemory) -> WeightsMemory {
        match self.try_load() {
            Ok(Some(memory)) => memory,
            Ok(None) => {
                info!(path = %self.path.display(), "no weights file yet, using defaults");
                defaults.clone()
            }
            Err(err) => {
                let err = EdgeError::persistence(&self.path, &err);
                warn!(error = %err, "using default weights");
                defaults.clone()
            }
        }
    }

    fn try_load(&self) -> Result<Option<WeightsMemory>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path).context("read weights")?;
        let file = serde_json::from_str::<WeightsFile>(&raw).context("parse weights")?;
        if file.version != WEIGHTS_VERSION {
            anyhow::bail!("unsupported weights version {}", file.version);
        }
        let mut memory = WeightsMemory::default();
        for entry in file.weights.into_values() {
            if entry.boost.is_finite() {
                memory.set(&entry.player, entry.boost);
            }
        }
        Ok(Some(memory))
    }

    pub fn save(&self, memory: &WeightsMemory) -> Result<(), EdgeError> {
        self.try_save(memory)
            .map_err(|err| EdgeError::persistence(&self.path, &err))
    }

    fn try_save(&self, memory: &WeightsMemory) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).context("create weights dir")?;
        }
        let file = WeightsFile {
            version: WEIGHTS_VERSION,
            updated_at: Some(chrono::Utc::now().to_rfc3339()),
            weights: memory
                .entries
                .iter()
                .map(|(key, (player, boost))| {
                    (
                        key.clone(),
                        WeightEntry {
                            player: player.clone(),
                            boost: *boost,
                        },
                    )
                })
                .collect(),
        };
        let tmp = self.path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(&file).context("serialize weights")?;
        fs::write(&tmp, json).context("write weights")?;
        fs::rename(&tmp, &self.path).context("swap weights")?;
        info!(path = %self.path.display(), players = memory.len(), "weights saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::Grade;

    fn result(player: &str, projection: f64) -> ProjectionResult {
        ProjectionResult {
            player: player.to_string(),
            baseline: projection,
            boost: 0.0,
            projection,
            edge_pct: 0.0,
            grade: Grade::Pass,
        }
    }

    fn actuals(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(p, v)| (p.to_string(), *v)).collect()
    }

    #[test]
    fn large_miss_nudges_weight_up() {
        let mut memory = WeightsMemory::default();
        memory.set("P", 5.0);
        let (updated, changed) = correct(&memory, &[result("P", 28.0)], &actuals(&[("P", 35.0)]));
        assert!(changed);
        assert_eq!(updated.get("P"), Some(5.5));
    }

    #[test]
    fn overshoot_nudges_weight_down_from_default() {
        let memory = WeightsMemory::default();
        let (updated, changed) = correct(&memory, &[result("Q", 30.0)], &actuals(&[("q", 20.0)]));
        assert!(changed);
        assert_eq!(updated.get("Q"), Some(4.5));
    }

    #[test]
    fn miss_of_exactly_threshold_is_ignored() {
        let mut memory = WeightsMemory::default();
        memory.set("P", 5.0);
        let (updated, changed) = correct(&memory, &[result("P", 30.0)], &actuals(&[("P", 35.0)]));
        assert!(!changed);
        assert_eq!(updated, memory);
    }

    #[test]
    fn repeated_player_is_nudged_once() {
        let mut memory = WeightsMemory::default();
        memory.set("Tyrese Maxey", 6.5);
        let results = [result("Tyrese Maxey", 28.0), result("tyrese maxey", 28.0)];
        let (updated, changed) = correct(&memory, &results, &actuals(&[("Tyrese Maxey", 40.0)]));
        assert!(changed);
        assert_eq!(updated.get("Tyrese Maxey"), Some(7.0));
    }

    #[test]
    fn players_without_actuals_are_untouched() {
        let memory = WeightsMemory::default();
        let (updated, changed) = correct(&memory, &[result("P", 10.0)], &HashMap::new());
        assert!(!changed);
        assert!(updated.is_empty());
    }
}
