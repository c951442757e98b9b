use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::weights::WeightsMemory;

pub const REGISTRY_VERSION: u32 = 1;

/// Star name -> set of inactive stars for the current run.
pub type BannedSet = HashSet<String>;

/// Normalized teammate name -> accumulated boost.
pub type BoostTable = HashMap<String, f64>;

const BUILTIN_IMPACT_MAP: &[(&str, &[(&str, f64)])] = &[
    ("Joel Embiid", &[("Tyrese Maxey", 6.5), ("Kelly Oubre Jr.", 3.0)]),
    (
        "Giannis Antetokounmpo",
        &[("Damian Lillard", 5.5), ("Khris Middleton", 3.5), ("Bobby Portis", 3.0)],
    ),
    ("Nikola Jokic", &[("Jamal Murray", 6.0), ("Michael Porter Jr.", 4.0)]),
    ("LeBron James", &[("Anthony Davis", 5.0), ("Austin Reaves", 4.5)]),
    ("Stephen Curry", &[("Jonathan Kuminga", 4.0), ("Andrew Wiggins", 3.5)]),
    ("Luka Doncic", &[("Kyrie Irving", 6.0), ("P.J. Washington", 2.5)]),
    ("Kevin Durant", &[("Devin Booker", 5.0), ("Bradley Beal", 3.5)]),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactEdge {
    pub star: String,
    pub teammate: String,
    pub boost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeammateArtifact {
    pub player: String,
    pub boost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StarArtifact {
    pub star: String,
    #[serde(default)]
    pub teammates: Vec<TeammateArtifact>,
}

/// On-disk shape of a custom impact map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactRegistryArtifact {
    pub version: u32,
    #[serde(default)]
    pub stars: Vec<StarArtifact>,
}

#[derive(Debug, Clone)]
struct StarEntry {
    name: String,
    edges: Vec<ImpactEdge>,
}

/// Static star -> [(teammate, boost)] table, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ImpactRegistry {
    stars: Vec<StarEntry>,
}

impl ImpactRegistry {
    pub fn builtin() -> Self {
        let stars = BUILTIN_IMPACT_MAP
            .iter()
            .map(|(star, teammates)| StarArtifact {
                star: star.to_string(),
                teammates: teammates
                    .iter()
                    .map(|(player, boost)| TeammateArtifact {
                        player: player.to_string(),
                        boost: *boost,
                    })
                    .collect(),
            })
            .collect();
        Self::from_artifact(ImpactRegistryArtifact {
            version: REGISTRY_VERSION,
            stars,
        })
    }

    pub fn from_artifact(artifact: ImpactRegistryArtifact) -> Self {
        let mut stars: Vec<StarEntry> = Vec::with_capacity(artifact.stars.len());
        for item in artifact.stars {
            let name = item.star.trim().to_string();
            if normalize_name(&name).is_empty() {
                continue;
            }
            let edges = item
                .teammates
                .into_iter()
                .filter(|t| t.boost.is_finite() && t.boost > 0.0)
                .filter(|t| !normalize_name(&t.player).is_empty())
                .map(|t| ImpactEdge {
                    star: name.clone(),
                    teammate: t.player.trim().to_string(),
                    boost: t.boost,
                })
                .collect();

            // Repeated stars extend the first declaration.
            let norm = normalize_name(&name);
            if let Some(existing) = stars.iter_mut().find(|s| normalize_name(&s.name) == norm) {
                existing.edges.extend(edges);
            } else {
                stars.push(StarEntry { name, edges });
            }
        }
        Self { stars }
    }

    pub fn stars(&self) -> impl Iterator<Item = &str> {
        self.stars.iter().map(|s| s.name.as_str())
    }

    pub fn edges_for(&self, star: &str) -> &[ImpactEdge] {
        let norm = normalize_name(star);
        self.stars
            .iter()
            .find(|s| normalize_name(&s.name) == norm)
            .map(|s| s.edges.as_slice())
            .unwrap_or(&[])
    }

    pub fn edges(&self) -> impl Iterator<Item = &ImpactEdge> {
        self.stars.iter().flat_map(|s| s.edges.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    /// Sums edge magnitudes from every banned star into a per-teammate boost.
    /// A learned weight, when present, replaces the registry magnitude for
    /// that teammate.
    pub fn boost_table(&self, banned: &BannedSet, weights: Option<&WeightsMemory>) -> BoostTable {
        let banned_norm: HashSet<String> = banned.iter().map(|s| normalize_name(s)).collect();
        let mut out = BoostTable::new();
        for star in &self.stars {
            if !banned_norm.contains(&normalize_name(&star.name)) {
                continue;
            }
            for edge in &star.edges {
                let key = normalize_name(&edge.teammate);
                let magnitude = weights
                    .and_then(|w| w.get(&edge.teammate))
                    .filter(|w| w.is_finite() && *w > 0.0)
                    .unwrap_or(edge.boost);
                *out.entry(key).or_insert(0.0) += magnitude;
            }
        }
        debug!(banned = banned.len(), boosted = out.len(), "built boost table");
        out
    }
}

/// Reads a registry artifact, falling back to the built-in map when the file
/// is missing or malformed.
pub fn load_impact_registry(path: Option<&Path>) -> ImpactRegistry {
    let Some(path) = path else {
        return ImpactRegistry::builtin();
    };
    match read_artifact(path) {
        Ok(artifact) if artifact.version == REGISTRY_VERSION => {
            ImpactRegistry::from_artifact(artifact)
        }
        Ok(artifact) => {
            warn!(
                path = %path.display(),
                version = artifact.version,
                "unsupported impact registry version, using built-in map"
            );
            ImpactRegistry::builtin()
        }
        Err(err) => {
            warn!(path = %path.display(), error = %format!("{err:#}"), "using built-in impact map");
            ImpactRegistry::builtin()
        }
    }
}

fn read_artifact(path: &Path) -> Result<ImpactRegistryArtifact> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read impact registry {}", path.display()))?;
    serde_json::from_str::<ImpactRegistryArtifact>(&raw)
        .with_context(|| format!("parse impact registry {}", path.display()))
}

pub fn normalize_name(input: &str) -> String {
    let lower = input.trim().to_ascii_lowercase();
    let mut out = String::with_capacity(lower.len());
    let mut prev_us = false;
    for ch in lower.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            prev_us = false;
        } else if ch == '.' || ch == '\'' {
            // "P.J." and "De'Aaron" collapse without a separator.
            continue;
        } else if !prev_us && !out.is_empty() {
            out.push('_');
            prev_us = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn banned(names: &[&str]) -> BannedSet {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn normalize_name_compacts() {
        assert_eq!(normalize_name(" Tyrese  Maxey "), "tyrese_maxey");
        assert_eq!(normalize_name("P.J. Washington"), "pj_washington");
        assert_eq!(normalize_name("Kelly Oubre Jr."), "kelly_oubre_jr");
        assert_eq!(normalize_name("  "), "");
    }

    #[test]
    fn boost_is_zero_without_banned_stars() {
        let reg = ImpactRegistry::builtin();
        assert!(reg.boost_table(&BannedSet::new(), None).is_empty());
    }

    #[test]
    fn boosts_accumulate_across_stars() {
        let reg = ImpactRegistry::from_artifact(ImpactRegistryArtifact {
            version: 1,
            stars: vec![
                StarArtifact {
                    star: "A".into(),
                    teammates: vec![TeammateArtifact { player: "T".into(), boost: 2.0 }],
                },
                StarArtifact {
                    star: "B".into(),
                    teammates: vec![TeammateArtifact { player: "t".into(), boost: 1.5 }],
                },
            ],
        });
        let table = reg.boost_table(&banned(&["A", "B"]), None);
        assert_eq!(table.get("t").copied(), Some(3.5));
    }

    #[test]
    fn learned_weight_replaces_registry_magnitude() {
        let reg = ImpactRegistry::builtin();
        let mut weights = WeightsMemory::default();
        weights.set("Tyrese Maxey", 8.0);
        let table = reg.boost_table(&banned(&["Joel Embiid"]), Some(&weights));
        assert_eq!(table.get("tyrese_maxey").copied(), Some(8.0));
        assert_eq!(table.get("kelly_oubre_jr").copied(), Some(3.0));
    }

    #[test]
    fn exhausted_learned_weight_falls_back_to_registry() {
        let reg = ImpactRegistry::builtin();
        let mut weights = WeightsMemory::default();
        weights.set("Kelly Oubre Jr.", -0.5);
        weights.set("Tyrese Maxey", 0.0);
        let table = reg.boost_table(&banned(&["Joel Embiid"]), Some(&weights));
        assert_eq!(table.get("kelly_oubre_jr").copied(), Some(3.0));
        assert_eq!(table.get("tyrese_maxey").copied(), Some(6.5));
    }

    #[test]
    fn invalid_edges_are_dropped() {
        let reg = ImpactRegistry::from_artifact(ImpactRegistryArtifact {
            version: 1,
            stars: vec![StarArtifact {
                star: "S".into(),
                teammates: vec![
                    TeammateArtifact { player: "T".into(), boost: -1.0 },
                    TeammateArtifact { player: "U".into(), boost: f64::NAN },
                    TeammateArtifact { player: "V".into(), boost: 2.0 },
                ],
            }],
        });
        assert_eq!(reg.edges_for("S").len(), 1);
        assert_eq!(reg.edges_for("s")[0].teammate, "V");
    }

    #[test]
    fn missing_registry_file_falls_back_to_builtin() {
        let reg = load_impact_registry(Some(Path::new("/nonexistent/impact.json")));
        assert!(reg.stars().any(|s| s == "Joel Embiid"));
    }
}
