use std::collections::HashMap;
use std::fs;

use injury_edge::grading::Grade;
use injury_edge::impact_registry::ImpactRegistry;
use injury_edge::projection::ProjectionResult;
use injury_edge::weights::{WeightsMemory, WeightsStore, correct};
use tempfile::TempDir;

fn projected(player: &str, projection: f64) -> ProjectionResult {
    ProjectionResult {
        player: player.to_string(),
        baseline: projection - 5.0,
        boost: 5.0,
        projection,
        edge_pct: 0.0,
        grade: Grade::Elite,
    }
}

#[test]
fn absent_file_yields_registry_defaults() {
    let dir = TempDir::new().expect("tempdir");
    let registry = ImpactRegistry::builtin();
    let defaults = WeightsMemory::from_registry(&registry);
    let loaded = WeightsStore::new(dir.path().join("weights.json")).load(&defaults);
    assert_eq!(loaded, defaults);
    assert_eq!(loaded.get("Tyrese Maxey"), Some(6.5));
}

#[test]
fn corrupt_file_yields_defaults() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("weights.json");
    fs::write(&path, "{not json").expect("write");
    let defaults = WeightsMemory::from_registry(&ImpactRegistry::builtin());
    assert_eq!(WeightsStore::new(&path).load(&defaults), defaults);
}

#[test]
fn single_step_correction_is_persisted() {
    let dir = TempDir::new().expect("tempdir");
    let store = WeightsStore::new(dir.path().join("nested").join("weights.json"));
    let mut memory = WeightsMemory::default();
    memory.set("P", 5.0);

    let actuals: HashMap<String, f64> = [("P".to_string(), 35.0)].into_iter().collect();
    let (updated, changed) = correct(&memory, &[projected("P", 28.0)], &actuals);
    assert!(changed);
    assert_eq!(updated.get("P"), Some(5.5));

    store.save(&updated).expect("save");
    let reloaded = store.load(&WeightsMemory::default());
    assert_eq!(reloaded.get("P"), Some(5.5));
    assert!(!store.path().with_extension("json.tmp").exists());
}
