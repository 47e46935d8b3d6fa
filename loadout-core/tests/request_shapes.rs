use std::collections::BTreeMap;
use std::hash::Hasher;

use loadout_core::{
    Catalog, ConfigError, SearchConfig, SolveResponse, Solver, SolverConfiguration, Stat,
    StatVector, TuningPlan, catalog,
};
use serde_json::{Value, json};
use twox_hash::XxHash64;

const FULL_REQUEST: &str = r#"{
    "targets": {"health": 100, "melee": 40, "grenade": 60, "super": 30, "class": 80, "weapons": 110},
    "fragments": {"health": 10, "class": -10},
    "tuning": {"kind": "auto", "least_favored": "melee"},
    "minor_slots": 1,
    "custom_exotic": {"enabled": true, "vector": {"health": 30, "class": 20, "weapons": 12}}
}"#;

fn snapshot_hash(bytes: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(bytes);
    hasher.finish()
}

fn catalog_snapshot(catalog: &Catalog) -> String {
    let mut snapshot = BTreeMap::new();
    for archetype in catalog.legendary.iter().chain(&catalog.exotic) {
        snapshot.insert(
            archetype.to_string(),
            serde_json::to_value(archetype.vector).unwrap(),
        );
    }
    serde_json::to_string_pretty(&snapshot).unwrap()
}

#[test]
fn catalog_snapshot_is_stable() {
    let shared = catalog_snapshot(catalog());
    let rebuilt = catalog_snapshot(&Catalog::build());
    assert_eq!(snapshot_hash(shared.as_bytes()), snapshot_hash(rebuilt.as_bytes()));
    let parsed: BTreeMap<String, Value> = serde_json::from_str(&shared).unwrap();
    assert_eq!(parsed.len(), 48);
    assert_eq!(
        parsed["Exotic Paragon (class)"],
        json!({"health": 5, "melee": 20, "grenade": 5, "super": 30, "class": 12, "weapons": 5})
    );
}

#[test]
fn full_request_parses_and_validates() {
    let config = SolverConfiguration::from_json(FULL_REQUEST).unwrap();
    config.validate().unwrap();
    assert_eq!(config.targets[Stat::Weapons], 110);
    assert_eq!(config.fragments[Stat::Class], -10);
    assert_eq!(config.fragments[Stat::Grenade], 0);
    assert_eq!(
        config.tuning,
        TuningPlan::Auto {
            least_favored: Some(Stat::Melee)
        }
    );
    assert_eq!(config.major_slots(), 4);
    assert!(config.custom_exotic.enabled);
    assert_eq!(config.custom_exotic.vector[Stat::Health], 30);
}

#[test]
fn fingerprint_survives_json_round_trip() {
    let config = SolverConfiguration::from_json(FULL_REQUEST).unwrap();
    let reparsed = SolverConfiguration::from_json(&config.to_json().unwrap()).unwrap();
    assert_eq!(config, reparsed);
    assert_eq!(config.fingerprint(), reparsed.fingerprint());
}

#[test]
fn custom_exotic_values_are_checked_only_when_enabled() {
    let mut config = SolverConfiguration::from_json(FULL_REQUEST).unwrap();
    config.custom_exotic.vector[Stat::Super] = 45;
    assert_eq!(config.validate(), Ok(()));
    config.custom_exotic.vector[Stat::Super] = 46;
    assert_eq!(
        config.validate(),
        Err(ConfigError::CustomExoticOutOfRange {
            stat: Stat::Super,
            value: 46
        })
    );
    config.custom_exotic.enabled = false;
    assert_eq!(config.validate(), Ok(()));
}

#[test]
fn response_serializes_every_field() {
    let mut solver = Solver::new(SearchConfig::with_beam_widths(&[20])).unwrap();
    let config = SolverConfiguration::with_targets(StatVector::splat(30));
    let response = solver.solve(&config).unwrap();
    let value = serde_json::to_value(&response).unwrap();
    for key in [
        "feasible",
        "chosen_pieces",
        "totals_final",
        "totals_raw",
        "effective_tuning_rows",
        "beam_width",
        "fingerprint",
    ] {
        assert!(value.get(key).is_some(), "missing {key}");
    }
    assert_eq!(value["chosen_pieces"].as_array().map(Vec::len), Some(5));
    assert_eq!(value["effective_tuning_rows"].as_array().map(Vec::len), Some(4));

    let back: SolveResponse = serde_json::from_value(value).unwrap();
    assert_eq!(back, response);
}
