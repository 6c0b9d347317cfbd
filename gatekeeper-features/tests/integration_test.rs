//! Integration tests for gatekeeper-features

use chrono::{TimeDelta, TimeZone, Utc};
use gatekeeper_features::*;
use gatekeeper_store::{FileStore, KeyValueStore, MemoryStore, StoreError, StoreResult, StoredValue};
use std::sync::Arc;

/// A store whose every operation fails.
struct UnavailableStore;

impl KeyValueStore for UnavailableStore {
    fn get(&self, _key: &str) -> StoreResult<Option<StoredValue>> {
        Err(StoreError::unavailable("offline"))
    }

    fn set(&self, _key: &str, _value: StoredValue) -> StoreResult<()> {
        Err(StoreError::unavailable("offline"))
    }

    fn remove(&self, _key: &str) -> StoreResult<()> {
        Err(StoreError::unavailable("offline"))
    }

    fn keys_with_prefix(&self, _prefix: &str) -> StoreResult<Vec<String>> {
        Err(StoreError::unavailable("offline"))
    }

    fn store_type(&self) -> &'static str {
        "unavailable"
    }
}

#[test]
fn test_bucket_is_stable_across_restarts() {
    let store = Arc::new(MemoryStore::new());

    let first_launch = Gatekeeper::new(store.clone());
    first_launch.configure("maps", FeatureConfiguration::percentage(50.0));
    let device = first_launch.device_identity();
    let decided = first_launch.should_allow("maps");
    drop(first_launch);

    for _ in 0..10 {
        let relaunch = Gatekeeper::new(store.clone());
        relaunch.configure("maps", FeatureConfiguration::percentage(50.0));

        assert_eq!(relaunch.device_identity(), device);
        assert_eq!(relaunch.should_allow("maps"), decided);
    }
}

#[test]
fn test_percentage_change_does_not_reroll() {
    let store = Arc::new(MemoryStore::new());
    let gatekeeper = Gatekeeper::new(store);

    gatekeeper.configure("sdk", FeatureConfiguration::percentage(100.0));
    assert!(gatekeeper.should_allow("sdk"));

    gatekeeper.configure("sdk", FeatureConfiguration::percentage(0.0));
    assert!(gatekeeper.should_allow("sdk"));
}

#[test]
fn test_file_store_keeps_decisions_and_first_seen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gatekeeper.json");
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let clock = Arc::new(ManualClock::new(start));

    {
        let store = Arc::new(FileStore::with_path(&path).unwrap());
        let gatekeeper = Gatekeeper::builder()
            .store(store)
            .clock(clock.clone())
            .build();
        gatekeeper.configure("trial", FeatureConfiguration::expiration(7));
        assert!(gatekeeper.should_allow("trial"));
    }

    clock.advance(TimeDelta::days(8));

    let store = Arc::new(FileStore::with_path(&path).unwrap());
    let gatekeeper = Gatekeeper::builder()
        .store(store)
        .clock(clock.clone())
        .build();
    gatekeeper.configure("trial", FeatureConfiguration::expiration(7));

    assert_eq!(
        gatekeeper.evaluate("trial"),
        Decision {
            allowed: false,
            rule: DecisionRule::Expiration
        }
    );
}

#[test]
fn test_reads_state_written_under_the_legacy_key_shape() {
    let store = Arc::new(MemoryStore::new());
    store
        .set("com.sdkgatekeeper.deviceId", StoredValue::from("6F1C-LEGACY"))
        .unwrap();
    store
        .set(
            "com.sdkgatekeeper.percentage.payments.6F1C-LEGACY",
            StoredValue::from(false),
        )
        .unwrap();

    let gatekeeper = Gatekeeper::new(store);
    gatekeeper.configure("payments", FeatureConfiguration::percentage(100.0));

    assert_eq!(gatekeeper.device_identity().as_str(), "6F1C-LEGACY");
    assert!(!gatekeeper.should_allow("payments"));
}

#[test]
fn test_unavailable_store_degrades_to_absent() {
    let gatekeeper = Gatekeeper::new(Arc::new(UnavailableStore));
    gatekeeper.configure("open", FeatureConfiguration::new());
    gatekeeper.configure("trial", FeatureConfiguration::expiration(1));
    gatekeeper.configure("all", FeatureConfiguration::percentage(100.0));

    assert!(gatekeeper.should_allow("open"));
    assert!(gatekeeper.should_allow("trial"));
    assert!(gatekeeper.should_allow("all"));
    assert!(!gatekeeper.should_allow("unknown"));

    gatekeeper.reset();
    gatekeeper.wipe_all();
}

#[test]
fn test_concurrent_first_queries_agree() {
    let gatekeeper = Arc::new(Gatekeeper::builder().build());
    gatekeeper.configure("race", FeatureConfiguration::percentage(50.0));

    let results: Vec<bool> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let gatekeeper = gatekeeper.clone();
                s.spawn(move || gatekeeper.should_allow("race"))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(results.iter().all(|r| *r == results[0]));
}

#[test]
fn test_settings_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let settings_path = dir.path().join("gatekeeper.toml");
    let store_path = dir.path().join("state").join("gatekeeper.json");
    std::fs::write(
        &settings_path,
        format!(
            r#"
namespace = "com.example.app"

[storage]
backend = "file"
path = "{}"

[features.everyone]
traffic_percentage = 100.0

[features.nobody]
traffic_percentage = 0.0
"#,
            store_path.display().to_string().replace('\\', "\\\\")
        ),
    )
    .unwrap();

    let gatekeeper = GatekeeperSettings::from_file(&settings_path)
        .unwrap()
        .build()
        .unwrap();

    assert!(gatekeeper.should_allow("everyone"));
    assert!(!gatekeeper.should_allow("nobody"));
    assert_eq!(gatekeeper.namespace(), "com.example.app");

    let store = FileStore::with_path(&store_path).unwrap();
    let device = gatekeeper.device_identity();
    assert_eq!(
        store
            .get_bool(&format!("com.example.app.percentage.everyone.{}", device))
            .unwrap(),
        Some(true)
    );
}
