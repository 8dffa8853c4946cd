//! Property-based tests for change recording and version transitions.
//!
//! - Versions never go backwards and only move when something changed
//! - Change detection is symmetric and ignores key order and number form
//! - Every recorded field lands in exactly one bucket

use catalog_repo::differ::{has_changed, json_equivalent};
use catalog_repo::ChangeRecorder;
use catalog_types::{EntityVersion, VersionStep};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

// =============================================================================
// HELPER STRATEGIES
// =============================================================================

fn version_strategy() -> impl Strategy<Value = EntityVersion> {
    (1u32..10_000).prop_map(|tenths| EntityVersion::new(f64::from(tenths) / 10.0).unwrap())
}

fn step_strategy() -> impl Strategy<Value = VersionStep> {
    prop_oneof![Just(VersionStep::Minor), Just(VersionStep::Major)]
}

fn json_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        (-1000i64..1000).prop_map(Value::from),
        "[a-z]{0,8}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn reversed_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut reversed = Map::new();
            for (k, v) in map.iter().rev() {
                reversed.insert(k.clone(), reversed_keys(v));
            }
            Value::Object(reversed)
        }
        Value::Array(items) => Value::Array(items.iter().map(reversed_keys).collect()),
        other => other.clone(),
    }
}

// =============================================================================
// VERSION TRANSITIONS
// =============================================================================

proptest! {
    #[test]
    fn versions_strictly_increase_on_change(
        start in version_strategy(),
        step in step_strategy(),
        old in json_strategy(),
        new in json_strategy(),
    ) {
        let mut recorder = ChangeRecorder::new();
        let recorded = recorder.record_change("field", Some(old), Some(new));
        let transition = recorder.finalize(start, step);
        if recorded {
            prop_assert!(transition.version > start);
            prop_assert_eq!(transition.change_description.unwrap().previous_version, start);
        } else {
            prop_assert_eq!(transition.version, start);
            prop_assert!(transition.change_description.is_none());
        }
    }

    #[test]
    fn repeated_minor_steps_stay_on_tenths(steps in 1usize..200) {
        let mut version = EntityVersion::INITIAL;
        for _ in 0..steps {
            let mut recorder = ChangeRecorder::new();
            recorder.record_change("n", Some(json!(1)), Some(json!(2)));
            version = recorder.finalize(version, VersionStep::Minor).version;
        }
        let expected = EntityVersion::new((steps as f64 + 1.0) / 10.0).unwrap();
        prop_assert_eq!(version, expected);
        prop_assert_eq!(format!("{version}"), format!("{:.1}", (steps as f64 + 1.0) / 10.0));
    }

    // =========================================================================
    // CHANGE DETECTION
    // =========================================================================

    #[test]
    fn change_detection_is_symmetric(a in json_strategy(), b in json_strategy()) {
        prop_assert_eq!(
            has_changed(Some(&a), Some(&b)),
            has_changed(Some(&b), Some(&a))
        );
    }

    #[test]
    fn key_order_never_counts_as_change(value in json_strategy()) {
        let reordered = reversed_keys(&value);
        prop_assert!(json_equivalent(&value, &reordered));
        prop_assert!(!has_changed(Some(&value), Some(&reordered)));
    }

    #[test]
    fn integer_and_float_forms_are_equivalent(n in -100_000i64..100_000) {
        prop_assert!(json_equivalent(&json!(n), &json!(n as f64)));
    }

    #[test]
    fn each_change_lands_in_one_bucket(
        old in prop::option::of(json_strategy()),
        new in prop::option::of(json_strategy()),
    ) {
        let mut recorder = ChangeRecorder::new();
        let recorded = recorder.record_change("field", old, new);
        prop_assert_eq!(recorder.len(), usize::from(recorded));
        let Some(description) = recorder.finalize(EntityVersion::INITIAL, VersionStep::Minor).change_description else {
            return Ok(());
        };
        let buckets = [
            description.fields_added.len(),
            description.fields_updated.len(),
            description.fields_deleted.len(),
        ];
        prop_assert_eq!(buckets.iter().sum::<usize>(), 1);
    }
}
