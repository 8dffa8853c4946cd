use catalog_types::{EntityVersion, VersionStep};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

// ── Construction ─────────────────────────────────────────────────

#[test]
fn initial_version_is_one_tenth() {
    assert_eq!(EntityVersion::INITIAL.value(), 0.1);
    assert_eq!(EntityVersion::default(), EntityVersion::INITIAL);
}

#[test]
fn rejects_negative_and_non_finite() {
    assert!(EntityVersion::new(-0.1).is_err());
    assert!(EntityVersion::new(f64::NAN).is_err());
    assert!(EntityVersion::new(f64::INFINITY).is_err());
}

#[test]
fn new_rounds_to_one_decimal() {
    assert_eq!(EntityVersion::new(0.30000000000000004).unwrap().value(), 0.3);
}

// ── Steps ────────────────────────────────────────────────────────

#[test]
fn minor_steps_do_not_drift() {
    let mut v = EntityVersion::INITIAL;
    for _ in 0..9 {
        v = v.next_minor();
    }
    assert_eq!(v.value(), 1.0);
    assert_eq!(v.to_string(), "1.0");
}

#[test]
fn major_step_adds_one() {
    let v = EntityVersion::new(0.3).unwrap().next_major();
    assert_eq!(v.value(), 1.3);
    assert_eq!(EntityVersion::INITIAL.advance(VersionStep::Major).value(), 1.1);
    assert_eq!(EntityVersion::INITIAL.advance(VersionStep::Minor).value(), 0.2);
}

// ── Serde ────────────────────────────────────────────────────────

#[test]
fn serializes_as_plain_number() {
    let json = serde_json::to_string(&EntityVersion::new(0.2).unwrap()).unwrap();
    assert_eq!(json, "0.2");
    let back: EntityVersion = serde_json::from_str("1.4").unwrap();
    assert_eq!(back.value(), 1.4);
}

#[test]
fn deserialize_rejects_negative() {
    assert!(serde_json::from_str::<EntityVersion>("-1.0").is_err());
}

// ── Properties ───────────────────────────────────────────────────

proptest! {
    /// Any sequence of steps yields a strictly increasing version sequence.
    #[test]
    fn steps_are_strictly_increasing(steps in proptest::collection::vec(any::<bool>(), 1..200)) {
        let mut current = EntityVersion::INITIAL;
        for major in steps {
            let step = if major { VersionStep::Major } else { VersionStep::Minor };
            let next = current.advance(step);
            prop_assert!(next > current);
            current = next;
        }
    }

    #[test]
    fn display_roundtrips_through_parse(tenths in 1u32..100_000) {
        let v = EntityVersion::new(f64::from(tenths) / 10.0).unwrap();
        let parsed: f64 = v.to_string().parse().unwrap();
        prop_assert_eq!(EntityVersion::new(parsed).unwrap(), v);
    }
}
