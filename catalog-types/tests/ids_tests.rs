use catalog_types::EntityId;
use std::collections::BTreeSet;
use std::str::FromStr;

// ── EntityId ──────────────────────────────────────────────────────

#[test]
fn fresh_ids_are_distinct() {
    let ids: BTreeSet<EntityId> = (0..64).map(|_| EntityId::new()).collect();
    assert_eq!(ids.len(), 64);
}

#[test]
fn wraps_and_unwraps_uuid() {
    let uuid = uuid::Uuid::now_v7();
    assert_eq!(EntityId::from(uuid).as_uuid(), uuid);
}

#[test]
fn display_output_parses_back() {
    let id = EntityId::new();
    assert_eq!(EntityId::parse(&id.to_string()).unwrap(), id);
    assert_eq!(EntityId::from_str(&id.to_string()).unwrap(), id);
}

#[test]
fn rejects_malformed_text() {
    assert!(EntityId::parse("svc-a").is_err());
    assert!(EntityId::from_str("").is_err());
}

#[test]
fn serializes_as_bare_uuid_string() {
    let id = EntityId::new();
    let json = serde_json::to_value(id).unwrap();
    assert_eq!(json, serde_json::Value::String(id.to_string()));
    let back: EntityId = serde_json::from_value(json).unwrap();
    assert_eq!(back, id);
}

#[test]
fn ids_created_later_sort_later() {
    let first = EntityId::new();
    std::thread::sleep(std::time::Duration::from_millis(2));
    let second = EntityId::new();
    assert!(first < second);
}
