use super::*;
use std::str::FromStr;
use uuid::Uuid;

#[test]
fn test_typed_id_creation() {
    let id = UserId::new();
    assert!(!id.to_string().is_empty());
}

#[test]
fn test_typed_id_from_uuid() {
    let uuid = Uuid::new_v4();
    let id = UserId::from_uuid(uuid);
    assert_eq!(id.into_inner(), uuid);
}

#[test]
fn test_typed_id_default() {
    let id = UserId::default();
    assert!(!id.to_string().is_empty());
}

#[test]
fn test_typed_id_display() {
    let uuid = Uuid::new_v4();
    let id = UserId::from_uuid(uuid);
    assert_eq!(format!("{}", id), uuid.to_string());
}

#[test]
fn test_typed_id_from_str() {
    let uuid = Uuid::new_v4();
    let id = UserId::from_str(&uuid.to_string()).unwrap();
    assert_eq!(id.into_inner(), uuid);
}

#[test]
fn test_typed_id_from_str_error() {
    assert!(UserId::from_str("invalid").is_err());
}

#[test]
fn test_typed_id_serde_is_transparent() {
    let uuid = Uuid::new_v4();
    let id = JournalId::from_uuid(uuid);
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{uuid}\""));
    let back: JournalId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}

#[test]
fn test_typed_ids_are_time_ordered() {
    let first = PeriodId::new();
    let second = PeriodId::new();
    assert!(first <= second);
}
