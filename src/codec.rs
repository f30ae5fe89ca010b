use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};
use crate::models::{Issue, Notification, Record, Snapshot, Task, Win};

/// Key the snapshot is stored under in the key/value layer.
pub const STORAGE_KEY: &str = "ot_csm_buddy_store";

pub fn encode(snapshot: &Snapshot) -> StoreResult<String> {
    Ok(serde_json::to_string(snapshot)?)
}

/// Serialized form of one slot, as staged by the store before a write.
pub fn slot_value<T: Record>(items: &[T]) -> StoreResult<Value> {
    Ok(serde_json::to_value(items)?)
}

pub fn decode(text: &str) -> Snapshot {
    let root = match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(root)) => root,
        Ok(other) => {
            log::warn!("Stored snapshot is not an object ({}), starting empty", type_name(&other));
            return Snapshot::default();
        }
        Err(err) => {
            log::error!("Could not parse saved data: {err}");
            return Snapshot::default();
        }
    };

    Snapshot {
        tasks: lenient_slot::<Task>(&root),
        issues: lenient_slot::<Issue>(&root),
        wins: lenient_slot::<Win>(&root),
        notifications: lenient_slot::<Notification>(&root),
    }
}

fn lenient_slot<T: Record>(root: &Map<String, Value>) -> Vec<T> {
    let key = T::SLOT.key();
    match root.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| match T::deserialize(item) {
                Ok(record) => Some(record),
                Err(err) => {
                    log::warn!("Dropping malformed {key} record #{index}: {err}");
                    None
                }
            })
            .collect(),
        Some(other) => {
            log::warn!("Stored '{key}' is {}, not a list; using an empty list", type_name(other));
            Vec::new()
        }
        None => Vec::new(),
    }
}

pub fn decode_import(text: &str) -> StoreResult<Snapshot> {
    let root = match serde_json::from_str::<Value>(text)? {
        Value::Object(root) => root,
        _ => return Err(StoreError::ImportNotObject),
    };

    // Shape first, so a file missing any key is rejected before records are read.
    for slot in crate::models::Slot::ALL {
        if !matches!(root.get(slot.key()), Some(Value::Array(_))) {
            return Err(StoreError::ImportShape(slot));
        }
    }

    Ok(Snapshot {
        tasks: strict_slot::<Task>(&root)?,
        issues: strict_slot::<Issue>(&root)?,
        wins: strict_slot::<Win>(&root)?,
        notifications: strict_slot::<Notification>(&root)?,
    })
}

fn strict_slot<T: Record>(root: &Map<String, Value>) -> StoreResult<Vec<T>> {
    let items = match root.get(T::SLOT.key()) {
        Some(Value::Array(items)) => items,
        _ => return Err(StoreError::ImportShape(T::SLOT)),
    };
    items
        .iter()
        .map(|item| {
            T::deserialize(item).map_err(|err| StoreError::ImportRecord {
                slot: T::SLOT,
                reason: err.to_string(),
            })
        })
        .collect()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Timestamp;
    use crate::models::{IssueStatus, NotificationKind, Priority, TaskStatus};
    use chrono::NaiveDate;
    use serde_json::json;

    fn sample() -> Snapshot {
        Snapshot {
            tasks: vec![Task {
                id: "t1".into(),
                title: "Prep QBR deck".into(),
                desc: String::new(),
                due: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
                priority: Priority::High,
                status: TaskStatus::InProgress,
                created: Timestamp(1_743_000_000_000),
            }],
            issues: vec![Issue {
                id: "i1".into(),
                title: "SSO outage".into(),
                desc: "Okta tenant misconfigured".into(),
                status: IssueStatus::Monitoring,
                date: Timestamp(1_743_000_100_000),
            }],
            wins: vec![Win {
                id: "w1".into(),
                title: "Renewal signed".into(),
                desc: "3 years, \"multi-year\" ✨".into(),
                date: Timestamp(1_743_000_200_000),
            }],
            notifications: vec![Notification {
                id: "n1".into(),
                msg: "New issue logged: SSO outage".into(),
                kind: NotificationKind::Danger,
                read: false,
                date: Timestamp(1_743_000_100_001),
            }],
        }
    }

    #[test]
    fn decode_inverts_encode() {
        let snapshot = sample();
        let text = encode(&snapshot).unwrap();
        assert_eq!(decode(&text), snapshot);
        assert_eq!(decode(&encode(&Snapshot::default()).unwrap()), Snapshot::default());
    }

    #[test]
    fn decode_recovers_each_slot_independently() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["tasks"] = json!({"not": "a list"});
        let decoded = decode(&value.to_string());

        let expected = sample();
        assert!(decoded.tasks.is_empty());
        assert_eq!(decoded.issues, expected.issues);
        assert_eq!(decoded.wins, expected.wins);
        assert_eq!(decoded.notifications, expected.notifications);
    }

    #[test]
    fn decode_falls_back_to_empty_on_garbage() {
        assert_eq!(decode("{not json"), Snapshot::default());
        assert_eq!(decode(""), Snapshot::default());
        assert_eq!(decode("[1, 2, 3]"), Snapshot::default());
        assert_eq!(decode("{}"), Snapshot::default());
    }

    #[test]
    fn decode_ignores_unknown_keys_and_drops_bad_records() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["theme"] = json!("dark");
        value["wins"].as_array_mut().unwrap().push(json!({"id": "w2"}));
        let decoded = decode(&value.to_string());
        assert_eq!(decoded, sample());
    }

    #[test]
    fn import_rejects_missing_or_non_list_keys() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value.as_object_mut().unwrap().remove("wins");
        assert!(matches!(
            decode_import(&value.to_string()),
            Err(StoreError::ImportShape(crate::models::Slot::Wins))
        ));

        let mut value = serde_json::to_value(sample()).unwrap();
        value["notifications"] = json!(null);
        assert!(matches!(
            decode_import(&value.to_string()),
            Err(StoreError::ImportShape(crate::models::Slot::Notifications))
        ));

        assert!(matches!(decode_import("42"), Err(StoreError::ImportNotObject)));
        assert!(matches!(decode_import("nope"), Err(StoreError::Json(_))));
    }

    #[test]
    fn import_rejects_malformed_records() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["tasks"][0]["priority"] = json!("urgent");
        assert!(matches!(
            decode_import(&value.to_string()),
            Err(StoreError::ImportRecord { .. })
        ));
    }

    #[test]
    fn import_accepts_a_valid_backup() {
        let text = serde_json::to_string_pretty(&sample()).unwrap();
        assert_eq!(decode_import(&text).unwrap(), sample());
    }
}
