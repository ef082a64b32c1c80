//! Audit trail: field-level diffs of accepted mutations.
//!
//! Snapshots are diffed after stripping [`IGNORE_FIELDS`], so identity,
//! revision and timestamp churn never shows up as a change. The stored diff
//! keeps structured JSON values; display formatting lives in [`format`].

pub mod format;
pub mod page;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

pub use format::{format_changes, format_value, group_by_permission, DisplayLocale, FormattedChange};
pub use page::{paginate, Page, PageRequest, Pagination, PaginationPolicy};

/// Bookkeeping fields excluded from every diff.
pub const IGNORE_FIELDS: [&str; 4] = ["_id", "__v", "createdAt", "updatedAt"];

/// One side of a field change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// The field does not exist in this snapshot.
    Absent,
    Present(Value),
}

impl FieldValue {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Absent => None,
            Self::Present(v) => Some(v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub before: FieldValue,
    pub after: FieldValue,
}

/// Field name → change, in field-name order.
pub type AuditDiff = BTreeMap<String, FieldChange>;

pub fn is_ignored(field: &str) -> bool {
    IGNORE_FIELDS.contains(&field)
}

fn strip_ignored(snapshot: &Value) -> Map<String, Value> {
    match snapshot {
        Value::Object(fields) => fields
            .iter()
            .filter(|(name, _)| !is_ignored(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect(),
        _ => Map::new(),
    }
}

/// Diff two entity snapshots.
///
/// Non-object snapshots (such as `null` before a creation) have no fields.
/// A field present on only one side is reported with the other side as
/// [`FieldValue::Absent`].
pub fn diff(before: &Value, after: &Value) -> AuditDiff {
    let before = strip_ignored(before);
    let after = strip_ignored(after);
    let mut changes = AuditDiff::new();

    for (name, old) in &before {
        match after.get(name) {
            Some(new) if new == old => {}
            Some(new) => {
                changes.insert(
                    name.clone(),
                    FieldChange {
                        before: FieldValue::Present(old.clone()),
                        after: FieldValue::Present(new.clone()),
                    },
                );
            }
            None => {
                changes.insert(
                    name.clone(),
                    FieldChange {
                        before: FieldValue::Present(old.clone()),
                        after: FieldValue::Absent,
                    },
                );
            }
        }
    }

    for (name, new) in &after {
        if !before.contains_key(name) {
            changes.insert(
                name.clone(),
                FieldChange {
                    before: FieldValue::Absent,
                    after: FieldValue::Present(new.clone()),
                },
            );
        }
    }

    changes
}

/// Immutable record of one accepted mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub id: Uuid,
    pub subject_type: String,
    pub subject_id: String,
    pub actor_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub changes: AuditDiff,
}

impl AuditRecord {
    pub fn new(
        subject_type: impl Into<String>,
        subject_id: impl Into<String>,
        actor_id: impl Into<String>,
        changes: AuditDiff,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            subject_type: subject_type.into(),
            subject_id: subject_id.into(),
            actor_id: actor_id.into(),
            action: None,
            recorded_at: Utc::now(),
            changes,
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }
}
