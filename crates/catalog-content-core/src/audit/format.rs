//! Read-time presentation of audit diffs.
//!
//! Nothing here is stored; records keep structured values and are rendered
//! on the way out.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{AuditDiff, AuditRecord, FieldValue};
use crate::permissions::{self, PermissionGroup};

/// Placeholder for a missing or null value.
pub const EMPTY_PLACEHOLDER: &str = "—";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayLocale {
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "en-GB")]
    EnGb,
    #[serde(rename = "de-DE")]
    DeDe,
    #[serde(rename = "fr-FR")]
    FrFr,
    #[serde(rename = "iso")]
    Iso,
}

impl DisplayLocale {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::EnGb => "en-GB",
            Self::DeDe => "de-DE",
            Self::FrFr => "fr-FR",
            Self::Iso => "iso",
        }
    }

    fn datetime_pattern(&self) -> &'static str {
        match self {
            Self::EnUs => "%m/%d/%Y, %I:%M:%S %p",
            Self::EnGb => "%d/%m/%Y, %H:%M:%S",
            Self::DeDe => "%d.%m.%Y, %H:%M:%S",
            Self::FrFr => "%d/%m/%Y %H:%M:%S",
            Self::Iso => "%Y-%m-%d %H:%M:%S UTC",
        }
    }

    pub fn format_datetime(&self, at: &DateTime<Utc>) -> String {
        at.format(self.datetime_pattern()).to_string()
    }
}

impl fmt::Display for DisplayLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLocaleError(String);

impl fmt::Display for ParseLocaleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown locale '{}'. Valid values: en-US, en-GB, de-DE, fr-FR, iso",
            self.0
        )
    }
}

impl std::error::Error for ParseLocaleError {}

impl FromStr for DisplayLocale {
    type Err = ParseLocaleError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "en-us" | "en" => Ok(Self::EnUs),
            "en-gb" => Ok(Self::EnGb),
            "de-de" | "de" => Ok(Self::DeDe),
            "fr-fr" | "fr" => Ok(Self::FrFr),
            "iso" => Ok(Self::Iso),
            _ => Err(ParseLocaleError(s.to_string())),
        }
    }
}

/// Render one side of a change for display.
pub fn format_value(value: &FieldValue, locale: DisplayLocale) -> String {
    match value {
        FieldValue::Absent => EMPTY_PLACEHOLDER.to_string(),
        FieldValue::Present(v) => format_json(v, locale),
    }
}

fn format_json(value: &Value, locale: DisplayLocale) -> String {
    match value {
        Value::Null => EMPTY_PLACEHOLDER.to_string(),
        Value::String(s) => match DateTime::parse_from_rfc3339(s) {
            Ok(at) => locale.format_datetime(&at.with_timezone(&Utc)),
            Err(_) => s.clone(),
        },
        Value::Object(_) | Value::Array(_) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedChange {
    pub field: String,
    pub before: String,
    pub after: String,
}

pub fn format_changes(changes: &AuditDiff, locale: DisplayLocale) -> Vec<FormattedChange> {
    changes
        .iter()
        .map(|(field, change)| FormattedChange {
            field: field.clone(),
            before: format_value(&change.before, locale),
            after: format_value(&change.after, locale),
        })
        .collect()
}

/// Records bucketed under one permission group; `group` is `None` for
/// subject types the catalog does not know.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditGroup {
    pub group: Option<PermissionGroup>,
    pub records: Vec<AuditRecord>,
}

/// Bucket records by the permission group of their subject type.
///
/// Groups follow catalog order, unknown subjects come last, and records keep
/// their incoming order within a bucket.
pub fn group_by_permission(records: &[AuditRecord]) -> Vec<AuditGroup> {
    let mut grouped: Vec<AuditGroup> = permissions::groups()
        .into_iter()
        .map(|group| AuditGroup {
            group: Some(group),
            records: Vec::new(),
        })
        .collect();
    let mut ungrouped = Vec::new();

    for record in records {
        let key = permissions::group_for_subject(&record.subject_type).map(|g| g.key);
        let bucket = match key {
            Some(key) => grouped
                .iter_mut()
                .find(|b| b.group.as_ref().is_some_and(|bg| bg.key == key)),
            None => None,
        };
        match bucket {
            Some(b) => b.records.push(record.clone()),
            None => ungrouped.push(record.clone()),
        }
    }

    grouped.retain(|b| !b.records.is_empty());
    if !ungrouped.is_empty() {
        grouped.push(AuditGroup {
            group: None,
            records: ungrouped,
        });
    }
    grouped
}
