//! Description templates and their versions.
//!
//! A template owns an ordered list of versions. Version numbers are handed
//! out from `last_version`, so a number is never reused even if an older
//! version is later dropped. `active_version` is the default resolution
//! target and always names an existing version once one is published.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CatalogError, Result};
use crate::ownership::{canonical_id, OwnedRecord, DEFAULT_OWNER_FIELD};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub key: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Section {
    pub fn new(key: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            content: Some(content.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateVersion {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// Content of a version about to be published; the number is assigned on publish.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDraft {
    #[serde(default)]
    pub intro: Option<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// A template as stored.
///
/// Only `activeVersion` and `versions` matter to resolution. The bookkeeping
/// fields default when absent, so a bare `{activeVersion, versions}` record
/// deserializes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(rename = "_id", default)]
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub active_version: Option<u32>,
    #[serde(default)]
    pub versions: Vec<TemplateVersion>,
    #[serde(default)]
    pub last_version: u32,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl Template {
    pub fn new(name: impl Into<String>, created_by: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_by: created_by.into(),
            active_version: None,
            versions: Vec::new(),
            last_version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn version(&self, version: u32) -> Option<&TemplateVersion> {
        self.versions.iter().find(|v| v.version == version)
    }

    pub fn active(&self) -> Option<&TemplateVersion> {
        self.active_version.and_then(|v| self.version(v))
    }

    pub fn is_published(&self) -> bool {
        !self.versions.is_empty()
    }

    /// Append `draft` as the next version and return its number.
    ///
    /// The first published version always becomes active; later ones only
    /// when `activate` is set.
    pub fn publish_version(&mut self, draft: VersionDraft, activate: bool) -> Result<u32> {
        validate_sections(&draft.sections)?;

        let next = self.next_version_number();
        self.versions.push(TemplateVersion {
            version: next,
            intro: draft.intro,
            sections: draft.sections,
        });
        self.last_version = next;

        if activate || self.active().is_none() {
            self.active_version = Some(next);
        }
        self.updated_at = Utc::now();
        Ok(next)
    }

    /// Make an existing version the default resolution target.
    pub fn activate(&mut self, version: u32) -> Result<()> {
        if self.version(version).is_none() {
            return Err(CatalogError::NotFound(format!(
                "template {} has no version {}",
                self.id, version
            )));
        }
        self.active_version = Some(version);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Check the structural invariants of a template loaded from storage.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for v in &self.versions {
            if !seen.insert(v.version) {
                return Err(CatalogError::InvalidInput(format!(
                    "template {} has duplicate version {}",
                    self.id, v.version
                )));
            }
            validate_sections(&v.sections)?;
        }

        if self.is_published() && self.active().is_none() {
            return Err(CatalogError::InvalidInput(format!(
                "template {} is published but active version {:?} does not exist",
                self.id, self.active_version
            )));
        }
        Ok(())
    }

    fn next_version_number(&self) -> u32 {
        let highest_present = self.versions.iter().map(|v| v.version).max().unwrap_or(0);
        self.last_version.max(highest_present) + 1
    }
}

impl OwnedRecord for Template {
    fn owner_field(&self, field: &str) -> Option<String> {
        (field == DEFAULT_OWNER_FIELD).then(|| canonical_id(&self.created_by))
    }
}

/// Section keys must be non-empty and unique within one version.
pub fn validate_sections(sections: &[Section]) -> Result<()> {
    let mut keys = HashSet::new();
    for section in sections {
        if section.key.trim().is_empty() {
            return Err(CatalogError::InvalidInput(
                "section key must not be empty".into(),
            ));
        }
        if !keys.insert(section.key.as_str()) {
            return Err(CatalogError::InvalidInput(format!(
                "duplicate section key '{}'",
                section.key
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(intro: &str, keys: &[&str]) -> VersionDraft {
        VersionDraft {
            intro: Some(intro.to_string()),
            sections: keys
                .iter()
                .map(|k| Section::new(*k, k.to_uppercase(), format!("{k} body")))
                .collect(),
        }
    }

    #[test]
    fn first_publish_becomes_active() {
        let mut t = Template::new("Shoes", "seller-1");
        let v = t.publish_version(draft("hi", &["a"]), false).unwrap();
        assert_eq!(v, 1);
        assert_eq!(t.active_version, Some(1));
        assert!(t.validate().is_ok());
    }

    #[test]
    fn later_publish_only_activates_on_request() {
        let mut t = Template::new("Shoes", "seller-1");
        t.publish_version(draft("v1", &["a"]), false).unwrap();
        t.publish_version(draft("v2", &["a"]), false).unwrap();
        assert_eq!(t.active_version, Some(1));

        let v3 = t.publish_version(draft("v3", &["a"]), true).unwrap();
        assert_eq!(v3, 3);
        assert_eq!(t.active_version, Some(3));
    }

    #[test]
    fn version_numbers_are_never_reused() {
        let mut t = Template::new("Shoes", "seller-1");
        t.publish_version(draft("v1", &[]), false).unwrap();
        t.publish_version(draft("v2", &[]), true).unwrap();

        // Drop version 2 out from under the counter.
        t.versions.retain(|v| v.version != 2);
        t.active_version = Some(1);

        let next = t.publish_version(draft("v3", &[]), false).unwrap();
        assert_eq!(next, 3);
    }

    #[test]
    fn duplicate_section_keys_rejected() {
        let mut t = Template::new("Shoes", "seller-1");
        let err = t.publish_version(draft("x", &["a", "a"]), false).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidInput(_)));
        assert!(t.versions.is_empty());
        assert_eq!(t.last_version, 0);
    }

    #[test]
    fn empty_section_key_rejected() {
        assert!(validate_sections(&[Section::new(" ", "t", "c")]).is_err());
    }

    #[test]
    fn activate_missing_version_is_not_found() {
        let mut t = Template::new("Shoes", "seller-1");
        t.publish_version(draft("v1", &[]), false).unwrap();
        let err = t.activate(7).unwrap_err();
        assert_eq!(err.http_status(), 404);
        assert_eq!(t.active_version, Some(1));
    }

    #[test]
    fn validate_detects_dangling_active_version() {
        let mut t = Template::new("Shoes", "seller-1");
        t.publish_version(draft("v1", &[]), false).unwrap();
        t.active_version = Some(9);
        assert!(t.validate().is_err());
    }

    #[test]
    fn serde_shape_uses_storage_field_names() {
        let t = Template::new("Shoes", "seller-1");
        let json = serde_json::to_value(&t).unwrap();
        assert!(json.get("_id").is_some());
        assert!(json.get("createdBy").is_some());
        assert!(json.get("activeVersion").is_some());
        assert!(json.get("updatedAt").is_some());
    }

    #[test]
    fn bare_resolution_record_deserializes() {
        let t: Template = serde_json::from_str(
            r#"{"activeVersion":2,"versions":[{"version":2,"intro":"T2","sections":[{"key":"k1","title":"A","content":"base"}]}]}"#,
        )
        .unwrap();
        assert_eq!(t.active_version, Some(2));
        assert_eq!(t.active().unwrap().sections[0].content.as_deref(), Some("base"));
        assert!(t.id.is_nil());
        assert!(t.created_by.is_empty());
    }

    #[test]
    fn template_owner_lookup() {
        let t = Template::new("Shoes", "seller-1");
        assert_eq!(t.owner_field("createdBy").as_deref(), Some("seller-1"));
        assert_eq!(t.owner_field("sellerId"), None);
    }
}
