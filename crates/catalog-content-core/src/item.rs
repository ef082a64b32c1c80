//! Catalog items, the owned entity whose description the write path mutates.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ownership::{canonical_id, OwnedRecord, DEFAULT_OWNER_FIELD};
use crate::resolution::ItemDescription;

/// A catalog item as stored.
///
/// `_id`, `__v`, `createdAt` and `updatedAt` are bookkeeping fields; the
/// audit diff strips them from every snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub created_by: String,
    pub description: ItemDescription,
    #[serde(rename = "__v", default)]
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CatalogItem {
    pub fn new(
        name: impl Into<String>,
        created_by: impl Into<String>,
        description: ItemDescription,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_by: created_by.into(),
            description,
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply `patch` to the description and bump the bookkeeping fields.
    pub fn apply(&mut self, patch: &ItemDescriptionPatch) {
        patch.apply_to(&mut self.description);
        self.revision += 1;
        self.updated_at = Utc::now();
    }
}

impl OwnedRecord for CatalogItem {
    fn owner_field(&self, field: &str) -> Option<String> {
        (field == DEFAULT_OWNER_FIELD).then(|| canonical_id(&self.created_by))
    }
}

/// Partial update of an item description. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDescriptionPatch {
    #[serde(default)]
    pub template_version: Option<u32>,
    /// `Some(None)` clears the intro override.
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub set_overrides: BTreeMap<String, String>,
    #[serde(default)]
    pub clear_overrides: Vec<String>,
}

impl ItemDescriptionPatch {
    pub fn is_empty(&self) -> bool {
        self.template_version.is_none()
            && self.description.is_none()
            && self.set_overrides.is_empty()
            && self.clear_overrides.is_empty()
    }

    /// Clears run before sets, so a key named in both ends up set.
    pub fn apply_to(&self, description: &mut ItemDescription) {
        if let Some(version) = self.template_version {
            description.template_version = version;
        }
        if let Some(intro) = &self.description {
            description.description = intro.clone();
        }
        for key in &self.clear_overrides {
            description.overrides.remove(key);
        }
        for (key, content) in &self.set_overrides {
            description.overrides.insert(key.clone(), content.clone());
        }
    }

    pub fn with_template_version(mut self, version: u32) -> Self {
        self.template_version = Some(version);
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn set_override(mut self, key: impl Into<String>, content: impl Into<String>) -> Self {
        self.set_overrides.insert(key.into(), content.into());
        self
    }

    pub fn clear_override(mut self, key: impl Into<String>) -> Self {
        self.clear_overrides.push(key.into());
        self
    }
}

/// Distinguishes a missing field from an explicit `null`.
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Option<Option<String>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer).map(Some)
    }
}
