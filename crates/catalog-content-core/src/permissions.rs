//! Permission catalog: the fixed set of permission groups used to bucket
//! permissions and audit entries for display.
//!
//! The table is built once per process and never mutated. Callers only ever
//! receive owned copies, so no consumer can alter what another one sees.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionGroup {
    pub key: String,
    pub label: String,
    pub icon: String,
    pub order: u32,
}

/// (key, label, icon, order)
const GROUP_TABLE: &[(&str, &str, &str, u32)] = &[
    ("settings", "Settings", "settings", 80),
    ("products", "Products", "package", 10),
    ("templates", "Description Templates", "file-text", 20),
    ("orders", "Orders", "shopping-cart", 30),
    ("customers", "Customers", "users", 40),
    ("roles", "Roles & Permissions", "shield", 50),
    ("audit", "Audit Log", "history", 60),
    ("media", "Media", "image", 70),
];

/// Subject types written by the audit trail, mapped to their group key.
const SUBJECT_GROUPS: &[(&str, &str)] = &[
    ("product", "products"),
    ("item", "products"),
    ("item_description", "products"),
    ("template", "templates"),
    ("template_version", "templates"),
    ("order", "orders"),
    ("customer", "customers"),
    ("user", "customers"),
    ("role", "roles"),
    ("permission", "roles"),
    ("image", "media"),
    ("setting", "settings"),
];

static CATALOG: OnceLock<Vec<PermissionGroup>> = OnceLock::new();

fn catalog() -> &'static [PermissionGroup] {
    CATALOG.get_or_init(|| {
        let mut groups: Vec<PermissionGroup> = GROUP_TABLE
            .iter()
            .map(|(key, label, icon, order)| PermissionGroup {
                key: (*key).to_string(),
                label: (*label).to_string(),
                icon: (*icon).to_string(),
                order: *order,
            })
            .collect();
        groups.sort_by_key(|g| g.order);
        groups
    })
}

/// All permission groups, ordered by `order` ascending.
pub fn groups() -> Vec<PermissionGroup> {
    catalog().to_vec()
}

/// Look up a single group by key.
pub fn group(key: &str) -> Option<PermissionGroup> {
    catalog().iter().find(|g| g.key == key).cloned()
}

/// The group an audit subject type is displayed under, if any.
pub fn group_for_subject(subject_type: &str) -> Option<PermissionGroup> {
    SUBJECT_GROUPS
        .iter()
        .find(|(subject, _)| *subject == subject_type)
        .and_then(|(_, key)| group(key))
}
