//! Catalog content core
//!
//! Reusable, versioned description templates for catalog items, merged with
//! item-level overrides on every read; an ownership gate in front of every
//! mutation; and an audit trail of field-level diffs.
//!
//! Pure domain types, port traits and service logic. No storage, no HTTP.

pub mod audit;
pub mod error;
pub mod item;
pub mod ownership;
pub mod permissions;
pub mod ports;
pub mod principal;
pub mod resolution;
pub mod service;
pub mod template;

pub use audit::{diff, AuditDiff, AuditRecord, FieldChange, FieldValue, Page, PageRequest, IGNORE_FIELDS};
pub use error::{CatalogError, Result};
pub use item::{CatalogItem, ItemDescriptionPatch};
pub use ownership::{assert_owner, assert_ownership, OwnedRecord, Scope, DEFAULT_OWNER_FIELD};
pub use permissions::PermissionGroup;
pub use principal::Principal;
pub use resolution::{resolve_effective_content, EffectiveContent, EffectiveSection, ItemDescription};
pub use service::{CatalogService, CatalogServiceImpl};
pub use template::{Section, Template, TemplateVersion, VersionDraft};
