//! CatalogService: the write and read paths over templates, items and the
//! audit trail.
//!
//! Takes port traits via `Arc<dyn PortTrait>` so the same logic runs against
//! a real store adapter or the in-memory one used by tests and the CLI.
//!
//! Every mutation runs the same sequence: load, ownership gate, apply, diff,
//! persist, audit. A rejected gate returns before anything is written, and a
//! mutation whose audited diff is empty is not persisted at all, so every
//! stored change has exactly one audit record.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    audit::{self, AuditRecord, Page, PageRequest, PaginationPolicy},
    error::{CatalogError, Result},
    item::{CatalogItem, ItemDescriptionPatch},
    ownership::assert_owner,
    permissions::{self, PermissionGroup},
    ports::{AuditStore, ItemStore, TemplateStore},
    principal::Principal,
    resolution::{resolve_effective_content, EffectiveContent, ItemDescription},
    template::{Template, VersionDraft},
};

pub const SUBJECT_ITEM: &str = "item";
pub const SUBJECT_TEMPLATE: &str = "template";

// ── CatalogService trait ──────────────────────────────────────

/// All mutating methods take `&Principal` explicitly; there is no implicit identity.
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn create_template(&self, principal: &Principal, name: &str) -> Result<Template>;

    /// Publish `draft` as the template's next version.
    async fn publish_template_version(
        &self,
        principal: &Principal,
        template_id: Uuid,
        draft: VersionDraft,
        activate: bool,
    ) -> Result<Template>;

    async fn activate_template_version(
        &self,
        principal: &Principal,
        template_id: Uuid,
        version: u32,
    ) -> Result<Template>;

    /// Create an item owned by the principal, pinned to the template's active version.
    async fn create_item(
        &self,
        principal: &Principal,
        name: &str,
        template_id: Uuid,
    ) -> Result<CatalogItem>;

    async fn update_item_description(
        &self,
        principal: &Principal,
        item_id: Uuid,
        patch: ItemDescriptionPatch,
    ) -> Result<CatalogItem>;

    /// Merge the item's template version with its overrides.
    /// `Ok(None)` means there is nothing to show.
    async fn effective_content(&self, item_id: Uuid) -> Result<Option<EffectiveContent>>;

    /// Audit history of one subject, newest first.
    async fn item_history(&self, subject_id: &str, request: PageRequest)
        -> Result<Page<AuditRecord>>;

    /// Every audit record, newest first.
    async fn security_audit(&self, request: PageRequest) -> Result<Page<AuditRecord>>;

    fn permission_groups(&self) -> Vec<PermissionGroup>;
}

// ── CatalogServiceImpl ────────────────────────────────────────

pub struct CatalogServiceImpl {
    pub templates: Arc<dyn TemplateStore>,
    pub items: Arc<dyn ItemStore>,
    pub audit: Arc<dyn AuditStore>,
    pub paging: PaginationPolicy,
}

impl CatalogServiceImpl {
    pub fn new(
        templates: Arc<dyn TemplateStore>,
        items: Arc<dyn ItemStore>,
        audit: Arc<dyn AuditStore>,
    ) -> Self {
        Self {
            templates,
            items,
            audit,
            paging: PaginationPolicy::default(),
        }
    }

    /// Set the paging policy (builder pattern).
    pub fn with_paging(mut self, paging: PaginationPolicy) -> Self {
        self.paging = paging;
        self
    }

    async fn load_template(&self, template_id: Uuid) -> Result<Template> {
        self.templates
            .get_template(template_id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("template {template_id}")))
    }

    async fn load_item(&self, item_id: Uuid) -> Result<CatalogItem> {
        self.items
            .get_item(item_id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("item {item_id}")))
    }

    /// Persist a template and then its audit record.
    async fn commit_template(&self, template: &Template, record: &AuditRecord) -> Result<()> {
        self.templates.put_template(template).await?;
        self.audit.append(record).await
    }

    /// Persist an item and then its audit record.
    async fn commit_item(&self, item: &CatalogItem, record: &AuditRecord) -> Result<()> {
        self.items.put_item(item).await?;
        self.audit.append(record).await
    }
}

#[async_trait]
impl CatalogService for CatalogServiceImpl {
    async fn create_template(&self, principal: &Principal, name: &str) -> Result<Template> {
        if name.trim().is_empty() {
            return Err(CatalogError::InvalidInput("template name must not be empty".into()));
        }

        let template = Template::new(name, &principal.actor_id);
        let record = created_record(
            principal,
            SUBJECT_TEMPLATE,
            template.id,
            "template.create",
            &template,
        )?;
        self.commit_template(&template, &record).await?;

        tracing::info!(
            "template {} '{}' created by {}",
            template.id,
            template.name,
            principal.actor_id
        );
        Ok(template)
    }

    async fn publish_template_version(
        &self,
        principal: &Principal,
        template_id: Uuid,
        draft: VersionDraft,
        activate: bool,
    ) -> Result<Template> {
        let before = self.load_template(template_id).await?;
        guard(principal, &before, SUBJECT_TEMPLATE, template_id)?;

        let mut after = before.clone();
        let version = after.publish_version(draft, activate)?;
        let Some(record) = change_record(
            principal,
            SUBJECT_TEMPLATE,
            template_id,
            "template.publish_version",
            &before,
            &after,
        )?
        else {
            return Ok(before);
        };
        self.commit_template(&after, &record).await?;

        tracing::info!(
            "template {} published version {} (active: {:?})",
            template_id,
            version,
            after.active_version
        );
        Ok(after)
    }

    async fn activate_template_version(
        &self,
        principal: &Principal,
        template_id: Uuid,
        version: u32,
    ) -> Result<Template> {
        let before = self.load_template(template_id).await?;
        guard(principal, &before, SUBJECT_TEMPLATE, template_id)?;

        let mut after = before.clone();
        after.activate(version)?;
        let Some(record) = change_record(
            principal,
            SUBJECT_TEMPLATE,
            template_id,
            "template.activate_version",
            &before,
            &after,
        )?
        else {
            return Ok(before);
        };
        self.commit_template(&after, &record).await?;

        tracing::info!("template {template_id} active version set to {version}");
        Ok(after)
    }

    async fn create_item(
        &self,
        principal: &Principal,
        name: &str,
        template_id: Uuid,
    ) -> Result<CatalogItem> {
        if name.trim().is_empty() {
            return Err(CatalogError::InvalidInput("item name must not be empty".into()));
        }
        let template = self.load_template(template_id).await?;

        let description = ItemDescription {
            template_id: Some(template.id),
            template_version: template.active_version.unwrap_or(0),
            description: None,
            overrides: Default::default(),
        };
        let item = CatalogItem::new(name, &principal.actor_id, description);
        let record = created_record(principal, SUBJECT_ITEM, item.id, "item.create", &item)?;
        self.commit_item(&item, &record).await?;

        tracing::info!(
            "item {} created by {} against template {} v{}",
            item.id,
            principal.actor_id,
            template_id,
            item.description.template_version
        );
        Ok(item)
    }

    async fn update_item_description(
        &self,
        principal: &Principal,
        item_id: Uuid,
        patch: ItemDescriptionPatch,
    ) -> Result<CatalogItem> {
        let before = self.load_item(item_id).await?;
        guard(principal, &before, SUBJECT_ITEM, item_id)?;

        if patch.is_empty() {
            return Ok(before);
        }

        let mut after = before.clone();
        after.apply(&patch);
        let Some(record) = change_record(
            principal,
            SUBJECT_ITEM,
            item_id,
            "item.update_description",
            &before,
            &after,
        )?
        else {
            return Ok(before);
        };
        self.commit_item(&after, &record).await?;

        tracing::info!(
            "item {} description updated by {} (rev {})",
            item_id,
            principal.actor_id,
            after.revision
        );
        Ok(after)
    }

    async fn effective_content(&self, item_id: Uuid) -> Result<Option<EffectiveContent>> {
        let item = self.load_item(item_id).await?;

        let Some(template_id) = item.description.template_id else {
            tracing::debug!("item {item_id} has no template");
            return Ok(None);
        };
        let Some(template) = self.templates.get_template(template_id).await? else {
            tracing::debug!("item {item_id} references missing template {template_id}");
            return Ok(None);
        };

        let content = resolve_effective_content(&template, &item.description);
        match &content {
            Some(c) if c.fell_back => tracing::debug!(
                "item {} pinned to v{}, resolved from active v{}",
                item_id,
                item.description.template_version,
                c.version
            ),
            None => tracing::debug!("item {item_id}: no resolvable template version"),
            _ => {}
        }
        Ok(content)
    }

    async fn item_history(
        &self,
        subject_id: &str,
        request: PageRequest,
    ) -> Result<Page<AuditRecord>> {
        let (page, limit) = self.paging.normalize(request);
        let subject_id = subject_id.trim();
        if subject_id.is_empty() {
            return Ok(Page::empty(page, limit));
        }
        self.audit.list_by_subject(subject_id, page, limit).await
    }

    async fn security_audit(&self, request: PageRequest) -> Result<Page<AuditRecord>> {
        let (page, limit) = self.paging.normalize(request);
        self.audit.list_all(page, limit).await
    }

    fn permission_groups(&self) -> Vec<PermissionGroup> {
        permissions::groups()
    }
}

// ── Helpers ───────────────────────────────────────────────────

/// Ownership gate with the rejection logged at the service boundary.
fn guard<E: crate::ownership::OwnedRecord>(
    principal: &Principal,
    entity: &E,
    subject_type: &str,
    subject_id: Uuid,
) -> Result<()> {
    assert_owner(&principal.scope, entity, &principal.actor_id).inspect_err(|_| {
        tracing::warn!(
            "{} denied on {} {} (scope: {})",
            principal.actor_id,
            subject_type,
            subject_id,
            principal.scope
        );
    })
}

/// Audit record for a mutation, or `None` when the ignore-filtered diff is
/// empty and the mutation should be dropped.
fn change_record<T: Serialize>(
    principal: &Principal,
    subject_type: &str,
    subject_id: Uuid,
    action: &str,
    before: &T,
    after: &T,
) -> Result<Option<AuditRecord>> {
    let changes = audit::diff(&snapshot(before)?, &snapshot(after)?);
    if changes.is_empty() {
        tracing::debug!("{action} on {subject_type} {subject_id}: no audited change, not persisted");
        return Ok(None);
    }
    Ok(Some(
        AuditRecord::new(subject_type, subject_id.to_string(), &principal.actor_id, changes)
            .with_action(action),
    ))
}

/// Audit record for a newly created entity, diffed against nothing.
fn created_record<T: Serialize>(
    principal: &Principal,
    subject_type: &str,
    subject_id: Uuid,
    action: &str,
    created: &T,
) -> Result<AuditRecord> {
    let changes = audit::diff(&serde_json::Value::Null, &snapshot(created)?);
    Ok(
        AuditRecord::new(subject_type, subject_id.to_string(), &principal.actor_id, changes)
            .with_action(action),
    )
}

fn snapshot<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value)
        .context("failed to snapshot entity for audit")
        .map_err(CatalogError::from)
}

// ── Tests ─────────────────────────────────────────────────────
