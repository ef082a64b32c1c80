//! In-memory store adapter.
//!
//! Implements every storage port over `tokio::sync::RwLock`-guarded maps.
//! Used by the CLI and tests; a durable adapter implements the same traits.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use catalog_content_core::audit::{paginate, AuditRecord, Page};
use catalog_content_core::ports::{AuditStore, ItemStore, Result, TemplateStore};
use catalog_content_core::{CatalogItem, CatalogServiceImpl, Template};

#[derive(Default)]
pub struct InMemoryTemplateStore {
    templates: RwLock<HashMap<Uuid, Template>>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplateStore {
    async fn get_template(&self, template_id: Uuid) -> Result<Option<Template>> {
        Ok(self.templates.read().await.get(&template_id).cloned())
    }

    async fn put_template(&self, template: &Template) -> Result<()> {
        self.templates
            .write()
            .await
            .insert(template.id, template.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryItemStore {
    items: RwLock<HashMap<Uuid, CatalogItem>>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn get_item(&self, item_id: Uuid) -> Result<Option<CatalogItem>> {
        Ok(self.items.read().await.get(&item_id).cloned())
    }

    async fn put_item(&self, item: &CatalogItem) -> Result<()> {
        self.items.write().await.insert(item.id, item.clone());
        Ok(())
    }
}

/// Append-only; records are kept in insertion order.
#[derive(Default)]
pub struct InMemoryAuditStore {
    records: RwLock<Vec<AuditRecord>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn append(&self, record: &AuditRecord) -> Result<()> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn list_by_subject(
        &self,
        subject_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<Page<AuditRecord>> {
        let records = self.records.read().await;
        Ok(paginate(
            records.iter().filter(|r| r.subject_id == subject_id),
            page,
            limit,
        ))
    }

    async fn list_all(&self, page: u32, limit: u32) -> Result<Page<AuditRecord>> {
        let records = self.records.read().await;
        Ok(paginate(records.iter(), page, limit))
    }
}

/// The three in-memory stores, shared between a service and its observers.
#[derive(Clone, Default)]
pub struct MemoryStores {
    pub templates: Arc<InMemoryTemplateStore>,
    pub items: Arc<InMemoryItemStore>,
    pub audit: Arc<InMemoryAuditStore>,
}

impl MemoryStores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn service(&self) -> CatalogServiceImpl {
        CatalogServiceImpl::new(
            self.templates.clone(),
            self.items.clone(),
            self.audit.clone(),
        )
    }
}
