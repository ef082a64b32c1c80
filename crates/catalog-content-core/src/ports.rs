//! Storage port traits.
//! Implemented by the storage adapter; core logic depends only on these traits.

use async_trait::async_trait;
use uuid::Uuid;

use crate::audit::{AuditRecord, Page};
use crate::item::CatalogItem;
use crate::template::Template;

pub use crate::error::Result;

#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn get_template(&self, template_id: Uuid) -> Result<Option<Template>>;

    /// Insert or replace. Last write wins.
    async fn put_template(&self, template: &Template) -> Result<()>;
}

#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn get_item(&self, item_id: Uuid) -> Result<Option<CatalogItem>>;

    /// Insert or replace. Last write wins.
    async fn put_item(&self, item: &CatalogItem) -> Result<()>;
}

/// Append-only audit log.
///
/// Records are never updated or deleted. Listings are newest first and take
/// an already-normalized `(page, limit)`.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, record: &AuditRecord) -> Result<()>;

    /// Records for one subject. An unknown subject yields an empty page.
    async fn list_by_subject(
        &self,
        subject_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<Page<AuditRecord>>;

    /// Every record, for the security audit view.
    async fn list_all(&self, page: u32, limit: u32) -> Result<Page<AuditRecord>>;
}
