//! catalog-content
//!
//! Process-side plumbing around `catalog-content-core`: environment
//! configuration, tracing setup, and the in-memory store adapter used by the
//! `catalog-content` CLI and the integration tests.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use catalog_content::memory::MemoryStores;
//! use catalog_content_core::{CatalogService, Principal, Section, VersionDraft};
//!
//! # async fn run() -> catalog_content_core::Result<()> {
//! let stores = MemoryStores::new();
//! let service = stores.service();
//! let seller = Principal::own("seller-1");
//!
//! let template = service.create_template(&seller, "Running shoes").await?;
//! let draft = VersionDraft {
//!     intro: Some("Built for the road.".into()),
//!     sections: vec![Section::new("fit", "Fit", "True to size.")],
//! };
//! service.publish_template_version(&seller, template.id, draft, true).await?;
//!
//! let item = service.create_item(&seller, "Road Runner 3", template.id).await?;
//! let content = service.effective_content(item.id).await?;
//! assert_eq!(content.map(|c| c.intro), Some("Built for the road.".to_string()));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod memory;
pub mod telemetry;

pub use config::CatalogConfig;
pub use memory::MemoryStores;
