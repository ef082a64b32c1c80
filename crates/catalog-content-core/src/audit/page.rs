//! Paging for audit history queries.
//!
//! Page numbers are 1-indexed. Non-positive or missing values are clamped to
//! the defaults instead of being rejected; this is a read-path convenience.

use serde::{Deserialize, Serialize};

use super::AuditRecord;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const DEFAULT_MAX_LIMIT: u32 = 100;

/// Raw paging parameters as received from the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl PageRequest {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationPolicy {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PaginationPolicy {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: DEFAULT_MAX_LIMIT,
        }
    }
}

impl PaginationPolicy {
    /// Clamp a raw request to a usable `(page, limit)` pair.
    pub fn normalize(&self, request: PageRequest) -> (u32, u32) {
        let page = match request.page {
            Some(p) if p > 0 => u32::try_from(p).unwrap_or(u32::MAX),
            _ => DEFAULT_PAGE,
        };
        let max = self.max_limit.max(1);
        let limit = match request.limit {
            Some(l) if l > 0 => u32::try_from(l).unwrap_or(u32::MAX).min(max),
            _ => self.default_limit.clamp(1, max),
        };
        (page, limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

impl Pagination {
    pub fn page_count(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.limit))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn empty(page: u32, limit: u32) -> Self {
        Self {
            items: Vec::new(),
            pagination: Pagination {
                page,
                limit,
                total: 0,
            },
        }
    }
}

/// Order records newest first and cut out one page.
///
/// `records` must be in insertion order; insertion order breaks ties between
/// records with the same timestamp, newest insert first.
pub fn paginate<'a, I>(records: I, page: u32, limit: u32) -> Page<AuditRecord>
where
    I: IntoIterator<Item = &'a AuditRecord>,
{
    let mut ordered: Vec<(usize, &AuditRecord)> = records.into_iter().enumerate().collect();
    ordered.sort_by(|(ia, a), (ib, b)| {
        b.recorded_at
            .cmp(&a.recorded_at)
            .then_with(|| ib.cmp(ia))
    });

    let total = ordered.len() as u64;
    let skip = (page.saturating_sub(1) as usize).saturating_mul(limit as usize);
    let items = ordered
        .into_iter()
        .skip(skip)
        .take(limit as usize)
        .map(|(_, r)| r.clone())
        .collect();

    Page {
        items,
        pagination: Pagination { page, limit, total },
    }
}
