//! Process configuration, read from environment variables.
//!
//! Variables (all optional):
//!   CATALOG_LOG                 tracing filter (default: info,catalog_content=debug)
//!   CATALOG_DEFAULT_PAGE_LIMIT  audit page size when none is given (default: 10)
//!   CATALOG_MAX_PAGE_LIMIT      largest audit page size accepted (default: 100)
//!   CATALOG_LOCALE              locale for audit value formatting (default: en-US)
//!
//! A `.env` file in the working directory is honoured. Unparsable values fall
//! back to their defaults with a warning.

use std::str::FromStr;

use catalog_content_core::audit::{DisplayLocale, PaginationPolicy};

pub const DEFAULT_LOG_FILTER: &str = "info,catalog_content=debug";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub log_filter: String,
    pub paging: PaginationPolicy,
    pub locale: DisplayLocale,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            paging: PaginationPolicy::default(),
            locale: DisplayLocale::default(),
        }
    }
}

impl CatalogConfig {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let log_filter = lookup("CATALOG_LOG")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.log_filter);

        let default_limit = parse_or("CATALOG_DEFAULT_PAGE_LIMIT", &lookup, defaults.paging.default_limit);
        let max_limit = parse_or("CATALOG_MAX_PAGE_LIMIT", &lookup, defaults.paging.max_limit);
        let paging = PaginationPolicy {
            default_limit: default_limit.max(1),
            max_limit: max_limit.max(1),
        };

        let locale = parse_or("CATALOG_LOCALE", &lookup, defaults.locale);

        Self {
            log_filter,
            paging,
            locale,
        }
    }
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("ignoring {key}={raw:?}: {e}; using {default:?}");
                default
            }
        },
    }
}
