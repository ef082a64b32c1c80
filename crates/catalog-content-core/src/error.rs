use thiserror::Error;

/// Fixed reason carried by every `own`-scope rejection.
pub const OWN_SCOPE_VIOLATION: &str = "own-scope violation";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("internal: {0}")]
    Internal(#[from] anyhow::Error),
}

impl CatalogError {
    pub fn own_scope_violation() -> Self {
        Self::Forbidden(OWN_SCOPE_VIOLATION.into())
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::InvalidInput(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden(_))
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
