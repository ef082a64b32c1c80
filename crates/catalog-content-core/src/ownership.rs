//! Ownership scope gate.
//!
//! A pure check run before every mutation. Only the `own` scope binds: the
//! actor must be the entity's declared owner. Every other scope passes
//! through untouched and is left to the caller's broader authorization step.
//!
//! Owner and actor ids are compared as canonical strings, so a numeric id, an
//! opaque token and a UUID all compare equal to their textual form.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// Owner field consulted when the caller does not name one.
pub const DEFAULT_OWNER_FIELD: &str = "createdBy";

/// Authorization qualifier requested alongside a mutation.
///
/// The set is open: unknown values are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Scope {
    Own,
    Any,
    Other(String),
}

impl Scope {
    pub fn parse(s: &str) -> Self {
        match s {
            "own" => Self::Own,
            "any" => Self::Any,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Own => "own",
            Self::Any => "any",
            Self::Other(s) => s,
        }
    }

    pub fn is_own(&self) -> bool {
        matches!(self, Self::Own)
    }
}

impl From<String> for Scope {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<&str> for Scope {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        scope.as_str().to_string()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record that can report the canonical string form of a named field.
pub trait OwnedRecord {
    /// Canonical string of `field`, or `None` when the field is absent.
    fn owner_field(&self, field: &str) -> Option<String>;
}

impl OwnedRecord for serde_json::Value {
    fn owner_field(&self, field: &str) -> Option<String> {
        self.get(field).and_then(canonical_json_id)
    }
}

impl<T: OwnedRecord + ?Sized> OwnedRecord for &T {
    fn owner_field(&self, field: &str) -> Option<String> {
        (**self).owner_field(field)
    }
}

/// Canonical string form of any displayable id.
pub fn canonical_id(id: &dyn fmt::Display) -> String {
    id.to_string()
}

/// Canonical string form of a JSON-encoded id. `null` counts as absent.
///
/// Strings are taken verbatim, numbers and booleans in display form, and
/// structured ids in compact JSON. Integral floats drop their fraction, so
/// `1.0` and `1` are the same id.
pub fn canonical_json_id(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => Some(f.to_string()),
            _ => Some(n.to_string()),
        },
        serde_json::Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Assert that `actor_id` may act on `entity` under `scope`.
///
/// Non-`own` scopes always pass. Under `own`, the entity's `field` must be
/// present and canonically equal to the actor id, otherwise
/// `CatalogError::Forbidden` is returned.
pub fn assert_ownership<E>(
    scope: &Scope,
    entity: &E,
    actor_id: &dyn fmt::Display,
    field: &str,
) -> Result<()>
where
    E: OwnedRecord + ?Sized,
{
    if !scope.is_own() {
        return Ok(());
    }

    match entity.owner_field(field) {
        Some(owner) if owner == canonical_id(actor_id) => Ok(()),
        _ => Err(CatalogError::own_scope_violation()),
    }
}

/// [`assert_ownership`] against [`DEFAULT_OWNER_FIELD`].
pub fn assert_owner<E>(scope: &Scope, entity: &E, actor_id: &dyn fmt::Display) -> Result<()>
where
    E: OwnedRecord + ?Sized,
{
    assert_ownership(scope, entity, actor_id, DEFAULT_OWNER_FIELD)
}
