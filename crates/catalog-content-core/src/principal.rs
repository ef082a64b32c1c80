use serde::{Deserialize, Serialize};

use crate::ownership::Scope;

/// The acting user and the scope they requested for this call.
///
/// Constructed at the request boundary; core logic never reads raw session
/// or token data. There is no implicit or thread-local identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub actor_id: String,
    pub scope: Scope,
}

impl Principal {
    pub fn new(actor_id: impl Into<String>, scope: impl Into<Scope>) -> Self {
        Self {
            actor_id: actor_id.into(),
            scope: scope.into(),
        }
    }

    /// Principal restricted to entities it owns.
    pub fn own(actor_id: impl Into<String>) -> Self {
        Self::new(actor_id, Scope::Own)
    }

    /// Principal whose broader authorization already cleared it for any entity.
    pub fn any(actor_id: impl Into<String>) -> Self {
        Self::new(actor_id, Scope::Any)
    }
}
