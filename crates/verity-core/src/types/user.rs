//! User identity types

use serde::{Deserialize, Serialize};

/// Outcome of a successful credential check: the directory accepted the
/// secret and returned the user's entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub identifier: String,
    pub display_name: String,
    pub group: String,
}

impl Verdict {
    pub fn new(
        identifier: impl Into<String>,
        display_name: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: display_name.into(),
            group: group.into(),
        }
    }

    /// Attach an authentication-method label, producing an identity record
    pub fn into_identity(self, auth_method: impl Into<String>) -> AuthenticatedIdentity {
        AuthenticatedIdentity {
            identifier: self.identifier,
            display_name: self.display_name,
            group: self.group,
            auth_method: auth_method.into(),
        }
    }
}

/// Identity record handed to the user-management layer.
///
/// Produced by attribute lookups; the receiver decides whether to persist it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedIdentity {
    pub identifier: String,
    pub display_name: String,
    pub group: String,
    pub auth_method: String,
}

impl AuthenticatedIdentity {
    pub fn new(
        identifier: impl Into<String>,
        display_name: impl Into<String>,
        group: impl Into<String>,
        auth_method: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: display_name.into(),
            group: group.into(),
            auth_method: auth_method.into(),
        }
    }
}
