//! Directory authenticators
//!
//! An authenticator answers two questions for the login layer: do these
//! credentials verify (`authenticate`), and what does the directory say
//! about this user (`fetch_user`). Every failure collapses to `None` at
//! this boundary; the reason is logged and counted, never surfaced.

mod pooled;
mod query;
mod single;

pub use pooled::PooledDirectoryAuthenticator;
pub use query::DirectoryQuery;
pub use single::SingleServerDirectoryAuthenticator;

use crate::error::DirectoryError;
use crate::ldap::{DirectoryConnector, LdapConnector};
use crate::metrics;
use crate::pool::ServerDescriptor;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use verity_core::config::DirectoryMode;
use verity_core::types::{AuthenticatedIdentity, LoginStyle, Verdict};
use verity_core::{DirectoryConfigSection, Result};

/// Credential verifier and attribute lookup over a directory
#[async_trait]
pub trait DirectoryAuthenticator: Send + Sync {
    /// Verify `secret` for `identifier` by binding as the user.
    ///
    /// `None` covers no usable server, rejected credentials, timeouts and
    /// a bind that succeeded without a matching entry.
    async fn authenticate(&self, identifier: &str, secret: &str) -> Option<Verdict>;

    /// Look a user up over an anonymous bind
    async fn fetch_user(&self, identifier: &str) -> Option<AuthenticatedIdentity>;

    /// Human-readable name, e.g. "CAEDM"
    fn label(&self) -> &str;

    /// Label stamped on identities from `fetch_user`
    fn auth_method(&self) -> &str;

    fn login_style(&self) -> &LoginStyle;

    fn status(&self) -> PoolStatus;
}

/// Point-in-time view of an authenticator's servers
#[derive(Debug, Clone, Serialize)]
pub struct PoolStatus {
    pub label: String,
    pub mode: DirectoryMode,
    pub configured: Vec<String>,
    pub usable: Vec<String>,
    pub cursor: usize,
    pub probed_at: Option<DateTime<Utc>>,
}

/// Build the authenticator the config's mode asks for, talking LDAP over TLS
pub async fn build_authenticator(
    config: &DirectoryConfigSection,
) -> Result<Box<dyn DirectoryAuthenticator>> {
    build_authenticator_with(config, Arc::new(LdapConnector::new())).await
}

pub async fn build_authenticator_with(
    config: &DirectoryConfigSection,
    connector: Arc<dyn DirectoryConnector>,
) -> Result<Box<dyn DirectoryAuthenticator>> {
    info!(
        "Building {} directory authenticator ({:?}, {} server(s))",
        config.label,
        config.mode,
        config.servers.len()
    );

    let authenticator: Box<dyn DirectoryAuthenticator> = match config.mode {
        DirectoryMode::Pooled => {
            Box::new(PooledDirectoryAuthenticator::with_connector(config, connector).await?)
        }
        DirectoryMode::Single => {
            Box::new(SingleServerDirectoryAuthenticator::with_connector(config, connector)?)
        }
    };

    Ok(authenticator)
}

pub(crate) fn record_auth_success(label: &str, identifier: &str, server: &ServerDescriptor) {
    metrics::record_auth("success");
    info!(server = %server, identifier = %identifier, "{} user authenticated", label);
}

pub(crate) fn record_auth_failure(
    label: &str,
    identifier: &str,
    server: &ServerDescriptor,
    error: &DirectoryError,
) {
    metrics::record_auth(error.category());

    match error {
        DirectoryError::SearchTimeout => warn!(
            server = %server,
            identifier = %identifier,
            category = error.category(),
            "LDAP search timed out for {} user",
            label
        ),
        DirectoryError::NotFound => warn!(
            server = %server,
            identifier = %identifier,
            category = error.category(),
            "{} user bind succeeded but no directory entry matched",
            label
        ),
        _ => warn!(
            server = %server,
            identifier = %identifier,
            category = error.category(),
            "{} user failed to authenticate: {}",
            label,
            error
        ),
    }
}

pub(crate) fn record_lookup_failure(
    label: &str,
    identifier: &str,
    server: &ServerDescriptor,
    error: &DirectoryError,
) {
    metrics::record_lookup(error.category());

    match error {
        DirectoryError::SearchTimeout => warn!(
            server = %server,
            identifier = %identifier,
            category = error.category(),
            "LDAP search timed out while fetching {} user",
            label
        ),
        _ => warn!(
            server = %server,
            identifier = %identifier,
            category = error.category(),
            "Failed to fetch {} user: {}",
            label,
            error
        ),
    }
}
