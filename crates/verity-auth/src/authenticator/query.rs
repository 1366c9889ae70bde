//! Bind and search flows shared by both authenticators
//!
//! Both flows walk Unconnected -> Connected -> Searched -> Released, and
//! release the session before returning on every path.

use crate::error::{DirectoryError, DirectoryResult};
use crate::ldap::{BindRequest, DirectoryConnector, SearchRequest, SessionGuard};
use crate::pool::ServerDescriptor;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use verity_core::types::Verdict;
use verity_core::DirectoryConfigSection;

pub struct DirectoryQuery {
    connector: Arc<dyn DirectoryConnector>,
    base_dn: String,
    identifier_attribute: String,
    display_name_attribute: String,
    group_attribute: String,
    attributes: Vec<String>,
    timeout: Duration,
}

impl DirectoryQuery {
    pub fn new(config: &DirectoryConfigSection, connector: Arc<dyn DirectoryConnector>) -> Self {
        Self {
            connector,
            base_dn: config.base_dn.clone(),
            identifier_attribute: config.identifier_attribute.clone(),
            display_name_attribute: config.display_name_attribute.clone(),
            group_attribute: config.group_attribute.clone(),
            attributes: config.search_attributes(),
            timeout: config.connection_timeout(),
        }
    }

    pub fn connector(&self) -> Arc<dyn DirectoryConnector> {
        Arc::clone(&self.connector)
    }

    /// `<attr>=<identifier>,<base DN>` with the identifier DN-escaped
    pub fn user_dn(&self, identifier: &str) -> String {
        format!(
            "{}={},{}",
            self.identifier_attribute,
            ldap3::dn_escape(identifier),
            self.base_dn
        )
    }

    /// `(<attr>=<identifier>)` with the identifier filter-escaped
    pub fn user_filter(&self, identifier: &str) -> String {
        format!(
            "({}={})",
            self.identifier_attribute,
            ldap3::ldap_escape(identifier)
        )
    }

    fn search_request(&self, identifier: &str) -> SearchRequest {
        SearchRequest {
            base_dn: self.base_dn.clone(),
            filter: self.user_filter(identifier),
            attributes: self.attributes.clone(),
            time_limit: self.timeout,
        }
    }

    /// Bind as the user, then read their entry
    pub async fn verify(
        &self,
        server: &ServerDescriptor,
        identifier: &str,
        secret: &str,
    ) -> DirectoryResult<Verdict> {
        // An empty password turns a simple bind into an unauthenticated one
        if secret.is_empty() {
            return Err(DirectoryError::MissingSecret);
        }

        let mut guard = SessionGuard::open(self.connector.as_ref(), server).await?;
        let dn = self.user_dn(identifier);

        let result = match guard.bind(BindRequest::Simple { dn: &dn, secret }).await {
            Ok(()) => {
                debug!(server = %server, identifier = %identifier, "User bind succeeded");
                self.search_user(&mut guard, identifier).await
            }
            Err(e) => Err(e),
        };

        guard.release().await;
        result
    }

    /// Read a user's entry over an anonymous bind. No secret is sent.
    pub async fn lookup(&self, server: &ServerDescriptor, identifier: &str) -> DirectoryResult<Verdict> {
        let mut guard = SessionGuard::open(self.connector.as_ref(), server).await?;

        let result = match guard.bind(BindRequest::Anonymous).await {
            Ok(()) => self.search_user(&mut guard, identifier).await,
            Err(e) => Err(e),
        };

        guard.release().await;
        result
    }

    async fn search_user(&self, guard: &mut SessionGuard, identifier: &str) -> DirectoryResult<Verdict> {
        let request = self.search_request(identifier);
        let entries = guard.search(&request).await?;

        let entry = entries.into_iter().next().ok_or(DirectoryError::NotFound)?;
        debug!("Found user DN: {}", entry.dn);

        Ok(Verdict::new(
            identifier,
            entry.first(&self.display_name_attribute).unwrap_or_default(),
            entry.first(&self.group_attribute).unwrap_or_default(),
        ))
    }
}
