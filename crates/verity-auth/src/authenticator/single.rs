use super::{
    record_auth_failure, record_auth_success, record_lookup_failure, DirectoryAuthenticator,
    DirectoryQuery, PoolStatus,
};
use crate::error::DirectoryError;
use crate::ldap::{DirectoryConnector, LdapConnector};
use crate::metrics;
use crate::pool::ServerDescriptor;
use crate::tls::TlsContext;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, warn};
use verity_core::config::DirectoryMode;
use verity_core::types::{AuthenticatedIdentity, LoginStyle, Verdict};
use verity_core::{DirectoryConfigSection, Result};

/// Authenticator bound to exactly one directory server.
///
/// There is no startup probe; a dead server shows up as a failed call.
pub struct SingleServerDirectoryAuthenticator {
    address: String,
    server: Option<Arc<ServerDescriptor>>,
    query: DirectoryQuery,
    label: String,
    auth_method: String,
    login_style: LoginStyle,
}

impl SingleServerDirectoryAuthenticator {
    pub fn new(config: &DirectoryConfigSection) -> Result<Self> {
        Self::with_connector(config, Arc::new(LdapConnector::new()))
    }

    pub fn with_connector(
        config: &DirectoryConfigSection,
        connector: Arc<dyn DirectoryConnector>,
    ) -> Result<Self> {
        config.validate()?;

        let tls = TlsContext::from_ca_path(&config.ca_cert_path)?;
        let address = config.servers.first().cloned().unwrap_or_default();

        let server = match ServerDescriptor::new(&address, tls, config.connection_timeout()) {
            Ok(server) => {
                info!("{} directory server: {}", config.label, server);
                Some(Arc::new(server))
            }
            Err(e) => {
                error!("Ignoring LDAP server address {}: {}", address, e);
                None
            }
        };

        Ok(Self {
            address,
            server,
            query: DirectoryQuery::new(config, connector),
            label: config.label.clone(),
            auth_method: config.auth_method.clone(),
            login_style: config.login_style.clone(),
        })
    }

    pub fn server(&self) -> Option<&Arc<ServerDescriptor>> {
        self.server.as_ref()
    }
}

#[async_trait]
impl DirectoryAuthenticator for SingleServerDirectoryAuthenticator {
    async fn authenticate(&self, identifier: &str, secret: &str) -> Option<Verdict> {
        if secret.is_empty() {
            metrics::record_auth(DirectoryError::MissingSecret.category());
            warn!(identifier = %identifier, "{} login attempted without a password", self.label);
            return None;
        }

        let Some(server) = self.server.as_deref() else {
            metrics::record_auth("no_server");
            warn!("No usable {} directory server configured", self.label);
            return None;
        };

        match self.query.verify(server, identifier, secret).await {
            Ok(verdict) => {
                record_auth_success(&self.label, identifier, server);
                Some(verdict)
            }
            Err(e) => {
                record_auth_failure(&self.label, identifier, server, &e);
                None
            }
        }
    }

    async fn fetch_user(&self, identifier: &str) -> Option<AuthenticatedIdentity> {
        let Some(server) = self.server.as_deref() else {
            metrics::record_lookup("no_server");
            warn!("No usable {} directory server configured", self.label);
            return None;
        };

        match self.query.lookup(server, identifier).await {
            Ok(verdict) => {
                metrics::record_lookup("success");
                Some(verdict.into_identity(self.auth_method.as_str()))
            }
            Err(e) => {
                record_lookup_failure(&self.label, identifier, server, &e);
                None
            }
        }
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn auth_method(&self) -> &str {
        &self.auth_method
    }

    fn login_style(&self) -> &LoginStyle {
        &self.login_style
    }

    fn status(&self) -> PoolStatus {
        let url = self.server.as_ref().map(|s| s.url().to_string());
        PoolStatus {
            label: self.label.clone(),
            mode: DirectoryMode::Single,
            configured: vec![url.clone().unwrap_or_else(|| self.address.clone())],
            usable: url.into_iter().collect(),
            cursor: 0,
            probed_at: None,
        }
    }
}
