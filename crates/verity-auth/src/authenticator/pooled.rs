use super::{
    record_auth_failure, record_auth_success, record_lookup_failure, DirectoryAuthenticator,
    DirectoryQuery, PoolStatus,
};
use crate::error::DirectoryError;
use crate::ldap::{DirectoryConnector, LdapConnector};
use crate::metrics;
use crate::pool::{HealthProber, RoundRobinSelector, ServerDescriptor, ServerPool};
use crate::tls::TlsContext;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};
use verity_core::config::{DirectoryMode, StaleServerPolicy};
use verity_core::types::{AuthenticatedIdentity, LoginStyle, Verdict};
use verity_core::{DirectoryConfigSection, Result};

/// Authenticator over a pool of interchangeable directory servers.
///
/// Servers are probed once at construction; only those that accept an
/// anonymous bind enter the rotation. Each call takes the next server
/// round-robin and makes exactly one attempt against it.
pub struct PooledDirectoryAuthenticator {
    pool: ServerPool,
    prober: HealthProber,
    selector: RoundRobinSelector,
    query: DirectoryQuery,
    label: String,
    auth_method: String,
    login_style: LoginStyle,
    stale_policy: StaleServerPolicy,
    probed_at: RwLock<Option<DateTime<Utc>>>,
}

impl PooledDirectoryAuthenticator {
    pub async fn new(config: &DirectoryConfigSection) -> Result<Self> {
        Self::with_connector(config, Arc::new(LdapConnector::new())).await
    }

    /// Validate, load trust anchors, build the pool and probe it.
    ///
    /// A missing CA path or invalid config fails construction. Unreachable
    /// or malformed servers do not: they are logged and left out.
    pub async fn with_connector(
        config: &DirectoryConfigSection,
        connector: Arc<dyn DirectoryConnector>,
    ) -> Result<Self> {
        config.validate()?;

        let tls = TlsContext::from_ca_path(&config.ca_cert_path)?;
        let pool = ServerPool::build(
            config.servers.as_slice(),
            &config.base_dn,
            &tls,
            config.connection_timeout(),
        );

        let query = DirectoryQuery::new(config, Arc::clone(&connector));
        let prober = HealthProber::new(connector);

        let usable = prober.usable_servers(&pool).await;
        metrics::set_usable_servers(usable.len());

        info!(
            "{} directory pool ready: {} of {} server(s) usable",
            config.label,
            usable.len(),
            pool.len()
        );

        Ok(Self {
            pool,
            prober,
            selector: RoundRobinSelector::new(usable),
            query,
            label: config.label.clone(),
            auth_method: config.auth_method.clone(),
            login_style: config.login_style.clone(),
            stale_policy: config.stale_server_policy,
            probed_at: RwLock::new(Some(Utc::now())),
        })
    }

    /// Probe the whole pool again and replace the rotation.
    /// Returns the number of usable servers.
    pub async fn reprobe(&self) -> usize {
        let usable = self.prober.usable_servers(&self.pool).await;
        let count = usable.len();

        self.selector.replace(usable);
        *self.probed_at.write() = Some(Utc::now());
        metrics::set_usable_servers(count);

        info!("{} directory pool re-probed: {} usable", self.label, count);
        count
    }

    /// Servers currently in rotation, in rotation order
    pub fn usable_servers(&self) -> Vec<Arc<ServerDescriptor>> {
        self.selector.snapshot().0
    }

    pub fn pool(&self) -> &ServerPool {
        &self.pool
    }

    fn handle_connection_failure(&self, server: &ServerDescriptor, error: &DirectoryError) {
        if !error.is_connection_level() {
            return;
        }

        match self.stale_policy {
            StaleServerPolicy::Evict => {
                if self.selector.evict(server.url()) {
                    metrics::record_eviction();
                    metrics::set_usable_servers(self.selector.len());
                }
            }
            StaleServerPolicy::Retain => {
                debug!(server = %server, "Keeping failing server in rotation until re-probe");
            }
        }
    }
}

#[async_trait]
impl DirectoryAuthenticator for PooledDirectoryAuthenticator {
    async fn authenticate(&self, identifier: &str, secret: &str) -> Option<Verdict> {
        if secret.is_empty() {
            metrics::record_auth(DirectoryError::MissingSecret.category());
            warn!(identifier = %identifier, "{} login attempted without a password", self.label);
            return None;
        }

        let Some(server) = self.selector.next() else {
            metrics::record_auth("no_server");
            return None;
        };

        match self.query.verify(&server, identifier, secret).await {
            Ok(verdict) => {
                record_auth_success(&self.label, identifier, &server);
                Some(verdict)
            }
            Err(e) => {
                record_auth_failure(&self.label, identifier, &server, &e);
                self.handle_connection_failure(&server, &e);
                None
            }
        }
    }

    async fn fetch_user(&self, identifier: &str) -> Option<AuthenticatedIdentity> {
        let Some(server) = self.selector.next() else {
            metrics::record_lookup("no_server");
            return None;
        };

        match self.query.lookup(&server, identifier).await {
            Ok(verdict) => {
                metrics::record_lookup("success");
                Some(verdict.into_identity(self.auth_method.as_str()))
            }
            Err(e) => {
                record_lookup_failure(&self.label, identifier, &server, &e);
                self.handle_connection_failure(&server, &e);
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
        let (usable, cursor) = self.selector.snapshot();
        PoolStatus {
            label: self.label.clone(),
            mode: DirectoryMode::Pooled,
            configured: self.pool.servers().iter().map(|s| s.url().to_string()).collect(),
            usable: usable.iter().map(|s| s.url().to_string()).collect(),
            cursor,
            probed_at: *self.probed_at.read(),
        }
    }
}
