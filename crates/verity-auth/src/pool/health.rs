//! Startup health probing
//!
//! Each server gets one anonymous bind. Servers that accept it are usable;
//! the rest are logged and left out. The probe connection is released
//! whatever the outcome, and one bad server never stops the pass.

use super::{ServerDescriptor, ServerPool};
use crate::error::DirectoryResult;
use crate::ldap::{BindRequest, DirectoryConnector, SessionGuard};
use crate::metrics;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of probing one server
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub server: Arc<ServerDescriptor>,
    pub usable: bool,
    pub error: Option<String>,
}

pub struct HealthProber {
    connector: Arc<dyn DirectoryConnector>,
}

impl HealthProber {
    pub fn new(connector: Arc<dyn DirectoryConnector>) -> Self {
        Self { connector }
    }

    /// Anonymous connect + bind + unbind against one server
    pub async fn probe(&self, server: &ServerDescriptor) -> DirectoryResult<()> {
        let mut guard = SessionGuard::open(self.connector.as_ref(), server).await?;
        let result = guard.bind(BindRequest::Anonymous).await;
        guard.release().await;
        result
    }

    /// Probe every server in pool order
    pub async fn probe_all(&self, pool: &ServerPool) -> Vec<ProbeOutcome> {
        let mut outcomes = Vec::with_capacity(pool.len());

        for server in pool.servers() {
            let outcome = match self.probe(server).await {
                Ok(()) => {
                    debug!("LDAP server {} accepted anonymous bind", server);
                    metrics::record_probe(true);
                    ProbeOutcome {
                        server: Arc::clone(server),
                        usable: true,
                        error: None,
                    }
                }
                Err(e) => {
                    warn!(
                        server = %server,
                        category = e.category(),
                        "Failed to bind to LDAP server: {}",
                        e
                    );
                    metrics::record_probe(false);
                    ProbeOutcome {
                        server: Arc::clone(server),
                        usable: false,
                        error: Some(e.to_string()),
                    }
                }
            };
            outcomes.push(outcome);
        }

        outcomes
    }

    /// The usable subset of the pool, order preserved
    pub async fn usable_servers(&self, pool: &ServerPool) -> Vec<Arc<ServerDescriptor>> {
        let usable: Vec<_> = self
            .probe_all(pool)
            .await
            .into_iter()
            .filter(|outcome| outcome.usable)
            .map(|outcome| outcome.server)
            .collect();

        if usable.is_empty() {
            warn!("No reachable LDAP server in a pool of {}", pool.len());
        } else {
            info!("{} of {} LDAP server(s) usable", usable.len(), pool.len());
        }

        usable
    }
}
