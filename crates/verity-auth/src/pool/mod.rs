//! Directory server pool
//!
//! # Components
//!
//! - [`ServerDescriptor`]: one LDAPS server, address plus TLS context
//! - [`ServerPool`]: every descriptor that could be built from configuration
//! - [`HealthProber`]: anonymous-bind probe that picks the usable servers
//! - [`RoundRobinSelector`]: hands out usable servers in rotation
//!
//! The pool is built once. Malformed addresses are logged and left out,
//! so a pool may be smaller than its configuration, or empty.

mod descriptor;
mod health;
mod selector;

pub use descriptor::ServerDescriptor;
pub use health::{HealthProber, ProbeOutcome};
pub use selector::RoundRobinSelector;

use crate::tls::TlsContext;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct ServerPool {
    servers: Vec<Arc<ServerDescriptor>>,
    base_dn: String,
}

impl ServerPool {
    /// Build descriptors for each address, skipping the ones that fail
    pub fn build<S: AsRef<str>>(
        addresses: &[S],
        base_dn: impl Into<String>,
        tls: &TlsContext,
        connect_timeout: Duration,
    ) -> Self {
        let mut servers = Vec::with_capacity(addresses.len());

        for address in addresses {
            let address = address.as_ref();
            match ServerDescriptor::new(address, tls.clone(), connect_timeout) {
                Ok(server) => servers.push(Arc::new(server)),
                Err(e) => warn!("Unable to initialize LDAP server {}: {}", address, e),
            }
        }

        info!(
            "Server pool built with {} of {} configured server(s)",
            servers.len(),
            addresses.len()
        );

        Self {
            servers,
            base_dn: base_dn.into(),
        }
    }

    pub fn servers(&self) -> &[Arc<ServerDescriptor>] {
        &self.servers
    }

    pub fn base_dn(&self) -> &str {
        &self.base_dn
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}
