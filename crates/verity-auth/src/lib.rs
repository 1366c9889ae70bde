//! Directory authentication for Verity
//!
//! Verifies user credentials by binding to an LDAP directory over TLS and
//! reads user attributes for the identity layer. Two authenticators are
//! provided: a pooled one that health-probes its servers at startup and
//! spreads calls round-robin, and a single-server one without probing.
//!
//! ```no_run
//! use verity_auth::{build_authenticator, DirectoryAuthenticator};
//! use verity_core::DirectoryConfigSection;
//!
//! # async fn run() -> verity_core::Result<()> {
//! let auth = build_authenticator(&DirectoryConfigSection::caedm()).await?;
//! if let Some(verdict) = auth.authenticate("alice", "secret").await {
//!     println!("{} ({})", verdict.display_name, verdict.group);
//! }
//! # Ok(())
//! # }
//! ```

pub mod authenticator;
pub mod error;
pub mod ldap;
pub mod metrics;
pub mod pool;
pub mod tls;

#[cfg(test)]
mod testing;

pub use authenticator::{
    build_authenticator, build_authenticator_with, DirectoryAuthenticator, PoolStatus,
    PooledDirectoryAuthenticator, SingleServerDirectoryAuthenticator,
};
pub use error::{DirectoryError, DirectoryResult};
pub use ldap::{DirectoryConnector, DirectorySession, LdapConnector};
pub use pool::{HealthProber, ProbeOutcome, RoundRobinSelector, ServerDescriptor, ServerPool};
pub use tls::TlsContext;
