//! LDAP directory access
//!
//! Provides:
//! - A connector over the ldap3 async client (LDAPS only)
//! - The session seam used by the authenticators and health prober
//! - Request and entry types

mod client;
mod session;
mod types;

pub use client::LdapConnector;
pub use session::{DirectoryConnector, DirectorySession, SessionGuard};
pub use types::*;
