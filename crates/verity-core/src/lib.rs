//! Verity Core Library
//!
//! Configuration, error and identity types shared by the Verity
//! directory authentication client and its command-line front end.

pub mod config;
pub mod error;
pub mod types;

pub use config::{DirectoryConfigSection, VerityConfig};
pub use error::{Error, Result};

/// Verity version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default LDAPS port used when an address does not name one
pub const DEFAULT_LDAPS_PORT: u16 = 636;

/// Default connect/receive timeout for directory operations (seconds)
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 5;

/// Default location of the system CA certificate directory
pub const DEFAULT_CA_CERT_PATH: &str = "/etc/ssl/certs";
