//! Error types for Verity

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Configuration and construction-time failures.
///
/// Per-call directory failures never surface through this type; the
/// authenticators translate them into absent results.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Path to CA certificates does not exist: {0}")]
    CertificateDirectoryMissing(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid directory address: {0}")]
    InvalidAddress(String),

    #[error("TLS configuration error: {0}")]
    Tls(String),

    #[error("Failed to parse config: {0}")]
    ConfigParse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Short machine-readable category, used in logs
    pub fn code(&self) -> &'static str {
        match self {
            Error::CertificateDirectoryMissing(_) => "CertificateDirectoryMissing",
            Error::InvalidConfig(_) => "InvalidConfig",
            Error::InvalidAddress(_) => "InvalidAddress",
            Error::Tls(_) => "Tls",
            Error::ConfigParse(_) => "ConfigParse",
            Error::Io(_) => "Io",
            Error::Other(_) => "Internal",
        }
    }

    /// Whether the component can never be constructed with this configuration
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::CertificateDirectoryMissing(_) | Error::InvalidConfig(_) | Error::ConfigParse(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_cert_dir_is_fatal() {
        let err = Error::CertificateDirectoryMissing(PathBuf::from("/nope"));
        assert!(err.is_fatal());
        assert_eq!(err.code(), "CertificateDirectoryMissing");
        assert!(err.to_string().contains("/nope"));
    }

    #[test]
    fn test_address_error_is_not_fatal() {
        let err = Error::InvalidAddress("ldap://plain".into());
        assert!(!err.is_fatal());
    }
}
