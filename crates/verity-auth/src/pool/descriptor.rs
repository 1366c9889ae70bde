use crate::tls::TlsContext;
use std::fmt;
use std::time::Duration;
use url::Url;
use verity_core::{Error, Result, DEFAULT_LDAPS_PORT};

/// One directory server: where it lives and how to reach it securely.
/// Immutable once built.
#[derive(Debug, Clone)]
pub struct ServerDescriptor {
    url: String,
    host: String,
    port: u16,
    tls: TlsContext,
    connect_timeout: Duration,
}

impl ServerDescriptor {
    /// Parse an address ("host", "host:port" or "ldaps://host[:port]").
    ///
    /// Plain `ldap://` addresses are rejected: every connection is TLS.
    pub fn new(address: &str, tls: TlsContext, connect_timeout: Duration) -> Result<Self> {
        let address = address.trim();
        if address.is_empty() {
            return Err(Error::InvalidAddress("empty address".into()));
        }

        let candidate = if address.contains("://") {
            address.to_string()
        } else {
            format!("ldaps://{}", address)
        };

        let parsed = Url::parse(&candidate)
            .map_err(|e| Error::InvalidAddress(format!("{}: {}", address, e)))?;

        if parsed.scheme() != "ldaps" {
            return Err(Error::InvalidAddress(format!(
                "{}: scheme must be ldaps, got {}",
                address,
                parsed.scheme()
            )));
        }

        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::InvalidAddress(format!("{}: missing host", address)))?
            .to_string();

        if !matches!(parsed.path(), "" | "/") || parsed.query().is_some() {
            return Err(Error::InvalidAddress(format!(
                "{}: unexpected path or query",
                address
            )));
        }

        let port = parsed.port().unwrap_or(DEFAULT_LDAPS_PORT);

        Ok(Self {
            url: format!("ldaps://{}:{}", host, port),
            host,
            port,
            tls,
            connect_timeout,
        })
    }

    /// Normalized `ldaps://host:port` form
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn tls(&self) -> &TlsContext {
        &self.tls
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

impl fmt::Display for ServerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tls() -> (TlsContext, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        (TlsContext::from_ca_path(dir.path()).unwrap(), dir)
    }

    #[test]
    fn test_bare_host_defaults_to_ldaps() {
        let (tls, _dir) = tls();
        let server = ServerDescriptor::new("ctldap.et.byu.edu", tls, Duration::from_secs(5)).unwrap();
        assert_eq!(server.url(), "ldaps://ctldap.et.byu.edu:636");
        assert_eq!(server.host(), "ctldap.et.byu.edu");
        assert_eq!(server.port(), 636);
        assert_eq!(server.to_string(), server.url());
    }

    #[test]
    fn test_explicit_port_and_scheme() {
        let (tls, _dir) = tls();
        let timeout = Duration::from_secs(3);

        let server = ServerDescriptor::new("ldap.example.com:1636", tls.clone(), timeout).unwrap();
        assert_eq!(server.port(), 1636);

        let server = ServerDescriptor::new(" ldaps://ldap.example.com/ ", tls, timeout).unwrap();
        assert_eq!(server.url(), "ldaps://ldap.example.com:636");
        assert_eq!(server.connect_timeout(), timeout);
    }

    #[test]
    fn test_malformed_addresses() {
        let (tls, _dir) = tls();
        let timeout = Duration::from_secs(5);

        for bad in [
            "",
            "ldap://plain.example.com",
            "https://ldap.example.com",
            "ldaps://",
            "host:notaport",
            "ldaps://ldap.example.com/ou=people",
        ] {
            let result = ServerDescriptor::new(bad, tls.clone(), timeout);
            assert!(
                matches!(result, Err(Error::InvalidAddress(_))),
                "expected {:?} to be rejected",
                bad
            );
        }
    }
}
