//! TLS client context for directory connections
//!
//! Builds a rustls client configuration whose trust anchors come from a CA
//! certificate directory (or a single PEM bundle). Server certificates are
//! always verified; there is no switch to turn verification off.

use rustls::{pki_types::CertificateDer, ClientConfig, RootCertStore};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use verity_core::{Error, Result};

/// Shared, immutable TLS client configuration
#[derive(Clone)]
pub struct TlsContext {
    config: Arc<ClientConfig>,
    ca_path: PathBuf,
    anchors: usize,
}

impl TlsContext {
    /// Build a verifying client context from a CA certificate path.
    ///
    /// A missing path is a fatal misconfiguration. Files in the directory
    /// that do not contain PEM certificates are skipped.
    pub fn from_ca_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::CertificateDirectoryMissing(path.to_path_buf()));
        }

        let certs = if path.is_dir() {
            load_dir_certs(path)?
        } else {
            load_certs(path)?
        };

        let mut roots = RootCertStore::empty();
        let (added, ignored) = roots.add_parsable_certificates(certs);
        if ignored > 0 {
            debug!("Ignored {} unparsable CA certificate(s) in {:?}", ignored, path);
        }
        if added == 0 {
            warn!(
                "No trust anchors loaded from {:?}; TLS handshakes will fail",
                path
            );
        } else {
            info!("Loaded {} CA certificate(s) from {:?}", added, path);
        }

        let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| Error::Tls(format!("TLS config error: {}", e)))?
            .with_root_certificates(roots)
            .with_no_client_auth();

        Ok(Self {
            config: Arc::new(config),
            ca_path: path.to_path_buf(),
            anchors: added,
        })
    }

    /// Rustls configuration handed to the LDAP connector
    pub fn client_config(&self) -> Arc<ClientConfig> {
        Arc::clone(&self.config)
    }

    pub fn ca_path(&self) -> &Path {
        &self.ca_path
    }

    /// Number of trust anchors in the root store
    pub fn anchors(&self) -> usize {
        self.anchors
    }
}

impl std::fmt::Debug for TlsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsContext")
            .field("ca_path", &self.ca_path)
            .field("anchors", &self.anchors)
            .finish()
    }
}

/// Collect certificates from every regular file in a directory
fn load_dir_certs(dir: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    let mut certs = Vec::new();
    for file in files {
        match load_certs(&file) {
            Ok(mut found) => certs.append(&mut found),
            Err(e) => debug!("Skipping {:?}: {}", file, e),
        }
    }

    Ok(certs)
}

/// Load certificates from PEM file
fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let file = File::open(path)
        .map_err(|e| Error::Tls(format!("Failed to open certificate file {:?}: {}", path, e)))?;
    let mut reader = BufReader::new(file);

    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::Tls(format!("Failed to parse certificates: {}", e)))?;

    if certs.is_empty() {
        return Err(Error::Tls(format!("No certificates found in {:?}", path)));
    }

    Ok(certs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_ca(path: &Path, name: &str) {
        let ca = rcgen::generate_simple_self_signed(vec![name.to_string()]).unwrap();
        std::fs::write(path, ca.cert.pem()).unwrap();
    }

    #[test]
    fn test_missing_path_is_fatal() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");

        let err = TlsContext::from_ca_path(&missing).unwrap_err();
        assert!(matches!(err, Error::CertificateDirectoryMissing(p) if p == missing));
    }

    #[test]
    fn test_directory_skips_non_certificates() {
        let dir = tempdir().unwrap();
        write_ca(&dir.path().join("ca-one.pem"), "ldap-one.example.com");
        write_ca(&dir.path().join("ca-two.crt"), "ldap-two.example.com");
        std::fs::write(dir.path().join("README"), "not a certificate").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let ctx = TlsContext::from_ca_path(dir.path()).unwrap();
        assert_eq!(ctx.anchors(), 2);
        assert_eq!(ctx.ca_path(), dir.path());
    }

    #[test]
    fn test_bundle_file() {
        let dir = tempdir().unwrap();
        let bundle = dir.path().join("bundle.pem");
        write_ca(&bundle, "ldap.example.com");

        let ctx = TlsContext::from_ca_path(&bundle).unwrap();
        assert_eq!(ctx.anchors(), 1);
    }

    #[test]
    fn test_empty_directory_still_builds() {
        let dir = tempdir().unwrap();
        let ctx = TlsContext::from_ca_path(dir.path()).unwrap();
        assert_eq!(ctx.anchors(), 0);
    }

    #[test]
    fn test_bundle_without_certificates_fails() {
        let dir = tempdir().unwrap();
        let bundle = dir.path().join("empty.pem");
        std::fs::write(&bundle, "").unwrap();

        assert!(matches!(
            TlsContext::from_ca_path(&bundle),
            Err(Error::Tls(_))
        ));
    }
}
