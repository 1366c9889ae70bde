//! Configuration for Verity

use crate::types::LoginStyle;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Locations searched by [`VerityConfig::discover`], highest priority first.
pub const CONFIG_SEARCH_PATHS: &[&str] = &[
    "/etc/verity.conf",
    "/etc/verity.yaml",
    "/opt/verity/verity.conf",
    "/opt/verity/verity.yaml",
    "/opt/verity/config.yaml",
    "verity.yaml",
    "../verity.yaml",
    "config.yaml",
    "../config.yaml",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerityConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub directory: DirectoryConfigSection,
}

impl VerityConfig {
    /// Load a configuration file. `.toml` files are read as TOML; everything
    /// else (`.yaml`, `.yml`, `.conf`) is YAML, the format of every file on
    /// the discovery path.
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::ConfigParse(format!("Failed to read {:?}: {}", path, e)))?;

        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));

        if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::ConfigParse(e.to_string()))
    }

    pub fn from_yaml_str(content: &str) -> crate::Result<Self> {
        // An empty YAML document means "all defaults"
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| crate::Error::ConfigParse(e.to_string()))
    }

    /// Load the first configuration found in [`CONFIG_SEARCH_PATHS`],
    /// falling back to defaults when none exists.
    pub fn discover() -> crate::Result<Self> {
        let paths: Vec<PathBuf> = CONFIG_SEARCH_PATHS.iter().map(PathBuf::from).collect();
        Self::discover_in(&paths)
    }

    pub fn discover_in(paths: &[PathBuf]) -> crate::Result<Self> {
        for (priority, path) in paths.iter().enumerate() {
            if path.exists() {
                info!("Using configuration at {:?} (priority {})", path, priority);
                return Self::from_file(path);
            }
        }

        warn!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Overlay `VERITY_*` environment variables
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary key lookup. Unparsable numbers and
    /// unknown enum values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(servers) = lookup("VERITY_LDAP_SERVERS") {
            self.directory.servers = servers
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(base_dn) = lookup("VERITY_LDAP_BASE_DN") {
            self.directory.base_dn = base_dn;
        }
        if let Some(path) = lookup("VERITY_CA_CERT_PATH") {
            self.directory.ca_cert_path = PathBuf::from(path);
        }
        if let Some(timeout) = lookup("VERITY_LDAP_TIMEOUT") {
            if let Ok(t) = timeout.parse() {
                self.directory.connection_timeout_seconds = t;
            }
        }
        if let Some(mode) = lookup("VERITY_LDAP_MODE") {
            match mode.as_str() {
                "pooled" => self.directory.mode = DirectoryMode::Pooled,
                "single" => self.directory.mode = DirectoryMode::Single,
                other => warn!("Ignoring unknown VERITY_LDAP_MODE '{}'", other),
            }
        }
        if let Some(policy) = lookup("VERITY_STALE_SERVER_POLICY") {
            match policy.as_str() {
                "retain" => self.directory.stale_server_policy = StaleServerPolicy::Retain,
                "evict" => self.directory.stale_server_policy = StaleServerPolicy::Evict,
                other => warn!("Ignoring unknown VERITY_STALE_SERVER_POLICY '{}'", other),
            }
        }
        if let Some(level) = lookup("VERITY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("VERITY_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Which authenticator variant to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryMode {
    /// Several servers, health-probed at startup and used round-robin
    #[default]
    Pooled,
    /// Exactly one server, no probing
    Single,
}

/// What happens to a usable server that starts failing after startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StaleServerPolicy {
    /// Keep the startup snapshot until the process restarts or a re-probe
    #[default]
    Retain,
    /// Drop a server from rotation after a connection-level failure
    Evict,
}

/// LDAP directory configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfigSection {
    #[serde(default)]
    pub mode: DirectoryMode,

    /// Directory addresses: "host", "host:port" or "ldaps://host[:port]"
    #[serde(default = "default_servers")]
    pub servers: Vec<String>,

    /// Search root shared by every server
    #[serde(default = "default_base_dn")]
    pub base_dn: String,

    /// Directory (or bundle file) holding trusted CA certificates
    #[serde(default = "default_ca_cert_path")]
    pub ca_cert_path: PathBuf,

    /// Connect/receive timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_seconds: u64,

    /// Attribute used both as the RDN of user entries and in the search filter
    #[serde(default = "default_identifier_attr")]
    pub identifier_attribute: String,

    #[serde(default = "default_display_name_attr")]
    pub display_name_attribute: String,

    #[serde(default = "default_group_attr")]
    pub group_attribute: String,

    /// Label stamped on identities returned by attribute lookups
    #[serde(default = "default_auth_method")]
    pub auth_method: String,

    /// Human-readable name of this authenticator
    #[serde(default = "default_label")]
    pub label: String,

    #[serde(default)]
    pub login_style: LoginStyle,

    #[serde(default)]
    pub stale_server_policy: StaleServerPolicy,
}

fn default_servers() -> Vec<String> {
    vec![
        "ctldap.et.byu.edu".to_string(),
        "cbldap.et.byu.edu".to_string(),
    ]
}

fn default_base_dn() -> String {
    "ou=accounts,ou=caedm,dc=et,dc=byu,dc=edu".to_string()
}

fn default_ca_cert_path() -> PathBuf {
    PathBuf::from(crate::DEFAULT_CA_CERT_PATH)
}

fn default_connection_timeout() -> u64 {
    crate::DEFAULT_CONNECTION_TIMEOUT_SECS
}

fn default_identifier_attr() -> String {
    "cn".to_string()
}

fn default_display_name_attr() -> String {
    "displayName".to_string()
}

fn default_group_attr() -> String {
    "CAEDMUserType".to_string()
}

fn default_auth_method() -> String {
    "caedm".to_string()
}

fn default_label() -> String {
    "CAEDM".to_string()
}

impl Default for DirectoryConfigSection {
    fn default() -> Self {
        Self::caedm()
    }
}

impl DirectoryConfigSection {
    /// Pooled deployment against the CAEDM account directory
    pub fn caedm() -> Self {
        Self {
            mode: DirectoryMode::Pooled,
            servers: default_servers(),
            base_dn: default_base_dn(),
            ca_cert_path: default_ca_cert_path(),
            connection_timeout_seconds: default_connection_timeout(),
            identifier_attribute: default_identifier_attr(),
            display_name_attribute: default_display_name_attr(),
            group_attribute: default_group_attr(),
            auth_method: default_auth_method(),
            label: default_label(),
            login_style: LoginStyle::form("c-square-fill"),
            stale_server_policy: StaleServerPolicy::Retain,
        }
    }

    /// Single-server deployment keyed by e-mail address
    pub fn email(server_url: impl Into<String>, base_dn: impl Into<String>) -> Self {
        Self {
            mode: DirectoryMode::Single,
            servers: vec![server_url.into()],
            base_dn: base_dn.into(),
            identifier_attribute: "mail".to_string(),
            display_name_attribute: "displayName".to_string(),
            group_attribute: "memberOf".to_string(),
            auth_method: "email".to_string(),
            label: "Email".to_string(),
            login_style: LoginStyle::form("envelope-fill"),
            ..Self::caedm()
        }
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_seconds)
    }

    /// Attributes requested by every user search
    pub fn search_attributes(&self) -> Vec<String> {
        vec![
            self.identifier_attribute.clone(),
            self.display_name_attribute.clone(),
            self.group_attribute.clone(),
        ]
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.servers.is_empty() {
            return Err(crate::Error::InvalidConfig(
                "At least one directory server is required".into(),
            ));
        }

        if self.mode == DirectoryMode::Single && self.servers.len() > 1 {
            return Err(crate::Error::InvalidConfig(format!(
                "Single-server mode accepts exactly one server, got {}",
                self.servers.len()
            )));
        }

        if self.base_dn.trim().is_empty() {
            return Err(crate::Error::InvalidConfig("Base DN is required".into()));
        }

        if self.connection_timeout_seconds == 0 {
            return Err(crate::Error::InvalidConfig(
                "Connection timeout must be at least one second".into(),
            ));
        }

        for (name, value) in [
            ("identifier_attribute", &self.identifier_attribute),
            ("display_name_attribute", &self.display_name_attribute),
            ("group_attribute", &self.group_attribute),
        ] {
            if value.trim().is_empty() {
                return Err(crate::Error::InvalidConfig(format!("{} must not be empty", name)));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_caedm_profile() {
        let config = DirectoryConfigSection::default();
        assert_eq!(config.mode, DirectoryMode::Pooled);
        assert_eq!(config.servers.len(), 2);
        assert_eq!(config.connection_timeout(), Duration::from_secs(5));
        assert_eq!(
            config.search_attributes(),
            vec!["cn", "displayName", "CAEDMUserType"]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_email_profile() {
        let config = DirectoryConfigSection::email("ldap.example.com", "ou=people,dc=example,dc=com");
        assert_eq!(config.mode, DirectoryMode::Single);
        assert_eq!(config.identifier_attribute, "mail");
        assert_eq!(config.group_attribute, "memberOf");
        assert_eq!(config.login_style.icon, "envelope-fill");
        assert_eq!(config.label, "Email");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_failures() {
        let mut config = DirectoryConfigSection::default();
        config.servers.clear();
        assert!(config.validate().is_err());

        let mut config = DirectoryConfigSection::default();
        config.base_dn = "  ".into();
        assert!(config.validate().is_err());

        let mut config = DirectoryConfigSection::default();
        config.connection_timeout_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = DirectoryConfigSection::default();
        config.mode = DirectoryMode::Single;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_parsing_with_defaults() {
        let config = VerityConfig::from_toml_str(
            r#"
            [logging]
            level = "debug"
            format = "json"

            [directory]
            servers = ["ldaps://a.example.com", "b.example.com:1636"]
            base_dn = "ou=people,dc=example,dc=com"
            stale_server_policy = "evict"
            "#,
        )
        .unwrap();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.directory.servers.len(), 2);
        assert_eq!(config.directory.stale_server_policy, StaleServerPolicy::Evict);
        assert_eq!(config.directory.identifier_attribute, "cn");
        assert_eq!(config.directory.connection_timeout_seconds, 5);
    }

    #[test]
    fn test_yaml_file_parsing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verity.yaml");
        std::fs::write(
            &path,
            "directory:\n  mode: single\n  servers: [\"mail.example.com\"]\n  identifier_attribute: mail\n",
        )
        .unwrap();

        let config = VerityConfig::from_file(&path).unwrap();
        assert_eq!(config.directory.mode, DirectoryMode::Single);
        assert_eq!(config.directory.identifier_attribute, "mail");
    }

    #[test]
    fn test_discover_uses_first_existing_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.yaml");
        let low = dir.path().join("low.toml");
        let high = dir.path().join("high.toml");
        std::fs::write(&low, "[logging]\nlevel = \"warn\"\nformat = \"pretty\"\n").unwrap();
        std::fs::write(&high, "[logging]\nlevel = \"trace\"\nformat = \"pretty\"\n").unwrap();

        let config = VerityConfig::discover_in(&[missing.clone(), high, low]).unwrap();
        assert_eq!(config.logging.level, "trace");

        let config = VerityConfig::discover_in(&[missing]).unwrap();
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_discover_reads_conf_file_as_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let conf = dir.path().join("verity.conf");
        std::fs::write(
            &conf,
            "directory:\n  base_dn: ou=people,dc=example,dc=com\n  servers:\n    - ldap1.example.com\n",
        )
        .unwrap();

        let config = VerityConfig::discover_in(&[dir.path().join("missing.conf"), conf]).unwrap();
        assert_eq!(config.directory.base_dn, "ou=people,dc=example,dc=com");
        assert_eq!(config.directory.servers, vec!["ldap1.example.com"]);
    }

    #[test]
    fn test_partial_logging_section_uses_defaults() {
        let config = VerityConfig::from_yaml_str(
            "logging:\n  log_path: logs\ndirectory:\n  base_dn: dc=x\n",
        )
        .unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.directory.base_dn, "dc=x");

        let config = VerityConfig::from_toml_str("[logging]\nlevel = \"debug\"\n").unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("VERITY_LDAP_SERVERS", "a.example.com, b.example.com,"),
            ("VERITY_LDAP_TIMEOUT", "not-a-number"),
            ("VERITY_LDAP_MODE", "single"),
            ("VERITY_STALE_SERVER_POLICY", "evict"),
            ("VERITY_CA_CERT_PATH", "/tmp/certs"),
        ]);

        let mut config = VerityConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.directory.servers, vec!["a.example.com", "b.example.com"]);
        assert_eq!(config.directory.connection_timeout_seconds, 5);
        assert_eq!(config.directory.mode, DirectoryMode::Single);
        assert_eq!(config.directory.stale_server_policy, StaleServerPolicy::Evict);
        assert_eq!(config.directory.ca_cert_path, PathBuf::from("/tmp/certs"));
    }
}
