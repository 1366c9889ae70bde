//! In-memory directory double for tests

use crate::error::{DirectoryError, DirectoryResult};
use crate::ldap::{BindRequest, DirectoryConnector, DirectoryEntry, DirectorySession, SearchRequest};
use crate::pool::{ServerDescriptor, ServerPool};
use crate::tls::TlsContext;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use verity_core::DirectoryConfigSection;

pub const TEST_BASE_DN: &str = "ou=accounts,ou=caedm,dc=et,dc=byu,dc=edu";

pub fn test_descriptor(host: &str) -> (ServerDescriptor, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let tls = TlsContext::from_ca_path(dir.path()).unwrap();
    let server = ServerDescriptor::new(host, tls, Duration::from_secs(5)).unwrap();
    (server, dir)
}

pub fn test_pool(hosts: &[&str]) -> (ServerPool, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let tls = TlsContext::from_ca_path(dir.path()).unwrap();
    let pool = ServerPool::build(hosts, TEST_BASE_DN, &tls, Duration::from_secs(5));
    (pool, dir)
}

/// CAEDM-profile config whose CA path is a fresh temp directory
pub fn test_config(hosts: &[&str]) -> (DirectoryConfigSection, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_ca(hosts, dir.path());
    (config, dir)
}

pub fn config_with_ca(hosts: &[&str], ca_path: &Path) -> DirectoryConfigSection {
    DirectoryConfigSection {
        servers: hosts.iter().map(|h| h.to_string()).collect(),
        base_dn: TEST_BASE_DN.to_string(),
        ca_cert_path: ca_path.to_path_buf(),
        ..DirectoryConfigSection::caedm()
    }
}

/// In-memory sink for formatted log output
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Route this thread's logs into a buffer until the guard drops
pub fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(move || writer.clone())
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buffer, guard)
}

/// A bind as the directory saw it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedBind {
    Anonymous,
    Simple { dn: String, secret: String },
}

impl RecordedBind {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, RecordedBind::Anonymous)
    }
}

#[derive(Default)]
struct MockState {
    unreachable: HashSet<String>,
    slow: HashSet<String>,
    anonymous_denied: HashSet<String>,
    accounts: HashMap<String, String>,
    entries: HashMap<String, DirectoryEntry>,
    search_timeout: bool,
    connect_attempts: Vec<String>,
    opens: usize,
    releases: usize,
    binds: Vec<RecordedBind>,
    searches: Vec<SearchRequest>,
}

/// Scriptable directory keyed by server host
#[derive(Clone, Default)]
pub struct MockDirectory {
    state: Arc<Mutex<MockState>>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connections to this host fail
    pub fn unreachable(self, host: &str) -> Self {
        self.state.lock().unreachable.insert(host.to_string());
        self
    }

    /// Connections to this host time out
    pub fn slow(self, host: &str) -> Self {
        self.state.lock().slow.insert(host.to_string());
        self
    }

    /// This host rejects anonymous binds
    pub fn deny_anonymous(self, host: &str) -> Self {
        self.state.lock().anonymous_denied.insert(host.to_string());
        self
    }

    /// Every search exceeds its time limit
    pub fn search_times_out(self) -> Self {
        self.state.lock().search_timeout = true;
        self
    }

    /// Account that can bind with `secret`, searchable by `cn`
    pub fn with_user(self, identifier: &str, secret: &str, display_name: &str, group: &str) -> Self {
        let dn = format!("cn={},{}", identifier, TEST_BASE_DN);
        self.with_account(&dn, secret).with_entry(
            identifier,
            DirectoryEntry::new(dn.clone())
                .with_attribute("cn", identifier)
                .with_attribute("displayName", display_name)
                .with_attribute("CAEDMUserType", group),
        )
    }

    /// Bindable DN without a searchable entry
    pub fn with_account(self, dn: &str, secret: &str) -> Self {
        self.state
            .lock()
            .accounts
            .insert(dn.to_string(), secret.to_string());
        self
    }

    /// Entry returned for a filter of the form `(attr=value)`
    pub fn with_entry(self, value: &str, entry: DirectoryEntry) -> Self {
        self.state.lock().entries.insert(value.to_string(), entry);
        self
    }

    pub fn mark_unreachable(&self, host: &str) {
        self.state.lock().unreachable.insert(host.to_string());
    }

    pub fn mark_reachable(&self, host: &str) {
        self.state.lock().unreachable.remove(host);
    }

    /// Every connect attempt, successful or not, by host
    pub fn connect_attempts(&self) -> Vec<String> {
        self.state.lock().connect_attempts.clone()
    }

    pub fn opens(&self) -> usize {
        self.state.lock().opens
    }

    pub fn releases(&self) -> usize {
        self.state.lock().releases
    }

    pub fn binds(&self) -> Vec<RecordedBind> {
        self.state.lock().binds.clone()
    }

    pub fn searches(&self) -> Vec<SearchRequest> {
        self.state.lock().searches.clone()
    }

    /// Forget recorded traffic, keep the script
    pub fn reset_counters(&self) {
        let mut state = self.state.lock();
        state.connect_attempts.clear();
        state.opens = 0;
        state.releases = 0;
        state.binds.clear();
        state.searches.clear();
    }
}

#[async_trait]
impl DirectoryConnector for MockDirectory {
    async fn connect(&self, server: &ServerDescriptor) -> DirectoryResult<Box<dyn DirectorySession>> {
        let mut state = self.state.lock();
        let host = server.host().to_string();
        state.connect_attempts.push(host.clone());

        if state.slow.contains(&host) {
            return Err(DirectoryError::Timeout);
        }
        if state.unreachable.contains(&host) {
            return Err(DirectoryError::Connect {
                server: server.url().to_string(),
                reason: "connection refused".into(),
            });
        }

        state.opens += 1;
        Ok(Box::new(MockSession {
            host,
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockSession {
    host: String,
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl DirectorySession for MockSession {
    async fn bind(&mut self, request: BindRequest<'_>) -> DirectoryResult<()> {
        let mut state = self.state.lock();
        match request {
            BindRequest::Anonymous => {
                state.binds.push(RecordedBind::Anonymous);
                if state.anonymous_denied.contains(&self.host) {
                    return Err(DirectoryError::Bind {
                        rc: 48,
                        message: "anonymous bind disallowed".into(),
                    });
                }
                Ok(())
            }
            BindRequest::Simple { dn, secret } => {
                state.binds.push(RecordedBind::Simple {
                    dn: dn.to_string(),
                    secret: secret.to_string(),
                });
                match state.accounts.get(dn) {
                    Some(expected) if expected == secret => Ok(()),
                    _ => Err(DirectoryError::InvalidCredentials),
                }
            }
        }
    }

    async fn search(&mut self, request: &SearchRequest) -> DirectoryResult<Vec<DirectoryEntry>> {
        let mut state = self.state.lock();
        state.searches.push(request.clone());

        if state.search_timeout {
            return Err(DirectoryError::SearchTimeout);
        }

        let value = request
            .filter
            .trim_start_matches('(')
            .trim_end_matches(')')
            .split_once('=')
            .map(|(_, value)| value.to_string())
            .unwrap_or_default();

        Ok(state.entries.get(&value).cloned().into_iter().collect())
    }

    async fn unbind(&mut self) -> DirectoryResult<()> {
        self.state.lock().releases += 1;
        Ok(())
    }
}
