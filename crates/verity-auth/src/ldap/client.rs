//! LDAP Client implementation
//!
//! Opens LDAPS connections with the pool's TLS context and maps ldap3
//! results onto [`DirectoryError`].

use crate::error::{DirectoryError, DirectoryResult};
use crate::ldap::session::{DirectoryConnector, DirectorySession};
use crate::ldap::types::{BindRequest, DirectoryEntry, SearchRequest};
use crate::pool::ServerDescriptor;
use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, LdapError, Scope, SearchEntry, SearchOptions, SearchResult};
use std::time::Duration;
use tracing::debug;

/// LDAP result codes the client distinguishes
mod rc {
    pub const SUCCESS: u32 = 0;
    pub const TIME_LIMIT_EXCEEDED: u32 = 3;
    pub const SIZE_LIMIT_EXCEEDED: u32 = 4;
    pub const NO_SUCH_OBJECT: u32 = 32;
    pub const INVALID_CREDENTIALS: u32 = 49;
}

/// Connector backed by the ldap3 async client
#[derive(Debug, Default, Clone, Copy)]
pub struct LdapConnector;

impl LdapConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DirectoryConnector for LdapConnector {
    async fn connect(&self, server: &ServerDescriptor) -> DirectoryResult<Box<dyn DirectorySession>> {
        let settings = LdapConnSettings::new()
            .set_conn_timeout(server.connect_timeout())
            .set_config(server.tls().client_config());

        debug!("Connecting to LDAP server: {}", server);

        let (conn, ldap) = LdapConnAsync::with_settings(settings, server.url())
            .await
            .map_err(|e| match e {
                LdapError::Timeout { .. } => DirectoryError::Timeout,
                other => DirectoryError::Connect {
                    server: server.url().to_string(),
                    reason: other.to_string(),
                },
            })?;

        ldap3::drive!(conn);

        Ok(Box::new(LdapSession {
            ldap,
            timeout: server.connect_timeout(),
        }))
    }
}

/// One ldap3 connection. Only bind, search and unbind are ever issued.
struct LdapSession {
    ldap: Ldap,
    timeout: Duration,
}

#[async_trait]
impl DirectorySession for LdapSession {
    async fn bind(&mut self, request: BindRequest<'_>) -> DirectoryResult<()> {
        let (dn, secret) = match request {
            BindRequest::Anonymous => ("", ""),
            BindRequest::Simple { dn, secret } => (dn, secret),
        };

        let result = self
            .ldap
            .with_timeout(self.timeout)
            .simple_bind(dn, secret)
            .await
            .map_err(protocol_error)?;

        bind_outcome(result.rc, result.text)
    }

    async fn search(&mut self, request: &SearchRequest) -> DirectoryResult<Vec<DirectoryEntry>> {
        let time_limit = i32::try_from(request.time_limit.as_secs()).unwrap_or(i32::MAX);
        let options = SearchOptions::new().timelimit(time_limit);

        let SearchResult(entries, result) = self
            .ldap
            .with_timeout(request.time_limit)
            .with_search_options(options)
            .search(
                &request.base_dn,
                Scope::Subtree,
                &request.filter,
                request.attributes.clone(),
            )
            .await
            .map_err(|e| match e {
                LdapError::Timeout { .. } => DirectoryError::SearchTimeout,
                other => DirectoryError::Search(other.to_string()),
            })?;

        if search_outcome(result.rc, &result.text)? == SearchOutcome::NoSuchObject {
            return Ok(Vec::new());
        }

        Ok(entries
            .into_iter()
            .map(|raw| {
                let entry = SearchEntry::construct(raw);
                DirectoryEntry {
                    dn: entry.dn,
                    attributes: entry.attrs.into_iter().collect(),
                }
            })
            .collect())
    }

    async fn unbind(&mut self) -> DirectoryResult<()> {
        self.ldap.unbind().await.map_err(protocol_error)
    }
}

/// Map a bind result code
fn bind_outcome(code: u32, text: String) -> DirectoryResult<()> {
    match code {
        rc::SUCCESS => Ok(()),
        rc::INVALID_CREDENTIALS => Err(DirectoryError::InvalidCredentials),
        code => Err(DirectoryError::Bind {
            rc: code,
            message: text,
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchOutcome {
    /// Entries (possibly truncated by a size limit) are usable
    Entries,
    /// The base DN does not exist; treated as no match
    NoSuchObject,
}

/// Map a search result code
fn search_outcome(code: u32, text: &str) -> DirectoryResult<SearchOutcome> {
    match code {
        rc::SUCCESS | rc::SIZE_LIMIT_EXCEEDED => Ok(SearchOutcome::Entries),
        rc::NO_SUCH_OBJECT => Ok(SearchOutcome::NoSuchObject),
        rc::TIME_LIMIT_EXCEEDED => Err(DirectoryError::SearchTimeout),
        code => Err(DirectoryError::Search(format!(
            "result code {}: {}",
            code, text
        ))),
    }
}

fn protocol_error(e: LdapError) -> DirectoryError {
    match e {
        LdapError::Timeout { .. } => DirectoryError::Timeout,
        other => DirectoryError::Protocol(other.to_string()),
    }
}
