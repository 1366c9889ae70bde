//! Directory request and entry types

use std::collections::HashMap;
use std::time::Duration;

/// How a session authenticates itself
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum BindRequest<'a> {
    /// Unauthenticated bind, carries no secret
    Anonymous,
    /// Simple bind with a distinguished name and secret
    Simple { dn: &'a str, secret: &'a str },
}

impl BindRequest<'_> {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, BindRequest::Anonymous)
    }
}

impl std::fmt::Debug for BindRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindRequest::Anonymous => f.write_str("Anonymous"),
            BindRequest::Simple { dn, .. } => f
                .debug_struct("Simple")
                .field("dn", dn)
                .field("secret", &"<redacted>")
                .finish(),
        }
    }
}

/// Subtree search under a base DN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub base_dn: String,
    pub filter: String,
    pub attributes: Vec<String>,
    /// Server-side time limit, also used as the client-side wait bound
    pub time_limit: Duration,
}

/// A search result entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub dn: String,
    pub attributes: HashMap<String, Vec<String>>,
}

impl DirectoryEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// First value of an attribute. Attribute names compare
    /// case-insensitively, as LDAP does.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .and_then(|(_, values)| values.first())
            .map(|s| s.as_str())
    }
}
