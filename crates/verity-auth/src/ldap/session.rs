//! Connection seam between the authenticators and the wire protocol
//!
//! Every directory operation goes through a [`DirectoryConnector`], which
//! opens one [`DirectorySession`] per call. Sessions are wrapped in a
//! [`SessionGuard`] so they are unbound on every exit path.

use crate::error::{DirectoryError, DirectoryResult};
use crate::ldap::types::{BindRequest, DirectoryEntry, SearchRequest};
use crate::pool::ServerDescriptor;
use async_trait::async_trait;
use tracing::debug;

/// An open connection to one directory server
#[async_trait]
pub trait DirectorySession: Send {
    async fn bind(&mut self, request: BindRequest<'_>) -> DirectoryResult<()>;

    async fn search(&mut self, request: &SearchRequest) -> DirectoryResult<Vec<DirectoryEntry>>;

    async fn unbind(&mut self) -> DirectoryResult<()>;
}

/// Opens sessions against a server descriptor
#[async_trait]
pub trait DirectoryConnector: Send + Sync {
    async fn connect(&self, server: &ServerDescriptor) -> DirectoryResult<Box<dyn DirectorySession>>;
}

/// Owns a session until it is released.
///
/// `release` unbinds explicitly. If a guard is dropped without being
/// released (early return, cancellation), the unbind is spawned onto the
/// current runtime instead.
pub struct SessionGuard {
    server: String,
    session: Option<Box<dyn DirectorySession>>,
}

impl SessionGuard {
    pub async fn open(
        connector: &dyn DirectoryConnector,
        server: &ServerDescriptor,
    ) -> DirectoryResult<Self> {
        let session = connector.connect(server).await?;
        Ok(Self {
            server: server.url().to_string(),
            session: Some(session),
        })
    }

    pub async fn bind(&mut self, request: BindRequest<'_>) -> DirectoryResult<()> {
        match self.session.as_mut() {
            Some(session) => session.bind(request).await,
            None => Err(DirectoryError::Released),
        }
    }

    pub async fn search(&mut self, request: &SearchRequest) -> DirectoryResult<Vec<DirectoryEntry>> {
        match self.session.as_mut() {
            Some(session) => session.search(request).await,
            None => Err(DirectoryError::Released),
        }
    }

    /// Unbind and close. Unbind failures are only logged: the connection
    /// is gone either way.
    pub async fn release(mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.unbind().await {
                debug!(server = %self.server, error = %e, "Unbind failed");
            }
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let server = std::mem::take(&mut self.server);
                handle.spawn(async move {
                    if let Err(e) = session.unbind().await {
                        debug!(server = %server, error = %e, "Deferred unbind failed");
                    }
                });
            }
            Err(_) => {
                debug!(server = %self.server, "Session dropped outside a runtime, closing without unbind");
            }
        }
    }
}
