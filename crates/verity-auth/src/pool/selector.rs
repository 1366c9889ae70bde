use super::ServerDescriptor;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};

/// Round-robin over the usable servers.
///
/// The server list and the cursor live under one lock, so reading the
/// current position and advancing it is a single step for concurrent
/// callers.
pub struct RoundRobinSelector {
    rotation: Mutex<Rotation>,
}

struct Rotation {
    servers: Vec<Arc<ServerDescriptor>>,
    cursor: usize,
}

impl RoundRobinSelector {
    pub fn new(servers: Vec<Arc<ServerDescriptor>>) -> Self {
        Self {
            rotation: Mutex::new(Rotation { servers, cursor: 0 }),
        }
    }

    /// Next server in rotation, or `None` when nothing is usable
    pub fn next(&self) -> Option<Arc<ServerDescriptor>> {
        let mut rotation = self.rotation.lock();
        if rotation.servers.is_empty() {
            warn!("No reachable LDAP server");
            return None;
        }

        let server = Arc::clone(&rotation.servers[rotation.cursor]);
        rotation.cursor = (rotation.cursor + 1) % rotation.servers.len();
        Some(server)
    }

    /// Replace the rotation (after a re-probe). The cursor restarts.
    pub fn replace(&self, servers: Vec<Arc<ServerDescriptor>>) {
        let mut rotation = self.rotation.lock();
        rotation.servers = servers;
        rotation.cursor = 0;
    }

    /// Take a server out of rotation. Returns false if it was not in it.
    pub fn evict(&self, url: &str) -> bool {
        let mut rotation = self.rotation.lock();
        let Some(index) = rotation.servers.iter().position(|s| s.url() == url) else {
            return false;
        };

        rotation.servers.remove(index);
        if index < rotation.cursor {
            rotation.cursor -= 1;
        }
        if rotation.cursor >= rotation.servers.len() {
            rotation.cursor = 0;
        }

        info!(
            "Evicted LDAP server {} from rotation, {} remaining",
            url,
            rotation.servers.len()
        );
        true
    }

    /// Current servers and cursor, read together
    pub fn snapshot(&self) -> (Vec<Arc<ServerDescriptor>>, usize) {
        let rotation = self.rotation.lock();
        (rotation.servers.clone(), rotation.cursor)
    }

    pub fn len(&self) -> usize {
        self.rotation.lock().servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rotation.lock().servers.is_empty()
    }
}
