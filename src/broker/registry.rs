//! Client registry
//!
//! The set of clients that receive broadcasts. Only the dispatch loop owns
//! and mutates a `ClientRegistry`; other contexts see it through immutable
//! [`RegistrySnapshot`]s published after each change.

use std::collections::HashMap;
use std::sync::Arc;

use crate::client::{ClientId, WeakClientHandle};

#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: HashMap<ClientId, WeakClientHandle>,
}

/// Point-in-time copy of the registry membership.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    clients: Arc<[WeakClientHandle]>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a client. Returns `false` if it was already present, in which
    /// case nothing changes.
    pub fn insert(&mut self, client: WeakClientHandle) -> bool {
        if self.clients.contains_key(&client.id()) {
            return false;
        }
        self.clients.insert(client.id(), client);
        true
    }

    /// Remove a client. Returns `false` if it was not present.
    pub fn remove(&mut self, id: &ClientId) -> bool {
        self.clients.remove(id).is_some()
    }

    pub fn contains(&self, id: &ClientId) -> bool {
        self.clients.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn clear(&mut self) {
        self.clients.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeakClientHandle> {
        self.clients.values()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            clients: self.clients.values().cloned().collect(),
        }
    }
}

impl RegistrySnapshot {
    pub fn iter(&self) -> impl Iterator<Item = &WeakClientHandle> {
        self.clients.iter()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn ids(&self) -> Vec<ClientId> {
        self.clients.iter().map(WeakClientHandle::id).collect()
    }
}
