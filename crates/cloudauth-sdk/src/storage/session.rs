//! Process-scoped in-memory storage

use super::{Namespace, StorageBackend};
use crate::auth::types::{AuthError, AuthResult};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

type Entries = Arc<Mutex<HashMap<String, String>>>;

/// Map shared by every store created with [`SessionStorage::new`]
static PROCESS_ENTRIES: Lazy<Entries> = Lazy::new(Entries::default);

/// In-memory store living as long as the process
///
/// [`SessionStorage::new`] instances all share one process-wide map, so
/// managers on the same namespace see each other's writes. Objects are kept
/// serialized so the optional quota applies to the bytes actually stored.
#[derive(Debug, Clone)]
pub struct SessionStorage {
    entries: Entries,
    quota_bytes: Option<usize>,
}

impl Default for SessionStorage {
    fn default() -> Self {
        Self {
            entries: PROCESS_ENTRIES.clone(),
            quota_bytes: None,
        }
    }
}

impl SessionStorage {
    /// Handle on the process-wide store
    pub fn new() -> Self {
        Self::default()
    }

    /// Private store, shared only with its own clones
    pub fn isolated() -> Self {
        Self {
            entries: Entries::default(),
            quota_bytes: None,
        }
    }

    /// Private store rejecting writes that would exceed `quota_bytes` in total
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: Entries::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Bytes currently stored across all namespaces
    pub fn used_bytes(&self) -> usize {
        self.entries.lock().values().map(String::len).sum()
    }
}

#[async_trait]
impl StorageBackend for SessionStorage {
    async fn read(&self, namespace: &str) -> AuthResult<Option<Namespace>> {
        let raw = self.entries.lock().get(namespace).cloned();
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn write(&self, namespace: &str, object: &Namespace) -> AuthResult<()> {
        let raw = serde_json::to_string(object)?;
        let mut entries = self.entries.lock();

        if let Some(quota) = self.quota_bytes {
            let others: usize = entries
                .iter()
                .filter(|(name, _)| name.as_str() != namespace)
                .map(|(_, value)| value.len())
                .sum();
            if others + raw.len() > quota {
                return Err(AuthError::StorageError(format!(
                    "Session storage quota of {quota} bytes exceeded"
                )));
            }
        }

        entries.insert(namespace.to_string(), raw);
        Ok(())
    }

    async fn remove(&self, namespace: &str) -> AuthResult<()> {
        self.entries.lock().remove(namespace);
        Ok(())
    }

    fn name(&self) -> &str {
        "session"
    }
}
