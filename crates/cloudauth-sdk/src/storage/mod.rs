//! Namespaced key/value storage for tokens and redirect state
//!
//! A [`StorageManager`] keeps all of its keys in one JSON object stored under
//! its namespace. Every mutation reads the whole object, changes it in memory
//! and writes it back, so two managers writing the same namespace
//! concurrently resolve to whichever write lands last.

mod cookie;
mod local;
mod session;

pub use cookie::{CookieOptions, CookieStorage, SameSite, MAX_COOKIE_BYTES};
pub use local::LocalStorage;
pub use session::SessionStorage;

use crate::auth::types::{AuthError, AuthResult};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Object stored under one namespace
pub type Namespace = Map<String, Value>;

/// Namespace written and removed by the default availability check
pub const AVAILABILITY_NAMESPACE: &str = "__cloudauth_availability__";

/// Whole-object storage keyed by namespace
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Stored object, or `None` when the namespace was never written
    async fn read(&self, namespace: &str) -> AuthResult<Option<Namespace>>;

    /// Replace the object stored under `namespace`
    async fn write(&self, namespace: &str, object: &Namespace) -> AuthResult<()>;

    /// Drop `namespace` entirely; missing namespaces are not an error
    async fn remove(&self, namespace: &str) -> AuthResult<()>;

    /// Whether the backend accepts writes right now
    async fn is_available(&self) -> bool {
        let empty = Namespace::new();
        if let Err(e) = self.write(AVAILABILITY_NAMESPACE, &empty).await {
            debug!("{} storage unavailable: {}", self.name(), e);
            return false;
        }
        self.remove(AVAILABILITY_NAMESPACE).await.is_ok()
    }

    /// Name for logging
    fn name(&self) -> &str;
}

/// Key/value view over one namespace of a [`StorageBackend`]
pub struct StorageManager {
    namespace: String,
    backend: Box<dyn StorageBackend>,
}

impl StorageManager {
    /// Session storage, falling back to cookies when session storage is unusable
    pub async fn new(namespace: impl Into<String>) -> AuthResult<Self> {
        Self::with_backends(
            namespace,
            vec![
                Box::new(SessionStorage::new()),
                Box::new(CookieStorage::new()),
            ],
        )
        .await
    }

    /// First available backend from `candidates`, in order
    pub async fn with_backends(
        namespace: impl Into<String>,
        candidates: Vec<Box<dyn StorageBackend>>,
    ) -> AuthResult<Self> {
        let namespace = namespace.into();
        for backend in candidates {
            if backend.is_available().await {
                debug!("Using {} storage for '{}'", backend.name(), namespace);
                return Ok(Self { namespace, backend });
            }
            warn!("{} storage unavailable, trying next backend", backend.name());
        }

        Err(AuthError::StorageError(format!(
            "No storage backend available for '{namespace}'"
        )))
    }

    /// Use `backend` without probing it
    pub fn with_backend(namespace: impl Into<String>, backend: Box<dyn StorageBackend>) -> Self {
        Self {
            namespace: namespace.into(),
            backend,
        }
    }

    /// Persistent file storage under `dir`
    pub fn local(namespace: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self::with_backend(namespace, Box::new(LocalStorage::new(dir)))
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Name of the backend in use
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Store `value` under `key`, replacing any previous value
    pub async fn add<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> AuthResult<()> {
        let value = serde_json::to_value(value)?;
        let mut object = self.load().await?;
        object.insert(key.to_string(), value);
        self.backend.write(&self.namespace, &object).await
    }

    /// Value stored under `key`, if any
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> AuthResult<Option<T>> {
        let mut object = self.load().await?;
        match object.remove(key) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Remove `key`; the rest of the namespace is kept
    pub async fn remove(&self, key: &str) -> AuthResult<()> {
        let mut object = self.load().await?;
        if object.remove(key).is_some() {
            self.backend.write(&self.namespace, &object).await?;
        }
        Ok(())
    }

    /// Reset the namespace to an empty object
    pub async fn clear(&self) -> AuthResult<()> {
        self.backend.write(&self.namespace, &Namespace::new()).await
    }

    /// Remove the namespace from the backend
    pub async fn delete(&self) -> AuthResult<()> {
        self.backend.remove(&self.namespace).await
    }

    async fn load(&self) -> AuthResult<Namespace> {
        Ok(self.backend.read(&self.namespace).await?.unwrap_or_default())
    }
}

impl std::fmt::Debug for StorageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageManager")
            .field("namespace", &self.namespace)
            .field("backend", &self.backend.name())
            .finish()
    }
}
