//! Persistent storage, one JSON file per namespace

use super::{Namespace, StorageBackend};
use crate::auth::types::{AuthError, AuthResult};
use async_trait::async_trait;
use etcetera::{choose_base_strategy, BaseStrategy};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Files under a directory, named after their namespace
#[derive(Debug, Clone)]
pub struct LocalStorage {
    dir: PathBuf,
}

impl LocalStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<data dir>/cloudauth/storage` for the current user
    pub fn default_dir() -> AuthResult<PathBuf> {
        let strategy = choose_base_strategy().map_err(|e| {
            AuthError::StorageError(format!("Failed to determine data directory: {e}"))
        })?;
        Ok(strategy.data_dir().join("cloudauth").join("storage"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `namespace`, percent-encoded so distinct namespaces never share a file
    pub fn path_for(&self, namespace: &str) -> PathBuf {
        self.dir.join(format!("{}.json", urlencoding::encode(namespace)))
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    async fn read(&self, namespace: &str) -> AuthResult<Option<Namespace>> {
        let path = self.path_for(namespace);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let object = serde_json::from_str(&content).map_err(|e| {
            AuthError::StorageError(format!("Failed to parse {}: {e}", path.display()))
        })?;
        Ok(Some(object))
    }

    async fn write(&self, namespace: &str, object: &Namespace) -> AuthResult<()> {
        let mut dir_builder = tokio::fs::DirBuilder::new();
        dir_builder.recursive(true);
        #[cfg(unix)]
        dir_builder.mode(0o700);
        dir_builder.create(&self.dir).await?;

        let path = self.path_for(namespace);
        let content = serde_json::to_string_pretty(object)?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options.open(&path).await?;

        // Owner read/write only, including files created before this version
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600)).await?;
        }

        file.write_all(content.as_bytes()).await?;
        file.flush().await?;

        debug!("Saved {} keys to {}", object.len(), path.display());
        Ok(())
    }

    async fn remove(&self, namespace: &str) -> AuthResult<()> {
        match tokio::fs::remove_file(self.path_for(namespace)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageManager;
    use tempfile::TempDir;

    #[test]
    fn test_namespace_is_sanitised() {
        let storage = LocalStorage::new("/tmp/store");
        assert_eq!(
            storage.path_for("okta/../tokens"),
            PathBuf::from("/tmp/store/okta%2F..%2Ftokens.json")
        );
    }

    #[tokio::test]
    async fn test_similar_namespaces_use_separate_files() {
        let dir = TempDir::new().unwrap();
        let slashed = StorageManager::local("tenant/a", dir.path());
        let underscored = StorageManager::local("tenant_a", dir.path());

        slashed.add("token", "slashed").await.unwrap();
        underscored.add("token", "underscored").await.unwrap();

        assert_eq!(
            slashed.get::<String>("token").await.unwrap().as_deref(),
            Some("slashed")
        );
        assert_eq!(
            underscored.get::<String>("token").await.unwrap().as_deref(),
            Some("underscored")
        );
        assert_ne!(
            LocalStorage::new(dir.path()).path_for("tenant/a"),
            LocalStorage::new(dir.path()).path_for("tenant_a")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("store");
        let storage = LocalStorage::new(&nested);
        storage.write("tokens", &Namespace::new()).await.unwrap();

        let dir_mode = std::fs::metadata(&nested).unwrap().permissions().mode();
        let file_mode = std::fs::metadata(nested.join("tokens.json"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(dir_mode & 0o777, 0o700);
        assert_eq!(file_mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_rewrite_tightens_existing_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tokens.json");
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let storage = LocalStorage::new(dir.path());
        storage.write("tokens", &Namespace::new()).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_survives_new_instance() {
        let dir = TempDir::new().unwrap();

        let storage = StorageManager::local("tokens", dir.path());
        storage.add("refresh_token", "rt-1").await.unwrap();
        drop(storage);

        let reopened = StorageManager::local("tokens", dir.path());
        assert_eq!(reopened.backend_name(), "local");
        assert_eq!(
            reopened.get::<String>("refresh_token").await.unwrap().as_deref(),
            Some("rt-1")
        );
    }

    #[tokio::test]
    async fn test_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");

        let storage = LocalStorage::new(&nested);
        storage.write("ns", &Namespace::new()).await.unwrap();

        assert!(nested.join("ns.json").exists());
    }

    #[tokio::test]
    async fn test_delete_removes_file() {
        let dir = TempDir::new().unwrap();
        let storage = StorageManager::local("tokens", dir.path());

        storage.add("k", &1).await.unwrap();
        storage.delete().await.unwrap();
        storage.delete().await.unwrap();

        assert!(!dir.path().join("tokens.json").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_storage_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("tokens.json"), "not json").unwrap();

        let storage = LocalStorage::new(dir.path());
        assert!(matches!(
            storage.read("tokens").await,
            Err(AuthError::StorageError(_))
        ));
    }
}
