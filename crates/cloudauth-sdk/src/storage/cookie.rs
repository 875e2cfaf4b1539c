//! Cookie jar storage
//!
//! Each namespace becomes one cookie whose value is the url-encoded JSON
//! object. The jar lives in memory; [`CookieStorage::set_cookie_header`] and
//! [`CookieStorage::cookie_header`] render it for an HTTP layer to ship.

use super::{Namespace, StorageBackend};
use crate::auth::types::{AuthError, AuthResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Largest `name=value` pair a browser is guaranteed to keep
pub const MAX_COOKIE_BYTES: usize = 4096;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SameSite::Strict => write!(f, "Strict"),
            SameSite::Lax => write!(f, "Lax"),
            SameSite::None => write!(f, "None"),
        }
    }
}

/// Attributes rendered into `Set-Cookie`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieOptions {
    pub path: String,
    /// Lifetime in seconds; `None` makes a session cookie
    pub max_age: Option<u64>,
    pub secure: bool,
    pub same_site: SameSite,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            max_age: None,
            secure: true,
            same_site: SameSite::Lax,
        }
    }
}

/// In-memory cookie jar keyed by namespace
#[derive(Debug, Clone, Default)]
pub struct CookieStorage {
    jar: Arc<Mutex<BTreeMap<String, String>>>,
    options: CookieOptions,
}

impl CookieStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CookieOptions) -> Self {
        Self {
            jar: Arc::default(),
            options,
        }
    }

    pub fn options(&self) -> &CookieOptions {
        &self.options
    }

    /// `Set-Cookie` value for `namespace`, or `None` when it is not stored
    pub fn set_cookie_header(&self, namespace: &str) -> Option<String> {
        let jar = self.jar.lock();
        let value = jar.get(namespace)?;

        let mut header = format!("{namespace}={value}; Path={}", self.options.path);
        if let Some(max_age) = self.options.max_age {
            header.push_str(&format!("; Max-Age={max_age}"));
        }
        if self.options.secure {
            header.push_str("; Secure");
        }
        header.push_str(&format!("; SameSite={}", self.options.same_site));
        Some(header)
    }

    /// `Cookie` request header carrying every stored namespace
    pub fn cookie_header(&self) -> String {
        self.jar
            .lock()
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[async_trait]
impl StorageBackend for CookieStorage {
    async fn read(&self, namespace: &str) -> AuthResult<Option<Namespace>> {
        let encoded = self.jar.lock().get(namespace).cloned();
        let Some(encoded) = encoded else {
            return Ok(None);
        };

        let raw = urlencoding::decode(&encoded)
            .map_err(|e| AuthError::StorageError(format!("Malformed cookie '{namespace}': {e}")))?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    async fn write(&self, namespace: &str, object: &Namespace) -> AuthResult<()> {
        let raw = serde_json::to_string(object)?;
        let encoded = urlencoding::encode(&raw).into_owned();

        let size = namespace.len() + 1 + encoded.len();
        if size > MAX_COOKIE_BYTES {
            return Err(AuthError::StorageError(format!(
                "Cookie '{namespace}' is {size} bytes, limit is {MAX_COOKIE_BYTES}"
            )));
        }

        self.jar.lock().insert(namespace.to_string(), encoded);
        Ok(())
    }

    async fn remove(&self, namespace: &str) -> AuthResult<()> {
        self.jar.lock().remove(namespace);
        Ok(())
    }

    fn name(&self) -> &str {
        "cookie"
    }
}
