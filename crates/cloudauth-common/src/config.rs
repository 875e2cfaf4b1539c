//! Layered configuration loading
//!
//! Every configuration type is resolved in the same order:
//! 1. Built-in defaults (`Default` impl)
//! 2. TOML file
//! 3. Environment variables with a crate-specific prefix, `__` separating nested keys

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// The merged configuration could not be extracted into the target type
    #[error("Failed to parse configuration: {details}")]
    ParseError { details: String },

    /// A value was present but unusable
    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    /// An explicitly requested file does not exist
    #[error("Configuration file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },
}

/// Loader implemented by every configuration root type
pub trait ConfigLoader<T> {
    /// Load from an optional path, falling back to the type's default file name
    fn load(path: Option<PathBuf>) -> Result<T, ConfigurationError>;

    /// Load from a file that must exist
    fn load_from_file(path: &Path) -> Result<T, ConfigurationError>;

    /// Re-apply environment overrides with the given prefix on top of `config`
    fn apply_env_overrides(config: &mut T, prefix: &str) -> Result<(), ConfigurationError>;
}

/// Build the standard defaults -> file -> environment figment
pub fn layered<T: Serialize>(defaults: &T, file: &Path, env_prefix: &str) -> Figment {
    tracing::debug!(
        "Loading configuration from {} with {}* overrides",
        file.display(),
        env_prefix
    );
    Figment::from(Serialized::defaults(defaults))
        .merge(Toml::file(file))
        .merge(Env::prefixed(env_prefix).split("__"))
}

/// Extract a typed configuration, mapping figment errors
pub fn extract<T: DeserializeOwned>(figment: Figment) -> Result<T, ConfigurationError> {
    figment.extract().map_err(|e| ConfigurationError::ParseError {
        details: e.to_string(),
    })
}

/// Merge environment overrides into an existing value
pub fn with_env_overrides<T>(config: &T, prefix: &str) -> Result<T, ConfigurationError>
where
    T: Serialize + DeserializeOwned,
{
    extract(Figment::from(Serialized::defaults(config)).merge(Env::prefixed(prefix).split("__")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    #[serde(default)]
    struct Sample {
        name: String,
        retries: u32,
        nested: Nested,
    }

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
    #[serde(default)]
    struct Nested {
        enabled: bool,
    }

    impl Default for Sample {
        fn default() -> Self {
            Self {
                name: "default".to_string(),
                retries: 3,
                nested: Nested::default(),
            }
        }
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let figment = layered(
            &Sample::default(),
            Path::new("/nonexistent/cloudauth-test.toml"),
            "CLOUDAUTH_COMMON_TEST_MISSING_",
        );
        let sample: Sample = extract(figment).unwrap();
        assert_eq!(sample, Sample::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name = \"from-file\"\n[nested]\nenabled = true").unwrap();

        let figment = layered(
            &Sample::default(),
            file.path(),
            "CLOUDAUTH_COMMON_TEST_FILE_",
        );
        let sample: Sample = extract(figment).unwrap();

        assert_eq!(sample.name, "from-file");
        assert_eq!(sample.retries, 3);
        assert!(sample.nested.enabled);
    }

    #[test]
    fn test_type_mismatch_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "retries = \"many\"").unwrap();

        let figment = layered(
            &Sample::default(),
            file.path(),
            "CLOUDAUTH_COMMON_TEST_BAD_",
        );
        let result: Result<Sample, _> = extract(figment);
        assert!(matches!(result, Err(ConfigurationError::ParseError { .. })));
    }
}
