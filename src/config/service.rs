//! # Service Configuration
//!
//! Service-level settings loaded from environment variables.

use crate::config::mappings::load_mappings_file;
use crate::constants::{
    DEFAULT_HEALTH_TIMEOUT_SECS, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_MAPPINGS_FILE,
    DEFAULT_NAMESPACE, DEFAULT_PORT, DEFAULT_VAULT_MOUNT_PATH,
};
use crate::error::ConfigurationError;
use crate::mapping::{validate_namespace, SecretMapping};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use zeroize::Zeroizing;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Service configuration
///
/// Vault address and AppRole credentials are required; everything else has a default.
/// Environment variables are populated from a ConfigMap/Secret using `envFrom` in the deployment.
#[derive(Clone)]
pub struct ServiceConfig {
    /// Vault base address (e.g. `https://vault.example.com:8200`)
    pub vault_address: String,
    /// AppRole role id
    pub vault_role_id: String,
    /// AppRole secret id, wiped from memory on drop
    pub vault_secret_id: Zeroizing<String>,
    /// KV v2 mount path
    pub vault_mount_path: String,
    /// Namespace used when a refresh does not override it
    pub default_namespace: String,
    /// Location of the mapping file
    pub mappings_file: PathBuf,
    /// Mapping set used when a refresh does not override it
    pub secret_mappings: Vec<SecretMapping>,
    /// Timeout for every outbound Vault/cluster call (seconds)
    pub http_timeout_secs: u64,
    /// Timeout for health reachability probes (seconds)
    pub health_timeout_secs: u64,
    /// HTTP listen port
    pub port: u16,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: LogFormat,
    /// Drop the cached Vault token when a read is denied so the next run re-authenticates
    pub invalidate_token_on_forbidden: bool,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("vault_address", &self.vault_address)
            .field("vault_mount_path", &self.vault_mount_path)
            .field("default_namespace", &self.default_namespace)
            .field("mappings_file", &self.mappings_file)
            .field("secret_mappings", &self.secret_mappings.len())
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("health_timeout_secs", &self.health_timeout_secs)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

/// Configuration view safe to return over the API (credentials excluded)
#[derive(Debug, Clone, Serialize)]
pub struct PublicConfig {
    pub vault_address: String,
    pub vault_mount_path: String,
    pub openshift_namespace: String,
    pub secret_mappings_count: usize,
    pub http_timeout: u64,
    pub health_timeout: u64,
}

impl ServiceConfig {
    /// Load configuration from the process environment and read the mapping file
    ///
    /// # Errors
    /// Returns [`ConfigurationError`] when required variables are missing or the mapping
    /// file cannot be loaded
    pub fn load() -> Result<Self, ConfigurationError> {
        let mut config = Self::from_env()?;
        config.secret_mappings = load_mappings_file(&config.mappings_file)?;
        Ok(config)
    }

    /// Load settings from environment variables (mapping file not read)
    ///
    /// # Errors
    /// Returns [`ConfigurationError::MissingVariables`] listing every missing required variable
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source
    ///
    /// # Errors
    /// Returns [`ConfigurationError::MissingVariables`] listing every missing required variable
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let vault_address = required("VAULT_ADDRESS");
        let vault_role_id = required("VAULT_ROLE_ID");
        let vault_secret_id = required("VAULT_SECRET_ID");

        let missing: Vec<String> = [
            ("VAULT_ADDRESS", vault_address.is_none()),
            ("VAULT_ROLE_ID", vault_role_id.is_none()),
            ("VAULT_SECRET_ID", vault_secret_id.is_none()),
        ]
        .into_iter()
        .filter(|(_, is_missing)| *is_missing)
        .map(|(key, _)| key.to_string())
        .collect();

        let (Some(vault_address), Some(vault_role_id), Some(vault_secret_id)) =
            (vault_address, vault_role_id, vault_secret_id)
        else {
            return Err(ConfigurationError::MissingVariables(missing));
        };

        let default_namespace = or_default_str(&lookup, "OPENSHIFT_NAMESPACE", DEFAULT_NAMESPACE);
        validate_namespace(&default_namespace).map_err(|reason| {
            ConfigurationError::InvalidSetting {
                name: "OPENSHIFT_NAMESPACE".to_string(),
                reason,
            }
        })?;

        Ok(Self {
            vault_address: vault_address.trim_end_matches('/').to_string(),
            vault_role_id,
            vault_secret_id: Zeroizing::new(vault_secret_id),
            vault_mount_path: or_default_str(&lookup, "VAULT_MOUNT_PATH", DEFAULT_VAULT_MOUNT_PATH)
                .trim_matches('/')
                .to_string(),
            default_namespace,
            mappings_file: PathBuf::from(or_default_str(
                &lookup,
                "SECRET_MAPPINGS_FILE",
                DEFAULT_MAPPINGS_FILE,
            )),
            secret_mappings: Vec::new(),
            http_timeout_secs: or_default_nonzero(
                &lookup,
                "HTTP_TIMEOUT",
                DEFAULT_HTTP_TIMEOUT_SECS,
            ),
            health_timeout_secs: or_default_nonzero(
                &lookup,
                "HEALTH_TIMEOUT",
                DEFAULT_HEALTH_TIMEOUT_SECS,
            ),
            port: or_default(&lookup, "PORT", DEFAULT_PORT),
            log_level: or_default_str(&lookup, "LOG_LEVEL", "INFO"),
            log_format: LogFormat::parse(&or_default_str(&lookup, "LOG_FORMAT", "text")),
            invalidate_token_on_forbidden: or_default_bool(
                &lookup,
                "INVALIDATE_TOKEN_ON_FORBIDDEN",
                true,
            ),
        })
    }

    /// Get the outbound call timeout
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Get the health probe timeout
    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }

    /// Configuration view with credentials excluded
    pub fn public_view(&self) -> PublicConfig {
        PublicConfig {
            vault_address: self.vault_address.clone(),
            vault_mount_path: self.vault_mount_path.clone(),
            openshift_namespace: self.default_namespace.clone(),
            secret_mappings_count: self.secret_mappings.len(),
            http_timeout: self.http_timeout_secs,
            health_timeout: self.health_timeout_secs,
        }
    }
}

/// Read variable or return default value
fn or_default<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Read a positive number of seconds; zero or unparseable values use the default
fn or_default_nonzero<F>(lookup: &F, key: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    match or_default(lookup, key, default) {
        0 => default,
        value => value,
    }
}

/// Read variable as boolean or return default
fn or_default_bool<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| {
            let v_lower = v.to_lowercase();
            v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
        })
        .unwrap_or(default)
}

/// Read variable as string or return default
fn or_default_str<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
