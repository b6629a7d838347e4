//! # Secret Mappings
//!
//! A mapping binds one Vault path + key to one target Secret + key.
//!
//! Field names on the wire match the mapping ConfigMap and the refresh API:
//!
//! ```yaml
//! mappings:
//!   - vault_path: db/creds
//!     vault_key: password
//!     openshift_secret: db-secret
//!     openshift_key: password
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

// RFC 1123 subdomain: [a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*
static SECRET_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("Failed to compile secret name regex - this should never happen")
});

// RFC 1123 label
static NAMESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$")
        .expect("Failed to compile namespace regex - this should never happen")
});

// Secret data keys: alphanumerics, '-', '_' and '.'
static SECRET_KEY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-._a-zA-Z0-9]+$")
        .expect("Failed to compile secret key regex - this should never happen")
});

/// One Vault → target Secret binding
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SecretMapping {
    /// Path of the secret under the KV mount
    #[serde(rename = "vault_path")]
    pub store_path: String,
    /// Key within the value set returned at `store_path`
    #[serde(rename = "vault_key")]
    pub store_key: String,
    /// Name of the target Secret object
    #[serde(rename = "openshift_secret")]
    pub target_secret: String,
    /// Key within the target Secret
    #[serde(rename = "openshift_key")]
    pub target_key: String,
}

impl SecretMapping {
    pub fn new(
        store_path: impl Into<String>,
        store_key: impl Into<String>,
        target_secret: impl Into<String>,
        target_key: impl Into<String>,
    ) -> Self {
        Self {
            store_path: store_path.into(),
            store_key: store_key.into(),
            target_secret: target_secret.into(),
            target_key: target_key.into(),
        }
    }

    /// Identifier reported for a successful sync: `{target_secret}/{target_key}`
    #[must_use]
    pub fn target_id(&self) -> String {
        format!("{}/{}", self.target_secret, self.target_key)
    }

    /// Check every field is present and the target side is a legal Secret name/key
    ///
    /// # Errors
    /// Returns a human-readable reason naming the offending field
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("vault_path", &self.store_path),
            ("vault_key", &self.store_key),
            ("openshift_secret", &self.target_secret),
            ("openshift_key", &self.target_key),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{field} cannot be empty"));
            }
        }

        validate_secret_name(&self.target_secret)?;

        if !SECRET_KEY_REGEX.is_match(&self.target_key) {
            return Err(format!(
                "openshift_key '{}' must consist of alphanumeric characters, '-', '_' or '.'",
                self.target_key
            ));
        }

        Ok(())
    }
}

impl fmt::Display for SecretMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}#{} -> {}/{}",
            self.store_path, self.store_key, self.target_secret, self.target_key
        )
    }
}

/// Validate a target Secret name (RFC 1123 subdomain, max 253 characters)
///
/// # Errors
/// Returns a human-readable reason when the name is not acceptable
pub fn validate_secret_name(name: &str) -> Result<(), String> {
    if name.len() > 253 {
        return Err(format!(
            "openshift_secret '{name}' exceeds maximum length of 253 characters (got {})",
            name.len()
        ));
    }
    if !SECRET_NAME_REGEX.is_match(name) {
        return Err(format!(
            "openshift_secret '{name}' must be a valid Kubernetes name (lowercase alphanumeric, hyphens, dots; cannot start/end with hyphen or dot)"
        ));
    }
    Ok(())
}

/// Validate a target namespace (RFC 1123 label, max 63 characters)
///
/// # Errors
/// Returns a human-readable reason when the namespace is not acceptable
pub fn validate_namespace(namespace: &str) -> Result<(), String> {
    if namespace.is_empty() {
        return Err("namespace cannot be empty".to_string());
    }
    if namespace.len() > 63 {
        return Err(format!(
            "namespace '{namespace}' exceeds maximum length of 63 characters (got {})",
            namespace.len()
        ));
    }
    if !NAMESPACE_REGEX.is_match(namespace) {
        return Err(format!(
            "namespace '{namespace}' must be a valid Kubernetes namespace (lowercase alphanumeric, hyphens; cannot start/end with hyphen)"
        ));
    }
    Ok(())
}

/// Validate a whole mapping set, reporting the first bad entry by index
///
/// # Errors
/// Returns `(index, reason)` for the first invalid mapping
pub fn validate_all(mappings: &[SecretMapping]) -> Result<(), (usize, String)> {
    mappings
        .iter()
        .enumerate()
        .try_for_each(|(index, mapping)| mapping.validate().map_err(|reason| (index, reason)))
}
