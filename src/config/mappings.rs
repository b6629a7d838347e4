//! # Mapping File
//!
//! Loads the default mapping set from the YAML file mounted from a ConfigMap.

use crate::error::ConfigurationError;
use crate::mapping::{validate_all, SecretMapping};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Default, Deserialize)]
struct MappingsDocument {
    #[serde(default)]
    mappings: Vec<SecretMapping>,
}

/// Load and validate the mapping file at `path`
///
/// A missing file yields an empty set (the service can still be driven entirely by
/// per-request mappings). An unreadable file, invalid YAML or an incomplete mapping
/// is a startup-time [`ConfigurationError`].
pub fn load_mappings_file(path: &Path) -> Result<Vec<SecretMapping>, ConfigurationError> {
    if !path.exists() {
        warn!("Secret mappings file not found: {}", path.display());
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigurationError::MappingsFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mappings = parse_mappings(&content).map_err(|e| match e {
        ParseFailure::Yaml(reason) => ConfigurationError::MappingsFile {
            path: path.display().to_string(),
            reason,
        },
        ParseFailure::Invalid { index, reason } => {
            ConfigurationError::InvalidMapping { index, reason }
        }
    })?;

    info!(
        "Loaded {} secret mappings from {}",
        mappings.len(),
        path.display()
    );
    Ok(mappings)
}

enum ParseFailure {
    Yaml(String),
    Invalid { index: usize, reason: String },
}

fn parse_mappings(content: &str) -> Result<Vec<SecretMapping>, ParseFailure> {
    // An empty document (e.g. a ConfigMap key with no content) is an empty set
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let document: Option<MappingsDocument> =
        serde_yaml::from_str(content).map_err(|e| ParseFailure::Yaml(e.to_string()))?;
    let mappings = document.unwrap_or_default().mappings;

    validate_all(&mappings).map_err(|(index, reason)| ParseFailure::Invalid { index, reason })?;
    Ok(mappings)
}
