//! Response bodies for the Vault HTTP API.

use serde::Deserialize;
use std::collections::HashMap;

/// AppRole login response; only the `auth` block is used
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub auth: Option<AuthInfo>,
}

#[derive(Deserialize)]
pub struct AuthInfo {
    pub client_token: String,
    #[serde(default)]
    pub lease_duration: u64,
    #[serde(default)]
    pub renewable: bool,
}

impl std::fmt::Debug for AuthInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthInfo")
            .field("lease_duration", &self.lease_duration)
            .field("renewable", &self.renewable)
            .finish_non_exhaustive()
    }
}

/// KV v2 read response: values live at `data.data`
#[derive(Debug, Deserialize)]
pub struct KvReadResponse {
    pub data: KvReadData,
}

#[derive(Debug, Deserialize)]
pub struct KvReadData {
    /// `null` when the latest version was deleted or destroyed
    pub data: Option<HashMap<String, serde_json::Value>>,
}

/// Vault error body: `{"errors": ["..."]}`
#[derive(Debug, Default, Deserialize)]
pub struct VaultErrorResponse {
    #[serde(default)]
    pub errors: Vec<String>,
}
