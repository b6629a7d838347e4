//! # Secret Store
//!
//! Abstract interface for the central secret store, plus the token cache and the
//! Vault REST implementation.
//!
//! The sync engine only sees [`SecretStoreBackend`]; tests substitute in-memory fakes.

pub mod token;
pub mod vault;

use crate::error::{AuthenticationError, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub use token::TokenProvider;
pub use vault::VaultClient;

/// Key/value pairs stored at one secret path
pub type SecretValues = HashMap<String, String>;

/// Bearer token issued by the store
///
/// Wiped from memory on drop and never printed.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Credential {
    token: String,
}

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Raw token for request headers
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Store backend capability
#[async_trait]
pub trait SecretStoreBackend: Send + Sync {
    /// Perform the role-based login handshake
    async fn authenticate(
        &self,
        role_id: &str,
        role_secret: &str,
    ) -> Result<Credential, AuthenticationError>;

    /// Read every key/value pair stored at `path` under the configured mount
    async fn read_secret(
        &self,
        credential: &Credential,
        path: &str,
    ) -> Result<SecretValues, StoreError>;

    /// Lightweight reachability check bounded by `timeout`
    async fn probe(&self, timeout: Duration) -> anyhow::Result<()>;
}
