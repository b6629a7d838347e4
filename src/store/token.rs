//! # Token Provider
//!
//! Process-wide cache for the store credential.
//!
//! The first caller performs the AppRole login while holding the cache lock, so
//! concurrent runs wait for that login instead of starting their own: at most one
//! authentication is in flight at a time. The credential is reused until
//! [`TokenProvider::invalidate`] is called; there is no time-based expiry.

use crate::error::AuthenticationError;
use crate::observability::metrics;
use crate::store::{Credential, SecretStoreBackend};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use zeroize::Zeroizing;

pub struct TokenProvider {
    backend: Arc<dyn SecretStoreBackend>,
    role_id: String,
    role_secret: Zeroizing<String>,
    cached: Mutex<Option<Credential>>,
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("role_id", &self.role_id)
            .finish_non_exhaustive()
    }
}

impl TokenProvider {
    pub fn new(
        backend: Arc<dyn SecretStoreBackend>,
        role_id: impl Into<String>,
        role_secret: Zeroizing<String>,
    ) -> Self {
        Self {
            backend,
            role_id: role_id.into(),
            role_secret,
            cached: Mutex::new(None),
        }
    }

    /// Return the cached credential, logging in first if none is cached
    ///
    /// # Errors
    /// Returns [`AuthenticationError`] when the login handshake fails; nothing is cached then
    pub async fn credential(&self) -> Result<Credential, AuthenticationError> {
        let mut slot = self.cached.lock().await;

        if let Some(credential) = slot.as_ref() {
            debug!("Using cached Vault token");
            return Ok(credential.clone());
        }

        let credential = self
            .backend
            .authenticate(&self.role_id, &self.role_secret)
            .await
            .inspect_err(|e| error!("Failed to obtain Vault token: {}", e))?;

        metrics::increment_authentications();
        info!("Successfully obtained Vault token");
        *slot = Some(credential.clone());
        Ok(credential)
    }

    /// Drop the cached credential so the next call logs in again
    pub async fn invalidate(&self) {
        let mut slot = self.cached.lock().await;
        if slot.take().is_some() {
            info!("Cached Vault token invalidated");
        }
    }

    pub async fn is_cached(&self) -> bool {
        self.cached.lock().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::SecretValues;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Backend that counts logins and can be told to reject them
    struct CountingBackend {
        logins: AtomicUsize,
        reject: bool,
        delay: Duration,
    }

    impl CountingBackend {
        fn new(reject: bool, delay: Duration) -> Self {
            Self {
                logins: AtomicUsize::new(0),
                reject,
                delay,
            }
        }
    }

    #[async_trait]
    impl SecretStoreBackend for CountingBackend {
        async fn authenticate(
            &self,
            role_id: &str,
            role_secret: &str,
        ) -> Result<Credential, AuthenticationError> {
            let n = self.logins.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(self.delay).await;
            if self.reject {
                return Err(AuthenticationError::Rejected {
                    status: 400,
                    body: "invalid role or secret ID".to_string(),
                });
            }
            Ok(Credential::new(format!("{role_id}:{role_secret}:{n}")))
        }

        async fn read_secret(
            &self,
            _credential: &Credential,
            path: &str,
        ) -> Result<SecretValues, StoreError> {
            Err(StoreError::NotFound {
                path: path.to_string(),
            })
        }

        async fn probe(&self, _timeout: Duration) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn provider(backend: &Arc<CountingBackend>) -> TokenProvider {
        let backend: Arc<CountingBackend> = Arc::clone(backend);
        TokenProvider::new(backend, "role", Zeroizing::new("secret".to_string()))
    }

    #[tokio::test]
    async fn test_credential_cached_after_first_login() {
        let backend = Arc::new(CountingBackend::new(false, Duration::ZERO));
        let tokens = provider(&backend);

        assert!(!tokens.is_cached().await);
        let first = tokens.credential().await.unwrap();
        let second = tokens.credential().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.expose(), "role:secret:1");
        assert_eq!(backend.logins.load(Ordering::SeqCst), 1);
        assert!(tokens.is_cached().await);
    }

    #[tokio::test]
    async fn test_invalidate_forces_new_login() {
        let backend = Arc::new(CountingBackend::new(false, Duration::ZERO));
        let tokens = provider(&backend);

        let first = tokens.credential().await.unwrap();
        tokens.invalidate().await;
        assert!(!tokens.is_cached().await);
        let second = tokens.credential().await.unwrap();

        assert_ne!(first, second);
        assert_eq!(backend.logins.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_login_is_not_cached() {
        let backend = Arc::new(CountingBackend::new(true, Duration::ZERO));
        let tokens = provider(&backend);

        assert!(matches!(
            tokens.credential().await,
            Err(AuthenticationError::Rejected { status: 400, .. })
        ));
        assert!(!tokens.is_cached().await);
        assert!(tokens.credential().await.is_err());
        assert_eq!(backend.logins.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_login() {
        let backend = Arc::new(CountingBackend::new(false, Duration::from_millis(50)));
        let tokens = Arc::new(provider(&backend));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tokens = Arc::clone(&tokens);
                tokio::spawn(async move { tokens.credential().await })
            })
            .collect();

        for handle in handles {
            let credential = handle.await.unwrap().unwrap();
            assert_eq!(credential.expose(), "role:secret:1");
        }
        assert_eq!(backend.logins.load(Ordering::SeqCst), 1);
    }
}
