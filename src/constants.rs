//! # Constants
//!
//! Shared constants used throughout the service.
//!
//! These values represent reasonable defaults and can be overridden via
//! environment variables where applicable.

/// Default HTTP server port for the refresh/health API, metrics and probes
pub const DEFAULT_PORT: u16 = 8000;

/// Default timeout applied to every outbound Vault and cluster API call (seconds)
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Default timeout for health reachability probes (seconds)
/// Kept short so `/health` answers quickly even when a backend hangs
pub const DEFAULT_HEALTH_TIMEOUT_SECS: u64 = 5;

/// Default Vault KV v2 mount path
pub const DEFAULT_VAULT_MOUNT_PATH: &str = "secret";

/// Default target namespace when neither config nor request supplies one
pub const DEFAULT_NAMESPACE: &str = "default";

/// Default location of the mounted mapping ConfigMap
pub const DEFAULT_MAPPINGS_FILE: &str = "/app/config/secret-mappings.yaml";

/// Vault `sys/health` status codes that mean "reachable"
/// 200 active, 429 standby, 472 DR secondary, 473 performance standby
pub const VAULT_REACHABLE_STATUS_CODES: [u16; 4] = [200, 429, 472, 473];

/// Header carrying the Vault client token
pub const VAULT_TOKEN_HEADER: &str = "X-Vault-Token";

/// Service name reported by the root endpoint and metrics
pub const SERVICE_NAME: &str = "Vault-OpenShift Secret Sync";
