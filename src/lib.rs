//! # Vault Secret Sync
//!
//! Projects secrets from HashiCorp Vault (KV v2, AppRole auth) into
//! OpenShift/Kubernetes Secret objects.
//!
//! A run resolves a namespace and a mapping set, logs in once, then upserts each
//! mapped value into its target Secret. Per-mapping failures are isolated and
//! reported; only an authentication failure aborts a run.

pub mod build_info;
pub mod config;
pub mod constants;
pub mod error;
pub mod health;
pub mod mapping;
pub mod observability;
pub mod runtime;
pub mod server;
pub mod store;
pub mod sync;
pub mod target;
