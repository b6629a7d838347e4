//! # Configuration
//!
//! Service settings loaded from environment variables and the mapping file
//! mounted from a ConfigMap.

pub mod mappings;
pub mod service;

pub use mappings::load_mappings_file;
pub use service::{LogFormat, PublicConfig, ServiceConfig};
