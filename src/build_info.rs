//! Build metadata stamped by `build.rs`.

use serde::Serialize;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const BUILD_TIMESTAMP: &str = env!("BUILD_TIMESTAMP");
pub const BUILD_DATETIME: &str = env!("BUILD_DATETIME");
pub const BUILD_GIT_HASH: &str = env!("BUILD_GIT_HASH");

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub timestamp: &'static str,
    pub datetime: &'static str,
    pub git_hash: &'static str,
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: VERSION,
        timestamp: BUILD_TIMESTAMP,
        datetime: BUILD_DATETIME,
        git_hash: BUILD_GIT_HASH,
    }
}
