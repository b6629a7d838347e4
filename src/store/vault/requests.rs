//! Request bodies for the Vault HTTP API.

use serde::Serialize;

/// AppRole login body (`POST /v1/auth/approle/login`)
#[derive(Serialize)]
pub struct AppRoleLoginRequest<'a> {
    pub role_id: &'a str,
    pub secret_id: &'a str,
}

impl std::fmt::Debug for AppRoleLoginRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppRoleLoginRequest")
            .field("role_id", &self.role_id)
            .finish_non_exhaustive()
    }
}
