//! Override resolution for a single run.

use crate::error::SyncError;
use crate::mapping::{validate_all, validate_namespace, SecretMapping};

/// Effective inputs of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub namespace: String,
    pub mappings: Vec<SecretMapping>,
}

/// Resolve request overrides against configured defaults
///
/// Each field resolves independently as `request ?? configured`. A supplied mapping
/// list replaces the configured set entirely, even when it is empty.
///
/// # Errors
/// - [`SyncError::InvalidRequest`] for an invalid namespace or an invalid override mapping
/// - [`SyncError::NoMappings`] when the effective mapping set is empty
pub fn resolve_run(
    configured_namespace: &str,
    configured_mappings: &[SecretMapping],
    namespace: Option<String>,
    mappings: Option<Vec<SecretMapping>>,
) -> Result<RunPlan, SyncError> {
    let namespace = namespace.unwrap_or_else(|| configured_namespace.to_string());
    validate_namespace(&namespace).map_err(SyncError::InvalidRequest)?;

    let mappings = match mappings {
        Some(requested) => {
            validate_all(&requested).map_err(|(index, reason)| {
                SyncError::InvalidRequest(format!("mapping {index}: {reason}"))
            })?;
            requested
        }
        None => configured_mappings.to_vec(),
    };

    if mappings.is_empty() {
        return Err(SyncError::NoMappings);
    }

    Ok(RunPlan {
        namespace,
        mappings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> Vec<SecretMapping> {
        vec![SecretMapping::new(
            "db/creds",
            "password",
            "db-secret",
            "password",
        )]
    }

    #[test]
    fn test_defaults_used_without_overrides() {
        let plan = resolve_run("default", &configured(), None, None).unwrap();
        assert_eq!(plan.namespace, "default");
        assert_eq!(plan.mappings, configured());
    }

    #[test]
    fn test_overrides_replace_independently() {
        let requested = vec![SecretMapping::new("api/keys", "token", "api-secret", "token")];
        let plan =
            resolve_run("default", &configured(), None, Some(requested.clone())).unwrap();
        assert_eq!(plan.namespace, "default");
        assert_eq!(plan.mappings, requested);

        let plan = resolve_run("default", &configured(), Some("payments".to_string()), None)
            .unwrap();
        assert_eq!(plan.namespace, "payments");
        assert_eq!(plan.mappings, configured());
    }

    #[test]
    fn test_empty_override_is_respected() {
        assert!(matches!(
            resolve_run("default", &configured(), None, Some(Vec::new())),
            Err(SyncError::NoMappings)
        ));
    }

    #[test]
    fn test_no_configured_mappings() {
        assert!(matches!(
            resolve_run("default", &[], None, None),
            Err(SyncError::NoMappings)
        ));
    }

    #[test]
    fn test_invalid_namespace_and_mapping_rejected() {
        assert!(matches!(
            resolve_run("default", &configured(), Some(String::new()), None),
            Err(SyncError::InvalidRequest(_))
        ));
        assert!(matches!(
            resolve_run("default", &configured(), Some("Bad_NS".to_string()), None),
            Err(SyncError::InvalidRequest(_))
        ));

        let bad = vec![SecretMapping::new("db/creds", "password", "Db_Secret", "password")];
        let Err(SyncError::InvalidRequest(reason)) =
            resolve_run("default", &configured(), None, Some(bad))
        else {
            panic!("expected invalid request");
        };
        assert!(reason.starts_with("mapping 0:"));
    }
}
