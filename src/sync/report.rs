//! Per-run result types.

use crate::mapping::SecretMapping;
use crate::target::UpsertOutcome;
use serde::Serialize;

/// Outcome of a single mapping within a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingOutcome {
    /// Value written to the target Secret
    Synced(UpsertOutcome),
    /// Store key absent from the fetched value set
    Skipped { reason: String },
    /// Fetch or write failed; `kind` is a short label such as `not_found` or `target`
    Failed { kind: &'static str, reason: String },
}

impl MappingOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            MappingOutcome::Synced(_) => "synced",
            MappingOutcome::Skipped { .. } => "skipped",
            MappingOutcome::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingResult {
    pub mapping: SecretMapping,
    pub outcome: MappingOutcome,
}

/// Serializable form of a [`MappingResult`]
#[derive(Debug, Clone, Serialize)]
pub struct ResultEntry {
    pub mapping: String,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<&MappingResult> for ResultEntry {
    fn from(result: &MappingResult) -> Self {
        let reason = match &result.outcome {
            MappingOutcome::Synced(UpsertOutcome::Created) => Some("created".to_string()),
            MappingOutcome::Synced(UpsertOutcome::Updated) => None,
            MappingOutcome::Skipped { reason } | MappingOutcome::Failed { reason, .. } => {
                Some(reason.clone())
            }
        };
        Self {
            mapping: result.mapping.to_string(),
            outcome: result.outcome.label(),
            reason,
        }
    }
}

/// Everything one run did, in mapping order
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub run_id: String,
    pub namespace: String,
    pub results: Vec<MappingResult>,
}

impl SyncReport {
    /// `{target_secret}/{target_key}` of every synced mapping, in run order
    pub fn updated(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, MappingOutcome::Synced(_)))
            .map(|r| r.mapping.target_id())
            .collect()
    }

    pub fn count(&self, label: &str) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome.label() == label)
            .count()
    }

    pub fn entries(&self) -> Vec<ResultEntry> {
        self.results.iter().map(ResultEntry::from).collect()
    }
}
