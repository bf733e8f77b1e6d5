use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle of a generation run.
///
/// A batch only ever moves forward: `Pending` → `Processing` →
/// `Completed` or `Failed`. Terminal states are never left again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Pending => "pending",
            BatchStatus::Processing => "processing",
            BatchStatus::Completed => "completed",
            BatchStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(BatchStatus::Pending),
            "processing" => Some(BatchStatus::Processing),
            "completed" => Some(BatchStatus::Completed),
            "failed" => Some(BatchStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchStatus::Completed | BatchStatus::Failed)
    }
}

/// One generation run over an entire dataset against one template.
///
/// `processed_certificates` counts every attempted row (it drives the
/// progress bar); `generated_certificates` counts successes only. Both
/// are monotonic and never exceed `total_certificates`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: String,
    pub owner_id: String,
    pub template_id: String,
    pub name: String,
    pub status: BatchStatus,
    pub total_certificates: u32,
    pub processed_certificates: u32,
    pub generated_certificates: u32,
    /// Dataset-column → placeholder mapping the run was started with,
    /// kept on the record for traceability.
    pub mappings: HashMap<String, String>,
    /// Set once the batch completes.
    pub zip_path: Option<String>,
    /// Set only when the batch fails.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
