use crate::model::batch::BatchStatus;
use crate::model::certificate::CertificateStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot returned by the batch status polling endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchProgress {
    pub status: BatchStatus,
    /// Rows attempted so far, success or failure.
    pub processed: u32,
    /// Rows that produced a distribution file.
    pub generated: u32,
    pub total: u32,
}

/// One certificate as shown in the batch details view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateSummary {
    pub id: String,
    pub recipient_name: String,
    pub status: CertificateStatus,
    pub error: Option<String>,
}

/// Full view of a batch for the details endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchDetails {
    pub id: String,
    pub name: String,
    pub template_name: String,
    pub status: BatchStatus,
    pub processed: u32,
    pub generated: u32,
    pub total: u32,
    /// True once the batch completed and its archive exists on disk.
    pub archive_available: bool,
    pub error: Option<String>,
    pub certificates: Vec<CertificateSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
