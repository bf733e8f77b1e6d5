use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateStatus {
    Pending,
    Generated,
    Failed,
}

impl CertificateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateStatus::Pending => "pending",
            CertificateStatus::Generated => "generated",
            CertificateStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(CertificateStatus::Pending),
            "generated" => Some(CertificateStatus::Generated),
            "failed" => Some(CertificateStatus::Failed),
            _ => None,
        }
    }
}

/// Per-row result of a batch run, written exactly once.
///
/// Every input row produces a certificate record, whether the row
/// succeeded or failed — failures are recorded, not dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certificate {
    pub id: String,
    pub owner_id: String,
    pub batch_id: String,
    pub recipient_name: String,
    /// The source row exactly as parsed, kept for traceability.
    pub row_data: HashMap<String, String>,
    pub status: CertificateStatus,
    /// Set only when `status` is `Generated`.
    pub pdf_path: Option<String>,
    /// Set only when `status` is `Failed`.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}
