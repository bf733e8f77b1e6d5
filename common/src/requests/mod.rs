use crate::model::template::TemplateType;
use serde::Deserialize;
use std::collections::HashMap;

/// Metadata part (field name `json`) of the template upload form.
#[derive(Debug, Deserialize)]
pub struct TemplateUpload {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub template_type: TemplateType,
    /// Placeholder names the user declares for this template.
    #[serde(default)]
    pub placeholders: Vec<String>,
}

/// Metadata part (field name `json`) of the batch generation form.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub template_id: String,
    /// Optional human-readable batch name; defaults to the template name.
    #[serde(default)]
    pub name: Option<String>,
    /// Dataset-column → placeholder mapping.
    pub mappings: HashMap<String, String>,
}
