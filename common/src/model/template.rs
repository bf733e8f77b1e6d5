use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user-supplied document containing `{{placeholder}}` tokens.
///
/// The file itself lives on disk under the storage root; this record only
/// carries the path. Placeholder names are declared by the user at upload
/// time; the server never tries to extract them from the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub template_type: TemplateType,
    pub file_path: String,
    /// Declared placeholder names. Uniqueness is not enforced.
    pub placeholders: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Native editable formats a template may be uploaded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateType {
    Docx,
    Pptx,
}

impl TemplateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateType::Docx => "docx",
            TemplateType::Pptx => "pptx",
        }
    }

    /// File extension used for template files and filled intermediates.
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "docx" => Some(TemplateType::Docx),
            "pptx" => Some(TemplateType::Pptx),
            _ => None,
        }
    }
}
