//! Field mapping.
//!
//! Projects one dataset row onto template placeholders using the
//! column → placeholder mapping supplied with the generation request, and
//! derives the recipient display name for the row.

use std::collections::HashMap;

/// Placeholder a mapping entry must target for its column to drive the
/// recipient display name.
pub const RECIPIENT_NAME_PLACEHOLDER: &str = "recipient_name";

/// Build the placeholder → value record for one row.
///
/// Columns absent from the row are skipped without error; the matching
/// placeholder is simply left unfilled and the filler keeps its token as
/// literal text. No check is made that every declared placeholder is
/// covered — the mapping need not be a bijection.
pub fn resolve_fields(
    row: &HashMap<String, String>,
    mappings: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    for (column, placeholder) in mappings {
        if let Some(value) = row.get(column) {
            fields.insert(placeholder.clone(), value.clone());
        }
    }
    fields
}

/// Derive the recipient display name for a row.
///
/// The column mapped to [`RECIPIENT_NAME_PLACEHOLDER`] wins; otherwise
/// the row's first column; otherwise a synthesized `Recipient {n}`.
pub fn recipient_name(
    row: &HashMap<String, String>,
    mappings: &HashMap<String, String>,
    headers: &[String],
    index: usize,
) -> String {
    for (column, placeholder) in mappings {
        if placeholder == RECIPIENT_NAME_PLACEHOLDER {
            if let Some(value) = row.get(column) {
                if !value.trim().is_empty() {
                    return value.trim().to_string();
                }
            }
        }
    }

    if let Some(first_column) = headers.first() {
        if let Some(value) = row.get(first_column) {
            if !value.trim().is_empty() {
                return value.trim().to_string();
            }
        }
    }

    format!("Recipient {}", index + 1)
}
