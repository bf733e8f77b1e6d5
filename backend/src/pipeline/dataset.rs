//! Tabular data loading.
//!
//! Parses an uploaded spreadsheet (CSV or a calamine-supported workbook)
//! into an ordered sequence of flat records. The first row is the header;
//! every cell value is coerced to a string. Nothing is persisted.

use calamine::{open_workbook_auto, Data, Reader};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Parsed dataset. Header order is preserved so callers can fall back to
/// "the value of the first column" deterministically.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset file: {0}")]
    Unreadable(String),
    #[error("could not parse dataset: {0}")]
    Parse(String),
    #[error("unsupported dataset format '.{0}'")]
    UnsupportedFormat(String),
    #[error("dataset contains no data rows")]
    Empty,
}

/// Load a spreadsheet into memory.
///
/// A readable file with a header but zero data rows is an error: a batch
/// over an empty dataset must never be created.
pub fn load_dataset(path: &Path) -> Result<Dataset, DatasetError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match extension.as_str() {
        "csv" => load_csv(path)?,
        "xlsx" | "xlsm" | "xls" | "ods" => load_workbook(path)?,
        other => return Err(DatasetError::UnsupportedFormat(other.to_string())),
    };

    if dataset.rows.is_empty() {
        return Err(DatasetError::Empty);
    }
    Ok(dataset)
}

fn load_csv(path: &Path) -> Result<Dataset, DatasetError> {
    let mut reader =
        csv::Reader::from_path(path).map_err(|e| DatasetError::Unreadable(e.to_string()))?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| DatasetError::Parse(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DatasetError::Parse(e.to_string()))?;
        let mut row = HashMap::new();
        for (i, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            if let Some(value) = record.get(i) {
                row.insert(header.clone(), value.trim().to_string());
            }
        }
        rows.push(row);
    }

    Ok(Dataset { headers, rows })
}

fn load_workbook(path: &Path) -> Result<Dataset, DatasetError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| DatasetError::Unreadable(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DatasetError::Parse("workbook has no sheets".to_string()))?
        .map_err(|e| DatasetError::Parse(e.to_string()))?;

    let mut cell_rows = range.rows();
    let headers: Vec<String> = cell_rows
        .next()
        .map(|cells| cells.iter().map(|c| c.to_string().trim().to_string()).collect())
        .unwrap_or_default();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(DatasetError::Parse("missing header row".to_string()));
    }

    let mut rows = Vec::new();
    for cells in cell_rows {
        let mut row = HashMap::new();
        for (i, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            match cells.get(i) {
                None | Some(Data::Empty) => {}
                Some(cell) => {
                    row.insert(header.clone(), cell.to_string().trim().to_string());
                }
            }
        }
        // Workbook ranges can trail off into blank rows; skip them.
        if row.values().all(|v| v.is_empty()) {
            continue;
        }
        rows.push(row);
    }

    Ok(Dataset { headers, rows })
}
