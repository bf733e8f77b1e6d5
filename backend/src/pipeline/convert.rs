//! Native-to-PDF conversion via an external rendering engine.
//!
//! The engine (headless LibreOffice by default) is an out-of-process
//! collaborator: it is handed the filled native document and an output
//! directory, and by convention writes `<input stem>.pdf` there. That
//! conventionally-named file is then moved onto the path the caller asked
//! for; if it is missing the conversion failed no matter what the engine's
//! exit status claims.

use log::debug;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    /// The engine process could not be started at all.
    #[error("conversion engine could not be started: {0}")]
    Spawn(#[source] std::io::Error),
    /// The engine ran but reported failure.
    #[error("conversion engine exited with status {status}: {stderr}")]
    Engine { status: i32, stderr: String },
    /// The engine exited cleanly but the expected output never appeared.
    #[error("conversion engine produced no file at {0}")]
    MissingOutput(PathBuf),
    #[error("failed to place converted file: {0}")]
    Io(#[from] std::io::Error),
}

/// Out-of-process document-to-PDF conversion, narrow enough to swap the
/// engine or mock it in tests. Implementations are called from blocking
/// worker threads.
pub trait DocumentConverter: Send + Sync {
    fn convert(&self, input: &Path, output: &Path) -> Result<(), ConvertError>;
}

/// Converts documents by driving a headless LibreOffice install.
///
/// No timeout is applied; a hung engine stalls the calling row. Failures
/// are not retried here — the row-processing caller decides what a
/// failure means.
pub struct LibreOfficeConverter {
    bin: String,
}

impl LibreOfficeConverter {
    pub fn new(bin: impl Into<String>) -> Self {
        LibreOfficeConverter { bin: bin.into() }
    }
}

impl DocumentConverter for LibreOfficeConverter {
    fn convert(&self, input: &Path, output: &Path) -> Result<(), ConvertError> {
        let out_dir = output.parent().unwrap_or_else(|| Path::new("."));

        let result = Command::new(&self.bin)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg(input)
            .arg("--outdir")
            .arg(out_dir)
            .output()
            .map_err(ConvertError::Spawn)?;

        debug!(
            "{} stdout: {}",
            self.bin,
            String::from_utf8_lossy(&result.stdout).trim()
        );
        if !result.stderr.is_empty() {
            debug!(
                "{} stderr: {}",
                self.bin,
                String::from_utf8_lossy(&result.stderr).trim()
            );
        }

        if !result.status.success() {
            return Err(ConvertError::Engine {
                status: result.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        let produced = out_dir.join(format!("{}.pdf", stem));
        if !produced.exists() {
            return Err(ConvertError::MissingOutput(produced));
        }
        if produced != output {
            std::fs::rename(&produced, output)?;
        }
        Ok(())
    }
}
