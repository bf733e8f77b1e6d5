//! Shared reader for the upload forms.
//!
//! Every upload endpoint in this service uses the same wire shape: a
//! `json` metadata field followed by a `file` field. The metadata must
//! arrive first so it can be validated before any file byte is accepted.

use actix_multipart::Multipart;
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// An upload form parsed off the wire: metadata plus the stored file.
pub struct UploadForm<M> {
    pub meta: M,
    pub file_path: PathBuf,
    pub original_filename: String,
}

/// Read a `json` + `file` multipart form, streaming the file into
/// `dest_dir` as `{stored_name}.{extension}`. The upload's extension is
/// checked against `allowed_extensions` before anything is written. A
/// partially-written file is removed again on any failure.
pub async fn read_upload_form<M: DeserializeOwned>(
    payload: Multipart,
    dest_dir: &Path,
    stored_name: &str,
    allowed_extensions: &[&str],
) -> Result<UploadForm<M>, String> {
    let mut written: Option<PathBuf> = None;
    let result = read_fields(payload, dest_dir, stored_name, allowed_extensions, &mut written).await;
    if result.is_err() {
        if let Some(path) = written {
            let _ = std::fs::remove_file(path);
        }
    }
    result
}

async fn read_fields<M: DeserializeOwned>(
    mut payload: Multipart,
    dest_dir: &Path,
    stored_name: &str,
    allowed_extensions: &[&str],
    written: &mut Option<PathBuf>,
) -> Result<UploadForm<M>, String> {
    let mut meta: Option<M> = None;
    let mut original_filename = String::new();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| e.to_string())?;
        let field_name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        match field_name.as_deref() {
            Some("json") => {
                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    bytes.extend_from_slice(&chunk.map_err(|e| e.to_string())?);
                }
                meta = Some(
                    serde_json::from_slice(&bytes).map_err(|e| format!("Invalid metadata: {}", e))?,
                );
            }

            Some("file") => {
                if meta.is_none() {
                    return Err("Metadata must be sent before the file".to_string());
                }

                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
                    .unwrap_or_default();
                let extension = Path::new(&filename)
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("")
                    .to_ascii_lowercase();
                if !allowed_extensions.contains(&extension.as_str()) {
                    return Err(format!(
                        "Unsupported file type '.{}'; expected one of: {}",
                        extension,
                        allowed_extensions.join(", ")
                    ));
                }

                std::fs::create_dir_all(dest_dir).map_err(|e| e.to_string())?;
                let path = dest_dir.join(format!("{}.{}", stored_name, extension));
                let file = File::create(&path).map_err(|e| e.to_string())?;
                *written = Some(path.clone());

                let mut file_writer = BufWriter::new(file);
                while let Some(chunk) = field.next().await {
                    let chunk = chunk.map_err(|e| e.to_string())?;
                    file_writer.write_all(&chunk).map_err(|e| e.to_string())?;
                }
                file_writer.flush().map_err(|e| e.to_string())?;
                original_filename = filename;
            }

            _ => {}
        }
    }

    let meta = meta.ok_or("Missing metadata field")?;
    let file_path = written.clone().ok_or("Missing file field")?;
    Ok(UploadForm {
        meta,
        file_path,
        original_filename,
    })
}
