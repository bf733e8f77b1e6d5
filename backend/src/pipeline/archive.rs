//! Archive packaging.

use log::warn;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to write archive: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to build archive: {0}")]
    Zip(String),
}

/// Pack the given files into a single zip at `dest`, each entry under its
/// base filename, in the order given, at maximum compression.
///
/// Inputs missing on disk are logged and skipped; an archive is produced
/// even when every input is missing. Returns the number of entries
/// written.
pub fn build_archive(files: &[PathBuf], dest: &Path) -> Result<usize, ArchiveError> {
    let out = File::create(dest)?;
    let mut writer = ZipWriter::new(out);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9));

    let mut added = 0;
    for path in files {
        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(_) => {
                warn!("Skipping missing file {} while archiving", path.display());
                continue;
            }
        };
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file")
            .to_string();
        writer
            .start_file(name, options)
            .map_err(|e| ArchiveError::Zip(e.to_string()))?;
        io::copy(&mut file, &mut writer)?;
        added += 1;
    }

    writer
        .finish()
        .map_err(|e| ArchiveError::Zip(e.to_string()))?;
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zip::ZipArchive;

    #[test]
    fn archives_existing_files_under_base_names() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("ada-1.pdf");
        let b = dir.path().join("grace-2.pdf");
        std::fs::write(&a, b"pdf a").unwrap();
        std::fs::write(&b, b"pdf b").unwrap();
        let dest = dir.path().join("out.zip");

        let added = build_archive(&[a, b], &dest).unwrap();
        assert_eq!(added, 2);

        let mut archive = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["ada-1.pdf", "grace-2.pdf"]);
    }

    #[test]
    fn missing_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.pdf");
        std::fs::write(&present, b"pdf").unwrap();
        let dest = dir.path().join("out.zip");

        let added =
            build_archive(&[dir.path().join("gone.pdf"), present], &dest).unwrap();
        assert_eq!(added, 1);
    }

    #[test]
    fn empty_input_still_produces_an_archive() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("empty.zip");

        let added = build_archive(&[], &dest).unwrap();
        assert_eq!(added, 0);
        let archive = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        assert_eq!(archive.len(), 0);
    }
}
