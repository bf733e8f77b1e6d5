//! Document filling.
//!
//! DOCX and PPTX files are zip packages of XML parts. Filling a template
//! means rewriting the package: text-bearing parts get their
//! `{{placeholder}}` tokens substituted, every other part is copied
//! through untouched. The template file itself is never modified.

use regex::Regex;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

#[derive(Debug, Error)]
pub enum FillError {
    /// The document's own placeholder syntax is broken (an opening
    /// `{{` marker with no closing `}}` in the same part).
    #[error("template part '{part}' has a malformed placeholder")]
    MalformedTemplate { part: String },
    /// The template is not a readable DOCX/PPTX package.
    #[error("template is not a readable document package: {0}")]
    Package(String),
    #[error("I/O error while filling document: {0}")]
    Io(#[from] std::io::Error),
}

/// Parts of the package that carry user-visible text.
fn is_text_part(name: &str) -> bool {
    let in_document = name.starts_with("word/");
    let in_slides = name.starts_with("ppt/slides/") || name.starts_with("ppt/notesSlides/");
    (in_document || in_slides) && name.ends_with(".xml")
}

fn xml_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Replace `{{name}}` tokens in one XML part.
///
/// Tokens with no supplied value stay in the output as literal text.
fn substitute(
    part: &str,
    xml: &str,
    values: &HashMap<String, String>,
    token: &Regex,
) -> Result<String, FillError> {
    // An opening marker that never closes is a template authoring error,
    // reported as such rather than silently passed through.
    let mut rest = xml;
    while let Some(start) = rest.find("{{") {
        match rest[start + 2..].find("}}") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => {
                return Err(FillError::MalformedTemplate {
                    part: part.to_string(),
                })
            }
        }
    }

    let filled = token.replace_all(xml, |caps: &regex::Captures| {
        let name = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        match values.get(name) {
            Some(value) => xml_escape(value),
            None => caps[0].to_string(),
        }
    });
    Ok(filled.into_owned())
}

/// Fill a DOCX/PPTX template with the given placeholder values, writing
/// the result to `output`. Writes exactly one file.
pub fn fill_document(
    template: &Path,
    values: &HashMap<String, String>,
    output: &Path,
) -> Result<(), FillError> {
    let file = File::open(template)?;
    let mut package = ZipArchive::new(file).map_err(|e| FillError::Package(e.to_string()))?;
    let out = File::create(output)?;
    let mut writer = ZipWriter::new(out);
    let token = Regex::new(r"\{\{\s*([^{}]+?)\s*\}\}").expect("placeholder pattern");
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for i in 0..package.len() {
        let is_text = {
            let entry = package
                .by_index_raw(i)
                .map_err(|e| FillError::Package(e.to_string()))?;
            is_text_part(entry.name())
        };

        if is_text {
            let mut entry = package
                .by_index(i)
                .map_err(|e| FillError::Package(e.to_string()))?;
            let name = entry.name().to_string();
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes)?;
            drop(entry);

            writer
                .start_file(name.clone(), options)
                .map_err(|e| FillError::Package(e.to_string()))?;
            match String::from_utf8(bytes) {
                Ok(xml) => {
                    let filled = substitute(&name, &xml, values, &token)?;
                    writer.write_all(filled.as_bytes())?;
                }
                // Not actually text; keep the bytes as they were.
                Err(not_utf8) => writer.write_all(not_utf8.as_bytes())?,
            }
        } else {
            let entry = package
                .by_index_raw(i)
                .map_err(|e| FillError::Package(e.to_string()))?;
            writer
                .raw_copy_file(entry)
                .map_err(|e| FillError::Package(e.to_string()))?;
        }
    }

    writer
        .finish()
        .map_err(|e| FillError::Package(e.to_string()))?;
    Ok(())
}
