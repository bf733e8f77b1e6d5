//! Per-row output filenames.

/// Reduce a recipient name to a safe file stem: ASCII alphanumerics are
/// kept (lowercased), runs of separators collapse to a single dash,
/// everything else is dropped.
pub fn sanitize_recipient(name: &str) -> String {
    let mut result = String::new();
    let mut last_dash = false;

    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            result.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || ch == '-' || ch == '_') && !last_dash && !result.is_empty()
        {
            result.push('-');
            last_dash = true;
        }
    }

    result.trim_matches('-').to_string()
}

/// Unique stem for one row's output files within a batch directory.
///
/// The row ordinal keeps two identically-named recipients apart; wall
/// clock time alone would collide under fast execution.
pub fn row_file_stem(recipient: &str, index: usize) -> String {
    let safe = sanitize_recipient(recipient);
    if safe.is_empty() {
        format!("certificate-{}", index + 1)
    } else {
        format!("{}-{}", safe, index + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_unsafe_characters() {
        assert_eq!(sanitize_recipient("Ada Lovelace"), "ada-lovelace");
        assert_eq!(sanitize_recipient("  José / O'Brien  "), "jos-obrien");
        assert_eq!(sanitize_recipient("!!!"), "");
    }

    #[test]
    fn identical_recipients_get_distinct_stems() {
        assert_eq!(row_file_stem("Ada", 0), "ada-1");
        assert_eq!(row_file_stem("Ada", 1), "ada-2");
    }

    #[test]
    fn unusable_name_falls_back_to_ordinal() {
        assert_eq!(row_file_stem("***", 2), "certificate-3");
    }
}
