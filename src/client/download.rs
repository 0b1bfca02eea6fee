//! Authorized report downloads
//!
//! Reports are fetched with the session token in the header rather than by
//! following a link, so the suggested filename has to be recovered from
//! `Content-Disposition`.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// A downloaded report body and the name to save it under
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Download {
    /// Write into `dir` under the suggested filename. Any directory part of
    /// the name is dropped.
    pub fn save_in(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let name = Path::new(&self.filename)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "report.pdf".into());
        let path = dir.join(name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

fn filename_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)filename\*?=(?:UTF-8'')?(?:"([^"]+)"|([^";\s]+))"#)
            .expect("valid filename regex")
    })
}

/// Extract the filename from a `Content-Disposition` value, percent-decoded
pub fn filename_from_disposition(header: &str) -> Option<String> {
    let caps = filename_pattern().captures(header)?;
    let raw = caps.get(1).or_else(|| caps.get(2))?.as_str().trim();
    if raw.is_empty() {
        return None;
    }
    let decoded = urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    Some(decoded)
}

/// Pick the name to save a download under.
///
/// The header wins when it yields a name; otherwise `fallback`, and failing
/// that the report file name itself.
pub fn suggested_filename(
    content_disposition: Option<&str>,
    fallback: Option<&str>,
    report_file: &str,
) -> String {
    content_disposition
        .and_then(filename_from_disposition)
        .or_else(|| fallback.map(str::to_string))
        .unwrap_or_else(|| report_file.to_string())
}
