//! Photo upload handling
//!
//! Validates the submitted filename against the extension allow-list,
//! sanitizes it, and writes the bytes into the upload directory. A missing
//! or rejected file is never an error: the caller simply gets no stored
//! name back and keeps whatever photo reference it already had.

use crate::error::Result;
use std::path::Path;
use tracing::{debug, info};

/// A file received from the multipart form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// True when the filename carries an allow-listed extension.
///
/// The extension is the last dot-delimited segment, compared
/// case-insensitively.
pub fn allowed_file(filename: &str, allowed: &[String]) -> bool {
    match filename.rsplit_once('.') {
        Some((_, extension)) => allowed.iter().any(|a| a.eq_ignore_ascii_case(extension)),
        None => false,
    }
}

/// Reduce a client-supplied filename to a safe stored name.
///
/// Path components (both separators) are dropped, anything outside
/// `[A-Za-z0-9._-]` becomes `_`, and leading/trailing dots are stripped so
/// traversal sequences and hidden-file names cannot survive. Returns None
/// when nothing usable is left.
pub fn sanitize_filename(filename: &str) -> Option<String> {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() || cleaned.chars().all(|c| matches!(c, '.' | '_' | '-')) {
        return None;
    }
    Some(cleaned.to_string())
}

/// Store an uploaded photo, returning the sanitized filename to record.
///
/// Returns `Ok(None)` when no file was submitted or the file fails
/// validation. Uploads that sanitize to the same name overwrite the
/// earlier file on disk; stored names stay equal to what the admin
/// uploaded, so the external renderer can link them directly.
pub async fn store_photo(
    upload_dir: &Path,
    allowed: &[String],
    file: Option<&UploadedFile>,
) -> Result<Option<String>> {
    let Some(file) = file else {
        return Ok(None);
    };
    if file.filename.trim().is_empty() || file.bytes.is_empty() {
        return Ok(None);
    }
    if !allowed_file(&file.filename, allowed) {
        debug!("Rejected upload with disallowed extension: {}", file.filename);
        return Ok(None);
    }
    let Some(stored) = sanitize_filename(&file.filename) else {
        debug!("Rejected upload with unusable filename: {}", file.filename);
        return Ok(None);
    };

    tokio::fs::write(upload_dir.join(&stored), &file.bytes).await?;
    info!("Stored photo {} ({} bytes)", stored, file.bytes.len());
    Ok(Some(stored))
}
