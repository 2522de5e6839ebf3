//! Filesystem-backed object bucket for uploaded resumes.
//!
//! Object names look like `{user_id}/{unix_millis}_{sanitized_name}.pdf`. Every
//! segment is built from sanitized input so a name can never leave the bucket root.

use std::path::PathBuf;

use crate::error::AppError;

const MAX_NAME_LEN: usize = 100;

#[derive(Debug, Clone)]
pub struct ObjectStore {
    root: PathBuf,
}

impl ObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write `bytes` under `object_name`, creating parent directories as needed.
    pub async fn put(&self, object_name: &str, bytes: &[u8]) -> Result<(), AppError> {
        let path = self.path_for(object_name)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Upload(format!("Failed to create bucket directory: {}", e)))?;
        }

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Upload(format!("Failed to store object: {}", e)))?;

        tracing::debug!(object = %object_name, size = bytes.len(), "stored object");
        Ok(())
    }

    pub async fn get(&self, object_name: &str) -> Result<Option<Vec<u8>>, AppError> {
        let path = self.path_for(object_name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn path_for(&self, object_name: &str) -> Result<PathBuf, AppError> {
        let valid = !object_name.is_empty()
            && object_name
                .split('/')
                .all(|segment| !segment.is_empty() && segment != "." && segment != "..");
        if !valid {
            return Err(AppError::Validation(format!("Invalid object name: {}", object_name)));
        }
        Ok(self.root.join(object_name))
    }
}

/// Keep `[A-Za-z0-9._-]`, collapse everything else into single underscores,
/// cap the length and force a `.pdf` extension.
pub fn sanitize_file_name(original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or_default();
    let stem = match base.rfind('.') {
        Some(idx) if base[idx..].eq_ignore_ascii_case(".pdf") => &base[..idx],
        _ => base,
    };

    let mut out = String::with_capacity(stem.len());
    for c in stem.chars() {
        let keep = c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_';
        if keep {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }

    let trimmed = out.trim_matches(|c| c == '_' || c == '.');
    let mut name: String = if trimmed.is_empty() {
        "resume".to_string()
    } else {
        trimmed.to_string()
    };

    let budget = MAX_NAME_LEN - ".pdf".len();
    if name.len() > budget {
        name.truncate(budget);
    }
    name.push_str(".pdf");
    name
}

/// Timestamped object name scoped to the uploading user.
pub fn resume_object_name(user_id: &str, original: &str, at_millis: i64) -> String {
    format!("{}/{}_{}", user_id, at_millis, sanitize_file_name(original))
}
