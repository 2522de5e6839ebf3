use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::AuthUser;
use crate::api::state::AppState;
use crate::db::now_millis;
use crate::error::AppError;
use crate::storage::resume_object_name;

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub object_name: String,
    pub original_name: String,
    pub size: usize,
}

/// A part is acceptable when it claims to be a PDF, either by MIME type or,
/// for generic binary parts, by extension.
fn declared_pdf(content_type: &str, file_name: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match mime.as_str() {
        "application/pdf" => true,
        "" | "application/octet-stream" => file_name.to_ascii_lowercase().ends_with(".pdf"),
        _ => false,
    }
}

/// POST /api/resumes/upload (requires auth, multipart field `file`)
pub async fn upload_resume(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let max_bytes = state.config.max_upload_bytes;

    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("resume.pdf").to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();

        if !declared_pdf(&content_type, &file_name) {
            return Err(AppError::Validation(format!(
                "Invalid file type: {}. Only PDF resumes are accepted.",
                if content_type.is_empty() { "unknown" } else { content_type.as_str() }
            )));
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read file chunk: {}", e)))?
        {
            bytes.extend_from_slice(&chunk);
            if bytes.len() > max_bytes {
                return Err(AppError::Validation(format!(
                    "File too large: exceeds maximum of {} bytes",
                    max_bytes
                )));
            }
        }

        file = Some((file_name, bytes));
        break;
    }

    let (original_name, bytes) =
        file.ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;

    if bytes.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(AppError::Validation("File is not a valid PDF".to_string()));
    }

    let object_name = resume_object_name(&auth.user_id, &original_name, now_millis());
    state.storage.put(&object_name, &bytes).await?;

    tracing::info!(
        user_id = %auth.user_id,
        object = %object_name,
        original_name = %original_name,
        size_bytes = bytes.len(),
        "resume uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            object_name,
            original_name,
            size: bytes.len(),
        }),
    ))
}
