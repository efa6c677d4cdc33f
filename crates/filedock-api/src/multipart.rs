//! Multipart form extraction for the upload endpoints.

use axum::extract::Multipart;
use filedock_core::constants::{MAX_BATCH_FILES, OCTET_STREAM};
use filedock_core::models::UploadedFile;
use filedock_core::AppError;

fn field_error(name: &str, err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::InvalidInput(format!("Failed to read multipart field '{}': {}", name, err))
}

async fn read_file(
    field: axum::extract::multipart::Field<'_>,
) -> Result<UploadedFile, AppError> {
    let original_name = field.file_name().unwrap_or("upload").to_string();
    let content_type = field
        .content_type()
        .unwrap_or(OCTET_STREAM)
        .to_string();
    let data = field
        .bytes()
        .await
        .map_err(|e| field_error("file", e))?
        .to_vec();

    Ok(UploadedFile::new(original_name, content_type, data))
}

/// Extract the `file` field and optional `folder` field.
pub async fn extract_single(
    mut multipart: Multipart,
) -> Result<(Option<UploadedFile>, Option<String>), AppError> {
    let mut file = None;
    let mut folder = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("file") => file = Some(read_file(field).await?),
            Some("folder") => {
                folder = Some(field.text().await.map_err(|e| field_error("folder", e))?)
            }
            _ => {}
        }
    }

    Ok((file, folder))
}

/// Extract the repeated `files` field (max `MAX_BATCH_FILES`) and optional
/// `folder` field.
pub async fn extract_multiple(
    mut multipart: Multipart,
) -> Result<(Vec<UploadedFile>, Option<String>), AppError> {
    let mut files = Vec::new();
    let mut folder = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("files") => {
                if files.len() >= MAX_BATCH_FILES {
                    return Err(AppError::InvalidInput(format!(
                        "Too many files: at most {} per request",
                        MAX_BATCH_FILES
                    )));
                }
                files.push(read_file(field).await?);
            }
            Some("folder") => {
                folder = Some(field.text().await.map_err(|e| field_error("folder", e))?)
            }
            _ => {}
        }
    }

    Ok((files, folder))
}
