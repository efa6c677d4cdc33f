//! Upload endpoint handlers
//!
//! Thin layer over `UploadService`: extract the request, delegate, wrap the
//! result in the response envelope. Input errors (missing file, neither key
//! nor url) are detected here, before any service work.

use std::sync::Arc;

use axum::{extract::Multipart, extract::State, Json};
use serde::Deserialize;

use crate::error::{HttpAppError, ValidatedJson};
use crate::multipart::{extract_multiple, extract_single};
use crate::response::ApiResponse;
use crate::services::UploadService;
use crate::state::AppState;
use filedock_core::models::{StorageObjectRef, UploadOptions};
use filedock_core::AppError;

fn upload_service(state: &AppState) -> UploadService {
    UploadService::new(state.storage.clone(), state.config.max_file_size_bytes)
}

#[tracing::instrument(skip(state, multipart), fields(operation = "upload_single"))]
pub async fn upload_single(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<StorageObjectRef>>, HttpAppError> {
    let (file, folder) = extract_single(multipart).await?;
    let file = file.ok_or_else(|| AppError::InvalidInput("No file uploaded".to_string()))?;

    let reference = upload_service(&state)
        .upload_single(
            file,
            UploadOptions {
                folder,
                filename: None,
            },
        )
        .await?;

    Ok(ApiResponse::ok("File uploaded successfully", reference))
}

#[tracing::instrument(skip(state, multipart), fields(operation = "upload_multiple"))]
pub async fn upload_multiple(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<Vec<StorageObjectRef>>>, HttpAppError> {
    let (files, folder) = extract_multiple(multipart).await?;
    if files.is_empty() {
        return Err(AppError::InvalidInput("No files uploaded".to_string()).into());
    }

    let references = upload_service(&state)
        .upload_many(
            files,
            UploadOptions {
                folder,
                filename: None,
            },
        )
        .await?;

    Ok(ApiResponse::ok("Files uploaded successfully", references))
}

#[derive(Debug, Deserialize)]
pub struct DeleteBody {
    pub key: Option<String>,
    pub url: Option<String>,
}

#[tracing::instrument(skip(state, body), fields(operation = "delete_file"))]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<DeleteBody>,
) -> Result<Json<ApiResponse<serde_json::Value>>, HttpAppError> {
    let key_or_url = body
        .key
        .or(body.url)
        .ok_or_else(|| AppError::InvalidInput("File key or URL is required".to_string()))?;

    upload_service(&state).delete(&key_or_url).await?;

    Ok(ApiResponse::ok_empty("File deleted successfully"))
}

#[derive(Debug, Deserialize)]
pub struct DeleteManyBody {
    pub keys: Option<Vec<String>>,
    pub urls: Option<Vec<String>>,
}

#[tracing::instrument(skip(state, body), fields(operation = "delete_multiple"))]
pub async fn delete_multiple(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<DeleteManyBody>,
) -> Result<Json<ApiResponse<serde_json::Value>>, HttpAppError> {
    let keys_or_urls = match (body.keys, body.urls) {
        (Some(keys), _) if !keys.is_empty() => keys,
        (_, Some(urls)) if !urls.is_empty() => urls,
        _ => {
            return Err(
                AppError::InvalidInput("File keys or URLs are required".to_string()).into(),
            )
        }
    };

    upload_service(&state).delete_many(&keys_or_urls).await?;

    Ok(ApiResponse::ok_empty("Files deleted successfully"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUrlBody {
    pub key: Option<String>,
    pub url: Option<String>,
    pub expires_in: Option<u64>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUrlResponse {
    pub signed_url: String,
}

#[tracing::instrument(skip(state, body), fields(operation = "signed_url"))]
pub async fn signed_url(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<SignedUrlBody>,
) -> Result<Json<ApiResponse<SignedUrlResponse>>, HttpAppError> {
    let key_or_url = body
        .key
        .or(body.url)
        .ok_or_else(|| AppError::InvalidInput("File key or URL is required".to_string()))?;

    let signed_url = upload_service(&state)
        .signed_url(&key_or_url, body.expires_in)
        .await?;

    Ok(ApiResponse::ok(
        "Signed URL generated successfully",
        SignedUrlResponse { signed_url },
    ))
}
