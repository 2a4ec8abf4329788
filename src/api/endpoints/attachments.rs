//! Documentation upload and download endpoints.
//!
//! Content arrives base64-encoded in a JSON body. The returned descriptor is
//! what the documentation endpoint expects in `files`; its `content_hash`
//! addresses the raw bytes for download.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use base64::Engine;
use serde::Deserialize;

use crate::api::endpoints::parse_id;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::attachments::MAX_ATTACHMENT_BYTES;
use crate::models::StoredAttachment;

#[derive(Deserialize)]
pub struct UploadRequest {
    pub file_name: String,
    pub content_base64: String,
}

/// `POST /api/cases/:id/attachments`
pub async fn upload(
    State(ctx): State<ApiContext>,
    Path(case_id): Path<String>,
    Json(req): Json<UploadRequest>,
) -> Result<(StatusCode, Json<StoredAttachment>), ApiError> {
    let id = parse_id(&case_id, "case")?;

    // base64 expands by 4/3; reject before decoding.
    if req.content_base64.len() > MAX_ATTACHMENT_BYTES / 3 * 4 + 4 {
        return Err(ApiError::BadRequest(format!(
            "Attachment exceeds {MAX_ATTACHMENT_BYTES} bytes"
        )));
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(req.content_base64.trim())
        .map_err(|e| ApiError::BadRequest(format!("Invalid base64 content: {e}")))?;

    let stored = ctx.core.store_attachment(id, &req.file_name, &bytes).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// `GET /api/cases/:id/attachments/:hash`
pub async fn download(
    State(ctx): State<ApiContext>,
    Path((case_id, content_hash)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let id = parse_id(&case_id, "case")?;
    let bytes = ctx.core.read_attachment(id, &content_hash).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CACHE_CONTROL, "private, max-age=31536000, immutable")
        .body(Body::from(bytes))
        .map_err(|e| ApiError::Internal(e.to_string()))
}
