use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Json,
};
use tracing::{info, instrument};

use super::errors::{error_body, service_error_to_response, ApiError};
use super::AppState;
use crate::models::UploadKind;
use crate::services::UploadResponse;

/// Multipart body size accepted by the upload route; the image itself is capped lower
pub const UPLOAD_BODY_LIMIT: usize = 2 * 1024 * 1024;

struct UploadForm {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
    kind: UploadKind,
}

fn bad_request(message: impl Into<String>) -> ApiError {
    error_body(StatusCode::BAD_REQUEST, "Upload rejected", message)
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut kind: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Invalid multipart request: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(format!("Multipart error: {}", e)))?;
                file = Some((file_name, content_type, bytes.to_vec()));
            }
            Some("type") => {
                kind = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| bad_request(format!("Multipart error: {}", e)))?,
                );
            }
            _ => {}
        }
    }

    let (Some((file_name, content_type, bytes)), Some(kind)) = (file, kind) else {
        return Err(bad_request("Missing file or type"));
    };
    let kind = kind.trim().parse::<UploadKind>().map_err(bad_request)?;

    Ok(UploadForm {
        file_name,
        content_type,
        bytes,
        kind,
    })
}

/// Store a dish or drink image and return its public URL
#[instrument(name = "upload_image", skip_all)]
pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let form = read_form(multipart).await?;
    let kind = form.kind;

    let response = state
        .business_tracing
        .trace_upload(
            &kind.to_string(),
            state
                .upload_service
                .upload(kind, &form.file_name, &form.content_type, form.bytes),
        )
        .await
        .map_err(service_error_to_response)?;

    info!("Uploaded image to {}", response.key);
    Ok(Json(response))
}
