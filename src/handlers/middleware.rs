use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};
use tracing::{error, warn};

/// Largest JSON body accepted; uploads are bounded separately
pub const MAX_JSON_REQUEST_SIZE: u64 = 1024 * 1024;

/// Request validation middleware
pub async fn request_validation_middleware(
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<Value>)> {
    let body_kind = validate_content_type(&request)?;

    if body_kind == BodyKind::Json {
        validate_request_size(&request)?;
    }

    Ok(next.run(request).await)
}

#[derive(Debug, PartialEq, Eq)]
enum BodyKind {
    None,
    Json,
    Multipart,
}

fn has_body(request: &Request<Body>) -> bool {
    let declared_length = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());

    match declared_length {
        Some(length) => length > 0,
        None => request.headers().contains_key(header::TRANSFER_ENCODING),
    }
}

/// JSON everywhere, multipart only for image uploads. Empty POSTs (logout,
/// visibility toggles, seeding) need no content type.
fn validate_content_type(request: &Request<Body>) -> Result<BodyKind, (StatusCode, Json<Value>)> {
    let method = request.method();
    if method != Method::POST && method != Method::PUT && method != Method::PATCH {
        return Ok(BodyKind::None);
    }

    let Some(content_type) = request.headers().get(header::CONTENT_TYPE) else {
        if has_body(request) {
            warn!("Missing content type header");
            return Err(rejection(
                StatusCode::BAD_REQUEST,
                "Missing content type",
                "Content-Type header is required for requests with body".to_string(),
            ));
        }
        return Ok(BodyKind::None);
    };

    let content_type_str = content_type.to_str().unwrap_or("");
    if content_type_str.starts_with("application/json") {
        Ok(BodyKind::Json)
    } else if content_type_str.starts_with("multipart/form-data") {
        Ok(BodyKind::Multipart)
    } else {
        warn!("Invalid content type: {}", content_type_str);
        Err(rejection(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Unsupported media type",
            "Content-Type must be application/json or multipart/form-data".to_string(),
        ))
    }
}

fn validate_request_size(request: &Request<Body>) -> Result<(), (StatusCode, Json<Value>)> {
    let length = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());

    if let Some(length) = length {
        if length > MAX_JSON_REQUEST_SIZE {
            error!("Request too large: {} bytes", length);
            return Err(rejection(
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request too large",
                format!(
                    "Request size {} bytes exceeds maximum of {} bytes",
                    length, MAX_JSON_REQUEST_SIZE
                ),
            ));
        }
    }

    Ok(())
}

fn rejection(status: StatusCode, error: &str, message: String) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({
            "error": error,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}

/// CORS headers for the menu front-end; preflight requests are answered here
pub async fn cors_middleware(request: Request<Body>, next: Next) -> Response {
    let origin = request.headers().get(header::ORIGIN).cloned();
    let is_preflight = request.method() == Method::OPTIONS;

    let mut response = if is_preflight {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    // Cookies are only sent cross-origin when the origin is echoed back
    match origin {
        Some(origin) => {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
            headers.insert(header::VARY, HeaderValue::from_static("Origin"));
        }
        None => {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            );
        }
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static("86400"),
    );

    response
}

/// Security headers middleware
pub async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'self'"),
    );

    response
}
