use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Json, Response},
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::errors::{error_body, service_error_to_response, ApiError};
use super::AppState;
use crate::services::SESSION_COOKIE;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
}

/// Session cookie without max-age: it lives until the browser closes
fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Check the admin password and set the session cookie
#[instrument(name = "admin_login", skip_all)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    match state.auth_service.login(&request.password).await {
        Ok(token) => {
            state.metrics.record_admin_login(true);
            state
                .metrics
                .set_admin_sessions(state.auth_service.active_sessions().await);
            info!("Admin logged in");
            let jar = jar.add(session_cookie(token, state.cookie_secure));
            Ok((jar, Json(LoginResponse { success: true })))
        }
        Err(err) => {
            state.metrics.record_admin_login(false);
            Err(service_error_to_response(err))
        }
    }
}

/// Close the session and clear the cookie. Succeeds without a session too.
#[instrument(name = "admin_logout", skip_all)]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, StatusCode) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.auth_service.logout(cookie.value()).await;
        state
            .metrics
            .set_admin_sessions(state.auth_service.active_sessions().await);
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, StatusCode::NO_CONTENT)
}

/// Reject admin requests that carry no valid session cookie
pub async fn require_admin(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorized = match jar.get(SESSION_COOKIE) {
        Some(cookie) => state.auth_service.is_valid(cookie.value()).await,
        None => false,
    };

    if !authorized {
        warn!(path = %request.uri().path(), "Unauthenticated admin request");
        return Err(error_body(
            StatusCode::UNAUTHORIZED,
            "Unauthorized",
            "Admin login required",
        ));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc".to_string(), true);
        assert_eq!(cookie.name(), "admin_auth");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert!(cookie.max_age().is_none());
    }

    #[test]
    fn test_login_request_deserialization() {
        let request: LoginRequest = serde_json::from_str(r#"{"password":"secret"}"#).unwrap();
        assert_eq!(request.password, "secret");
    }
}
