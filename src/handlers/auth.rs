//! Staff authentication
//!
//! Every `/api/staff` route requires the `x-api-key` header to match
//! `ADMIN_API_KEY`.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

use crate::models::ErrorResponse;
use crate::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

pub async fn require_staff_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let provided_key = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if provided_key.is_empty() || !keys_match(provided_key, &state.config.admin_api_key) {
        warn!(path = %request.uri().path(), "Invalid or missing API key");
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Invalid or missing API key".to_string(),
                code: Some("UNAUTHORIZED".to_string()),
            }),
        )
            .into_response());
    }

    Ok(next.run(request).await)
}

/// Constant-time comparison of HMAC tags keyed by the expected key
fn keys_match(provided: &str, expected: &str) -> bool {
    let tag = |input: &str| {
        Hmac::<Sha256>::new_from_slice(expected.as_bytes()).map(|mut mac| {
            mac.update(input.as_bytes());
            mac
        })
    };

    match (tag(provided), tag(expected)) {
        (Ok(provided), Ok(expected)) => provided
            .verify_slice(&expected.finalize().into_bytes())
            .is_ok(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_match() {
        assert!(keys_match("test-admin-key", "test-admin-key"));
        assert!(!keys_match("test-admin-kez", "test-admin-key"));
        assert!(!keys_match("test-admin-key-longer", "test-admin-key"));
        assert!(!keys_match("", "test-admin-key"));
    }
}
