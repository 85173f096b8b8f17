//! Bearer-token gate in front of every route.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::api::AppState;
use crate::core::AppError;

/// Hash a credential using SHA-256.
fn hash_key(key: &str) -> [u8; 32] {
    Sha256::digest(key.as_bytes()).into()
}

/// Whether the `Authorization` header is exactly `Bearer <secret>`.
///
/// Both sides are compared as digests so the comparison time does not depend
/// on how long a prefix of the secret the caller guessed.
pub fn is_authorized(headers: &HeaderMap, secret: &str) -> bool {
    let Some(provided) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    hash_key(provided) == hash_key(&format!("Bearer {}", secret))
}

/// Reject requests without the configured bearer credential.
///
/// Runs before routing, so neither the token counter nor the proxy ever sees
/// an unauthenticated request.
pub async fn require_bearer(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    if !is_authorized(req.headers(), &state.config.authorization_key) {
        tracing::debug!(path = %req.uri().path(), "Rejected request with invalid credentials");
        return AppError::Unauthorized.into_response();
    }
    next.run(req).await
}
