//! HTTP middleware for request tracking.

use crate::core::logging::{generate_request_id, REQUEST_ID};
use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};

/// Response header carrying the proxy-assigned request ID.
///
/// Upstream providers set their own `x-request-id`, which is relayed
/// untouched, so the proxy's ID uses a separate name.
pub const REQUEST_ID_HEADER: &str = "x-bridge-request-id";

/// Assign a request ID, make it available to the handler through
/// [`REQUEST_ID`], and echo it on the response.
pub async fn request_id_middleware(req: Request, next: Next) -> Response {
    let request_id = generate_request_id();

    tracing::debug!(
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
        "Request received"
    );

    let mut response = REQUEST_ID.scope(request_id.clone(), next.run(req)).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::logging::get_request_id;
    use axum::{body::Body, routing::get, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_request_id_visible_to_handler_and_echoed() {
        let app = Router::new()
            .route("/", get(|| async { get_request_id() }))
            .layer(axum::middleware::from_fn(request_id_middleware));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let header = response.headers()[REQUEST_ID_HEADER]
            .to_str()
            .unwrap()
            .to_string();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(header, String::from_utf8(body.to_vec()).unwrap());
        assert_eq!(header.len(), 36);
    }
}
