//! API layer for the proxy.
//!
//! This module contains the HTTP handlers, the bearer gate, the upstream
//! client and the streaming relay.

pub mod auth;
pub mod count_tokens;
pub mod proxy;
pub mod relay;
pub mod state;
pub mod upstream;

use axum::{
    extract::DefaultBodyLimit,
    routing::{on, post, MethodFilter},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::core::request_id_middleware;

// Re-export commonly used types
pub use auth::require_bearer;
pub use count_tokens::count_tokens;
pub use proxy::proxy;
pub use relay::RelayStream;
pub use state::AppState;
pub use upstream::{UpstreamClient, UpstreamExchange, UpstreamRequest};

/// Path of the token counting endpoint.
pub const COUNT_TOKENS_PATH: &str = "/_/count-tokens";

/// Build the application router.
///
/// Every route, including unmatched methods, sits behind the bearer gate.
pub fn build_router(state: Arc<AppState>) -> Router {
    let proxied_without_post = MethodFilter::GET
        .or(MethodFilter::HEAD)
        .or(MethodFilter::PUT)
        .or(MethodFilter::PATCH)
        .or(MethodFilter::DELETE);
    let proxied = proxied_without_post.or(MethodFilter::POST);

    Router::new()
        // Only POST counts tokens; other methods on this path are proxied
        .route(
            COUNT_TOKENS_PATH,
            post(count_tokens).on(proxied_without_post, proxy),
        )
        .route("/", on(proxied, proxy))
        .route("/*path", on(proxied, proxy))
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_bearer,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state)
}
