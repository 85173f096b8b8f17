//! Header allow-list applied in both directions of the proxy.
//!
//! Only `content-type` and `x-*` headers cross the boundary. Everything else
//! (hop-by-hop headers, cookies, credentials, `content-length`) is dropped;
//! the transport recomputes framing when it streams the body.

use axum::http::{HeaderMap, HeaderName};

const ALLOWED_EXACT: &[&str] = &["content-type"];
const ALLOWED_PREFIX: &str = "x-";

/// Whether a header with this name may cross the proxy boundary.
pub fn is_forwardable(name: &HeaderName) -> bool {
    let name = name.as_str();
    ALLOWED_EXACT
        .iter()
        .any(|allowed| name.eq_ignore_ascii_case(allowed))
        || name
            .get(..ALLOWED_PREFIX.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(ALLOWED_PREFIX))
}

/// Return the forwardable subset of `headers`.
///
/// Multi-valued entries keep all their values, and surviving entries keep
/// their relative order.
pub fn filter_headers(headers: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if is_forwardable(name) {
            filtered.append(name.clone(), value.clone());
        }
    }
    filtered
}
