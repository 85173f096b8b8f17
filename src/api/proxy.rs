//! Authenticated pass-through proxy to the upstream completion API.
//!
//! Flow per request:
//! 1. classify and read the inbound body (none / JSON / opaque bytes)
//! 2. hash the `user` field of JSON bodies
//! 3. open the upstream exchange with filtered headers
//! 4. append the audit record once the upstream status is known
//! 5. relay the upstream body chunk by chunk through [`RelayStream`]
//!
//! Every client input error is raised before step 3, so no upstream resource
//! exists yet when the request is rejected.

use axum::{
    body::{Body, Bytes},
    extract::{Query, Request, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::Response,
};
use futures::StreamExt;
use http_body_util::LengthLimitError;
use serde_json::Value;
use std::error::Error as _;
use std::sync::Arc;

use crate::api::relay::RelayStream;
use crate::api::upstream::UpstreamRequest;
use crate::api::AppState;
use crate::core::error::{AppError, Result};
use crate::core::{filter_headers, get_request_id, hash_identity_field, AuditRecord};

/// Inbound body after classification.
#[derive(Debug)]
pub enum ForwardBody {
    /// No `Content-Type`: nothing is read or forwarded
    Empty,
    /// `application/json`, identity field already hashed
    Json { bytes: Bytes, value: Value },
    /// Any other content type, forwarded untouched
    Opaque(Bytes),
}

impl ForwardBody {
    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            ForwardBody::Empty => None,
            ForwardBody::Json { bytes, .. } | ForwardBody::Opaque(bytes) => Some(bytes),
        }
    }

    /// Representation of the forwarded body in the audit log.
    pub fn audit_value(&self) -> Value {
        match self {
            ForwardBody::Empty => Value::Null,
            ForwardBody::Json { value, .. } => value.clone(),
            ForwardBody::Opaque(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        }
    }
}

/// Whether a `Content-Type` value denotes JSON, ignoring parameters.
pub fn is_json_content_type(value: &str) -> bool {
    value
        .split(';')
        .next()
        .map(str::trim)
        .is_some_and(|essence| essence.eq_ignore_ascii_case("application/json"))
}

async fn read_body(headers: &HeaderMap, body: Body, limit: usize) -> Result<Bytes> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > limit) {
        return Err(AppError::PayloadTooLarge);
    }

    axum::body::to_bytes(body, limit).await.map_err(map_body_error)
}

/// A body that outgrew the limit while streaming is still a 413.
fn map_body_error(err: axum::Error) -> AppError {
    if err
        .source()
        .is_some_and(|source| source.is::<LengthLimitError>())
    {
        return AppError::PayloadTooLarge;
    }
    tracing::debug!(error = %err, "Failed to read request body");
    AppError::BadRequest("Failed to read request body".to_string())
}

/// Read the inbound body and apply the identity rewrite.
pub async fn classify_body(
    headers: &HeaderMap,
    body: Body,
    limit: usize,
    salt: &str,
) -> Result<ForwardBody> {
    let Some(content_type) = headers.get(header::CONTENT_TYPE) else {
        return Ok(ForwardBody::Empty);
    };
    let is_json = content_type.to_str().is_ok_and(is_json_content_type);

    let bytes = read_body(headers, body, limit).await?;
    if !is_json {
        return Ok(ForwardBody::Opaque(bytes));
    }

    let mut value: Value = serde_json::from_slice(&bytes)
        .map_err(|_| AppError::BadRequest("Invalid JSON body".to_string()))?;

    let bytes = if hash_identity_field(&mut value, salt)? {
        serde_json::to_vec(&value)
            .map_err(|e| AppError::Internal(format!("Failed to serialize request body: {}", e)))?
            .into()
    } else {
        bytes
    };

    Ok(ForwardBody::Json { bytes, value })
}

/// Query pairs for the audit record.
///
/// An unparseable query is still forwarded verbatim; only the audit record
/// loses its params.
fn audit_query_pairs(uri: &Uri) -> Vec<(String, String)> {
    match Query::<Vec<(String, String)>>::try_from_uri(uri) {
        Ok(Query(pairs)) => pairs,
        Err(e) => {
            tracing::debug!(query = ?uri.query(), error = %e, "Unparseable query string, auditing as empty");
            Vec::new()
        }
    }
}

/// Responses that never carry a body.
fn is_bodiless(method: &Method, status: StatusCode) -> bool {
    method == Method::HEAD
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED
}

pub async fn proxy(State(state): State<Arc<AppState>>, req: Request) -> Result<Response> {
    let (parts, body) = req.into_parts();
    let method = parts.method;
    let path = parts.uri.path().to_string();
    let raw_query = parts.uri.query().map(str::to_string);
    let query_pairs = audit_query_pairs(&parts.uri);

    let forward_body = classify_body(
        &parts.headers,
        body,
        state.config.max_body_bytes,
        &state.config.uid_hash_salt,
    )
    .await?;
    let audit_body = forward_body.audit_value();

    let request_id = get_request_id();

    let exchange = state
        .upstream
        .open(UpstreamRequest {
            method: method.clone(),
            path: path.clone(),
            query: raw_query,
            headers: filter_headers(&parts.headers),
            body: forward_body.into_bytes(),
        })
        .await?;

    let status = exchange.status;
    let headers = filter_headers(&exchange.headers);
    let mut relay = RelayStream::new(exchange.body, state.release_stats.clone(), request_id.clone());

    let record = AuditRecord::new(
        request_id,
        path.clone(),
        method.to_string(),
        &query_pairs,
        audit_body,
        status.as_u16(),
    );
    state.audit_log.append(&record).await;

    tracing::info!(method = %method, path = %path, status = status.as_u16(), "Proxying upstream response");

    let body = if is_bodiless(&method, status) {
        // Read the (empty) upstream body to its end so the connection goes back to the pool
        while let Some(chunk) = relay.next().await {
            if chunk.is_err() {
                break;
            }
        }
        Body::empty()
    } else {
        Body::from_stream(relay)
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}
