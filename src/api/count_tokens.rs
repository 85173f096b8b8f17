//! `POST /_/count-tokens?model=<name>`
//!
//! Counts the tokens of a plain-text body with the named model's tokenizer.
//! Each validation failure is a distinct 400 with a short plain-text reason,
//! checked in this order: query, content type, encoding, model.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::api::AppState;
use crate::core::error::{AppError, Result};

/// Response body of the token counter
#[derive(Debug, Serialize)]
pub struct CountTokensResponse {
    pub count: usize,
}

/// The single `model` query value, or `None` if absent or repeated.
fn single_model(query: &[(String, String)]) -> Option<&str> {
    let mut models = query
        .iter()
        .filter(|(name, _)| name == "model")
        .map(|(_, value)| value.as_str());
    let model = models.next()?;
    match models.next() {
        Some(_) => None,
        None => Some(model),
    }
}

pub async fn count_tokens(
    State(state): State<Arc<AppState>>,
    Query(query): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CountTokensResponse>> {
    let model = single_model(&query)
        .ok_or_else(|| AppError::BadRequest("Missing string 'model' in query".to_string()))?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .map(|v| v.as_bytes());
    if content_type != Some(b"text/plain".as_slice()) {
        return Err(AppError::BadRequest("Invalid Content-Type".to_string()));
    }

    let text = std::str::from_utf8(&body)
        .map_err(|_| AppError::BadRequest("Invalid UTF-8".to_string()))?;

    let tokenizer = state
        .tokenizers
        .tokenizer_for_model(model)
        .ok_or_else(|| AppError::BadRequest("Invalid model".to_string()))?;

    let count = tokenizer.count_tokens(text);
    tracing::debug!(model = %model, count, "Counted tokens");

    Ok(Json(CountTokensResponse { count }))
}
