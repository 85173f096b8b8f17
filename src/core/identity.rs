//! Caller identity hashing.
//!
//! The `user` field of a completion request identifies the end user to the
//! upstream provider. It never leaves this process in clear text: it is
//! replaced by a salted SHA-256 digest so that requests from the same user can
//! still be correlated without exposing who the user is.

use crate::core::error::{AppError, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Name of the identity field in JSON request bodies.
pub const USER_FIELD: &str = "user";

/// Hash a caller-supplied identifier with the configured salt.
///
/// Computes `sha256(salt ++ uid)` and renders it as lowercase hex.
pub fn hash_user_id(salt: &str, uid: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(uid.as_bytes());
    hex::encode(hasher.finalize())
}

/// Replace the `user` field of a JSON object body with its hashed form.
///
/// Returns `Ok(true)` when the body was rewritten and `Ok(false)` when there
/// was nothing to rewrite (no `user` field, or the body is not an object).
/// A `user` field that is not a string is rejected.
pub fn hash_identity_field(body: &mut Value, salt: &str) -> Result<bool> {
    let Some(user) = body.as_object_mut().and_then(|obj| obj.get_mut(USER_FIELD)) else {
        return Ok(false);
    };

    let hashed = match user {
        Value::String(uid) => hash_user_id(salt, uid),
        _ => return Err(AppError::BadRequest("Invalid .user".to_string())),
    };
    *user = Value::String(hashed);
    Ok(true)
}
