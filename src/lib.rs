//! OpenAI Bridge - an authenticating streaming reverse proxy for completion APIs
//!
//! The proxy sits between internal callers and a third-party completion API:
//!
//! - **Authentication**: every route requires `Authorization: Bearer <secret>`
//! - **Identity hashing**: the `user` field of JSON bodies is replaced by a salted
//!   SHA-256 digest before the request leaves the process
//! - **Streaming**: upstream responses are relayed chunk by chunk, never buffered,
//!   and the upstream exchange is released exactly once however the relay ends
//! - **Header filtering**: only `content-type` and `x-*` headers cross the boundary
//! - **Audit log**: one JSONL record per proxied request
//! - **Token counting**: `POST /_/count-tokens?model=<name>`
//!
//! # Architecture
//!
//! - [`core`]: configuration, errors, logging, header policy, identity hashing,
//!   audit log, tokenizers
//! - [`api`]: router, bearer gate, handlers, upstream client, streaming relay
//!
//! # Configuration
//!
//! Required environment variables:
//! - `OPENAI_API_BASE`: upstream base URL
//! - `OPENAI_API_KEY`: upstream credential
//! - `AUTHORIZATION_KEY`: bearer secret callers must present
//! - `UID_HASH_SALT`: salt for hashed caller identities
//!
//! Optional environment variables:
//! - `OPENAI_REQ_LOG_FILE`: audit log path (default: records are discarded)
//! - `HOST`: Server bind address (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8000)
//! - `REQUEST_TIMEOUT_SECS`: connect + response header timeout (default: 20)
//! - `VERIFY_SSL`: Verify SSL certificates for upstream (default: true)
//! - `MAX_BODY_BYTES`: inbound body limit (default: 10 MiB)

pub mod api;
pub mod core;

// Re-export commonly used types for convenience
pub use api::{build_router, AppState};
pub use core::{AppConfig, AppError, Result};
