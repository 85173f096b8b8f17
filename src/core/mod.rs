//! Core functionality for the proxy.
//!
//! This module contains fundamental components used throughout the application:
//! - Configuration management
//! - Error handling
//! - Logging and request tracking middleware
//! - Header filtering and caller identity hashing
//! - Audit log and upstream release accounting
//! - Tokenizers

pub mod audit_log;
pub mod config;
pub mod error;
pub mod header_policy;
pub mod identity;
pub mod logging;
pub mod middleware;
pub mod release;
pub mod tokenizer;

// Re-export commonly used types
pub use audit_log::{AuditLog, AuditRecord};
pub use config::{AppConfig, ServerConfig, UpstreamConfig};
pub use error::{AppError, Result};
pub use header_policy::filter_headers;
pub use identity::{hash_identity_field, hash_user_id};
pub use logging::{generate_request_id, get_request_id, init_tracing};
pub use middleware::request_id_middleware;
pub use release::{ReleaseReason, ReleaseSnapshot, ReleaseStats};
pub use tokenizer::{TiktokenRegistry, Tokenizer, TokenizerRegistry};
