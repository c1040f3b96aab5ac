//! Persistence stores bridging the document store and the domain model.

mod comments;
mod lock;
mod posts;

pub use comments::CommentStore;
pub use posts::PostStore;

use serde_json::Value;
use thiserror::Error;

use crate::domain::error::DomainError;
use crate::infra::error::InfraError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Persistence(#[from] InfraError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Sort key shared by post and comment scans: publish time in
/// unix nanoseconds, with documents missing the field sorting first.
pub(crate) fn publish_ticks(document: &Value) -> i64 {
    document
        .get("published_at_ns")
        .and_then(Value::as_i64)
        .unwrap_or(i64::MIN)
}
