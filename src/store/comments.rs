//! Comment persistence, one document per comment keyed by its id.

use std::sync::Arc;

use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use tracing::debug;

use crate::domain::entities::Comment;
use crate::domain::error::DomainError;
use crate::infra::db::{DocumentStore, SortDirection};
use crate::infra::error::InfraError;

use super::{StoreError, publish_ticks};

/// Field that marks a document as a comment; post documents never carry it.
const OWNING_POST_FIELD: &str = "owning_post_id";

#[derive(Debug, Serialize, Deserialize)]
struct CommentDocument {
    author: String,
    email: String,
    content: String,
    owning_post_id: String,
    is_admin: bool,
    published_at_ns: i64,
}

impl CommentDocument {
    fn from_comment(comment: &Comment) -> Self {
        Self {
            author: comment.author.clone(),
            email: comment.email.clone(),
            content: comment.content.clone(),
            owning_post_id: comment.post_id.clone(),
            is_admin: comment.is_admin,
            published_at_ns: comment.published_at.unix_timestamp_nanos() as i64,
        }
    }

    fn into_comment(self, id: String) -> Result<Comment, StoreError> {
        let published_at = OffsetDateTime::from_unix_timestamp_nanos(self.published_at_ns as i128)
            .map_err(|err| InfraError::corrupt(&id, err))?;
        Ok(Comment {
            id,
            post_id: self.owning_post_id,
            author: self.author,
            email: self.email,
            content: self.content,
            is_admin: self.is_admin,
            published_at,
        })
    }
}

/// Persists comments and serves them back ordered by publish time,
/// oldest first.
#[derive(Clone)]
pub struct CommentStore {
    docs: Arc<DocumentStore>,
}

impl CommentStore {
    pub fn new(docs: Arc<DocumentStore>) -> Self {
        Self { docs }
    }

    /// Persist one comment as a single document keyed by its id.
    pub async fn add(&self, comment: &Comment) -> Result<(), StoreError> {
        validate(comment)?;
        let document = serde_json::to_value(CommentDocument::from_comment(comment))?;
        self.docs.put(&comment.id, &document)?;
        counter!("foglio_comment_write_total").increment(1);
        debug!(comment_id = %comment.id, post_id = %comment.post_id, "stored comment");
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        if id.trim().is_empty() {
            return Err(DomainError::validation("comment id must not be empty").into());
        }
        self.docs.delete(id)?;
        debug!(comment_id = %id, "deleted comment");
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<Option<Comment>, StoreError> {
        let Some(value) = self.docs.get(id)? else {
            return Ok(None);
        };
        // A post document stored under this id is not a comment.
        if value.get(OWNING_POST_FIELD).is_none() {
            return Ok(None);
        }
        let document: CommentDocument = serde_json::from_value(value)?;
        document.into_comment(id.to_string()).map(Some)
    }

    /// All comments belonging to one post, oldest first.
    pub async fn list_for_post(&self, post_id: &str) -> Result<Vec<Comment>, StoreError> {
        let rows = self.docs.query(
            |doc| doc.get(OWNING_POST_FIELD).and_then(Value::as_str) == Some(post_id),
            publish_ticks,
            SortDirection::Ascending,
        )?;

        let mut comments = Vec::with_capacity(rows.len());
        for (id, value) in rows {
            let document: CommentDocument = serde_json::from_value(value)?;
            comments.push(document.into_comment(id)?);
        }
        Ok(comments)
    }

    /// Full-replace update: the old document is removed, the new one
    /// inserted. Never a field merge.
    pub async fn update(&self, comment: &Comment) -> Result<(), StoreError> {
        validate(comment)?;
        self.docs.delete(&comment.id)?;
        self.add(comment).await
    }
}

fn validate(comment: &Comment) -> Result<(), DomainError> {
    if comment.id.trim().is_empty() {
        return Err(DomainError::validation("comment id must not be empty"));
    }
    if comment.post_id.trim().is_empty() {
        return Err(DomainError::validation(
            "comment owning post id must not be empty",
        ));
    }
    Ok(())
}
