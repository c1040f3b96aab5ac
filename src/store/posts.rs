//! Post persistence and the atomically published in-memory index.
//!
//! Reads never touch the document store: they clone an `Arc` snapshot of
//! the full post list. Every mutation rebuilds the list off to the side and
//! publishes it with a single reference swap, so a concurrent reader sees
//! either the old or the new list in full, never an intermediate state.

use std::sync::{Arc, RwLock};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use metrics::{counter, gauge};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::domain::entities::{Comment, Post};
use crate::domain::error::DomainError;
use crate::infra::db::{DocumentStore, SortDirection};
use crate::infra::error::InfraError;

use super::lock::{rw_read, rw_write};
use super::{CommentStore, StoreError, publish_ticks};

const SOURCE: &str = "store::posts";
const CONTENT_MEDIA_TYPE: &str = "text/plain";

/// Post body as persisted: a typed binary payload. Encoding happens only
/// here, at the serialization boundary; in memory the body is plain text.
#[derive(Debug, Serialize, Deserialize)]
struct ContentBlob {
    media_type: String,
    data: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct PostDocument {
    title: String,
    slug: String,
    excerpt: String,
    content: ContentBlob,
    published: bool,
    published_at_ns: i64,
    last_modified_at_ns: i64,
    categories: Vec<String>,
    tags: Vec<String>,
}

impl PostDocument {
    fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            slug: post.slug.clone(),
            excerpt: post.excerpt.clone(),
            content: ContentBlob {
                media_type: CONTENT_MEDIA_TYPE.to_string(),
                data: BASE64.encode(post.content.as_bytes()),
            },
            published: post.published,
            published_at_ns: post.published_at.unix_timestamp_nanos() as i64,
            last_modified_at_ns: post.last_modified_at.unix_timestamp_nanos() as i64,
            categories: post.categories.clone(),
            tags: post.tags.clone(),
        }
    }

    fn into_post(self, id: String, comments: Vec<Comment>) -> Result<Post, StoreError> {
        let raw = BASE64
            .decode(self.content.data.as_bytes())
            .map_err(|err| InfraError::corrupt(&id, err))?;
        let content = String::from_utf8(raw).map_err(|err| InfraError::corrupt(&id, err))?;
        let published_at = OffsetDateTime::from_unix_timestamp_nanos(self.published_at_ns as i128)
            .map_err(|err| InfraError::corrupt(&id, err))?;
        let last_modified_at =
            OffsetDateTime::from_unix_timestamp_nanos(self.last_modified_at_ns as i128)
                .map_err(|err| InfraError::corrupt(&id, err))?;

        Ok(Post {
            id,
            title: self.title,
            slug: self.slug,
            excerpt: self.excerpt,
            content,
            categories: self.categories,
            tags: self.tags,
            comments,
            published: self.published,
            published_at,
            last_modified_at,
        })
    }
}

/// Persists posts and maintains the in-memory index joined with comments,
/// newest first.
pub struct PostStore {
    docs: Arc<DocumentStore>,
    comments: CommentStore,
    snapshot: RwLock<Arc<Vec<Post>>>,
}

impl PostStore {
    /// Load every post document, join each with its comments, and publish
    /// the initial snapshot in descending publish order.
    pub async fn load(docs: Arc<DocumentStore>, comments: CommentStore) -> Result<Self, StoreError> {
        let rows = docs.query(is_post_document, publish_ticks, SortDirection::Descending)?;

        let mut posts = Vec::with_capacity(rows.len());
        for (id, value) in rows {
            let document: PostDocument = serde_json::from_value(value)?;
            let list = comments.list_for_post(&id).await?;
            posts.push(document.into_post(id, list)?);
        }
        info!(posts = posts.len(), "loaded post index from document store");

        let store = Self {
            docs,
            comments,
            snapshot: RwLock::new(Arc::new(Vec::new())),
        };
        store.publish(posts);
        Ok(store)
    }

    /// Current snapshot. The returned `Arc` stays intact across concurrent
    /// republishes.
    pub fn snapshot(&self) -> Arc<Vec<Post>> {
        rw_read(&self.snapshot, SOURCE, "snapshot").clone()
    }

    /// Write the whole post document, then republish the index with the
    /// descending publish-order invariant intact.
    pub async fn upsert(&self, post: &Post) -> Result<(), StoreError> {
        if post.id.trim().is_empty() {
            return Err(DomainError::validation("post id must not be empty").into());
        }

        let document = serde_json::to_value(PostDocument::from_post(post))?;
        self.docs.put(&post.id, &document)?;
        counter!("foglio_post_write_total").increment(1);

        let current = self.snapshot();
        let mut next: Vec<Post> = current
            .iter()
            .filter(|existing| existing.id != post.id)
            .cloned()
            .collect();
        next.push(post.clone());
        next.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        self.publish(next);

        debug!(post_id = %post.id, slug = %post.slug, "upserted post");
        Ok(())
    }

    /// Remove the document and the index entry.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        if id.trim().is_empty() {
            return Err(DomainError::validation("post id must not be empty").into());
        }

        self.docs.delete(id)?;

        let next: Vec<Post> = self
            .snapshot()
            .iter()
            .filter(|existing| existing.id != id)
            .cloned()
            .collect();
        self.publish(next);

        debug!(post_id = %id, "deleted post");
        Ok(())
    }

    /// Fetch one post by id (case-insensitive) with its comment list
    /// freshly reloaded, so the caller never sees a list that is stale
    /// relative to the comment store.
    pub async fn get(&self, id: &str) -> Result<Option<Post>, StoreError> {
        let Some(mut post) = self
            .snapshot()
            .iter()
            .find(|candidate| candidate.id.eq_ignore_ascii_case(id))
            .cloned()
        else {
            return Ok(None);
        };

        post.comments = self.comments.list_for_post(&post.id).await?;
        Ok(Some(post))
    }

    /// The cached post list. With `force_refresh` every post's comment list
    /// is reloaded from the comment store first; this is the sole coherency
    /// mechanism between comment mutations and post reads.
    pub async fn list(&self, force_refresh: bool) -> Result<Arc<Vec<Post>>, StoreError> {
        if force_refresh {
            let current = self.snapshot();
            let mut next = Vec::with_capacity(current.len());
            for post in current.iter() {
                let mut refreshed = post.clone();
                refreshed.comments = self.comments.list_for_post(&refreshed.id).await?;
                next.push(refreshed);
            }
            self.publish(next);
            counter!("foglio_snapshot_refresh_total").increment(1);
        }
        Ok(self.snapshot())
    }

    /// Splice a confirmed-persisted comment into the cached post, keeping
    /// oldest-first order. A miss is harmless; the next forced refresh
    /// converges the view.
    pub fn attach_comment(&self, post_id: &str, comment: Comment) {
        let mut next = self.snapshot().as_ref().clone();
        if let Some(post) = next.iter_mut().find(|candidate| candidate.id == post_id) {
            let at = post
                .comments
                .partition_point(|existing| existing.published_at <= comment.published_at);
            post.comments.insert(at, comment);
            self.publish(next);
        }
    }

    /// Drop a comment from the cached post after a confirmed store delete.
    pub fn detach_comment(&self, post_id: &str, comment_id: &str) {
        let mut next = self.snapshot().as_ref().clone();
        if let Some(post) = next.iter_mut().find(|candidate| candidate.id == post_id) {
            post.comments.retain(|existing| existing.id != comment_id);
            self.publish(next);
        }
    }

    fn publish(&self, posts: Vec<Post>) {
        gauge!("foglio_snapshot_posts").set(posts.len() as f64);
        *rw_write(&self.snapshot, SOURCE, "publish") = Arc::new(posts);
    }
}

fn is_post_document(document: &Value) -> bool {
    document.get("title").is_some_and(|title| !title.is_null())
}
