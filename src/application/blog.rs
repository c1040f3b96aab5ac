//! The blog facade: visibility-filtered queries over the cached snapshot,
//! and the writes that keep the snapshot and the document store mutually
//! consistent.
//!
//! Reads never touch the document store. Every read takes the caller's
//! admin status explicitly; neither the facade nor the stores know anything
//! about requests or sessions.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tracing::info;

use crate::config::{BlogSettings, Settings};
use crate::domain::entities::{Comment, Post};
use crate::domain::error::DomainError;
use crate::domain::slug::generate_unique_slug;
use crate::infra::db::DocumentStore;
use crate::store::{CommentStore, PostStore};

use super::error::BlogError;

/// Query and mutation surface consumed by the presentation layer.
#[async_trait]
pub trait Blog: Send + Sync {
    /// All visible posts, newest first.
    async fn posts(&self, as_admin: bool) -> Result<Vec<Post>, BlogError>;

    /// One page of visible posts: `skip`, then at most `count`.
    async fn posts_page(
        &self,
        count: usize,
        skip: usize,
        as_admin: bool,
    ) -> Result<Vec<Post>, BlogError>;

    /// Case-insensitive lookup by id; an invisible match is "not found".
    async fn post_by_id(&self, id: &str, as_admin: bool) -> Result<Option<Post>, BlogError>;

    /// Case-insensitive lookup by slug; an invisible match is "not found".
    async fn post_by_slug(&self, slug: &str, as_admin: bool) -> Result<Option<Post>, BlogError>;

    async fn posts_by_category(
        &self,
        category: &str,
        as_admin: bool,
    ) -> Result<Vec<Post>, BlogError>;

    async fn posts_by_tag(&self, tag: &str, as_admin: bool) -> Result<Vec<Post>, BlogError>;

    /// Distinct lowercase category names across visible posts, sorted.
    async fn categories(&self, as_admin: bool) -> Result<Vec<String>, BlogError>;

    /// Distinct lowercase tag names across visible posts, sorted.
    async fn tags(&self, as_admin: bool) -> Result<Vec<String>, BlogError>;

    async fn save_post(&self, post: &mut Post) -> Result<(), BlogError>;

    async fn delete_post(&self, post: &Post) -> Result<(), BlogError>;

    async fn add_comment(&self, post_id: &str, comment: Comment) -> Result<(), BlogError>;

    async fn delete_comment(&self, post_id: &str, comment: &Comment) -> Result<(), BlogError>;
}

/// The content store behind every blog page.
pub struct BlogService {
    posts: PostStore,
    comments: CommentStore,
    settings: BlogSettings,
}

impl BlogService {
    /// Open the document store at the configured directory and load the
    /// initial snapshot.
    pub async fn open(settings: &Settings) -> Result<Self, BlogError> {
        let docs = Arc::new(DocumentStore::open(&settings.database.directory)?);
        let comments = CommentStore::new(Arc::clone(&docs));
        let posts = PostStore::load(docs, comments.clone()).await?;
        Ok(Self::new(posts, comments, settings.blog.clone()))
    }

    pub fn new(posts: PostStore, comments: CommentStore, settings: BlogSettings) -> Self {
        Self {
            posts,
            comments,
            settings,
        }
    }

    pub fn settings(&self) -> &BlogSettings {
        &self.settings
    }

    /// Whether the comment window for a post is still open; `None` when the
    /// post does not exist. The accept/reject decision belongs to the
    /// caller.
    pub async fn comments_open(&self, post_id: &str) -> Result<Option<bool>, BlogError> {
        let post = self.posts.get(post_id).await?;
        Ok(post.map(|p| {
            p.comments_open(
                self.settings.comments_close_after_days,
                OffsetDateTime::now_utc(),
            )
        }))
    }

    async fn visible_posts<F>(&self, as_admin: bool, keep: F) -> Result<Vec<Post>, BlogError>
    where
        F: Fn(&Post) -> bool,
    {
        let now = OffsetDateTime::now_utc();
        let snapshot = self.posts.list(false).await?;
        Ok(snapshot
            .iter()
            .filter(|post| post.visible_to(as_admin, now) && keep(post))
            .cloned()
            .collect())
    }

    fn labels<F>(&self, snapshot: &[Post], as_admin: bool, pick: F) -> Vec<String>
    where
        F: Fn(&Post) -> &[String],
    {
        let now = OffsetDateTime::now_utc();
        let mut distinct = BTreeSet::new();
        for post in snapshot.iter().filter(|post| post.visible_to(as_admin, now)) {
            for label in pick(post) {
                distinct.insert(label.to_lowercase());
            }
        }
        distinct.into_iter().collect()
    }
}

#[async_trait]
impl Blog for BlogService {
    async fn posts(&self, as_admin: bool) -> Result<Vec<Post>, BlogError> {
        self.visible_posts(as_admin, |_| true).await
    }

    async fn posts_page(
        &self,
        count: usize,
        skip: usize,
        as_admin: bool,
    ) -> Result<Vec<Post>, BlogError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let now = OffsetDateTime::now_utc();
        let snapshot = self.posts.list(false).await?;
        Ok(snapshot
            .iter()
            .filter(|post| post.visible_to(as_admin, now))
            .skip(skip)
            .take(count)
            .cloned()
            .collect())
    }

    async fn post_by_id(&self, id: &str, as_admin: bool) -> Result<Option<Post>, BlogError> {
        let now = OffsetDateTime::now_utc();
        let Some(post) = self.posts.get(id).await? else {
            return Ok(None);
        };
        Ok(post.visible_to(as_admin, now).then_some(post))
    }

    async fn post_by_slug(&self, slug: &str, as_admin: bool) -> Result<Option<Post>, BlogError> {
        let id = {
            let snapshot = self.posts.list(false).await?;
            match snapshot
                .iter()
                .find(|post| post.slug.eq_ignore_ascii_case(slug))
            {
                Some(post) => post.id.clone(),
                None => return Ok(None),
            }
        };
        self.post_by_id(&id, as_admin).await
    }

    async fn posts_by_category(
        &self,
        category: &str,
        as_admin: bool,
    ) -> Result<Vec<Post>, BlogError> {
        self.visible_posts(as_admin, |post| post.has_category(category))
            .await
    }

    async fn posts_by_tag(&self, tag: &str, as_admin: bool) -> Result<Vec<Post>, BlogError> {
        self.visible_posts(as_admin, |post| post.has_tag(tag)).await
    }

    async fn categories(&self, as_admin: bool) -> Result<Vec<String>, BlogError> {
        let snapshot = self.posts.list(false).await?;
        Ok(self.labels(&snapshot, as_admin, |post| &post.categories))
    }

    async fn tags(&self, as_admin: bool) -> Result<Vec<String>, BlogError> {
        let snapshot = self.posts.list(false).await?;
        Ok(self.labels(&snapshot, as_admin, |post| &post.tags))
    }

    async fn save_post(&self, post: &mut Post) -> Result<(), BlogError> {
        if post.id.trim().is_empty() {
            return Err(DomainError::validation("post id must not be empty").into());
        }
        if post.title.trim().is_empty() {
            return Err(DomainError::validation("post title must not be empty").into());
        }

        post.last_modified_at = OffsetDateTime::now_utc();
        normalize_labels(&mut post.categories);
        normalize_labels(&mut post.tags);

        // Derive the slug from the title when the editor supplied none, and
        // suffix until it is unique among the other live posts.
        let source = if post.slug.trim().is_empty() {
            post.title.clone()
        } else {
            post.slug.clone()
        };
        let taken: Vec<String> = {
            let snapshot = self.posts.list(false).await?;
            snapshot
                .iter()
                .filter(|existing| existing.id != post.id)
                .map(|existing| existing.slug.to_lowercase())
                .collect()
        };
        post.slug = generate_unique_slug(&source, |candidate| {
            !taken.iter().any(|slug| slug == candidate)
        })?;

        self.posts.upsert(post).await?;
        self.posts.list(true).await?;
        info!(post_id = %post.id, slug = %post.slug, "saved post");
        Ok(())
    }

    async fn delete_post(&self, post: &Post) -> Result<(), BlogError> {
        self.posts.delete(&post.id).await?;
        self.posts.list(true).await?;
        info!(post_id = %post.id, "deleted post");
        Ok(())
    }

    async fn add_comment(&self, post_id: &str, mut comment: Comment) -> Result<(), BlogError> {
        if post_id.trim().is_empty() {
            return Err(DomainError::validation("post id must not be empty").into());
        }

        comment.post_id = post_id.to_string();
        self.comments.add(&comment).await?;
        // Only a confirmed write reaches the cache.
        self.posts.attach_comment(post_id, comment);
        Ok(())
    }

    async fn delete_comment(&self, post_id: &str, comment: &Comment) -> Result<(), BlogError> {
        self.comments.delete(&comment.id).await?;
        self.posts.detach_comment(post_id, &comment.id);
        Ok(())
    }
}

/// Categories and tags are kept as trimmed, lowercase, first-occurrence
/// ordered sets.
fn normalize_labels(labels: &mut Vec<String>) {
    let mut seen = BTreeSet::new();
    let mut normalized = Vec::with_capacity(labels.len());
    for label in labels.iter() {
        let cleaned = label.trim().to_lowercase();
        if !cleaned.is_empty() && seen.insert(cleaned.clone()) {
            normalized.push(cleaned);
        }
    }
    *labels = normalized;
}
