//! Blog domain entities and the rules that govern their visibility.

use serde::Serialize;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::domain::ids;

/// A published or draft blog post with its derived comment view.
///
/// The `comments` field is a refreshable projection of "all comments whose
/// owning post id equals this post's id", not a source of truth; the
/// comment store owns the documents themselves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    /// Assigned once at creation, immutable afterwards.
    pub id: String,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    /// Plain text in memory; persisted as a typed blob at the store boundary.
    pub content: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub comments: Vec<Comment>,
    pub published: bool,
    pub published_at: OffsetDateTime,
    pub last_modified_at: OffsetDateTime,
}

impl Post {
    /// Create a draft-ready post with a fresh tick-derived id.
    pub fn new(title: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: ids::next_post_id(),
            title: title.into(),
            slug: String::new(),
            excerpt: String::new(),
            content: String::new(),
            categories: Vec::new(),
            tags: Vec::new(),
            comments: Vec::new(),
            published: true,
            published_at: now,
            last_modified_at: now,
        }
    }

    /// The visibility rule: an admin may preview anything, an anonymous
    /// visitor sees only published posts whose publish time has passed.
    pub fn visible_to(&self, as_admin: bool, now: OffsetDateTime) -> bool {
        as_admin || (self.published && self.published_at <= now)
    }

    /// Whether the comment window is still open at `now`.
    pub fn comments_open(&self, close_after_days: i64, now: OffsetDateTime) -> bool {
        self.published_at + Duration::days(close_after_days) >= now
    }

    pub fn has_category(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c.eq_ignore_ascii_case(name))
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(name))
    }

    /// Site-relative permalink.
    pub fn link(&self) -> String {
        format!("/blog/{}/", self.slug)
    }

    /// Permalink with the slug percent-encoded for use in redirects.
    pub fn encoded_link(&self) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(self.slug.as_bytes()).collect();
        format!("/blog/{encoded}/")
    }
}

/// A reader comment. Comments reference their post by id and persist
/// independently of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub id: String,
    /// Foreign reference to the owning post, not an ownership relation.
    pub post_id: String,
    pub author: String,
    pub email: String,
    pub content: String,
    /// Set when the comment was submitted by an authenticated session.
    pub is_admin: bool,
    pub published_at: OffsetDateTime,
}

impl Comment {
    pub fn new(
        post_id: impl Into<String>,
        author: impl Into<String>,
        email: impl Into<String>,
        content: impl Into<String>,
        is_admin: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            post_id: post_id.into(),
            author: author.into(),
            email: email.into(),
            content: content.into(),
            is_admin,
            published_at: OffsetDateTime::now_utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn post_at(published: bool, published_at: OffsetDateTime) -> Post {
        let mut post = Post::new("Fixture");
        post.published = published;
        post.published_at = published_at;
        post
    }

    #[test]
    fn future_post_is_hidden_from_anonymous_regardless_of_published_flag() {
        let now = datetime!(2024-06-01 12:00 UTC);
        let future = datetime!(2024-06-02 12:00 UTC);
        assert!(!post_at(true, future).visible_to(false, now));
        assert!(!post_at(false, future).visible_to(false, now));
    }

    #[test]
    fn admin_sees_everything() {
        let now = datetime!(2024-06-01 12:00 UTC);
        let future = datetime!(2024-06-02 12:00 UTC);
        assert!(post_at(false, future).visible_to(true, now));
        assert!(post_at(true, now).visible_to(true, now));
    }

    #[test]
    fn published_past_post_is_visible_to_anonymous() {
        let now = datetime!(2024-06-01 12:00 UTC);
        let past = datetime!(2024-05-01 12:00 UTC);
        assert!(post_at(true, past).visible_to(false, now));
        assert!(!post_at(false, past).visible_to(false, now));
    }

    #[test]
    fn comment_window_closes_after_configured_days() {
        let published_at = datetime!(2024-06-01 12:00 UTC);
        let post = post_at(true, published_at);
        assert!(post.comments_open(10, datetime!(2024-06-11 11:00 UTC)));
        assert!(!post.comments_open(10, datetime!(2024-06-11 13:00 UTC)));
    }

    #[test]
    fn links_use_the_slug() {
        let mut post = Post::new("Linked");
        post.slug = "hello-world".to_string();
        assert_eq!(post.link(), "/blog/hello-world/");
        assert_eq!(post.encoded_link(), "/blog/hello-world/");
    }

    #[test]
    fn category_and_tag_matching_is_case_insensitive() {
        let mut post = Post::new("Labelled");
        post.categories = vec!["rust".to_string()];
        post.tags = vec!["storage".to_string()];
        assert!(post.has_category("Rust"));
        assert!(post.has_tag("STORAGE"));
        assert!(!post.has_category("go"));
    }

    #[test]
    fn fresh_comments_get_distinct_ids() {
        let a = Comment::new("1", "ada", "ada@example.com", "first", false);
        let b = Comment::new("1", "ada", "ada@example.com", "second", false);
        assert_ne!(a.id, b.id);
    }
}
