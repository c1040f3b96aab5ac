//! End-to-end facade tests over a temporary document store.

use std::sync::Arc;

use tempfile::TempDir;
use time::{Duration, OffsetDateTime};

use foglio::config::{BlogSettings, LoggingSettings};
use foglio::{Blog, BlogService, Comment, CommentStore, DocumentStore, Post, PostStore};

async fn service(dir: &TempDir) -> BlogService {
    let _ = foglio::infra::telemetry::init(&LoggingSettings::default());
    let docs = Arc::new(DocumentStore::open(dir.path()).expect("open store"));
    let comments = CommentStore::new(Arc::clone(&docs));
    let posts = PostStore::load(docs, comments.clone())
        .await
        .expect("load posts");
    BlogService::new(posts, comments, BlogSettings::default())
}

fn post_published(title: &str, minutes_ago: i64) -> Post {
    let mut post = Post::new(title);
    post.excerpt = format!("about {title}");
    post.content = format!("body of {title}");
    post.published_at = OffsetDateTime::now_utc() - Duration::minutes(minutes_ago);
    post
}

#[tokio::test]
async fn save_post_derives_a_slug_and_lists_the_post() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blog = service(&dir).await;

    let mut post = post_published("Hello World!", 5);
    blog.save_post(&mut post).await.expect("save");

    assert_eq!(post.slug, "hello-world");

    let listed = blog.posts(false).await.expect("posts");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "Hello World!");
    assert_eq!(listed[0].link(), "/blog/hello-world/");
}

#[tokio::test]
async fn slug_collisions_are_suffixed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blog = service(&dir).await;

    let mut first = post_published("Hello", 10);
    let mut second = post_published("Hello", 5);
    blog.save_post(&mut first).await.expect("save first");
    blog.save_post(&mut second).await.expect("save second");

    assert_eq!(first.slug, "hello");
    assert_eq!(second.slug, "hello-2");

    // Re-saving the same post keeps its slug instead of suffixing it.
    blog.save_post(&mut first).await.expect("resave");
    assert_eq!(first.slug, "hello");
}

#[tokio::test]
async fn future_and_unpublished_posts_are_admin_preview_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blog = service(&dir).await;

    let mut scheduled = post_published("Scheduled", 0);
    scheduled.published_at = OffsetDateTime::now_utc() + Duration::hours(1);
    let mut draft = post_published("Draft", 10);
    draft.published = false;
    let mut live = post_published("Live", 20);

    blog.save_post(&mut scheduled).await.expect("save");
    blog.save_post(&mut draft).await.expect("save");
    blog.save_post(&mut live).await.expect("save");

    let public: Vec<String> = blog
        .posts(false)
        .await
        .expect("posts")
        .into_iter()
        .map(|p| p.title)
        .collect();
    assert_eq!(public, ["Live"]);

    let admin: Vec<String> = blog
        .posts(true)
        .await
        .expect("posts")
        .into_iter()
        .map(|p| p.title)
        .collect();
    assert_eq!(admin, ["Scheduled", "Draft", "Live"]);

    assert!(
        blog.post_by_id(&scheduled.id, false)
            .await
            .expect("lookup")
            .is_none()
    );
    assert!(
        blog.post_by_id(&scheduled.id, true)
            .await
            .expect("lookup")
            .is_some()
    );
}

#[tokio::test]
async fn paging_skips_then_takes_over_the_ordered_sequence() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blog = service(&dir).await;

    for (title, minutes_ago) in [
        ("First", 50),
        ("Second", 40),
        ("Third", 30),
        ("Fourth", 20),
        ("Fifth", 10),
    ] {
        let mut post = post_published(title, minutes_ago);
        blog.save_post(&mut post).await.expect("save");
    }

    let page: Vec<String> = blog
        .posts_page(2, 1, false)
        .await
        .expect("page")
        .into_iter()
        .map(|p| p.title)
        .collect();
    assert_eq!(page, ["Fourth", "Third"]);

    assert!(blog.posts_page(2, 9, false).await.expect("page").is_empty());
    assert!(blog.posts_page(0, 0, false).await.expect("page").is_empty());

    // The default page size is what the presentation layer would ask for.
    let default_page = blog
        .posts_page(blog.settings().posts_per_page, 0, false)
        .await
        .expect("page");
    assert_eq!(default_page.len(), 4);
}

#[tokio::test]
async fn lookup_by_slug_is_case_insensitive_and_respects_visibility() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blog = service(&dir).await;

    let mut post = post_published("Mixed Case", 5);
    blog.save_post(&mut post).await.expect("save");

    let found = blog
        .post_by_slug("MIXED-case", false)
        .await
        .expect("lookup")
        .expect("present");
    assert_eq!(found.id, post.id);

    post.published = false;
    blog.save_post(&mut post).await.expect("unpublish");
    assert!(
        blog.post_by_slug("mixed-case", false)
            .await
            .expect("lookup")
            .is_none()
    );
    assert!(
        blog.post_by_slug("mixed-case", true)
            .await
            .expect("lookup")
            .is_some()
    );
}

#[tokio::test]
async fn category_and_tag_queries_are_case_insensitive_and_scoped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blog = service(&dir).await;

    let mut tagged = post_published("Tagged", 10);
    tagged.categories = vec!["Rust".to_string(), "Storage".to_string()];
    tagged.tags = vec!["sled".to_string(), "Caching".to_string()];
    blog.save_post(&mut tagged).await.expect("save");

    let mut hidden = post_published("Hidden", 5);
    hidden.published = false;
    hidden.categories = vec!["secret".to_string()];
    hidden.tags = vec!["internal".to_string()];
    blog.save_post(&mut hidden).await.expect("save");

    let by_category = blog
        .posts_by_category("RUST", false)
        .await
        .expect("by category");
    assert_eq!(by_category.len(), 1);
    assert_eq!(by_category[0].title, "Tagged");

    let by_tag = blog.posts_by_tag("SLED", false).await.expect("by tag");
    assert_eq!(by_tag.len(), 1);

    // Labels are normalized at save time and listed sorted, visible-only.
    assert_eq!(
        blog.categories(false).await.expect("categories"),
        ["rust", "storage"]
    );
    assert_eq!(
        blog.categories(true).await.expect("categories"),
        ["rust", "secret", "storage"]
    );
    assert_eq!(blog.tags(false).await.expect("tags"), ["caching", "sled"]);
    assert_eq!(
        blog.tags(true).await.expect("tags"),
        ["caching", "internal", "sled"]
    );
}

#[tokio::test]
async fn comments_flow_through_store_and_cache_in_canonical_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blog = service(&dir).await;

    let mut post = post_published("Discussed", 30);
    blog.save_post(&mut post).await.expect("save");

    let mut early = Comment::new("", "ada", "ada@example.com", "early", false);
    early.published_at = OffsetDateTime::now_utc() - Duration::minutes(20);
    let mut late = Comment::new("", "brian", "brian@example.com", "late", true);
    late.published_at = OffsetDateTime::now_utc() - Duration::minutes(5);

    blog.add_comment(&post.id, late.clone()).await.expect("add");
    blog.add_comment(&post.id, early.clone()).await.expect("add");

    let loaded = blog
        .post_by_id(&post.id, false)
        .await
        .expect("lookup")
        .expect("present");
    let contents: Vec<&str> = loaded.comments.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(contents, ["early", "late"]);
    assert!(loaded.comments[1].is_admin);

    let removed = loaded.comments[0].clone();
    blog.delete_comment(&post.id, &removed)
        .await
        .expect("delete comment");
    let remaining = blog
        .post_by_id(&post.id, false)
        .await
        .expect("lookup")
        .expect("present");
    assert_eq!(remaining.comments.len(), 1);
    assert_eq!(remaining.comments[0].content, "late");
}

#[tokio::test]
async fn cached_comment_list_matches_the_comment_store_after_a_save() {
    let dir = tempfile::tempdir().expect("tempdir");
    let docs = Arc::new(DocumentStore::open(dir.path()).expect("open store"));
    let comments = CommentStore::new(Arc::clone(&docs));
    let posts = PostStore::load(Arc::clone(&docs), comments.clone())
        .await
        .expect("load posts");
    let blog = BlogService::new(posts, comments.clone(), BlogSettings::default());

    let mut post = post_published("Audited", 30);
    blog.save_post(&mut post).await.expect("save");
    blog.add_comment(&post.id, Comment::new("", "ada", "a@example.com", "one", false))
        .await
        .expect("add");

    // A comment written behind the facade's back becomes visible after the
    // save-triggered refresh.
    comments
        .add(&Comment::new(&post.id, "eve", "e@example.com", "two", false))
        .await
        .expect("direct add");
    blog.save_post(&mut post).await.expect("resave");

    let cached = blog
        .post_by_id(&post.id, false)
        .await
        .expect("lookup")
        .expect("present");
    let direct = comments.list_for_post(&post.id).await.expect("list");
    assert_eq!(cached.comments, direct);
    assert_eq!(cached.comments.len(), 2);
}

#[tokio::test]
async fn delete_post_removes_it_from_listing_and_lookup() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blog = service(&dir).await;

    let mut post = post_published("Doomed", 10);
    blog.save_post(&mut post).await.expect("save");
    blog.delete_post(&post).await.expect("delete");

    assert!(blog.posts(true).await.expect("posts").is_empty());
    assert!(
        blog.post_by_id(&post.id, true)
            .await
            .expect("lookup")
            .is_none()
    );
}

#[tokio::test]
async fn comment_window_follows_the_configured_close_after_days() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blog = service(&dir).await;

    let mut open = post_published("Fresh", 10);
    blog.save_post(&mut open).await.expect("save");

    let mut closed = post_published("Stale", 10);
    closed.published_at = OffsetDateTime::now_utc() - Duration::days(30);
    blog.save_post(&mut closed).await.expect("save");

    assert_eq!(blog.comments_open(&open.id).await.expect("open"), Some(true));
    assert_eq!(
        blog.comments_open(&closed.id).await.expect("open"),
        Some(false)
    );
    assert_eq!(blog.comments_open("missing").await.expect("open"), None);
}

#[tokio::test]
async fn everything_survives_a_process_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (post_id, comment_id) = {
        let blog = service(&dir).await;
        let mut post = post_published("Persistent", 10);
        post.content = "Crème brûlée at 3 €, naïve résumé ☕".to_string();
        blog.save_post(&mut post).await.expect("save");

        let comment = Comment::new("", "ada", "a@example.com", "kept", false);
        blog.add_comment(&post.id, comment.clone())
            .await
            .expect("add");
        (post.id.clone(), comment.id.clone())
    };

    let blog = service(&dir).await;
    let loaded = blog
        .post_by_id(&post_id, false)
        .await
        .expect("lookup")
        .expect("present");
    assert_eq!(loaded.content, "Crème brûlée at 3 €, naïve résumé ☕");
    assert_eq!(loaded.comments.len(), 1);
    assert_eq!(loaded.comments[0].id, comment_id);
}
