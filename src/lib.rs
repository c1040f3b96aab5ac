//! Foglio: an embedded blog content store.
//!
//! Posts and threaded comments are persisted as single documents in an
//! embedded store, and served from an immutable in-memory snapshot that is
//! rebuilt off to the side and republished with one atomic reference swap
//! after every confirmed write. The [`Blog`] facade applies the visibility
//! rule (admin preview versus published-and-reached) uniformly across all
//! queries; presentation concerns such as routing, authentication and
//! response caching live outside this crate and consume the facade.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod store;

pub use application::blog::{Blog, BlogService};
pub use application::error::BlogError;
pub use config::Settings;
pub use domain::entities::{Comment, Post};
pub use domain::slug::{generate_unique_slug, slugify};
pub use infra::db::{DocumentStore, SortDirection};
pub use store::{CommentStore, PostStore, StoreError};
