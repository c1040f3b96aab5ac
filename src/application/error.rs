//! Application-level error unification for the blog facade.

use thiserror::Error;

use crate::domain::error::DomainError;
use crate::domain::slug::SlugError;
use crate::infra::error::InfraError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum BlogError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Infra(#[from] InfraError),
}
