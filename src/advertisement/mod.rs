//! Advertisement domain operations.
//!
//! `service` holds create/get/delete. Each takes the request's storage session
//! and returns either a record or an [`AdvError`]. Nothing here knows about
//! HTTP status codes; `api::error` does the mapping.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::{schema::ValidationFailure, store::StoreError};

pub mod service;

pub use self::service::{create, delete, get};

pub const ALREADY_EXISTS: &str = "advertisement already exists";
pub const STATUS_DELETED: &str = "deleted";

/// Body returned by a successful delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Deleted {
    pub title: String,
    pub status: String,
}

impl Deleted {
    #[must_use]
    pub fn new(title: String) -> Self {
        Self {
            title,
            status: STATUS_DELETED.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AdvError {
    #[error("validation failed: {}", .0.msg)]
    Validation(ValidationFailure),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("{0}")]
    NotFound(String),

    #[error("unrecoverable: {0}")]
    Unrecoverable(#[source] anyhow::Error),
}

impl AdvError {
    #[must_use]
    pub fn not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("Advertisement {id} is not found"))
    }
}

impl From<ValidationFailure> for AdvError {
    fn from(failure: ValidationFailure) -> Self {
        Self::Validation(failure)
    }
}

impl From<StoreError> for AdvError {
    fn from(err: StoreError) -> Self {
        Self::Unrecoverable(err.into())
    }
}
