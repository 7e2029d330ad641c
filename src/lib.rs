//! # Adverts (Advertisement board API)
//!
//! `adverts` is a small HTTP service that creates, fetches and deletes
//! advertisements stored in PostgreSQL.
//!
//! ## Request lifecycle
//!
//! Every advertisement request runs inside a [`session::SessionScope`]: one
//! storage session is opened before the handler runs, handed to it as an
//! explicit argument and released exactly once afterwards, whatever the outcome.
//!
//! - **Validation:** payloads are checked against an explicit field list
//!   ([`schema::CREATE_ADVERTISEMENT`]); unknown fields are dropped.
//! - **Uniqueness:** `title` is unique in the store. A second insert with the
//!   same title rolls back and is reported as a conflict.
//! - **Errors:** handlers return [`advertisement::AdvError`]; the API layer maps
//!   each variant to a status code and the `{"status": "error", "message": ...}`
//!   envelope.

pub mod advertisement;
pub mod api;
pub mod cli;
pub mod schema;
pub mod session;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
