//! HTTP handlers.
//!
//! Advertisement handlers only decode the request and hand the work to
//! `SessionScope::run`; the domain logic lives in `crate::advertisement`.

pub mod adv;
pub mod health;
