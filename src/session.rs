//! Per-request storage session scoping.
//!
//! [`SessionScope::run`] opens one session, lends it to the request's work and
//! closes it when the work resolves, on success and on every error path. If
//! the request future is dropped mid-flight, the session's own `Drop` releases
//! it instead.

use std::{future::Future, pin::Pin, sync::Arc};
use tracing::{debug, warn};

use crate::{
    advertisement::AdvError,
    store::{Session, Store},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Cloneable handle to the process-wide store, shared by all requests.
#[derive(Clone)]
pub struct SessionScope {
    store: Arc<dyn Store>,
}

impl SessionScope {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Run `work` with a fresh session.
    ///
    /// ```ignore
    /// scope.run(move |session| Box::pin(advertisement::get(session, id))).await
    /// ```
    /// # Errors
    /// Returns `Unrecoverable` if no session can be opened, otherwise whatever
    /// `work` returns.
    pub async fn run<T, F>(&self, work: F) -> Result<T, AdvError>
    where
        F: for<'s> FnOnce(&'s mut (dyn Session + 'static)) -> BoxFuture<'s, Result<T, AdvError>>,
    {
        let mut session = self.store.open().await?;
        debug!("storage session opened");

        let outcome = work(session.as_mut()).await;

        match session.close().await {
            Ok(()) => debug!(ok = outcome.is_ok(), "storage session released"),
            Err(err) => warn!("failed to release storage session: {err}"),
        }

        outcome
    }
}

impl std::fmt::Debug for SessionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionScope").finish_non_exhaustive()
    }
}
