use async_trait::async_trait;

use super::{Session, Store, StoreError};

/// A store whose pool never hands out a connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableStore;

#[async_trait]
impl Store for UnavailableStore {
    async fn open(&self) -> Result<Box<dyn Session>, StoreError> {
        Err(StoreError::Unavailable("pool timed out".to_string()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("pool timed out".to_string()))
    }

    async fn close(&self) {}
}
