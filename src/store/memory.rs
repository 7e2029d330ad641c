//! In-process gateway with the same unit-of-work semantics as `PostgreSQL`.
//!
//! Ids come from a sequence that never rewinds (like `BIGSERIAL`), titles are
//! checked for uniqueness when an insert is staged and again at commit, and a
//! session only publishes its writes on commit. A staged delete whose record
//! another session removed first fails the commit, where `PostgreSQL` would
//! report zero affected rows. The store also counts opened
//! and released sessions so callers can assert that nothing leaks.

use async_trait::async_trait;
use chrono::Utc;
use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicI64, AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard,
    },
};
use tracing::{debug, instrument};

use super::{Advertisement, NewAdvertisement, Session, Store, StoreError};

const TITLE_CONSTRAINT: &str = "app_advertisements_title_key";

#[derive(Debug, Default)]
struct Shared {
    records: Mutex<BTreeMap<i64, Advertisement>>,
    next_id: AtomicI64,
    opened: AtomicUsize,
    released: AtomicUsize,
}

impl Shared {
    fn records(&self) -> Result<MutexGuard<'_, BTreeMap<i64, Advertisement>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

/// Cloneable handle; clones share the same records and counters.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions opened and not yet released.
    #[must_use]
    pub fn open_sessions(&self) -> usize {
        self.opened_sessions()
            .saturating_sub(self.released_sessions())
    }

    #[must_use]
    pub fn opened_sessions(&self) -> usize {
        self.shared.opened.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn released_sessions(&self) -> usize {
        self.shared.released.load(Ordering::SeqCst)
    }

    /// Committed records, ordered by id.
    #[must_use]
    pub fn records(&self) -> Vec<Advertisement> {
        self.shared
            .records()
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of committed records carrying `title`.
    #[must_use]
    pub fn count_title(&self, title: &str) -> usize {
        self.records()
            .iter()
            .filter(|record| record.title == title)
            .count()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn open(&self) -> Result<Box<dyn Session>, StoreError> {
        self.shared.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySession {
            shared: Arc::clone(&self.shared),
            staged: Vec::new(),
            closed: false,
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.shared.records().map(|_| ())
    }

    async fn close(&self) {
        debug!("memory store closed");
    }
}

#[derive(Debug)]
enum Staged {
    Insert(Advertisement),
    Delete(i64),
}

#[derive(Debug)]
struct MemorySession {
    shared: Arc<Shared>,
    staged: Vec<Staged>,
    closed: bool,
}

impl MemorySession {
    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }

    /// Committed records overlaid with this session's staged writes.
    fn view(&self) -> Result<BTreeMap<i64, Advertisement>, StoreError> {
        let mut view = self.shared.records()?.clone();
        apply(&mut view, &self.staged);
        Ok(view)
    }

    fn release(&mut self) {
        if !self.closed {
            self.closed = true;
            self.staged.clear();
            self.shared.released.fetch_add(1, Ordering::SeqCst);
        }
    }
}

fn apply(records: &mut BTreeMap<i64, Advertisement>, staged: &[Staged]) {
    for change in staged {
        match change {
            Staged::Insert(record) => {
                records.insert(record.id, record.clone());
            }
            Staged::Delete(id) => {
                records.remove(id);
            }
        }
    }
}

fn title_taken(records: &BTreeMap<i64, Advertisement>, title: &str) -> bool {
    records.values().any(|record| record.title == title)
}

#[async_trait]
impl Session for MemorySession {
    async fn find(&mut self, id: i64) -> Result<Option<Advertisement>, StoreError> {
        self.ensure_open()?;
        Ok(self.view()?.remove(&id))
    }

    #[instrument(skip(self, new), fields(title = %new.title))]
    async fn insert(&mut self, new: &NewAdvertisement) -> Result<Advertisement, StoreError> {
        self.ensure_open()?;
        if title_taken(&self.view()?, &new.title) {
            return Err(StoreError::UniqueViolation(TITLE_CONSTRAINT.to_string()));
        }

        let record = Advertisement {
            id: self.shared.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            title: new.title.clone(),
            description: new.description.clone(),
            user: new.user.clone(),
            creation_date: Utc::now(),
        };
        self.staged.push(Staged::Insert(record.clone()));

        Ok(record)
    }

    async fn delete(&mut self, id: i64) -> Result<bool, StoreError> {
        self.ensure_open()?;
        if !self.view()?.contains_key(&id) {
            return Ok(false);
        }
        self.staged.push(Staged::Delete(id));

        Ok(true)
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        let staged = std::mem::take(&mut self.staged);
        let mut records = self.shared.records()?;

        let mut next = records.clone();
        for change in &staged {
            match change {
                // Another session committed the same title first.
                Staged::Insert(record) if title_taken(&next, &record.title) => {
                    return Err(StoreError::UniqueViolation(TITLE_CONSTRAINT.to_string()));
                }
                Staged::Delete(id) if !next.contains_key(id) => {
                    return Err(StoreError::Vanished(*id));
                }
                _ => {}
            }
            apply(&mut next, std::slice::from_ref(change));
        }
        *records = next;

        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.staged.clear();

        Ok(())
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.release();

        Ok(())
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.release();
    }
}
