use crate::{
    document::Document,
    storage::{StorageError, StoragePort, StoredDocument, WriteMode},
    types::{EntryId, Revision},
};
use async_trait::async_trait;
use std::{
    collections::BTreeMap,
    marker::PhantomData,
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

///
/// Row
///
/// One JSON-encoded document plus its revision and tombstone flag.
///

#[derive(Clone, Debug)]
struct Row {
    json: Vec<u8>,
    revision: Revision,
    removed: bool,
}

///
/// StoreStats
///
/// Call counters, mainly for asserting how often the pipeline touched
/// storage.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StoreStats {
    pub loads: u64,
    pub saves: u64,
    pub removes: u64,
}

///
/// MemoryStore
///
/// Process-local storage port. Rows are kept as JSON bytes so every load
/// returns a freshly decoded value, like a JSON column would.
///

pub struct MemoryStore<D> {
    rows: Mutex<BTreeMap<EntryId, Row>>,
    loads: AtomicU64,
    saves: AtomicU64,
    removes: AtomicU64,
    _marker: PhantomData<fn() -> D>,
}

impl<D: Document> MemoryStore<D> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rows: Mutex::new(BTreeMap::new()),
            loads: AtomicU64::new(0),
            saves: AtomicU64::new(0),
            removes: AtomicU64::new(0),
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            loads: self.loads.load(Ordering::SeqCst),
            saves: self.saves.load(Ordering::SeqCst),
            removes: self.removes.load(Ordering::SeqCst),
        }
    }

    /// Number of live (non-tombstoned) entries.
    #[must_use]
    pub fn live_len(&self) -> usize {
        self.rows().values().filter(|row| !row.removed).count()
    }

    /// Current revision of an entry, tombstoned or not.
    #[must_use]
    pub fn revision(&self, entry_id: &EntryId) -> Option<Revision> {
        self.rows().get(entry_id).map(|row| row.revision)
    }

    /// Seed an entry directly, bypassing the counters.
    pub fn seed(&self, entry_id: impl Into<EntryId>, document: &D) -> Result<(), StorageError> {
        let json = encode(document)?;
        self.rows().insert(
            entry_id.into(),
            Row {
                json,
                revision: Revision::INITIAL,
                removed: false,
            },
        );

        Ok(())
    }

    fn rows(&self) -> std::sync::MutexGuard<'_, BTreeMap<EntryId, Row>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<D: Document> Default for MemoryStore<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<D: Document> StoragePort<D> for MemoryStore<D> {
    async fn load(&self, entry_id: &EntryId) -> Result<StoredDocument<D>, StorageError> {
        self.loads.fetch_add(1, Ordering::SeqCst);

        let rows = self.rows();
        let row = rows
            .get(entry_id)
            .filter(|row| !row.removed)
            .ok_or_else(|| StorageError::NotFound {
                entry_id: entry_id.clone(),
            })?;

        let document = serde_json::from_slice(&row.json)
            .map_err(|err| StorageError::io(format!("decode {entry_id}: {err}")))?;

        Ok(StoredDocument {
            document,
            revision: row.revision,
        })
    }

    async fn save(
        &self,
        entry_id: &EntryId,
        document: &D,
        mode: WriteMode,
    ) -> Result<EntryId, StorageError> {
        self.saves.fetch_add(1, Ordering::SeqCst);

        let json = encode(document)?;
        let mut rows = self.rows();
        let live = rows.get(entry_id).filter(|row| !row.removed);

        let revision = match (mode, live) {
            (WriteMode::Insert, Some(_)) => {
                return Err(StorageError::conflict(format!(
                    "entry {entry_id} already exists"
                )));
            }
            (WriteMode::Insert, None) => rows
                .get(entry_id)
                .map_or(Revision::INITIAL, |row| row.revision.next()),
            (WriteMode::Update { .. }, None) => {
                return Err(StorageError::NotFound {
                    entry_id: entry_id.clone(),
                });
            }
            (WriteMode::Update { expected }, Some(row)) => {
                if let Some(expected) = expected
                    && expected != row.revision
                {
                    return Err(StorageError::conflict(format!(
                        "entry {entry_id} is at revision {}, expected {expected}",
                        row.revision
                    )));
                }

                row.revision.next()
            }
        };

        rows.insert(
            entry_id.clone(),
            Row {
                json,
                revision,
                removed: false,
            },
        );

        Ok(entry_id.clone())
    }

    async fn mark_removed(&self, entry_id: &EntryId) -> Result<bool, StorageError> {
        self.removes.fetch_add(1, Ordering::SeqCst);

        let mut rows = self.rows();
        let row = rows
            .get_mut(entry_id)
            .ok_or_else(|| StorageError::NotFound {
                entry_id: entry_id.clone(),
            })?;

        if row.removed {
            return Ok(false);
        }

        row.removed = true;
        row.revision = row.revision.next();

        Ok(true)
    }
}

fn encode<D: Document>(document: &D) -> Result<Vec<u8>, StorageError> {
    serde_json::to_vec(document).map_err(|err| StorageError::io(format!("encode: {err}")))
}

///
/// TESTS
///
