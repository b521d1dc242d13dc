//! Route record storage.
//!
//! # Responsibilities
//! - Look up records by service, by referenced address, or all of them
//! - Assign identities on create
//! - Optionally snapshot every record to a JSON file after each write
//!
//! # Design Decisions
//! - Lookups return records ordered by id so "first record" is stable
//! - `update` of a vanished id is an error, never an implicit create
//! - Snapshots are written to a sibling temp file then renamed, one writer
//!   at a time, so the last rename always carries the newest state

use dashmap::DashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::observability::metrics;
use crate::route::record::RouteRecord;

/// Failures reported by a `RouteStore`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("route {0} not found")]
    NotFound(u64),

    #[error("route for service {0} has no id")]
    MissingId(String),

    #[error("route store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("route store snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Lookup and persistence of route records.
pub trait RouteStore: Send + Sync {
    /// All records owned by `service`.
    fn find_by_service(&self, service: &str) -> StoreResult<Vec<RouteRecord>>;

    /// All records whose rule text references `address` as a value.
    fn find_by_address(&self, address: &str) -> StoreResult<Vec<RouteRecord>>;

    fn find_all(&self) -> StoreResult<Vec<RouteRecord>>;

    /// Persist a new record and return its assigned id.
    fn create(&self, record: RouteRecord) -> StoreResult<u64>;

    fn update(&self, record: &RouteRecord) -> StoreResult<()>;

    fn delete(&self, id: u64) -> StoreResult<()>;
}

/// True when `address` appears as a whole value token in `rule`.
fn references_address(rule: &str, address: &str) -> bool {
    rule.split(|c: char| matches!(c, '&' | '!' | '=' | ',' | '>') || c.is_whitespace())
        .any(|token| token == address)
}

/// A concurrent in-process store, optionally backed by a JSON snapshot.
#[derive(Clone, Default)]
pub struct InMemoryRouteStore {
    inner: Arc<DashMap<u64, RouteRecord>>,
    next_id: Arc<AtomicU64>,
    persistence_path: Option<PathBuf>,
    /// Held across snapshot + write + rename.
    snapshot_lock: Arc<Mutex<()>>,
}

impl InMemoryRouteStore {
    /// Create an empty store. With a path, every write is snapshotted there.
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(0)),
            persistence_path,
            snapshot_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Load a snapshot if the file exists, otherwise start empty.
    ///
    /// Records saved without an id are given fresh ones.
    pub fn load_from_file(path: &Path) -> StoreResult<Self> {
        let store = Self::new(Some(path.to_path_buf()));
        if !path.exists() {
            return Ok(store);
        }

        let reader = BufReader::new(File::open(path)?);
        let records: Vec<RouteRecord> = serde_json::from_reader(reader)?;

        let max_id = records.iter().filter_map(|r| r.id).max().unwrap_or(0);
        store.next_id.store(max_id, Ordering::SeqCst);

        for mut record in records {
            let id = match record.id {
                Some(id) => id,
                None => store.allocate_id(),
            };
            record.id = Some(id);
            store.inner.insert(id, record);
        }

        metrics::record_store_size(store.inner.len());
        tracing::info!(path = ?path, routes = store.inner.len(), "Loaded route snapshot");
        Ok(store)
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn collect<F>(&self, keep: F) -> Vec<RouteRecord>
    where
        F: Fn(&RouteRecord) -> bool,
    {
        let mut records: Vec<RouteRecord> = self
            .inner
            .iter()
            .filter(|r| keep(r.value()))
            .map(|r| r.value().clone())
            .collect();
        records.sort_by_key(|r| r.id);
        records
    }

    fn persist(&self) -> StoreResult<()> {
        metrics::record_store_size(self.inner.len());

        let Some(path) = &self.persistence_path else {
            return Ok(());
        };

        // Collect under the lock too: a snapshot taken before a concurrent
        // writer's must not be renamed after it.
        let _guard = self
            .snapshot_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let snapshot = self.collect(|_| true);
        let tmp_path = path.with_extension("tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            serde_json::to_writer_pretty(&mut writer, &snapshot)?;
            writer.flush()?;
        }
        fs::rename(&tmp_path, path)?;

        tracing::debug!(path = ?path, routes = snapshot.len(), "Saved route snapshot");
        Ok(())
    }
}

impl RouteStore for InMemoryRouteStore {
    fn find_by_service(&self, service: &str) -> StoreResult<Vec<RouteRecord>> {
        Ok(self.collect(|r| r.service == service))
    }

    fn find_by_address(&self, address: &str) -> StoreResult<Vec<RouteRecord>> {
        Ok(self.collect(|r| references_address(&r.rule, address)))
    }

    fn find_all(&self) -> StoreResult<Vec<RouteRecord>> {
        Ok(self.collect(|_| true))
    }

    fn create(&self, mut record: RouteRecord) -> StoreResult<u64> {
        let id = self.allocate_id();
        record.id = Some(id);
        self.inner.insert(id, record);
        self.persist()?;
        Ok(id)
    }

    fn update(&self, record: &RouteRecord) -> StoreResult<()> {
        let id = record
            .id
            .ok_or_else(|| StoreError::MissingId(record.service.clone()))?;
        {
            let mut existing = self.inner.get_mut(&id).ok_or(StoreError::NotFound(id))?;
            *existing = record.clone();
        }
        self.persist()
    }

    fn delete(&self, id: u64) -> StoreResult<()> {
        if self.inner.remove(&id).is_none() {
            return Err(StoreError::NotFound(id));
        }
        self.persist()
    }
}
