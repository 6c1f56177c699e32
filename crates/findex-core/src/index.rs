//! In-memory snapshot index.
//!
//! The `Index` holds the most recently published [`Snapshot`]: an immutable,
//! ordered list of entries. The refresher builds a complete new snapshot off
//! to the side and swaps it in with a single atomic store, so readers never
//! see a half-built index and never take a lock.
//!
//! ## Architecture
//!
//! - `ArcSwap<Snapshot>` holds the visible snapshot
//! - Readers `load_full()` an `Arc<Snapshot>` and keep it as long as they like
//! - Old snapshots are freed when the last reader drops its `Arc`

use crate::types::IndexEntry;
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// A complete, immutable index state at one point in time.
#[derive(Debug, Default)]
pub struct Snapshot {
    /// Entries in scan order
    entries: Vec<Arc<IndexEntry>>,

    /// Publication counter; 0 for the initial empty snapshot
    generation: u64,

    /// When this snapshot was published
    published_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Entries in scan order
    pub fn entries(&self) -> &[Arc<IndexEntry>] {
        &self.entries
    }

    /// Iterate over entries in scan order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<IndexEntry>> {
        self.entries.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the snapshot holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Publication counter; 0 means no scan has been published yet
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// When this snapshot was published, `None` for the initial one
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
    }
}

/// The published index shared between the refresher and query callers.
///
/// ## Example
///
/// ```rust
/// use findex_core::{EntryKind, Index, IndexEntry};
///
/// let index = Index::new();
/// assert!(index.current().is_empty());
///
/// let entry = IndexEntry::new(EntryKind::Virtual, "trash:///", "", "Trash").unwrap();
/// index.publish(vec![entry]);
/// assert_eq!(index.current().len(), 1);
/// ```
pub struct Index {
    current: ArcSwap<Snapshot>,
    generation: AtomicU64,
}

impl Default for Index {
    fn default() -> Self {
        Self::new()
    }
}

impl Index {
    /// Create an index holding the empty initial snapshot.
    pub fn new() -> Self {
        Index {
            current: ArcSwap::from_pointee(Snapshot::default()),
            generation: AtomicU64::new(0),
        }
    }

    /// Replace the visible snapshot with one built from `entries`.
    ///
    /// The new snapshot is fully built before it becomes visible. Returns
    /// the snapshot that was published.
    pub fn publish<I>(&self, entries: I) -> Arc<Snapshot>
    where
        I: IntoIterator<Item = IndexEntry>,
    {
        let entries: Vec<_> = entries.into_iter().map(Arc::new).collect();
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let snapshot = Arc::new(Snapshot {
            entries,
            generation,
            published_at: Some(Utc::now()),
        });

        let previous = self.current.swap(Arc::clone(&snapshot));
        debug!(
            previous_generation = previous.generation,
            previous_entries = previous.len(),
            "Snapshot replaced"
        );
        info!(generation, entries = snapshot.len(), "Index published");
        snapshot
    }

    /// The latest published snapshot.
    pub fn current(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Number of entries in the latest snapshot
    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    /// True if the latest snapshot holds no entries
    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }

    /// Generation of the latest snapshot
    pub fn generation(&self) -> u64 {
        self.current.load().generation
    }
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("entry_count", &self.len())
            .field("generation", &self.generation())
            .finish()
    }
}
