//! Atomic context for multi-step mutations.
//!
//! An [`AtomicContext`] wraps the live store for the duration of one inner
//! application call. Exactly one of `commit` / `rollback` takes effect; the
//! first call latches and later calls are no-ops. Dropping an unsettled
//! context rolls it back.
//!
//! The mode is fixed at acquisition by the [`StateHandle`] variant:
//!
//! - `Snapshotting` (index mode): a snapshot index is taken up front, writes go
//!   straight to the live store, rollback reverts to the index, commit just
//!   abandons it. Required when the caller already sits inside a
//!   snapshot-capable context, since staging on top of it would flush through
//!   and invalidate indices held further up the call chain.
//! - `Plain` (staged mode): writes land in a [`StagedStorage`] cache, commit
//!   flushes it to the parent, rollback drops it.

use std::collections::BTreeMap;

use cosmwasm_std::{Order, Record, StdError, StdResult, Storage};

// ============================================================================
// Snapshot-capable stores
// ============================================================================

/// A store that can mark and revert to points in its write history.
pub trait SnapshotStorage: Storage {
    /// Mark the current state. Returns an index for `revert_to_snapshot`.
    fn snapshot(&mut self) -> usize;

    /// Undo every write made after `index` was taken.
    fn revert_to_snapshot(&mut self, index: usize) -> StdResult<()>;
}

/// In-process revert log over any store.
///
/// Each write records the value it replaced; a snapshot is the journal length.
pub struct JournaledStorage<S> {
    inner: S,
    journal: Vec<(Vec<u8>, Option<Vec<u8>>)>,
}

impl<S: Storage> JournaledStorage<S> {
    pub fn new(inner: S) -> Self {
        JournaledStorage {
            inner,
            journal: Vec::new(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Number of writes that can still be reverted.
    pub fn journal_len(&self) -> usize {
        self.journal.len()
    }

    /// Accept every write so far and drop the revert history.
    ///
    /// Call once the outer unit of work (a transaction or a block) is final.
    /// Snapshot indices taken earlier no longer refer to anything.
    pub fn commit_all(&mut self) {
        self.journal.clear();
    }

    fn record(&mut self, key: &[u8]) {
        let previous = self.inner.get(key);
        self.journal.push((key.to_vec(), previous));
    }
}

impl<S: Storage> Storage for JournaledStorage<S> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.get(key)
    }

    fn range<'a>(
        &'a self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        order: Order,
    ) -> Box<dyn Iterator<Item = Record> + 'a> {
        self.inner.range(start, end, order)
    }

    fn set(&mut self, key: &[u8], value: &[u8]) {
        self.record(key);
        self.inner.set(key, value);
    }

    fn remove(&mut self, key: &[u8]) {
        self.record(key);
        self.inner.remove(key);
    }
}

impl<S: Storage> SnapshotStorage for JournaledStorage<S> {
    fn snapshot(&mut self) -> usize {
        self.journal.len()
    }

    fn revert_to_snapshot(&mut self, index: usize) -> StdResult<()> {
        if index > self.journal.len() {
            return Err(StdError::generic_err(format!(
                "snapshot index {} out of range ({} entries)",
                index,
                self.journal.len()
            )));
        }
        while self.journal.len() > index {
            if let Some((key, previous)) = self.journal.pop() {
                match previous {
                    Some(value) => self.inner.set(&key, &value),
                    None => self.inner.remove(&key),
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Staged writes
// ============================================================================

/// Write cache over a parent store.
///
/// Reads fall through to the parent for keys not written here. Removals are
/// kept as tombstones. `flush` applies pending writes in key order.
pub struct StagedStorage<'a> {
    parent: &'a mut dyn Storage,
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> StagedStorage<'a> {
    pub fn new(parent: &'a mut dyn Storage) -> Self {
        StagedStorage {
            parent,
            writes: BTreeMap::new(),
        }
    }

    /// Number of keys with a pending write or tombstone.
    pub fn pending(&self) -> usize {
        self.writes.len()
    }

    /// Apply pending writes to the parent and clear the cache.
    pub fn flush(&mut self) {
        for (key, value) in std::mem::take(&mut self.writes) {
            match value {
                Some(value) => self.parent.set(&key, &value),
                None => self.parent.remove(&key),
            }
        }
    }

    pub fn discard(&mut self) {
        self.writes.clear();
    }
}

fn in_bounds(key: &[u8], start: Option<&[u8]>, end: Option<&[u8]>) -> bool {
    start.map_or(true, |s| key >= s) && end.map_or(true, |e| key < e)
}

impl Storage for StagedStorage<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.writes.get(key) {
            Some(value) => value.clone(),
            None => self.parent.get(key),
        }
    }

    fn range<'b>(
        &'b self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        order: Order,
    ) -> Box<dyn Iterator<Item = Record> + 'b> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = self
            .parent
            .range(start, end, Order::Ascending)
            .collect();

        for (key, value) in self.writes.iter() {
            if !in_bounds(key, start, end) {
                continue;
            }
            match value {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        match order {
            Order::Ascending => Box::new(merged.into_iter()),
            Order::Descending => Box::new(merged.into_iter().rev()),
        }
    }

    fn set(&mut self, key: &[u8], value: &[u8]) {
        self.writes.insert(key.to_vec(), Some(value.to_vec()));
    }

    fn remove(&mut self, key: &[u8]) {
        self.writes.insert(key.to_vec(), None);
    }
}

// ============================================================================
// Atomic context
// ============================================================================

/// The ambient store as handed to the middleware.
pub enum StateHandle<'a> {
    /// Store exposing snapshot/revert; selects index mode.
    Snapshotting(&'a mut dyn SnapshotStorage),
    /// Any other store; selects staged mode.
    Plain(&'a mut dyn Storage),
}

impl Storage for StateHandle<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self {
            StateHandle::Snapshotting(store) => store.get(key),
            StateHandle::Plain(store) => store.get(key),
        }
    }

    fn range<'b>(
        &'b self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        order: Order,
    ) -> Box<dyn Iterator<Item = Record> + 'b> {
        match self {
            StateHandle::Snapshotting(store) => store.range(start, end, order),
            StateHandle::Plain(store) => store.range(start, end, order),
        }
    }

    fn set(&mut self, key: &[u8], value: &[u8]) {
        match self {
            StateHandle::Snapshotting(store) => store.set(key, value),
            StateHandle::Plain(store) => store.set(key, value),
        }
    }

    fn remove(&mut self, key: &[u8]) {
        match self {
            StateHandle::Snapshotting(store) => store.remove(key),
            StateHandle::Plain(store) => store.remove(key),
        }
    }
}

enum Mode<'a> {
    Index {
        store: &'a mut dyn SnapshotStorage,
        snapshot: usize,
    },
    Staged(StagedStorage<'a>),
}

/// Scoped, single-use transaction over the ambient store.
pub struct AtomicContext<'a> {
    mode: Mode<'a>,
    settled: bool,
}

impl<'a> AtomicContext<'a> {
    pub fn acquire(state: StateHandle<'a>) -> Self {
        let mode = match state {
            StateHandle::Snapshotting(store) => {
                let snapshot = store.snapshot();
                Mode::Index { store, snapshot }
            }
            StateHandle::Plain(store) => Mode::Staged(StagedStorage::new(store)),
        };
        AtomicContext {
            mode,
            settled: false,
        }
    }

    pub fn is_index_mode(&self) -> bool {
        matches!(self.mode, Mode::Index { .. })
    }

    /// True once `commit` or `rollback` has taken effect.
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Keep every write made through this context. No-op once settled.
    pub fn commit(&mut self) -> StdResult<()> {
        if self.settled {
            return Ok(());
        }
        self.settled = true;
        match &mut self.mode {
            Mode::Index { .. } => {}
            Mode::Staged(staged) => staged.flush(),
        }
        Ok(())
    }

    /// Discard every write made through this context. No-op once settled.
    pub fn rollback(&mut self) -> StdResult<()> {
        if self.settled {
            return Ok(());
        }
        self.settled = true;
        match &mut self.mode {
            Mode::Index { store, snapshot } => store.revert_to_snapshot(*snapshot),
            Mode::Staged(staged) => {
                staged.discard();
                Ok(())
            }
        }
    }
}

impl Drop for AtomicContext<'_> {
    fn drop(&mut self) {
        // Errors cannot surface from drop; a failed revert leaves the host's
        // own transaction to discard the writes.
        let _ = self.rollback();
    }
}

impl Storage for AtomicContext<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match &self.mode {
            Mode::Index { store, .. } => store.get(key),
            Mode::Staged(staged) => staged.get(key),
        }
    }

    fn range<'b>(
        &'b self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        order: Order,
    ) -> Box<dyn Iterator<Item = Record> + 'b> {
        match &self.mode {
            Mode::Index { store, .. } => store.range(start, end, order),
            Mode::Staged(staged) => staged.range(start, end, order),
        }
    }

    fn set(&mut self, key: &[u8], value: &[u8]) {
        match &mut self.mode {
            Mode::Index { store, .. } => store.set(key, value),
            Mode::Staged(staged) => staged.set(key, value),
        }
    }

    fn remove(&mut self, key: &[u8]) {
        match &mut self.mode {
            Mode::Index { store, .. } => store.remove(key),
            Mode::Staged(staged) => staged.remove(key),
        }
    }
}
