//! # Paged Sparse Set
//!
//! Maps a dense, monotonically growing key space onto values with O(1)
//! insert, remove, lookup and key recycling.
//!
//! ```text
//! dense:   [ k3 | k0 | k7 || k5 | k1 ]
//!            live (alive_count = 3) ^ cached, handed out by `reuse`
//!
//! sparse:  page 0: [ v(k0) | v(k1) | -- | v(k3) | ... ]
//!          page 1: [ ... ]
//! ```
//!
//! Every live value remembers its own position in `dense`, which is what
//! makes swap-with-last removal O(1). Removed keys are not erased from
//! `dense`: they move just past the live region and wait there for
//! [`SparseSet::reuse`]. A side map from slot to cached dense position lets
//! an insert find a cached entry for its slot without scanning.
//!
//! How keys map to slots, how values record their dense position and what
//! happens to a key when it is recycled are all decided by a
//! [`SparseSetPolicy`], so the same structure backs the entity record index
//! and plain numeric sets.

use std::collections::HashMap;

use super::error::{EcsError, EcsResult};

/// Default number of slots per sparse page.
pub const DEFAULT_PAGE_SIZE: usize = 1024;

/// Pluggable behaviour of a [`SparseSet`].
pub trait SparseSetPolicy {
    /// Key type stored in the dense array.
    type Key: Copy + PartialEq;
    /// Value type stored in the sparse pages.
    type Value: Clone + PartialEq;

    /// Numeric slot of a key.
    fn index_from_key(&self, key: &Self::Key) -> usize;

    /// Dense position recorded inside a value.
    fn index_from_value(&self, value: &Self::Value) -> usize;

    /// A key that is never inserted.
    fn invalid_key(&self) -> Self::Key;

    /// The value marking an empty sparse slot.
    fn invalid_value(&self) -> Self::Value;

    /// Writes a dense position into a value.
    fn record_dense_index(&self, value: &mut Self::Value, dense_index: usize);

    /// Transforms a cached key before it is handed out again.
    fn reuse_key(&self, key: &mut Self::Key);
}

/// Policy for plain `u32 -> u32` sets where the value is the dense index.
#[derive(Clone, Copy, Debug, Default)]
pub struct NumericPolicy;

impl SparseSetPolicy for NumericPolicy {
    type Key = u32;
    type Value = u32;

    #[inline]
    fn index_from_key(&self, key: &u32) -> usize {
        *key as usize
    }

    #[inline]
    fn index_from_value(&self, value: &u32) -> usize {
        *value as usize
    }

    fn invalid_key(&self) -> u32 {
        u32::MAX
    }

    fn invalid_value(&self) -> u32 {
        u32::MAX
    }

    #[inline]
    fn record_dense_index(&self, value: &mut u32, dense_index: usize) {
        debug_assert!(dense_index < u32::MAX as usize, "dense index overflows u32");
        *value = dense_index as u32;
    }

    fn reuse_key(&self, _key: &mut u32) {}
}

/// Paged sparse set parameterised by a [`SparseSetPolicy`].
pub struct SparseSet<P: SparseSetPolicy, const PAGE_SIZE: usize = DEFAULT_PAGE_SIZE> {
    /// Live keys first, cached keys after `alive_count`.
    dense: Vec<P::Key>,
    /// Lazily allocated pages of values.
    sparse: Vec<Box<[P::Value]>>,
    policy: P,
    alive_count: usize,
    /// Slot of every cached key mapped to its position in `dense`.
    cached_slots: HashMap<usize, usize>,
}

impl<P: SparseSetPolicy + Default, const PAGE_SIZE: usize> Default for SparseSet<P, PAGE_SIZE> {
    fn default() -> Self {
        Self::with_policy(P::default())
    }
}

impl<P: SparseSetPolicy + Default, const PAGE_SIZE: usize> SparseSet<P, PAGE_SIZE> {
    /// Creates an empty set with the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: SparseSetPolicy, const PAGE_SIZE: usize> SparseSet<P, PAGE_SIZE> {
    /// Number of slots per sparse page.
    #[inline]
    #[must_use]
    pub const fn page_size() -> usize {
        PAGE_SIZE
    }

    /// Creates an empty set using the given policy.
    #[must_use]
    pub fn with_policy(policy: P) -> Self {
        Self {
            dense: Vec::new(),
            sparse: Vec::new(),
            policy,
            alive_count: 0,
            cached_slots: HashMap::new(),
        }
    }

    /// Returns the policy.
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Returns the dense array, live and cached keys.
    #[inline]
    #[must_use]
    pub fn dense(&self) -> &[P::Key] {
        &self.dense
    }

    /// Returns the sparse pages.
    #[inline]
    #[must_use]
    pub fn sparse(&self) -> &[Box<[P::Value]>] {
        &self.sparse
    }

    /// Returns only the live keys.
    #[inline]
    #[must_use]
    pub fn alive_keys(&self) -> &[P::Key] {
        &self.dense[..self.alive_count]
    }

    /// Returns the number of live keys.
    #[inline]
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Checks if no key is live.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alive_count == 0
    }

    /// Inserts a key that is not currently live.
    ///
    /// A cached key displaced by the append is moved to the back of the
    /// dense array; it stays available to [`SparseSet::reuse`].
    ///
    /// If the key's slot is currently held by a cached key, the cached entry
    /// is replaced in place by `key` instead of growing `dense`, so the same
    /// slot never appears twice in the dense array.
    ///
    /// # Errors
    ///
    /// - [`EcsError::DuplicateKey`] if the key is already live; nothing changes.
    /// - [`EcsError::AllocationFailed`] if the dense array or a page cannot grow.
    pub fn insert(&mut self, key: P::Key, mut value: P::Value) -> EcsResult<()> {
        debug_assert!(key != self.policy.invalid_key(), "inserting the invalid key");

        let k = self.policy.index_from_key(&key);
        if self.contains(&key) {
            tracing::error!(index = k, "duplicate sparse set insert");
            return Err(EcsError::DuplicateKey { index: k });
        }

        self.ensure_page(k)?;

        if let Some(pos) = self.cached_slots.remove(&k) {
            self.dense.swap(self.alive_count, pos);
            self.dense[self.alive_count] = key;
            self.note_cached_at(pos);
        } else {
            self.dense.try_reserve(1)?;
            self.dense.push(key);
            let last = self.dense.len() - 1;
            self.dense.swap(self.alive_count, last);
            self.note_cached_at(last);
        }

        self.policy.record_dense_index(&mut value, self.alive_count);
        self.sparse[k / PAGE_SIZE][k % PAGE_SIZE] = value;
        self.alive_count += 1;
        Ok(())
    }

    /// Re-binds the next cached key to `value` and makes it live again.
    ///
    /// The key passes through [`SparseSetPolicy::reuse_key`] first, so a
    /// policy can bump its generation. Returns `None` when nothing is cached.
    pub fn reuse(&mut self, mut value: P::Value) -> Option<P::Key> {
        let key = self.dense.get_mut(self.alive_count)?;
        self.policy.reuse_key(key);
        let key = *key;

        let k = self.policy.index_from_key(&key);
        self.cached_slots.remove(&k);
        self.policy.record_dense_index(&mut value, self.alive_count);
        self.sparse[k / PAGE_SIZE][k % PAGE_SIZE] = value;
        self.alive_count += 1;
        Some(key)
    }

    /// Checks if a removed key is waiting to be reused.
    #[inline]
    #[must_use]
    pub fn has_key_cached(&self) -> bool {
        self.alive_count < self.dense.len()
    }

    /// Returns the key the next [`SparseSet::reuse`] would hand out, before
    /// the policy transforms it.
    #[inline]
    #[must_use]
    pub fn cached_key(&self) -> Option<&P::Key> {
        self.dense.get(self.alive_count)
    }

    /// Looks up the value stored for a key's slot.
    #[inline]
    #[must_use]
    pub fn get(&self, key: &P::Key) -> Option<&P::Value> {
        let k = self.policy.index_from_key(key);
        let value = self.sparse.get(k / PAGE_SIZE)?.get(k % PAGE_SIZE)?;
        (*value != self.policy.invalid_value()).then_some(value)
    }

    /// Looks up the value stored for a key's slot, mutably.
    ///
    /// Callers must not change the recorded dense index.
    #[inline]
    pub fn get_mut(&mut self, key: &P::Key) -> Option<&mut P::Value> {
        let k = self.policy.index_from_key(key);
        let invalid = self.policy.invalid_value();
        let value = self.sparse.get_mut(k / PAGE_SIZE)?.get_mut(k % PAGE_SIZE)?;
        if *value == invalid {
            None
        } else {
            Some(value)
        }
    }

    /// Like [`SparseSet::get`], but also requires the live dense entry to be
    /// exactly `key`.
    ///
    /// Policies whose keys carry more than their slot (generations) use this
    /// to reject stale keys that share a slot with a recycled one.
    #[inline]
    #[must_use]
    pub fn get_exact(&self, key: &P::Key) -> Option<&P::Value> {
        let value = self.get(key)?;
        let dense_index = self.policy.index_from_value(value);
        (dense_index < self.alive_count && self.dense[dense_index] == *key).then_some(value)
    }

    /// Checks if a key's slot holds a value.
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &P::Key) -> bool {
        self.get(key).is_some()
    }

    /// Removes a key, returning the value that was stored for it.
    ///
    /// Removing an absent key is a silent no-op. The removed key is kept as
    /// the first cached entry, ready for [`SparseSet::reuse`].
    pub fn remove(&mut self, key: &P::Key) -> Option<P::Value> {
        if self.alive_count == 0 {
            return None;
        }

        let k = self.policy.index_from_key(key);
        let invalid = self.policy.invalid_value();
        let slot = self.sparse.get_mut(k / PAGE_SIZE)?.get_mut(k % PAGE_SIZE)?;
        if *slot == invalid {
            return None;
        }
        let removed = std::mem::replace(slot, invalid);

        let idx = self.policy.index_from_value(&removed);
        let last = self.alive_count - 1;
        if idx != last {
            self.dense.swap(idx, last);
            let moved = self.policy.index_from_key(&self.dense[idx]);
            let moved_value = &mut self.sparse[moved / PAGE_SIZE][moved % PAGE_SIZE];
            self.policy.record_dense_index(moved_value, idx);
        }
        self.alive_count = last;
        self.cached_slots.insert(k, last);

        Some(removed)
    }

    /// Iterates over live keys and their values in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (P::Key, &P::Value)> + '_ {
        self.alive_keys().iter().map(move |key| {
            let k = self.policy.index_from_key(key);
            (*key, &self.sparse[k / PAGE_SIZE][k % PAGE_SIZE])
        })
    }

    /// Drops every key, live and cached, keeping the allocated pages.
    pub fn clear(&mut self) {
        let invalid = self.policy.invalid_value();
        for page in &mut self.sparse {
            page.fill(invalid.clone());
        }
        self.dense.clear();
        self.cached_slots.clear();
        self.alive_count = 0;
    }

    /// Records where a cached key now sits after being moved within the
    /// cached region. Positions inside the live region are ignored.
    fn note_cached_at(&mut self, pos: usize) {
        if pos > self.alive_count {
            let k = self.policy.index_from_key(&self.dense[pos]);
            self.cached_slots.insert(k, pos);
        }
    }

    /// Grows the page table so that slot `k` exists.
    fn ensure_page(&mut self, k: usize) -> EcsResult<()> {
        let page_idx = k / PAGE_SIZE;
        if page_idx < self.sparse.len() {
            return Ok(());
        }

        self.sparse.try_reserve(page_idx + 1 - self.sparse.len())?;
        while self.sparse.len() <= page_idx {
            let mut page = Vec::new();
            page.try_reserve_exact(PAGE_SIZE)?;
            page.resize(PAGE_SIZE, self.policy.invalid_value());
            self.sparse.push(page.into_boxed_slice());
        }
        Ok(())
    }
}

impl<P, const PAGE_SIZE: usize> std::fmt::Debug for SparseSet<P, PAGE_SIZE>
where
    P: SparseSetPolicy,
    P::Key: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SparseSet")
            .field("alive", &self.alive_keys())
            .field("cached", &(self.dense.len() - self.alive_count))
            .field("pages", &self.sparse.len())
            .finish()
    }
}
