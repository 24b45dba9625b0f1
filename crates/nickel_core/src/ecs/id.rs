//! # Identifiers
//!
//! Entities and component types are named by generational identifiers.
//! Each identifier is a single `u64` split into three fields:
//!
//! ```text
//! | alive (1) | generation (31) | index (32) |
//!   bit 63      bits 32..63       bits 0..32
//! ```
//!
//! - `index` is the slot number, reused after the slot is freed
//! - `generation` is bumped on every reuse so stale copies compare unequal
//! - `alive` marks an identifier handed out by a live allocation
//!
//! The null identifier has every index and generation bit set and the alive
//! bit clear, so no live allocation can ever produce it.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

const INDEX_BITS: u32 = 32;
const GENERATION_BITS: u32 = 31;

const INDEX_MASK: u64 = (1 << INDEX_BITS) - 1;
const GENERATION_MASK: u64 = ((1 << GENERATION_BITS) - 1) << INDEX_BITS;
const ALIVE_BIT: u64 = 1 << 63;

/// Marker for the family an identifier belongs to.
pub trait IdKind: 'static {
    /// Name used when formatting identifiers of this kind.
    const NAME: &'static str;
}

/// Identifier family for entities.
#[derive(Debug)]
pub enum EntityKind {}

impl IdKind for EntityKind {
    const NAME: &'static str = "Entity";
}

/// Identifier family for component types.
#[derive(Debug)]
pub enum ComponentKind {}

impl IdKind for ComponentKind {
    const NAME: &'static str = "Component";
}

/// A packed generational identifier.
///
/// `K` only separates identifier families at the type level; two ids of
/// different kinds cannot be compared or mixed up.
#[repr(transparent)]
pub struct Id<K> {
    raw: u64,
    _kind: PhantomData<fn() -> K>,
}

/// Identifier of an entity.
pub type Entity = Id<EntityKind>;

/// Identifier of a component type.
pub type ComponentId = Id<ComponentKind>;

impl<K> Id<K> {
    /// Largest index a live allocation may use.
    pub const MAX_INDEX: u32 = u32::MAX - 1;

    /// Largest generation value; generations wrap back to zero after it.
    pub const MAX_GENERATION: u32 = (1 << GENERATION_BITS) - 1;

    /// The reserved null identifier.
    pub const NULL: Self = Self::from_bits(INDEX_MASK | GENERATION_MASK);

    /// Packs the three fields into an identifier.
    ///
    /// The generation is truncated to its 31-bit field.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if `generation` does not fit its field.
    #[inline]
    #[must_use]
    pub const fn new(alive: bool, index: u32, generation: u32) -> Self {
        debug_assert!(generation <= Self::MAX_GENERATION, "generation overflows its field");

        let alive = if alive { ALIVE_BIT } else { 0 };
        let generation = ((generation as u64) << INDEX_BITS) & GENERATION_MASK;
        Self::from_bits(alive | generation | index as u64)
    }

    /// Rebuilds an identifier from its raw bits.
    #[inline]
    #[must_use]
    pub const fn from_bits(raw: u64) -> Self {
        Self {
            raw,
            _kind: PhantomData,
        }
    }

    /// Returns the raw packed bits.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.raw
    }

    /// Returns the slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        (self.raw & INDEX_MASK) as u32
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        ((self.raw & GENERATION_MASK) >> INDEX_BITS) as u32
    }

    /// Returns the alive bit.
    ///
    /// This is not the same as `!is_null()`: a recycled slot can hold an
    /// identifier that is neither null nor alive.
    #[inline]
    #[must_use]
    pub const fn is_alive(self) -> bool {
        self.raw & ALIVE_BIT != 0
    }

    /// Checks if this is the reserved null identifier.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.raw == Self::NULL.raw
    }

    /// Returns the identifier that the next occupant of this slot gets.
    ///
    /// Same index, generation bumped (wrapping inside its field), alive.
    #[inline]
    #[must_use]
    pub const fn next_generation(self) -> Self {
        let generation = (self.generation() + 1) & Self::MAX_GENERATION;
        Self::new(true, self.index(), generation)
    }

    /// Returns a copy with the alive bit cleared.
    #[inline]
    #[must_use]
    pub const fn killed(self) -> Self {
        Self::from_bits(self.raw & !ALIVE_BIT)
    }
}

impl<K> Clone for Id<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Id<K> {}

impl<K> PartialEq for Id<K> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<K> Eq for Id<K> {}

impl<K> PartialOrd for Id<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for Id<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<K> Hash for Id<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<K> Default for Id<K> {
    fn default() -> Self {
        Self::NULL
    }
}

impl<K: IdKind> fmt::Debug for Id<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return write!(f, "{}(null)", K::NAME);
        }
        write!(f, "{}({}v{}", K::NAME, self.index(), self.generation())?;
        if !self.is_alive() {
            f.write_str(" dead")?;
        }
        f.write_str(")")
    }
}

/// The null identifier of any kind.
///
/// Compares equal to [`Id::NULL`] from either side: `Null == id` and
/// `id == Null` are both valid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Null;

impl<K> PartialEq<Id<K>> for Null {
    fn eq(&self, other: &Id<K>) -> bool {
        other.is_null()
    }
}

impl<K> PartialEq<Null> for Id<K> {
    fn eq(&self, _: &Null) -> bool {
        self.is_null()
    }
}

impl<K> From<Null> for Id<K> {
    fn from(_: Null) -> Self {
        Self::NULL
    }
}
