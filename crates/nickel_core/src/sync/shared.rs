//! # Lock-Guarded Shared World
//!
//! One [`World`] behind a `parking_lot` reader-writer lock, plus a frame
//! counter the writer advances at the end of each tick.
//!
//! ## Thread Safety
//!
//! - [`WorldReadGuard`]: shared access, many at once
//! - [`WorldWriteGuard`]: exclusive access, one at a time
//!
//! Component values never alias across guards: the world moves them between
//! tables, and every move happens under the write guard.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::ecs::{EcsResult, World, WorldConfig};

struct Inner {
    world: RwLock<World>,
    frame: AtomicU64,
}

/// A world shared between threads.
///
/// Cloning is cheap and yields another handle to the same world.
///
/// ## Usage
///
/// ```rust
/// use nickel_core::{Position, SharedWorld};
///
/// let shared = SharedWorld::new();
/// let entity = {
///     let mut world = shared.write();
///     let e = world.create_entity()?;
///     world.add_component(e, Position::new(1.0, 0.0))?;
///     e
/// };
/// shared.end_frame();
///
/// let render = shared.clone();
/// let handle = std::thread::spawn(move || {
///     render.read().get_component::<Position>(entity).copied()
/// });
/// assert_eq!(handle.join().unwrap(), Some(Position::new(1.0, 0.0)));
/// # Ok::<(), nickel_core::EcsError>(())
/// ```
#[derive(Clone)]
pub struct SharedWorld {
    inner: Arc<Inner>,
}

impl SharedWorld {
    /// Wraps a new world with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::from_world(World::new())
    }

    /// Wraps a new world built from `config`.
    ///
    /// # Errors
    ///
    /// Returns the error of [`World::with_config`].
    pub fn with_config(config: WorldConfig) -> EcsResult<Self> {
        World::with_config(config).map(Self::from_world)
    }

    /// Wraps an existing world.
    #[must_use]
    pub fn from_world(world: World) -> Self {
        Self {
            inner: Arc::new(Inner {
                world: RwLock::new(world),
                frame: AtomicU64::new(0),
            }),
        }
    }

    /// Acquires shared read access, blocking while a writer holds the lock.
    pub fn read(&self) -> WorldReadGuard<'_> {
        WorldReadGuard {
            guard: self.inner.world.read(),
        }
    }

    /// Acquires exclusive write access, blocking until all readers are gone.
    pub fn write(&self) -> WorldWriteGuard<'_> {
        WorldWriteGuard {
            guard: self.inner.world.write(),
        }
    }

    /// Acquires read access if no writer holds the lock.
    pub fn try_read(&self) -> Option<WorldReadGuard<'_>> {
        self.inner
            .world
            .try_read()
            .map(|guard| WorldReadGuard { guard })
    }

    /// Acquires write access if nobody holds the lock.
    pub fn try_write(&self) -> Option<WorldWriteGuard<'_>> {
        self.inner
            .world
            .try_write()
            .map(|guard| WorldWriteGuard { guard })
    }

    /// Checks if a writer currently holds the lock.
    #[inline]
    #[must_use]
    pub fn is_write_locked(&self) -> bool {
        self.inner.world.is_locked_exclusive()
    }

    /// Returns the number of completed frames.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.inner.frame.load(Ordering::Acquire)
    }

    /// Marks the end of a frame and returns the new frame count.
    pub fn end_frame(&self) -> u64 {
        let frame = self.inner.frame.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::trace!(frame, "frame complete");
        frame
    }

    /// Returns the number of handles sharing this world.
    #[inline]
    #[must_use]
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Unwraps the world if this is the last handle.
    ///
    /// # Errors
    ///
    /// Returns `self` unchanged while other handles exist.
    pub fn try_into_inner(self) -> Result<World, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(inner) => Ok(inner.world.into_inner()),
            Err(inner) => Err(Self { inner }),
        }
    }
}

impl Default for SharedWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SharedWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedWorld")
            .field("frame", &self.frame_count())
            .field("write_locked", &self.is_write_locked())
            .finish_non_exhaustive()
    }
}

/// Shared read access to a [`SharedWorld`].
pub struct WorldReadGuard<'a> {
    guard: RwLockReadGuard<'a, World>,
}

impl Deref for WorldReadGuard<'_> {
    type Target = World;

    #[inline]
    fn deref(&self) -> &World {
        &self.guard
    }
}

/// Exclusive write access to a [`SharedWorld`].
pub struct WorldWriteGuard<'a> {
    guard: RwLockWriteGuard<'a, World>,
}

impl Deref for WorldWriteGuard<'_> {
    type Target = World;

    #[inline]
    fn deref(&self) -> &World {
        &self.guard
    }
}

impl DerefMut for WorldWriteGuard<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut World {
        &mut self.guard
    }
}
