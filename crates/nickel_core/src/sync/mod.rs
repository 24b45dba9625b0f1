//! # Shared World Access
//!
//! The [`crate::ecs::World`] itself is single-threaded: every mutation takes
//! `&mut self`. This module wraps a world for use from several threads.
//!
//! ```text
//! Thread 1 (logic):   write() -> exclusive
//! Thread 2 (render):  read()  -> shared
//! Thread 3 (audio):   read()  -> shared
//! ```
//!
//! Readers run in parallel; a writer waits for them and excludes everyone
//! else until its guard is dropped.

mod shared;

pub use shared::{SharedWorld, WorldReadGuard, WorldWriteGuard};
