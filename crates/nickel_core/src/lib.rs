//! # Nickel Core
//!
//! Archetype-based Entity Component System storage.
//!
//! - Generational entity identifiers packed into one `u64`
//! - Paged sparse set mapping entities to their storage location
//! - Columnar archetype tables linked by cached add/remove edges
//! - Queries over every table holding a set of component types
//!
//! ## Example
//!
//! ```rust
//! use nickel_core::{Position, Velocity, World};
//!
//! let mut world = World::new();
//! let e = world.create_entity()?;
//! world.add_component(e, Position::new(0.0, 0.0))?;
//! world.add_component(e, Velocity::new(1.0, 1.0))?;
//!
//! let velocity: Velocity = world.remove_component(e)?;
//! assert_eq!(velocity, Velocity::new(1.0, 1.0));
//! assert!(world.has_component::<Position>(e));
//! # Ok::<(), nickel_core::EcsError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod ecs;
pub mod sync;

pub use ecs::{
    Component, ComponentId, EcsError, EcsResult, Entity, Null, Position, Query, Table, TableId,
    Velocity, World, WorldConfig,
};
pub use sync::{SharedWorld, WorldReadGuard, WorldWriteGuard};
