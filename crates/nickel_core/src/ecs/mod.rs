//! # Entity Component System
//!
//! Archetype-based storage: entities with the same component types share a
//! table, and each component type is a dense column inside it.
//!
//! ## Layers
//!
//! - [`id`]: packed generational identifiers
//! - [`sparse_set`]: paged sparse set with slot recycling
//! - [`table`] and [`archetype`]: columnar tables linked by add/remove edges
//! - [`record`]: entity to table-row index
//! - `world`: the public [`World`] API tying the layers together
//! - `query`: [`Query`] table selection by component set

pub mod archetype;
mod column;
mod component;
mod config;
mod error;
pub mod id;
mod query;
pub mod record;
pub mod sparse_set;
pub mod table;
mod world;

pub use archetype::Archetypes;
pub use column::{BoxedComponent, Column, TypedColumn};
pub use component::{Component, ComponentInfo, ComponentRegistry, Position, Velocity};
pub use config::{WorldConfig, DEFAULT_MAX_ENTITIES, DEFAULT_MAX_TABLES};
pub use error::{EcsError, EcsResult};
pub use id::{ComponentId, Entity, Id, Null};
pub use query::{ComponentSet, Query};
pub use record::{Record, RecordIndex, RecordPolicy};
pub use sparse_set::{NumericPolicy, SparseSet, SparseSetPolicy, DEFAULT_PAGE_SIZE};
pub use table::{Edge, MovedRow, Signature, Table, TableId};
pub use world::World;
