//! # Component System
//!
//! Components are plain data attached to entities. Any `Send + Sync +
//! 'static` type is a component; the [`ComponentRegistry`] gives each type a
//! [`ComponentId`] the first time the world sees it and remembers how to
//! build an empty column for it.

use std::any::TypeId;
use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};

use super::column::{Column, TypedColumn};
use super::id::ComponentId;

/// Marker trait for ECS components.
///
/// Blanket-implemented for every `Send + Sync + 'static` type.
pub trait Component: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Component for T {}

/// Runtime description of a registered component type.
#[derive(Clone, Copy, Debug)]
pub struct ComponentInfo {
    /// Identifier assigned by the registry.
    pub id: ComponentId,
    /// Rust type name, for diagnostics.
    pub name: &'static str,
    /// Rust type identity.
    pub type_id: TypeId,
    /// Size of one value in bytes.
    pub size: usize,
    /// Alignment of one value in bytes.
    pub align: usize,
    new_column: fn() -> Box<dyn Column>,
}

impl ComponentInfo {
    fn of<C: Component>(id: ComponentId) -> Self {
        Self {
            id,
            name: std::any::type_name::<C>(),
            type_id: TypeId::of::<C>(),
            size: std::mem::size_of::<C>(),
            align: std::mem::align_of::<C>(),
            new_column: TypedColumn::<C>::boxed,
        }
    }

    /// Builds an empty column for this component type.
    #[must_use]
    pub fn new_column(&self) -> Box<dyn Column> {
        (self.new_column)()
    }
}

/// Assigns [`ComponentId`]s to Rust types.
///
/// Owned by a single world; there is no process-wide registry.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    infos: Vec<ComponentInfo>,
    by_type: HashMap<TypeId, ComponentId>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of `C`, registering it on first use.
    pub fn register<C: Component>(&mut self) -> ComponentId {
        if let Some(&id) = self.by_type.get(&TypeId::of::<C>()) {
            return id;
        }

        debug_assert!(self.infos.len() < ComponentId::MAX_INDEX as usize);
        let id = ComponentId::new(true, self.infos.len() as u32, 0);
        self.infos.push(ComponentInfo::of::<C>(id));
        self.by_type.insert(TypeId::of::<C>(), id);

        tracing::debug!(component = std::any::type_name::<C>(), ?id, "registered component");
        id
    }

    /// Returns the id of `C` if it was registered.
    #[inline]
    #[must_use]
    pub fn id_of<C: Component>(&self) -> Option<ComponentId> {
        self.by_type.get(&TypeId::of::<C>()).copied()
    }

    /// Returns the description of a registered component.
    #[inline]
    #[must_use]
    pub fn info(&self, id: ComponentId) -> Option<&ComponentInfo> {
        self.infos.get(id.index() as usize).filter(|info| info.id == id)
    }

    /// Returns the number of registered component types.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Checks if no component type was registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Iterates over all registered components in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentInfo> {
        self.infos.iter()
    }
}

/// Position component for entities.
///
/// 2D position in world space. `Pod` so render systems can upload the
/// column directly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Position {
    /// X coordinate in world space.
    pub x: f32,
    /// Y coordinate in world space.
    pub y: f32,
}

impl Position {
    /// Creates a new position.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Velocity component for entities.
///
/// Movement speed in world units per second.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Velocity {
    /// X velocity component.
    pub x: f32,
    /// Y velocity component.
    pub y: f32,
}

impl Velocity {
    /// Creates a new velocity.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}
