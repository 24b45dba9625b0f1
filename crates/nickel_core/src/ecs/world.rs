//! # ECS World
//!
//! The central container for all entities and components.
//!
//! The world ties together three structures:
//!
//! - the [`RecordIndex`], mapping each live entity to a table row
//! - the [`Archetypes`] arena, storing component values by archetype
//! - the [`ComponentRegistry`], naming component types
//!
//! Every public operation validates the entity through the record index
//! before touching any table, so stale or destroyed handles are rejected
//! instead of reaching storage.

use super::archetype::Archetypes;
use super::component::{Component, ComponentRegistry};
use super::config::WorldConfig;
use super::error::{EcsError, EcsResult};
use super::id::{ComponentId, Entity};
use super::record::{Record, RecordIndex};
use super::table::{Table, TableId};

/// The ECS World: every entity, its components and their archetypes.
///
/// # Example
///
/// ```rust
/// use nickel_core::ecs::{Position, Velocity, World};
///
/// let mut world = World::new();
/// let entity = world.create_entity()?;
/// world.add_component(entity, Position::new(1.0, 2.0))?;
/// world.add_component(entity, Velocity::new(0.5, 0.0))?;
///
/// world.for_each_mut::<Position, Velocity>(|_, pos, vel| {
///     pos.x += vel.x;
///     pos.y += vel.y;
/// });
/// assert_eq!(world.get_component::<Position>(entity), Some(&Position::new(1.5, 2.0)));
/// # Ok::<(), nickel_core::ecs::EcsError>(())
/// ```
#[derive(Debug)]
pub struct World {
    records: RecordIndex,
    archetypes: Archetypes,
    registry: ComponentRegistry,
    config: WorldConfig,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates an empty world with the default configuration.
    ///
    /// Preallocates the root table like [`World::with_config`]; if that
    /// fails the rows are allocated on demand instead.
    #[must_use]
    pub fn new() -> Self {
        let mut world = Self::unreserved(WorldConfig::default());
        if let Err(error) = world.reserve_root() {
            tracing::warn!(%error, "root table preallocation failed");
        }
        world
    }

    /// Creates an empty world with explicit limits.
    ///
    /// # Errors
    ///
    /// - [`EcsError::InvalidConfig`] if the configuration fails validation.
    /// - [`EcsError::AllocationFailed`] if the initial capacity cannot be
    ///   reserved.
    pub fn with_config(config: WorldConfig) -> EcsResult<Self> {
        config.validate()?;
        let mut world = Self::unreserved(config);
        world.reserve_root()?;
        Ok(world)
    }

    fn unreserved(config: WorldConfig) -> Self {
        Self {
            records: RecordIndex::new(),
            archetypes: Archetypes::new(config.max_tables, config.initial_table_capacity),
            registry: ComponentRegistry::new(),
            config,
        }
    }

    fn reserve_root(&mut self) -> EcsResult<()> {
        let rows = self.config.initial_entity_capacity;
        self.archetypes.root_mut().reserve(rows)
    }

    /// Returns the configuration the world was built with.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Creates an entity with no components.
    ///
    /// Recycles a destroyed slot (with a new generation) when one is cached,
    /// otherwise allocates the next unused index. The entity starts in the
    /// root table.
    ///
    /// # Errors
    ///
    /// - [`EcsError::EntityLimitReached`] at `max_entities` live entities or
    ///   when the identifier space is exhausted.
    /// - [`EcsError::AllocationFailed`] if storage cannot grow.
    pub fn create_entity(&mut self) -> EcsResult<Entity> {
        if self.records.alive_count() >= self.config.max_entities {
            tracing::warn!(limit = self.config.max_entities, "entity limit reached");
            return Err(EcsError::EntityLimitReached {
                limit: self.config.max_entities,
            });
        }

        let root = self.archetypes.root_mut();
        root.reserve(1)?;
        let record = Record::new(TableId::ROOT, root.len());

        let entity = match self.records.reuse(record) {
            Some(entity) => entity,
            None => {
                let next = self.records.dense().len();
                if next > Entity::MAX_INDEX as usize {
                    tracing::warn!(limit = next, "entity index space exhausted");
                    return Err(EcsError::EntityLimitReached { limit: next });
                }
                let entity = Entity::new(true, next as u32, 0);
                self.records.insert(entity, record)?;
                entity
            }
        };

        self.archetypes.root_mut().append_row(entity, Vec::new())?;
        Ok(entity)
    }

    /// Destroys an entity and drops all its components.
    ///
    /// Returns `false` if the entity was already dead or never existed.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        let Some(record) = self.live_record(entity) else {
            return false;
        };

        let Some(table) = self.archetypes.get_mut(record.table) else {
            tracing::error!(?entity, table = record.table.index(), "record points past the arena");
            return false;
        };
        if let Some(swapped) = table.remove_row(record.row) {
            self.set_row(swapped, record.row);
        }
        self.records.remove(&entity);

        tracing::debug!(?entity, "destroyed entity");
        true
    }

    /// Checks if a handle names a live entity.
    ///
    /// False for null, dead and stale (recycled slot) handles.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.live_record(entity).is_some()
    }

    /// Returns the number of live entities.
    #[inline]
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.records.alive_count()
    }

    /// Returns the table and row of a live entity.
    #[inline]
    #[must_use]
    pub fn location(&self, entity: Entity) -> Option<(TableId, usize)> {
        self.live_record(entity).map(|r| (r.table, r.row))
    }

    /// Iterates over all live entities in creation-slot order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.records.alive_keys().iter().copied()
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Registers a component type and returns its id.
    ///
    /// Registration also happens implicitly on the first
    /// [`World::add_component`] of the type.
    pub fn register_component<C: Component>(&mut self) -> ComponentId {
        self.registry.register::<C>()
    }

    /// Returns the id of a registered component type.
    #[inline]
    #[must_use]
    pub fn component_id<C: Component>(&self) -> Option<ComponentId> {
        self.registry.id_of::<C>()
    }

    /// Returns the component registry.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Adds a component to an entity, moving it to the matching archetype.
    ///
    /// If the entity already has a `C`, the stored value is replaced in place
    /// and the entity stays where it is.
    ///
    /// # Errors
    ///
    /// - [`EcsError::InvalidEntity`] for dead or stale handles.
    /// - [`EcsError::TableLimitReached`] if a new archetype is needed and the
    ///   table limit is reached.
    /// - [`EcsError::AllocationFailed`] if storage cannot grow.
    ///
    /// The entity and its components are unchanged when an error is returned.
    pub fn add_component<C: Component>(&mut self, entity: Entity, value: C) -> EcsResult<()> {
        let record = self.live_record(entity).ok_or(EcsError::InvalidEntity(entity))?;
        let id = self.registry.register::<C>();

        let from = self.table_mut(record.table)?;
        if from.has(id) {
            let slot = from
                .get_mut::<C>(id, record.row)
                .ok_or_else(|| Self::corrupt(entity, "row missing from its table"))?;
            *slot = value;
            return Ok(());
        }

        let info = *self
            .registry
            .info(id)
            .ok_or_else(|| Self::corrupt(entity, "component registered without info"))?;
        let to = self.archetypes.add_edge(record.table, &info)?;
        let (src, dst) = self
            .archetypes
            .pair_mut(record.table, to)
            .ok_or_else(|| Self::corrupt(entity, "add edge loops back to its table"))?;

        let moved = src.move_row_adding(record.row, dst, id, value)?;

        tracing::trace!(?entity, from = record.table.index(), to = to.index(), "added component");
        self.relocate(entity, record, to, moved.dst_row, moved.swapped);
        Ok(())
    }

    /// Removes a component from an entity and returns it, moving the entity
    /// to the matching archetype.
    ///
    /// # Errors
    ///
    /// - [`EcsError::InvalidEntity`] for dead or stale handles.
    /// - [`EcsError::MissingComponent`] if the entity has no `C`.
    /// - [`EcsError::TableLimitReached`] if a new archetype is needed and the
    ///   table limit is reached.
    /// - [`EcsError::AllocationFailed`] if storage cannot grow.
    pub fn remove_component<C: Component>(&mut self, entity: Entity) -> EcsResult<C> {
        let record = self.live_record(entity).ok_or(EcsError::InvalidEntity(entity))?;
        let missing = |component| EcsError::MissingComponent { entity, component };

        let id = self
            .registry
            .id_of::<C>()
            .ok_or_else(|| missing(ComponentId::NULL))?;
        let to = self.archetypes.remove_edge(record.table, id).map_err(|e| match e {
            EcsError::MissingComponent { component, .. } => missing(component),
            other => other,
        })?;
        let (src, dst) = self
            .archetypes
            .pair_mut(record.table, to)
            .ok_or_else(|| Self::corrupt(entity, "remove edge loops back to its table"))?;

        let (moved, value) = src.move_row_taking::<C>(record.row, dst, id)?;

        tracing::trace!(?entity, from = record.table.index(), to = to.index(), "removed component");
        self.relocate(entity, record, to, moved.dst_row, moved.swapped);
        Ok(value)
    }

    /// Gets a component of a live entity.
    #[must_use]
    pub fn get_component<C: Component>(&self, entity: Entity) -> Option<&C> {
        let record = self.live_record(entity)?;
        let id = self.registry.id_of::<C>()?;
        self.archetypes.get(record.table)?.get::<C>(id, record.row)
    }

    /// Gets a component of a live entity mutably.
    pub fn get_component_mut<C: Component>(&mut self, entity: Entity) -> Option<&mut C> {
        let record = self.live_record(entity)?;
        let id = self.registry.id_of::<C>()?;
        self.archetypes
            .get_mut(record.table)?
            .get_mut::<C>(id, record.row)
    }

    /// Checks if a live entity has a component.
    #[must_use]
    pub fn has_component<C: Component>(&self, entity: Entity) -> bool {
        let Some(record) = self.live_record(entity) else {
            return false;
        };
        let Some(id) = self.registry.id_of::<C>() else {
            return false;
        };
        self.archetypes
            .get(record.table)
            .is_some_and(|table| table.has(id))
    }

    // =========================================================================
    // Tables
    // =========================================================================

    /// Returns the number of archetype tables, root included.
    #[inline]
    #[must_use]
    pub fn table_count(&self) -> usize {
        self.archetypes.len()
    }

    /// Gets a table by handle.
    #[inline]
    #[must_use]
    pub fn table(&self, id: TableId) -> Option<&Table> {
        self.archetypes.get(id)
    }

    /// Iterates over all tables in creation order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.archetypes.iter()
    }

    /// Returns the archetype arena.
    #[inline]
    #[must_use]
    pub fn archetypes(&self) -> &Archetypes {
        &self.archetypes
    }

    pub(crate) fn archetypes_mut(&mut self) -> &mut Archetypes {
        &mut self.archetypes
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Destroys every entity. Tables, edges and registered components are
    /// kept, and destroyed slots stay cached so old handles remain stale.
    pub fn clear(&mut self) {
        let live: Vec<Entity> = self.records.alive_keys().iter().rev().copied().collect();
        for entity in &live {
            self.records.remove(entity);
        }
        self.archetypes.clear_rows();
        tracing::debug!(destroyed = live.len(), "cleared world");
    }

    /// Audits the record index against the tables.
    ///
    /// Checks that every table has one value per row in each column, that every
    /// row belongs to a live entity whose record points back at it, and that
    /// the row count matches the live entity count.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvariantViolation`] describing the first broken
    /// invariant.
    pub fn check_invariants(&self) -> EcsResult<()> {
        let mut rows = 0;
        for table in self.archetypes.iter() {
            if !table.is_lockstep() {
                return Err(Self::violation(format!(
                    "table {} has columns out of lockstep",
                    table.id().index()
                )));
            }
            for (row, &entity) in table.entities().iter().enumerate() {
                match self.records.get_exact(&entity) {
                    Some(r) if r.table == table.id() && r.row == row => {}
                    Some(r) => {
                        return Err(Self::violation(format!(
                            "{entity:?} stored at table {} row {row} but recorded at table {} row {}",
                            table.id().index(),
                            r.table.index(),
                            r.row
                        )))
                    }
                    None => {
                        return Err(Self::violation(format!(
                            "{entity:?} stored at table {} row {row} is not live",
                            table.id().index()
                        )))
                    }
                }
            }
            rows += table.len();
        }

        if rows != self.records.alive_count() {
            return Err(Self::violation(format!(
                "{rows} table rows for {} live entities",
                self.records.alive_count()
            )));
        }
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn live_record(&self, entity: Entity) -> Option<Record> {
        if entity.is_null() || !entity.is_alive() {
            return None;
        }
        self.records.get_exact(&entity).copied()
    }

    fn table_mut(&mut self, id: TableId) -> EcsResult<&mut Table> {
        self.archetypes
            .get_mut(id)
            .ok_or_else(|| Self::violation(format!("record points at missing table {}", id.index())))
    }

    /// Points `entity` at its new row and fixes the entity swapped into its
    /// old row.
    fn relocate(
        &mut self,
        entity: Entity,
        old: Record,
        table: TableId,
        row: usize,
        swapped: Option<Entity>,
    ) {
        if let Some(record) = self.records.get_mut(&entity) {
            record.table = table;
            record.row = row;
        }
        if let Some(swapped) = swapped {
            self.set_row(swapped, old.row);
        }
    }

    fn set_row(&mut self, entity: Entity, row: usize) {
        match self.records.get_mut(&entity) {
            Some(record) => record.row = row,
            None => tracing::error!(?entity, row, "swapped row belongs to no live entity"),
        }
    }

    fn corrupt(entity: Entity, what: &str) -> EcsError {
        Self::violation(format!("{entity:?}: {what}"))
    }

    fn violation(message: String) -> EcsError {
        tracing::error!(%message, "ECS invariant violated");
        EcsError::InvariantViolation(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::{Position, Velocity};
    use crate::ecs::id::Null;

    #[derive(Debug, PartialEq)]
    struct Name(String);

    #[test]
    fn test_world_creation() {
        let world = World::new();
        assert_eq!(world.entity_count(), 0);
        assert_eq!(world.table_count(), 1);
        assert!(world.check_invariants().is_ok());
    }

    #[test]
    fn test_create_destroy() {
        let mut world = World::new();

        let e1 = world.create_entity().unwrap();
        let e2 = world.create_entity().unwrap();
        assert_eq!(e1.index(), 0);
        assert_eq!(e2.index(), 1);
        assert!(world.is_alive(e1));
        assert_eq!(world.location(e1), Some((TableId::ROOT, 0)));

        assert!(world.destroy_entity(e1));
        assert!(!world.is_alive(e1));
        assert!(!world.destroy_entity(e1));
        assert_eq!(world.entity_count(), 1);
        assert_eq!(world.location(e2), Some((TableId::ROOT, 0)));

        // The slot comes back with a new generation.
        let e3 = world.create_entity().unwrap();
        assert_eq!(e3.index(), e1.index());
        assert_ne!(e3.generation(), e1.generation());
        assert!(!world.is_alive(e1));
        assert!(world.is_alive(e3));
        assert!(world.check_invariants().is_ok());
    }

    #[test]
    fn test_null_and_dead_handles_rejected() {
        let mut world = World::new();
        let e = world.create_entity().unwrap();

        assert!(!world.is_alive(Entity::from(Null)));
        assert!(!world.is_alive(e.killed()));
        assert!(!world.destroy_entity(Entity::NULL));
        assert_eq!(
            world.add_component(Entity::NULL, Position::default()),
            Err(EcsError::InvalidEntity(Entity::NULL))
        );
        assert_eq!(world.entity_count(), 1);
    }

    #[test]
    fn test_add_get_remove() {
        let mut world = World::new();
        let e = world.create_entity().unwrap();

        world.add_component(e, Position::new(1.0, 2.0)).unwrap();
        world.add_component(e, Name("probe".into())).unwrap();
        assert!(world.has_component::<Position>(e));
        assert!(!world.has_component::<Velocity>(e));
        assert_eq!(world.get_component::<Position>(e), Some(&Position::new(1.0, 2.0)));
        assert_eq!(world.get_component::<Name>(e), Some(&Name("probe".into())));
        assert_eq!(world.table_count(), 3);

        let name = world.remove_component::<Name>(e).unwrap();
        assert_eq!(name, Name("probe".into()));
        assert!(!world.has_component::<Name>(e));
        assert_eq!(world.get_component::<Position>(e), Some(&Position::new(1.0, 2.0)));
        assert!(world.check_invariants().is_ok());
    }

    #[test]
    fn test_add_existing_component_replaces_value() {
        let mut world = World::new();
        let e = world.create_entity().unwrap();
        world.add_component(e, Velocity::new(1.0, 1.0)).unwrap();
        let location = world.location(e);
        let tables = world.table_count();

        world.add_component(e, Velocity::new(5.0, 5.0)).unwrap();
        assert_eq!(world.get_component::<Velocity>(e), Some(&Velocity::new(5.0, 5.0)));
        assert_eq!(world.location(e), location);
        assert_eq!(world.table_count(), tables);
    }

    #[test]
    fn test_remove_missing_component() {
        let mut world = World::new();
        let e = world.create_entity().unwrap();

        let err = world.remove_component::<Position>(e).unwrap_err();
        assert!(matches!(err, EcsError::MissingComponent { entity, .. } if entity == e));

        world.add_component(e, Velocity::default()).unwrap();
        let err = world.remove_component::<Position>(e).unwrap_err();
        assert!(matches!(err, EcsError::MissingComponent { entity, .. } if entity == e));
        assert!(world.check_invariants().is_ok());
    }

    #[test]
    fn test_get_component_mut() {
        let mut world = World::new();
        let e = world.create_entity().unwrap();
        world.add_component(e, Position::default()).unwrap();

        world.get_component_mut::<Position>(e).unwrap().x = 9.0;
        assert_eq!(world.get_component::<Position>(e).unwrap().x, 9.0);
        assert!(world.get_component_mut::<Velocity>(e).is_none());
    }

    #[test]
    fn test_destroy_fixes_swapped_record() {
        let mut world = World::new();
        let a = world.create_entity().unwrap();
        let b = world.create_entity().unwrap();
        world.add_component(a, Position::new(1.0, 0.0)).unwrap();
        world.add_component(b, Position::new(2.0, 0.0)).unwrap();

        assert!(world.destroy_entity(a));
        let (table, row) = world.location(b).unwrap();
        assert_eq!(row, 0);
        assert_eq!(world.table(table).unwrap().entities(), &[b]);
        assert_eq!(world.get_component::<Position>(b), Some(&Position::new(2.0, 0.0)));
        assert!(world.check_invariants().is_ok());
    }

    #[test]
    fn test_entity_limit() {
        let config = WorldConfig {
            max_entities: 2,
            initial_entity_capacity: 2,
            ..WorldConfig::default()
        };
        let mut world = World::with_config(config).unwrap();

        let a = world.create_entity().unwrap();
        world.create_entity().unwrap();
        assert_eq!(
            world.create_entity(),
            Err(EcsError::EntityLimitReached { limit: 2 })
        );
        assert_eq!(world.entity_count(), 2);

        world.destroy_entity(a);
        assert!(world.create_entity().is_ok());
        assert!(world.check_invariants().is_ok());
    }

    #[test]
    fn test_table_limit_leaves_entity_intact() {
        let config = WorldConfig {
            max_tables: 2,
            initial_table_capacity: 2,
            ..WorldConfig::default()
        };
        let mut world = World::with_config(config).unwrap();
        let e = world.create_entity().unwrap();
        world.add_component(e, Position::new(3.0, 3.0)).unwrap();

        let err = world.add_component(e, Velocity::default()).unwrap_err();
        assert_eq!(err, EcsError::TableLimitReached { limit: 2 });
        assert_eq!(world.get_component::<Position>(e), Some(&Position::new(3.0, 3.0)));
        assert!(!world.has_component::<Velocity>(e));
        assert!(world.check_invariants().is_ok());
    }

    #[test]
    fn test_constructors_preallocate_root_rows() {
        let default_rows = WorldConfig::default().initial_entity_capacity;
        let world = World::new();
        assert!(world.table(TableId::ROOT).unwrap().capacity() >= default_rows);

        let world = World::with_config(WorldConfig::default()).unwrap();
        assert!(world.table(TableId::ROOT).unwrap().capacity() >= default_rows);

        let config = WorldConfig {
            initial_entity_capacity: 4096,
            ..WorldConfig::default()
        };
        let world = World::with_config(config).unwrap();
        assert!(world.table(TableId::ROOT).unwrap().capacity() >= 4096);
    }

    #[test]
    fn test_with_config_rejects_invalid() {
        let config = WorldConfig {
            max_entities: 0,
            ..WorldConfig::default()
        };
        assert!(matches!(World::with_config(config), Err(EcsError::InvalidConfig(_))));
    }

    #[test]
    fn test_clear_keeps_old_handles_stale() {
        let mut world = World::new();
        let a = world.create_entity().unwrap();
        let b = world.create_entity().unwrap();
        world.add_component(b, Velocity::default()).unwrap();

        world.clear();
        assert_eq!(world.entity_count(), 0);
        assert!(!world.is_alive(a));
        assert!(!world.is_alive(b));
        assert!(world.tables().all(Table::is_empty));

        let c = world.create_entity().unwrap();
        assert_ne!(c, a);
        assert_ne!(c, b);
        assert!(world.check_invariants().is_ok());
    }

    #[test]
    fn test_entities_lists_live_handles() {
        let mut world = World::new();
        let a = world.create_entity().unwrap();
        let b = world.create_entity().unwrap();
        world.destroy_entity(a);
        let live: Vec<Entity> = world.entities().collect();
        assert_eq!(live, vec![b]);
    }
}
