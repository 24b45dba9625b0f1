//! # Queries
//!
//! A query selects every table whose signature contains a given set of
//! component types. Because tables group entities by exact archetype, a
//! query visits whole columns instead of testing entities one by one.
//!
//! ```rust
//! use nickel_core::ecs::{Position, Velocity, World};
//!
//! let mut world = World::new();
//! for i in 0..4 {
//!     let e = world.create_entity()?;
//!     world.add_component(e, Position::new(i as f32, 0.0))?;
//!     if i % 2 == 0 {
//!         world.add_component(e, Velocity::new(1.0, 0.0))?;
//!     }
//! }
//!
//! assert_eq!(world.query::<(Position,)>().count(), 4);
//! assert_eq!(world.query::<(Position, Velocity)>().count(), 2);
//! # Ok::<(), nickel_core::ecs::EcsError>(())
//! ```

use super::component::{Component, ComponentRegistry};
use super::id::{ComponentId, Entity};
use super::table::Table;
use super::world::World;

/// A static set of component types, written as a tuple: `(A,)`, `(A, B)`,
/// up to six types.
pub trait ComponentSet: 'static {
    /// Resolves the set to sorted component ids.
    ///
    /// Returns `None` if any type was never registered, in which case no
    /// table can match.
    fn ids(registry: &ComponentRegistry) -> Option<Vec<ComponentId>>;
}

macro_rules! impl_component_set {
    ($($name:ident),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            fn ids(registry: &ComponentRegistry) -> Option<Vec<ComponentId>> {
                let mut ids = vec![$(registry.id_of::<$name>()?),+];
                ids.sort_unstable();
                ids.dedup();
                Some(ids)
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);

/// The tables matched by a query.
#[derive(Debug, Clone)]
pub struct Query<'w> {
    ids: Vec<ComponentId>,
    tables: Vec<&'w Table>,
}

impl<'w> Query<'w> {
    fn empty() -> Self {
        Self {
            ids: Vec::new(),
            tables: Vec::new(),
        }
    }

    /// Returns the component ids the query requires.
    #[inline]
    #[must_use]
    pub fn ids(&self) -> &[ComponentId] {
        &self.ids
    }

    /// Returns the matched tables, empty ones included.
    #[inline]
    #[must_use]
    pub fn tables(&self) -> &[&'w Table] {
        &self.tables
    }

    /// Iterates over every entity in the matched tables.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.tables
            .iter()
            .flat_map(|table| table.entities().iter().copied())
    }

    /// Returns the number of matched entities.
    #[must_use]
    pub fn count(&self) -> usize {
        self.tables.iter().map(|table| table.len()).sum()
    }

    /// Checks if no entity matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

impl World {
    /// Selects every table holding all component types of `S`.
    #[must_use]
    pub fn query<S: ComponentSet>(&self) -> Query<'_> {
        match S::ids(self.registry()) {
            Some(ids) => self.query_ids(&ids),
            None => Query::empty(),
        }
    }

    /// Selects every table holding all the given component ids.
    ///
    /// An empty id list matches every table.
    #[must_use]
    pub fn query_ids(&self, ids: &[ComponentId]) -> Query<'_> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        let tables = self.archetypes().matching(&ids).collect();
        Query { ids, tables }
    }

    /// Iterates over every entity holding a `C`, with its value.
    pub fn iter<C: Component>(&self) -> impl Iterator<Item = (Entity, &C)> + '_ {
        let id = self.component_id::<C>();
        self.tables()
            .filter_map(move |table| Some((table, table.column::<C>(id?)?)))
            .flat_map(|(table, column)| table.entities().iter().copied().zip(column))
    }

    /// Visits every entity holding both an `A` and a `B`.
    ///
    /// `A` and `B` must be different types; with the same type nothing is
    /// visited.
    pub fn for_each_mut<A, B>(&mut self, mut f: impl FnMut(Entity, &mut A, &B))
    where
        A: Component,
        B: Component,
    {
        let (Some(a), Some(b)) = (self.component_id::<A>(), self.component_id::<B>()) else {
            return;
        };

        for table in self.archetypes_mut().iter_mut() {
            let Some((entities, left, right)) = table.rows_pair_mut::<A, B>(a, b) else {
                continue;
            };
            for ((&entity, x), y) in entities.iter().zip(left.iter_mut()).zip(right.iter()) {
                f(entity, x, y);
            }
        }
    }

    /// Iterates mutably over every table holding all component types of `S`,
    /// for systems that work on whole columns.
    pub fn query_tables_mut<S: ComponentSet>(&mut self) -> impl Iterator<Item = &mut Table> + '_ {
        let ids = S::ids(self.registry());
        self.archetypes_mut().iter_mut().filter(move |table| {
            ids.as_deref()
                .is_some_and(|ids| table.signature().is_superset_of(ids))
        })
    }
}
