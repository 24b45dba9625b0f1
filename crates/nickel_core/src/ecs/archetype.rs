//! # Archetype Graph
//!
//! Owns every [`Table`] in an arena addressed by [`TableId`] and links the
//! tables into a graph: table `A` has an add edge for component `C` to the
//! table whose signature is `A + C`, and that table has the reciprocal remove
//! edge back to `A`.
//!
//! Edges are created on first use and cached. A signature is looked up before
//! a table is created, so every signature maps to exactly one table no matter
//! which path through the graph reached it.
//!
//! ## Performance
//!
//! - Cached transition: O(1) (one hash lookup on the source table)
//! - First transition: O(k) to build the signature plus one table allocation
//! - Matching: O(tables)

use std::collections::HashMap;

use super::column::Column;
use super::component::ComponentInfo;
use super::error::{EcsError, EcsResult};
use super::id::{ComponentId, Entity};
use super::table::{Signature, Table, TableId};

/// Arena of archetype tables.
#[derive(Debug)]
pub struct Archetypes {
    tables: Vec<Table>,
    by_signature: HashMap<Signature, TableId>,
    max_tables: usize,
}

impl Archetypes {
    /// Creates the arena holding only the root table.
    ///
    /// # Arguments
    ///
    /// * `max_tables` - Upper bound on the number of tables, root included
    /// * `initial_capacity` - Number of table slots to preallocate
    #[must_use]
    pub fn new(max_tables: usize, initial_capacity: usize) -> Self {
        let mut tables = Vec::with_capacity(initial_capacity.max(1));
        tables.push(Table::root());

        let mut by_signature = HashMap::with_capacity(initial_capacity.max(1));
        by_signature.insert(Signature::empty(), TableId::ROOT);

        Self {
            tables,
            by_signature,
            max_tables,
        }
    }

    /// Returns the root table.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Table {
        &self.tables[TableId::ROOT.index()]
    }

    /// Returns the root table mutably.
    #[inline]
    pub fn root_mut(&mut self) -> &mut Table {
        &mut self.tables[TableId::ROOT.index()]
    }

    /// Gets a table by handle.
    #[inline]
    #[must_use]
    pub fn get(&self, id: TableId) -> Option<&Table> {
        self.tables.get(id.index())
    }

    /// Gets a table by handle mutably.
    #[inline]
    pub fn get_mut(&mut self, id: TableId) -> Option<&mut Table> {
        self.tables.get_mut(id.index())
    }

    /// Borrows two different tables mutably at once.
    ///
    /// Returns `None` if `a == b` or either handle is out of range.
    pub fn pair_mut(&mut self, a: TableId, b: TableId) -> Option<(&mut Table, &mut Table)> {
        let (ia, ib) = (a.index(), b.index());
        if ia == ib || ia >= self.tables.len() || ib >= self.tables.len() {
            return None;
        }

        if ia < ib {
            let (left, right) = self.tables.split_at_mut(ib);
            Some((&mut left[ia], &mut right[0]))
        } else {
            let (left, right) = self.tables.split_at_mut(ia);
            Some((&mut right[0], &mut left[ib]))
        }
    }

    /// Finds the table with exactly this signature.
    #[inline]
    #[must_use]
    pub fn find(&self, signature: &Signature) -> Option<TableId> {
        self.by_signature.get(signature).copied()
    }

    /// Returns the number of tables, root included.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Always false: the root table exists from construction.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Returns the configured table limit.
    #[inline]
    #[must_use]
    pub fn max_tables(&self) -> usize {
        self.max_tables
    }

    /// Iterates over all tables in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    /// Iterates mutably over all tables in creation order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.tables.iter_mut()
    }

    /// Iterates over tables whose signature contains every id in `ids`.
    pub fn matching<'a, 'b>(
        &'a self,
        ids: &'b [ComponentId],
    ) -> impl Iterator<Item = &'a Table> + 'b
    where
        'a: 'b,
    {
        self.tables
            .iter()
            .filter(move |table| table.signature().is_superset_of(ids))
    }

    /// Returns the table reached from `from` by adding `component`.
    ///
    /// Follows the cached edge if there is one; otherwise finds or creates the
    /// neighbour and caches the edge in both directions.
    ///
    /// # Errors
    ///
    /// - [`EcsError::TableLimitReached`] if a new table is needed and the
    ///   arena is full.
    /// - [`EcsError::AllocationFailed`] if the arena cannot grow.
    ///
    /// # Panics
    ///
    /// Panics if `from` is not a table of this arena.
    pub fn add_edge(&mut self, from: TableId, component: &ComponentInfo) -> EcsResult<TableId> {
        let source = &self.tables[from.index()];
        if let Some(to) = source.edge(component.id).and_then(|edge| edge.add) {
            return Ok(to);
        }
        debug_assert!(!source.has(component.id), "add edge to a component already present");

        let signature = source.signature().with(component.id);
        let to = match self.find(&signature) {
            Some(to) => to,
            None => {
                let columns = signature
                    .as_slice()
                    .iter()
                    .map(|&id| {
                        if id == component.id {
                            component.new_column()
                        } else {
                            self.column_template(from, id)
                        }
                    })
                    .collect();
                self.create_table(signature, columns)?
            }
        };

        self.tables[from.index()].set_add_edge(component.id, to);
        self.tables[to.index()].set_remove_edge(component.id, from);
        Ok(to)
    }

    /// Returns the table reached from `from` by removing `component`.
    ///
    /// # Errors
    ///
    /// - [`EcsError::MissingComponent`] if `from` does not store `component`.
    /// - [`EcsError::TableLimitReached`] if a new table is needed and the
    ///   arena is full.
    /// - [`EcsError::AllocationFailed`] if the arena cannot grow.
    ///
    /// # Panics
    ///
    /// Panics if `from` is not a table of this arena.
    pub fn remove_edge(&mut self, from: TableId, component: ComponentId) -> EcsResult<TableId> {
        let source = &self.tables[from.index()];
        if !source.has(component) {
            return Err(EcsError::MissingComponent {
                entity: Entity::NULL,
                component,
            });
        }
        if let Some(to) = source.edge(component).and_then(|edge| edge.remove) {
            return Ok(to);
        }

        let signature = source.signature().without(component);
        let to = match self.find(&signature) {
            Some(to) => to,
            None => {
                let columns = signature
                    .as_slice()
                    .iter()
                    .map(|&id| self.column_template(from, id))
                    .collect();
                self.create_table(signature, columns)?
            }
        };

        self.tables[from.index()].set_remove_edge(component, to);
        self.tables[to.index()].set_add_edge(component, from);
        Ok(to)
    }

    /// Drops every row of every table. Tables and edges are kept.
    pub fn clear_rows(&mut self) {
        for table in &mut self.tables {
            table.clear();
        }
    }

    fn column_template(&self, from: TableId, id: ComponentId) -> Box<dyn Column> {
        match self.tables[from.index()].empty_column_like(id) {
            Some(column) => column,
            None => unreachable!("neighbour signature differs by exactly one component"),
        }
    }

    fn create_table(
        &mut self,
        signature: Signature,
        columns: Vec<Box<dyn Column>>,
    ) -> EcsResult<TableId> {
        if self.tables.len() >= self.max_tables {
            tracing::warn!(limit = self.max_tables, "archetype table limit reached");
            return Err(EcsError::TableLimitReached {
                limit: self.max_tables,
            });
        }
        self.tables.try_reserve(1)?;
        self.by_signature.try_reserve(1)?;

        let id = TableId::new(self.tables.len() as u32);
        tracing::debug!(table = id.index(), components = signature.len(), "created archetype table");

        self.by_signature.insert(signature.clone(), id);
        self.tables.push(Table::new(id, signature, columns));
        Ok(id)
    }
}
