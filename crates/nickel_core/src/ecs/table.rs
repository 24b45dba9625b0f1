//! # Archetype Tables
//!
//! A table stores every entity that has exactly the same set of component
//! types. Storage is a Structure of Arrays:
//!
//! ```text
//! signature:  [ Position | Velocity ]
//! entities:   [ e4       , e1       , e9       ]   <- row -> entity
//! columns[0]: [ P(e4)    , P(e1)    , P(e9)    ]
//! columns[1]: [ V(e4)    , V(e1)    , V(e9)    ]
//! ```
//!
//! Every column is index-aligned with `entities`. All mutations touch the
//! entity list and every column together, and all fallible work (type checks,
//! reservations) happens before the first column is written.
//!
//! A table's signature never changes after creation. Adding or removing a
//! component moves the entity to a different table; the cached links to those
//! neighbours are the table's [`Edge`]s.

use std::collections::HashMap;

use bytemuck::Pod;

use super::column::{BoxedComponent, Column, TypedColumn};
use super::component::Component;
use super::error::{EcsError, EcsResult};
use super::id::{ComponentId, Entity};

/// Stable handle of a table inside the archetype arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct TableId(u32);

impl TableId {
    /// The root table, holding entities without components.
    pub const ROOT: Self = Self(0);

    /// Handle that never names a table.
    pub const INVALID: Self = Self(u32::MAX);

    /// Creates a handle from an arena index.
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the arena index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Sorted, deduplicated set of component types identifying an archetype.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Signature {
    components: Vec<ComponentId>,
}

impl Signature {
    /// Creates a signature from component ids in any order.
    #[must_use]
    pub fn new(mut components: Vec<ComponentId>) -> Self {
        components.sort_unstable();
        components.dedup();
        Self { components }
    }

    /// The empty signature of the root table.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    /// Position of a component type in the signature (and in the columns).
    #[inline]
    #[must_use]
    pub fn position(&self, id: ComponentId) -> Option<usize> {
        self.components.binary_search(&id).ok()
    }

    /// Checks if the signature contains a component type.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: ComponentId) -> bool {
        self.position(id).is_some()
    }

    /// Checks if every id in `ids` is part of this signature.
    #[must_use]
    pub fn is_superset_of(&self, ids: &[ComponentId]) -> bool {
        ids.iter().all(|&id| self.contains(id))
    }

    /// Returns this signature plus `id`.
    #[must_use]
    pub fn with(&self, id: ComponentId) -> Self {
        let mut components = self.components.clone();
        if let Err(at) = components.binary_search(&id) {
            components.insert(at, id);
        }
        Self { components }
    }

    /// Returns this signature minus `id`.
    #[must_use]
    pub fn without(&self, id: ComponentId) -> Self {
        let mut components = self.components.clone();
        if let Ok(at) = components.binary_search(&id) {
            components.remove(at);
        }
        Self { components }
    }

    /// Returns the component ids in column order.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[ComponentId] {
        &self.components
    }

    /// Returns the number of component types.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Checks if this is the empty signature.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Cached neighbours of a table for one component type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Edge {
    /// Table reached by adding the component.
    pub add: Option<TableId>,
    /// Table reached by removing the component.
    pub remove: Option<TableId>,
}

/// Outcome of moving a row into another table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MovedRow {
    /// Row of the moved entity in the destination table.
    pub dst_row: usize,
    /// Entity that was swapped into the vacated source row, if any.
    pub swapped: Option<Entity>,
}

/// Columnar storage for one archetype.
pub struct Table {
    id: TableId,
    signature: Signature,
    entities: Vec<Entity>,
    columns: Vec<Box<dyn Column>>,
    edges: HashMap<ComponentId, Edge>,
}

impl Table {
    /// Creates an empty table.
    ///
    /// `columns[i]` must store the component `signature.as_slice()[i]`.
    ///
    /// # Panics
    ///
    /// Panics if there is not exactly one column per component type.
    #[must_use]
    pub fn new(id: TableId, signature: Signature, columns: Vec<Box<dyn Column>>) -> Self {
        assert_eq!(
            signature.len(),
            columns.len(),
            "table needs exactly one column per component type"
        );
        Self {
            id,
            signature,
            entities: Vec::new(),
            columns,
            edges: HashMap::new(),
        }
    }

    /// Creates the root table with no columns.
    #[must_use]
    pub fn root() -> Self {
        Self::new(TableId::ROOT, Signature::empty(), Vec::new())
    }

    /// Returns the table handle.
    #[inline]
    #[must_use]
    pub fn id(&self) -> TableId {
        self.id
    }

    /// Returns the archetype signature.
    #[inline]
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Returns the column headers, in column order.
    #[inline]
    #[must_use]
    pub fn component_types(&self) -> &[ComponentId] {
        self.signature.as_slice()
    }

    /// Returns the entity of every row.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Gets the entity stored at a row.
    #[inline]
    #[must_use]
    pub fn entity_at(&self, row: usize) -> Option<Entity> {
        self.entities.get(row).copied()
    }

    /// Returns the number of rows.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Checks if the table has no rows.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Checks if this table stores a component type.
    #[inline]
    #[must_use]
    pub fn has(&self, id: ComponentId) -> bool {
        self.signature.contains(id)
    }

    /// Returns the number of rows the entity list holds without reallocating.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entities.capacity()
    }

    /// Checks that every column has exactly one value per row.
    #[must_use]
    pub fn is_lockstep(&self) -> bool {
        self.columns.iter().all(|c| c.len() == self.entities.len())
    }

    /// Reserves room for `additional` rows in the entity list and every column.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::AllocationFailed`] if any reservation fails.
    pub fn reserve(&mut self, additional: usize) -> EcsResult<()> {
        self.entities.try_reserve(additional)?;
        for column in &mut self.columns {
            column.reserve(additional)?;
        }
        Ok(())
    }

    /// Appends a full row, one value per column in column order.
    ///
    /// Returns the new row index.
    ///
    /// # Errors
    ///
    /// - [`EcsError::ColumnCountMismatch`] if `values.len()` is not the column count.
    /// - [`EcsError::ColumnTypeMismatch`] if a value has the wrong type.
    /// - [`EcsError::AllocationFailed`] if the table cannot grow.
    ///
    /// The table is unchanged when an error is returned.
    pub fn append_row(&mut self, entity: Entity, values: Vec<BoxedComponent>) -> EcsResult<usize> {
        if values.len() != self.columns.len() {
            return Err(EcsError::ColumnCountMismatch {
                expected: self.columns.len(),
                actual: values.len(),
            });
        }
        for (value, (column, &id)) in values
            .iter()
            .zip(self.columns.iter().zip(self.signature.as_slice()))
        {
            if !column.accepts(&**value) {
                return Err(EcsError::ColumnTypeMismatch { column: id });
            }
        }
        self.reserve(1)?;

        let row = self.entities.len();
        self.entities.push(entity);
        for (column, value) in self.columns.iter_mut().zip(values) {
            if column.push_boxed(value).is_err() {
                unreachable!("column types were checked before the push");
            }
        }
        Ok(row)
    }

    /// Removes a row by swapping the last row into it.
    ///
    /// Returns the entity that now occupies `row`, or `None` if the removed
    /// row was the last one. The caller must update that entity's record.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    pub fn remove_row(&mut self, row: usize) -> Option<Entity> {
        assert!(row < self.entities.len(), "row {row} out of bounds");

        self.entities.swap_remove(row);
        for column in &mut self.columns {
            column.swap_remove_drop(row);
        }
        debug_assert!(self.is_lockstep());

        self.entities.get(row).copied()
    }

    /// Moves a row into `dst`, carrying over every component both tables share.
    ///
    /// Components `dst` does not store are dropped. `dst` must not store any
    /// component this table lacks, since the row could not be completed.
    ///
    /// # Errors
    ///
    /// - [`EcsError::MissingComponent`] naming the first component `dst`
    ///   stores that this table lacks.
    /// - [`EcsError::AllocationFailed`] if `dst` cannot grow.
    ///
    /// Neither table is changed when an error is returned.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    pub fn move_row_to(&mut self, row: usize, dst: &mut Table) -> EcsResult<MovedRow> {
        assert!(row < self.entities.len(), "row {row} out of bounds");
        self.check_covers(row, dst, None)?;
        dst.reserve(1)?;
        Ok(self.transfer(row, dst, None))
    }

    /// Moves a row into `dst`, writing `value` into the one column `dst` has
    /// beyond this table's.
    ///
    /// # Errors
    ///
    /// - [`EcsError::MissingComponent`] if `dst` has no column for `id`, or
    ///   stores another component this table lacks.
    /// - [`EcsError::ColumnTypeMismatch`] if `C` is not the type of that column.
    /// - [`EcsError::ColumnCountMismatch`] if `dst` is not exactly this table
    ///   plus `id`.
    /// - [`EcsError::AllocationFailed`] if `dst` cannot grow.
    ///
    /// Neither table is changed when an error is returned.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    pub fn move_row_adding<C: Component>(
        &mut self,
        row: usize,
        dst: &mut Table,
        id: ComponentId,
        value: C,
    ) -> EcsResult<MovedRow> {
        assert!(row < self.entities.len(), "row {row} out of bounds");

        let entity = self.entities[row];
        if !dst.has(id) {
            return Err(EcsError::MissingComponent { entity, component: id });
        }
        if dst.typed_column_mut::<C>(id).is_none() {
            return Err(EcsError::ColumnTypeMismatch { column: id });
        }
        self.check_covers(row, dst, Some(id))?;
        if dst.columns.len() != self.columns.len() + 1 {
            return Err(EcsError::ColumnCountMismatch {
                expected: self.columns.len() + 1,
                actual: dst.columns.len(),
            });
        }
        dst.reserve(1)?;

        let moved = self.transfer(row, dst, None);
        match dst.typed_column_mut::<C>(id) {
            Some(column) => column.push(value),
            None => unreachable!("column type was checked above"),
        }
        debug_assert!(dst.is_lockstep());
        Ok(moved)
    }

    /// Like [`Table::move_row_to`], but hands back the value of component
    /// `id` instead of dropping it.
    ///
    /// # Errors
    ///
    /// - [`EcsError::MissingComponent`] if this table has no `C` column for
    ///   `id`, if `dst` stores `id` too, or if `dst` stores a component this
    ///   table lacks.
    /// - [`EcsError::AllocationFailed`] if `dst` cannot grow.
    ///
    /// Neither table is changed when an error is returned.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    pub fn move_row_taking<C: Component>(
        &mut self,
        row: usize,
        dst: &mut Table,
        id: ComponentId,
    ) -> EcsResult<(MovedRow, C)> {
        assert!(row < self.entities.len(), "row {row} out of bounds");

        let entity = self.entities[row];
        let missing = EcsError::MissingComponent { entity, component: id };
        let at = self.signature.position(id).ok_or_else(|| missing.clone())?;
        if dst.has(id) || self.typed_column_mut::<C>(id).is_none() {
            return Err(missing);
        }
        self.check_covers(row, dst, None)?;
        dst.reserve(1)?;

        let value = match self.columns[at].as_any_mut().downcast_mut::<TypedColumn<C>>() {
            Some(column) => column.swap_remove(row),
            None => unreachable!("column type was checked above"),
        };
        Ok((self.transfer(row, dst, Some(at)), value))
    }

    /// Checks that every column of `dst`, except `extra`, can be filled from
    /// this table.
    fn check_covers(&self, row: usize, dst: &Table, extra: Option<ComponentId>) -> EcsResult<()> {
        let uncovered = dst
            .signature
            .as_slice()
            .iter()
            .find(|&&id| Some(id) != extra && !self.has(id));
        match uncovered {
            Some(&component) => Err(EcsError::MissingComponent {
                entity: self.entities[row],
                component,
            }),
            None => Ok(()),
        }
    }

    /// Moves the row once `dst` has room. Column `taken` was already
    /// swap-removed by the caller.
    fn transfer(&mut self, row: usize, dst: &mut Table, taken: Option<usize>) -> MovedRow {
        let entity = self.entities.swap_remove(row);
        let dst_row = dst.entities.len();
        dst.entities.push(entity);

        for (at, (column, &id)) in self
            .columns
            .iter_mut()
            .zip(self.signature.as_slice())
            .enumerate()
        {
            if Some(at) == taken {
                continue;
            }
            match dst.signature.position(id) {
                Some(target) => column.swap_remove_into(row, dst.columns[target].as_mut()),
                None => column.swap_remove_drop(row),
            }
        }
        debug_assert!(self.is_lockstep());

        MovedRow {
            dst_row,
            swapped: self.entities.get(row).copied(),
        }
    }

    /// Returns the values of one component type, indexed by row.
    #[must_use]
    pub fn column<C: Component>(&self, id: ComponentId) -> Option<&[C]> {
        let at = self.signature.position(id)?;
        self.columns[at]
            .as_any()
            .downcast_ref::<TypedColumn<C>>()
            .map(TypedColumn::as_slice)
    }

    /// Returns the values of one component type mutably, indexed by row.
    pub fn column_mut<C: Component>(&mut self, id: ComponentId) -> Option<&mut [C]> {
        self.typed_column_mut::<C>(id).map(TypedColumn::as_mut_slice)
    }

    /// Returns two different columns mutably at once.
    ///
    /// Returns `None` if `a == b` or either column is missing.
    pub fn column_pair_mut<A: Component, B: Component>(
        &mut self,
        a: ComponentId,
        b: ComponentId,
    ) -> Option<(&mut [A], &mut [B])> {
        self.rows_pair_mut(a, b).map(|(_, a, b)| (a, b))
    }

    /// Like [`Table::column_pair_mut`], with the row entities alongside.
    pub fn rows_pair_mut<A: Component, B: Component>(
        &mut self,
        a: ComponentId,
        b: ComponentId,
    ) -> Option<(&[Entity], &mut [A], &mut [B])> {
        let ia = self.signature.position(a)?;
        let ib = self.signature.position(b)?;
        if ia == ib {
            return None;
        }

        let (first, second) = if ia < ib {
            let (left, right) = self.columns.split_at_mut(ib);
            (&mut left[ia], &mut right[0])
        } else {
            let (left, right) = self.columns.split_at_mut(ia);
            (&mut right[0], &mut left[ib])
        };

        let a = first.as_any_mut().downcast_mut::<TypedColumn<A>>()?;
        let b = second.as_any_mut().downcast_mut::<TypedColumn<B>>()?;
        Some((&self.entities, a.as_mut_slice(), b.as_mut_slice()))
    }

    /// Returns the raw bytes of a `Pod` column, e.g. for a GPU upload.
    #[must_use]
    pub fn column_bytes<C: Component + Pod>(&self, id: ComponentId) -> Option<&[u8]> {
        self.column::<C>(id).map(bytemuck::cast_slice)
    }

    /// Gets one component of one row.
    #[inline]
    #[must_use]
    pub fn get<C: Component>(&self, id: ComponentId, row: usize) -> Option<&C> {
        self.column::<C>(id)?.get(row)
    }

    /// Gets one component of one row mutably.
    #[inline]
    pub fn get_mut<C: Component>(&mut self, id: ComponentId, row: usize) -> Option<&mut C> {
        self.column_mut::<C>(id)?.get_mut(row)
    }

    /// Returns the cached edge for a component type.
    #[inline]
    #[must_use]
    pub fn edge(&self, id: ComponentId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    /// Caches the table reached by adding `id`.
    pub fn set_add_edge(&mut self, id: ComponentId, to: TableId) {
        debug_assert!(!self.has(id), "add edge for a component the table has");
        self.edges.entry(id).or_default().add = Some(to);
    }

    /// Caches the table reached by removing `id`.
    pub fn set_remove_edge(&mut self, id: ComponentId, to: TableId) {
        debug_assert!(self.has(id), "remove edge for a component the table lacks");
        self.edges.entry(id).or_default().remove = Some(to);
    }

    /// Drops every row, keeping columns and edges.
    pub fn clear(&mut self) {
        self.entities.clear();
        for column in &mut self.columns {
            let empty = column.new_empty();
            *column = empty;
        }
    }

    /// Builds an empty column of the same type as the column of `id`.
    pub(crate) fn empty_column_like(&self, id: ComponentId) -> Option<Box<dyn Column>> {
        let at = self.signature.position(id)?;
        Some(self.columns[at].new_empty())
    }

    fn typed_column_mut<C: Component>(&mut self, id: ComponentId) -> Option<&mut TypedColumn<C>> {
        let at = self.signature.position(id)?;
        self.columns[at].as_any_mut().downcast_mut::<TypedColumn<C>>()
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("id", &self.id)
            .field("signature", &self.signature)
            .field("rows", &self.entities.len())
            .field("edges", &self.edges.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::{Position, Velocity};

    const POS: ComponentId = ComponentId::new(true, 0, 0);
    const VEL: ComponentId = ComponentId::new(true, 1, 0);
    const HP: ComponentId = ComponentId::new(true, 2, 0);

    fn entity(index: u32) -> Entity {
        Entity::new(true, index, 0)
    }

    fn pv_table() -> Table {
        Table::new(
            TableId::new(1),
            Signature::new(vec![VEL, POS]),
            vec![TypedColumn::<Position>::boxed(), TypedColumn::<Velocity>::boxed()],
        )
    }

    fn pv_row(i: f32) -> Vec<BoxedComponent> {
        vec![Box::new(Position::new(i, i)), Box::new(Velocity::new(-i, -i))]
    }

    #[test]
    fn test_signature_is_order_independent() {
        let a = Signature::new(vec![VEL, POS, VEL]);
        let b = Signature::new(vec![POS, VEL]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.position(POS), Some(0));
        assert!(a.is_superset_of(&[VEL]));
        assert!(!Signature::empty().is_superset_of(&[VEL]));
        assert_eq!(Signature::empty().with(VEL).with(POS), b);
        assert_eq!(b.without(VEL), Signature::new(vec![POS]));
    }

    #[test]
    fn test_append_and_get() {
        let mut table = pv_table();
        let row = table.append_row(entity(1), pv_row(1.0)).unwrap();
        assert_eq!(row, 0);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get::<Position>(POS, 0), Some(&Position::new(1.0, 1.0)));
        assert_eq!(table.get::<Velocity>(VEL, 0), Some(&Velocity::new(-1.0, -1.0)));
        assert!(table.get::<Velocity>(POS, 0).is_none());
        assert!(table.is_lockstep());
    }

    #[test]
    fn test_append_rejects_bad_rows_without_mutation() {
        let mut table = pv_table();
        table.append_row(entity(1), pv_row(1.0)).unwrap();

        let err = table
            .append_row(entity(2), vec![Box::new(Position::default())])
            .unwrap_err();
        assert_eq!(err, EcsError::ColumnCountMismatch { expected: 2, actual: 1 });

        let err = table
            .append_row(entity(2), vec![Box::new(Position::default()), Box::new(5u32)])
            .unwrap_err();
        assert_eq!(err, EcsError::ColumnTypeMismatch { column: VEL });

        assert_eq!(table.len(), 1);
        assert!(table.is_lockstep());
    }

    #[test]
    fn test_remove_row_reports_swapped_entity() {
        let mut table = pv_table();
        for i in 0..3 {
            table.append_row(entity(i), pv_row(i as f32)).unwrap();
        }

        assert_eq!(table.remove_row(0), Some(entity(2)));
        assert_eq!(table.entities(), &[entity(2), entity(1)]);
        assert_eq!(table.get::<Position>(POS, 0), Some(&Position::new(2.0, 2.0)));
        assert!(table.is_lockstep());

        assert_eq!(table.remove_row(1), None);
        assert_eq!(table.entities(), &[entity(2)]);
        assert!(table.is_lockstep());
    }

    fn pos_table() -> Table {
        Table::new(
            TableId::new(2),
            Signature::new(vec![POS]),
            vec![TypedColumn::<Position>::boxed()],
        )
    }

    #[test]
    fn test_move_row_to_drops_missing_components() {
        let mut src = pv_table();
        for i in 0..2 {
            src.append_row(entity(i), pv_row(i as f32)).unwrap();
        }
        let mut dst = pos_table();

        let moved = src.move_row_to(0, &mut dst).unwrap();
        assert_eq!(moved, MovedRow { dst_row: 0, swapped: Some(entity(1)) });
        assert_eq!(dst.entities(), &[entity(0)]);
        assert_eq!(dst.get::<Position>(POS, 0), Some(&Position::new(0.0, 0.0)));
        assert!(src.is_lockstep());
        assert!(dst.is_lockstep());
    }

    #[test]
    fn test_move_row_to_wider_table_rejected() {
        let mut narrow = pos_table();
        narrow.append_row(entity(0), vec![Box::new(Position::new(1.0, 1.0))]).unwrap();
        let mut wide = pv_table();

        let err = narrow.move_row_to(0, &mut wide).unwrap_err();
        assert_eq!(err, EcsError::MissingComponent { entity: entity(0), component: VEL });
        assert_eq!(narrow.entities(), &[entity(0)]);
        assert!(wide.is_empty());
        assert!(narrow.is_lockstep());
        assert!(wide.is_lockstep());
    }

    #[test]
    fn test_move_row_adding_writes_whole_row() {
        let mut narrow = pos_table();
        narrow.append_row(entity(0), vec![Box::new(Position::new(1.0, 1.0))]).unwrap();
        narrow.append_row(entity(1), vec![Box::new(Position::new(2.0, 2.0))]).unwrap();
        let mut wide = pv_table();

        let moved = narrow
            .move_row_adding(0, &mut wide, VEL, Velocity::new(9.0, 9.0))
            .unwrap();
        assert_eq!(moved, MovedRow { dst_row: 0, swapped: Some(entity(1)) });
        assert!(narrow.is_lockstep());
        assert!(wide.is_lockstep());
        assert_eq!(wide.get::<Position>(POS, 0), Some(&Position::new(1.0, 1.0)));
        assert_eq!(wide.get::<Velocity>(VEL, 0), Some(&Velocity::new(9.0, 9.0)));
    }

    #[test]
    fn test_move_row_adding_rejects_mismatched_tables() {
        let mut narrow = pos_table();
        narrow.append_row(entity(0), vec![Box::new(Position::new(1.0, 1.0))]).unwrap();
        let mut wide = pv_table();

        let err = narrow.move_row_adding(0, &mut wide, VEL, 7u32).unwrap_err();
        assert_eq!(err, EcsError::ColumnTypeMismatch { column: VEL });

        let err = narrow.move_row_adding(0, &mut wide, HP, 7u32).unwrap_err();
        assert_eq!(err, EcsError::MissingComponent { entity: entity(0), component: HP });

        // Same width: the new column would duplicate one the row already has.
        let mut same = pos_table();
        let err = narrow
            .move_row_adding(0, &mut same, POS, Position::default())
            .unwrap_err();
        assert_eq!(err, EcsError::ColumnCountMismatch { expected: 2, actual: 1 });

        assert_eq!(narrow.len(), 1);
        assert!(wide.is_empty());
        assert!(same.is_empty());
        assert!(narrow.is_lockstep());
        assert!(wide.is_lockstep());
    }

    #[test]
    fn test_move_row_taking_returns_value() {
        let mut src = pv_table();
        src.append_row(entity(0), pv_row(3.0)).unwrap();
        let mut dst = Table::new(
            TableId::new(2),
            Signature::new(vec![POS]),
            vec![TypedColumn::<Position>::boxed()],
        );

        let err = src.move_row_taking::<Position>(0, &mut dst, POS).unwrap_err();
        assert!(matches!(err, EcsError::MissingComponent { .. }));
        assert_eq!(src.len(), 1);

        let (moved, vel) = src.move_row_taking::<Velocity>(0, &mut dst, VEL).unwrap();
        assert_eq!(vel, Velocity::new(-3.0, -3.0));
        assert_eq!(moved, MovedRow { dst_row: 0, swapped: None });
        assert!(src.is_empty());
        assert!(src.is_lockstep());
        assert_eq!(dst.get::<Position>(POS, 0), Some(&Position::new(3.0, 3.0)));
    }

    #[test]
    fn test_column_pair_mut() {
        let mut table = pv_table();
        table.append_row(entity(0), pv_row(1.0)).unwrap();

        let (vel, pos) = table.column_pair_mut::<Velocity, Position>(VEL, POS).unwrap();
        pos[0].x += vel[0].x;
        assert_eq!(table.get::<Position>(POS, 0), Some(&Position::new(0.0, 1.0)));
        assert!(table.column_pair_mut::<Position, Position>(POS, POS).is_none());
    }

    #[test]
    fn test_column_bytes() {
        let mut table = pv_table();
        table.append_row(entity(0), pv_row(1.0)).unwrap();
        table.append_row(entity(1), pv_row(2.0)).unwrap();
        let bytes = table.column_bytes::<Position>(POS).unwrap();
        assert_eq!(bytes.len(), 2 * std::mem::size_of::<Position>());
    }

    #[test]
    fn test_edges_and_clear() {
        let mut table = pv_table();
        table.set_remove_edge(POS, TableId::ROOT);
        assert_eq!(table.edge(POS).unwrap().remove, Some(TableId::ROOT));
        assert_eq!(table.edge(POS).unwrap().add, None);
        assert!(table.edge(VEL).is_none());

        table.append_row(entity(0), pv_row(1.0)).unwrap();
        table.clear();
        assert!(table.is_empty());
        assert!(table.is_lockstep());
        assert!(table.edge(POS).is_some());
    }
}
