//! # Component Columns
//!
//! A column is the contiguous store of one component type inside a table.
//! Tables hold their columns type-erased behind [`Column`] so that one table
//! type serves every archetype; typed access goes through a downcast to
//! [`TypedColumn`].

use std::any::{Any, TypeId};

use super::error::EcsResult;

/// A component value whose type is only known at runtime.
pub type BoxedComponent = Box<dyn Any + Send + Sync>;

/// Type-erased view of a [`TypedColumn`].
pub trait Column: Send + Sync + 'static {
    /// Number of stored values.
    fn len(&self) -> usize;

    /// Checks if the column stores no values.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `TypeId` of the stored component type.
    fn item_type(&self) -> TypeId;

    /// Name of the stored component type, for diagnostics.
    fn item_name(&self) -> &'static str;

    /// Creates an empty column of the same type.
    fn new_empty(&self) -> Box<dyn Column>;

    /// Reserves room for `additional` more values.
    ///
    /// # Errors
    ///
    /// Returns [`super::EcsError::AllocationFailed`] if the allocator refuses.
    fn reserve(&mut self, additional: usize) -> EcsResult<()>;

    /// Checks if `value` has this column's type.
    fn accepts(&self, value: &(dyn Any + Send + Sync)) -> bool;

    /// Appends a boxed value, handing it back if its type is wrong.
    ///
    /// # Errors
    ///
    /// Returns the value unchanged if it is not of the column's type.
    fn push_boxed(&mut self, value: BoxedComponent) -> Result<(), BoxedComponent>;

    /// Swap-removes the value at `row` and drops it.
    fn swap_remove_drop(&mut self, row: usize);

    /// Swap-removes the value at `row` and appends it to `dst`.
    ///
    /// # Panics
    ///
    /// Panics if `dst` stores a different type. Callers resolve column
    /// pairs by component id, so a mismatch means the table graph is corrupt.
    fn swap_remove_into(&mut self, row: usize, dst: &mut dyn Column);

    /// Upcast for downcasting to [`TypedColumn`].
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to [`TypedColumn`].
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Dense storage for a single component type.
pub struct TypedColumn<T> {
    data: Vec<T>,
}

impl<T: Send + Sync + 'static> TypedColumn<T> {
    /// Creates an empty column.
    #[must_use]
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Creates an empty, boxed column.
    #[must_use]
    pub fn boxed() -> Box<dyn Column> {
        Box::new(Self::new())
    }

    /// Appends a value.
    #[inline]
    pub fn push(&mut self, value: T) {
        self.data.push(value);
    }

    /// Returns the values as a slice, indexed by row.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Returns the values as a mutable slice, indexed by row.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Swap-removes and returns the value at `row`.
    #[inline]
    pub fn swap_remove(&mut self, row: usize) -> T {
        self.data.swap_remove(row)
    }
}

impl<T: Send + Sync + 'static> Default for TypedColumn<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> Column for TypedColumn<T> {
    #[inline]
    fn len(&self) -> usize {
        self.data.len()
    }

    fn item_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn item_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn new_empty(&self) -> Box<dyn Column> {
        Self::boxed()
    }

    fn reserve(&mut self, additional: usize) -> EcsResult<()> {
        self.data.try_reserve(additional)?;
        Ok(())
    }

    fn accepts(&self, value: &(dyn Any + Send + Sync)) -> bool {
        value.is::<T>()
    }

    fn push_boxed(&mut self, value: BoxedComponent) -> Result<(), BoxedComponent> {
        let value = value.downcast::<T>()?;
        self.data.push(*value);
        Ok(())
    }

    #[inline]
    fn swap_remove_drop(&mut self, row: usize) {
        self.data.swap_remove(row);
    }

    fn swap_remove_into(&mut self, row: usize, dst: &mut dyn Column) {
        let dst_name = dst.item_name();
        let Some(dst) = dst.as_any_mut().downcast_mut::<Self>() else {
            panic!(
                "column type mismatch: moving {} into {}",
                std::any::type_name::<T>(),
                dst_name
            );
        };
        dst.data.push(self.data.swap_remove(row));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_boxed_checks_type() {
        let mut column = TypedColumn::<u32>::new();
        assert!(column.push_boxed(Box::new(7u32)).is_ok());
        let rejected = column.push_boxed(Box::new(7u64)).unwrap_err();
        assert!(rejected.is::<u64>());
        assert_eq!(column.as_slice(), &[7]);
    }

    #[test]
    fn test_swap_remove_into_moves_value() {
        let mut src = TypedColumn::<String>::new();
        src.push("a".to_string());
        src.push("b".to_string());
        src.push("c".to_string());
        let mut dst = src.new_empty();

        src.swap_remove_into(0, dst.as_mut());
        assert_eq!(src.as_slice(), &["c".to_string(), "b".to_string()]);

        let dst = dst.as_any().downcast_ref::<TypedColumn<String>>().unwrap();
        assert_eq!(dst.as_slice(), &["a".to_string()]);
    }

    #[test]
    fn test_accepts_and_drop() {
        let mut column = TypedColumn::<f32>::new();
        assert!(column.accepts(&1.0f32));
        assert!(!column.accepts(&1.0f64));

        column.push(1.0);
        column.push(2.0);
        column.swap_remove_drop(0);
        assert_eq!(column.as_slice(), &[2.0]);
        assert_eq!(Column::len(&column), 1);
        assert_eq!(column.item_type(), TypeId::of::<f32>());
    }
}
