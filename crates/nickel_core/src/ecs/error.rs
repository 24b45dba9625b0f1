//! # ECS Error Types
//!
//! All recoverable errors the storage engine reports to its callers.

use thiserror::Error;

use super::id::{ComponentId, Entity};

/// Errors that can occur in the ECS storage engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// The identifier is null, dead, or refers to a recycled slot.
    #[error("invalid entity: {0:?}")]
    InvalidEntity(Entity),

    /// The entity does not hold the requested component.
    #[error("entity {entity:?} has no component {component:?}")]
    MissingComponent {
        /// The entity that was queried.
        entity: Entity,
        /// The component that was missing.
        component: ComponentId,
    },

    /// A sparse-set key was inserted while already live.
    #[error("duplicate sparse set key at index {index}")]
    DuplicateKey {
        /// Numeric index of the rejected key.
        index: usize,
    },

    /// A row was appended with the wrong number of values.
    #[error("row has {actual} values, table has {expected} columns")]
    ColumnCountMismatch {
        /// Number of columns in the table.
        expected: usize,
        /// Number of values supplied.
        actual: usize,
    },

    /// A row value does not have the type stored by its column.
    #[error("value type does not match column {column:?}")]
    ColumnTypeMismatch {
        /// The column whose type was violated.
        column: ComponentId,
    },

    /// No more entities can be created.
    #[error("entity limit reached: {limit}")]
    EntityLimitReached {
        /// The configured or structural limit.
        limit: usize,
    },

    /// No more archetype tables can be created.
    #[error("archetype table limit reached: {limit}")]
    TableLimitReached {
        /// The configured limit.
        limit: usize,
    },

    /// The allocator refused to grow a table or a sparse-set page.
    #[error("allocation failed while growing storage")]
    AllocationFailed,

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A structural invariant was found broken by an audit.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl From<std::collections::TryReserveError> for EcsError {
    fn from(_: std::collections::TryReserveError) -> Self {
        Self::AllocationFailed
    }
}

/// Result type for ECS operations.
pub type EcsResult<T> = Result<T, EcsError>;
