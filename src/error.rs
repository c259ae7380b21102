//! Error types for sqlbind binding operations.

use std::fmt;

use thiserror::Error;

use crate::types::DataType;

/// Result type alias using [`BindError`].
pub type Result<T> = std::result::Result<T, BindError>;

/// Kind of catalog object named by an existence error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Database,
    Namespace,
    Table,
    Index,
    Column,
}

impl ObjectKind {
    /// Returns the lower-case name used in error messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ObjectKind::Database => "database",
            ObjectKind::Namespace => "namespace",
            ObjectKind::Table => "table",
            ObjectKind::Index => "index",
            ObjectKind::Column => "column",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised while binding a statement.
///
/// Binding is fail-fast: the first violation aborts the whole statement.
#[derive(Debug, Error)]
pub enum BindError {
    /// An object that must not exist is already in the catalog.
    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: ObjectKind, name: String },

    /// An object that must exist is missing from the catalog.
    #[error("{kind} '{name}' does not exist")]
    NotFound { kind: ObjectKind, name: String },

    /// Derived table without an alias.
    #[error("Alias not found for query derived table")]
    MissingAlias,

    /// Column reference that matches no visible table.
    #[error("Cannot find column '{0}'")]
    ColumnNotFound(String),

    /// Unqualified column reference that matches several visible tables.
    #[error("Ambiguous column name '{0}'")]
    AmbiguousColumn(String),

    /// The same alias registered twice in one scope.
    #[error("Duplicate table alias '{0}'")]
    DuplicateAlias(String),

    /// Qualified column reference whose table alias is not visible.
    #[error("Invalid table reference '{0}'")]
    InvalidTableReference(String),

    /// `*` used where no table is visible.
    #[error("Invalid [Expression :: STAR]: no table is visible")]
    InvalidStarExpression,

    /// Mismatched element counts (insert values, foreign key columns).
    #[error("{context}: expected {expected} columns, got {actual}")]
    ArityMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// Mismatched declared types.
    #[error("{context}: expected {expected}, got {actual}")]
    TypeMismatch {
        context: String,
        expected: DataType,
        actual: DataType,
    },

    /// A literal that cannot be reinterpreted as the target type.
    #[error("Cannot convert {value} to {target}")]
    ConversionError { value: String, target: DataType },

    /// Catalog construction or snapshot failure.
    #[error("Catalog error: {0}")]
    Catalog(String),
}

impl BindError {
    /// Creates a table [`BindError::NotFound`].
    #[must_use]
    pub fn table_not_found(name: impl Into<String>) -> Self {
        BindError::NotFound {
            kind: ObjectKind::Table,
            name: name.into(),
        }
    }

    /// Creates a [`BindError::NotFound`] of the given kind.
    #[must_use]
    pub fn not_found(kind: ObjectKind, name: impl Into<String>) -> Self {
        BindError::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Creates a [`BindError::AlreadyExists`] of the given kind.
    #[must_use]
    pub fn already_exists(kind: ObjectKind, name: impl Into<String>) -> Self {
        BindError::AlreadyExists {
            kind,
            name: name.into(),
        }
    }

    /// Returns true if this is a missing-table error.
    #[must_use]
    pub fn is_table_not_found(&self) -> bool {
        matches!(
            self,
            BindError::NotFound {
                kind: ObjectKind::Table,
                ..
            }
        )
    }
}
