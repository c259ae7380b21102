//! Binder configuration.

/// Database name bound onto unqualified table references by default.
pub const DEFAULT_DATABASE: &str = "sqlbind";

/// How an unqualified column matching several tables of one scope is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmbiguityPolicy {
    /// Fail with [`BindError::AmbiguousColumn`](crate::BindError::AmbiguousColumn).
    #[default]
    Reject,
    /// Bind to the table registered first.
    FirstMatch,
}

/// Configuration for a [`Binder`](super::Binder).
#[derive(Debug, Clone)]
pub struct BinderConfig {
    /// Database name for table references without one.
    pub default_database: String,
    /// Handling of ambiguous unqualified columns.
    pub ambiguous_columns: AmbiguityPolicy,
    /// Coerce constant UPDATE assignment values to their column type.
    pub coerce_update_values: bool,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            default_database: DEFAULT_DATABASE.to_string(),
            ambiguous_columns: AmbiguityPolicy::Reject,
            coerce_update_values: true,
        }
    }
}

impl BinderConfig {
    /// Creates a new binder configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default database name.
    #[must_use]
    pub fn with_default_database(mut self, database: &str) -> Self {
        self.default_database = database.to_string();
        self
    }

    /// Sets the ambiguity policy.
    #[must_use]
    pub fn with_ambiguous_columns(mut self, policy: AmbiguityPolicy) -> Self {
        self.ambiguous_columns = policy;
        self
    }

    /// Enables or disables UPDATE value coercion.
    #[must_use]
    pub fn with_coerce_update_values(mut self, coerce: bool) -> Self {
        self.coerce_update_values = coerce;
        self
    }
}
