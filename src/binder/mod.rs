//! Binder module for semantic analysis.
//!
//! The binder walks parsed statements and resolves:
//! - Table references against the catalog
//! - Column references against the visible scopes, including correlated
//!   references into enclosing queries
//! - Star expressions into explicit column lists
//!
//! and annotates every expression with its value type, correlation depth,
//! subquery flag and display name. DDL and DML preconditions (existence,
//! uniqueness, arity and type agreement) are checked along the way.

mod coercion;
mod config;
mod ddl;
mod expression;
mod scope;
mod semantic;
mod statement;

pub use coercion::{convert, convert_value};
pub use config::{AmbiguityPolicy, BinderConfig, DEFAULT_DATABASE};
pub use scope::{
    BinderScope, NestedColumn, ResolvedColumn, ScopeGuard, ScopeParent, ScopeStack, TableBinding,
};
pub use semantic::Binder;
