//! sqlbind - semantic binder for parsed SQL statements.
//!
//! Resolves table and column names in a parsed statement tree against a
//! catalog, validates DDL/DML preconditions, and annotates expressions with
//! the metadata later planning stages need.
//!
//! ```
//! use sqlbind::catalog::{Catalog, Column};
//! use sqlbind::parser::ast::{ObjectName, SelectStatement, Statement, TableRef};
//! use sqlbind::parser::{Expression, ParseResult};
//! use sqlbind::types::DataType;
//! use sqlbind::Binder;
//!
//! let mut catalog = Catalog::new("sqlbind");
//! catalog
//!     .create_table(None, "t", vec![Column::new("a", DataType::Integer)?])?;
//!
//! let mut pr = ParseResult::new();
//! let a = pr.add_expression(Expression::column(None, "a"));
//! let mut statement = Statement::Select(Box::new(SelectStatement {
//!     select_columns: vec![a],
//!     from: Some(TableRef::table(ObjectName::new("t"))),
//!     ..Default::default()
//! }));
//!
//! Binder::new(&catalog).bind(&mut statement, &mut pr)?;
//! assert_eq!(pr[a].return_type, DataType::Integer);
//! # Ok::<(), sqlbind::BindError>(())
//! ```

pub mod binder;
pub mod catalog;
pub mod error;
pub mod parser;
pub mod types;

pub use binder::{AmbiguityPolicy, Binder, BinderConfig};
pub use catalog::{Catalog, CatalogAccessor};
pub use error::{BindError, ObjectKind, Result};
pub use parser::ast::Statement;
pub use parser::ParseResult;
