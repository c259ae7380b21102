//! Catalog lookup interface and an in-memory catalog.

mod accessor;
mod schema;

pub use accessor::{CatalogAccessor, ColumnOid, DatabaseOid, IndexOid, NamespaceOid, TableOid};
pub use schema::{Catalog, Column, Schema, DEFAULT_NAMESPACE};
