//! Read-only catalog lookup interface consumed by the binder.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::schema::{Catalog, Schema};

macro_rules! define_oid {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u32);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_oid!(
    /// Database object identifier.
    DatabaseOid
);
define_oid!(
    /// Namespace (schema) object identifier.
    NamespaceOid
);
define_oid!(
    /// Table object identifier.
    TableOid
);
define_oid!(
    /// Index object identifier.
    IndexOid
);
define_oid!(
    /// Column identifier, unique within its table.
    ColumnOid
);

/// Read-only lookups against the system catalog.
///
/// Misses are reported as `None` rather than errors; the binder decides which
/// misses are violations. Implementations must be safe for concurrent lookups
/// from several binding threads.
pub trait CatalogAccessor: Send + Sync {
    /// Looks up a database by name.
    fn database_oid(&self, name: &str) -> Option<DatabaseOid>;

    /// Looks up a namespace by name.
    fn namespace_oid(&self, name: &str) -> Option<NamespaceOid>;

    /// Looks up a table by name on the accessor's search path.
    fn table_oid(&self, name: &str) -> Option<TableOid>;

    /// Looks up a table by name inside one namespace.
    fn table_oid_in(&self, namespace: NamespaceOid, name: &str) -> Option<TableOid>;

    /// Looks up an index by name.
    fn index_oid(&self, name: &str) -> Option<IndexOid>;

    /// Returns the schema of a table.
    fn schema(&self, table: TableOid) -> Option<Arc<Schema>>;
}

impl CatalogAccessor for Catalog {
    fn database_oid(&self, name: &str) -> Option<DatabaseOid> {
        self.get_database(name)
    }

    fn namespace_oid(&self, name: &str) -> Option<NamespaceOid> {
        self.get_namespace(name)
    }

    fn table_oid(&self, name: &str) -> Option<TableOid> {
        self.get_table_oid(self.search_path(), name)
    }

    fn table_oid_in(&self, namespace: NamespaceOid, name: &str) -> Option<TableOid> {
        self.get_table_oid(namespace, name)
    }

    fn index_oid(&self, name: &str) -> Option<IndexOid> {
        self.get_index(name)
    }

    fn schema(&self, table: TableOid) -> Option<Arc<Schema>> {
        self.get_schema(table)
    }
}

/// Lets a host keep mutating the catalog between binds while binding threads
/// only take short read locks per lookup.
impl CatalogAccessor for RwLock<Catalog> {
    fn database_oid(&self, name: &str) -> Option<DatabaseOid> {
        self.read().database_oid(name)
    }

    fn namespace_oid(&self, name: &str) -> Option<NamespaceOid> {
        self.read().namespace_oid(name)
    }

    fn table_oid(&self, name: &str) -> Option<TableOid> {
        self.read().table_oid(name)
    }

    fn table_oid_in(&self, namespace: NamespaceOid, name: &str) -> Option<TableOid> {
        self.read().table_oid_in(namespace, name)
    }

    fn index_oid(&self, name: &str) -> Option<IndexOid> {
        self.read().index_oid(name)
    }

    fn schema(&self, table: TableOid) -> Option<Arc<Schema>> {
        self.read().schema(table)
    }
}
