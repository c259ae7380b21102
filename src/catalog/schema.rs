//! Table schemas and the in-memory catalog.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::accessor::{ColumnOid, DatabaseOid, IndexOid, NamespaceOid, TableOid};
use crate::error::{BindError, ObjectKind, Result};
use crate::types::DataType;

/// Namespace every catalog starts with and searches by default.
pub const DEFAULT_NAMESPACE: &str = "public";

/// Definition of a single column in a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column identifier (assigned by [`Schema::new`]).
    pub oid: ColumnOid,
    /// Column name (lower-case).
    pub name: String,
    /// Column data type.
    pub data_type: DataType,
    /// Whether NULL is allowed.
    pub nullable: bool,
}

impl Column {
    /// Creates a new nullable column definition.
    ///
    /// # Errors
    ///
    /// Returns an error if the column name is empty.
    pub fn new(name: &str, data_type: DataType) -> Result<Self> {
        if name.is_empty() {
            return Err(BindError::Catalog("Column name cannot be empty".into()));
        }
        Ok(Column {
            oid: ColumnOid(0), // Will be set by schema
            name: name.to_lowercase(),
            data_type,
            nullable: true,
        })
    }

    /// Marks the column NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// Ordered column list of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Creates a schema, numbering columns by ordinal starting at 1.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no columns or a column name repeats.
    pub fn new(mut columns: Vec<Column>) -> Result<Self> {
        if columns.is_empty() {
            return Err(BindError::Catalog(
                "Table must have at least one column".into(),
            ));
        }

        let mut seen = HashSet::new();
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(BindError::Catalog(format!(
                    "Duplicate column name '{}'",
                    col.name
                )));
            }
        }

        for (i, col) in columns.iter_mut().enumerate() {
            col.oid = ColumnOid(i as u32 + 1);
        }
        Ok(Schema { columns })
    }

    /// Returns the columns in declared order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Finds a column definition by name.
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns true if the schema has a column with this name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get_column(name).is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    oid: IndexOid,
    table: TableOid,
}

/// In-memory catalog for one connected database.
///
/// Names are case-insensitive and stored lower-case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    /// All databases known to the system, including the connected one.
    databases: HashMap<String, DatabaseOid>,
    /// Namespaces of the connected database.
    namespaces: HashMap<String, NamespaceOid>,
    /// (namespace, table name) -> table OID.
    table_names: HashMap<(NamespaceOid, String), TableOid>,
    tables: HashMap<TableOid, Arc<Schema>>,
    indexes: HashMap<String, IndexEntry>,
    search_path: NamespaceOid,
    next_oid: u32,
}

impl Catalog {
    /// Creates a catalog connected to `database`, with an empty `public` namespace.
    #[must_use]
    pub fn new(database: &str) -> Self {
        let mut catalog = Catalog {
            databases: HashMap::new(),
            namespaces: HashMap::new(),
            table_names: HashMap::new(),
            tables: HashMap::new(),
            indexes: HashMap::new(),
            search_path: NamespaceOid(0),
            next_oid: 1,
        };
        let db = DatabaseOid(catalog.next_id());
        catalog.databases.insert(database.to_lowercase(), db);
        let public = NamespaceOid(catalog.next_id());
        catalog.namespaces.insert(DEFAULT_NAMESPACE.to_string(), public);
        catalog.search_path = public;
        catalog
    }

    /// Returns the next OID and increments the counter.
    fn next_id(&mut self) -> u32 {
        let id = self.next_oid;
        self.next_oid += 1;
        id
    }

    /// Registers a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if a database with the same name already exists.
    pub fn create_database(&mut self, name: &str) -> Result<DatabaseOid> {
        let name = name.to_lowercase();
        if self.databases.contains_key(&name) {
            return Err(BindError::already_exists(ObjectKind::Database, name));
        }
        let oid = DatabaseOid(self.next_id());
        debug!(database = %name, %oid, "created database");
        self.databases.insert(name, oid);
        Ok(oid)
    }

    /// Registers a new namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if a namespace with the same name already exists.
    pub fn create_namespace(&mut self, name: &str) -> Result<NamespaceOid> {
        let name = name.to_lowercase();
        if self.namespaces.contains_key(&name) {
            return Err(BindError::already_exists(ObjectKind::Namespace, name));
        }
        let oid = NamespaceOid(self.next_id());
        debug!(namespace = %name, %oid, "created namespace");
        self.namespaces.insert(name, oid);
        Ok(oid)
    }

    /// Registers a new table in `namespace` (the search path when `None`).
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace is unknown, the table already exists,
    /// or the schema is invalid.
    pub fn create_table(
        &mut self,
        namespace: Option<&str>,
        name: &str,
        columns: Vec<Column>,
    ) -> Result<TableOid> {
        let ns = match namespace {
            Some(ns) => self
                .get_namespace(ns)
                .ok_or_else(|| BindError::not_found(ObjectKind::Namespace, ns))?,
            None => self.search_path,
        };
        let name = name.to_lowercase();
        if self.table_names.contains_key(&(ns, name.clone())) {
            return Err(BindError::already_exists(ObjectKind::Table, name));
        }
        let schema = Schema::new(columns)?;
        let oid = TableOid(self.next_id());
        debug!(table = %name, %oid, columns = schema.columns().len(), "created table");
        self.table_names.insert((ns, name), oid);
        self.tables.insert(oid, Arc::new(schema));
        Ok(oid)
    }

    /// Registers a new index on a table of the search path.
    ///
    /// # Errors
    ///
    /// Returns an error if the index exists or the table does not.
    pub fn create_index(&mut self, name: &str, table: &str) -> Result<IndexOid> {
        let name = name.to_lowercase();
        if self.indexes.contains_key(&name) {
            return Err(BindError::already_exists(ObjectKind::Index, name));
        }
        let table_oid = self
            .get_table_oid(self.search_path, table)
            .ok_or_else(|| BindError::table_not_found(table))?;
        let oid = IndexOid(self.next_id());
        debug!(index = %name, %oid, table = %table_oid, "created index");
        self.indexes.insert(
            name,
            IndexEntry {
                oid,
                table: table_oid,
            },
        );
        Ok(oid)
    }

    /// Removes a table of the search path together with its indexes.
    ///
    /// # Errors
    ///
    /// Returns an error if the table does not exist.
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        let key = (self.search_path, name.to_lowercase());
        let oid = self
            .table_names
            .remove(&key)
            .ok_or_else(|| BindError::table_not_found(name))?;
        self.tables.remove(&oid);
        self.indexes.retain(|_, idx| idx.table != oid);
        debug!(table = %key.1, %oid, "dropped table");
        Ok(())
    }

    /// Returns the namespace unqualified table names resolve against.
    #[must_use]
    pub fn search_path(&self) -> NamespaceOid {
        self.search_path
    }

    /// Retrieves a database OID by name.
    #[must_use]
    pub fn get_database(&self, name: &str) -> Option<DatabaseOid> {
        self.databases.get(&name.to_lowercase()).copied()
    }

    /// Retrieves a namespace OID by name.
    #[must_use]
    pub fn get_namespace(&self, name: &str) -> Option<NamespaceOid> {
        self.namespaces.get(&name.to_lowercase()).copied()
    }

    /// Retrieves a table OID by namespace and name.
    #[must_use]
    pub fn get_table_oid(&self, namespace: NamespaceOid, name: &str) -> Option<TableOid> {
        self.table_names
            .get(&(namespace, name.to_lowercase()))
            .copied()
    }

    /// Retrieves an index OID by name.
    #[must_use]
    pub fn get_index(&self, name: &str) -> Option<IndexOid> {
        self.indexes.get(&name.to_lowercase()).map(|idx| idx.oid)
    }

    /// Retrieves a table schema by OID.
    #[must_use]
    pub fn get_schema(&self, table: TableOid) -> Option<Arc<Schema>> {
        self.tables.get(&table).map(Arc::clone)
    }

    /// Serializes the catalog to bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| BindError::Catalog(format!("Failed to serialize catalog: {e}")))
    }

    /// Deserializes a catalog from bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| BindError::Catalog(format!("Failed to deserialize catalog: {e}")))
    }
}
