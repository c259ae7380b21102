//! Binder scopes for table and column visibility.
//!
//! Scopes live on an explicit [`ScopeStack`]. Opening a scope returns a
//! [`ScopeGuard`] that pops it when dropped, so every scope is released on
//! every exit path, and a child guard mutably borrows its parent guard, so a
//! scope can never be closed while a scope opened after it is still live.

use std::iter;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use tracing::trace;

use crate::catalog::{CatalogAccessor, DatabaseOid, Schema, TableOid};
use crate::error::{BindError, ObjectKind, Result};
use crate::parser::ast::ColumnDefinition;
use crate::parser::{ColumnBinding, ExprId, Expression, ExpressionKind, ParseResult};
use crate::types::DataType;

use super::config::AmbiguityPolicy;

/// A catalog table visible under some alias.
#[derive(Debug, Clone)]
pub struct TableBinding {
    pub database: DatabaseOid,
    pub table: TableOid,
    pub schema: Arc<Schema>,
}

/// Output column of a derived table.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedColumn {
    pub name: String,
    pub data_type: DataType,
}

impl NestedColumn {
    /// Creates a nested column; the name is lower-cased.
    #[must_use]
    pub fn new(name: &str, data_type: DataType) -> Self {
        NestedColumn {
            name: name.to_lowercase(),
            data_type,
        }
    }
}

#[derive(Debug, Clone)]
enum ScopeEntry {
    Regular(TableBinding),
    Nested(Vec<NestedColumn>),
}

impl ScopeEntry {
    fn lookup(&self, column: &str) -> Option<(ColumnBinding, DataType)> {
        match self {
            ScopeEntry::Regular(binding) => binding.schema.get_column(column).map(|col| {
                (
                    ColumnBinding::Table {
                        database: binding.database,
                        table: binding.table,
                        column: col.oid,
                    },
                    col.data_type,
                )
            }),
            ScopeEntry::Nested(columns) => columns
                .iter()
                .position(|c| c.name == column)
                .map(|position| (ColumnBinding::Nested { position }, columns[position].data_type)),
        }
    }

    fn columns(&self) -> Vec<(String, ColumnBinding, DataType)> {
        match self {
            ScopeEntry::Regular(binding) => binding
                .schema
                .columns()
                .iter()
                .map(|col| {
                    (
                        col.name.clone(),
                        ColumnBinding::Table {
                            database: binding.database,
                            table: binding.table,
                            column: col.oid,
                        },
                        col.data_type,
                    )
                })
                .collect(),
            ScopeEntry::Nested(columns) => columns
                .iter()
                .enumerate()
                .map(|(position, col)| {
                    (
                        col.name.clone(),
                        ColumnBinding::Nested { position },
                        col.data_type,
                    )
                })
                .collect(),
        }
    }
}

/// Result of resolving a column reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedColumn {
    /// Alias of the table the column was found in.
    pub table_alias: String,
    pub binding: ColumnBinding,
    pub data_type: DataType,
    /// Depth of the scope the column was found in.
    pub depth: u32,
}

/// Tables visible to one statement or subquery.
#[derive(Debug, Clone, Default)]
pub struct BinderScope {
    /// Alias -> table, in registration order.
    entries: Vec<(String, ScopeEntry)>,
    /// Stack index of the enclosing scope for correlated references.
    parent: Option<usize>,
    depth: u32,
}

impl BinderScope {
    /// Returns the correlation depth of this scope (0 for roots).
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Returns true if any table or derived table is registered.
    #[must_use]
    pub fn has_tables(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Returns the catalog table registered under `alias`.
    #[must_use]
    pub fn table_binding(&self, alias: &str) -> Option<&TableBinding> {
        match self.entry(&alias.to_lowercase()) {
            Some(ScopeEntry::Regular(binding)) => Some(binding),
            _ => None,
        }
    }

    /// Looks up a catalog table and makes it visible under `alias`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database, namespace or table does not exist,
    /// or `alias` is already registered in this scope.
    pub fn add_regular_table(
        &mut self,
        catalog: &dyn CatalogAccessor,
        database: &str,
        namespace: Option<&str>,
        table: &str,
        alias: &str,
    ) -> Result<()> {
        let db_oid = catalog
            .database_oid(database)
            .ok_or_else(|| BindError::not_found(ObjectKind::Database, database))?;
        let table_oid = match namespace {
            Some(ns) => {
                let ns_oid = catalog
                    .namespace_oid(ns)
                    .ok_or_else(|| BindError::not_found(ObjectKind::Namespace, ns))?;
                catalog.table_oid_in(ns_oid, table)
            }
            None => catalog.table_oid(table),
        }
        .ok_or_else(|| BindError::table_not_found(table))?;
        let schema = catalog
            .schema(table_oid)
            .ok_or_else(|| BindError::table_not_found(table))?;

        trace!(table, alias, oid = %table_oid, "registered table in scope");
        self.insert(
            alias,
            ScopeEntry::Regular(TableBinding {
                database: db_oid,
                table: table_oid,
                schema,
            }),
        )
    }

    /// Makes the output columns of a derived table visible under `alias`.
    ///
    /// # Errors
    ///
    /// Returns an error if `alias` is already registered in this scope.
    pub fn add_nested_table(&mut self, alias: &str, columns: Vec<NestedColumn>) -> Result<()> {
        trace!(alias, columns = columns.len(), "registered derived table in scope");
        self.insert(alias, ScopeEntry::Nested(columns))
    }

    /// Makes the columns of a table that is being created visible under its name.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is already registered in this scope.
    pub fn add_new_table(&mut self, name: &str, columns: &[ColumnDefinition]) -> Result<()> {
        let columns = columns
            .iter()
            .map(|col| NestedColumn::new(&col.name, col.data_type))
            .collect();
        self.insert(name, ScopeEntry::Nested(columns))
    }

    fn entry(&self, alias: &str) -> Option<&ScopeEntry> {
        self.entries
            .iter()
            .find(|(name, _)| name == alias)
            .map(|(_, entry)| entry)
    }

    fn insert(&mut self, alias: &str, entry: ScopeEntry) -> Result<()> {
        let alias = alias.to_lowercase();
        if self.entry(&alias).is_some() {
            return Err(BindError::DuplicateAlias(alias));
        }
        self.entries.push((alias, entry));
        Ok(())
    }

    /// Finds `column` among this scope's tables only.
    fn find_column(&self, column: &str, policy: AmbiguityPolicy) -> Result<Option<ResolvedColumn>> {
        let mut found: Option<ResolvedColumn> = None;
        for (alias, entry) in &self.entries {
            let Some((binding, data_type)) = entry.lookup(column) else {
                continue;
            };
            if found.is_some() {
                match policy {
                    AmbiguityPolicy::Reject => {
                        return Err(BindError::AmbiguousColumn(column.to_string()))
                    }
                    AmbiguityPolicy::FirstMatch => continue,
                }
            }
            found = Some(ResolvedColumn {
                table_alias: alias.clone(),
                binding,
                data_type,
                depth: self.depth,
            });
        }
        Ok(found)
    }
}

/// Where a newly opened scope attaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeParent {
    /// The innermost live scope (if any) becomes the parent, allowing
    /// correlated references into it.
    Current,
    /// A root scope that sees no enclosing tables.
    Detached,
}

/// Stack of live binder scopes.
#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<BinderScope>,
}

impl ScopeStack {
    /// Creates an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a scope; it is closed when the returned guard is dropped.
    pub fn open(&mut self, parent: ScopeParent) -> ScopeGuard<'_> {
        let parent = match parent {
            ScopeParent::Current => self.frames.len().checked_sub(1),
            ScopeParent::Detached => None,
        };
        let depth = parent.map_or(0, |p| self.frames[p].depth + 1);
        let index = self.frames.len();
        self.frames.push(BinderScope {
            entries: Vec::new(),
            parent,
            depth,
        });
        trace!(index, depth, "opened scope");
        ScopeGuard { stack: self, index }
    }

    /// Returns the number of live scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns true if no scope is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Returns the innermost live scope.
    #[must_use]
    pub fn current(&self) -> Option<&BinderScope> {
        self.frames.last()
    }

    /// Returns true if the innermost scope has any table registered.
    #[must_use]
    pub fn has_tables(&self) -> bool {
        self.current().is_some_and(BinderScope::has_tables)
    }

    /// Innermost scope followed by its ancestors.
    fn chain(&self) -> impl Iterator<Item = &BinderScope> {
        iter::successors(self.frames.len().checked_sub(1), move |&i| {
            self.frames[i].parent
        })
        .map(move |i| &self.frames[i])
    }

    /// Resolves a column without a table qualifier.
    ///
    /// The innermost scope containing the column wins; within one scope the
    /// ambiguity policy decides between several tables.
    ///
    /// # Errors
    ///
    /// Returns an error if no visible table has the column, or (under
    /// [`AmbiguityPolicy::Reject`]) several tables of one scope do.
    pub fn resolve_unqualified_column(
        &self,
        column: &str,
        policy: AmbiguityPolicy,
    ) -> Result<ResolvedColumn> {
        for scope in self.chain() {
            if let Some(resolved) = scope.find_column(column, policy)? {
                return Ok(resolved);
            }
        }
        Err(BindError::ColumnNotFound(column.to_string()))
    }

    /// Resolves `table.column`.
    ///
    /// # Errors
    ///
    /// Returns an error if no visible scope has the alias `table`, or the
    /// table has no such column.
    pub fn resolve_qualified_column(&self, table: &str, column: &str) -> Result<ResolvedColumn> {
        for scope in self.chain() {
            let Some(entry) = scope.entry(table) else {
                continue;
            };
            let (binding, data_type) = entry
                .lookup(column)
                .ok_or_else(|| BindError::ColumnNotFound(format!("{table}.{column}")))?;
            return Ok(ResolvedColumn {
                table_alias: table.to_string(),
                binding,
                data_type,
                depth: scope.depth,
            });
        }
        Err(BindError::InvalidTableReference(table.to_string()))
    }

    /// Expands `*` into one bound column reference per column of every table
    /// of the innermost scope, in registration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the innermost scope has no tables.
    pub fn generate_all_column_expressions(&self, pr: &mut ParseResult) -> Result<Vec<ExprId>> {
        let scope = self
            .current()
            .filter(|s| s.has_tables())
            .ok_or(BindError::InvalidStarExpression)?;

        let mut exprs = Vec::new();
        for (alias, entry) in &scope.entries {
            for (name, binding, data_type) in entry.columns() {
                let mut expr = Expression::column(Some(alias.as_str()), &name);
                if let ExpressionKind::ColumnValue(col) = &mut expr.kind {
                    col.binding = Some(binding);
                }
                expr.return_type = data_type;
                expr.depth = Some(scope.depth);
                expr.name = name;
                exprs.push(pr.add_expression(expr));
            }
        }
        Ok(exprs)
    }
}

/// A live scope; dropping it closes the scope.
///
/// Dereferences to the whole [`ScopeStack`], so nested scopes are opened
/// through the guard.
#[derive(Debug)]
pub struct ScopeGuard<'a> {
    stack: &'a mut ScopeStack,
    index: usize,
}

impl ScopeGuard<'_> {
    /// Returns the scope this guard owns.
    #[must_use]
    pub fn scope(&self) -> &BinderScope {
        &self.stack.frames[self.index]
    }

    /// Returns the scope this guard owns, mutably.
    pub fn scope_mut(&mut self) -> &mut BinderScope {
        &mut self.stack.frames[self.index]
    }

    /// Closes the scope.
    pub fn close(self) {}
}

impl Deref for ScopeGuard<'_> {
    type Target = ScopeStack;

    fn deref(&self) -> &ScopeStack {
        self.stack
    }
}

impl DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut ScopeStack {
        self.stack
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        trace!(index = self.index, "closed scope");
        self.stack.frames.truncate(self.index);
    }
}
