//! Query and DML statement binding.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::catalog::{Schema, TableOid};
use crate::error::{BindError, Result};
use crate::parser::ast::{
    CopyStatement, DeleteStatement, InsertSource, InsertStatement, ObjectName, SelectStatement,
    TableRef, TableRefKind, UpdateStatement,
};
use crate::parser::{ExprId, ExpressionType, ParseResult};
use crate::types::DataType;

use super::coercion;
use super::scope::{BinderScope, NestedColumn, ScopeGuard, ScopeParent, ScopeStack};
use super::Binder;

impl Binder<'_> {
    /// Binds a SELECT in a new scope attached per `parent`.
    ///
    /// `*` items of the select list are replaced in place by one bound
    /// column reference per visible column.
    pub(super) fn bind_select(
        &self,
        select: &mut SelectStatement,
        pr: &mut ParseResult,
        scopes: &mut ScopeStack,
        parent: ScopeParent,
    ) -> Result<()> {
        let mut scope = scopes.open(parent);
        trace!(depth = scope.scope().depth(), "binding SELECT");

        if let Some(from) = select.from.as_mut() {
            self.bind_table_ref(from, pr, &mut scope)?;
        }
        if let Some(where_clause) = select.where_clause {
            self.bind_expression(where_clause, pr, &mut scope)?;
        }
        if let Some(order_by) = &select.order_by {
            for item in &order_by.items {
                self.bind_expression(item.expr, pr, &mut scope)?;
            }
        }
        if let Some(limit) = &select.limit {
            trace!(limit = ?limit.limit, offset = ?limit.offset, "binding LIMIT");
        }
        if let Some(group_by) = &select.group_by {
            for &column in &group_by.columns {
                self.bind_expression(column, pr, &mut scope)?;
            }
            if let Some(having) = group_by.having {
                self.bind_expression(having, pr, &mut scope)?;
            }
        }

        let mut columns = Vec::with_capacity(select.select_columns.len());
        for &id in &select.select_columns {
            if pr[id].expression_type() == ExpressionType::Star {
                columns.extend(scope.generate_all_column_expressions(pr)?);
            } else {
                self.bind_expression(id, pr, &mut scope)?;
                columns.push(id);
            }
        }
        select.select_columns = columns;
        select.depth = Some(scope.scope().depth());
        Ok(())
    }

    /// Binds one FROM item into `scope`.
    pub(super) fn bind_table_ref(
        &self,
        table_ref: &mut TableRef,
        pr: &mut ParseResult,
        scope: &mut ScopeGuard<'_>,
    ) -> Result<()> {
        match &mut table_ref.kind {
            TableRefKind::Select(select) => {
                let Some(alias) = table_ref.alias.as_deref().filter(|a| !a.is_empty()) else {
                    debug!("derived table without alias");
                    return Err(BindError::MissingAlias);
                };
                self.bind_select(select, pr, scope, ScopeParent::Current)?;
                let columns = select
                    .select_columns
                    .iter()
                    .map(|&id| NestedColumn::new(&pr[id].name, pr[id].return_type))
                    .collect();
                scope.scope_mut().add_nested_table(alias, columns)
            }
            TableRefKind::Join(join) => {
                self.bind_table_ref(&mut join.left, pr, scope)?;
                self.bind_table_ref(&mut join.right, pr, scope)?;
                if let Some(condition) = join.condition {
                    self.bind_expression(condition, pr, scope)?;
                }
                Ok(())
            }
            TableRefKind::List(tables) => {
                for table in tables {
                    self.bind_table_ref(table, pr, scope)?;
                }
                Ok(())
            }
            TableRefKind::Table(name) => {
                name.try_bind_database_name(&self.config.default_database);
                let alias = table_ref.alias.as_deref().unwrap_or(&name.name);
                self.register_table(name, alias, scope.scope_mut())
            }
        }
    }

    /// Registers catalog table `name` under `alias`.
    pub(super) fn register_table(
        &self,
        name: &ObjectName,
        alias: &str,
        scope: &mut BinderScope,
    ) -> Result<()> {
        scope
            .add_regular_table(
                self.catalog,
                name.database_name(),
                name.namespace.as_deref(),
                &name.name,
                alias,
            )
            .map_err(|e| {
                debug!(table = %name.name, alias, error = %e, "table reference failed");
                e
            })
    }

    /// Looks up a table by (optionally namespace-qualified) name.
    pub(super) fn lookup_table(&self, name: &ObjectName) -> Option<TableOid> {
        match name.namespace.as_deref() {
            Some(namespace) => {
                let namespace = self.catalog.namespace_oid(namespace)?;
                self.catalog.table_oid_in(namespace, &name.name)
            }
            None => self.catalog.table_oid(&name.name),
        }
    }

    /// Binds the target of a DML statement into a detached scope and returns
    /// its schema.
    fn bind_target(
        &self,
        table: &mut ObjectName,
        alias: &str,
        scope: &mut ScopeGuard<'_>,
    ) -> Result<Arc<Schema>> {
        table.try_bind_database_name(&self.config.default_database);
        self.register_table(table, alias, scope.scope_mut())?;
        scope
            .scope()
            .table_binding(alias)
            .map(|binding| Arc::clone(&binding.schema))
            .ok_or_else(|| BindError::table_not_found(&table.name))
    }

    pub(super) fn bind_insert(
        &self,
        insert: &mut InsertStatement,
        pr: &mut ParseResult,
        scopes: &mut ScopeStack,
    ) -> Result<()> {
        let mut scope = scopes.open(ScopeParent::Detached);
        let alias = insert.table.name.clone();
        let schema = self.bind_target(&mut insert.table, &alias, &mut scope)?;

        let targets: Vec<DataType> = if insert.columns.is_empty() {
            schema.columns().iter().map(|col| col.data_type).collect()
        } else {
            insert
                .columns
                .iter()
                .map(|name| {
                    schema
                        .get_column(&name.to_lowercase())
                        .map(|col| col.data_type)
                        .ok_or_else(|| {
                            debug!(column = %name, table = %alias, "insert column not found");
                            BindError::ColumnNotFound(name.clone())
                        })
                })
                .collect::<Result<_>>()?
        };
        let context = format!("INSERT INTO {}", insert.table.name);

        match &mut insert.source {
            InsertSource::Select(select) => {
                self.bind_select(select, pr, &mut scope, ScopeParent::Detached)?;
                check_arity(&context, targets.len(), select.select_columns.len())
            }
            InsertSource::Values(rows) => {
                // VALUES see no table.
                let mut values_scope = scope.open(ScopeParent::Detached);
                for row in rows.iter_mut() {
                    check_arity(&context, targets.len(), row.len())?;
                    for (slot, &target) in row.iter_mut().zip(&targets) {
                        self.bind_expression(*slot, pr, &mut values_scope)?;
                        let value = &pr[*slot];
                        if value.expression_type() == ExpressionType::TypeCast
                            || value.return_type != target
                        {
                            *slot = coerce(pr, *slot, target)?;
                        }
                    }
                }
                Ok(())
            }
        }
    }

    pub(super) fn bind_update(
        &self,
        update: &mut UpdateStatement,
        pr: &mut ParseResult,
        scopes: &mut ScopeStack,
    ) -> Result<()> {
        let mut scope = scopes.open(ScopeParent::Detached);
        let alias = update
            .alias
            .clone()
            .unwrap_or_else(|| update.table.name.clone());
        let schema = self.bind_target(&mut update.table, &alias, &mut scope)?;

        if let Some(where_clause) = update.where_clause {
            self.bind_expression(where_clause, pr, &mut scope)?;
        }
        for assignment in &mut update.assignments {
            let Some(column) = schema.get_column(&assignment.column.to_lowercase()) else {
                debug!(column = %assignment.column, table = %alias, "update column not found");
                return Err(BindError::ColumnNotFound(assignment.column.clone()));
            };
            self.bind_expression(assignment.value, pr, &mut scope)?;

            let value = &pr[assignment.value];
            let literal = matches!(
                value.expression_type(),
                ExpressionType::Constant | ExpressionType::TypeCast
            );
            if self.config.coerce_update_values && literal && value.return_type != column.data_type
            {
                assignment.value = coerce(pr, assignment.value, column.data_type)?;
            }
        }
        Ok(())
    }

    pub(super) fn bind_delete(
        &self,
        delete: &mut DeleteStatement,
        pr: &mut ParseResult,
        scopes: &mut ScopeStack,
    ) -> Result<()> {
        let mut scope = scopes.open(ScopeParent::Detached);
        let alias = delete.table.name.clone();
        self.bind_target(&mut delete.table, &alias, &mut scope)?;
        if let Some(where_clause) = delete.where_clause {
            self.bind_expression(where_clause, pr, &mut scope)?;
        }
        Ok(())
    }

    pub(super) fn bind_copy(
        &self,
        copy: &mut CopyStatement,
        pr: &mut ParseResult,
        scopes: &mut ScopeStack,
    ) -> Result<()> {
        match &mut copy.table {
            Some(table) => {
                let mut scope = scopes.open(ScopeParent::Detached);
                let alias = table.name.clone();
                self.bind_target(table, &alias, &mut scope)?;
                let columns = scope.generate_all_column_expressions(pr)?;
                copy.select.select_columns.extend(columns);
                Ok(())
            }
            None => self.bind_select(&mut copy.select, pr, scopes, ScopeParent::Detached),
        }
    }
}

/// Registers a copy of `id` converted to `target` and returns the new id.
fn coerce(pr: &mut ParseResult, id: ExprId, target: DataType) -> Result<ExprId> {
    let converted = coercion::convert(pr, id, target)?;
    trace!(from = id.index(), %target, "coerced value");
    Ok(pr.add_expression(converted))
}

fn check_arity(context: &str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        return Ok(());
    }
    debug!(context, expected, actual, "arity mismatch");
    Err(BindError::ArityMismatch {
        context: context.to_string(),
        expected,
        actual,
    })
}
