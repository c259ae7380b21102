//! CREATE and DROP validation.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::error::{BindError, ObjectKind, Result};
use crate::parser::ast::{
    CreateIndex, CreateStatement, CreateTable, CreateTrigger, DropKind, DropStatement,
    ForeignKeyDefinition, IndexAttribute,
};
use crate::parser::ParseResult;

use super::scope::{ScopeGuard, ScopeParent, ScopeStack};
use super::Binder;

/// Aliases a trigger's WHEN clause sees its table under, besides its name.
const TRIGGER_ROW_ALIASES: [&str; 2] = ["old", "new"];

impl Binder<'_> {
    pub(super) fn bind_create(
        &self,
        create: &mut CreateStatement,
        pr: &mut ParseResult,
        scopes: &mut ScopeStack,
    ) -> Result<()> {
        let mut scope = scopes.open(ScopeParent::Current);
        match create {
            CreateStatement::Database(db) => {
                if !db.if_not_exists && self.catalog.database_oid(&db.name).is_some() {
                    debug!(database = %db.name, "database already exists");
                    return Err(BindError::already_exists(ObjectKind::Database, &db.name));
                }
                Ok(())
            }
            CreateStatement::Table(table) => self.bind_create_table(table, pr, &mut scope),
            CreateStatement::Index(index) => self.bind_create_index(index, pr, &mut scope),
            CreateStatement::Trigger(trigger) => self.bind_create_trigger(trigger, pr, &mut scope),
            CreateStatement::Schema(schema) => {
                trace!(schema = %schema.name, "CREATE SCHEMA needs no binding");
                Ok(())
            }
            CreateStatement::View(view) => {
                view.view
                    .try_bind_database_name(&self.config.default_database);
                self.bind_select(&mut view.query, pr, &mut scope, ScopeParent::Current)
            }
        }
    }

    fn bind_create_table(
        &self,
        create: &mut CreateTable,
        pr: &mut ParseResult,
        scope: &mut ScopeGuard<'_>,
    ) -> Result<()> {
        create
            .table
            .try_bind_database_name(&self.config.default_database);
        let table_name = create.table.name.clone();
        if self.lookup_table(&create.table).is_some() {
            if create.if_not_exists {
                trace!(table = %table_name, "table exists, skipping");
                return Ok(());
            }
            debug!(table = %table_name, "table already exists");
            return Err(BindError::already_exists(ObjectKind::Table, table_name));
        }

        let mut seen = HashSet::new();
        for column in &create.columns {
            if !seen.insert(column.name.to_lowercase()) {
                debug!(table = %table_name, column = %column.name, "duplicate column");
                return Err(BindError::already_exists(ObjectKind::Column, &column.name));
            }
        }
        if let Some(missing) = create
            .primary_key
            .iter()
            .find(|key| !seen.contains(&key.to_lowercase()))
        {
            debug!(table = %table_name, column = %missing, "primary key column not found");
            return Err(BindError::ColumnNotFound(missing.clone()));
        }

        scope.scope_mut().add_new_table(&table_name, &create.columns)?;
        for column in &create.columns {
            if let Some(default) = column.default {
                self.bind_expression(default, pr, scope)?;
            }
            if let Some(check) = column.check {
                self.bind_expression(check, pr, scope)?;
            }
        }

        for fk in &create.foreign_keys {
            self.check_foreign_key(create, fk)?;
        }
        Ok(())
    }

    /// Checks that `fk` references existing sink columns of matching types.
    fn check_foreign_key(&self, create: &CreateTable, fk: &ForeignKeyDefinition) -> Result<()> {
        let sink_schema = self
            .catalog
            .table_oid(&fk.sink_table)
            .and_then(|oid| self.catalog.schema(oid))
            .ok_or_else(|| {
                debug!(table = %fk.sink_table, "foreign key sink table not found");
                BindError::table_not_found(&fk.sink_table)
            })?;

        if fk.sources.len() != fk.sinks.len() {
            debug!(table = %fk.sink_table, "foreign key column count mismatch");
            return Err(BindError::ArityMismatch {
                context: format!("FOREIGN KEY REFERENCES {}", fk.sink_table),
                expected: fk.sinks.len(),
                actual: fk.sources.len(),
            });
        }

        for (source, sink) in fk.sources.iter().zip(&fk.sinks) {
            let sink_column = sink_schema
                .get_column(&sink.to_lowercase())
                .ok_or_else(|| BindError::ColumnNotFound(format!("{}.{sink}", fk.sink_table)))?;
            let source_column = create
                .columns
                .iter()
                .find(|col| col.name.eq_ignore_ascii_case(source))
                .ok_or_else(|| BindError::ColumnNotFound(source.clone()))?;
            if source_column.data_type != sink_column.data_type {
                debug!(source = %source, sink = %sink, "foreign key type mismatch");
                return Err(BindError::TypeMismatch {
                    context: format!("FOREIGN KEY ({source}) REFERENCES {}({sink})", fk.sink_table),
                    expected: sink_column.data_type,
                    actual: source_column.data_type,
                });
            }
        }
        Ok(())
    }

    fn bind_create_index(
        &self,
        create: &mut CreateIndex,
        pr: &mut ParseResult,
        scope: &mut ScopeGuard<'_>,
    ) -> Result<()> {
        create
            .table
            .try_bind_database_name(&self.config.default_database);
        if self.lookup_table(&create.table).is_none() {
            debug!(table = %create.table.name, "index table not found");
            return Err(BindError::table_not_found(&create.table.name));
        }
        if self.catalog.index_oid(&create.name).is_some() {
            if create.if_not_exists {
                trace!(index = %create.name, "index exists, skipping");
                return Ok(());
            }
            debug!(index = %create.name, "index already exists");
            return Err(BindError::already_exists(ObjectKind::Index, &create.name));
        }

        let alias = create.table.name.clone();
        self.register_table(&create.table, &alias, scope.scope_mut())?;
        for attribute in &create.attributes {
            match attribute {
                IndexAttribute::Column(column) => {
                    let known = scope
                        .scope()
                        .table_binding(&alias)
                        .is_some_and(|binding| binding.schema.contains(&column.to_lowercase()));
                    if !known {
                        debug!(index = %create.name, column = %column, "index column not found");
                        return Err(BindError::ColumnNotFound(column.clone()));
                    }
                }
                IndexAttribute::Expression(expr) => self.bind_expression(*expr, pr, scope)?,
            }
        }
        Ok(())
    }

    fn bind_create_trigger(
        &self,
        create: &mut CreateTrigger,
        pr: &mut ParseResult,
        scope: &mut ScopeGuard<'_>,
    ) -> Result<()> {
        create
            .table
            .try_bind_database_name(&self.config.default_database);
        let table_name = create.table.name.clone();
        for alias in std::iter::once(table_name.as_str()).chain(TRIGGER_ROW_ALIASES) {
            self.register_table(&create.table, alias, scope.scope_mut())?;
        }
        if let Some(when) = create.when {
            self.bind_expression(when, pr, scope)?;
        }
        Ok(())
    }

    /// Checks that the dropped object exists. Triggers, schemas, views and
    /// prepared statements are not checked.
    pub(super) fn bind_drop(&self, drop: &mut DropStatement) -> Result<()> {
        let missing = match &mut drop.kind {
            DropKind::Database(name) => self
                .catalog
                .database_oid(name)
                .is_none()
                .then(|| BindError::not_found(ObjectKind::Database, name.as_str())),
            DropKind::Table(name) => {
                name.try_bind_database_name(&self.config.default_database);
                self.lookup_table(name)
                    .is_none()
                    .then(|| BindError::table_not_found(&name.name))
            }
            DropKind::Index(name) => {
                name.try_bind_database_name(&self.config.default_database);
                self.catalog
                    .index_oid(&name.name)
                    .is_none()
                    .then(|| BindError::not_found(ObjectKind::Index, &name.name))
            }
            DropKind::Trigger(name) | DropKind::View(name) => {
                name.try_bind_database_name(&self.config.default_database);
                trace!(name = %name.name, "DROP target not checked");
                None
            }
            DropKind::Schema { name, .. } | DropKind::PreparedStatement(name) => {
                trace!(name = %name, "DROP target not checked");
                None
            }
        };

        match missing {
            Some(err) if !drop.if_exists => {
                debug!(error = %err, "DROP target not found");
                Err(err)
            }
            _ => Ok(()),
        }
    }
}
