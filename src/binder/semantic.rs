//! Binder entry point and statement dispatch.

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::catalog::CatalogAccessor;
use crate::error::Result;
use crate::parser::ast::Statement;
use crate::parser::ParseResult;

use super::config::BinderConfig;
use super::scope::{ScopeParent, ScopeStack};

/// Semantic binder.
///
/// Holds no per-statement state: every call to [`Binder::bind`] starts from
/// an empty scope stack, so one binder can be shared across threads.
pub struct Binder<'a> {
    /// Catalog used for all lookups.
    pub(super) catalog: &'a dyn CatalogAccessor,
    pub(super) config: BinderConfig,
}

impl<'a> Binder<'a> {
    /// Creates a new binder with the default configuration.
    #[must_use]
    pub fn new(catalog: &'a dyn CatalogAccessor) -> Self {
        Self::with_config(catalog, BinderConfig::default())
    }

    /// Creates a new binder with the given configuration.
    #[must_use]
    pub fn with_config(catalog: &'a dyn CatalogAccessor, config: BinderConfig) -> Self {
        Binder { catalog, config }
    }

    /// Returns the binder configuration.
    #[must_use]
    pub fn config(&self) -> &BinderConfig {
        &self.config
    }

    /// Binds one statement, resolving names and annotating expressions in `pr`.
    ///
    /// # Errors
    ///
    /// Returns the first semantic violation found. The statement may be
    /// partially annotated afterwards.
    pub fn bind(&self, statement: &mut Statement, pr: &mut ParseResult) -> Result<()> {
        let mut scopes = ScopeStack::new();
        trace!(statement = statement.kind_name(), "binding statement");
        let result = self.bind_statement(statement, pr, &mut scopes);
        if let Err(e) = &result {
            debug!(statement = statement.kind_name(), error = %e, "bind failed");
        }
        result
    }

    /// Binds every statement held by `pr`, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first semantic violation found.
    pub fn bind_parse_result(&self, pr: &mut ParseResult) -> Result<()> {
        let mut statements = pr.take_statements();
        let result = statements
            .iter_mut()
            .try_for_each(|statement| self.bind(statement, pr));
        pr.restore_statements(statements);
        result
    }

    /// Binds independent parse results in parallel, one result per input.
    pub fn bind_all(&self, parse_results: &mut [ParseResult]) -> Vec<Result<()>> {
        parse_results
            .par_iter_mut()
            .map(|pr| self.bind_parse_result(pr))
            .collect()
    }

    fn bind_statement(
        &self,
        statement: &mut Statement,
        pr: &mut ParseResult,
        scopes: &mut ScopeStack,
    ) -> Result<()> {
        match statement {
            Statement::Select(select) => self.bind_select(select, pr, scopes, ScopeParent::Current),
            Statement::Insert(insert) => self.bind_insert(insert, pr, scopes),
            Statement::Update(update) => self.bind_update(update, pr, scopes),
            Statement::Delete(delete) => self.bind_delete(delete, pr, scopes),
            Statement::Create(create) => self.bind_create(create, pr, scopes),
            Statement::Drop(drop) => self.bind_drop(drop),
            Statement::Copy(copy) => self.bind_copy(copy, pr, scopes),
            Statement::Analyze(analyze) => {
                analyze
                    .table
                    .try_bind_database_name(&self.config.default_database);
                Ok(())
            }
            Statement::Prepare(_)
            | Statement::Execute(_)
            | Statement::Transaction(_)
            | Statement::CreateFunction(_) => {
                trace!(statement = statement.kind_name(), "nothing to bind");
                Ok(())
            }
        }
    }
}
