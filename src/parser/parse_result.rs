//! Owning arena for the statements and expression nodes of one parse.

use std::ops::{Index, IndexMut};

use super::ast::Statement;
use super::expression::{ExprId, Expression};

/// Statements and every expression node they reference.
///
/// Nodes are never removed, so an [`ExprId`] stays valid for the lifetime of
/// the parse result, including nodes the binder synthesizes.
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    statements: Vec<Statement>,
    expressions: Vec<Expression>,
}

impl ParseResult {
    /// Creates an empty parse result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of an expression node and returns its id.
    pub fn add_expression(&mut self, expr: Expression) -> ExprId {
        let id = ExprId(self.expressions.len());
        self.expressions.push(expr);
        id
    }

    /// Appends a top-level statement.
    pub fn add_statement(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    /// Returns the top-level statements.
    #[must_use]
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Returns the expression node with the given id, if any.
    #[must_use]
    pub fn get(&self, id: ExprId) -> Option<&Expression> {
        self.expressions.get(id.0)
    }

    /// Returns the number of expression nodes owned.
    #[must_use]
    pub fn expression_count(&self) -> usize {
        self.expressions.len()
    }

    /// Moves the statements out so they can be bound against this arena.
    pub(crate) fn take_statements(&mut self) -> Vec<Statement> {
        std::mem::take(&mut self.statements)
    }

    /// Puts statements taken with [`ParseResult::take_statements`] back.
    pub(crate) fn restore_statements(&mut self, statements: Vec<Statement>) {
        self.statements = statements;
    }
}

impl Index<ExprId> for ParseResult {
    type Output = Expression;

    fn index(&self, id: ExprId) -> &Expression {
        &self.expressions[id.0]
    }
}

impl IndexMut<ExprId> for ParseResult {
    fn index_mut(&mut self, id: ExprId) -> &mut Expression {
        &mut self.expressions[id.0]
    }
}
