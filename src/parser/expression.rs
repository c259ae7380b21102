//! Expression nodes stored in the [`ParseResult`](super::ParseResult) arena.

use std::fmt;

use crate::catalog::{ColumnOid, DatabaseOid, TableOid};
use crate::error::{BindError, Result};
use crate::types::{DataType, Value};

use super::ast::SelectStatement;

/// Index of an expression node inside its [`ParseResult`](super::ParseResult).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub(crate) usize);

impl ExprId {
    /// Returns the arena slot of this node.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Catalog identity of a resolved column reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnBinding {
    /// Column of a physical catalog table.
    Table {
        database: DatabaseOid,
        table: TableOid,
        column: ColumnOid,
    },
    /// Output column of a derived table (or of a table being created),
    /// identified by its position in that table's column list.
    Nested { position: usize },
}

/// A possibly table-qualified column reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnValue {
    /// Table alias qualifier; filled in with the matching alias once bound.
    pub table_name: Option<String>,
    /// Column name.
    pub column_name: String,
    /// Resolved identity, `None` until bound.
    pub binding: Option<ColumnBinding>,
}

/// Scalar operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    /// Unary minus.
    Negate,
    Concat,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Like,
    NotLike,
    In,
    And,
    Or,
    Not,
    IsNull,
    IsNotNull,
    Exists,
}

impl OperatorKind {
    /// Returns the SQL spelling of this operator.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            OperatorKind::Plus => "+",
            OperatorKind::Minus | OperatorKind::Negate => "-",
            OperatorKind::Multiply => "*",
            OperatorKind::Divide => "/",
            OperatorKind::Modulo => "%",
            OperatorKind::Concat => "||",
            OperatorKind::Equal => "=",
            OperatorKind::NotEqual => "<>",
            OperatorKind::LessThan => "<",
            OperatorKind::LessThanOrEqual => "<=",
            OperatorKind::GreaterThan => ">",
            OperatorKind::GreaterThanOrEqual => ">=",
            OperatorKind::Like => "LIKE",
            OperatorKind::NotLike => "NOT LIKE",
            OperatorKind::In => "IN",
            OperatorKind::And => "AND",
            OperatorKind::Or => "OR",
            OperatorKind::Not => "NOT",
            OperatorKind::IsNull => "IS NULL",
            OperatorKind::IsNotNull => "IS NOT NULL",
            OperatorKind::Exists => "EXISTS",
        }
    }

    /// Returns whether this operator always yields a boolean.
    #[must_use]
    pub fn is_predicate(&self) -> bool {
        !matches!(
            self,
            OperatorKind::Plus
                | OperatorKind::Minus
                | OperatorKind::Multiply
                | OperatorKind::Divide
                | OperatorKind::Modulo
                | OperatorKind::Negate
                | OperatorKind::Concat
        )
    }
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    /// Returns the name of this aggregate function.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "count",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
        }
    }

    /// Returns the output data type for this aggregate given its operand type.
    ///
    /// # Errors
    ///
    /// Returns an error if SUM or AVG is applied to a non-numeric operand.
    pub fn output_type(&self, input_type: DataType) -> Result<DataType> {
        let numeric_input = |function: &Self| {
            if input_type == DataType::Invalid || input_type.is_numeric() {
                Ok(())
            } else {
                Err(BindError::TypeMismatch {
                    context: format!("{}() operand", function.name()),
                    expected: DataType::Decimal,
                    actual: input_type,
                })
            }
        };
        match self {
            AggregateFunction::Count => Ok(DataType::BigInt),
            AggregateFunction::Avg => {
                numeric_input(self)?;
                Ok(DataType::Decimal)
            }
            AggregateFunction::Sum => {
                numeric_input(self)?;
                Ok(match input_type {
                    DataType::Decimal => DataType::Decimal,
                    DataType::Invalid => DataType::Invalid,
                    _ => DataType::BigInt,
                })
            }
            AggregateFunction::Min | AggregateFunction::Max => Ok(input_type),
        }
    }
}

/// One `WHEN condition THEN result` arm of a CASE expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WhenClause {
    pub condition: ExprId,
    pub then: ExprId,
}

/// Expression node payload.
#[derive(Debug, Clone)]
pub enum ExpressionKind {
    ColumnValue(ColumnValue),
    Constant(Value),
    /// Operands are the node's children.
    Operator(OperatorKind),
    /// The operand (a `Star` for `COUNT(*)`) is the node's only child.
    Aggregate {
        function: AggregateFunction,
        distinct: bool,
    },
    Case {
        when_clauses: Vec<WhenClause>,
        default: Option<ExprId>,
    },
    Star,
    Subquery(Box<SelectStatement>),
    /// The cast operand is the node's only child.
    TypeCast(DataType),
}

/// Tag of an [`ExpressionKind`], cheap to copy out of the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionType {
    ColumnValue,
    Constant,
    Operator,
    Aggregate,
    Case,
    Star,
    Subquery,
    TypeCast,
}

impl fmt::Display for ExpressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExpressionType::ColumnValue => "ColumnValue",
            ExpressionType::Constant => "Constant",
            ExpressionType::Operator => "Operator",
            ExpressionType::Aggregate => "Aggregate",
            ExpressionType::Case => "Case",
            ExpressionType::Star => "Star",
            ExpressionType::Subquery => "Subquery",
            ExpressionType::TypeCast => "TypeCast",
        };
        f.write_str(name)
    }
}

/// An expression node.
///
/// The fields below `alias` are derived by the binder.
#[derive(Debug, Clone)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub children: Vec<ExprId>,
    /// Explicit `AS` alias.
    pub alias: Option<String>,
    /// Value type of the expression.
    pub return_type: DataType,
    /// Shallowest scope depth referenced beneath this node, `None` when no
    /// column is referenced.
    pub depth: Option<u32>,
    /// Whether a subquery appears at or beneath this node.
    pub has_subquery: bool,
    /// Display name (the alias when present).
    pub name: String,
}

impl Expression {
    fn new(kind: ExpressionKind, children: Vec<ExprId>) -> Self {
        Expression {
            kind,
            children,
            alias: None,
            return_type: DataType::Invalid,
            depth: None,
            has_subquery: false,
            name: String::new(),
        }
    }

    /// Creates an unresolved column reference.
    #[must_use]
    pub fn column(table: Option<&str>, column: &str) -> Self {
        Expression::new(
            ExpressionKind::ColumnValue(ColumnValue {
                table_name: table.map(String::from),
                column_name: column.to_string(),
                binding: None,
            }),
            Vec::new(),
        )
    }

    /// Creates a constant; its type is the value's type.
    #[must_use]
    pub fn constant(value: Value) -> Self {
        let return_type = value.data_type().unwrap_or_default();
        let mut expr = Expression::new(ExpressionKind::Constant(value), Vec::new());
        expr.return_type = return_type;
        expr
    }

    /// Creates an operator over `operands`.
    #[must_use]
    pub fn operator(op: OperatorKind, operands: Vec<ExprId>) -> Self {
        Expression::new(ExpressionKind::Operator(op), operands)
    }

    /// Creates an aggregate call.
    #[must_use]
    pub fn aggregate(function: AggregateFunction, operand: ExprId, distinct: bool) -> Self {
        Expression::new(
            ExpressionKind::Aggregate { function, distinct },
            vec![operand],
        )
    }

    /// Creates a searched CASE expression.
    #[must_use]
    pub fn case(when_clauses: Vec<WhenClause>, default: Option<ExprId>) -> Self {
        Expression::new(
            ExpressionKind::Case {
                when_clauses,
                default,
            },
            Vec::new(),
        )
    }

    /// Creates a `*`.
    #[must_use]
    pub fn star() -> Self {
        Expression::new(ExpressionKind::Star, Vec::new())
    }

    /// Creates a subquery expression.
    #[must_use]
    pub fn subquery(select: SelectStatement) -> Self {
        Expression::new(ExpressionKind::Subquery(Box::new(select)), Vec::new())
    }

    /// Creates `CAST(operand AS target)`.
    #[must_use]
    pub fn cast(operand: ExprId, target: DataType) -> Self {
        Expression::new(ExpressionKind::TypeCast(target), vec![operand])
    }

    /// Sets the `AS` alias.
    #[must_use]
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    /// Returns the tag of this node's kind.
    #[must_use]
    pub fn expression_type(&self) -> ExpressionType {
        match &self.kind {
            ExpressionKind::ColumnValue(_) => ExpressionType::ColumnValue,
            ExpressionKind::Constant(_) => ExpressionType::Constant,
            ExpressionKind::Operator(_) => ExpressionType::Operator,
            ExpressionKind::Aggregate { .. } => ExpressionType::Aggregate,
            ExpressionKind::Case { .. } => ExpressionType::Case,
            ExpressionKind::Star => ExpressionType::Star,
            ExpressionKind::Subquery(_) => ExpressionType::Subquery,
            ExpressionKind::TypeCast(_) => ExpressionType::TypeCast,
        }
    }

    /// Returns the column reference payload, if this is one.
    #[must_use]
    pub fn as_column(&self) -> Option<&ColumnValue> {
        match &self.kind {
            ExpressionKind::ColumnValue(col) => Some(col),
            _ => None,
        }
    }

    /// Returns the constant value, if this is one.
    #[must_use]
    pub fn as_constant(&self) -> Option<&Value> {
        match &self.kind {
            ExpressionKind::Constant(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the subquery statement, if this is one.
    #[must_use]
    pub fn as_subquery(&self) -> Option<&SelectStatement> {
        match &self.kind {
            ExpressionKind::Subquery(select) => Some(select),
            _ => None,
        }
    }

    /// Returns the directly nested expressions, CASE conditions first.
    #[must_use]
    pub fn child_ids(&self) -> Vec<ExprId> {
        match &self.kind {
            ExpressionKind::Case {
                when_clauses,
                default,
            } => when_clauses
                .iter()
                .map(|w| w.condition)
                .chain(when_clauses.iter().map(|w| w.then))
                .chain(*default)
                .collect(),
            _ => self.children.clone(),
        }
    }

    /// Moves the subquery statement out, leaving an empty one in place.
    pub(crate) fn take_subquery(&mut self) -> Option<SelectStatement> {
        match &mut self.kind {
            ExpressionKind::Subquery(select) => Some(std::mem::take(select.as_mut())),
            _ => None,
        }
    }

    /// Puts back a statement taken with [`Expression::take_subquery`].
    pub(crate) fn restore_subquery(&mut self, statement: SelectStatement) {
        if let ExpressionKind::Subquery(select) = &mut self.kind {
            **select = statement;
        }
    }
}
