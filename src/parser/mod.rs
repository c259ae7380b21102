//! Parse-tree data model.
//!
//! The SQL front end produces these trees; the binder consumes and annotates
//! them. Statements own their clause structure, while every expression node
//! lives in the [`ParseResult`] arena and is addressed by [`ExprId`].

pub mod ast;
mod expression;
mod parse_result;

pub use expression::{
    AggregateFunction, ColumnBinding, ColumnValue, ExprId, Expression, ExpressionKind,
    ExpressionType, OperatorKind, WhenClause,
};
pub use parse_result::ParseResult;
