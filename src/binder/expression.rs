//! Expression binding: name resolution and derived metadata.

use tracing::{debug, trace};

use crate::error::{BindError, Result};
use crate::parser::{ExprId, ExpressionKind, ExpressionType, OperatorKind, ParseResult};
use crate::types::DataType;

use super::scope::{ScopeParent, ScopeStack};
use super::Binder;

impl Binder<'_> {
    /// Binds expression `id` and everything beneath it against the live scopes,
    /// then derives its depth, subquery flag, value type and display name.
    pub(super) fn bind_expression(
        &self,
        id: ExprId,
        pr: &mut ParseResult,
        scopes: &mut ScopeStack,
    ) -> Result<()> {
        trace!(expr = %pr[id].expression_type(), id = id.index(), "binding expression");
        match pr[id].expression_type() {
            ExpressionType::ColumnValue => self.resolve_column(id, pr, scopes)?,
            ExpressionType::Star => {
                if !scopes.has_tables() {
                    return Err(BindError::InvalidStarExpression);
                }
            }
            ExpressionType::Subquery => {
                let Some(mut select) = pr[id].take_subquery() else {
                    return Ok(());
                };
                let result = self.bind_select(&mut select, pr, scopes, ScopeParent::Current);
                pr[id].restore_subquery(select);
                result?;
            }
            _ => {
                for child in pr[id].child_ids() {
                    self.bind_expression(child, pr, scopes)?;
                }
            }
        }
        derive_metadata(id, pr)
    }

    /// Resolves a column reference; a reference that is already bound is left
    /// as it is.
    fn resolve_column(&self, id: ExprId, pr: &mut ParseResult, scopes: &ScopeStack) -> Result<()> {
        let Some(col) = pr[id].as_column() else {
            return Ok(());
        };
        if col.binding.is_some() {
            return Ok(());
        }
        let column = col.column_name.to_lowercase();
        let table = col.table_name.as_deref().map(str::to_lowercase);

        let resolved = match &table {
            Some(table) => scopes.resolve_qualified_column(table, &column),
            None => scopes.resolve_unqualified_column(&column, self.config.ambiguous_columns),
        };
        let resolved = match resolved {
            Ok(resolved) => resolved,
            Err(e) => {
                debug!(table = ?table, column = %column, error = %e, "column resolution failed");
                return Err(e);
            }
        };

        let expr = &mut pr[id];
        if let ExpressionKind::ColumnValue(col) = &mut expr.kind {
            col.table_name = Some(resolved.table_alias);
            col.column_name = column;
            col.binding = Some(resolved.binding);
        }
        expr.return_type = resolved.data_type;
        expr.depth = Some(resolved.depth);
        Ok(())
    }
}

/// Derives the metadata of `id` from its (already bound) children.
fn derive_metadata(id: ExprId, pr: &mut ParseResult) -> Result<()> {
    let expr = &pr[id];
    let children = expr.child_ids();
    let child_depth = children.iter().filter_map(|&c| pr[c].depth).min();
    let child_subquery = children.iter().any(|&c| pr[c].has_subquery);
    let child_type = |i: usize| children.get(i).map_or(DataType::Invalid, |&c| pr[c].return_type);

    let (depth, has_subquery, return_type) = match &expr.kind {
        ExpressionKind::ColumnValue(_) | ExpressionKind::Constant(_) => {
            (expr.depth, false, expr.return_type)
        }
        ExpressionKind::Star => (None, false, DataType::Invalid),
        ExpressionKind::Operator(op) => (
            child_depth,
            child_subquery,
            operator_type(*op, &children, pr),
        ),
        ExpressionKind::Aggregate { function, .. } => {
            (child_depth, child_subquery, function.output_type(child_type(0))?)
        }
        ExpressionKind::Case {
            when_clauses,
            default,
        } => {
            let return_type = when_clauses
                .iter()
                .map(|w| pr[w.then].return_type)
                .chain(default.map(|d| pr[d].return_type))
                .find(|t| *t != DataType::Invalid)
                .unwrap_or_default();
            (child_depth, child_subquery, return_type)
        }
        ExpressionKind::Subquery(select) => {
            let depth = select
                .select_columns
                .iter()
                .chain(select.where_clause.iter())
                .filter_map(|&c| pr[c].depth)
                .min();
            let return_type = select
                .select_columns
                .first()
                .map_or(DataType::Invalid, |&c| pr[c].return_type);
            (depth, true, return_type)
        }
        ExpressionKind::TypeCast(target) => (child_depth, child_subquery, *target),
    };
    let name = display_name(id, pr);

    let expr = &mut pr[id];
    expr.depth = depth;
    expr.has_subquery = has_subquery;
    expr.return_type = return_type;
    expr.name = name;
    Ok(())
}

/// Predicates are boolean, concatenation is a string, and arithmetic takes
/// the widest numeric operand. Arithmetic over a non-numeric operand takes
/// the first known operand type.
fn operator_type(op: OperatorKind, children: &[ExprId], pr: &ParseResult) -> DataType {
    if op.is_predicate() {
        return DataType::Boolean;
    }
    if op == OperatorKind::Concat {
        return DataType::Varchar;
    }
    let types: Vec<DataType> = children.iter().map(|&c| pr[c].return_type).collect();
    let mut widest: Option<DataType> = None;
    for t in &types {
        widest = match widest {
            None => t.is_numeric().then_some(*t),
            Some(w) => w.widest_numeric(*t),
        };
        if widest.is_none() {
            break;
        }
    }
    widest.unwrap_or_else(|| {
        types
            .into_iter()
            .find(|t| *t != DataType::Invalid)
            .unwrap_or_default()
    })
}

fn display_name(id: ExprId, pr: &ParseResult) -> String {
    let expr = &pr[id];
    if let Some(alias) = &expr.alias {
        return alias.clone();
    }
    let child = |i: usize| expr.children.get(i).map_or("", |&c| pr[c].name.as_str());
    match &expr.kind {
        ExpressionKind::ColumnValue(col) => col.column_name.clone(),
        ExpressionKind::Constant(value) => value.to_string(),
        ExpressionKind::Operator(op) => match op {
            OperatorKind::Negate => format!("-{}", child(0)),
            OperatorKind::Not => format!("NOT {}", child(0)),
            OperatorKind::IsNull | OperatorKind::IsNotNull => {
                format!("{} {}", child(0), op.as_str())
            }
            OperatorKind::Exists => format!("EXISTS({})", child(0)),
            OperatorKind::In => {
                let list: Vec<&str> = expr
                    .children
                    .iter()
                    .skip(1)
                    .map(|&c| pr[c].name.as_str())
                    .collect();
                format!("{} IN ({})", child(0), list.join(", "))
            }
            _ => {
                let operands: Vec<&str> =
                    expr.children.iter().map(|&c| pr[c].name.as_str()).collect();
                operands.join(&format!(" {} ", op.as_str()))
            }
        },
        ExpressionKind::Aggregate { function, distinct } => {
            let distinct = if *distinct { "DISTINCT " } else { "" };
            format!("{}({distinct}{})", function.name(), child(0))
        }
        ExpressionKind::Case { .. } => "CASE".to_string(),
        ExpressionKind::Star => "*".to_string(),
        ExpressionKind::Subquery(_) => "SUBQUERY".to_string(),
        ExpressionKind::TypeCast(target) => format!("CAST({} AS {target})", child(0)),
    }
}
