//! Contract tests for SELECT binding.
//!
//! These tests verify:
//! - Column references resolve to the right table, type and depth
//! - `*` expands to schema columns in registration order
//! - Derived tables expose their output columns
//! - Correlated subqueries see enclosing scopes

use super::*;
use sqlbind::catalog::CatalogAccessor;
use sqlbind::error::{BindError, ObjectKind};
use sqlbind::parser::ast::{
    GroupByDescription, JoinType, OrderByDescription, OrderByItem, TableRefKind,
};
use sqlbind::parser::{AggregateFunction, ColumnBinding};
use sqlbind::{AmbiguityPolicy, BinderConfig};

#[test]
fn test_select_column_with_where() {
    // SELECT a FROM t WHERE a > 1
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let a = col(&mut pr, "a");
    let where_a = col(&mut pr, "a");
    let one = int(&mut pr, 1);
    let predicate = op(&mut pr, OperatorKind::GreaterThan, vec![where_a, one]);
    let mut statement = Statement::Select(Box::new(SelectStatement {
        where_clause: Some(predicate),
        ..select(vec![a], Some(table("t")))
    }));

    bind(&catalog, &mut statement, &mut pr).unwrap();

    let select = select_of(&statement);
    assert_eq!(qualified_names(&pr, &select.select_columns), ["t.a"]);
    assert_eq!(select.depth, Some(0));
    assert_eq!(pr[predicate].depth, Some(0));
    assert!(!pr[predicate].has_subquery);
    assert_eq!(pr[predicate].return_type, DataType::Boolean);
    assert_eq!(pr[predicate].name, "a > 1");

    let t = catalog.table_oid("t").unwrap();
    let schema = catalog.schema(t).unwrap();
    assert_eq!(
        pr[a].as_column().unwrap().binding,
        Some(ColumnBinding::Table {
            database: catalog.database_oid("sqlbind").unwrap(),
            table: t,
            column: schema.get_column("a").unwrap().oid,
        })
    );
    assert_eq!(pr[a].return_type, DataType::Integer);
}

#[test]
fn test_select_star_expands_schema_in_order() {
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let all = star(&mut pr);
    let mut statement = Statement::Select(Box::new(select(vec![all], Some(table("orders")))));

    bind(&catalog, &mut statement, &mut pr).unwrap();

    let select = select_of(&statement);
    assert_eq!(
        qualified_names(&pr, &select.select_columns),
        [
            "orders.id",
            "orders.customer",
            "orders.total",
            "orders.placed"
        ]
    );
    let types: Vec<_> = select
        .select_columns
        .iter()
        .map(|&id| pr[id].return_type)
        .collect();
    assert_eq!(
        types,
        [
            DataType::Integer,
            DataType::Varchar,
            DataType::Decimal,
            DataType::Date
        ]
    );
}

#[test]
fn test_select_star_follows_registration_order() {
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let first = col(&mut pr, "b");
    let all = star(&mut pr);
    let from = TableRef::join(JoinType::Inner, table("t"), table("s").with_alias("x"), None);
    let mut statement = Statement::Select(Box::new(select(vec![first, all], Some(from))));

    bind(&catalog, &mut statement, &mut pr).unwrap();

    assert_eq!(
        qualified_names(&pr, &select_of(&statement).select_columns),
        ["t.b", "t.a", "t.b", "x.a", "x.c"]
    );
}

#[test]
fn test_select_star_without_from_rejected() {
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let all = star(&mut pr);
    let mut statement = Statement::Select(Box::new(select(vec![all], None)));

    let result = bind(&catalog, &mut statement, &mut pr);
    assert!(matches!(result, Err(BindError::InvalidStarExpression)));
}

#[test]
fn test_unknown_column_rejected() {
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let missing = col(&mut pr, "nope");
    let mut statement = Statement::Select(Box::new(select(vec![missing], Some(table("t")))));

    let err = bind(&catalog, &mut statement, &mut pr).unwrap_err();
    assert!(matches!(err, BindError::ColumnNotFound(name) if name == "nope"));
}

#[test]
fn test_ambiguous_column_policies() {
    let catalog = create_test_catalog();
    let build = |pr: &mut ParseResult| {
        let a = col(pr, "a");
        let from = TableRef::list(vec![table("t"), table("s")]);
        (a, Statement::Select(Box::new(select(vec![a], Some(from)))))
    };

    let mut pr = ParseResult::new();
    let (_, mut statement) = build(&mut pr);
    let err = bind(&catalog, &mut statement, &mut pr).unwrap_err();
    assert!(matches!(err, BindError::AmbiguousColumn(name) if name == "a"));

    let mut pr = ParseResult::new();
    let (a, mut statement) = build(&mut pr);
    let binder = Binder::with_config(
        &catalog,
        BinderConfig::new().with_ambiguous_columns(AmbiguityPolicy::FirstMatch),
    );
    binder.bind(&mut statement, &mut pr).unwrap();
    assert_eq!(qualified_names(&pr, &[a]), ["t.a"]);
}

#[test]
fn test_qualified_column_uses_alias() {
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let by_alias = qcol(&mut pr, "X", "A");
    let mut statement = Statement::Select(Box::new(select(
        vec![by_alias],
        Some(table("t").with_alias("x")),
    )));

    bind(&catalog, &mut statement, &mut pr).unwrap();
    assert_eq!(qualified_names(&pr, &[by_alias]), ["x.a"]);

    // The table name is hidden by its alias.
    let mut pr = ParseResult::new();
    let by_name = qcol(&mut pr, "t", "a");
    let mut statement = Statement::Select(Box::new(select(
        vec![by_name],
        Some(table("t").with_alias("x")),
    )));
    let err = bind(&catalog, &mut statement, &mut pr).unwrap_err();
    assert!(matches!(err, BindError::InvalidTableReference(name) if name == "t"));
}

#[test]
fn test_duplicate_alias_rejected() {
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let c = col(&mut pr, "c");
    let from = TableRef::list(vec![table("t").with_alias("x"), table("s").with_alias("x")]);
    let mut statement = Statement::Select(Box::new(select(vec![c], Some(from))));

    let err = bind(&catalog, &mut statement, &mut pr).unwrap_err();
    assert!(matches!(err, BindError::DuplicateAlias(alias) if alias == "x"));
}

#[test]
fn test_table_reference_resolution() {
    let catalog = create_test_catalog();

    let mut pr = ParseResult::new();
    let id = col(&mut pr, "id");
    let leads = TableRef::table(ObjectName::new("leads").in_namespace("sales"));
    let mut statement = Statement::Select(Box::new(select(vec![id], Some(leads))));
    bind(&catalog, &mut statement, &mut pr).unwrap();
    let Some(TableRef {
        kind: TableRefKind::Table(name),
        ..
    }) = &select_of(&statement).from
    else {
        panic!("expected table reference");
    };
    assert_eq!(name.database_name(), "sqlbind");

    let cases = [
        (ObjectName::new("missing"), ObjectKind::Table),
        (ObjectName::new("leads"), ObjectKind::Table),
        (ObjectName::new("leads").in_namespace("nope"), ObjectKind::Namespace),
        (ObjectName::new("t").in_database("otherdb"), ObjectKind::Database),
    ];
    for (name, expected) in cases {
        let mut pr = ParseResult::new();
        let all = star(&mut pr);
        let mut statement =
            Statement::Select(Box::new(select(vec![all], Some(TableRef::table(name)))));
        let err = bind(&catalog, &mut statement, &mut pr).unwrap_err();
        assert!(
            matches!(err, BindError::NotFound { kind, .. } if kind == expected),
            "expected {expected} error, got {err}"
        );
    }
}

#[test]
fn test_derived_table_exposes_output_columns() {
    // SELECT * FROM (SELECT a AS x FROM t) AS d
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let a = pr.add_expression(Expression::column(None, "a").with_alias("x"));
    let inner = select(vec![a], Some(table("t")));
    let all = star(&mut pr);
    let mut statement = Statement::Select(Box::new(select(
        vec![all],
        Some(TableRef::derived(inner).with_alias("d")),
    )));

    bind(&catalog, &mut statement, &mut pr).unwrap();

    let columns = &select_of(&statement).select_columns;
    assert_eq!(qualified_names(&pr, columns), ["d.x"]);
    let x = &pr[columns[0]];
    assert_eq!(
        x.as_column().unwrap().binding,
        Some(ColumnBinding::Nested { position: 0 })
    );
    assert_eq!(x.return_type, DataType::Integer);
    assert_eq!(x.depth, Some(0));
    // The inner reference was bound inside the derived table's own scope.
    assert_eq!(pr[a].depth, Some(1));
}

#[test]
fn test_derived_table_requires_alias() {
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let a = col(&mut pr, "a");
    let inner = select(vec![a], Some(table("t")));
    let all = star(&mut pr);
    let mut statement = Statement::Select(Box::new(select(
        vec![all],
        Some(TableRef::derived(inner)),
    )));

    let result = bind(&catalog, &mut statement, &mut pr);
    assert!(matches!(result, Err(BindError::MissingAlias)));
}

#[test]
fn test_derived_table_empty_alias_rejected() {
    // SELECT * FROM (SELECT a FROM t) AS ""
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let a = col(&mut pr, "a");
    let inner = select(vec![a], Some(table("t")));
    let all = star(&mut pr);
    let mut statement = Statement::Select(Box::new(select(
        vec![all],
        Some(TableRef::derived(inner).with_alias("")),
    )));

    let result = bind(&catalog, &mut statement, &mut pr);
    assert!(matches!(result, Err(BindError::MissingAlias)));
}

#[test]
fn test_join_condition_sees_both_sides() {
    // SELECT t.b FROM t JOIN s AS x ON t.a = x.a
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let b = qcol(&mut pr, "t", "b");
    let left = qcol(&mut pr, "t", "a");
    let right = qcol(&mut pr, "x", "a");
    let condition = op(&mut pr, OperatorKind::Equal, vec![left, right]);
    let from = TableRef::join(
        JoinType::Inner,
        table("t"),
        table("s").with_alias("x"),
        Some(condition),
    );
    let mut statement = Statement::Select(Box::new(select(vec![b], Some(from))));

    bind(&catalog, &mut statement, &mut pr).unwrap();

    assert_eq!(qualified_names(&pr, &[left, right]), ["t.a", "x.a"]);
    assert_eq!(pr[left].return_type, DataType::Integer);
    assert_eq!(pr[right].return_type, DataType::BigInt);
    assert_eq!(pr[condition].return_type, DataType::Boolean);
    assert_eq!(pr[condition].depth, Some(0));
    assert_eq!(pr[condition].name, "a = a");
}

#[test]
fn test_join_condition_cannot_see_later_tables() {
    // SELECT * FROM t JOIN s ON t.a = u.a, orders u
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let left = qcol(&mut pr, "t", "a");
    let right = qcol(&mut pr, "u", "id");
    let condition = op(&mut pr, OperatorKind::Equal, vec![left, right]);
    let join = TableRef::join(JoinType::Inner, table("t"), table("s"), Some(condition));
    let from = TableRef::list(vec![join, table("orders").with_alias("u")]);
    let all = star(&mut pr);
    let mut statement = Statement::Select(Box::new(select(vec![all], Some(from))));

    let result = bind(&catalog, &mut statement, &mut pr);
    assert!(matches!(result, Err(BindError::InvalidTableReference(name)) if name == "u"));
}

#[test]
fn test_correlated_subquery() {
    // SELECT a FROM t WHERE EXISTS (SELECT c FROM s WHERE s.a = t.a)
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let c = col(&mut pr, "c");
    let inner_a = qcol(&mut pr, "s", "a");
    let outer_a = qcol(&mut pr, "t", "a");
    let correlation = op(&mut pr, OperatorKind::Equal, vec![inner_a, outer_a]);
    let subquery = pr.add_expression(Expression::subquery(SelectStatement {
        where_clause: Some(correlation),
        ..select(vec![c], Some(table("s")))
    }));
    let exists = op(&mut pr, OperatorKind::Exists, vec![subquery]);
    let a = col(&mut pr, "a");
    let mut statement = Statement::Select(Box::new(SelectStatement {
        where_clause: Some(exists),
        ..select(vec![a], Some(table("t")))
    }));

    bind(&catalog, &mut statement, &mut pr).unwrap();

    assert_eq!(pr[outer_a].depth, Some(0));
    assert_eq!(pr[inner_a].depth, Some(1));
    assert_eq!(pr[c].depth, Some(1));
    assert_eq!(pr[subquery].depth, Some(0));
    assert!(pr[subquery].has_subquery);
    assert_eq!(pr[subquery].return_type, DataType::Varchar);
    assert_eq!(pr[subquery].as_subquery().unwrap().depth, Some(1));
    assert!(pr[exists].has_subquery);
    assert_eq!(pr[exists].return_type, DataType::Boolean);
    assert_eq!(pr[exists].name, "EXISTS(SUBQUERY)");
    assert!(!pr[a].has_subquery);
}

#[test]
fn test_uncorrelated_subquery_depth() {
    // SELECT (SELECT c FROM s) FROM t
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let c = col(&mut pr, "c");
    let subquery = pr.add_expression(Expression::subquery(select(vec![c], Some(table("s")))));
    let mut statement = Statement::Select(Box::new(select(vec![subquery], Some(table("t")))));

    bind(&catalog, &mut statement, &mut pr).unwrap();
    assert_eq!(pr[subquery].depth, Some(1));
    assert_eq!(pr[subquery].name, "SUBQUERY");
}

#[test]
fn test_group_by_having_order_by() {
    // SELECT a, count(*) FROM t GROUP BY a HAVING count(*) > 1 ORDER BY a
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let a = col(&mut pr, "a");
    let count_star = star(&mut pr);
    let count = pr.add_expression(Expression::aggregate(
        AggregateFunction::Count,
        count_star,
        false,
    ));
    let group_a = col(&mut pr, "a");
    let having_star = star(&mut pr);
    let having_count = pr.add_expression(Expression::aggregate(
        AggregateFunction::Count,
        having_star,
        false,
    ));
    let one = int(&mut pr, 1);
    let having = op(&mut pr, OperatorKind::GreaterThan, vec![having_count, one]);
    let order_a = col(&mut pr, "a");

    let mut statement = Statement::Select(Box::new(SelectStatement {
        group_by: Some(GroupByDescription {
            columns: vec![group_a],
            having: Some(having),
        }),
        order_by: Some(OrderByDescription {
            items: vec![OrderByItem {
                expr: order_a,
                ascending: true,
            }],
        }),
        ..select(vec![a, count], Some(table("t")))
    }));

    bind(&catalog, &mut statement, &mut pr).unwrap();

    // The aggregate is not a star item, so it stays in place.
    assert_eq!(select_of(&statement).select_columns, vec![a, count]);
    assert_eq!(pr[count].return_type, DataType::BigInt);
    assert_eq!(pr[count].name, "count(*)");
    assert_eq!(pr[having].return_type, DataType::Boolean);
    assert_eq!(qualified_names(&pr, &[group_a, order_a]), ["t.a", "t.a"]);
}

#[test]
fn test_rebinding_is_idempotent() {
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let all = star(&mut pr);
    let total = col(&mut pr, "total");
    let mut statement =
        Statement::Select(Box::new(select(vec![all, total], Some(table("orders")))));

    bind(&catalog, &mut statement, &mut pr).unwrap();
    let columns = select_of(&statement).select_columns.clone();
    let bindings: Vec<_> = columns
        .iter()
        .map(|&id| pr[id].as_column().cloned())
        .collect();
    let count = pr.expression_count();

    bind(&catalog, &mut statement, &mut pr).unwrap();
    assert_eq!(select_of(&statement).select_columns, columns);
    let rebound: Vec<_> = columns
        .iter()
        .map(|&id| pr[id].as_column().cloned())
        .collect();
    assert_eq!(rebound, bindings);
    assert_eq!(pr.expression_count(), count);
}

#[test]
fn test_shared_catalog_sees_new_tables() {
    let catalog = parking_lot::RwLock::new(create_test_catalog());
    let binder = Binder::new(&catalog);

    let mut pr = ParseResult::new();
    let all = star(&mut pr);
    let mut statement = Statement::Select(Box::new(select(vec![all], Some(table("fresh")))));
    assert!(binder
        .bind(&mut statement, &mut pr)
        .unwrap_err()
        .is_table_not_found());

    catalog
        .write()
        .create_table(
            None,
            "fresh",
            vec![sqlbind::catalog::Column::new("z", DataType::Boolean).unwrap()],
        )
        .unwrap();
    binder.bind(&mut statement, &mut pr).unwrap();
    assert_eq!(
        qualified_names(&pr, &select_of(&statement).select_columns),
        ["fresh.z"]
    );
}
