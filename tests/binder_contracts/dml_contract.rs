//! Contract tests for INSERT, UPDATE, DELETE and COPY binding.

use chrono::NaiveDate;

use super::*;
use sqlbind::error::BindError;
use sqlbind::parser::ast::{
    CopyDirection, CopyStatement, DeleteStatement, InsertSource, InsertStatement, UpdateClause,
    UpdateStatement,
};
use sqlbind::parser::ExpressionType;
use sqlbind::BinderConfig;

fn insert_values(table: &str, columns: &[&str], rows: Vec<Vec<ExprId>>) -> Statement {
    Statement::Insert(InsertStatement {
        table: ObjectName::new(table),
        columns: columns.iter().map(|c| (*c).to_string()).collect(),
        source: InsertSource::Values(rows),
    })
}

fn inserted_rows(statement: &Statement) -> &[Vec<ExprId>] {
    match statement {
        Statement::Insert(InsertStatement {
            source: InsertSource::Values(rows),
            ..
        }) => rows,
        other => panic!("expected INSERT VALUES, got {}", other.kind_name()),
    }
}

fn update(
    table: &str,
    assignments: Vec<(&str, ExprId)>,
    where_clause: Option<ExprId>,
) -> Statement {
    Statement::Update(UpdateStatement {
        table: ObjectName::new(table),
        alias: None,
        assignments: assignments
            .into_iter()
            .map(|(column, value)| UpdateClause {
                column: column.to_string(),
                value,
            })
            .collect(),
        where_clause,
    })
}

fn assignment_values(statement: &Statement) -> Vec<ExprId> {
    match statement {
        Statement::Update(update) => update.assignments.iter().map(|a| a.value).collect(),
        other => panic!("expected UPDATE, got {}", other.kind_name()),
    }
}

#[test]
fn test_insert_too_many_values_rejected() {
    // INSERT INTO t VALUES (1, 2, 3)
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let row = vec![int(&mut pr, 1), int(&mut pr, 2), int(&mut pr, 3)];
    let mut statement = insert_values("t", &[], vec![row]);

    let err = bind(&catalog, &mut statement, &mut pr).unwrap_err();
    assert!(matches!(
        err,
        BindError::ArityMismatch {
            expected: 2,
            actual: 3,
            ..
        }
    ));
}

#[test]
fn test_insert_values_coerced_to_column_types() {
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let id = int(&mut pr, 1);
    let customer = text(&mut pr, "bob");
    let total = text(&mut pr, "12.5");
    let placed = text(&mut pr, "2024-01-15");
    let mut statement = insert_values("orders", &[], vec![vec![id, customer, total, placed]]);

    bind(&catalog, &mut statement, &mut pr).unwrap();

    let row = &inserted_rows(&statement)[0];
    // Values already of the column type keep their slot.
    assert_eq!(row[0], id);
    assert_eq!(row[1], customer);
    assert_ne!(row[2], total);
    assert_eq!(pr[row[2]].as_constant(), Some(&Value::Decimal(12.5)));
    assert_eq!(pr[row[2]].return_type, DataType::Decimal);
    let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    assert_eq!(pr[row[3]].as_constant(), Some(&Value::date(date)));
    // The source node is untouched.
    assert_eq!(
        pr[total].as_constant(),
        Some(&Value::Varchar("12.5".to_string()))
    );
}

#[test]
fn test_insert_named_columns_use_their_own_types() {
    // INSERT INTO orders (total, id) VALUES ('3', '7')
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let total = text(&mut pr, "3");
    let id = text(&mut pr, "7");
    let mut statement = insert_values("orders", &["total", "ID"], vec![vec![total, id]]);

    bind(&catalog, &mut statement, &mut pr).unwrap();

    let row = &inserted_rows(&statement)[0];
    assert_eq!(pr[row[0]].as_constant(), Some(&Value::Decimal(3.0)));
    assert_eq!(pr[row[1]].as_constant(), Some(&Value::Integer(7)));
}

#[test]
fn test_insert_named_column_arity() {
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let row = vec![int(&mut pr, 1), int(&mut pr, 2)];
    let mut statement = insert_values("orders", &["id"], vec![row]);

    let err = bind(&catalog, &mut statement, &mut pr).unwrap_err();
    assert!(matches!(
        err,
        BindError::ArityMismatch {
            expected: 1,
            actual: 2,
            ..
        }
    ));
}

#[test]
fn test_insert_unknown_column_rejected() {
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let row = vec![int(&mut pr, 1)];
    let mut statement = insert_values("t", &["zzz"], vec![row]);

    let err = bind(&catalog, &mut statement, &mut pr).unwrap_err();
    assert!(matches!(err, BindError::ColumnNotFound(name) if name == "zzz"));
}

#[test]
fn test_insert_into_missing_table_rejected() {
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let row = vec![int(&mut pr, 1)];
    let mut statement = insert_values("missing", &[], vec![row]);

    let err = bind(&catalog, &mut statement, &mut pr).unwrap_err();
    assert!(err.is_table_not_found());
}

#[test]
fn test_insert_unconvertible_value_rejected() {
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let row = vec![text(&mut pr, "x"), int(&mut pr, 1)];
    let mut statement = insert_values("t", &[], vec![row]);

    let err = bind(&catalog, &mut statement, &mut pr).unwrap_err();
    assert!(matches!(
        err,
        BindError::ConversionError {
            target: DataType::Integer,
            ..
        }
    ));
}

#[test]
fn test_insert_null_and_cast_values() {
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let null = pr.add_expression(Expression::constant(Value::Null));
    let four = text(&mut pr, "4");
    let cast = pr.add_expression(Expression::cast(four, DataType::Integer));
    let mut statement = insert_values("t", &[], vec![vec![null, cast]]);

    bind(&catalog, &mut statement, &mut pr).unwrap();

    let row = &inserted_rows(&statement)[0];
    assert_eq!(pr[row[0]].as_constant(), Some(&Value::Null));
    assert_eq!(pr[row[0]].return_type, DataType::Integer);
    // A cast of a literal is folded even when it already has the column type.
    assert_ne!(row[1], cast);
    assert_eq!(pr[row[1]].as_constant(), Some(&Value::Integer(4)));
}

#[test]
fn test_insert_cast_expression_matching_column_type() {
    // INSERT INTO s VALUES (1, CAST('a' || 'b' AS VARCHAR))
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let one = int(&mut pr, 1);
    let a = text(&mut pr, "a");
    let b = text(&mut pr, "b");
    let concat = op(&mut pr, OperatorKind::Concat, vec![a, b]);
    let cast = pr.add_expression(Expression::cast(concat, DataType::Varchar));
    let mut statement = insert_values("s", &[], vec![vec![one, cast]]);

    bind(&catalog, &mut statement, &mut pr).unwrap();

    let row = &inserted_rows(&statement)[0];
    assert_eq!(pr[row[0]].as_constant(), Some(&Value::BigInt(1)));
    assert_eq!(pr[row[1]].expression_type(), ExpressionType::TypeCast);
    assert_eq!(pr[row[1]].children, vec![concat]);
    assert_eq!(pr[row[1]].return_type, DataType::Varchar);
}

#[test]
fn test_insert_values_cannot_reference_columns() {
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let row = vec![col(&mut pr, "a"), int(&mut pr, 1)];
    let mut statement = insert_values("t", &[], vec![row]);

    let err = bind(&catalog, &mut statement, &mut pr).unwrap_err();
    assert!(matches!(err, BindError::ColumnNotFound(name) if name == "a"));
}

#[test]
fn test_insert_select_checks_arity() {
    let catalog = create_test_catalog();

    let mut pr = ParseResult::new();
    let a = col(&mut pr, "a");
    let mut statement = Statement::Insert(InsertStatement {
        table: ObjectName::new("t"),
        columns: Vec::new(),
        source: InsertSource::Select(Box::new(select(vec![a], Some(table("s"))))),
    });
    let err = bind(&catalog, &mut statement, &mut pr).unwrap_err();
    assert!(matches!(
        err,
        BindError::ArityMismatch {
            expected: 2,
            actual: 1,
            ..
        }
    ));

    let mut pr = ParseResult::new();
    let all = star(&mut pr);
    let mut statement = Statement::Insert(InsertStatement {
        table: ObjectName::new("t"),
        columns: Vec::new(),
        source: InsertSource::Select(Box::new(select(vec![all], Some(table("s"))))),
    });
    bind(&catalog, &mut statement, &mut pr).unwrap();
    let Statement::Insert(InsertStatement {
        source: InsertSource::Select(select),
        ..
    }) = &statement
    else {
        panic!("expected INSERT SELECT");
    };
    assert_eq!(qualified_names(&pr, &select.select_columns), ["s.a", "s.c"]);
    assert_eq!(select.depth, Some(0));
}

#[test]
fn test_update_binds_and_coerces() {
    // UPDATE orders SET total = '9.5', customer = customer WHERE id = 1
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let total = text(&mut pr, "9.5");
    let customer = col(&mut pr, "customer");
    let id = col(&mut pr, "id");
    let one = int(&mut pr, 1);
    let predicate = op(&mut pr, OperatorKind::Equal, vec![id, one]);
    let mut statement = update(
        "orders",
        vec![("total", total), ("customer", customer)],
        Some(predicate),
    );

    bind(&catalog, &mut statement, &mut pr).unwrap();

    let values = assignment_values(&statement);
    assert_eq!(pr[values[0]].as_constant(), Some(&Value::Decimal(9.5)));
    assert_eq!(values[1], customer);
    assert_eq!(qualified_names(&pr, &[customer, id]), ["orders.customer", "orders.id"]);
}

#[test]
fn test_update_coercion_can_be_disabled() {
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let total = text(&mut pr, "9.5");
    let mut statement = update("orders", vec![("total", total)], None);

    let binder = Binder::with_config(
        &catalog,
        BinderConfig::new().with_coerce_update_values(false),
    );
    binder.bind(&mut statement, &mut pr).unwrap();
    assert_eq!(assignment_values(&statement), [total]);
}

#[test]
fn test_update_non_literal_values_kept() {
    // UPDATE orders AS o SET total = o.total + 1
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let current = qcol(&mut pr, "o", "total");
    let one = int(&mut pr, 1);
    let sum = op(&mut pr, OperatorKind::Plus, vec![current, one]);
    let mut statement = update("orders", vec![("total", sum)], None);
    if let Statement::Update(update) = &mut statement {
        update.alias = Some("o".to_string());
    }

    bind(&catalog, &mut statement, &mut pr).unwrap();
    assert_eq!(assignment_values(&statement), [sum]);
    assert_eq!(pr[sum].return_type, DataType::Decimal);
}

#[test]
fn test_update_unknown_column_rejected() {
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let value = int(&mut pr, 1);
    let mut statement = update("orders", vec![("nope", value)], None);

    let err = bind(&catalog, &mut statement, &mut pr).unwrap_err();
    assert!(matches!(err, BindError::ColumnNotFound(name) if name == "nope"));
}

#[test]
fn test_delete_binds_target_and_where() {
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let b = col(&mut pr, "b");
    let two = int(&mut pr, 2);
    let predicate = op(&mut pr, OperatorKind::Equal, vec![b, two]);
    let mut statement = Statement::Delete(DeleteStatement {
        table: ObjectName::new("t"),
        where_clause: Some(predicate),
    });

    bind(&catalog, &mut statement, &mut pr).unwrap();
    assert_eq!(qualified_names(&pr, &[b]), ["t.b"]);
    let Statement::Delete(delete) = &statement else {
        unreachable!()
    };
    assert_eq!(delete.table.database_name(), "sqlbind");

    let mut pr = ParseResult::new();
    let mut statement = Statement::Delete(DeleteStatement {
        table: ObjectName::new("missing"),
        where_clause: None,
    });
    assert!(bind(&catalog, &mut statement, &mut pr)
        .unwrap_err()
        .is_table_not_found());
}

#[test]
fn test_copy_table_appends_all_columns() {
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let mut statement = Statement::Copy(CopyStatement {
        table: Some(ObjectName::new("t")),
        select: SelectStatement::default(),
        direction: CopyDirection::To,
        file_path: Some("/tmp/t.csv".to_string()),
        delimiter: ',',
    });

    bind(&catalog, &mut statement, &mut pr).unwrap();
    let Statement::Copy(copy) = &statement else {
        unreachable!()
    };
    assert_eq!(qualified_names(&pr, &copy.select.select_columns), ["t.a", "t.b"]);
}

#[test]
fn test_copy_query_binds_select() {
    let catalog = create_test_catalog();
    let mut pr = ParseResult::new();
    let c = col(&mut pr, "c");
    let mut statement = Statement::Copy(CopyStatement {
        table: None,
        select: select(vec![c], Some(table("s"))),
        direction: CopyDirection::To,
        file_path: None,
        delimiter: '|',
    });

    bind(&catalog, &mut statement, &mut pr).unwrap();
    assert_eq!(pr[c].expression_type(), ExpressionType::ColumnValue);
    assert_eq!(qualified_names(&pr, &[c]), ["s.c"]);
    assert_eq!(pr[c].depth, Some(0));
}
