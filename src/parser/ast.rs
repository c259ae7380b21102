//! Statement tree definitions for parsed SQL.
//!
//! Expressions are referenced by [`ExprId`] into the owning
//! [`ParseResult`](super::ParseResult).

use crate::types::DataType;

use super::expression::ExprId;

/// A parsed SQL statement.
#[derive(Debug, Clone)]
pub enum Statement {
    Select(Box<SelectStatement>),
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
    Create(CreateStatement),
    Drop(DropStatement),
    Copy(CopyStatement),
    Analyze(AnalyzeStatement),
    Prepare(PrepareStatement),
    Execute(ExecuteStatement),
    Transaction(TransactionStatement),
    CreateFunction(CreateFunctionStatement),
}

impl Statement {
    /// Returns the statement keyword used in logs and messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Statement::Select(_) => "SELECT",
            Statement::Insert(_) => "INSERT",
            Statement::Update(_) => "UPDATE",
            Statement::Delete(_) => "DELETE",
            Statement::Create(_) => "CREATE",
            Statement::Drop(_) => "DROP",
            Statement::Copy(_) => "COPY",
            Statement::Analyze(_) => "ANALYZE",
            Statement::Prepare(_) => "PREPARE",
            Statement::Execute(_) => "EXECUTE",
            Statement::Transaction(_) => "TRANSACTION",
            Statement::CreateFunction(_) => "CREATE FUNCTION",
        }
    }
}

/// A possibly database- and namespace-qualified object name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectName {
    pub database: Option<String>,
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectName {
    /// Creates an unqualified name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        ObjectName {
            database: None,
            namespace: None,
            name: name.to_string(),
        }
    }

    /// Sets the namespace qualifier.
    #[must_use]
    pub fn in_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    /// Sets the database qualifier.
    #[must_use]
    pub fn in_database(mut self, database: &str) -> Self {
        self.database = Some(database.to_string());
        self
    }

    /// Fills in the database qualifier if the name has none.
    pub fn try_bind_database_name(&mut self, default_database: &str) {
        if self.database.as_deref().map_or(true, str::is_empty) {
            self.database = Some(default_database.to_string());
        }
    }

    /// Returns the database qualifier, or an empty string when unbound.
    #[must_use]
    pub fn database_name(&self) -> &str {
        self.database.as_deref().unwrap_or_default()
    }
}

/// SELECT statement.
#[derive(Debug, Clone, Default)]
pub struct SelectStatement {
    pub select_columns: Vec<ExprId>,
    pub distinct: bool,
    pub from: Option<TableRef>,
    pub where_clause: Option<ExprId>,
    pub group_by: Option<GroupByDescription>,
    pub order_by: Option<OrderByDescription>,
    pub limit: Option<LimitDescription>,
    /// Scope depth the statement was bound at.
    pub depth: Option<u32>,
}

/// GROUP BY clause.
#[derive(Debug, Clone, Default)]
pub struct GroupByDescription {
    pub columns: Vec<ExprId>,
    pub having: Option<ExprId>,
}

/// ORDER BY clause.
#[derive(Debug, Clone, Default)]
pub struct OrderByDescription {
    pub items: Vec<OrderByItem>,
}

/// One ORDER BY expression.
#[derive(Debug, Clone, Copy)]
pub struct OrderByItem {
    pub expr: ExprId,
    pub ascending: bool,
}

/// LIMIT/OFFSET clause.
#[derive(Debug, Clone, Copy, Default)]
pub struct LimitDescription {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// A FROM-clause item.
#[derive(Debug, Clone)]
pub struct TableRef {
    pub kind: TableRefKind,
    pub alias: Option<String>,
}

impl TableRef {
    /// Creates a physical table reference.
    #[must_use]
    pub fn table(name: ObjectName) -> Self {
        TableRef {
            kind: TableRefKind::Table(name),
            alias: None,
        }
    }

    /// Creates a derived table reference.
    #[must_use]
    pub fn derived(select: SelectStatement) -> Self {
        TableRef {
            kind: TableRefKind::Select(Box::new(select)),
            alias: None,
        }
    }

    /// Creates a join of two table references.
    #[must_use]
    pub fn join(
        join_type: JoinType,
        left: TableRef,
        right: TableRef,
        condition: Option<ExprId>,
    ) -> Self {
        TableRef {
            kind: TableRefKind::Join(Box::new(JoinDefinition {
                join_type,
                left,
                right,
                condition,
            })),
            alias: None,
        }
    }

    /// Creates a comma-separated table list.
    #[must_use]
    pub fn list(tables: Vec<TableRef>) -> Self {
        TableRef {
            kind: TableRefKind::List(tables),
            alias: None,
        }
    }

    /// Sets the alias.
    #[must_use]
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }
}

/// The four mutually exclusive FROM-item shapes.
#[derive(Debug, Clone)]
pub enum TableRefKind {
    Table(ObjectName),
    Select(Box<SelectStatement>),
    Join(Box<JoinDefinition>),
    List(Vec<TableRef>),
}

/// Join types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Outer,
    Cross,
}

/// `left JOIN right ON condition`.
#[derive(Debug, Clone)]
pub struct JoinDefinition {
    pub join_type: JoinType,
    pub left: TableRef,
    pub right: TableRef,
    pub condition: Option<ExprId>,
}

/// INSERT statement.
#[derive(Debug, Clone)]
pub struct InsertStatement {
    pub table: ObjectName,
    /// Explicit insert column list; empty means all schema columns.
    pub columns: Vec<String>,
    pub source: InsertSource,
}

/// Rows to insert.
#[derive(Debug, Clone)]
pub enum InsertSource {
    Values(Vec<Vec<ExprId>>),
    Select(Box<SelectStatement>),
}

/// UPDATE statement.
#[derive(Debug, Clone)]
pub struct UpdateStatement {
    pub table: ObjectName,
    pub alias: Option<String>,
    pub assignments: Vec<UpdateClause>,
    pub where_clause: Option<ExprId>,
}

/// `column = value` in an UPDATE.
#[derive(Debug, Clone)]
pub struct UpdateClause {
    pub column: String,
    pub value: ExprId,
}

/// DELETE statement.
#[derive(Debug, Clone)]
pub struct DeleteStatement {
    pub table: ObjectName,
    pub where_clause: Option<ExprId>,
}

/// COPY direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyDirection {
    From,
    To,
}

/// COPY statement.
///
/// Either `table` names the table to copy, or `select` is the query to copy.
/// When a table is given its columns are appended to `select.select_columns`.
#[derive(Debug, Clone)]
pub struct CopyStatement {
    pub table: Option<ObjectName>,
    pub select: SelectStatement,
    pub direction: CopyDirection,
    pub file_path: Option<String>,
    pub delimiter: char,
}

/// CREATE statement, one variant per object kind.
#[derive(Debug, Clone)]
pub enum CreateStatement {
    Database(CreateDatabase),
    Table(CreateTable),
    Index(CreateIndex),
    Trigger(CreateTrigger),
    Schema(CreateSchema),
    View(CreateView),
}

/// CREATE DATABASE.
#[derive(Debug, Clone)]
pub struct CreateDatabase {
    pub name: String,
    pub if_not_exists: bool,
}

/// CREATE TABLE.
#[derive(Debug, Clone)]
pub struct CreateTable {
    pub table: ObjectName,
    pub columns: Vec<ColumnDefinition>,
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKeyDefinition>,
    pub if_not_exists: bool,
}

/// One column of a CREATE TABLE.
#[derive(Debug, Clone)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub unique: bool,
    pub default: Option<ExprId>,
    pub check: Option<ExprId>,
}

impl ColumnDefinition {
    /// Creates a nullable column with no constraints.
    #[must_use]
    pub fn new(name: &str, data_type: DataType) -> Self {
        ColumnDefinition {
            name: name.to_string(),
            data_type,
            nullable: true,
            unique: false,
            default: None,
            check: None,
        }
    }
}

/// Referential action of a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForeignKeyAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

/// `FOREIGN KEY (sources) REFERENCES sink_table (sinks)`.
#[derive(Debug, Clone)]
pub struct ForeignKeyDefinition {
    pub sources: Vec<String>,
    pub sink_table: String,
    pub sinks: Vec<String>,
    pub on_delete: ForeignKeyAction,
    pub on_update: ForeignKeyAction,
}

/// One key of an index: a column or an expression.
#[derive(Debug, Clone)]
pub enum IndexAttribute {
    Column(String),
    Expression(ExprId),
}

/// CREATE INDEX.
#[derive(Debug, Clone)]
pub struct CreateIndex {
    pub name: String,
    pub table: ObjectName,
    pub attributes: Vec<IndexAttribute>,
    pub unique: bool,
    pub if_not_exists: bool,
}

/// Trigger firing time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerTiming {
    Before,
    After,
    InsteadOf,
}

/// CREATE TRIGGER.
#[derive(Debug, Clone)]
pub struct CreateTrigger {
    pub name: String,
    pub table: ObjectName,
    pub timing: TriggerTiming,
    pub function_name: String,
    pub when: Option<ExprId>,
}

/// CREATE SCHEMA.
#[derive(Debug, Clone)]
pub struct CreateSchema {
    pub name: String,
    pub if_not_exists: bool,
}

/// CREATE VIEW.
#[derive(Debug, Clone)]
pub struct CreateView {
    pub view: ObjectName,
    pub query: Box<SelectStatement>,
}

/// DROP statement.
#[derive(Debug, Clone)]
pub struct DropStatement {
    pub kind: DropKind,
    pub if_exists: bool,
}

/// Object dropped by a DROP statement.
#[derive(Debug, Clone)]
pub enum DropKind {
    Database(String),
    Table(ObjectName),
    Index(ObjectName),
    Trigger(ObjectName),
    Schema { name: String, cascade: bool },
    View(ObjectName),
    PreparedStatement(String),
}

/// ANALYZE statement.
#[derive(Debug, Clone)]
pub struct AnalyzeStatement {
    pub table: ObjectName,
    pub columns: Vec<String>,
}

/// PREPARE statement.
#[derive(Debug, Clone)]
pub struct PrepareStatement {
    pub name: String,
    pub statement: Box<Statement>,
    pub placeholders: Vec<ExprId>,
}

/// EXECUTE statement.
#[derive(Debug, Clone)]
pub struct ExecuteStatement {
    pub name: String,
    pub parameters: Vec<ExprId>,
}

/// Transaction control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Begin,
    Commit,
    Rollback,
}

/// BEGIN / COMMIT / ROLLBACK.
#[derive(Debug, Clone, Copy)]
pub struct TransactionStatement {
    pub kind: TransactionKind,
}

/// CREATE FUNCTION.
#[derive(Debug, Clone)]
pub struct CreateFunctionStatement {
    pub name: String,
    pub arguments: Vec<(String, DataType)>,
    pub return_type: DataType,
    pub language: String,
    pub body: Vec<String>,
}
