use sqlparser::ast::{self, Expr, ObjectNamePart, SetExpr, Statement, TableFactor, TableObject, Value, ValueWithSpan};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

use crate::model::*;

/// Parsed command from SQL input.
#[derive(Debug, PartialEq)]
pub enum Command {
    /// `SELECT * FROM availability WHERE start >= .. AND "end" <= .. [AND vehicle_type ..]`
    SelectAvailability {
        start: Ms,
        end: Ms,
        /// Empty = every type.
        vehicle_types: Vec<String>,
    },
    /// `INSERT INTO reservations (vehicle_type, start, "end") VALUES (..)`
    InsertReservation {
        vehicle_type: String,
        start: Ms,
        end: Ms,
    },
    SelectVehicleTypes,
    SelectReservations {
        vehicle_type: Option<String>,
    },
}

const RESERVATION_COLUMNS: [&str; 3] = ["vehicle_type", "start", "end"];

pub fn parse_sql(sql: &str) -> Result<Command, SqlError> {
    let dialect = PostgreSqlDialect {};
    let stmts = Parser::parse_sql(&dialect, sql).map_err(|e| SqlError::Parse(e.to_string()))?;
    if stmts.is_empty() {
        return Err(SqlError::Empty);
    }
    if stmts.len() > 1 {
        return Err(SqlError::Unsupported("multiple statements".into()));
    }

    match &stmts[0] {
        Statement::Insert(insert) => parse_insert(insert),
        Statement::Query(query) => parse_select(query),
        other => Err(SqlError::Unsupported(format!("{other}"))),
    }
}

fn parse_insert(insert: &ast::Insert) -> Result<Command, SqlError> {
    let table = insert_table_name(insert)?;
    if table != "reservations" {
        return Err(SqlError::UnknownTable(table));
    }

    let rows = extract_insert_rows(insert)?;
    if rows.len() > 1 {
        return Err(SqlError::Unsupported(
            "one reservation per INSERT".into(),
        ));
    }
    let values = &rows[0];

    // Without a column list values are positional.
    let columns: Vec<String> = if insert.columns.is_empty() {
        RESERVATION_COLUMNS.iter().map(|c| c.to_string()).collect()
    } else {
        insert.columns.iter().map(|c| c.value.to_lowercase()).collect()
    };
    if values.len() != columns.len() {
        return Err(SqlError::WrongArity("reservations", columns.len(), values.len()));
    }

    let mut vehicle_type = None;
    let mut start = None;
    let mut end = None;
    for (column, expr) in columns.iter().zip(values) {
        let duplicate = match column.as_str() {
            "vehicle_type" => vehicle_type.replace(parse_string_expr(expr)?).is_some(),
            "start" => start.replace(parse_i64_expr(expr)?).is_some(),
            "end" => end.replace(parse_i64_expr(expr)?).is_some(),
            other => return Err(SqlError::UnknownColumn(other.to_string())),
        };
        if duplicate {
            return Err(SqlError::Parse(format!("column {column} given twice")));
        }
    }

    Ok(Command::InsertReservation {
        vehicle_type: vehicle_type.ok_or(SqlError::MissingColumn("vehicle_type"))?,
        start: start.ok_or(SqlError::MissingColumn("start"))?,
        end: end.ok_or(SqlError::MissingColumn("end"))?,
    })
}

fn parse_select(query: &ast::Query) -> Result<Command, SqlError> {
    let select = match query.body.as_ref() {
        SetExpr::Select(s) => s,
        _ => return Err(SqlError::Unsupported("non-SELECT query".into())),
    };

    if select.from.is_empty() {
        return Err(SqlError::Parse("SELECT without FROM".into()));
    }
    let table = table_factor_name(&select.from[0].relation)?;

    let mut filters = Filters::default();
    if let Some(selection) = &select.selection {
        filters.extract(selection)?;
    }

    match table.as_str() {
        "availability" => Ok(Command::SelectAvailability {
            start: filters.start.ok_or(SqlError::MissingFilter("start"))?,
            end: filters.end.ok_or(SqlError::MissingFilter("end"))?,
            vehicle_types: filters.vehicle_types,
        }),
        "vehicle_types" => Ok(Command::SelectVehicleTypes),
        "reservations" => {
            if filters.vehicle_types.len() > 1 {
                return Err(SqlError::Unsupported(
                    "reservations filter takes a single vehicle_type".into(),
                ));
            }
            Ok(Command::SelectReservations {
                vehicle_type: filters.vehicle_types.pop(),
            })
        }
        _ => Err(SqlError::UnknownTable(table)),
    }
}

/// WHERE-clause values recognised on the read tables.
#[derive(Default)]
struct Filters {
    start: Option<Ms>,
    end: Option<Ms>,
    vehicle_types: Vec<String>,
}

impl Filters {
    fn extract(&mut self, expr: &Expr) -> Result<(), SqlError> {
        match expr {
            Expr::Nested(inner) => self.extract(inner)?,
            Expr::BinaryOp { left, op, right } => match op {
                ast::BinaryOperator::And => {
                    self.extract(left)?;
                    self.extract(right)?;
                }
                ast::BinaryOperator::Eq => {
                    if expr_column_name(left).as_deref() == Some("vehicle_type") {
                        self.vehicle_types.push(parse_string_expr(right)?);
                    }
                }
                ast::BinaryOperator::GtEq => {
                    if expr_column_name(left).as_deref() == Some("start") {
                        self.start = Some(parse_i64_expr(right)?);
                    }
                }
                ast::BinaryOperator::LtEq => {
                    if expr_column_name(left).as_deref() == Some("end") {
                        self.end = Some(parse_i64_expr(right)?);
                    }
                }
                ast::BinaryOperator::Or => {
                    return Err(SqlError::Unsupported("OR in WHERE".into()));
                }
                _ => {}
            },
            Expr::InList { expr, list, negated } => {
                if expr_column_name(expr).as_deref() == Some("vehicle_type") {
                    if *negated {
                        return Err(SqlError::Unsupported("NOT IN".into()));
                    }
                    for item in list {
                        self.vehicle_types.push(parse_string_expr(item)?);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

// ── Helpers ───────────────────────────────────────────────────

fn object_name_last(name: &ast::ObjectName) -> Option<String> {
    name.0.last().and_then(|part| match part {
        ObjectNamePart::Identifier(ident) => Some(ident.value.to_lowercase()),
        _ => None,
    })
}

fn insert_table_name(insert: &ast::Insert) -> Result<String, SqlError> {
    match &insert.table {
        TableObject::TableName(name) => {
            object_name_last(name).ok_or_else(|| SqlError::Parse("empty table name".into()))
        }
        _ => Err(SqlError::Parse("unsupported table object in INSERT".into())),
    }
}

fn table_factor_name(tf: &TableFactor) -> Result<String, SqlError> {
    match tf {
        TableFactor::Table { name, .. } => {
            object_name_last(name).ok_or_else(|| SqlError::Parse("empty table name".into()))
        }
        _ => Err(SqlError::Parse("complex table expression".into())),
    }
}

fn extract_insert_rows(insert: &ast::Insert) -> Result<Vec<Vec<Expr>>, SqlError> {
    let body = insert
        .source
        .as_ref()
        .ok_or(SqlError::Parse("no VALUES".into()))?;
    match body.body.as_ref() {
        SetExpr::Values(values) => {
            if values.rows.is_empty() {
                return Err(SqlError::Parse("empty VALUES".into()));
            }
            Ok(values.rows.clone())
        }
        _ => Err(SqlError::Parse("expected VALUES".into())),
    }
}

fn expr_column_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier(ident) => Some(ident.value.to_lowercase()),
        Expr::CompoundIdentifier(parts) => parts.last().map(|i| i.value.to_lowercase()),
        _ => None,
    }
}

fn extract_value(expr: &Expr) -> Option<&Value> {
    match expr {
        Expr::Value(ValueWithSpan { value, .. }) => Some(value),
        _ => None,
    }
}

/// Vehicle type names are case-sensitive and kept verbatim.
fn parse_string_expr(expr: &Expr) -> Result<String, SqlError> {
    match extract_value(expr) {
        Some(Value::SingleQuotedString(s)) => Ok(s.clone()),
        Some(value) => Err(SqlError::Parse(format!("expected string, got {value:?}"))),
        None => Err(SqlError::Parse(format!("expected value, got {expr:?}"))),
    }
}

fn parse_i64_expr(expr: &Expr) -> Result<i64, SqlError> {
    if let Some(value) = extract_value(expr) {
        match value {
            Value::Number(s, _) | Value::SingleQuotedString(s) => s
                .parse()
                .map_err(|e| SqlError::Parse(format!("bad i64: {e}"))),
            _ => Err(SqlError::Parse(format!("expected number, got {value:?}"))),
        }
    } else if let Expr::UnaryOp {
        op: ast::UnaryOperator::Minus,
        expr,
    } = expr
    {
        Ok(-parse_i64_expr(expr)?)
    } else {
        Err(SqlError::Parse(format!("expected value, got {expr:?}")))
    }
}

// ── Errors ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum SqlError {
    Parse(String),
    Empty,
    Unsupported(String),
    UnknownTable(String),
    WrongArity(&'static str, usize, usize),
    MissingFilter(&'static str),
    UnknownColumn(String),
    MissingColumn(&'static str),
}

impl std::fmt::Display for SqlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlError::Parse(s) => write!(f, "parse error: {s}"),
            SqlError::Empty => write!(f, "empty query"),
            SqlError::Unsupported(s) => write!(f, "unsupported: {s}"),
            SqlError::UnknownTable(t) => write!(f, "unknown table: {t}"),
            SqlError::WrongArity(t, expected, got) => {
                write!(f, "{t}: expected {expected} values, got {got}")
            }
            SqlError::MissingFilter(col) => write!(f, "missing filter: {col}"),
            SqlError::UnknownColumn(col) => write!(f, "unknown column: {col}"),
            SqlError::MissingColumn(col) => write!(f, "missing column: {col}"),
        }
    }
}

impl std::error::Error for SqlError {}
