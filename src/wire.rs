use std::fmt::Debug;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::Sink;
use futures::stream;
use pgwire::api::copy::CopyHandler;
use pgwire::api::auth::StartupHandler;
use pgwire::api::portal::{Format, Portal};
use pgwire::api::query::{ExtendedQueryHandler, SimpleQueryHandler};
use pgwire::api::results::{
    DataRowEncoder, DescribePortalResponse, DescribeStatementResponse, FieldFormat, FieldInfo,
    QueryResponse, Response, Tag,
};
use pgwire::api::stmt::{QueryParser, StoredStatement};
use pgwire::api::store::PortalStore;
use pgwire::api::{ClientInfo, ClientPortalStore, NoopHandler, PgWireServerHandlers, Type};
use pgwire::error::{ErrorInfo, PgWireError, PgWireResult};
use pgwire::messages::PgWireBackendMessage;
use tokio::net::TcpStream;

use crate::engine::{checked_range, Engine, EngineError};
use crate::limits::MAX_BIND_PARAMS;
use crate::observability::{command_label, QUERIES_TOTAL, QUERY_DURATION_SECONDS};
use crate::sql::{self, Command};

pub struct FleetbookHandler {
    engine: Arc<Engine>,
    query_parser: Arc<FleetbookQueryParser>,
}

impl FleetbookHandler {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            query_parser: Arc::new(FleetbookQueryParser),
        }
    }

    async fn run(&self, sql: &str) -> PgWireResult<Vec<Response>> {
        let cmd = sql::parse_sql(sql).map_err(sql_err)?;
        let label = command_label(&cmd);
        let started = Instant::now();
        let result = self.execute_command(cmd).await;
        metrics::histogram!(QUERY_DURATION_SECONDS, "command" => label)
            .record(started.elapsed().as_secs_f64());
        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(QUERIES_TOTAL, "command" => label, "status" => status).increment(1);
        result
    }

    async fn execute_command(&self, cmd: Command) -> PgWireResult<Vec<Response>> {
        match cmd {
            Command::SelectAvailability {
                start,
                end,
                vehicle_types,
            } => {
                let range = checked_range(start, end).map_err(engine_err)?;
                let rows = self
                    .engine
                    .query_availability(range, &vehicle_types)
                    .await
                    .map_err(engine_err)?;

                let schema = Arc::new(availability_schema());
                let rows: Vec<PgWireResult<_>> = rows
                    .into_iter()
                    .map(|row| {
                        let mut encoder = DataRowEncoder::new(schema.clone());
                        encoder.encode_field(&row.vehicle_type)?;
                        encoder.encode_field(&i64::from(row.available))?;
                        Ok(encoder.take_row())
                    })
                    .collect();

                Ok(vec![Response::Query(QueryResponse::new(
                    schema,
                    stream::iter(rows),
                ))])
            }
            Command::InsertReservation {
                vehicle_type,
                start,
                end,
            } => {
                let range = checked_range(start, end).map_err(engine_err)?;
                let admitted = self
                    .engine
                    .reserve(&vehicle_type, range)
                    .await
                    .map_err(engine_err)?;
                // A rejection is a normal outcome: zero rows inserted.
                let rows = usize::from(admitted);
                Ok(vec![Response::Execution(Tag::new("INSERT").with_oid(0).with_rows(rows))])
            }
            Command::SelectVehicleTypes => {
                let fleet = self.engine.list_vehicle_types().await.map_err(engine_err)?;

                let schema = Arc::new(vehicle_types_schema());
                let rows: Vec<PgWireResult<_>> = fleet
                    .into_iter()
                    .map(|vt| {
                        let mut encoder = DataRowEncoder::new(schema.clone());
                        encoder.encode_field(&vt.name)?;
                        encoder.encode_field(&i64::from(vt.total_count))?;
                        Ok(encoder.take_row())
                    })
                    .collect();

                Ok(vec![Response::Query(QueryResponse::new(
                    schema,
                    stream::iter(rows),
                ))])
            }
            Command::SelectReservations { vehicle_type } => {
                let reservations = self
                    .engine
                    .list_reservations(vehicle_type.as_deref())
                    .await
                    .map_err(engine_err)?;

                let schema = Arc::new(reservations_schema());
                let rows: Vec<PgWireResult<_>> = reservations
                    .into_iter()
                    .map(|r| {
                        let mut encoder = DataRowEncoder::new(schema.clone());
                        encoder.encode_field(&r.vehicle_type)?;
                        encoder.encode_field(&r.range.start)?;
                        encoder.encode_field(&r.range.end)?;
                        Ok(encoder.take_row())
                    })
                    .collect();

                Ok(vec![Response::Query(QueryResponse::new(
                    schema,
                    stream::iter(rows),
                ))])
            }
        }
    }
}

fn text_field(name: &str, ty: Type) -> FieldInfo {
    FieldInfo::new(name.into(), None, None, ty, FieldFormat::Text)
}

fn availability_schema() -> Vec<FieldInfo> {
    vec![
        text_field("vehicle_type", Type::VARCHAR),
        text_field("available", Type::INT8),
    ]
}

fn vehicle_types_schema() -> Vec<FieldInfo> {
    vec![
        text_field("name", Type::VARCHAR),
        text_field("total_count", Type::INT8),
    ]
}

fn reservations_schema() -> Vec<FieldInfo> {
    vec![
        text_field("vehicle_type", Type::VARCHAR),
        text_field("start", Type::INT8),
        text_field("end", Type::INT8),
    ]
}

/// Row shape for a statement that has not been bound yet.
fn result_schema(sql: &str) -> Vec<FieldInfo> {
    let upper = sql.to_uppercase();
    if !upper.trim_start().starts_with("SELECT") {
        return vec![];
    }
    if upper.contains("AVAILABILITY") {
        availability_schema()
    } else if upper.contains("VEHICLE_TYPES") {
        vehicle_types_schema()
    } else if upper.contains("RESERVATIONS") {
        reservations_schema()
    } else {
        vec![]
    }
}

#[async_trait]
impl SimpleQueryHandler for FleetbookHandler {
    async fn do_query<C>(
        &self,
        _client: &mut C,
        query: &str,
    ) -> PgWireResult<Vec<Response>>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        self.run(query).await
    }
}

// ── Extended Query Protocol ──────────────────────────────────────

#[derive(Debug)]
pub struct FleetbookQueryParser;

#[async_trait]
impl QueryParser for FleetbookQueryParser {
    type Statement = String;

    async fn parse_sql<C>(
        &self,
        _client: &C,
        sql: &str,
        _types: &[Option<Type>],
    ) -> PgWireResult<String>
    where
        C: ClientInfo + Unpin + Send + Sync,
    {
        Ok(sql.to_string())
    }

    fn get_parameter_types(&self, stmt: &String) -> PgWireResult<Vec<Type>> {
        Ok(vec![Type::VARCHAR; count_params(stmt)?])
    }

    fn get_result_schema(
        &self,
        stmt: &String,
        _column_format: Option<&Format>,
    ) -> PgWireResult<Vec<FieldInfo>> {
        Ok(result_schema(stmt))
    }
}

#[async_trait]
impl ExtendedQueryHandler for FleetbookHandler {
    type Statement = String;
    type QueryParser = FleetbookQueryParser;

    fn query_parser(&self) -> Arc<Self::QueryParser> {
        self.query_parser.clone()
    }

    async fn do_query<C>(
        &self,
        _client: &mut C,
        portal: &Portal<Self::Statement>,
        _max_rows: usize,
    ) -> PgWireResult<Response>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::PortalStore: PortalStore<Statement = Self::Statement>,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        let sql = bind_params(&portal.statement.statement, &portal.parameters);
        let mut responses = self.run(&sql).await?;
        Ok(responses.remove(0))
    }

    async fn do_describe_statement<C>(
        &self,
        _client: &mut C,
        target: &StoredStatement<Self::Statement>,
    ) -> PgWireResult<DescribeStatementResponse>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::PortalStore: PortalStore<Statement = Self::Statement>,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        let param_types = vec![Type::VARCHAR; count_params(&target.statement)?];
        Ok(DescribeStatementResponse::new(
            param_types,
            result_schema(&target.statement),
        ))
    }

    async fn do_describe_portal<C>(
        &self,
        _client: &mut C,
        target: &Portal<Self::Statement>,
    ) -> PgWireResult<DescribePortalResponse>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::PortalStore: PortalStore<Statement = Self::Statement>,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        Ok(DescribePortalResponse::new(result_schema(
            &target.statement.statement,
        )))
    }
}

/// Byte span and 1-based index of every `$N` placeholder outside a quoted
/// literal. An index that overflows `usize` is reported as `usize::MAX`.
fn placeholders(sql: &str) -> Vec<(std::ops::Range<usize>, usize)> {
    let bytes = sql.as_bytes();
    let mut found = Vec::new();
    let mut in_literal = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            // `''` inside a literal flips twice and stays quoted.
            b'\'' => {
                in_literal = !in_literal;
                i += 1;
            }
            b'$' if !in_literal => {
                let digits = i + 1;
                let mut j = digits;
                while j < bytes.len() && bytes[j].is_ascii_digit() {
                    j += 1;
                }
                if j > digits {
                    let n = sql[digits..j].parse::<usize>().unwrap_or(usize::MAX);
                    if n > 0 {
                        found.push((i..j, n));
                    }
                }
                i = j;
            }
            _ => i += 1,
        }
    }
    found
}

fn count_params(sql: &str) -> PgWireResult<usize> {
    let n = placeholders(sql).into_iter().map(|(_, n)| n).max().unwrap_or(0);
    if n > MAX_BIND_PARAMS {
        return Err(user_error(
            "54000",
            format!("parameter index exceeds {MAX_BIND_PARAMS}"),
        ));
    }
    Ok(n)
}

/// Inline bound text-format parameters as quoted literals. Placeholders with
/// no bound value are left as written.
fn bind_params<B: AsRef<[u8]>>(sql: &str, params: &[Option<B>]) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut last = 0;
    for (span, n) in placeholders(sql) {
        out.push_str(&sql[last..span.start]);
        match params.get(n - 1) {
            Some(Some(bytes)) => {
                let text = String::from_utf8_lossy(bytes.as_ref());
                out.push('\'');
                out.push_str(&text.replace('\'', "''"));
                out.push('\'');
            }
            Some(None) => out.push_str("NULL"),
            None => out.push_str(&sql[span.clone()]),
        }
        last = span.end;
    }
    out.push_str(&sql[last..]);
    out
}

// ── Factory ──────────────────────────────────────────────────────

pub struct FleetbookFactory {
    handler: Arc<FleetbookHandler>,
    noop: Arc<NoopHandler>,
}

impl FleetbookFactory {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            handler: Arc::new(FleetbookHandler::new(engine)),
            noop: Arc::new(NoopHandler),
        }
    }
}

impl PgWireServerHandlers for FleetbookFactory {
    fn simple_query_handler(&self) -> Arc<impl SimpleQueryHandler> {
        self.handler.clone()
    }

    fn extended_query_handler(&self) -> Arc<impl ExtendedQueryHandler> {
        self.handler.clone()
    }

    fn startup_handler(&self) -> Arc<impl StartupHandler> {
        self.noop.clone()
    }

    fn copy_handler(&self) -> Arc<impl CopyHandler> {
        self.noop.clone()
    }
}

/// Serve one client connection until it closes.
pub async fn process_connection(socket: TcpStream, engine: Arc<Engine>) -> std::io::Result<()> {
    pgwire::tokio::process_socket(socket, None, FleetbookFactory::new(engine)).await
}

fn engine_err(e: EngineError) -> PgWireError {
    let code = match &e {
        EngineError::InvalidRange { .. } | EngineError::InvalidVehicleType(_) => "22023",
        EngineError::LimitExceeded(_) => "54000",
        EngineError::Store(_) => "58000",
    };
    user_error(code, e.to_string())
}

fn sql_err(e: crate::sql::SqlError) -> PgWireError {
    user_error("42601", e.to_string())
}

fn user_error(code: &str, message: String) -> PgWireError {
    PgWireError::UserError(Box::new(ErrorInfo::new(
        "ERROR".into(),
        code.into(),
        message,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_params_takes_highest_index() {
        assert_eq!(count_params("SELECT * FROM vehicle_types").unwrap(), 0);
        assert_eq!(count_params("VALUES ($1, $2, $3)").unwrap(), 3);
        assert_eq!(count_params("VALUES ($2, $10)").unwrap(), 10);
        assert_eq!(count_params("price is $ or $0").unwrap(), 0);
    }

    #[test]
    fn count_params_refuses_oversized_index() {
        assert_eq!(count_params("VALUES ($65535)").unwrap(), MAX_BIND_PARAMS);

        for sql in [
            "SELECT * FROM vehicle_types WHERE x = $65536",
            "SELECT * FROM vehicle_types WHERE x = $1000000000000",
            "SELECT * FROM vehicle_types WHERE x = $99999999999999999999999999",
        ] {
            match count_params(sql) {
                Err(PgWireError::UserError(info)) => assert_eq!(info.code, "54000"),
                other => panic!("expected 54000 for {sql}, got {other:?}"),
            }
        }
    }

    #[test]
    fn placeholders_inside_literals_are_not_bound() {
        let params: Vec<Option<Vec<u8>>> = vec![Some(b"Van".to_vec())];
        assert_eq!(
            bind_params("VALUES ('a$1', $1)", &params),
            "VALUES ('a$1', 'Van')"
        );
        assert_eq!(count_params("WHERE vehicle_type = 'it''s $2' AND x = $1").unwrap(), 1);
        assert_eq!(
            bind_params("WHERE vehicle_type = 'it''s $1' AND x = $1", &params),
            "WHERE vehicle_type = 'it''s $1' AND x = 'Van'"
        );
    }

    #[test]
    fn bind_params_quotes_and_escapes() {
        let sql = r#"INSERT INTO reservations VALUES ($1, $2, $3)"#;
        let params: Vec<Option<Vec<u8>>> = vec![
            Some(b"O'Brien Van".to_vec()),
            Some(b"1000".to_vec()),
            Some(b"2000".to_vec()),
        ];
        assert_eq!(
            bind_params(sql, &params),
            "INSERT INTO reservations VALUES ('O''Brien Van', '1000', '2000')"
        );
    }

    #[test]
    fn bind_params_distinguishes_multi_digit_indexes() {
        let mut params: Vec<Option<Vec<u8>>> = (1..=10).map(|i| Some(format!("v{i}").into_bytes())).collect();
        params[4] = None;
        assert_eq!(bind_params("$1 $10 $5", &params), "'v1' 'v10' NULL");
        // Unbound placeholder is left alone.
        assert_eq!(bind_params("$11", &params), "$11");
    }

    #[test]
    fn result_schema_by_table() {
        let names = |fields: Vec<FieldInfo>| -> Vec<String> {
            fields.iter().map(|f| f.name().to_string()).collect()
        };
        assert_eq!(
            names(result_schema("SELECT * FROM availability WHERE start >= $1")),
            vec!["vehicle_type", "available"]
        );
        assert_eq!(
            names(result_schema("select * from vehicle_types")),
            vec!["name", "total_count"]
        );
        assert_eq!(
            names(result_schema("SELECT * FROM reservations")),
            vec!["vehicle_type", "start", "end"]
        );
        assert!(result_schema("INSERT INTO reservations VALUES ($1, $2, $3)").is_empty());
    }

    #[test]
    fn engine_errors_map_to_sqlstate() {
        let code = |e: EngineError| match engine_err(e) {
            PgWireError::UserError(info) => info.code.clone(),
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(code(EngineError::InvalidRange { start: 2, end: 1 }), "22023");
        assert_eq!(code(EngineError::InvalidVehicleType(String::new())), "22023");
        assert_eq!(code(EngineError::LimitExceeded("x")), "54000");
        assert_eq!(
            code(EngineError::Store(crate::engine::StoreError::Full(1))),
            "58000"
        );
    }
}
