use log::{debug, error, info, warn};
use serde_json::{json, Value};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::types::BigDecimal;
use sqlx::{Column, ConnectOptions, Connection, Row, TypeInfo};

use crate::config::{Config, CHARSET, COLLATION};
use crate::error::ServerError;

/// Validates that an identifier (table name, database name) contains only
/// alphanumeric characters or underscores. Identifiers are interpolated into
/// statements where parameters cannot be used (FROM, DESCRIBE, USE), so
/// anything else is rejected before a statement is built.
pub fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Query,
    Command,
}

/// Statements starting with one of these return a row set; everything else
/// is a mutating command. `DESC` and `DESCRIBE` are both listed, and the
/// test is a case-insensitive prefix match on the trimmed statement.
const QUERY_PREFIXES: [&str; 5] = ["SELECT", "SHOW", "DESCRIBE", "DESC", "EXPLAIN"];

pub fn classify(statement: &str) -> StatementKind {
    let upper = statement.trim().to_uppercase();
    if QUERY_PREFIXES.iter().any(|prefix| upper.starts_with(prefix)) {
        StatementKind::Query
    } else {
        StatementKind::Command
    }
}

/// Result of one executed statement. Exactly one variant applies, chosen by
/// `classify` alone, never by inspecting what the server sent back.
#[derive(Debug)]
pub enum QueryOutcome {
    Rows { data: Vec<Value>, row_count: usize },
    Affected { affected_rows: u64, message: String },
}

impl QueryOutcome {
    pub fn into_json(self) -> Value {
        match self {
            QueryOutcome::Rows { data, row_count } => json!({
                "success": true,
                "type": "query",
                "data": data,
                "row_count": row_count,
            }),
            QueryOutcome::Affected { affected_rows, message } => json!({
                "success": true,
                "type": "command",
                "affected_rows": affected_rows,
                "message": message,
            }),
        }
    }
}

/// Owns the single database connection. The connection is opened lazily on
/// the first statement, rechecked with a ping before each one, and reopened
/// at most once per call; it is never pooled or shared.
pub struct Database {
    config: Config,
    conn: Option<MySqlConnection>,
}

impl Database {
    pub fn new(config: Config) -> Self {
        Database { config, conn: None }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    async fn open(&self) -> Result<MySqlConnection, ServerError> {
        let mut options = MySqlConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .username(&self.config.user)
            .password(&self.config.password)
            .charset(CHARSET)
            .collation(COLLATION);
        if let Some(db) = &self.config.database {
            options = options.database(db);
        }

        match options.connect().await {
            Ok(conn) => {
                info!("connected to MySQL server {}", self.server_addr());
                Ok(conn)
            }
            Err(e) => {
                error!("connection to {} failed: {e}", self.server_addr());
                Err(ServerError::Connection(e))
            }
        }
    }

    /// Returns a live connection, reusing the current one when it still
    /// answers a ping. A dead or absent connection triggers exactly one
    /// reconnect attempt; its failure is the caller's outcome.
    pub async fn ensure_open(&mut self) -> Result<&mut MySqlConnection, ServerError> {
        let conn = match self.conn.take() {
            Some(mut conn) => match conn.ping().await {
                Ok(()) => conn,
                Err(e) => {
                    warn!("connection lost ({e}), reconnecting");
                    self.open().await?
                }
            },
            None => self.open().await?,
        };
        Ok(self.conn.insert(conn))
    }

    /// Executes one statement. Queries return all rows as column-keyed
    /// objects; commands return the affected-row count. Driver errors come
    /// back as failures, never as panics. There is no timeout: a hung
    /// statement blocks the server until the driver gives up.
    pub async fn execute(&mut self, statement: &str) -> Result<QueryOutcome, ServerError> {
        let kind = classify(statement);
        let conn = self.ensure_open().await?;

        debug!("executing {kind:?}: {statement}");
        match kind {
            StatementKind::Query => {
                let rows = sqlx::query(statement).fetch_all(&mut *conn).await?;
                let data: Vec<Value> = rows.iter().map(row_to_json).collect();
                Ok(QueryOutcome::Rows {
                    row_count: data.len(),
                    data,
                })
            }
            StatementKind::Command => {
                let result = sqlx::query(statement).execute(&mut *conn).await?;
                let affected_rows = result.rows_affected();
                Ok(QueryOutcome::Affected {
                    affected_rows,
                    message: format!("statement executed, {affected_rows} rows affected"),
                })
            }
        }
    }

    /// Explicit teardown; called on every server exit path and at the end of
    /// each one-shot CLI invocation.
    pub async fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(e) = conn.close().await {
                warn!("error closing connection: {e}");
            }
        }
    }
}

fn row_to_json(row: &MySqlRow) -> Value {
    let mut fields = serde_json::Map::new();

    for (i, column) in row.columns().iter().enumerate() {
        let type_name = column.type_info().name();

        let value = match type_name {
            "BOOLEAN" | "TINYINT" => {
                // tinyint(1) maps to bool when possible, otherwise int
                if let Ok(v) = row.try_get::<Option<bool>, _>(i) {
                    json!(v)
                } else {
                    json!(row.try_get::<Option<i64>, _>(i).unwrap_or(None))
                }
            }
            "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" | "BIGINT" => {
                json!(row.try_get::<Option<i64>, _>(i).unwrap_or(None))
            }
            "FLOAT" | "DOUBLE" | "REAL" => {
                json!(row.try_get::<Option<f64>, _>(i).unwrap_or(None))
            }
            "DECIMAL" | "NUMERIC" => {
                // BigDecimal serialized as string to preserve precision
                match row.try_get::<Option<BigDecimal>, _>(i) {
                    Ok(v) => json!(v.map(|d| d.to_string())),
                    Err(_) => Value::Null,
                }
            }
            "DATE" | "TIME" | "DATETIME" | "TIMESTAMP" => {
                json!(row.try_get::<Option<String>, _>(i).unwrap_or(None))
            }
            // VARCHAR, TEXT, BLOB, JSON, ENUM and everything else as string
            _ => json!(row.try_get::<Option<String>, _>(i).unwrap_or(None)),
        };

        fields.insert(column.name().to_string(), value);
    }

    Value::Object(fields)
}
