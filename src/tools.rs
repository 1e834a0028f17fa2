use serde_json::{json, Value};

use crate::db::{is_valid_identifier, Database};
use crate::error::ServerError;
use crate::rpc::Tool;

/// The fixed tool catalog returned by `tools/list`. Exactly these four,
/// never changing at runtime.
pub fn catalog() -> Vec<Tool> {
    vec![
        Tool {
            name: "mysql_query".to_string(),
            description: "Execute a MySQL query statement".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "SQL statement to execute"
                    }
                },
                "required": ["query"]
            }),
        },
        Tool {
            name: "mysql_show_databases".to_string(),
            description: "List all databases".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
        Tool {
            name: "mysql_show_tables".to_string(),
            description: "List tables in the current database".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "database": {
                        "type": "string",
                        "description": "Database name (optional)"
                    }
                }
            }),
        },
        Tool {
            name: "mysql_describe_table".to_string(),
            description: "Describe the structure of a table".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "table": {
                        "type": "string",
                        "description": "Table name"
                    },
                    "database": {
                        "type": "string",
                        "description": "Database name (optional)"
                    }
                },
                "required": ["table"]
            }),
        },
    ]
}

/// Maps a tool call to the statement it executes, or to a validation
/// failure. Pure: nothing here touches the connection, so a bad call is
/// rejected before any connect attempt.
pub fn resolve(name: &str, arguments: &Value) -> Result<String, ServerError> {
    match name {
        "mysql_query" => {
            let query = arguments.get("query").and_then(Value::as_str).unwrap_or("");
            if query.is_empty() {
                return Err(ServerError::EmptyArgument("query"));
            }
            Ok(query.to_string())
        }
        "mysql_show_databases" => Ok("SHOW DATABASES".to_string()),
        "mysql_show_tables" => match optional_identifier(arguments, "database")? {
            Some(database) => Ok(format!("SHOW TABLES FROM `{database}`")),
            None => Ok("SHOW TABLES".to_string()),
        },
        "mysql_describe_table" => {
            let table = arguments.get("table").and_then(Value::as_str).unwrap_or("");
            if table.is_empty() {
                return Err(ServerError::EmptyArgument("table"));
            }
            if !is_valid_identifier(table) {
                return Err(ServerError::InvalidIdentifier(table.to_string()));
            }
            match optional_identifier(arguments, "database")? {
                Some(database) => Ok(format!("DESCRIBE `{database}`.`{table}`")),
                None => Ok(format!("DESCRIBE `{table}`")),
            }
        }
        other => Err(ServerError::UnknownTool(other.to_string())),
    }
}

/// An absent or empty optional identifier argument is treated as not given;
/// a present one must pass validation before it is interpolated.
fn optional_identifier(arguments: &Value, key: &str) -> Result<Option<String>, ServerError> {
    match arguments.get(key).and_then(Value::as_str) {
        Some(name) if !name.is_empty() => {
            if is_valid_identifier(name) {
                Ok(Some(name.to_string()))
            } else {
                Err(ServerError::InvalidIdentifier(name.to_string()))
            }
        }
        _ => Ok(None),
    }
}

pub fn failure(err: &ServerError) -> Value {
    json!({"success": false, "error": err.to_string()})
}

/// Runs one tool call to its wire payload. Registry-level failures are
/// synthesized directly; everything else passes through the executor's
/// outcome unchanged.
pub async fn call(name: &str, arguments: &Value, db: &mut Database) -> Value {
    match resolve(name, arguments) {
        Ok(statement) => match db.execute(&statement).await {
            Ok(outcome) => outcome.into_json(),
            Err(e) => failure(&e),
        },
        Err(e) => failure(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn test_config() -> Config {
        Config {
            host: "localhost".into(),
            port: 3306,
            user: "root".into(),
            password: String::new(),
            database: None,
        }
    }

    #[test]
    fn catalog_is_fixed() {
        let tools = catalog();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "mysql_query",
                "mysql_show_databases",
                "mysql_show_tables",
                "mysql_describe_table",
            ]
        );
        assert_eq!(tools[0].input_schema["required"], json!(["query"]));
        assert!(tools[1].input_schema.get("required").is_none());
        assert!(tools[2].input_schema.get("required").is_none());
        assert_eq!(tools[3].input_schema["required"], json!(["table"]));

        // repeated calls return the same catalog
        let again = catalog();
        assert_eq!(again.len(), tools.len());
        assert!(again.iter().zip(&tools).all(|(a, b)| a.name == b.name));
    }

    #[test]
    fn resolve_query_passes_statement_through() {
        let sql = resolve("mysql_query", &json!({"query": "SELECT 1"})).unwrap();
        assert_eq!(sql, "SELECT 1");
    }

    #[test]
    fn resolve_rejects_empty_query() {
        let err = resolve("mysql_query", &json!({"query": ""})).unwrap_err();
        assert_eq!(err.to_string(), "query must not be empty");
        let err = resolve("mysql_query", &json!({})).unwrap_err();
        assert_eq!(err.to_string(), "query must not be empty");
    }

    #[test]
    fn resolve_show_statements() {
        assert_eq!(
            resolve("mysql_show_databases", &json!({})).unwrap(),
            "SHOW DATABASES"
        );
        assert_eq!(
            resolve("mysql_show_tables", &json!({})).unwrap(),
            "SHOW TABLES"
        );
        assert_eq!(
            resolve("mysql_show_tables", &json!({"database": "app"})).unwrap(),
            "SHOW TABLES FROM `app`"
        );
        // empty string is the same as absent
        assert_eq!(
            resolve("mysql_show_tables", &json!({"database": ""})).unwrap(),
            "SHOW TABLES"
        );
    }

    #[test]
    fn resolve_describe_statements() {
        assert_eq!(
            resolve("mysql_describe_table", &json!({"table": "users"})).unwrap(),
            "DESCRIBE `users`"
        );
        assert_eq!(
            resolve(
                "mysql_describe_table",
                &json!({"table": "users", "database": "app"})
            )
            .unwrap(),
            "DESCRIBE `app`.`users`"
        );
        let err = resolve("mysql_describe_table", &json!({})).unwrap_err();
        assert_eq!(err.to_string(), "table must not be empty");
    }

    #[test]
    fn resolve_rejects_unsafe_identifiers() {
        let err = resolve(
            "mysql_show_tables",
            &json!({"database": "app`; DROP DATABASE x"}),
        )
        .unwrap_err();
        assert!(matches!(err, ServerError::InvalidIdentifier(_)));

        let err = resolve("mysql_describe_table", &json!({"table": "a`.`b"})).unwrap_err();
        assert!(matches!(err, ServerError::InvalidIdentifier(_)));
    }

    #[test]
    fn resolve_unknown_tool() {
        let err = resolve("drop_everything", &json!({})).unwrap_err();
        assert_eq!(err.to_string(), "unknown tool: drop_everything");
    }

    #[tokio::test]
    async fn call_rejects_before_touching_connection() {
        // validation failures come back without a connect attempt, so an
        // unopened database is never a problem here
        let mut db = Database::new(test_config());

        let payload = call("mysql_query", &json!({"query": ""}), &mut db).await;
        assert_eq!(
            payload,
            json!({"success": false, "error": "query must not be empty"})
        );

        let payload = call("drop_everything", &json!({}), &mut db).await;
        assert_eq!(
            payload,
            json!({"success": false, "error": "unknown tool: drop_everything"})
        );
    }
}
