use log::{debug, error, info, warn};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::config::Config;
use crate::db::Database;
use crate::rpc::{attach_id, Request};
use crate::tools;

/// Reads newline-delimited JSON requests from stdin until the stream ends,
/// writing exactly one response line per request. Blank lines are skipped;
/// a malformed line gets an id-less error response and the loop continues.
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::new(config);

    let stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let reader = BufReader::new(stdin);
    let mut lines = reader.lines();

    info!("MySQL MCP server started, reading requests from stdin");
    info!("target server: {}", db.server_addr());

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }

                debug!("received message (len={}): {line}", line.len());
                let response = match serde_json::from_str::<Request>(&line) {
                    Ok(request) => {
                        debug!("parsed request: method={}, id={:?}", request.method, request.id);
                        let id = request.id.clone();
                        let payload = handle_message(request, &mut db).await;
                        attach_id(payload, id)
                    }
                    Err(e) => {
                        warn!("failed to parse request: {e}");
                        json!({"error": format!("invalid request: {e}")})
                    }
                };

                match serde_json::to_string(&response) {
                    Ok(response_str) => {
                        if let Err(e) = write_response(&mut stdout, &response_str).await {
                            error!("failed to write response: {e}");
                        }
                    }
                    Err(e) => {
                        error!("failed to serialize response: {e}");
                    }
                }
            }
            Ok(None) => {
                info!("stdin closed, shutting down");
                break;
            }
            Err(e) => {
                warn!("error reading from stdin: {e} (kind: {:?})", e.kind());
                if e.kind() == std::io::ErrorKind::UnexpectedEof {
                    break;
                }
                tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            }
        }
    }

    db.close().await;
    info!("shutdown complete");
    Ok(())
}

async fn write_response(
    stdout: &mut tokio::io::Stdout,
    response: &str,
) -> Result<(), std::io::Error> {
    stdout.write_all(response.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    // flushed per line so the client never waits on a buffered response
    stdout.flush().await
}

/// Routes one parsed request to its handler. Stateless across calls; the
/// only state anywhere is the connection held by `Database`.
pub async fn handle_message(request: Request, db: &mut Database) -> Value {
    match request.method.as_str() {
        "initialize" => json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": "mysql-mcp-server",
                "version": "1.0.0"
            }
        }),
        "tools/list" => json!({ "tools": tools::catalog() }),
        "tools/call" => {
            let params = request.params.unwrap_or_else(|| json!({}));
            let name = params
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));
            tools::call(&name, &arguments, db).await
        }
        // bare {"error": ...} without a success key, unlike tool failures;
        // clients depend on this shape, so it stays
        other => json!({"error": format!("unknown method: {other}")}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn test_db() -> Database {
        Database::new(Config {
            host: "localhost".into(),
            port: 3306,
            user: "root".into(),
            password: String::new(),
            database: None,
        })
    }

    fn request(raw: &str) -> Request {
        serde_json::from_str(raw).unwrap()
    }

    #[tokio::test]
    async fn initialize_returns_fixed_payload() {
        let mut db = test_db();
        let payload = handle_message(request(r#"{"method": "initialize"}"#), &mut db).await;
        assert_eq!(payload["protocolVersion"], "2024-11-05");
        assert_eq!(payload["capabilities"], json!({"tools": {}}));
        assert_eq!(payload["serverInfo"]["name"], "mysql-mcp-server");
        assert_eq!(payload["serverInfo"]["version"], "1.0.0");

        // no prior state changes the answer
        let again = handle_message(request(r#"{"method": "initialize"}"#), &mut db).await;
        assert_eq!(again["protocolVersion"], "2024-11-05");
    }

    #[tokio::test]
    async fn tools_list_returns_four_descriptors() {
        let mut db = test_db();
        let payload = handle_message(request(r#"{"method": "tools/list"}"#), &mut db).await;
        let tools = payload["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 4);
        assert!(tools.iter().all(|t| t.get("inputSchema").is_some()));
    }

    #[tokio::test]
    async fn unknown_method_uses_bare_error_shape() {
        let mut db = test_db();
        let payload = handle_message(request(r#"{"method": "resources/list"}"#), &mut db).await;
        assert_eq!(payload, json!({"error": "unknown method: resources/list"}));
        assert!(payload.get("success").is_none());
    }

    #[tokio::test]
    async fn tools_call_without_params_is_unknown_tool() {
        let mut db = test_db();
        let payload = handle_message(request(r#"{"method": "tools/call"}"#), &mut db).await;
        assert_eq!(payload, json!({"success": false, "error": "unknown tool: "}));
    }

    #[tokio::test]
    async fn response_carries_request_id() {
        let mut db = test_db();
        let req = request(r#"{"id": 42, "method": "initialize"}"#);
        let id = req.id.clone();
        let payload = attach_id(handle_message(req, &mut db).await, id);
        assert_eq!(payload["id"], json!(42));
    }
}
