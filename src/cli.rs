use clap::Subcommand;
use serde_json::{json, Value};

use crate::config::{Config, CHARSET, COLLATION};
use crate::db::{is_valid_identifier, Database};
use crate::error::ServerError;
use crate::tools;

/// One-shot commands: each opens the connection, runs a single statement
/// through the same executor the server uses, prints the outcome as pretty
/// JSON and closes the connection.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open a connection and report whether it succeeded
    TestConnection,
    /// Execute a single SQL statement
    Query {
        #[arg(long, short)]
        sql: String,
    },
    /// List all databases
    Databases,
    /// List tables in the default or a named database
    Tables {
        #[arg(long, short)]
        database: Option<String>,
    },
    /// Describe the structure of a table
    Describe {
        #[arg(long, short)]
        table: String,
        #[arg(long, short)]
        database: Option<String>,
    },
    /// Create a database with the fixed character set and collation
    CreateDb { database: String },
    /// Switch the session's default database
    UseDb { database: String },
}

pub async fn run(command: Command, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::new(config);
    let payload = execute(command, &mut db).await;
    db.close().await;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

async fn execute(command: Command, db: &mut Database) -> Value {
    match command {
        Command::TestConnection => {
            let addr = db.server_addr();
            match db.ensure_open().await {
                Ok(_) => json!({
                    "success": true,
                    "message": format!("connected to MySQL server {addr}"),
                }),
                Err(e) => tools::failure(&e),
            }
        }
        Command::Query { sql } => tools::call("mysql_query", &json!({"query": sql}), db).await,
        Command::Databases => tools::call("mysql_show_databases", &json!({}), db).await,
        Command::Tables { database } => {
            let arguments = match database {
                Some(name) => json!({"database": name}),
                None => json!({}),
            };
            tools::call("mysql_show_tables", &arguments, db).await
        }
        Command::Describe { table, database } => {
            let mut arguments = json!({"table": table});
            if let Some(name) = database {
                arguments["database"] = json!(name);
            }
            tools::call("mysql_describe_table", &arguments, db).await
        }
        Command::CreateDb { database } => {
            run_statement(db, create_database_statement(&database)).await
        }
        Command::UseDb { database } => run_statement(db, use_database_statement(&database)).await,
    }
}

async fn run_statement(db: &mut Database, statement: Result<String, ServerError>) -> Value {
    match statement {
        Ok(statement) => match db.execute(&statement).await {
            Ok(outcome) => outcome.into_json(),
            Err(e) => tools::failure(&e),
        },
        Err(e) => tools::failure(&e),
    }
}

fn create_database_statement(database: &str) -> Result<String, ServerError> {
    if !is_valid_identifier(database) {
        return Err(ServerError::InvalidIdentifier(database.to_string()));
    }
    Ok(format!(
        "CREATE DATABASE IF NOT EXISTS `{database}` CHARACTER SET {CHARSET} COLLATE {COLLATION}"
    ))
}

fn use_database_statement(database: &str) -> Result<String, ServerError> {
    if !is_valid_identifier(database) {
        return Err(ServerError::InvalidIdentifier(database.to_string()));
    }
    Ok(format!("USE `{database}`"))
}
