//! MySQL MCP Server
//!
//! Exposes a MySQL database to a tool-calling client over a line-delimited
//! JSON protocol on stdio (`initialize`, `tools/list`, `tools/call`), with a
//! fixed catalog of four query tools backed by a single lazily-opened
//! connection. Invoked with a subcommand it instead runs one statement and
//! prints the result, reusing the same connection manager and executor.
//!
//! Connection settings come from `MYSQL_*` environment variables, read once
//! at startup; command-line flags override them.

mod cli;
mod config;
mod db;
mod error;
mod rpc;
mod server;
mod tools;

use clap::Parser;
use cli::Command;
use config::Config;

#[derive(Debug, Parser)]
#[command(name = "mysql-mcp-server", version)]
struct Cli {
    /// MySQL host (overrides MYSQL_HOST)
    #[arg(long)]
    host: Option<String>,

    /// MySQL port (overrides MYSQL_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// MySQL user (overrides MYSQL_USER)
    #[arg(long, short)]
    user: Option<String>,

    /// MySQL password (overrides MYSQL_PASSWORD)
    #[arg(long, short)]
    password: Option<String>,

    /// Default database (overrides MYSQL_DATABASE)
    #[arg(long, short)]
    database: Option<String>,

    /// One-shot command; without one the stdio server runs
    #[command(subcommand)]
    command: Option<Command>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(user) = cli.user {
        config.user = user;
    }
    if let Some(password) = cli.password {
        config.password = password;
    }
    if let Some(database) = cli.database {
        config.database = Some(database);
    }

    match cli.command {
        Some(command) => cli::run(command, config).await,
        None => server::run(config).await,
    }
}
