use log::warn;

/// Character set and collation are fixed; every connection and every
/// database created through the CLI uses them.
pub const CHARSET: &str = "utf8mb4";
pub const COLLATION: &str = "utf8mb4_unicode_ci";

fn default_host() -> String {
    "localhost".into()
}

fn default_port() -> u16 {
    3306
}

fn default_user() -> String {
    "root".into()
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: Option<String>,
}

impl Config {
    /// Read the connection settings from `MYSQL_*` environment variables,
    /// once, at startup. Missing variables fall back to defaults; an
    /// unparsable port falls back with a warning rather than aborting.
    pub fn from_env() -> Self {
        let port = match std::env::var("MYSQL_PORT") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("MYSQL_PORT is not a valid port number: {raw:?}, using {}", default_port());
                default_port()
            }),
            Err(_) => default_port(),
        };

        Config {
            host: std::env::var("MYSQL_HOST").unwrap_or_else(|_| default_host()),
            port,
            user: std::env::var("MYSQL_USER").unwrap_or_else(|_| default_user()),
            password: std::env::var("MYSQL_PASSWORD").unwrap_or_default(),
            database: std::env::var("MYSQL_DATABASE").ok().filter(|db| !db.is_empty()),
        }
    }
}
