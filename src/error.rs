use std::fmt;

#[derive(Debug)]
pub enum ServerError {
    Connection(sqlx::Error),
    Sql(sqlx::Error),
    InvalidIdentifier(String),
    EmptyArgument(&'static str),
    UnknownTool(String),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Connection(e) => write!(f, "connection failed: {e}"),
            ServerError::Sql(e) => write!(f, "SQL execution failed: {e}"),
            ServerError::InvalidIdentifier(name) => write!(f, "invalid identifier: {name}"),
            ServerError::EmptyArgument(name) => write!(f, "{name} must not be empty"),
            ServerError::UnknownTool(name) => write!(f, "unknown tool: {name}"),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::Connection(e) | ServerError::Sql(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for ServerError {
    fn from(e: sqlx::Error) -> Self {
        ServerError::Sql(e)
    }
}
