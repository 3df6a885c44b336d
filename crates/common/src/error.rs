use thiserror::Error;

/// Failure taxonomy for the engine.
///
/// Insufficient history and degenerate arithmetic are deliberately NOT errors:
/// indicators return `None`/documented sentinels and classifiers treat them as
/// "no signal". Only supplier and configuration failures surface here, and a
/// per-symbol supplier failure never aborts a whole scan cycle.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Supplier error: {0}")]
    Supplier(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
