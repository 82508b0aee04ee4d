
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KindlingError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Parse error: {message}")]
    Parse { message: String, line: Option<usize>, col: Option<usize> },
    #[error("Execution error: {0}")]
    Execution(String),
    #[error("Internal invariant violated: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, KindlingError>;

// Helper conversions
impl From<config::ConfigError> for KindlingError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
