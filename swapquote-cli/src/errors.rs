use swapquote_core::QuoteError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("Invalid quote request: {0}")]
    Request(#[from] serde_json::Error),
    #[error("Invalid engine configuration: {0}")]
    Config(#[from] serde_yaml::Error),
    #[error("Missing argument: {0}")]
    MissingArgument(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Quote(#[from] QuoteError),
}

impl CliError {
    pub fn io(path: &str, source: std::io::Error) -> Self {
        CliError::Io { path: path.to_string(), source }
    }
}
