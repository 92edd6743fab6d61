use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings blob is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No value stored under key {key:?}")]
    MissingKey { key: String },
}
