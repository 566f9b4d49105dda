use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScalerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Cluster error: {0}")]
    Cluster(String),

    #[error("Command error: {0}")]
    Command(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<serde_json::Error> for ScalerError {
    fn from(e: serde_json::Error) -> Self {
        ScalerError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ScalerError>;
