use thiserror::Error;

#[derive(Debug, Error)]
pub enum SextantError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type SextantResult<T> = Result<T, SextantError>;
