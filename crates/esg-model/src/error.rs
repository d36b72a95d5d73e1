use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
