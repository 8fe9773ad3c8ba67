use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("capacity exceeded: {needed} bytes needed, limit is {limit} bytes")]
    CapacityExceeded { needed: usize, limit: usize },

    #[error("{0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;
