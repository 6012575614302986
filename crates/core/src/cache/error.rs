use thiserror::Error;

/// Errors that can occur during cache operations.
///
/// Read paths treat every variant as a cache miss; only invalidation
/// propagates them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Cache operation failed: {0}")]
    OperationFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Publish failed: {0}")]
    PublishFailed(String),
    #[error("Invalid key pattern: {0}")]
    InvalidPattern(String),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
