use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// The engine reported the document absent
    #[error("{entity} with id {id} not found")]
    NotFound { entity: String, id: String },

    /// Any other engine-level failure; the engine's message is preserved
    #[error("Index operation failed: {0}")]
    IndexOperationFailed(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        AppError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// HTTP status code a transport layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::NotFound { .. } => 404,
            AppError::Validation(_) => 400,
            AppError::IndexOperationFailed(_) => 502,
            AppError::Configuration(_) => 500,
            AppError::Serialization(_) => 500,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::NotFound { .. } => "NOT_FOUND",
            AppError::IndexOperationFailed(_) => "INDEX_OPERATION_FAILED",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from validator::ValidationErrors
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
