use thiserror::Error;

/// Failures reported by a `DeviceDirectory` collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// The device or driver does not implement the requested property.
    #[error("not supported: {0}")]
    NotSupported(String),

    #[error("device not available: {0}")]
    DeviceNotAvailable(String),

    #[error("{operation} failed: {message}")]
    QueryFailed { operation: String, message: String },
}

impl DirectoryError {
    pub fn query_failed(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::QueryFailed {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn is_not_supported(&self) -> bool {
        matches!(self, Self::NotSupported(_))
    }
}

/// Errors that can occur while building a pin resource catalog.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("query failed: {operation}: {cause}")]
    QueryFailed {
        operation: &'static str,
        #[source]
        cause: DirectoryError,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("no active audio endpoints found")]
    NoDevicesFound,

    #[error("unexpected data: {0}")]
    Unexpected(String),

    #[error("resource sink rejected record: {0}")]
    SinkRejected(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

impl CatalogError {
    /// Wraps a collaborator failure, tagging it with the operation that issued it.
    pub fn query(operation: &'static str) -> impl FnOnce(DirectoryError) -> Self {
        move |cause| Self::QueryFailed { operation, cause }
    }
}
