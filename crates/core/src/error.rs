use thiserror::Error;

/// Result type for recvault operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for recvault operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration related errors (fatal to `start_monitoring`)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Directory watcher errors
    #[error("Watcher error: {0}")]
    Watcher(String),

    /// Metadata extraction errors (retryable)
    #[error("Metadata error for {file}: {message}")]
    Metadata { file: String, message: String },

    /// Object storage errors (retryable)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Metadata persistence errors (retryable)
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Any other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Creates a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a watcher error
    pub fn watcher(msg: impl Into<String>) -> Self {
        Self::Watcher(msg.into())
    }

    /// Creates a metadata extraction error
    pub fn metadata(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Metadata {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Creates an object storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Creates a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Creates an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Adds context to any error
    pub fn with_context<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Whether the ingestion coordinator may retry after this error
    ///
    /// Metadata extraction, upload, and persistence failures are transient
    /// by assumption; configuration and input errors are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Metadata { .. } | Self::Storage(_) | Self::Persistence(_) | Self::Io(_)
        )
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::with_context(context, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(Error::storage("bucket unavailable").is_retryable());
        assert!(Error::persistence("row lock").is_retryable());
        assert!(Error::metadata("a.mp4", "vanished").is_retryable());
        assert!(!Error::config("no path").is_retryable());
        assert!(!Error::invalid_input("bad id").is_retryable());
    }

    #[test]
    fn context_wraps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = std::result::Result::<(), _>::Err(io)
            .context("reading recording")
            .unwrap_err();
        assert!(err.to_string().starts_with("reading recording"));
    }
}
