//! Error types for the bootstrap logger

pub type Result<T> = std::result::Result<T, BootstrapError>;

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// The unit owning a logger was unloaded before the logger was created
    #[error("Cannot create logger '{logger}': owning unit '{unit}' has been unloaded")]
    UnitUnloaded { logger: String, unit: String },

    /// Surrogate requested after redirection closed the coordinator
    #[error("Redirection already performed, no further surrogate loggers can be created")]
    RedirectClosed,

    /// Redirection triggered more than once
    #[error("Surrogate loggers have already been redirected")]
    AlreadyRedirected,

    /// Provider discovery or instantiation failure
    #[error("Service configuration error: {message}")]
    ServiceConfiguration {
        message: String,
        #[source]
        source: Option<Box<BootstrapError>>,
    },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// The replay worker could not be started
    #[error("Replay dispatcher unavailable: {0}")]
    DispatcherUnavailable(String),

    /// A dispatched task reported a failure
    #[error("Deferred task failed: {0}")]
    TaskFailed(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl BootstrapError {
    /// Create an unloaded-unit error
    pub fn unit_unloaded(logger: impl Into<String>, unit: impl Into<String>) -> Self {
        BootstrapError::UnitUnloaded {
            logger: logger.into(),
            unit: unit.into(),
        }
    }

    /// Create a service configuration error
    pub fn service(message: impl Into<String>) -> Self {
        BootstrapError::ServiceConfiguration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a service configuration error caused by another error
    pub fn service_caused_by(message: impl Into<String>, cause: BootstrapError) -> Self {
        BootstrapError::ServiceConfiguration {
            message: message.into(),
            source: Some(Box::new(cause)),
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        BootstrapError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a task failure error
    pub fn task<S: Into<String>>(msg: S) -> Self {
        BootstrapError::TaskFailed(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        BootstrapError::Other(msg.into())
    }
}
