//! Error types for region, domain and item operations.

use aws_sdk_dynamodb::error::BuildError;
use thiserror::Error;

/// Boxed source error carried by [`Error::RemoteService`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Service error code DynamoDB uses for a missing table.
pub const NOT_FOUND_CODE: &str = "ResourceNotFoundException";

/// Errors that can occur while talking to the attribute store.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed credential fields, detected before any network call.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A remote call failed. The SDK error is kept as the source, unchanged.
    #[error("{operation} failed: {source}")]
    RemoteService {
        operation: &'static str,
        code: Option<String>,
        #[source]
        source: BoxError,
    },

    /// The selection was pulled past its last item.
    #[error("no more items in the selection")]
    ExhaustedSequence,

    #[error("operation not supported: {0}")]
    UnsupportedOperation(&'static str),

    /// An SDK request builder rejected a locally built value.
    #[error("failed to build request: {0}")]
    Request(#[from] BuildError),

    #[error("attribute mapping failed: {0}")]
    Serialization(#[from] serde_dynamo::Error),

    #[error("table '{domain}' did not become active in time")]
    ActivationTimeout { domain: String },
}

impl Error {
    /// Builds a [`Error::RemoteService`] from an operation name and any error.
    pub fn remote(
        operation: &'static str,
        code: Option<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::RemoteService {
            operation,
            code,
            source: source.into(),
        }
    }

    /// Service error code of a remote failure, if the service sent one.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::RemoteService { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// True when the remote service reported that the table does not exist.
    pub fn is_not_found(&self) -> bool {
        self.code() == Some(NOT_FOUND_CODE)
    }
}
