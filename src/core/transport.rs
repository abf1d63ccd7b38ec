//! Transport seam between the turn controller and the network.

use std::error::Error as StdError;
use std::fmt;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

/// Shown whenever the exchange fails without a server-supplied reason.
pub const CONNECTION_ERROR_MESSAGE: &str = "Connection error. Please try again.";

/// Response body as it arrives: opaque chunks in network order.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, TransportError>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request could not be sent or no response arrived.
    Connect(String),
    /// The server answered with a non-success status.
    Status { status: u16, detail: Option<String> },
    /// The body broke off while streaming.
    Body(String),
}

impl TransportError {
    /// Text to show the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            TransportError::Status {
                detail: Some(detail),
                ..
            } if !detail.trim().is_empty() => detail.trim().to_string(),
            _ => CONNECTION_ERROR_MESSAGE.to_string(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Connect(reason) => write!(f, "request failed: {reason}"),
            TransportError::Status {
                status,
                detail: Some(detail),
            } => write!(f, "server returned HTTP {status}: {detail}"),
            TransportError::Status { status, detail: None } => {
                write!(f, "server returned HTTP {status}")
            }
            TransportError::Body(reason) => write!(f, "response stream interrupted: {reason}"),
        }
    }
}

impl StdError for TransportError {}

/// Opens one streamed turn for `message`.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn open(&self, message: &str) -> Result<ByteStream, TransportError>;
}
