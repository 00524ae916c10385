use crate::frame::FrameError;
use gateway_tls::TlsError;
use thiserror::Error;

/// Delivery failures: the gateway could not be reached or the frame not written
#[derive(Debug, Error)]
pub enum PushError {
    #[error("failed to contact push gateway {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: TlsError,
    },

    #[error("failed to write notification frame: {0}")]
    Write(#[source] std::io::Error),
}

/// Everything `push` can return
#[derive(Debug, Error)]
pub enum ApnsError {
    #[error(transparent)]
    Push(#[from] PushError),

    #[error("failed to encode notification payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error(transparent)]
    Frame(#[from] FrameError),
}

impl ApnsError {
    /// Connect or write failure, as opposed to a message that could not be encoded
    pub fn is_delivery_failure(&self) -> bool {
        matches!(self, ApnsError::Push(_))
    }
}
