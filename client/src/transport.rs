use async_trait::async_trait;
use bytes::Bytes;

/// Result of polling the relay for the latest remote frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    /// Status 200 with the image bytes.
    Frame(Bytes),
    /// Any other status; there is no new frame to show.
    NoFrame(u16),
}

/// Uncached HTTP access to the relay's frame endpoint.
#[async_trait(?Send)]
pub trait FrameTransport {
    /// POST one JPEG frame. Returns the response status; the response body
    /// is never read.
    async fn upload(&self, jpeg: Bytes) -> Result<u16, TransportError>;

    /// GET the most recent frame.
    async fn download(&self) -> Result<Fetched, TransportError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("failed to read response body: {0}")]
    Body(String),
}
