use frame_relay_common::frame::{FrameDimensions, DEFAULT_JPEG_QUALITY, MAX_UPLOAD_WIDTH};
use tracing::{debug, warn};

use crate::latch::BusyLatch;
use crate::status::{StatusSink, UPLOAD_ERROR_STATUS};
use crate::surface::{CaptureError, FrameSource};
use crate::transport::{FrameTransport, TransportError};

/// What one upload tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// A previous upload is still in flight.
    Busy,
    /// The video surface has not reported a size yet.
    NotReady,
    /// The encoder produced nothing.
    NoData,
    /// The frame was posted; `status` is whatever the relay answered.
    Sent { status: u16 },
    Failed,
}

#[derive(Debug, thiserror::Error)]
enum UploadError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Samples the local video and posts it to the relay, one frame per tick.
pub struct UploadLoop<F, T, S> {
    source: F,
    transport: T,
    status: S,
    latch: BusyLatch,
    max_width: u32,
    quality: f64,
}

impl<F, T, S> UploadLoop<F, T, S>
where
    F: FrameSource,
    T: FrameTransport,
    S: StatusSink,
{
    pub fn new(source: F, transport: T, status: S) -> Self {
        Self {
            source,
            transport,
            status,
            latch: BusyLatch::new(),
            max_width: MAX_UPLOAD_WIDTH,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_max_width(mut self, max_width: u32) -> Self {
        self.max_width = max_width;
        self
    }

    pub fn with_quality(mut self, quality: f64) -> Self {
        self.quality = quality;
        self
    }

    pub fn source(&self) -> &F {
        &self.source
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn is_busy(&self) -> bool {
        self.latch.is_busy()
    }

    /// Run one iteration. Never overlaps with itself: a tick that arrives
    /// while another is in flight returns [`UploadOutcome::Busy`] untouched.
    pub async fn tick(&self) -> UploadOutcome {
        let Some(_guard) = self.latch.try_acquire() else {
            return UploadOutcome::Busy;
        };

        let dims = self.source.dimensions();
        if dims.is_empty() {
            return UploadOutcome::NotReady;
        }

        match self.upload(dims).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "frame upload failed");
                self.status.set_status(UPLOAD_ERROR_STATUS);
                UploadOutcome::Failed
            }
        }
    }

    async fn upload(&self, dims: FrameDimensions) -> Result<UploadOutcome, UploadError> {
        let size = dims.scaled_to_max_width(self.max_width);
        let Some(jpeg) = self.source.capture_jpeg(size, self.quality).await? else {
            debug!(%size, "encoder produced no data, skipping frame");
            return Ok(UploadOutcome::NoData);
        };

        let bytes = jpeg.len();
        let status = self.transport.upload(jpeg).await?;
        if !(200..300).contains(&status) {
            // The loop still counts this as sent; the next tick posts a fresh frame.
            warn!(status, bytes, "relay rejected frame upload");
        } else {
            debug!(status, bytes, %size, "frame uploaded");
        }
        Ok(UploadOutcome::Sent { status })
    }
}
