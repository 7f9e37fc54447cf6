use bytes::Bytes;
use std::cell::RefCell;
use tracing::{debug, trace, warn};

use crate::latch::BusyLatch;
use crate::status::{StatusSink, DOWNLOAD_ERROR_STATUS};
use crate::surface::{DisplayError, DisplaySurface};
use crate::transport::{Fetched, FrameTransport, TransportError};

/// What one download tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// A previous download is still in flight.
    Busy,
    /// The relay answered with something other than 200.
    NoFrame { status: u16 },
    Displayed,
    Failed,
}

#[derive(Debug, thiserror::Error)]
enum DownloadError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Display(#[from] DisplayError),
}

/// Polls the relay for the latest frame and swaps it into the display.
///
/// Exactly one display handle is live once a frame has been shown; the
/// superseded one is released only after its replacement is assigned.
pub struct DownloadLoop<T, D: DisplaySurface, S> {
    transport: T,
    display: D,
    status: S,
    latch: BusyLatch,
    current: RefCell<Option<D::Handle>>,
}

impl<T, D, S> DownloadLoop<T, D, S>
where
    T: FrameTransport,
    D: DisplaySurface,
    S: StatusSink,
{
    pub fn new(transport: T, display: D, status: S) -> Self {
        Self {
            transport,
            display,
            status,
            latch: BusyLatch::new(),
            current: RefCell::new(None),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn is_busy(&self) -> bool {
        self.latch.is_busy()
    }

    pub fn has_frame(&self) -> bool {
        self.current.borrow().is_some()
    }

    pub async fn tick(&self) -> DownloadOutcome {
        let Some(_guard) = self.latch.try_acquire() else {
            return DownloadOutcome::Busy;
        };

        let result = match self.transport.download().await {
            Ok(Fetched::NoFrame(status)) => {
                trace!(status, "no remote frame available");
                return DownloadOutcome::NoFrame { status };
            }
            Ok(Fetched::Frame(image)) => self.present(image),
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(()) => DownloadOutcome::Displayed,
            Err(e) => {
                warn!(error = %e, "frame download failed");
                self.status.set_status(DOWNLOAD_ERROR_STATUS);
                DownloadOutcome::Failed
            }
        }
    }

    fn present(&self, image: Bytes) -> Result<(), DownloadError> {
        let bytes = image.len();
        let next = self.display.wrap(image)?;
        if let Err(e) = self.display.assign(&next) {
            self.display.release(next);
            return Err(e.into());
        }

        let previous = self.current.replace(Some(next));
        if let Some(previous) = previous {
            self.display.release(previous);
        }
        debug!(bytes, "remote frame displayed");
        Ok(())
    }
}

impl<T, D: DisplaySurface, S> Drop for DownloadLoop<T, D, S> {
    fn drop(&mut self) {
        if let Some(handle) = self.current.get_mut().take() {
            self.display.release(handle);
        }
    }
}
