use async_trait::async_trait;
use bytes::Bytes;
use frame_relay_common::frame::FrameDimensions;
use std::rc::Rc;

/// A live video surface that frames can be sampled from.
#[async_trait(?Send)]
pub trait FrameSource {
    /// Current intrinsic size of the video; `0x0` until the first frame.
    fn dimensions(&self) -> FrameDimensions;

    /// Render the current frame at `size` and encode it as a JPEG.
    ///
    /// `Ok(None)` means the encoder produced no data; the caller treats
    /// that as "nothing to send", not as a failure.
    async fn capture_jpeg(
        &self,
        size: FrameDimensions,
        quality: f64,
    ) -> Result<Option<Bytes>, CaptureError>;
}

/// Where downloaded frames are shown.
///
/// Handles own whatever the surface allocates for one image (an object URL,
/// a file); a handle that is no longer shown must be given back through
/// [`DisplaySurface::release`].
pub trait DisplaySurface {
    type Handle;

    fn wrap(&self, image: Bytes) -> Result<Self::Handle, DisplayError>;

    fn assign(&self, handle: &Self::Handle) -> Result<(), DisplayError>;

    fn release(&self, handle: Self::Handle);
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("failed to render video frame: {0}")]
    Render(String),
    #[error("failed to encode frame: {0}")]
    Encode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("failed to wrap downloaded image: {0}")]
    Wrap(String),
    #[error("failed to assign image to display: {0}")]
    Assign(String),
}

impl<D: DisplaySurface + ?Sized> DisplaySurface for Rc<D> {
    type Handle = D::Handle;

    fn wrap(&self, image: Bytes) -> Result<Self::Handle, DisplayError> {
        (**self).wrap(image)
    }

    fn assign(&self, handle: &Self::Handle) -> Result<(), DisplayError> {
        (**self).assign(handle)
    }

    fn release(&self, handle: Self::Handle) {
        (**self).release(handle)
    }
}
