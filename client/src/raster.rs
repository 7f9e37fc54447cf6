use async_trait::async_trait;
use bytes::Bytes;
use frame_relay_common::frame::{jpeg_quality_percent, FrameDimensions};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::surface::{CaptureError, FrameSource};

/// Something that can hand out the current video frame as RGB pixels.
pub trait RasterSource {
    fn dimensions(&self) -> FrameDimensions;

    /// The current frame, or `None` when nothing has been produced yet.
    fn snapshot(&self) -> Option<RgbImage>;
}

/// Native replacement for draw-to-canvas + `toBlob`: resizes the snapshot
/// to the requested size and JPEG-encodes it.
pub struct JpegRasterCapture<R> {
    source: R,
}

impl<R: RasterSource> JpegRasterCapture<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &R {
        &self.source
    }
}

#[async_trait(?Send)]
impl<R: RasterSource> FrameSource for JpegRasterCapture<R> {
    fn dimensions(&self) -> FrameDimensions {
        self.source.dimensions()
    }

    async fn capture_jpeg(
        &self,
        size: FrameDimensions,
        quality: f64,
    ) -> Result<Option<Bytes>, CaptureError> {
        let Some(frame) = self.source.snapshot() else {
            return Ok(None);
        };
        if frame.width() == 0 || frame.height() == 0 || size.is_empty() {
            return Ok(None);
        }

        let raster = if frame.dimensions() == (size.width, size.height) {
            frame
        } else {
            imageops::resize(&frame, size.width, size.height, FilterType::Triangle)
        };
        encode_jpeg(&raster, quality).map(Some)
    }
}

pub fn encode_jpeg(raster: &RgbImage, quality: f64) -> Result<Bytes, CaptureError> {
    let mut buf = Vec::with_capacity(64 * 1024);
    JpegEncoder::new_with_quality(&mut buf, jpeg_quality_percent(quality))
        .encode_image(raster)
        .map_err(|e| CaptureError::Encode(e.to_string()))?;
    Ok(Bytes::from(buf))
}
