use async_trait::async_trait;
use frame_relay_common::frame::FrameDimensions;
use image::{Rgb, RgbImage};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

use crate::camera::{CameraError, CaptureBackend, CaptureConstraints, VideoSink};
use crate::raster::RasterSource;

/// A camera that is always present and films a moving gradient.
pub struct SyntheticCamera {
    dims: FrameDimensions,
}

impl SyntheticCamera {
    pub fn new(dims: FrameDimensions) -> Self {
        Self { dims }
    }
}

#[async_trait(?Send)]
impl CaptureBackend for SyntheticCamera {
    type Stream = TestPattern;

    fn name(&self) -> &str {
        "synthetic"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn open(&self, constraints: CaptureConstraints) -> Result<TestPattern, CameraError> {
        if !constraints.video {
            return Err(CameraError::AccessDenied(
                "synthetic camera only produces video".into(),
            ));
        }
        Ok(TestPattern::new(self.dims))
    }
}

/// Stream handle for [`SyntheticCamera`]. Clones share the same stream.
///
/// Like a `<video>` element it reports `0x0` until playback starts.
#[derive(Debug, Clone)]
pub struct TestPattern {
    inner: Arc<PatternState>,
}

#[derive(Debug)]
struct PatternState {
    dims: FrameDimensions,
    playing: AtomicBool,
    frame: AtomicU64,
}

impl TestPattern {
    pub fn new(dims: FrameDimensions) -> Self {
        Self {
            inner: Arc::new(PatternState {
                dims,
                playing: AtomicBool::new(false),
                frame: AtomicU64::new(0),
            }),
        }
    }

    pub fn play(&self) {
        self.inner.playing.store(true, Ordering::Release);
    }

    pub fn is_playing(&self) -> bool {
        self.inner.playing.load(Ordering::Acquire)
    }
}

impl RasterSource for TestPattern {
    fn dimensions(&self) -> FrameDimensions {
        if self.is_playing() {
            self.inner.dims
        } else {
            FrameDimensions::default()
        }
    }

    fn snapshot(&self) -> Option<RgbImage> {
        let dims = self.dimensions();
        if dims.is_empty() {
            return None;
        }
        let offset = self.inner.frame.fetch_add(1, Ordering::Relaxed);
        let shift = (offset * 4 % 256) as u32;
        Some(RgbImage::from_fn(dims.width, dims.height, |x, y| {
            Rgb([
                ((x + shift) * 255 / dims.width.max(1)) as u8,
                (y * 255 / dims.height.max(1)) as u8,
                shift as u8,
            ])
        }))
    }
}

/// Stands in for the page's video element: "playing" a test pattern just
/// starts it.
#[derive(Debug, Default)]
pub struct PatternPlayer;

#[async_trait(?Send)]
impl VideoSink<TestPattern> for PatternPlayer {
    async fn attach_and_play(&self, stream: &TestPattern) -> Result<(), CameraError> {
        stream.play();
        info!(dims = %stream.inner.dims, "synthetic camera playing");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pattern_is_dark_until_played() {
        let camera = SyntheticCamera::new(FrameDimensions::new(64, 48));
        let pattern = camera.open(CaptureConstraints::VIDEO_ONLY).await.unwrap();

        assert!(pattern.dimensions().is_empty());
        assert!(pattern.snapshot().is_none());

        PatternPlayer.attach_and_play(&pattern).await.unwrap();
        assert_eq!(pattern.dimensions(), FrameDimensions::new(64, 48));
        let frame = pattern.snapshot().unwrap();
        assert_eq!(frame.dimensions(), (64, 48));
    }

    #[test]
    fn successive_frames_differ() {
        let pattern = TestPattern::new(FrameDimensions::new(32, 8));
        pattern.play();
        let first = pattern.snapshot().unwrap();
        let second = pattern.snapshot().unwrap();
        assert_ne!(first.as_raw(), second.as_raw());
    }

    #[tokio::test]
    async fn audio_only_request_is_refused() {
        let camera = SyntheticCamera::new(FrameDimensions::new(8, 8));
        let constraints = CaptureConstraints {
            video: false,
            audio: true,
        };
        assert!(camera.open(constraints).await.is_err());
    }
}
