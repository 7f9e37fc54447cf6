use async_trait::async_trait;
use tracing::{debug, info};

/// What the client asks the capture device for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub video: bool,
    pub audio: bool,
}

impl CaptureConstraints {
    pub const VIDEO_ONLY: Self = Self {
        video: true,
        audio: false,
    };
}

/// One way of opening the local camera.
///
/// Backends are probed in preference order; the first one that reports
/// itself available is the one asked for a stream.
#[async_trait(?Send)]
pub trait CaptureBackend {
    type Stream;

    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Whether this entry point exists in the current environment.
    fn is_available(&self) -> bool;

    async fn open(&self, constraints: CaptureConstraints) -> Result<Self::Stream, CameraError>;
}

/// Binds an opened stream to a playable video surface and starts playback.
#[async_trait(?Send)]
pub trait VideoSink<S> {
    async fn attach_and_play(&self, stream: &S) -> Result<(), CameraError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CameraError {
    #[error("getUserMedia is not available in this browser.{}", secure_context_hint(.secure_context))]
    Unavailable { secure_context: bool },
    #[error("{0}")]
    AccessDenied(String),
    #[error("video playback failed: {0}")]
    Playback(String),
}

fn secure_context_hint(secure_context: &bool) -> &'static str {
    if *secure_context {
        ""
    } else {
        " This page must be opened on https:// or localhost."
    }
}

/// Capture backends in the order they should be tried.
pub struct CameraProbe<S> {
    backends: Vec<Box<dyn CaptureBackend<Stream = S>>>,
}

impl<S> Default for CameraProbe<S> {
    fn default() -> Self {
        Self {
            backends: Vec::new(),
        }
    }
}

impl<S> CameraProbe<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend<B>(mut self, backend: B) -> Self
    where
        B: CaptureBackend<Stream = S> + 'static,
    {
        self.backends.push(Box::new(backend));
        self
    }

    /// Open the camera through the first available backend.
    ///
    /// `secure_context` only affects the error message when nothing is
    /// available.
    pub async fn acquire(&self, secure_context: bool) -> Result<S, CameraError> {
        let Some(backend) = self.backends.iter().find(|b| {
            let available = b.is_available();
            debug!(backend = b.name(), available, "probing capture backend");
            available
        }) else {
            return Err(CameraError::Unavailable { secure_context });
        };

        info!(backend = backend.name(), "requesting camera access");
        backend.open(CaptureConstraints::VIDEO_ONLY).await
    }
}
