//! Capture-and-upload / fetch-and-display loops for the frame relay.
//!
//! The loop logic is platform agnostic: it talks to the camera, the
//! network and the screen through the traits in [`camera`], [`surface`],
//! [`transport`] and [`status`]. The browser bindings live in the
//! `frame-relay-web` crate; the native implementations (reqwest, the
//! `image` crate, a synthetic camera) live here behind
//! `cfg(not(target_arch = "wasm32"))`.

pub mod camera;
pub mod download;
pub mod latch;
pub mod session;
pub mod status;
pub mod surface;
pub mod transport;
pub mod upload;

#[cfg(not(target_arch = "wasm32"))]
pub mod display;
#[cfg(not(target_arch = "wasm32"))]
pub mod http;
#[cfg(not(target_arch = "wasm32"))]
pub mod raster;
#[cfg(not(target_arch = "wasm32"))]
pub mod scheduler;
#[cfg(not(target_arch = "wasm32"))]
pub mod synthetic;

#[cfg(test)]
mod testing;

pub use camera::{CameraError, CameraProbe, CaptureBackend, CaptureConstraints, VideoSink};
pub use download::{DownloadLoop, DownloadOutcome};
pub use latch::{BusyGuard, BusyLatch};
pub use session::start_session;
pub use status::{StatusLine, StatusSink};
pub use surface::{CaptureError, DisplayError, DisplaySurface, FrameSource};
pub use transport::{Fetched, FrameTransport, TransportError};
pub use upload::{UploadLoop, UploadOutcome};
