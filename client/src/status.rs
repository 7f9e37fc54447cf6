use std::rc::Rc;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

pub const STREAMING_STATUS: &str = "Streaming through server";
pub const UPLOAD_ERROR_STATUS: &str = "Upload error";
pub const DOWNLOAD_ERROR_STATUS: &str = "Download error";

/// The one line of text the user sees about the session state.
pub trait StatusSink {
    fn set_status(&self, text: &str);
}

impl<T: StatusSink + ?Sized> StatusSink for &T {
    fn set_status(&self, text: &str) {
        (**self).set_status(text)
    }
}

impl<T: StatusSink + ?Sized> StatusSink for Rc<T> {
    fn set_status(&self, text: &str) {
        (**self).set_status(text)
    }
}

impl<T: StatusSink + ?Sized> StatusSink for Arc<T> {
    fn set_status(&self, text: &str) {
        (**self).set_status(text)
    }
}

pub fn camera_error_status(error: &impl std::fmt::Display) -> String {
    format!("Camera error: {error}")
}

/// In-memory status line that logs every change.
#[derive(Debug, Default)]
pub struct StatusLine {
    text: Mutex<String>,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> String {
        self.text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl StatusSink for StatusLine {
    fn set_status(&self, text: &str) {
        let mut current = self.text.lock().unwrap_or_else(PoisonError::into_inner);
        if *current != text {
            info!(status = text, "status changed");
            *current = text.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_keeps_latest_text() {
        let status = StatusLine::new();
        assert_eq!(status.current(), "");
        status.set_status(UPLOAD_ERROR_STATUS);
        status.set_status(DOWNLOAD_ERROR_STATUS);
        assert_eq!(status.current(), DOWNLOAD_ERROR_STATUS);
    }

    #[test]
    fn shared_handles_write_through() {
        let status = Arc::new(StatusLine::new());
        let shared = Arc::clone(&status);
        shared.set_status(STREAMING_STATUS);
        assert_eq!(status.current(), STREAMING_STATUS);
    }

    #[test]
    fn camera_error_prefix() {
        assert_eq!(camera_error_status(&"no device"), "Camera error: no device");
    }
}
