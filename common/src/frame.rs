/// Path the client uploads to and polls from.
pub const FRAME_ENDPOINT: &str = "/api/frame";
pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// Uploaded frames are downscaled so their width never exceeds this.
pub const MAX_UPLOAD_WIDTH: u32 = 640;
pub const DEFAULT_JPEG_QUALITY: f64 = 0.6;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Largest frame the relay accepts (2 MiB).
pub const MAX_FRAME_SIZE: usize = 2 * 1024 * 1024;

/// Pixel size of a video frame or raster buffer.
///
/// A surface that has not reported its size yet is `0x0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameDimensions {
    pub width: u32,
    pub height: u32,
}

impl FrameDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True until both sides are nonzero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Downscale so the width fits in `max_width`, preserving aspect ratio.
    ///
    /// Never upscales; each side is rounded and kept at least 1px. Empty
    /// dimensions are returned unchanged.
    pub fn scaled_to_max_width(self, max_width: u32) -> Self {
        if self.is_empty() || self.width <= max_width {
            return self;
        }
        let scale = (max_width as f64 / self.width as f64).min(1.0);
        Self {
            width: scale_side(self.width, scale),
            height: scale_side(self.height, scale),
        }
    }
}

impl std::fmt::Display for FrameDimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

fn scale_side(side: u32, scale: f64) -> u32 {
    ((side as f64 * scale).round() as u32).max(1)
}

/// Map a `0.0..=1.0` encoder quality to the percent scale used by JPEG encoders.
pub fn jpeg_quality_percent(quality: f64) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Check an uploaded frame body against the relay's size limits.
pub fn validate_frame_len(len: usize, max: usize) -> Result<(), FrameError> {
    if len == 0 {
        return Err(FrameError::Empty);
    }
    if len > max {
        return Err(FrameError::TooLarge { got: len, max });
    }
    Ok(())
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame body is empty")]
    Empty,
    #[error("frame too large: got {got} bytes, limit is {max}")]
    TooLarge { got: usize, max: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_frames_scale_to_max_width() {
        let cases = [(1280, 720, 360), (1920, 1080, 360), (641, 480, 479), (4000, 3, 0)];
        for (w, h, _) in cases {
            let scaled = FrameDimensions::new(w, h).scaled_to_max_width(MAX_UPLOAD_WIDTH);
            let expected_h = ((h as f64 * 640.0 / w as f64).round() as u32).max(1);
            assert_eq!(scaled.width, 640, "{w}x{h}");
            assert_eq!(scaled.height, expected_h, "{w}x{h}");
        }
    }

    #[test]
    fn hd_frame_scales_to_640x360() {
        let scaled = FrameDimensions::new(1280, 720).scaled_to_max_width(640);
        assert_eq!(scaled, FrameDimensions::new(640, 360));
    }

    #[test]
    fn narrow_frames_are_never_upscaled() {
        for (w, h) in [(640, 480), (320, 240), (1, 1), (639, 1000)] {
            let dims = FrameDimensions::new(w, h);
            assert_eq!(dims.scaled_to_max_width(MAX_UPLOAD_WIDTH), dims);
        }
    }

    #[test]
    fn very_flat_frame_keeps_one_pixel_height() {
        let scaled = FrameDimensions::new(6400, 1).scaled_to_max_width(640);
        assert_eq!(scaled, FrameDimensions::new(640, 1));
    }

    #[test]
    fn empty_dimensions() {
        assert!(FrameDimensions::default().is_empty());
        assert!(FrameDimensions::new(640, 0).is_empty());
        assert!(!FrameDimensions::new(1, 1).is_empty());
        assert_eq!(
            FrameDimensions::default().scaled_to_max_width(640),
            FrameDimensions::default()
        );
    }

    #[test]
    fn quality_percent() {
        assert_eq!(jpeg_quality_percent(0.6), 60);
        assert_eq!(jpeg_quality_percent(0.0), 1);
        assert_eq!(jpeg_quality_percent(1.5), 100);
    }

    #[test]
    fn frame_len_limits() {
        assert_eq!(validate_frame_len(0, 10), Err(FrameError::Empty));
        assert_eq!(
            validate_frame_len(11, 10),
            Err(FrameError::TooLarge { got: 11, max: 10 })
        );
        assert!(validate_frame_len(10, 10).is_ok());
    }
}
