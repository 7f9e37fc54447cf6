use bytes::Bytes;
use image::ImageFormat;
use std::cell::Cell;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::surface::{DisplayError, DisplaySurface};

const LATEST_FILE: &str = "latest.jpg";

/// Shows downloaded frames by writing them to disk.
///
/// Every frame gets its own `frame-NNNNNN.jpg`; the one on screen is copied
/// to `latest.jpg`. Releasing a handle deletes its file.
pub struct FileDisplay {
    dir: PathBuf,
    next_seq: Cell<u64>,
}

/// One downloaded frame on disk.
#[derive(Debug, PartialEq, Eq)]
pub struct FrameFile {
    path: PathBuf,
}

impl FrameFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FileDisplay {
    pub fn create(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            next_seq: Cell::new(0),
        })
    }

    pub fn latest_path(&self) -> PathBuf {
        self.dir.join(LATEST_FILE)
    }
}

impl DisplaySurface for FileDisplay {
    type Handle = FrameFile;

    fn wrap(&self, image: Bytes) -> Result<FrameFile, DisplayError> {
        match image::guess_format(&image) {
            Ok(ImageFormat::Jpeg) => {}
            Ok(other) => {
                return Err(DisplayError::Wrap(format!("expected JPEG, got {other:?}")));
            }
            Err(e) => return Err(DisplayError::Wrap(e.to_string())),
        }

        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        let path = self.dir.join(format!("frame-{seq:06}.jpg"));
        std::fs::write(&path, &image).map_err(|e| DisplayError::Wrap(e.to_string()))?;
        Ok(FrameFile { path })
    }

    fn assign(&self, handle: &FrameFile) -> Result<(), DisplayError> {
        // Copy then rename so readers of latest.jpg never see a partial file.
        let staging = self.dir.join(".latest.jpg.tmp");
        std::fs::copy(&handle.path, &staging).map_err(|e| DisplayError::Assign(e.to_string()))?;
        std::fs::rename(&staging, self.latest_path())
            .map_err(|e| DisplayError::Assign(e.to_string()))?;
        debug!(path = %handle.path.display(), "frame assigned");
        Ok(())
    }

    fn release(&self, handle: FrameFile) {
        if let Err(e) = std::fs::remove_file(&handle.path) {
            warn!(error = %e, path = %handle.path.display(), "failed to remove released frame");
        }
    }
}
