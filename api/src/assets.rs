use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{debug, info};

/// A file the browser client needs, and the URL path it is served under.
#[derive(Debug, Clone, Copy)]
pub struct ClientAsset {
    pub url_path: &'static str,
    pub file_name: &'static str,
    pub content_type: &'static str,
}

/// Everything the page loads. `app.js` and `app_bg.wasm` come out of the
/// wasm-pack build of the `web` crate.
pub const CLIENT_ASSETS: &[ClientAsset] = &[
    ClientAsset {
        url_path: "/",
        file_name: "index.html",
        content_type: "text/html; charset=utf-8",
    },
    ClientAsset {
        url_path: "/styles.css",
        file_name: "styles.css",
        content_type: "text/css; charset=utf-8",
    },
    ClientAsset {
        url_path: "/app.js",
        file_name: "app.js",
        content_type: "application/javascript; charset=utf-8",
    },
    ClientAsset {
        url_path: "/app_bg.wasm",
        file_name: "app_bg.wasm",
        content_type: "application/wasm",
    },
];

#[derive(Debug, Clone)]
pub struct StaticAsset {
    pub content_type: &'static str,
    pub body: Bytes,
}

/// Static files held in memory, keyed by URL path.
#[derive(Debug, Clone, Default)]
pub struct AssetTable {
    assets: HashMap<String, StaticAsset>,
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read static asset {0}: {1}")]
    Read(PathBuf, std::io::Error),
}

impl AssetTable {
    /// Read every entry of [`CLIENT_ASSETS`] from `web_root`. Any missing
    /// file is an error so the server refuses to start half-populated.
    pub fn load(web_root: &Path) -> Result<Self, AssetError> {
        let mut table = Self::default();
        let mut total_bytes = 0usize;
        for asset in CLIENT_ASSETS {
            let path = web_root.join(asset.file_name);
            let body = std::fs::read(&path).map_err(|e| AssetError::Read(path.clone(), e))?;
            debug!(path = %path.display(), bytes = body.len(), "loaded static asset");
            total_bytes += body.len();
            table.insert(asset.url_path, asset.content_type, body);
        }
        info!(
            web_root = %web_root.display(),
            count = table.len(),
            total_bytes,
            "static assets loaded"
        );
        Ok(table)
    }

    pub fn insert(
        &mut self,
        url_path: impl Into<String>,
        content_type: &'static str,
        body: impl Into<Bytes>,
    ) {
        self.assets.insert(
            url_path.into(),
            StaticAsset {
                content_type,
                body: body.into(),
            },
        );
    }

    pub fn get(&self, url_path: &str) -> Option<&StaticAsset> {
        self.assets.get(url_path)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn loads_every_client_asset() {
        let dir = TempDir::new().unwrap();
        for asset in CLIENT_ASSETS {
            std::fs::write(dir.path().join(asset.file_name), asset.file_name).unwrap();
        }

        let table = AssetTable::load(dir.path()).unwrap();
        assert_eq!(table.len(), CLIENT_ASSETS.len());

        let index = table.get("/").unwrap();
        assert_eq!(index.content_type, "text/html; charset=utf-8");
        assert_eq!(&index.body[..], b"index.html");
        assert_eq!(table.get("/app_bg.wasm").unwrap().content_type, "application/wasm");
        assert!(table.get("/index.html").is_none());
    }

    #[test]
    fn missing_file_fails_the_load() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.html"), "<!doctype html>").unwrap();

        let err = AssetTable::load(dir.path()).unwrap_err();
        let AssetError::Read(path, _) = &err;
        assert!(path.ends_with("styles.css"));
        assert!(err.to_string().contains("styles.css"));
    }
}
