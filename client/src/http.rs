use async_trait::async_trait;
use bytes::Bytes;
use frame_relay_common::frame::{FRAME_ENDPOINT, JPEG_CONTENT_TYPE};
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use reqwest::StatusCode;
use std::time::Duration;

use crate::transport::{Fetched, FrameTransport, TransportError};

/// reqwest-backed access to a relay's `/api/frame`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    frame_url: String,
}

impl HttpTransport {
    /// `server_url` is the relay origin, e.g. `http://127.0.0.1:8080`.
    pub fn new(server_url: &str) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(Self {
            client,
            frame_url: format!("{}{FRAME_ENDPOINT}", server_url.trim_end_matches('/')),
        })
    }

    pub fn frame_url(&self) -> &str {
        &self.frame_url
    }
}

#[async_trait(?Send)]
impl FrameTransport for HttpTransport {
    async fn upload(&self, jpeg: Bytes) -> Result<u16, TransportError> {
        let response = self
            .client
            .post(&self.frame_url)
            .header(CONTENT_TYPE, JPEG_CONTENT_TYPE)
            .header(CACHE_CONTROL, "no-store")
            .body(jpeg)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(response.status().as_u16())
    }

    async fn download(&self) -> Result<Fetched, TransportError> {
        let response = self
            .client
            .get(&self.frame_url)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Ok(Fetched::NoFrame(response.status().as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;
        Ok(Fetched::Frame(body))
    }
}
