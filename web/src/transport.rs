use async_trait::async_trait;
use bytes::Bytes;
use frame_relay_client::{Fetched, FrameTransport, TransportError};
use frame_relay_common::frame::JPEG_CONTENT_TYPE;
use js_sys::Uint8Array;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestCache, RequestInit, Response};

use crate::js_error_message;

/// `fetch` against the relay, bypassing the HTTP cache.
#[derive(Debug, Clone)]
pub struct FetchTransport {
    url: String,
}

impl FetchTransport {
    /// `url` may be relative to the page, e.g. `/api/frame`.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    async fn send(&self, init: &RequestInit) -> Result<Response, TransportError> {
        let request_failed = |e: JsValue| TransportError::Request(js_error_message(&e));

        init.set_cache(RequestCache::NoStore);
        let request = Request::new_with_str_and_init(&self.url, init).map_err(request_failed)?;
        let response = JsFuture::from(gloo_utils::window().fetch_with_request(&request))
            .await
            .map_err(request_failed)?;
        response.dyn_into::<Response>().map_err(request_failed)
    }
}

#[async_trait(?Send)]
impl FrameTransport for FetchTransport {
    async fn upload(&self, jpeg: Bytes) -> Result<u16, TransportError> {
        let request_failed = |e: JsValue| TransportError::Request(js_error_message(&e));

        let headers = Headers::new().map_err(request_failed)?;
        headers
            .set("Content-Type", JPEG_CONTENT_TYPE)
            .map_err(request_failed)?;

        let init = RequestInit::new();
        init.set_method("POST");
        init.set_headers(&headers);
        init.set_body(&Uint8Array::from(&jpeg[..]));

        let response = self.send(&init).await?;
        Ok(response.status())
    }

    async fn download(&self) -> Result<Fetched, TransportError> {
        let body_failed = |e: JsValue| TransportError::Body(js_error_message(&e));

        let init = RequestInit::new();
        init.set_method("GET");
        let response = self.send(&init).await?;
        if response.status() != 200 {
            return Ok(Fetched::NoFrame(response.status()));
        }

        let buffer = JsFuture::from(response.array_buffer().map_err(body_failed)?)
            .await
            .map_err(body_failed)?;
        Ok(Fetched::Frame(Bytes::from(Uint8Array::new(&buffer).to_vec())))
    }
}
