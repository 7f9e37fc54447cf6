use async_trait::async_trait;
use bytes::Bytes;
use frame_relay_client::{CaptureError, DisplayError, DisplaySurface, FrameSource, StatusSink};
use frame_relay_common::frame::{FrameDimensions, JPEG_CONTENT_TYPE};
use js_sys::{Array, Promise, Uint8Array};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Blob, BlobPropertyBag, CanvasRenderingContext2d, ContextAttributes2d, Element,
    HtmlCanvasElement, HtmlImageElement, HtmlVideoElement, Url,
};

use crate::js_error_message;

/// Samples the `<video>` element through an offscreen canvas.
pub struct VideoCanvasSource {
    video: HtmlVideoElement,
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl VideoCanvasSource {
    pub fn new(video: HtmlVideoElement) -> Result<Self, JsValue> {
        let canvas: HtmlCanvasElement = gloo_utils::document()
            .create_element("canvas")?
            .dyn_into()?;
        let attrs = ContextAttributes2d::new();
        attrs.set_alpha(false);
        let ctx = canvas
            .get_context_with_context_options("2d", &attrs)?
            .ok_or_else(|| JsValue::from_str("2d canvas context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { video, canvas, ctx })
    }

    /// `canvas.toBlob` as a future; `None` when the browser produced no blob.
    async fn to_jpeg_blob(&self, quality: f64) -> Result<Option<Blob>, JsValue> {
        let promise = Promise::new(&mut |resolve, reject| {
            if let Err(e) = self.canvas.to_blob_with_type_and_encoder_options(
                &resolve,
                JPEG_CONTENT_TYPE,
                &JsValue::from_f64(quality),
            ) {
                let _ = reject.call1(&JsValue::NULL, &e);
            }
        });
        let value = JsFuture::from(promise).await?;
        if value.is_null() || value.is_undefined() {
            return Ok(None);
        }
        value.dyn_into::<Blob>().map(Some)
    }
}

#[async_trait(?Send)]
impl FrameSource for VideoCanvasSource {
    fn dimensions(&self) -> FrameDimensions {
        FrameDimensions::new(self.video.video_width(), self.video.video_height())
    }

    async fn capture_jpeg(
        &self,
        size: FrameDimensions,
        quality: f64,
    ) -> Result<Option<Bytes>, CaptureError> {
        let encode = |e: JsValue| CaptureError::Encode(js_error_message(&e));

        self.canvas.set_width(size.width);
        self.canvas.set_height(size.height);
        self.ctx
            .draw_image_with_html_video_element_and_dw_and_dh(
                &self.video,
                0.0,
                0.0,
                f64::from(size.width),
                f64::from(size.height),
            )
            .map_err(|e| CaptureError::Render(js_error_message(&e)))?;

        let Some(blob) = self.to_jpeg_blob(quality).await.map_err(encode)? else {
            return Ok(None);
        };
        let buffer = JsFuture::from(blob.array_buffer()).await.map_err(encode)?;
        Ok(Some(Bytes::from(Uint8Array::new(&buffer).to_vec())))
    }
}

/// A `blob:` URL owned by the page; must be revoked once it is off screen.
#[derive(Debug, PartialEq, Eq)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The `<img>` the remote frames are shown in.
pub struct ObjectUrlDisplay {
    image: HtmlImageElement,
}

impl ObjectUrlDisplay {
    pub fn new(image: HtmlImageElement) -> Self {
        Self { image }
    }
}

impl DisplaySurface for ObjectUrlDisplay {
    type Handle = ObjectUrl;

    fn wrap(&self, image: Bytes) -> Result<ObjectUrl, DisplayError> {
        let wrap = |e: JsValue| DisplayError::Wrap(js_error_message(&e));

        let parts = Array::of1(&Uint8Array::from(&image[..]));
        let options = BlobPropertyBag::new();
        options.set_type(JPEG_CONTENT_TYPE);
        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options).map_err(wrap)?;
        Url::create_object_url_with_blob(&blob)
            .map(ObjectUrl)
            .map_err(wrap)
    }

    fn assign(&self, handle: &ObjectUrl) -> Result<(), DisplayError> {
        self.image.set_src(handle.as_str());
        Ok(())
    }

    fn release(&self, handle: ObjectUrl) {
        if let Err(e) = Url::revoke_object_url(handle.as_str()) {
            tracing::warn!(error = %js_error_message(&e), "failed to revoke object URL");
        }
    }
}

/// The page's status text element.
pub struct ElementStatus {
    element: Element,
}

impl ElementStatus {
    pub fn new(element: Element) -> Self {
        Self { element }
    }
}

impl StatusSink for ElementStatus {
    fn set_status(&self, text: &str) {
        if self.element.text_content().as_deref() != Some(text) {
            tracing::info!(status = text, "status changed");
            self.element.set_text_content(Some(text));
        }
    }
}
