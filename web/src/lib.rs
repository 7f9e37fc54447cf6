//! Browser front end of the frame relay.
//!
//! Wires the client loops to the page: the `<video id="localVideo">`
//! camera preview, the `<img id="remoteImage">` remote view and the
//! `#status` line. Everything runs on the page's event loop.

pub mod camera;
pub mod surface;
pub mod timer;
pub mod transport;

use std::rc::Rc;

use frame_relay_client::{start_session, DownloadLoop, UploadLoop};
use frame_relay_common::frame::{
    DEFAULT_JPEG_QUALITY, DEFAULT_POLL_INTERVAL_MS, FRAME_ENDPOINT, MAX_UPLOAD_WIDTH,
};
use tracing::{error, info};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, DomException, HtmlImageElement, HtmlVideoElement};

use camera::{browser_probe, VideoElementSink};
use surface::{ElementStatus, ObjectUrlDisplay, VideoCanvasSource};
use transport::FetchTransport;

pub const STATUS_ID: &str = "status";
pub const LOCAL_VIDEO_ID: &str = "localVideo";
pub const REMOTE_IMAGE_ID: &str = "remoteImage";

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // Only fails when a logger is already installed.
    let _ = console_log::init_with_level(log::Level::Info);

    spawn_local(async {
        if let Err(e) = run().await {
            error!(error = %js_error_message(&e), "frame relay page failed to start");
        }
    });
}

async fn run() -> Result<(), JsValue> {
    let document = gloo_utils::document();
    let status = Rc::new(ElementStatus::new(element_by_id(&document, STATUS_ID)?));
    let video: HtmlVideoElement = element_by_id(&document, LOCAL_VIDEO_ID)?;
    let image: HtmlImageElement = element_by_id(&document, REMOTE_IMAGE_ID)?;

    let secure_context = gloo_utils::window().is_secure_context();
    let probe = browser_probe();
    let sink = VideoElementSink::new(video.clone());
    if start_session(&probe, secure_context, &*status, &sink).await.is_err() {
        // The status line already shows the camera error; the loops stay off.
        return Ok(());
    }

    let upload = Rc::new(
        UploadLoop::new(
            VideoCanvasSource::new(video)?,
            FetchTransport::new(FRAME_ENDPOINT),
            Rc::clone(&status),
        )
        .with_max_width(MAX_UPLOAD_WIDTH)
        .with_quality(DEFAULT_JPEG_QUALITY),
    );
    let download = Rc::new(DownloadLoop::new(
        FetchTransport::new(FRAME_ENDPOINT),
        ObjectUrlDisplay::new(image),
        Rc::clone(&status),
    ));

    let period_ms = DEFAULT_POLL_INTERVAL_MS as u32;
    timer::every(period_ms, move || {
        let upload = Rc::clone(&upload);
        async move {
            upload.tick().await;
        }
    });
    timer::every(period_ms, move || {
        let download = Rc::clone(&download);
        async move {
            download.tick().await;
        }
    });
    info!(period_ms, "upload and download loops armed");
    Ok(())
}

fn element_by_id<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("missing element #{id}")))?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("element #{id} has an unexpected type")))
}

/// The `message` of a thrown JS error, or its string form.
pub fn js_error_message(value: &JsValue) -> String {
    if let Some(e) = value.dyn_ref::<DomException>() {
        return e.message();
    }
    if let Some(e) = value.dyn_ref::<js_sys::Error>() {
        return String::from(e.message());
    }
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}
