use async_trait::async_trait;
use frame_relay_client::{CameraError, CameraProbe, CaptureBackend, CaptureConstraints, VideoSink};
use js_sys::{Function, Object, Promise, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlVideoElement, MediaStream, MediaStreamConstraints, Navigator};

use crate::js_error_message;

/// Vendor-prefixed `navigator` entry points, tried after `mediaDevices`.
pub const LEGACY_METHODS: [&str; 4] = [
    "getUserMedia",
    "webkitGetUserMedia",
    "mozGetUserMedia",
    "msGetUserMedia",
];

/// Modern capture API first, then each legacy variant.
pub fn browser_probe() -> CameraProbe<MediaStream> {
    LEGACY_METHODS.iter().fold(
        CameraProbe::new().with_backend(MediaDevicesBackend),
        |probe, method| probe.with_backend(LegacyGetUserMedia::new(*method)),
    )
}

fn navigator() -> Navigator {
    gloo_utils::window().navigator()
}

fn is_function(target: &JsValue, name: &str) -> bool {
    Reflect::get(target, &JsValue::from_str(name))
        .map(|v| v.is_function())
        .unwrap_or(false)
}

fn into_stream(value: JsValue) -> Result<MediaStream, CameraError> {
    value
        .dyn_into::<MediaStream>()
        .map_err(|v| CameraError::AccessDenied(format!("not a MediaStream: {}", js_error_message(&v))))
}

/// `navigator.mediaDevices.getUserMedia`.
pub struct MediaDevicesBackend;

#[async_trait(?Send)]
impl CaptureBackend for MediaDevicesBackend {
    type Stream = MediaStream;

    fn name(&self) -> &str {
        "navigator.mediaDevices.getUserMedia"
    }

    fn is_available(&self) -> bool {
        // `mediaDevices` is undefined outside secure contexts.
        match Reflect::get(&navigator(), &JsValue::from_str("mediaDevices")) {
            Ok(devices) if !devices.is_undefined() && !devices.is_null() => {
                is_function(&devices, "getUserMedia")
            }
            _ => false,
        }
    }

    async fn open(&self, constraints: CaptureConstraints) -> Result<MediaStream, CameraError> {
        let access_denied = |e: JsValue| CameraError::AccessDenied(js_error_message(&e));

        let media_devices = navigator().media_devices().map_err(access_denied)?;
        let request = MediaStreamConstraints::new();
        request.set_video(&JsValue::from_bool(constraints.video));
        request.set_audio(&JsValue::from_bool(constraints.audio));

        let promise = media_devices
            .get_user_media_with_constraints(&request)
            .map_err(access_denied)?;
        let stream = JsFuture::from(promise).await.map_err(access_denied)?;
        into_stream(stream)
    }
}

/// A callback-style `navigator.<method>(constraints, onSuccess, onError)`.
pub struct LegacyGetUserMedia {
    method: &'static str,
}

impl LegacyGetUserMedia {
    pub fn new(method: &'static str) -> Self {
        Self { method }
    }
}

#[async_trait(?Send)]
impl CaptureBackend for LegacyGetUserMedia {
    type Stream = MediaStream;

    fn name(&self) -> &str {
        self.method
    }

    fn is_available(&self) -> bool {
        is_function(&navigator(), self.method)
    }

    async fn open(&self, constraints: CaptureConstraints) -> Result<MediaStream, CameraError> {
        let access_denied = |e: JsValue| CameraError::AccessDenied(js_error_message(&e));

        let navigator = navigator();
        let method: Function = Reflect::get(&navigator, &JsValue::from_str(self.method))
            .map_err(access_denied)?
            .dyn_into()
            .map_err(|_| CameraError::AccessDenied(format!("navigator.{} is not callable", self.method)))?;

        let request = Object::new();
        Reflect::set(&request, &"video".into(), &JsValue::from_bool(constraints.video))
            .map_err(access_denied)?;
        Reflect::set(&request, &"audio".into(), &JsValue::from_bool(constraints.audio))
            .map_err(access_denied)?;

        let promise = Promise::new(&mut |resolve, reject| {
            if let Err(e) = method.call3(&navigator, &request, &resolve, &reject) {
                let _ = reject.call1(&JsValue::NULL, &e);
            }
        });
        let stream = JsFuture::from(promise).await.map_err(access_denied)?;
        into_stream(stream)
    }
}

/// The page's `<video>` element: gets the stream as `srcObject` and plays it.
pub struct VideoElementSink {
    video: HtmlVideoElement,
}

impl VideoElementSink {
    pub fn new(video: HtmlVideoElement) -> Self {
        Self { video }
    }
}

#[async_trait(?Send)]
impl VideoSink<MediaStream> for VideoElementSink {
    async fn attach_and_play(&self, stream: &MediaStream) -> Result<(), CameraError> {
        let playback = |e: JsValue| CameraError::Playback(js_error_message(&e));

        self.video.set_src_object(Some(stream));
        let played = self.video.play().map_err(playback)?;
        JsFuture::from(played).await.map_err(playback)?;
        Ok(())
    }
}
