//! In-memory fakes for the loop traits.

use async_trait::async_trait;
use bytes::Bytes;
use frame_relay_common::frame::FrameDimensions;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, VecDeque};
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::Notify;

use crate::surface::{CaptureError, DisplayError, DisplaySurface, FrameSource};
use crate::transport::{Fetched, FrameTransport, TransportError};

pub const FAKE_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

pub struct FakeSource {
    pub dims: Cell<FrameDimensions>,
    pub output: RefCell<Result<Option<Bytes>, String>>,
    pub captured: RefCell<Vec<(FrameDimensions, f64)>>,
}

impl FakeSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            dims: Cell::new(FrameDimensions::new(width, height)),
            output: RefCell::new(Ok(Some(Bytes::from_static(FAKE_JPEG)))),
            captured: RefCell::new(Vec::new()),
        }
    }
}

#[async_trait(?Send)]
impl FrameSource for FakeSource {
    fn dimensions(&self) -> FrameDimensions {
        self.dims.get()
    }

    async fn capture_jpeg(
        &self,
        size: FrameDimensions,
        quality: f64,
    ) -> Result<Option<Bytes>, CaptureError> {
        self.captured.borrow_mut().push((size, quality));
        self.output.borrow().clone().map_err(CaptureError::Encode)
    }
}

/// Scripted relay. Every request can be held on a gate or a timer so tests
/// can keep an iteration in flight.
pub struct FakeTransport {
    pub upload_status: Cell<u16>,
    pub fail_uploads: Cell<bool>,
    pub uploads: RefCell<Vec<Bytes>>,
    pub downloads: RefCell<VecDeque<Result<Fetched, TransportError>>>,
    pub download_calls: Cell<usize>,
    pub max_in_flight: Cell<usize>,
    gate: Option<Rc<Notify>>,
    delay: Option<Duration>,
    in_flight: Cell<usize>,
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self {
            upload_status: Cell::new(200),
            fail_uploads: Cell::new(false),
            uploads: RefCell::new(Vec::new()),
            downloads: RefCell::new(VecDeque::new()),
            download_calls: Cell::new(0),
            max_in_flight: Cell::new(0),
            gate: None,
            delay: None,
            in_flight: Cell::new(0),
        }
    }
}

impl FakeTransport {
    pub fn gated(gate: Rc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn delayed(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn push_download(&self, result: Result<Fetched, TransportError>) {
        self.downloads.borrow_mut().push_back(result);
    }

    async fn in_flight<T>(&self, result: impl FnOnce() -> T) -> T {
        let now = self.in_flight.get() + 1;
        self.in_flight.set(now);
        self.max_in_flight.set(self.max_in_flight.get().max(now));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.set(self.in_flight.get() - 1);
        result()
    }
}

#[async_trait(?Send)]
impl FrameTransport for FakeTransport {
    async fn upload(&self, jpeg: Bytes) -> Result<u16, TransportError> {
        self.in_flight(|| {
            if self.fail_uploads.get() {
                return Err(TransportError::Request("connection refused".into()));
            }
            self.uploads.borrow_mut().push(jpeg);
            Ok(self.upload_status.get())
        })
        .await
    }

    async fn download(&self) -> Result<Fetched, TransportError> {
        self.in_flight(|| {
            self.download_calls.set(self.download_calls.get() + 1);
            self.downloads
                .borrow_mut()
                .pop_front()
                .unwrap_or(Ok(Fetched::NoFrame(204)))
        })
        .await
    }
}

/// Display whose handles are plain ids, tracked until released.
#[derive(Default)]
pub struct FakeDisplay {
    next_id: Cell<u32>,
    pub live: RefCell<BTreeSet<u32>>,
    pub released: RefCell<Vec<u32>>,
    pub assigned: Cell<Option<u32>>,
    pub fail_wrap: Cell<bool>,
    pub fail_assign: Cell<bool>,
}

impl DisplaySurface for FakeDisplay {
    type Handle = u32;

    fn wrap(&self, _image: Bytes) -> Result<u32, DisplayError> {
        if self.fail_wrap.get() {
            return Err(DisplayError::Wrap("malformed image".into()));
        }
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.live.borrow_mut().insert(id);
        Ok(id)
    }

    fn assign(&self, handle: &u32) -> Result<(), DisplayError> {
        if self.fail_assign.get() {
            return Err(DisplayError::Assign("element detached".into()));
        }
        self.assigned.set(Some(*handle));
        Ok(())
    }

    fn release(&self, handle: u32) {
        self.live.borrow_mut().remove(&handle);
        self.released.borrow_mut().push(handle);
    }
}
