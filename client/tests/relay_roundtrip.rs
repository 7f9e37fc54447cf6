use std::net::SocketAddr;
use std::sync::Arc;

use frame_relay_api::{build_app, serve, AppState, AssetTable};
use frame_relay_client::display::FileDisplay;
use frame_relay_client::http::HttpTransport;
use frame_relay_client::raster::JpegRasterCapture;
use frame_relay_client::synthetic::TestPattern;
use frame_relay_client::{
    DownloadLoop, DownloadOutcome, Fetched, FrameTransport, StatusLine, UploadLoop, UploadOutcome,
};
use frame_relay_common::frame::FrameDimensions;
use image::GenericImageView;
use tempfile::TempDir;

const MIB: usize = 1024 * 1024;

async fn spawn_relay(max_frame_bytes: usize) -> SocketAddr {
    let state = Arc::new(AppState::new(AssetTable::default(), max_frame_bytes));
    let app = build_app(state, 3 * MIB);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, app, std::future::pending()));
    addr
}

fn playing_pattern(width: u32, height: u32) -> TestPattern {
    let pattern = TestPattern::new(FrameDimensions::new(width, height));
    pattern.play();
    pattern
}

#[tokio::test]
async fn uploaded_frame_comes_back_downscaled() {
    let addr = spawn_relay(2 * MIB).await;
    let origin = format!("http://{addr}");
    let out_dir = TempDir::new().unwrap();

    let download = DownloadLoop::new(
        HttpTransport::new(&origin).unwrap(),
        FileDisplay::create(out_dir.path()).unwrap(),
        StatusLine::new(),
    );
    assert_eq!(download.tick().await, DownloadOutcome::NoFrame { status: 204 });
    assert!(!download.has_frame());

    let upload = UploadLoop::new(
        JpegRasterCapture::new(playing_pattern(1280, 720)),
        HttpTransport::new(&origin).unwrap(),
        StatusLine::new(),
    );
    assert_eq!(upload.tick().await, UploadOutcome::Sent { status: 200 });

    assert_eq!(download.tick().await, DownloadOutcome::Displayed);
    let latest = std::fs::read(download.display().latest_path()).unwrap();
    let decoded = image::load_from_memory(&latest).unwrap();
    assert_eq!(decoded.dimensions(), (640, 360));

    drop(download);
}

#[tokio::test]
async fn oversized_frame_is_sent_but_rejected() {
    let addr = spawn_relay(512).await;
    let transport = HttpTransport::new(&format!("http://{addr}")).unwrap();
    let status = StatusLine::new();

    let upload = UploadLoop::new(
        JpegRasterCapture::new(playing_pattern(320, 240)),
        transport.clone(),
        &status,
    );
    assert_eq!(upload.tick().await, UploadOutcome::Sent { status: 413 });
    assert_eq!(status.current(), "");

    assert_eq!(transport.download().await.unwrap(), Fetched::NoFrame(204));
}

#[tokio::test]
async fn unreachable_relay_reports_errors() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let origin = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let status = StatusLine::new();

    let upload = UploadLoop::new(
        JpegRasterCapture::new(playing_pattern(64, 48)),
        HttpTransport::new(&origin).unwrap(),
        &status,
    );
    assert_eq!(upload.tick().await, UploadOutcome::Failed);
    assert_eq!(status.current(), "Upload error");
    assert!(!upload.is_busy());
}
