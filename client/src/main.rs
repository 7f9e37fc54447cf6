use frame_relay_client::display::FileDisplay;
use frame_relay_client::http::HttpTransport;
use frame_relay_client::raster::JpegRasterCapture;
use frame_relay_client::scheduler::spawn_every;
use frame_relay_client::synthetic::{PatternPlayer, SyntheticCamera};
use frame_relay_client::{start_session, CameraProbe, DownloadLoop, StatusLine, UploadLoop};
use frame_relay_common::config::Config;
use frame_relay_common::frame::FrameDimensions;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::LocalSet;
use tracing::{error, info};

/// Headless client: runs both polling loops against a relay using a
/// synthetic camera, writing what it downloads to `output_dir`.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", config_path.display());
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.parse().unwrap_or_default()),
        )
        .init();

    let client = config.client;
    info!(
        server = client.server_url,
        upload_ms = client.upload_interval_ms,
        download_ms = client.download_interval_ms,
        max_width = client.max_upload_width,
        output_dir = client.output_dir,
        "starting frame-relay headless client"
    );

    let status = Arc::new(StatusLine::new());
    let probe = CameraProbe::new().with_backend(SyntheticCamera::new(FrameDimensions::new(
        client.source_width,
        client.source_height,
    )));
    let Ok(pattern) = start_session(&probe, true, &status, &PatternPlayer).await else {
        std::process::exit(1);
    };

    let transport = match HttpTransport::new(&client.server_url) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "failed to create HTTP client");
            std::process::exit(1);
        }
    };
    let display = match FileDisplay::create(&client.output_dir) {
        Ok(d) => d,
        Err(e) => {
            error!(error = %e, dir = client.output_dir, "failed to create output directory");
            std::process::exit(1);
        }
    };

    let upload = Rc::new(
        UploadLoop::new(
            JpegRasterCapture::new(pattern),
            transport.clone(),
            Arc::clone(&status),
        )
        .with_max_width(client.max_upload_width)
        .with_quality(client.jpeg_quality),
    );
    let download = Rc::new(DownloadLoop::new(transport, display, Arc::clone(&status)));

    LocalSet::new()
        .run_until(async move {
            spawn_every(
                Duration::from_millis(client.upload_interval_ms),
                move || {
                    let upload = Rc::clone(&upload);
                    async move {
                        upload.tick().await;
                    }
                },
            );
            spawn_every(
                Duration::from_millis(client.download_interval_ms),
                move || {
                    let download = Rc::clone(&download);
                    async move {
                        download.tick().await;
                    }
                },
            );

            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for shutdown signal");
            }
        })
        .await;

    info!(status = status.current(), "client stopped");
}
