use tracing::{error, info};

use crate::camera::{CameraError, CameraProbe, VideoSink};
use crate::status::{camera_error_status, StatusSink, STREAMING_STATUS};

/// Open the camera, bind it to `video` and start playback.
///
/// On success the status reads "Streaming through server" and the caller
/// may arm the polling loops. On failure the status shows the camera error
/// and the loops must stay unarmed; there is no retry.
pub async fn start_session<St, V>(
    probe: &CameraProbe<St>,
    secure_context: bool,
    status: &dyn StatusSink,
    video: &V,
) -> Result<St, CameraError>
where
    V: VideoSink<St> + ?Sized,
{
    let result = open_and_play(probe, secure_context, video).await;
    match &result {
        Ok(_) => {
            info!("camera streaming, arming polling loops");
            status.set_status(STREAMING_STATUS);
        }
        Err(e) => {
            error!(error = %e, "camera start-up failed");
            status.set_status(&camera_error_status(e));
        }
    }
    result
}

async fn open_and_play<St, V>(
    probe: &CameraProbe<St>,
    secure_context: bool,
    video: &V,
) -> Result<St, CameraError>
where
    V: VideoSink<St> + ?Sized,
{
    let stream = probe.acquire(secure_context).await?;
    video.attach_and_play(&stream).await?;
    Ok(stream)
}
