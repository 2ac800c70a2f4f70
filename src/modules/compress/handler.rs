use crate::common::response::ApiError;
use crate::modules::compress::error::CompressError;
use crate::modules::compress::job::{JobDescriptor, MediaKind, Upload};
use crate::modules::compress::service::CompressService;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
};
use tracing::error;

/// Pulls the `file` field out of the multipart body. An absent field yields
/// `Ok(None)` (a 400 "no file" at job construction); a field that cannot be
/// read -- truncated body, malformed framing -- is a distinct 400 so the
/// message matches what happened. Either way no filesystem or subprocess
/// work happens.
async fn read_file_field(multipart: &mut Multipart) -> Result<Option<Upload>, CompressError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| CompressError::MalformedUpload)?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|_| CompressError::MalformedUpload)?;
        return Ok(Some(Upload { file_name, data }));
    }
    Ok(None)
}

fn fail(err: CompressError) -> Response {
    let status = err.status();
    if status.is_server_error() {
        // Full diagnostic stays in the logs; the client gets a generic message.
        error!("Compression failed: {:?}", err);
    }
    ApiError(err.public_message(), status).into_response()
}

fn attachment(file_name: &str) -> String {
    format!("attachment; filename=\"{}\"", file_name)
}

/// Re-encode an uploaded image as a width-capped JPEG.
#[utoipa::path(
    post,
    path = "/compress/image",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Re-encoded JPEG bytes", body = Vec<u8>),
        (status = 400, description = "No file uploaded"),
        (status = 500, description = "Processing error")
    ),
    tag = "Compress"
)]
pub async fn compress_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let upload = match read_file_field(&mut multipart).await {
        Ok(upload) => upload,
        Err(e) => return fail(e),
    };
    let job = match JobDescriptor::build(MediaKind::Image, upload, &state.plans) {
        Ok(job) => job,
        Err(e) => return fail(e),
    };
    let file_name = job.output_file_name("jpg");

    match CompressService::compress_image(job).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, "image/jpeg".to_string()),
                (header::CONTENT_DISPOSITION, attachment(&file_name)),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => fail(e),
    }
}

/// Transcode an uploaded video to the plan's codec/container.
#[utoipa::path(
    post,
    path = "/compress/video",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Streamed transcoded video"),
        (status = 400, description = "No file uploaded"),
        (status = 500, description = "Encoder error")
    ),
    tag = "Compress"
)]
pub async fn compress_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    compress_media(state, MediaKind::Video, &mut multipart).await
}

/// Transcode an uploaded audio file to the plan's codec/container.
#[utoipa::path(
    post,
    path = "/compress/audio",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Streamed transcoded audio"),
        (status = 400, description = "No file uploaded"),
        (status = 501, description = "No audio encoder available"),
        (status = 500, description = "Encoder error")
    ),
    tag = "Compress"
)]
pub async fn compress_audio(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    compress_media(state, MediaKind::Audio, &mut multipart).await
}

async fn compress_media(state: AppState, kind: MediaKind, multipart: &mut Multipart) -> Response {
    let upload = match read_file_field(multipart).await {
        Ok(upload) => upload,
        Err(e) => return fail(e),
    };
    let job = match JobDescriptor::build(kind, upload, &state.plans) {
        Ok(job) => job,
        Err(e) => return fail(e),
    };

    match CompressService::compress_media(&state, job).await {
        Ok(media) => (
            [
                (header::CONTENT_TYPE, media.content_type.to_string()),
                (header::CONTENT_DISPOSITION, attachment(&media.file_name)),
            ],
            Body::from_stream(media.stream),
        )
            .into_response(),
        Err(e) => fail(e),
    }
}
