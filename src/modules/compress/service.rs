use super::error::CompressError;
use super::job::{JobDescriptor, MediaKind};
use crate::common::artifacts::{ArtifactHandle, ArtifactStream};
use crate::infrastructure::ffmpeg::executor;
use crate::state::AppState;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use std::io::Cursor;
use tracing::info;

// Image quality policy, fixed like the video/audio constants in plan.rs.
pub const IMAGE_MAX_WIDTH: u32 = 1920;
pub const IMAGE_JPEG_QUALITY: u8 = 70;

/// A finished video/audio transcode ready to stream: body plus the response
/// metadata the handler needs. The stream owns the output artifact, so the
/// temp file disappears as soon as the body is done (or abandoned).
pub struct CompressedMedia {
    pub stream: ArtifactStream,
    pub content_type: &'static str,
    pub file_name: String,
}

pub struct CompressService;

impl CompressService {
    /// Image path: fully in-memory, no temp files, no subprocess. Decoding
    /// and JPEG encoding are CPU-bound, so they run on the blocking pool.
    pub async fn compress_image(job: JobDescriptor) -> Result<Bytes, CompressError> {
        let id = job.id;
        let input_len = job.data.len();

        let encoded = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, CompressError> {
            let img = image::load_from_memory(&job.data).map_err(CompressError::InvalidImage)?;

            let img = if img.width() > IMAGE_MAX_WIDTH {
                img.resize(IMAGE_MAX_WIDTH, u32::MAX, FilterType::Triangle)
            } else {
                img
            };
            // JPEG has no alpha channel; flatten before encoding.
            let img = DynamicImage::ImageRgb8(img.to_rgb8());

            let mut out = Cursor::new(Vec::new());
            let encoder = JpegEncoder::new_with_quality(&mut out, IMAGE_JPEG_QUALITY);
            img.write_with_encoder(encoder)
                .map_err(CompressError::InvalidImage)?;
            Ok(out.into_inner())
        })
        .await
        .map_err(|e| CompressError::Io(std::io::Error::other(e)))??;

        info!(
            "Image job {} re-encoded: {} -> {} bytes",
            id,
            input_len,
            encoded.len()
        );
        Ok(Bytes::from(encoded))
    }

    /// Video/audio path: write input artifact, run ffmpeg, hand back a
    /// stream over the output artifact. Both artifacts are Drop-guarded, so
    /// every early return below releases whatever was allocated so far.
    pub async fn compress_media(
        state: &AppState,
        job: JobDescriptor,
    ) -> Result<CompressedMedia, CompressError> {
        let mut input = ArtifactHandle::allocate(job.id, "input", &job.input_extension);

        let (content_type, extension, output, args) = match job.kind {
            MediaKind::Video => {
                let plan = state.plans.video;
                let output = ArtifactHandle::allocate(job.id, "output", plan.extension);
                let args = executor::video_args(&plan, input.path(), output.path());
                (plan.content_type, plan.extension, output, args)
            }
            MediaKind::Audio => {
                // Validated at job construction; audio jobs always carry a plan.
                let plan = state.plans.audio.ok_or(CompressError::NoEncoderAvailable)?;
                let output = ArtifactHandle::allocate(job.id, "output", plan.extension);
                let args = executor::audio_args(&plan, input.path(), output.path());
                (plan.content_type, plan.extension, output, args)
            }
            MediaKind::Image => unreachable!("image jobs never reach the executor"),
        };

        tokio::fs::write(input.path(), &job.data).await?;

        info!("Job {}: transcoding {} bytes", job.id, job.data.len());
        let result = executor::run(&state.config.ffmpeg_path, &args).await;

        // The input is consumed either way once ffmpeg has terminated.
        input.release();
        result?;

        let stream = ArtifactStream::open(output).await?;
        info!("Job {}: transcode complete, streaming result", job.id);

        Ok(CompressedMedia {
            stream,
            content_type,
            file_name: job.output_file_name(extension),
        })
    }
}
