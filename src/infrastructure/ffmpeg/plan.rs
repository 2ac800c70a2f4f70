use super::probe::{Encoder, EncoderCapabilities};
use tracing::info;

// Quality policy. Fixed per media kind, not negotiable per request.
pub const VIDEO_CRF: &str = "28";
pub const VIDEO_PRESET: &str = "fast";
pub const AUDIO_BITRATE_MP3: &str = "192k";
pub const AUDIO_BITRATE_AAC: &str = "160k";
pub const AUDIO_BITRATE_OPUS: &str = "96k";

/// Plan for the video endpoint. The container is always mp4; only the codec
/// choices vary with what the installed ffmpeg can encode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VideoPlan {
    pub video_codec: &'static str,
    /// `None` means the source audio track is copied unchanged.
    pub audio_codec: Option<&'static str>,
    pub extension: &'static str,
    pub content_type: &'static str,
}

/// Plan for the audio endpoint: codec, container extension, MIME and target
/// bitrate move together as one triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioPlan {
    pub codec: &'static str,
    pub extension: &'static str,
    pub content_type: &'static str,
    pub bitrate: &'static str,
}

/// Derived once from [`EncoderCapabilities`] at startup and shared read-only
/// by every request. `audio: None` means the audio route rejects requests
/// up front instead of failing late.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TranscodePlans {
    pub video: VideoPlan,
    pub audio: Option<AudioPlan>,
}

/// Deterministic ordered fallback. Compatibility-first: mp4/x26x and mp3
/// before less universally supported formats, never a mislabeled file.
pub fn select_plans(caps: &EncoderCapabilities) -> TranscodePlans {
    // Prefer x265; else x264; else attempt x265 anyway and let the encoder
    // fail at run time (handled as a 500, not a crash).
    let video_codec = if caps.can_encode(Encoder::Hevc) {
        Encoder::Hevc.ffmpeg_name()
    } else if caps.can_encode(Encoder::H264) {
        Encoder::H264.ffmpeg_name()
    } else {
        Encoder::Hevc.ffmpeg_name()
    };

    let audio_track_codec = if caps.can_encode(Encoder::Aac) {
        Some(Encoder::Aac.ffmpeg_name())
    } else if caps.can_encode(Encoder::Mp3) {
        Some(Encoder::Mp3.ffmpeg_name())
    } else {
        None
    };

    let audio = if caps.can_encode(Encoder::Mp3) {
        Some(AudioPlan {
            codec: Encoder::Mp3.ffmpeg_name(),
            extension: "mp3",
            content_type: "audio/mpeg",
            bitrate: AUDIO_BITRATE_MP3,
        })
    } else if caps.can_encode(Encoder::Aac) {
        Some(AudioPlan {
            codec: Encoder::Aac.ffmpeg_name(),
            extension: "m4a",
            content_type: "audio/mp4",
            bitrate: AUDIO_BITRATE_AAC,
        })
    } else if caps.can_encode(Encoder::Opus) {
        Some(AudioPlan {
            codec: Encoder::Opus.ffmpeg_name(),
            extension: "ogg",
            content_type: "audio/ogg",
            bitrate: AUDIO_BITRATE_OPUS,
        })
    } else {
        None
    };

    let plans = TranscodePlans {
        video: VideoPlan {
            video_codec,
            audio_codec: audio_track_codec,
            extension: "mp4",
            content_type: "video/mp4",
        },
        audio,
    };

    info!(
        "Transcode plans resolved: video={} audio_track={} audio_endpoint={}",
        plans.video.video_codec,
        plans.video.audio_codec.unwrap_or("copy"),
        plans.audio.map(|a| a.codec).unwrap_or("unavailable"),
    );

    plans
}
