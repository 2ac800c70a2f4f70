use std::collections::HashSet;
use std::process::Command;
use thiserror::Error;
use tracing::warn;

/// Encoders the service cares about. Everything else ffmpeg may or may not
/// ship is irrelevant to plan selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Encoder {
    Hevc,
    H264,
    Mp3,
    Aac,
    Opus,
}

impl Encoder {
    pub const ALL: [Encoder; 5] = [
        Encoder::Hevc,
        Encoder::H264,
        Encoder::Mp3,
        Encoder::Aac,
        Encoder::Opus,
    ];

    /// The name ffmpeg uses in its `-encoders` listing and in `-c:v`/`-c:a`.
    pub fn ffmpeg_name(&self) -> &'static str {
        match self {
            Encoder::Hevc => "libx265",
            Encoder::H264 => "libx264",
            Encoder::Mp3 => "libmp3lame",
            Encoder::Aac => "aac",
            Encoder::Opus => "libopus",
        }
    }
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to invoke ffmpeg: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("ffmpeg -encoders exited with status {0}")]
    NonZeroExit(std::process::ExitStatus),
}

/// Set of encode-capable codecs, computed once at startup and read-only
/// afterwards. Re-probing replaces the whole value, never patches it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncoderCapabilities {
    encoders: HashSet<Encoder>,
}

impl EncoderCapabilities {
    pub fn can_encode(&self, encoder: Encoder) -> bool {
        self.encoders.contains(&encoder)
    }

    /// What the rest of the system assumes as a last resort when probing
    /// fails: x264 + aac, present in effectively every ffmpeg build.
    pub fn baseline() -> Self {
        Self {
            encoders: HashSet::from([Encoder::H264, Encoder::Aac]),
        }
    }

    pub fn from_encoders(encoders: impl IntoIterator<Item = Encoder>) -> Self {
        Self {
            encoders: encoders.into_iter().collect(),
        }
    }

    /// Empty capability set, the starting point before probing.
    pub fn none() -> Self {
        Self {
            encoders: HashSet::new(),
        }
    }
}

/// Queries `ffmpeg -encoders` once and records which of the codecs of
/// interest the installed build can actually encode.
pub fn probe(ffmpeg_path: &str) -> Result<EncoderCapabilities, ProbeError> {
    let output = Command::new(ffmpeg_path)
        .args(["-hide_banner", "-encoders"])
        .output()?;

    if !output.status.success() {
        return Err(ProbeError::NonZeroExit(output.status));
    }

    let listing = String::from_utf8_lossy(&output.stdout);
    Ok(parse_encoder_listing(&listing))
}

/// Like [`probe`] but never fails: on any probe error the baseline
/// capabilities are returned so the service still starts (the image route
/// works without ffmpeg entirely).
pub fn probe_or_baseline(ffmpeg_path: &str) -> EncoderCapabilities {
    match probe(ffmpeg_path) {
        Ok(caps) => caps,
        Err(e) => {
            warn!("Encoder probe failed ({}), assuming baseline x264/aac", e);
            EncoderCapabilities::baseline()
        }
    }
}

/// Parses the `ffmpeg -encoders` table. Lines look like:
/// ` V....D libx264              libx264 H.264 / AVC ...`
/// Everything before the `------` separator is header text.
fn parse_encoder_listing(listing: &str) -> EncoderCapabilities {
    let mut names: HashSet<&str> = HashSet::new();

    let mut in_table = false;
    for line in listing.lines() {
        if !in_table {
            if line.trim_start().starts_with("------") {
                in_table = true;
            }
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(flags), Some(name)) = (fields.next(), fields.next()) else {
            continue;
        };
        // First flag column is V (video), A (audio) or S (subtitle).
        if flags.starts_with('V') || flags.starts_with('A') {
            names.insert(name);
        }
    }

    let encoders = Encoder::ALL
        .into_iter()
        .filter(|e| names.contains(e.ffmpeg_name()))
        .collect();

    EncoderCapabilities { encoders }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Encoders:
 V..... = Video
 A..... = Audio
 S..... = Subtitle
 .F.... = Frame-level multithreading
 ------
 V....D libx264              libx264 H.264 / AVC / MPEG-4 AVC (codec h264)
 V....D libx265              libx265 H.265 / HEVC (codec hevc)
 A....D aac                  AAC (Advanced Audio Coding)
 A....D libmp3lame           libmp3lame MP3 (MPEG audio layer 3) (codec mp3)
 S..... srt                  SubRip subtitle
";

    #[test]
    fn parses_encoder_table() {
        let caps = parse_encoder_listing(SAMPLE);
        assert!(caps.can_encode(Encoder::H264));
        assert!(caps.can_encode(Encoder::Hevc));
        assert!(caps.can_encode(Encoder::Aac));
        assert!(caps.can_encode(Encoder::Mp3));
        assert!(!caps.can_encode(Encoder::Opus));
    }

    #[test]
    fn ignores_header_text_mentioning_codec_names() {
        // Names appearing before the separator must not count.
        let listing = "Encoders: libx264 libopus\n ------\n";
        let caps = parse_encoder_listing(listing);
        assert!(!caps.can_encode(Encoder::H264));
        assert!(!caps.can_encode(Encoder::Opus));
    }

    #[test]
    fn subtitle_encoders_are_not_counted() {
        let listing = " ------\n S..... libx264  bogus subtitle row\n";
        let caps = parse_encoder_listing(listing);
        assert!(!caps.can_encode(Encoder::H264));
    }

    #[test]
    fn baseline_is_x264_and_aac() {
        let caps = EncoderCapabilities::baseline();
        assert!(caps.can_encode(Encoder::H264));
        assert!(caps.can_encode(Encoder::Aac));
        assert!(!caps.can_encode(Encoder::Hevc));
        assert!(!caps.can_encode(Encoder::Mp3));
        assert!(!caps.can_encode(Encoder::Opus));
    }
}
