use super::error::CompressError;
use crate::infrastructure::ffmpeg::plan::TranscodePlans;
use bytes::Bytes;
use std::path::Path;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

/// The `file` multipart field as received: declared filename plus payload.
#[derive(Debug)]
pub struct Upload {
    pub file_name: String,
    pub data: Bytes,
}

/// One transcode request. The declared filename only ever contributes a
/// sanitized stem for the download name and an extension guess; the files on
/// disk are named from `id` alone.
#[derive(Debug)]
pub struct JobDescriptor {
    pub id: Uuid,
    pub kind: MediaKind,
    pub output_stem: String,
    pub input_extension: String,
    pub data: Bytes,
}

impl JobDescriptor {
    pub fn build(
        kind: MediaKind,
        upload: Option<Upload>,
        plans: &TranscodePlans,
    ) -> Result<Self, CompressError> {
        let upload = match upload {
            Some(u) if !u.data.is_empty() => u,
            _ => return Err(CompressError::NoFileUploaded),
        };

        // The audio route refuses up front rather than failing late; the
        // video route always has at least a best-effort plan.
        if kind == MediaKind::Audio && plans.audio.is_none() {
            return Err(CompressError::NoEncoderAvailable);
        }

        Ok(Self {
            id: Uuid::new_v4(),
            kind,
            output_stem: sanitize_stem(&upload.file_name),
            input_extension: guess_extension(&upload.file_name),
            data: upload.data,
        })
    }

    /// Download name advertised in Content-Disposition.
    pub fn output_file_name(&self, extension: &str) -> String {
        format!("compressed_{}.{}", self.output_stem, extension)
    }
}

/// Reduces a client-declared filename to a safe stem: last path component
/// only, extension stripped, anything outside [A-Za-z0-9._-] dropped.
fn sanitize_stem(file_name: &str) -> String {
    // Normalize both separators before taking the basename; a Windows client
    // may declare `C:\clips\a.mp4`.
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);

    let stem = Path::new(base)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let stem: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let stem = stem.trim_matches('.').to_string();

    if stem.is_empty() { "file".to_string() } else { stem }
}

fn guess_extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default()
}
