use super::plan::{AudioPlan, VideoPlan, VIDEO_CRF, VIDEO_PRESET};
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to spawn ffmpeg: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("ffmpeg exited with status {status}")]
    NonZeroExit {
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Argument vector for the video endpoint. `+faststart` moves the moov atom
/// to the front so the result is playable while still downloading.
pub fn video_args(plan: &VideoPlan, input: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-i".into(),
        input.into(),
        "-c:v".into(),
        plan.video_codec.into(),
        "-preset".into(),
        VIDEO_PRESET.into(),
        "-crf".into(),
        VIDEO_CRF.into(),
        "-c:a".into(),
        plan.audio_codec.unwrap_or("copy").into(),
        "-movflags".into(),
        "+faststart".into(),
    ];
    args.extend(["-y".into(), output.into()]);
    args
}

/// Argument vector for the audio endpoint. `-vn` drops any cover-art video
/// stream so the output container holds audio only.
pub fn audio_args(plan: &AudioPlan, input: &Path, output: &Path) -> Vec<OsString> {
    vec![
        "-i".into(),
        input.into(),
        "-vn".into(),
        "-c:a".into(),
        plan.codec.into(),
        "-b:a".into(),
        plan.bitrate.into(),
        "-y".into(),
        output.into(),
    ]
}

/// Runs ffmpeg to completion. Exactly one terminal outcome: `Ok(())` once the
/// output artifact is fully written, or an error carrying the diagnostic text
/// for logging (never for the client). `kill_on_drop` ensures a client
/// disconnect while we wait terminates the child instead of leaving it
/// encoding into a file nobody will read.
pub async fn run(ffmpeg_path: &str, args: &[OsString]) -> Result<(), ExecError> {
    debug!("Spawning {} with {:?}", ffmpeg_path, args);

    let output = Command::new(ffmpeg_path)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    let mut tail: Vec<&str> = stderr.lines().rev().take(8).collect();
    tail.reverse();
    error!("ffmpeg failed with {}: {}", output.status, tail.join(" | "));
    Err(ExecError::NonZeroExit {
        status: output.status,
        stderr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ffmpeg::plan::{AudioPlan, VideoPlan};
    use std::path::PathBuf;

    fn os(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn video_args_carry_codec_quality_and_faststart() {
        let plan = VideoPlan {
            video_codec: "libx264",
            audio_codec: Some("aac"),
            extension: "mp4",
            content_type: "video/mp4",
        };
        let args = os(&video_args(&plan, &PathBuf::from("/tmp/in.mkv"), &PathBuf::from("/tmp/out.mp4")));

        for window in [
            &["-c:v", "libx264"][..],
            &["-preset", "fast"][..],
            &["-crf", "28"][..],
            &["-c:a", "aac"][..],
            &["-movflags", "+faststart"][..],
        ] {
            assert!(
                args.windows(2).any(|w| w == window),
                "missing {:?} in {:?}",
                window,
                args
            );
        }
        assert_eq!(args.last().unwrap(), "/tmp/out.mp4");
    }

    #[test]
    fn video_args_copy_audio_when_no_encoder() {
        let plan = VideoPlan {
            video_codec: "libx265",
            audio_codec: None,
            extension: "mp4",
            content_type: "video/mp4",
        };
        let args = os(&video_args(&plan, Path::new("/tmp/a"), Path::new("/tmp/b")));
        assert!(args.windows(2).any(|w| w == ["-c:a", "copy"]));
    }

    #[test]
    fn audio_args_drop_video_and_set_bitrate() {
        let plan = AudioPlan {
            codec: "libmp3lame",
            extension: "mp3",
            content_type: "audio/mpeg",
            bitrate: "192k",
        };
        let args = os(&audio_args(&plan, Path::new("/tmp/in.wav"), Path::new("/tmp/out.mp3")));
        assert!(args.contains(&"-vn".to_string()));
        assert!(args.windows(2).any(|w| w == ["-c:a", "libmp3lame"]));
        assert!(args.windows(2).any(|w| w == ["-b:a", "192k"]));
    }
}
