use crate::infrastructure::ffmpeg::executor::ExecError;
use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompressError {
    #[error("No file uploaded")]
    NoFileUploaded,
    #[error("Could not read the uploaded file")]
    MalformedUpload,
    #[error("No suitable audio encoder available on this server")]
    NoEncoderAvailable,
    #[error("Could not decode the uploaded image")]
    InvalidImage(#[source] image::ImageError),
    #[error("Encoding failed")]
    Encoder(#[from] ExecError),
    #[error("Encoding failed")]
    Io(#[from] std::io::Error),
}

impl CompressError {
    pub fn status(&self) -> StatusCode {
        match self {
            CompressError::NoFileUploaded | CompressError::MalformedUpload => StatusCode::BAD_REQUEST,
            CompressError::NoEncoderAvailable => StatusCode::NOT_IMPLEMENTED,
            CompressError::InvalidImage(_) | CompressError::Encoder(_) | CompressError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// What the client is allowed to see. 4xx messages are specific; 5xx
    /// stay generic, the diagnostics go to the logs only.
    pub fn public_message(&self) -> String {
        match self.status() {
            StatusCode::INTERNAL_SERVER_ERROR => "Media processing failed".to_string(),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_matches_the_api_contract() {
        assert_eq!(CompressError::NoFileUploaded.status(), StatusCode::BAD_REQUEST);
        assert_eq!(CompressError::MalformedUpload.status(), StatusCode::BAD_REQUEST);
        assert_eq!(CompressError::NoEncoderAvailable.status(), StatusCode::NOT_IMPLEMENTED);
        assert_eq!(
            CompressError::Io(std::io::Error::other("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn server_errors_never_leak_diagnostics() {
        let err = CompressError::Encoder(ExecError::NonZeroExit {
            status: std::process::ExitStatus::default(),
            stderr: "x265 [error]: secret path /srv/media".to_string(),
        });
        assert!(!err.public_message().contains("x265"));
    }
}
