use serde::Deserialize;
use crate::config::env::{self, EnvKey};

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub ffmpeg_path: String,
    pub max_upload_mb: usize,
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 3000),
            ffmpeg_path: env::get_or(EnvKey::FfmpegPath, "ffmpeg"),
            max_upload_mb: env::get_parsed(EnvKey::MaxUploadMb, 512),
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}
