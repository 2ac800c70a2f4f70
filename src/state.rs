use crate::config::settings::AppConfig;
use crate::infrastructure::ffmpeg::plan::TranscodePlans;

/// Shared handler state. `plans` is computed once before the server binds
/// and never mutated afterwards, so cloning the state per request shares a
/// plain read-only value with no locking.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub plans: TranscodePlans,
}

impl AppState {
    pub fn new(config: AppConfig, plans: TranscodePlans) -> Self {
        Self { config, plans }
    }
}
