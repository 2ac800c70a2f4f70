use axum::routing::post;
use axum::Router;
use crate::state::AppState;

pub mod error;
pub mod handler;
pub mod job;
pub mod service;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/image", post(handler::compress_image))
        .route("/video", post(handler::compress_video))
        .route("/audio", post(handler::compress_audio))
}
