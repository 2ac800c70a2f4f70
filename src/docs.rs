use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::compress::handler::compress_image,
        crate::modules::compress::handler::compress_video,
        crate::modules::compress::handler::compress_audio,
    ),
    components(
        schemas(crate::common::response::ApiResponse)
    ),
    tags(
        (name = "Compress", description = "Media compression endpoints")
    )
)]
pub struct ApiDoc;
