use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::features::health::handler::health_check,
        crate::features::photo::handler::list_page,
        crate::features::photo::handler::list_photos,
        crate::features::photo::handler::upload_photo,
        crate::features::photo::handler::delete_photo,
        crate::features::photo::handler::serve_photo,
    ),
    components(
        schemas(
            crate::error::ErrorBody,
            crate::features::health::HealthResponse,
            crate::features::photo::PhotoEntry,
            crate::features::photo::PhotoListResponse,
            crate::features::photo::UploadResponse,
            crate::features::photo::DeleteResponse,
        )
    ),
    tags(
        (name = "Photo", description = "Photo APIs"),
        (name = "Health", description = "Health APIs"),
    ),
    info(
        title = "Photo Capture API",
        version = "0.1.0",
        description = "Photo capture service (Axum)"
    )
)]
pub struct ApiDoc;
