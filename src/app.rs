use axum::{Router, routing::get};
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::cors::build_cors_layer;
use crate::features::{health, photo};
use crate::openapi::ApiDoc;
use crate::request_id::request_id_middleware;
use crate::state::AppState;

fn compression_predicate() -> impl tower_http::compression::predicate::Predicate {
    use tower_http::compression::predicate::{NotForContentType, Predicate, SizeAbove};

    // 列表页 HTML/JSON 值得压缩；照片本身是 PNG，压缩只会浪费 CPU。
    SizeAbove::default()
        .and(NotForContentType::GRPC)
        .and(NotForContentType::IMAGES)
        .and(NotForContentType::SSE)
        .and(NotForContentType::const_new("application/octet-stream"))
}

/// 组装完整路由：照片接口 + 健康检查 + 文档 + 静态文件兜底
pub fn build_app(state: AppState, config: &AppConfig) -> Router {
    let mut app = Router::<AppState>::new()
        .route("/health", get(health::health_check))
        .merge(photo::create_photo_router(config.storage.max_upload_bytes))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // 其余 GET 路径交给静态目录（拍摄页面 index.html / script.js）
        .fallback_service(ServeDir::new(config.static_path()))
        .with_state(state);

    app = app.layer(CompressionLayer::new().compress_when(compression_predicate()));

    if let Some(cors) = build_cors_layer(&config.cors) {
        app = app.layer(cors);
    }

    app.layer(axum::middleware::from_fn(request_id_middleware))
}
