use crate::api::handlers;
use crate::service::ScanService;
use axum::{
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeaderLayer;

/// 构建路由: JSON 接口 + CSV 导出 + PWA 静态资源
pub fn create_router(service: Arc<ScanService>, static_dir: &Path) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/save_text", post(handlers::save_text))
        .route("/scan", post(handlers::scan_image))
        .route("/list", get(handlers::list_scans))
        .route("/scans/:id", get(handlers::get_scan))
        .route("/items", get(handlers::list_items))
        .route("/download", get(handlers::download_scans))
        .route("/download_items", get(handlers::download_items))
        .with_state(service);

    // 前端 (离线可用)
    let static_routes = Router::new()
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .route_service(
            "/manifest.webmanifest",
            ServeFile::new(static_dir.join("manifest.webmanifest")),
        )
        .route_service(
            "/sw.js",
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::overriding(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("text/javascript"),
                ))
                .service(ServeFile::new(static_dir.join("sw.js"))),
        )
        .nest_service("/static", ServeDir::new(static_dir));

    Router::new()
        .merge(api_routes)
        .merge(static_routes)
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
}
