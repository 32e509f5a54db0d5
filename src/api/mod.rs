use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{HeaderName, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::proxy::handler;
use crate::AppState;

/// Base64 documents travel inside JSON bodies.
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Proxy routes, relative to the `/api` mount point.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(handler::login))
        .route("/solicitudes/validar", post(handler::validate_request))
        .route("/personas/consultar", post(handler::list_people))
        .route("/personas/registrar", post(handler::register_person))
        .route("/vehiculos/consultar", post(handler::list_vehicles))
        .route("/vehiculos/registrar", post(handler::register_vehicle))
        .route("/documentos/consultar", post(handler::list_documents))
        .route("/documentos/subir", post(handler::upload_document))
        .fallback(fallback_404)
}

/// Full application: health check, proxy routes, and the response layers.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.config.dashboard_origin.clone());

    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .nest("/api", api_router())
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(middleware::from_fn(security_headers_middleware))
}

async fn fallback_404() -> StatusCode {
    StatusCode::NOT_FOUND
}

fn cors_layer(dashboard_origin: String) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            let origin_str = origin.to_str().unwrap_or("");
            origin_str == dashboard_origin
                || origin_str.starts_with("http://localhost:")
                || origin_str.starts_with("http://127.0.0.1:")
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("x-request-id"),
        ])
        .allow_credentials(true)
}

/// Middleware: tags every response with a unique X-Request-Id so a user
/// report can be matched to server logs.
async fn request_id_middleware(req: Request, next: Next) -> Response {
    let req_id = uuid::Uuid::new_v4().to_string();
    let mut resp = next.run(req).await;
    if let Ok(val) = HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}

async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();

    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    // responses may carry profile data or documents
    headers.insert("Cache-Control", HeaderValue::from_static("no-store"));
    headers.insert("Referrer-Policy", HeaderValue::from_static("no-referrer"));
    headers.remove("Server");

    resp
}
