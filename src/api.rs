use crate::core::error::ExtractError;
use crate::core::types::*;
use crate::tools::{download, extract};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(e: ExtractError) -> ApiError {
    (
        e.status_code(),
        Json(ErrorResponse {
            error: e.public_message(),
        }),
    )
}

/// Build the HTTP surface. Unknown paths, `/` included, fall through to the
/// static front-end directory when it exists.
pub fn router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.resolve_static_dir();

    let mut app = Router::new()
        .route("/health", get(health_check))
        .route("/extract", post(extract_handler))
        .route("/download", get(download_handler));

    if static_dir.is_dir() {
        info!("Serving static files from {}", static_dir.display());
        app = app.fallback_service(ServeDir::new(static_dir));
    }

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "image-scout",
        "version": env!("CARGO_PKG_VERSION"),
        "renderer": state.renderer.name(),
        "profile": state.profile.preset.as_str(),
    }))
}

async fn extract_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ExtractRequest>, JsonRejection>,
) -> Result<Json<ExtractResponse>, ApiError> {
    // An absent or unreadable body carries no URL.
    let url = match body {
        Ok(Json(request)) => request.url,
        Err(rejection) => {
            debug!("extract: body rejected ({})", rejection.body_text());
            None
        }
    };
    extract::extract_images(&state, url.as_deref())
        .await
        .map(|images| Json(ExtractResponse { images }))
        .map_err(api_error)
}

async fn download_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DownloadParams>,
) -> Result<Response, ApiError> {
    let image = download::download_image(&state, params.url.as_deref(), params.referer.as_deref())
        .await
        .map_err(api_error)?;

    let disposition = format!("attachment; filename=\"{}\"", image.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, image.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        image.bytes,
    )
        .into_response())
}
