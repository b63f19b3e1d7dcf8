use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tracing::info;

use crate::overlay::{OverlayEngine, STYLE_FONTS};
use crate::settings;

use super::compose::{ServerError, overlay_request, variations_request};
use super::models::{
    ErrorResponse, OverlayRequest, OverlayResponse, StyleEntry, VariationsRequest,
    VariationsResponse,
};
use super::state::ServerState;

pub async fn run_server(settings: settings::Settings, addr: String) -> Result<()> {
    let engine = OverlayEngine::new(&settings).with_context(|| "failed to load fonts")?;
    let app = router(Arc::new(ServerState { engine }));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| "failed to bind server address")?;
    info!("listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/styles", get(styles))
        .route("/overlay", post(overlay))
        .route("/overlay/variations", post(variations))
        .with_state(state)
        .layer(axum::middleware::from_fn(cors_middleware))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn styles() -> Json<Vec<StyleEntry>> {
    Json(
        STYLE_FONTS
            .iter()
            .map(|(name, font_family)| StyleEntry {
                name: *name,
                font_family: *font_family,
            })
            .collect(),
    )
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Result<Response<Body>, StatusCode> {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return Ok(response);
    }
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    Ok(response)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type"),
    );
}

async fn overlay(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<OverlayRequest>,
) -> Result<Json<OverlayResponse>, (StatusCode, Json<ErrorResponse>)> {
    overlay_request(state.as_ref(), payload)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn variations(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<VariationsRequest>,
) -> Result<Json<VariationsResponse>, (StatusCode, Json<ErrorResponse>)> {
    variations_request(state.as_ref(), payload)
        .await
        .map(Json)
        .map_err(error_response)
}

fn error_response(err: ServerError) -> (StatusCode, Json<ErrorResponse>) {
    (err.status, Json(ErrorResponse { error: err.message }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_headers_allow_any_origin() {
        let mut headers = HeaderMap::new();
        apply_cors_headers(&mut headers);
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-methods"], "GET,POST,OPTIONS");
    }

    #[tokio::test]
    async fn styles_list_every_font() {
        let Json(entries) = styles().await;
        assert_eq!(entries.len(), STYLE_FONTS.len());
        assert_eq!(entries[1].name, "corporate");
        assert_eq!(entries[1].font_family, "Georgia, serif");
    }

    #[test]
    fn error_body_carries_message() {
        let (status, Json(body)) = error_response(ServerError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "failed to load image x: bad".to_string(),
        });
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.error, "failed to load image x: bad");
    }
}
