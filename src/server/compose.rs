use axum::http::StatusCode;
use futures_util::future::try_join_all;
use image::RgbaImage;
use tracing::warn;

use crate::error::OverlayError;
use crate::overlay::{ImageSource, OverlayConfig, OverlayOutput};

use super::models::{OverlayRequest, OverlayResponse, VariationsRequest, VariationsResponse};
use super::state::ServerState;

#[derive(Debug)]
pub(crate) struct ServerError {
    pub(crate) status: StatusCode,
    pub(crate) message: String,
}

impl ServerError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<OverlayError> for ServerError {
    fn from(err: OverlayError) -> Self {
        let status = match err {
            OverlayError::Load { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            OverlayError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            OverlayError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

pub(crate) async fn overlay_request(
    state: &ServerState,
    request: OverlayRequest,
) -> Result<OverlayResponse, ServerError> {
    request.config.validate()?;
    let source = parse_source(&request.image)?;
    let image = state.engine.load(&source).await?;
    let mut outputs = render_all(state, vec![image], request.config).await?;
    outputs
        .pop()
        .map(OverlayResponse::from)
        .ok_or_else(|| ServerError::internal("render produced no output"))
}

pub(crate) async fn variations_request(
    state: &ServerState,
    request: VariationsRequest,
) -> Result<VariationsResponse, ServerError> {
    request.config.validate()?;
    if request.images.is_empty() {
        return Err(ServerError::bad_request("images must not be empty"));
    }
    let sources = request
        .images
        .iter()
        .map(|value| parse_source(value))
        .collect::<Result<Vec<_>, _>>()?;
    let images = try_join_all(sources.iter().map(|source| state.engine.load(source))).await?;
    let outputs = render_all(state, images, request.config).await?;
    Ok(VariationsResponse {
        results: outputs.into_iter().map(OverlayResponse::from).collect(),
    })
}

/// Remote and inline images only; the server never reads its own disk.
fn parse_source(value: &str) -> Result<ImageSource, ServerError> {
    if value.trim().is_empty() {
        return Err(ServerError::bad_request("image is required"));
    }
    match ImageSource::parse(value) {
        ImageSource::Path(_) => Err(ServerError::bad_request(
            "image must be an http(s) URL or a data URL",
        )),
        source => Ok(source),
    }
}

/// Compositing is CPU bound, so it runs off the async workers.
async fn render_all(
    state: &ServerState,
    images: Vec<RgbaImage>,
    config: OverlayConfig,
) -> Result<Vec<OverlayOutput>, ServerError> {
    let engine = state.engine.clone();
    let result = tokio::task::spawn_blocking(move || {
        images
            .into_iter()
            .map(|image| engine.render(image, &config))
            .collect::<Result<Vec<_>, _>>()
    })
    .await
    .map_err(|err| ServerError::internal(format!("server task failed: {}", err)))?;
    result.map_err(|err| {
        warn!("overlay failed: {}", err);
        ServerError::from(err)
    })
}
