use serde::{Deserialize, Serialize};

use crate::overlay::{OverlayConfig, OverlayLayout, OverlayOutput};

#[derive(Debug, Deserialize)]
pub(crate) struct OverlayRequest {
    /// Path, http(s) URL, or data URL.
    pub(crate) image: String,
    pub(crate) config: OverlayConfig,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VariationsRequest {
    pub(crate) images: Vec<String>,
    pub(crate) config: OverlayConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OverlayResponse {
    pub(crate) data_url: String,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) layout: OverlayLayout,
}

impl From<OverlayOutput> for OverlayResponse {
    fn from(output: OverlayOutput) -> Self {
        Self {
            data_url: output.to_data_url(),
            width: output.width,
            height: output.height,
            layout: output.layout,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct VariationsResponse {
    pub(crate) results: Vec<OverlayResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StyleEntry {
    pub(crate) name: &'static str,
    pub(crate) font_family: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}
