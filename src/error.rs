use thiserror::Error;

/// Failures of a single overlay call. None of them are retried; the caller
/// decides whether to surface the message or fall back to the plain image.
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("failed to load image {source_ref}: {reason}")]
    Load { source_ref: String, reason: String },

    #[error("failed to render overlay: {0}")]
    Render(String),

    #[error("invalid overlay config: {0}")]
    InvalidConfig(String),
}

impl OverlayError {
    pub(crate) fn load(source_ref: impl Into<String>, reason: impl ToString) -> Self {
        Self::Load {
            source_ref: source_ref.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn render(reason: impl ToString) -> Self {
        Self::Render(reason.to_string())
    }
}

pub type OverlayResult<T> = std::result::Result<T, OverlayError>;
