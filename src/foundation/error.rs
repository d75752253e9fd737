/// Convenience result type used across the crate.
pub type CodelayerResult<T> = Result<T, CodelayerError>;

/// Top-level error taxonomy used by editor and export APIs.
///
/// Geometry math never fails; stale ids and pointer events without a canvas are silent no-ops
/// and do not surface here.
#[derive(thiserror::Error, Debug)]
pub enum CodelayerError {
    /// Invalid caller-provided data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Image or SVG bytes could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The requested export combination is not supported.
    #[error("export rejected: {0}")]
    ExportRejected(String),

    /// Surface allocation or rasterization failed.
    #[error("render error: {0}")]
    Render(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CodelayerError {
    /// Build a [`CodelayerError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CodelayerError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`CodelayerError::ExportRejected`] value.
    pub fn export_rejected(msg: impl Into<String>) -> Self {
        Self::ExportRejected(msg.into())
    }

    /// Build a [`CodelayerError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
