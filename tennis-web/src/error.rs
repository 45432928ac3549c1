//! Error types for the analysis pipeline
//!
//! Every kind here is recoverable: the tick loop logs it and keeps going.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that can occur while analysing, rendering or exporting.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No pose (or an undersized landmark array) for this frame.
    #[error("No landmark data available for this frame")]
    MissingData,

    #[error("Landmark buffer has {len} values (expected 132 or 99)")]
    InvalidLandmarkData { len: usize },

    /// Pose model, transcoder or vision helper is not ready yet.
    #[error("Upstream service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Invalid surface dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Invalid trim window: {0}")]
    InvalidTrimWindow(String),

    #[error("Recording is not active")]
    RecordingInactive,

    #[error("Recording sink failed: {0}")]
    RecordingSink(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JavaScript error: {0}")]
    Js(String),
}

impl PipelineError {
    /// Create an encoding failure error.
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::EncodingFailed(message.into())
    }

    /// Create an upstream-unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable(message.into())
    }

    /// Wrap a thrown JS value.
    pub fn from_js(value: &JsValue) -> Self {
        Self::Js(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
    }

    /// Whether this error only means "nothing to do this frame".
    pub fn is_missing_data(&self) -> bool {
        matches!(self, Self::MissingData)
    }
}

impl From<image::ImageError> for PipelineError {
    fn from(err: image::ImageError) -> Self {
        Self::RecordingSink(err.to_string())
    }
}

impl From<PipelineError> for JsValue {
    fn from(err: PipelineError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
