use thiserror::Error;

/// Failures recovered inside a frame. None of these cross a stage boundary:
/// the stage that hits one logs it and degrades the affected light or batch.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid light index {index} ({count} visible lights)")]
    InvalidLightIndex { index: usize, count: usize },

    #[error("source batch {index} out of range for drawable {drawable} ({count} batches)")]
    InvalidSourceBatch {
        drawable: usize,
        index: usize,
        count: usize,
    },

    #[error("shadow maps are disabled (page size is zero)")]
    ShadowMapUnavailable,

    #[error("no room for a {width}x{height} shadow map in {pages} page(s)")]
    ShadowMapExhausted { width: u32, height: u32, pages: usize },

    #[error("failed to read settings: {0}")]
    SettingsIo(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    SettingsParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
