use thiserror::Error;

use crate::RenderBackend;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{backend} backend unavailable: {reason}")]
    Unavailable {
        backend: RenderBackend,
        reason: String,
    },
    #[error("surface lost")]
    SurfaceLost,
    #[error("out of memory")]
    OutOfMemory,
    #[error("invalid frame size {width}x{height}")]
    InvalidSize { width: i32, height: i32 },
    #[error("present failed: {0}")]
    Present(String),
    #[error("{0}")]
    Backend(String),
}

impl RenderError {
    pub fn unavailable(backend: RenderBackend, reason: impl ToString) -> Self {
        RenderError::Unavailable {
            backend,
            reason: reason.to_string(),
        }
    }
}
