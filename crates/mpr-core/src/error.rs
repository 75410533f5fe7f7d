use thiserror::Error;

use crate::render::RenderError;

#[derive(Error, Debug)]
pub enum MprError {
    #[error("Render backend error: {0}")]
    Render(#[from] RenderError),

    #[error("Unknown layout: {0}")]
    UnknownLayout(String),

    #[error("Unknown viewport: {0}")]
    UnknownViewport(String),

    #[error("Unknown orientation: {0}")]
    UnknownOrientation(String),

    #[error("Viewport {0} is not part of the current layout")]
    ViewportNotInLayout(String),

    #[error("Viewport {0} has no enabled render surface")]
    ViewportNotEnabled(String),

    #[error("Slice position {0} is outside [0, 1]")]
    InvalidSlicePosition(f64),

    #[error("No MPR volume is loaded")]
    NoVolume,
}

pub type Result<T> = std::result::Result<T, MprError>;
