pub mod memory;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{ImagePlane, Point2, Vec3};
use crate::viewport::{ImageHandle, ViewportRole, VisualState};

pub use memory::{Fault, MemoryBackend, MemorySurface};

/// Opaque handle to one render surface (container element + render context).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurfaceId(pub u64);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

/// Notifications a surface can deliver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceEventKind {
    /// The surface finished painting its image; overlays may be drawn now.
    ImageRendered,
    /// The surface switched to a different image (e.g. a slice scroll).
    NewImage,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceEvent {
    pub surface: SurfaceId,
    pub kind: SurfaceEventKind,
}

/// Frame decoration of a pane: idle styling depends on the role, the
/// focused pane gets the active indicator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStyle {
    Idle(ViewportRole),
    Active,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Overlay segment in a surface's pixel space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayLine {
    pub start: Point2,
    pub end: Point2,
    pub color: Rgba,
    pub width: f32,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Failed to create surface for {label}: {reason}")]
    Creation { label: String, reason: String },

    #[error("{0} does not exist")]
    UnknownSurface(SurfaceId),

    #[error("{0} is not attached to the visible tree")]
    NotAttached(SurfaceId),

    #[error("{0} has no render context")]
    NotEnabled(SurfaceId),

    #[error("{0} displays no image")]
    NoImage(SurfaceId),

    #[error("Render context acquisition failed on {surface}: {reason}")]
    ContextAcquisition { surface: SurfaceId, reason: String },

    #[error("Failed to display image {image_id}: {reason}")]
    Display { image_id: String, reason: String },

    #[error("No plane metadata for image {0}")]
    MissingMetadata(String),
}

/// The rendering library, as seen by the viewport layer.
///
/// Surfaces are created as detached containers, must be enabled before any
/// image or transform call, and must be disabled and destroyed on teardown.
/// Notifications are delivered only for `(surface, kind)` pairs that have a
/// live subscription, and are collected with [`poll_events`](Self::poll_events).
pub trait RenderBackend {
    /// Create a container for viewport `label` at grid cell `index`.
    fn create_surface(&mut self, label: &str, index: usize) -> Result<SurfaceId, RenderError>;

    /// Destroy a container. Releases its context and subscriptions if still held.
    fn destroy_surface(&mut self, surface: SurfaceId);

    fn is_attached(&mut self, surface: SurfaceId) -> bool;

    fn is_enabled(&self, surface: SurfaceId) -> bool;

    /// Acquire a render context on the surface.
    fn enable(&mut self, surface: SurfaceId) -> Result<(), RenderError>;

    /// Release the render context.
    fn disable(&mut self, surface: SurfaceId);

    /// Display `image`. Returns once the image is on screen; only then may a
    /// visual state be applied without being overwritten.
    fn display_image(&mut self, surface: SurfaceId, image: &ImageHandle) -> Result<(), RenderError>;

    fn displayed_image(&self, surface: SurfaceId) -> Option<ImageHandle>;

    fn visual_state(&self, surface: SurfaceId) -> Result<VisualState, RenderError>;

    fn set_visual_state(&mut self, surface: SurfaceId, state: &VisualState) -> Result<(), RenderError>;

    /// Orientation metadata lookup by image identifier.
    fn image_plane(&self, image_id: &str) -> Option<ImagePlane>;

    /// Register orientation metadata for an image generated at runtime.
    fn add_plane_metadata(&mut self, image_id: &str, plane: ImagePlane);

    /// Map a patient-space point into the surface's pixel space.
    fn world_to_pixel(&self, surface: SurfaceId, point: Vec3) -> Result<Point2, RenderError>;

    /// Force a repaint of the current image; emits `ImageRendered`.
    fn request_redraw(&mut self, surface: SurfaceId) -> Result<(), RenderError>;

    fn draw_line(&mut self, surface: SurfaceId, line: OverlayLine) -> Result<(), RenderError>;

    fn set_frame_style(&mut self, surface: SurfaceId, style: FrameStyle);

    /// Recompute the surface size after its container changed size.
    fn resize(&mut self, surface: SurfaceId) -> Result<(), RenderError>;

    fn subscribe(
        &mut self,
        surface: SurfaceId,
        kind: SurfaceEventKind,
    ) -> Result<SubscriptionId, RenderError>;

    fn unsubscribe(&mut self, subscription: SubscriptionId);

    /// Drain pending notifications in emission order.
    fn poll_events(&mut self) -> Vec<SurfaceEvent>;
}
