pub mod active;
pub mod config;
pub mod consts;
pub mod error;
pub mod events;
pub mod geometry;
pub mod layout;
pub mod mpr;
pub mod preservation;
pub mod reference_lines;
pub mod registry;
pub mod render;
pub mod retry;
pub mod scheduler;
pub mod session;
pub mod viewer;
pub mod viewport;

pub use config::ViewerConfig;
pub use error::{MprError, Result};
pub use events::ViewerEvent;
pub use layout::LayoutKind;
pub use viewer::Viewer;
pub use viewport::{ImageHandle, Orientation, ViewportName, VisualState};
