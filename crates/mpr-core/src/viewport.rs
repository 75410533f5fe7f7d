use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MprError;
use crate::render::SurfaceId;

/// Stable identifier of a logical viewport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewportName {
    Original,
    Axial,
    Sagittal,
    Coronal,
    Main,
    Left,
    Right,
    Top,
    Bottom,
}

impl ViewportName {
    pub const ALL: [ViewportName; 9] = [
        Self::Original,
        Self::Axial,
        Self::Sagittal,
        Self::Coronal,
        Self::Main,
        Self::Left,
        Self::Right,
        Self::Top,
        Self::Bottom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Axial => "axial",
            Self::Sagittal => "sagittal",
            Self::Coronal => "coronal",
            Self::Main => "main",
            Self::Left => "left",
            Self::Right => "right",
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }

    pub fn role(self) -> ViewportRole {
        match self {
            Self::Axial => ViewportRole::MprPlane(Orientation::Axial),
            Self::Sagittal => ViewportRole::MprPlane(Orientation::Sagittal),
            Self::Coronal => ViewportRole::MprPlane(Orientation::Coronal),
            _ => ViewportRole::Primary,
        }
    }

    /// Label shown in the pane overlay.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Original => "Original",
            Self::Axial => "Axial MPR",
            Self::Sagittal => "Sagittal MPR",
            Self::Coronal => "Coronal MPR",
            Self::Main => "Main",
            Self::Left => "Left",
            Self::Right => "Right",
            Self::Top => "Top",
            Self::Bottom => "Bottom",
        }
    }
}

impl fmt::Display for ViewportName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewportName {
    type Err = MprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MprError::UnknownViewport(s.to_string()))
    }
}

/// Anatomical orientation of an MPR plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Axial,
    Sagittal,
    Coronal,
}

impl Orientation {
    pub const ALL: [Orientation; 3] = [Self::Axial, Self::Sagittal, Self::Coronal];

    pub fn viewport(self) -> ViewportName {
        match self {
            Self::Axial => ViewportName::Axial,
            Self::Sagittal => ViewportName::Sagittal,
            Self::Coronal => ViewportName::Coronal,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.viewport().as_str())
    }
}

impl FromStr for Orientation {
    type Err = MprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|o| o.viewport().as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MprError::UnknownOrientation(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViewportRole {
    Primary,
    MprPlane(Orientation),
}

impl ViewportRole {
    pub fn is_primary(self) -> bool {
        matches!(self, Self::Primary)
    }

    pub fn orientation(self) -> Option<Orientation> {
        match self {
            Self::MprPlane(o) => Some(o),
            Self::Primary => None,
        }
    }
}

/// Pan/zoom/rotate/flip/window-level transform of a displayed image.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualState {
    pub scale: f64,
    pub translation_x: f64,
    pub translation_y: f64,
    /// Degrees, clockwise.
    pub rotation: f64,
    pub hflip: bool,
    pub vflip: bool,
    pub invert: bool,
    pub window_width: f64,
    pub window_center: f64,
}

impl Default for VisualState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translation_x: 0.0,
            translation_y: 0.0,
            rotation: 0.0,
            hflip: false,
            vflip: false,
            invert: false,
            window_width: 400.0,
            window_center: 40.0,
        }
    }
}

/// Reference to an image owned by the rendering backend.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageHandle {
    pub image_id: String,
    pub columns: u32,
    pub rows: u32,
}

impl ImageHandle {
    pub fn new(image_id: impl Into<String>, columns: u32, rows: u32) -> Self {
        Self {
            image_id: image_id.into(),
            columns,
            rows,
        }
    }
}

/// A registered, enabled viewport of the current layout.
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    pub name: ViewportName,
    pub surface: SurfaceId,
    /// Grid cell index within the layout.
    pub index: usize,
    pub is_active: bool,
}

impl Viewport {
    pub fn role(&self) -> ViewportRole {
        self.name.role()
    }
}
