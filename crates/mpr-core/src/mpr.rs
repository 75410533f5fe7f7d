use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_SLICE_POSITION;
use crate::error::{MprError, Result};
use crate::geometry::{ImagePlane, Vec3};
use crate::viewport::{ImageHandle, Orientation};

/// One reconstructed slice and its orientation metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedSlice {
    pub image: ImageHandle,
    pub plane: ImagePlane,
}

/// Source of MPR slices. The reslicing itself is opaque to the viewport layer.
pub trait MprVolume {
    fn has_volume(&self) -> bool;

    /// Slice for `orientation` at normalized `position` in [0, 1].
    fn generate_slice(&mut self, orientation: Orientation, position: f64) -> Result<GeneratedSlice>;
}

/// Per-orientation normalized slice positions. Unset orientations read as the default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlicePositions {
    default: f64,
    positions: BTreeMap<Orientation, f64>,
}

impl Default for SlicePositions {
    fn default() -> Self {
        Self::new(DEFAULT_SLICE_POSITION)
    }
}

impl SlicePositions {
    pub fn new(default: f64) -> Self {
        Self {
            default: default.clamp(0.0, 1.0),
            positions: BTreeMap::new(),
        }
    }

    pub fn get(&self, orientation: Orientation) -> f64 {
        self.positions
            .get(&orientation)
            .copied()
            .unwrap_or(self.default)
    }

    /// Store a position, clamped to [0, 1]. Returns the stored value.
    pub fn set(&mut self, orientation: Orientation, position: f64) -> f64 {
        let clamped = position.clamp(0.0, 1.0);
        self.positions.insert(orientation, clamped);
        clamped
    }

    /// Move by `delta`, clamped to [0, 1]. Returns the new value.
    pub fn step(&mut self, orientation: Orientation, delta: f64) -> f64 {
        let current = self.get(orientation);
        self.set(orientation, current + delta)
    }
}

/// Axis-aligned voxel box in patient space, resliced along the three
/// anatomical axes. x runs left to right, y anterior to posterior, z along
/// the slice stack.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SyntheticVolume {
    pub series_id: String,
    /// Voxel counts along x, y, z.
    pub dimensions: [u32; 3],
    /// Voxel spacing along x, y, z in mm.
    pub spacing: [f64; 3],
    pub origin: Vec3,
}

impl SyntheticVolume {
    pub fn new(series_id: impl Into<String>, dimensions: [u32; 3], spacing: [f64; 3]) -> Self {
        Self {
            series_id: series_id.into(),
            dimensions,
            spacing,
            origin: Vec3::default(),
        }
    }

    fn slice_index(&self, axis: usize, position: f64) -> u32 {
        let last = self.dimensions[axis].saturating_sub(1);
        (position * last as f64).round() as u32
    }

    fn axis_offset(&self, axis: usize, index: u32) -> f64 {
        index as f64 * self.spacing[axis]
    }
}

impl MprVolume for SyntheticVolume {
    fn has_volume(&self) -> bool {
        self.dimensions.iter().all(|&d| d > 0)
    }

    fn generate_slice(&mut self, orientation: Orientation, position: f64) -> Result<GeneratedSlice> {
        if !self.has_volume() {
            return Err(MprError::NoVolume);
        }
        if !(0.0..=1.0).contains(&position) {
            return Err(MprError::InvalidSlicePosition(position));
        }
        let [nx, ny, nz] = self.dimensions;
        let [sx, sy, sz] = self.spacing;
        let x = Vec3::new(1.0, 0.0, 0.0);
        let y = Vec3::new(0.0, 1.0, 0.0);
        let z = Vec3::new(0.0, 0.0, 1.0);

        let (index, columns, rows, plane) = match orientation {
            Orientation::Axial => {
                let k = self.slice_index(2, position);
                let plane = ImagePlane {
                    row_cosines: x,
                    column_cosines: y,
                    image_position: self.origin + z * self.axis_offset(2, k),
                    row_spacing: sy,
                    column_spacing: sx,
                };
                (k, nx, ny, plane)
            }
            Orientation::Sagittal => {
                let k = self.slice_index(0, position);
                let plane = ImagePlane {
                    row_cosines: y,
                    column_cosines: z,
                    image_position: self.origin + x * self.axis_offset(0, k),
                    row_spacing: sz,
                    column_spacing: sy,
                };
                (k, ny, nz, plane)
            }
            Orientation::Coronal => {
                let k = self.slice_index(1, position);
                let plane = ImagePlane {
                    row_cosines: x,
                    column_cosines: z,
                    image_position: self.origin + y * self.axis_offset(1, k),
                    row_spacing: sz,
                    column_spacing: sx,
                };
                (k, nx, nz, plane)
            }
        };

        let image = ImageHandle::new(
            format!("{}:{}:{}", self.series_id, orientation, index),
            columns,
            rows,
        );
        Ok(GeneratedSlice { image, plane })
    }
}
