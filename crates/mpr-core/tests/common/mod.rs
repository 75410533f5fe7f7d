#![allow(dead_code)]

use mpr_core::geometry::{ImagePlane, Vec3};
use mpr_core::mpr::SyntheticVolume;
use mpr_core::render::MemoryBackend;
use mpr_core::session::SeriesSession;
use mpr_core::{ImageHandle, LayoutKind, Viewer, ViewerConfig};

pub const SIZE: u32 = 256;

/// Axial plane (rows along x, columns along y) at height `z`.
pub fn axial_plane(z: f64) -> ImagePlane {
    ImagePlane {
        row_cosines: Vec3::new(1.0, 0.0, 0.0),
        column_cosines: Vec3::new(0.0, 1.0, 0.0),
        image_position: Vec3::new(0.0, 0.0, z),
        row_spacing: 1.0,
        column_spacing: 1.0,
    }
}

/// Sagittal plane at `x`.
pub fn sagittal_plane(x: f64) -> ImagePlane {
    ImagePlane {
        row_cosines: Vec3::new(0.0, 1.0, 0.0),
        column_cosines: Vec3::new(0.0, 0.0, 1.0),
        image_position: Vec3::new(x, 0.0, 0.0),
        row_spacing: 1.0,
        column_spacing: 1.0,
    }
}

/// Coronal plane at `y`.
pub fn coronal_plane(y: f64) -> ImagePlane {
    ImagePlane {
        row_cosines: Vec3::new(1.0, 0.0, 0.0),
        column_cosines: Vec3::new(0.0, 0.0, 1.0),
        image_position: Vec3::new(0.0, y, 0.0),
        row_spacing: 1.0,
        column_spacing: 1.0,
    }
}

pub fn image(id: &str) -> ImageHandle {
    ImageHandle::new(id, SIZE, SIZE)
}

/// `count` axial images of one series, stacked from z = 64 upward.
pub fn series(count: usize) -> Vec<(ImageHandle, ImagePlane)> {
    (0..count)
        .map(|i| (image(&format!("series:{i}")), axial_plane(64.0 + i as f64)))
        .collect()
}

pub fn volume() -> Box<SyntheticVolume> {
    Box::new(SyntheticVolume::new("vol", [SIZE, SIZE, SIZE], [1.0, 1.0, 1.0]))
}

/// Backend with the given images registered, plus one image per MPR
/// orientation named after it.
pub fn backend(images: &[(ImageHandle, ImagePlane)]) -> MemoryBackend {
    let mut backend = MemoryBackend::new();
    for (handle, plane) in images {
        backend.register_image(handle, *plane);
    }
    backend.register_image(&image("axial"), axial_plane(100.0));
    backend.register_image(&image("sagittal"), sagittal_plane(100.0));
    backend.register_image(&image("coronal"), coronal_plane(100.0));
    backend
}

pub fn config(layout: LayoutKind) -> ViewerConfig {
    ViewerConfig {
        initial_layout: layout,
        ..ViewerConfig::default()
    }
}

/// Viewer over a `count`-image session, not started yet.
pub fn viewer(layout: LayoutKind, count: usize) -> Viewer<MemoryBackend> {
    let images = series(count);
    let backend = backend(&images);
    let session = SeriesSession::new(images.into_iter().map(|(h, _)| h).collect());
    Viewer::new(backend, Box::new(session), config(layout))
}

/// Started viewer with all deferred work done.
pub fn started(layout: LayoutKind, count: usize) -> Viewer<MemoryBackend> {
    let mut viewer = viewer(layout, count);
    assert!(viewer.start());
    viewer.run_until_idle();
    viewer
}

/// Started viewer with a synthetic volume behind the MPR panes.
pub fn started_with_volume(layout: LayoutKind, count: usize) -> Viewer<MemoryBackend> {
    let mut viewer = viewer(layout, count).with_volume(volume());
    assert!(viewer.start());
    viewer.run_until_idle();
    viewer
}
