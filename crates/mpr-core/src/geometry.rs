use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::consts::PARALLEL_EPSILON;

/// A point or direction in patient (world) coordinates, in millimetres.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// A point in a surface's 2D pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

/// Orientation metadata of one image: where its first pixel sits in patient
/// space and which way its rows and columns run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImagePlane {
    /// Direction cosines of a row (increasing column index).
    pub row_cosines: Vec3,
    /// Direction cosines of a column (increasing row index).
    pub column_cosines: Vec3,
    /// Patient position of the centre of the top-left pixel.
    pub image_position: Vec3,
    /// Distance between adjacent rows, in mm.
    pub row_spacing: f64,
    /// Distance between adjacent columns, in mm.
    pub column_spacing: f64,
}

impl ImagePlane {
    pub fn normal(&self) -> Vec3 {
        self.row_cosines.cross(self.column_cosines)
    }

    pub fn plane(&self) -> Plane {
        Plane {
            normal: self.normal(),
            point: self.image_position,
        }
    }

    /// Patient position of pixel coordinate (`column`, `row`).
    pub fn patient_point(&self, column: f64, row: f64) -> Vec3 {
        self.image_position
            + self.row_cosines * (column * self.column_spacing)
            + self.column_cosines * (row * self.row_spacing)
    }

    /// Inverse of [`patient_point`](Self::patient_point) for points on the plane.
    pub fn pixel_point(&self, point: Vec3) -> Point2 {
        let offset = point - self.image_position;
        Point2 {
            x: offset.dot(self.row_cosines) / self.column_spacing,
            y: offset.dot(self.column_cosines) / self.row_spacing,
        }
    }

    /// Corners of a `columns` x `rows` image on this plane, ordered
    /// top-left, top-right, bottom-left, bottom-right.
    pub fn corners(&self, columns: u32, rows: u32) -> [Vec3; 4] {
        let w = columns as f64;
        let h = rows as f64;
        [
            self.patient_point(0.0, 0.0),
            self.patient_point(w, 0.0),
            self.patient_point(0.0, h),
            self.patient_point(w, h),
        ]
    }

    /// Image edges in the fixed iteration order top, left, right, bottom.
    pub fn edges(&self, columns: u32, rows: u32) -> [Segment; 4] {
        let [tl, tr, bl, br] = self.corners(columns, rows);
        [
            Segment { p1: tl, p2: tr },
            Segment { p1: tl, p2: bl },
            Segment { p1: tr, p2: br },
            Segment { p1: bl, p2: br },
        ]
    }
}

/// An infinite plane given by a normal and any point on it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub point: Vec3,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub p1: Vec3,
    pub p2: Vec3,
}

/// Intersection of `segment` with `plane`, if it lies within the segment.
///
/// Solves `t = -(n . (p1 - q)) / (n . (p2 - p1))`. A denominator below
/// `epsilon` in magnitude means the segment is parallel to the plane.
pub fn segment_plane_intersection(segment: Segment, plane: &Plane, epsilon: f64) -> Option<Vec3> {
    let direction = segment.p2 - segment.p1;
    let denom = plane.normal.dot(direction);
    if denom.abs() < epsilon {
        return None;
    }
    let t = -plane.normal.dot(segment.p1 - plane.point) / denom;
    if !(0.0..=1.0).contains(&t) {
        return None;
    }
    Some(segment.p1 + direction * t)
}

/// Endpoints, in patient space, of the line where `source`'s plane crosses
/// the `columns` x `rows` image described by `target`.
///
/// The first two edge hits in top, left, right, bottom order are used, even
/// when more than two edges intersect (e.g. a plane through a corner).
pub fn reference_line_endpoints(
    source: &ImagePlane,
    target: &ImagePlane,
    columns: u32,
    rows: u32,
    epsilon: f64,
) -> Option<(Vec3, Vec3)> {
    let plane = source.plane();
    let mut hits = target
        .edges(columns, rows)
        .into_iter()
        .filter_map(|edge| segment_plane_intersection(edge, &plane, epsilon));
    let first = hits.next()?;
    let second = hits.next()?;
    Some((first, second))
}

/// [`reference_line_endpoints`] with the default parallel epsilon.
pub fn reference_line(
    source: &ImagePlane,
    target: &ImagePlane,
    columns: u32,
    rows: u32,
) -> Option<(Vec3, Vec3)> {
    reference_line_endpoints(source, target, columns, rows, PARALLEL_EPSILON)
}
