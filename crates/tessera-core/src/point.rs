//! The default point type.

use bytemuck::{Pod, Zeroable};

/// A 3D point in double precision.
///
/// `#[repr(C)]` and [`Pod`], so point tables can be wrapped directly over
/// external byte buffers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Point3d {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate (elevation).
    pub z: f64,
}

impl Point3d {
    /// Construct a point from its coordinates.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl From<[f64; 3]> for Point3d {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Point3d> for [f64; 3] {
    fn from(p: Point3d) -> Self {
        [p.x, p.y, p.z]
    }
}
