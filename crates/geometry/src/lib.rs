//! Value objects for the world-simulation core: 3D transforms, the cached
//! 2D projection used by spatial indexing, and plain distance helpers.

mod position2d;
mod transform;

pub use glam;
pub use position2d::Position2D;
pub use transform::Transform;

use glam::Vec3;

/// Squared distance between two 3D points, projected onto the XZ plane.
///
/// Matching the engines this core is modeled after, "2D" means the
/// horizontal plane: X and Z. Y (height) never participates in AOI or
/// range checks.
#[must_use]
pub fn distance2d_squared(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    dx * dx + dz * dz
}

/// Distance between two 3D points, projected onto the XZ plane.
#[must_use]
pub fn distance2d(a: Vec3, b: Vec3) -> f32 {
    distance2d_squared(a, b).sqrt()
}
