use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::Position2D;

/// A 3D position and facing direction.
///
/// `direction` is not required to be normalized by this type; callers that
/// need a unit vector should normalize at the point of use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub direction: Vec3,
}

impl Transform {
    #[must_use]
    pub const fn new(position: Vec3, direction: Vec3) -> Self {
        Self {
            position,
            direction,
        }
    }

    #[must_use]
    pub const fn at(position: Vec3) -> Self {
        Self {
            position,
            direction: Vec3::Z,
        }
    }

    /// The cached `(x, z)` projection used by spatial indexing.
    #[must_use]
    pub fn position2d(&self) -> Position2D {
        Position2D::from(self.position)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}
