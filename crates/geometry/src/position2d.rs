use glam::Vec3;
use serde::{Deserialize, Serialize};

/// The XZ projection of a 3D position, cached alongside the full transform so
/// spatial queries never have to re-derive it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position2D {
    pub x: f32,
    pub z: f32,
}

impl Position2D {
    #[must_use]
    pub const fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    #[must_use]
    pub fn distance_squared(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        dx * dx + dz * dz
    }

    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        self.distance_squared(other).sqrt()
    }
}

impl From<Vec3> for Position2D {
    fn from(value: Vec3) -> Self {
        Self {
            x: value.x,
            z: value.z,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = Position2D::new(0.0, 0.0);
        let b = Position2D::new(3.0, 4.0);
        assert_relative_eq!(a.distance(b), 5.0);
    }
}
