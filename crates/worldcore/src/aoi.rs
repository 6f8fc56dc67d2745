//! `AoiGrid`: a uniform 2D cell index over entity positions (spec §3 "Area
//! of interest", §4.4 "AOI grid").
//!
//! Deliberately a flat grid rather than a BVH or quadtree: the spec calls
//! for O(1) cell lookups keyed by truncated coordinates, not a balanced
//! tree rebuilt every tick.

use geometry::Position2D;
use rustc_hash::FxHashMap;

use crate::ids::EntityId;

/// A uniform grid over a bounded `width x height` rectangle, partitioned
/// into `cellSize`-sided square cells (spec §3 "AOIGrid", §4.4).
///
/// Positions outside `[0, width) x [0, height)` are clamped to the nearest
/// edge cell rather than rejected (spec §4.4 "tie-breaking and edge
/// cases").
pub struct AoiGrid {
    cell_size: f32,
    grids_x: i32,
    grids_z: i32,
    cells: FxHashMap<i32, Vec<EntityId>>,
    entity_cell: FxHashMap<EntityId, i32>,
}

impl AoiGrid {
    /// `cell_size` must be positive. Grid dimensions are
    /// `ceil(width / cell_size) x ceil(height / cell_size)` (spec §3).
    #[must_use]
    pub fn new(width: f32, height: f32, cell_size: f32) -> Self {
        assert!(cell_size > 0.0, "AOI cell size must be positive");
        Self {
            cell_size,
            grids_x: ((width / cell_size).ceil() as i32).max(1),
            grids_z: ((height / cell_size).ceil() as i32).max(1),
            cells: FxHashMap::default(),
            entity_cell: FxHashMap::default(),
        }
    }

    fn clamp_coord(value: f32, cell_size: f32, grids_n: i32) -> i32 {
        let raw = (value / cell_size).floor() as i32;
        raw.clamp(0, grids_n - 1)
    }

    /// `cellIndex = gridZ * gridsX + gridX`, with both coordinates clamped
    /// (spec §4.4 `Add`).
    fn cell_index(&self, position: Position2D) -> i32 {
        let gx = Self::clamp_coord(position.x, self.cell_size, self.grids_x);
        let gz = Self::clamp_coord(position.z, self.cell_size, self.grids_z);
        gz * self.grids_x + gx
    }

    fn cell_coords(&self, index: i32) -> (i32, i32) {
        (index % self.grids_x, index / self.grids_x)
    }

    /// Inserts an entity at `position`. Re-inserting an id already tracked
    /// is equivalent to [`AoiGrid::move_entity`].
    pub fn add(&mut self, id: EntityId, position: Position2D) {
        let index = self.cell_index(position);
        if let Some(old) = self.entity_cell.insert(id, index) {
            if old == index {
                return;
            }
            Self::remove_from_cell(&mut self.cells, old, id);
        }
        self.cells.entry(index).or_default().push(id);
    }

    /// Removes an entity using the reverse index, which is authoritative
    /// (spec §4.4 `Remove`: "the x,y are hints"). A no-op if untracked.
    pub fn remove(&mut self, id: EntityId) {
        if let Some(index) = self.entity_cell.remove(&id) {
            Self::remove_from_cell(&mut self.cells, index, id);
        }
    }

    fn remove_from_cell(cells: &mut FxHashMap<i32, Vec<EntityId>>, index: i32, id: EntityId) {
        if let Some(bucket) = cells.get_mut(&index) {
            bucket.retain(|&existing| existing != id);
            if bucket.is_empty() {
                cells.remove(&index);
            }
        }
    }

    /// Moves an already-tracked entity. A no-op when `old` and `new`
    /// resolve to the same cell index (spec §4.4 `Move`, spec §8 "`AOI.Move(id,
    /// p, p)` is a no-op"). Untracked ids are treated as [`AoiGrid::add`]
    /// (spec §4.4: "moving an entity whose reverse index is missing is
    /// treated as Add").
    pub fn move_entity(&mut self, id: EntityId, new_position: Position2D) {
        self.add(id, new_position);
    }

    /// Every entity within `radius` of `position`, per spec §4.4
    /// `GetNearby`: `cellRadius = ceil(radius / cellSize) + 1`, every cell
    /// in the `(2*cellRadius+1)^2` square centered on `position`'s cell.
    /// The result is a superset of the exact radius-disk; callers needing
    /// exact distances must re-filter.
    #[must_use]
    pub fn nearby(&self, position: Position2D, radius: f32) -> Vec<EntityId> {
        let cell_radius = (radius / self.cell_size).ceil() as i32 + 1;
        let gx = Self::clamp_coord(position.x, self.cell_size, self.grids_x);
        let gz = Self::clamp_coord(position.z, self.cell_size, self.grids_z);

        let mut out = Vec::new();
        for dz in -cell_radius..=cell_radius {
            let z = gz + dz;
            if z < 0 || z >= self.grids_z {
                continue;
            }
            for dx in -cell_radius..=cell_radius {
                let x = gx + dx;
                if x < 0 || x >= self.grids_x {
                    continue;
                }
                let index = z * self.grids_x + x;
                if let Some(bucket) = self.cells.get(&index) {
                    out.extend(bucket.iter().copied());
                }
            }
        }
        out
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entity_cell.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entity_cell.is_empty()
    }

    #[cfg(test)]
    fn cell_of(&self, id: EntityId) -> Option<(i32, i32)> {
        self.entity_cell.get(&id).map(|&index| self.cell_coords(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> AoiGrid {
        AoiGrid::new(1000.0, 1000.0, 100.0)
    }

    #[test]
    fn add_then_nearby_finds_same_cell_neighbor() {
        let mut g = grid();
        g.add(EntityId::new(1), Position2D::new(10.0, 10.0));
        g.add(EntityId::new(2), Position2D::new(20.0, 20.0));
        let nearby = g.nearby(Position2D::new(10.0, 10.0), 0.0);
        assert!(nearby.contains(&EntityId::new(2)));
    }

    #[test]
    fn far_entities_are_not_nearby() {
        let mut g = grid();
        g.add(EntityId::new(1), Position2D::new(10.0, 10.0));
        g.add(EntityId::new(2), Position2D::new(900.0, 900.0));
        assert!(!g.nearby(Position2D::new(10.0, 10.0), 10.0).contains(&EntityId::new(2)));
    }

    #[test]
    fn move_to_same_cell_is_a_no_op() {
        let mut g = grid();
        g.add(EntityId::new(1), Position2D::new(10.0, 10.0));
        let before = g.cell_of(EntityId::new(1));
        g.move_entity(EntityId::new(1), Position2D::new(15.0, 15.0));
        assert_eq!(before, g.cell_of(EntityId::new(1)));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn move_across_cells_updates_membership() {
        let mut g = grid();
        g.add(EntityId::new(1), Position2D::new(10.0, 10.0));
        g.move_entity(EntityId::new(1), Position2D::new(900.0, 900.0));
        assert!(!g.nearby(Position2D::new(10.0, 10.0), 10.0).contains(&EntityId::new(1)));
        assert!(g.nearby(Position2D::new(900.0, 900.0), 10.0).contains(&EntityId::new(1)));
    }

    #[test]
    fn remove_clears_empty_cells() {
        let mut g = grid();
        g.add(EntityId::new(1), Position2D::new(10.0, 10.0));
        g.remove(EntityId::new(1));
        assert!(g.is_empty());
        assert!(g.nearby(Position2D::new(10.0, 10.0), 10.0).is_empty());
    }

    #[test]
    fn negative_coordinates_clamp_into_cell_zero() {
        let mut g = grid();
        g.add(EntityId::new(1), Position2D::new(-1.0, -1.0));
        assert_eq!(g.cell_of(EntityId::new(1)), Some((0, 0)));
        assert!(g.nearby(Position2D::new(-100.0, -100.0), 10.0).contains(&EntityId::new(1)));
    }
}
