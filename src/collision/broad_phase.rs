//! Broad-phase collision detection using a hashed spatial grid.
//!
//! Shapes are binned into grid cells covering their bounding boxes. The grid
//! keeps two sets: a dynamic set rebuilt every step, and a static set that
//! is only touched when a static shape is explicitly reindexed. Candidate
//! pairs are a superset of the truly colliding pairs; false positives are
//! filtered by the narrow phase, false negatives cannot occur for shapes
//! with up-to-date bounding boxes.

use std::collections::{HashMap, HashSet};

use crate::body::ShapeId;
use crate::types::BB;

type Cell = (i32, i32);

#[derive(Default)]
struct GridSet {
    cells: HashMap<Cell, Vec<ShapeId>>,
    bbs: HashMap<ShapeId, BB>,
}

impl GridSet {
    fn insert(&mut self, id: ShapeId, bb: BB, cell_size: f32) {
        self.bbs.insert(id, bb);
        for cell in cells_for(bb, cell_size) {
            self.cells.entry(cell).or_default().push(id);
        }
    }

    fn remove(&mut self, id: ShapeId, cell_size: f32) -> bool {
        let Some(bb) = self.bbs.remove(&id) else {
            return false;
        };
        for cell in cells_for(bb, cell_size) {
            if let Some(ids) = self.cells.get_mut(&cell) {
                ids.retain(|other| *other != id);
                if ids.is_empty() {
                    self.cells.remove(&cell);
                }
            }
        }
        true
    }

    fn clear(&mut self) {
        self.cells.clear();
        self.bbs.clear();
    }
}

/// Spatial index over shape bounding boxes.
pub struct SpatialGrid {
    cell_size: f32,
    dynamic: GridSet,
    statics: GridSet,
}

impl SpatialGrid {
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        assert!(cell_size.is_finite() && cell_size > 0.0, "cell size must be > 0");
        Self {
            cell_size,
            dynamic: GridSet::default(),
            statics: GridSet::default(),
        }
    }

    #[must_use]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn insert_dynamic(&mut self, id: ShapeId, bb: BB) {
        self.dynamic.insert(id, bb, self.cell_size);
    }

    pub fn insert_static(&mut self, id: ShapeId, bb: BB) {
        self.statics.insert(id, bb, self.cell_size);
    }

    /// Removes a shape from whichever set holds it.
    pub fn remove(&mut self, id: ShapeId) {
        if !self.dynamic.remove(id, self.cell_size) {
            self.statics.remove(id, self.cell_size);
        }
    }

    /// Re-bins one shape after it moved (works for either set).
    /// Ids the grid does not track are ignored.
    pub fn reindex(&mut self, id: ShapeId, bb: BB) {
        if self.dynamic.remove(id, self.cell_size) {
            self.dynamic.insert(id, bb, self.cell_size);
        } else if self.statics.remove(id, self.cell_size) {
            self.statics.insert(id, bb, self.cell_size);
        }
    }

    /// Rebuilds the dynamic set wholesale from fresh bounding boxes. Run
    /// once per step after shapes have moved.
    pub fn rebuild_dynamic(&mut self, shapes: impl Iterator<Item = (ShapeId, BB)>) {
        self.dynamic.clear();
        for (id, bb) in shapes {
            self.dynamic.insert(id, bb, self.cell_size);
        }
    }

    /// Every dynamic/dynamic and dynamic/static pair whose bounding boxes
    /// overlap, deduplicated and sorted (ids ascending) for determinism.
    #[must_use]
    pub fn candidate_pairs(&self) -> Vec<(ShapeId, ShapeId)> {
        let mut seen: HashSet<(ShapeId, ShapeId)> = HashSet::new();
        let mut pairs = Vec::new();

        for (&id, &bb) in &self.dynamic.bbs {
            for cell in cells_for(bb, self.cell_size) {
                if let Some(ids) = self.dynamic.cells.get(&cell) {
                    for &other in ids {
                        if other <= id {
                            continue;
                        }
                        if bb.intersects(self.dynamic.bbs[&other])
                            && seen.insert((id, other))
                        {
                            pairs.push((id, other));
                        }
                    }
                }
                if let Some(ids) = self.statics.cells.get(&cell) {
                    for &other in ids {
                        let key = if id < other { (id, other) } else { (other, id) };
                        if bb.intersects(self.statics.bbs[&other]) && seen.insert(key) {
                            pairs.push(key);
                        }
                    }
                }
            }
        }

        pairs.sort_unstable();
        pairs
    }

    /// Shapes (either set) whose bounding boxes intersect `bb`.
    #[must_use]
    pub fn query_bb(&self, bb: BB) -> Vec<ShapeId> {
        let mut out: Vec<ShapeId> = Vec::new();
        let mut seen: HashSet<ShapeId> = HashSet::new();
        for cell in cells_for(bb, self.cell_size) {
            for set in [&self.dynamic, &self.statics] {
                if let Some(ids) = set.cells.get(&cell) {
                    for &id in ids {
                        if bb.intersects(set.bbs[&id]) && seen.insert(id) {
                            out.push(id);
                        }
                    }
                }
            }
        }
        out.sort_unstable();
        out
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.dynamic.bbs.len() + self.statics.bbs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[allow(clippy::cast_possible_truncation)]
fn cells_for(bb: BB, cell_size: f32) -> impl Iterator<Item = Cell> {
    let x0 = (bb.left / cell_size).floor() as i32;
    let x1 = (bb.right / cell_size).floor() as i32;
    let y0 = (bb.bottom / cell_size).floor() as i32;
    let y1 = (bb.top / cell_size).floor() as i32;
    (x0..=x1).flat_map(move |x| (y0..=y1).map(move |y| (x, y)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;

    fn ids(n: usize) -> Vec<ShapeId> {
        // Mint real generational ids without building shapes.
        let mut arena: Arena<crate::shapes::Shape> = Arena::new();
        (0..n)
            .map(|_| {
                arena.insert(crate::shapes::Shape::circle(1.0, crate::types::Vec2::ZERO))
            })
            .collect()
    }

    #[test]
    fn overlapping_dynamic_shapes_pair_up() {
        let ids = ids(3);
        let mut grid = SpatialGrid::new(4.0);
        grid.insert_dynamic(ids[0], BB::new(0.0, 0.0, 2.0, 2.0));
        grid.insert_dynamic(ids[1], BB::new(1.0, 1.0, 3.0, 3.0));
        grid.insert_dynamic(ids[2], BB::new(50.0, 50.0, 52.0, 52.0));

        let pairs = grid.candidate_pairs();
        assert_eq!(pairs, vec![(ids[0], ids[1])]);
    }

    #[test]
    fn dynamic_static_pairs_found_across_cells() {
        let ids = ids(2);
        let mut grid = SpatialGrid::new(1.0);
        // Static box spanning many cells, dynamic box overlapping one corner.
        grid.insert_static(ids[0], BB::new(-10.0, -1.0, 10.0, 0.0));
        grid.insert_dynamic(ids[1], BB::new(3.5, -0.5, 4.5, 0.5));
        assert_eq!(grid.candidate_pairs().len(), 1);
    }

    #[test]
    fn no_missed_pairs_versus_quadratic_scan() {
        let n = 40;
        let ids = ids(n);
        let mut grid = SpatialGrid::new(3.0);
        let mut bbs = Vec::new();
        // Deterministic pseudo-random soup.
        let mut state: u32 = 0x1234_5678;
        let mut next = move || {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 8) as f32 / (1 << 24) as f32
        };
        for &id in &ids {
            let x = next() * 40.0 - 20.0;
            let y = next() * 40.0 - 20.0;
            let w = next() * 4.0;
            let h = next() * 4.0;
            let bb = BB::new(x, y, x + w, y + h);
            grid.insert_dynamic(id, bb);
            bbs.push((id, bb));
        }

        let pairs = grid.candidate_pairs();
        for i in 0..n {
            for j in (i + 1)..n {
                let (ia, ba) = bbs[i];
                let (ib, bbx) = bbs[j];
                if ba.intersects(bbx) {
                    let key = if ia < ib { (ia, ib) } else { (ib, ia) };
                    assert!(pairs.contains(&key), "missed overlapping pair");
                }
            }
        }
    }

    #[test]
    fn reindex_moves_static_shape() {
        let ids = ids(2);
        let mut grid = SpatialGrid::new(2.0);
        grid.insert_static(ids[0], BB::new(0.0, 0.0, 1.0, 1.0));
        grid.insert_dynamic(ids[1], BB::new(10.0, 10.0, 11.0, 11.0));
        assert!(grid.candidate_pairs().is_empty());

        grid.reindex(ids[0], BB::new(10.2, 10.2, 11.2, 11.2));
        assert_eq!(grid.candidate_pairs().len(), 1);
    }

    #[test]
    fn reindex_ignores_untracked_ids() {
        let ids = ids(1);
        let mut grid = SpatialGrid::new(2.0);
        grid.reindex(ids[0], BB::new(0.0, 0.0, 1.0, 1.0));
        assert!(grid.is_empty());
    }
}
