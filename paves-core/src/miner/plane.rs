//! Grid index for objects placed on a plane

use crate::geometry::Rect;
use std::collections::HashMap;
use std::hash::Hash;

const DEFAULT_GRID_SIZE: i64 = 50;

/// Discrete range of grid cells covering `[v0, v1]`
fn drange(v0: f64, v1: f64, d: i64) -> std::ops::Range<i64> {
    (v0 as i64).div_euclid(d)..((v1 + d as f64) as i64).div_euclid(d)
}

/// A set of keyed rectangles that can be searched by area
///
/// Iteration follows insertion order.
#[derive(Debug, Clone)]
pub struct Plane<T> {
    seq: Vec<T>,
    objs: HashMap<T, Rect>,
    grid: HashMap<(i64, i64), Vec<T>>,
    gridsize: i64,
    bbox: Rect,
}

impl<T: Copy + Eq + Hash> Plane<T> {
    pub fn new(bbox: Rect) -> Self {
        Self::with_grid_size(bbox, DEFAULT_GRID_SIZE)
    }

    pub fn with_grid_size(bbox: Rect, gridsize: i64) -> Self {
        Self {
            seq: Vec::new(),
            objs: HashMap::new(),
            grid: HashMap::new(),
            gridsize: gridsize.max(1),
            bbox,
        }
    }

    pub fn len(&self) -> usize {
        self.objs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objs.is_empty()
    }

    pub fn contains(&self, key: &T) -> bool {
        self.objs.contains_key(key)
    }

    /// Keys in insertion order
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.seq
            .iter()
            .copied()
            .filter(move |key| self.objs.contains_key(key))
    }

    fn cells(&self, bbox: &Rect) -> Vec<(i64, i64)> {
        let bounds = &self.bbox;
        if bbox.x1 <= bounds.x0 || bounds.x1 <= bbox.x0 || bbox.y1 <= bounds.y0 || bounds.y1 <= bbox.y0
        {
            return Vec::new();
        }
        let x0 = bounds.x0.max(bbox.x0);
        let y0 = bounds.y0.max(bbox.y0);
        let x1 = bounds.x1.min(bbox.x1);
        let y1 = bounds.y1.min(bbox.y1);
        let mut cells = Vec::new();
        for grid_y in drange(y0, y1, self.gridsize) {
            for grid_x in drange(x0, x1, self.gridsize) {
                cells.push((grid_x, grid_y));
            }
        }
        cells
    }

    pub fn add(&mut self, key: T, bbox: Rect) {
        for cell in self.cells(&bbox) {
            self.grid.entry(cell).or_default().push(key);
        }
        self.seq.push(key);
        self.objs.insert(key, bbox);
    }

    pub fn remove(&mut self, key: &T) -> bool {
        let Some(bbox) = self.objs.remove(key) else {
            return false;
        };
        for cell in self.cells(&bbox) {
            if let Some(keys) = self.grid.get_mut(&cell) {
                if let Some(pos) = keys.iter().position(|k| k == key) {
                    keys.remove(pos);
                }
            }
        }
        self.seq.retain(|k| k != key);
        true
    }

    /// Keys whose rectangles strictly overlap `bbox`
    pub fn find(&self, bbox: &Rect) -> Vec<T> {
        let mut found: Vec<T> = Vec::new();
        let mut done = std::collections::HashSet::new();
        for cell in self.cells(bbox) {
            let Some(keys) = self.grid.get(&cell) else {
                continue;
            };
            for key in keys {
                if !done.insert(*key) {
                    continue;
                }
                let Some(obj) = self.objs.get(key) else {
                    continue;
                };
                if obj.x1 <= bbox.x0 || bbox.x1 <= obj.x0 || obj.y1 <= bbox.y0 || bbox.y1 <= obj.y0 {
                    continue;
                }
                found.push(*key);
            }
        }
        found
    }
}
