//! Uniform spatial grid used to resolve which room contains a point
//!
//! Cells cover a bounding rectangle; every entity is registered in each cell
//! its rect overlaps. The grid only stores copies of handles, never the
//! entities themselves.

use glam::Vec2;

use super::geometry::Rect;

#[derive(Debug, Clone)]
pub struct SpatialGrid<T: Copy + PartialEq> {
    bounds: Rect,
    cell_size: f32,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<(T, Rect)>>,
    len: usize,
}

impl<T: Copy + PartialEq> SpatialGrid<T> {
    pub fn new(bounds: Rect, cell_size: f32) -> Self {
        let cell_size = if cell_size > 0.0 { cell_size } else { 1.0 };
        let cols = ((bounds.width / cell_size).ceil() as usize).max(1);
        let rows = ((bounds.height / cell_size).ceil() as usize).max(1);
        Self {
            bounds,
            cell_size,
            cols,
            rows,
            cells: vec![Vec::new(); cols * rows],
            len: 0,
        }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Number of registered entities
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
        self.len = 0;
    }

    fn column(&self, x: f32) -> usize {
        let i = ((x - self.bounds.left()) / self.cell_size).floor();
        (i.max(0.0) as usize).min(self.cols - 1)
    }

    fn row(&self, y: f32) -> usize {
        let i = ((y - self.bounds.bottom()) / self.cell_size).floor();
        (i.max(0.0) as usize).min(self.rows - 1)
    }

    /// Inclusive cell index range covered by `rect`, clamped to the grid
    fn cell_range(&self, rect: &Rect) -> Option<(usize, usize, usize, usize)> {
        if !self.bounds.intersects(rect) {
            return None;
        }
        Some((
            self.column(rect.left()),
            self.row(rect.bottom()),
            self.column(rect.right()),
            self.row(rect.top()),
        ))
    }

    pub fn insert(&mut self, entity: T, rect: Rect) -> bool {
        let Some((x0, y0, x1, y1)) = self.cell_range(&rect) else {
            log::warn!(
                "Rect {:?} lies outside the spatial grid {:?}, not inserted",
                rect,
                self.bounds
            );
            return false;
        };
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.cells[y * self.cols + x].push((entity, rect));
            }
        }
        self.len += 1;
        true
    }

    pub fn remove(&mut self, entity: T, rect: Rect) -> bool {
        let Some((x0, y0, x1, y1)) = self.cell_range(&rect) else {
            log::warn!(
                "Rect {:?} lies outside the spatial grid {:?}, nothing removed",
                rect,
                self.bounds
            );
            return false;
        };
        let mut found = false;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let cell = &mut self.cells[y * self.cols + x];
                let before = cell.len();
                cell.retain(|(e, _)| *e != entity);
                found |= cell.len() != before;
            }
        }
        if found {
            self.len -= 1;
        }
        found
    }

    /// Entities whose rect contains `p` (edges inclusive)
    pub fn query_point(&self, p: Vec2) -> Vec<T> {
        if !self.bounds.contains(p) {
            return Vec::new();
        }
        self.cells[self.row(p.y) * self.cols + self.column(p.x)]
            .iter()
            .filter(|(_, rect)| rect.contains(p))
            .map(|(e, _)| *e)
            .collect()
    }

    /// Entities whose rect overlaps `area`, each reported once
    pub fn query_rect(&self, area: &Rect) -> Vec<T> {
        let Some((x0, y0, x1, y1)) = self.cell_range(area) else {
            return Vec::new();
        };
        let mut found = Vec::new();
        for y in y0..=y1 {
            for x in x0..=x1 {
                for (e, rect) in &self.cells[y * self.cols + x] {
                    if rect.intersects(area) && !found.contains(e) {
                        found.push(*e);
                    }
                }
            }
        }
        found
    }
}
