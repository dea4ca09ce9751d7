//! Rectangle and polygon geometry for rooms, walls and vessel silhouettes
//!
//! All rectangles use a y-up convention: `(x, y)` is the top-left corner and
//! the rectangle extends `width` to the right and `height` downward, so its
//! bottom edge is at `y - height`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in the y-up convention
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from min (bottom-left) and max (top-right) corners
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self::new(min.x, max.y, max.x - min.x, max.y - min.y)
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y - self.height
    }

    /// Bottom-left corner
    #[inline]
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.left(), self.bottom())
    }

    /// Top-right corner
    #[inline]
    pub fn max(&self) -> Vec2 {
        Vec2::new(self.right(), self.top())
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y - self.height / 2.0)
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// The four corners: bottom-left, top-left, top-right, bottom-right
    pub fn corners(&self) -> [Vec2; 4] {
        [
            Vec2::new(self.left(), self.bottom()),
            Vec2::new(self.left(), self.top()),
            Vec2::new(self.right(), self.top()),
            Vec2::new(self.right(), self.bottom()),
        ]
    }

    /// Inclusive point containment
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.bottom() && p.y <= self.top()
    }

    /// Inclusive overlap test (touching edges count)
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() <= other.right()
            && other.left() <= self.right()
            && self.bottom() <= other.top()
            && other.bottom() <= self.top()
    }

    /// Grow by `amount` on every side
    pub fn expand(&self, amount: f32) -> Rect {
        Rect::new(
            self.x - amount,
            self.y + amount,
            self.width + amount * 2.0,
            self.height + amount * 2.0,
        )
    }

    pub fn translate(&self, offset: Vec2) -> Rect {
        Rect::new(self.x + offset.x, self.y + offset.y, self.width, self.height)
    }

    /// Smallest rectangle containing both
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::from_min_max(self.min().min(other.min()), self.max().max(other.max()))
    }

    /// Closest point on (or in) the rectangle
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min(), self.max())
    }

    /// Entry parameter `t ∈ [0, 1]` of the segment `a -> b` into the rectangle
    /// (slab test), or `None` if the segment misses it
    pub fn segment_entry(&self, a: Vec2, b: Vec2) -> Option<f32> {
        let dir = b - a;
        let mut t_min = 0.0_f32;
        let mut t_max = 1.0_f32;
        let lo = self.min();
        let hi = self.max();

        for axis in 0..2 {
            let (origin, d, min, max) = if axis == 0 {
                (a.x, dir.x, lo.x, hi.x)
            } else {
                (a.y, dir.y, lo.y, hi.y)
            };
            if d.abs() < f32::EPSILON {
                if origin < min || origin > max {
                    return None;
                }
            } else {
                let inv = 1.0 / d;
                let mut t1 = (min - origin) * inv;
                let mut t2 = (max - origin) * inv;
                if t1 > t2 {
                    std::mem::swap(&mut t1, &mut t2);
                }
                t_min = t_min.max(t1);
                t_max = t_max.min(t2);
                if t_min > t_max {
                    return None;
                }
            }
        }
        Some(t_min)
    }
}

/// Axis a wall runs along, or the direction water crosses a connector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn opposite(self) -> Self {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}

/// Orientation of the triangle `(a, b, c)`: 1 = counter-clockwise,
/// -1 = clockwise, 0 = collinear
fn orientation(a: Vec2, b: Vec2, c: Vec2) -> i32 {
    let cross = (b - a).perp_dot(c - a);
    if cross > f32::EPSILON {
        1
    } else if cross < -f32::EPSILON {
        -1
    } else {
        0
    }
}

/// Convex hull by gift wrapping, counter-clockwise starting from the leftmost
/// point. Collinear boundary points are skipped.
pub fn gift_wrap(points: &[Vec2]) -> Vec<Vec2> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut start = 0;
    for (i, p) in points.iter().enumerate() {
        let s = points[start];
        if p.x < s.x || (p.x == s.x && p.y < s.y) {
            start = i;
        }
    }

    let mut hull = Vec::new();
    let mut current = start;
    loop {
        hull.push(points[current]);
        let mut candidate = (current + 1) % points.len();
        for i in 0..points.len() {
            if i == current || points[i] == points[current] {
                continue;
            }
            let o = orientation(points[current], points[candidate], points[i]);
            // Keep every other point on the left of current -> candidate;
            // on ties take the farthest one
            if o == -1
                || (o == 0
                    && points[current].distance_squared(points[i])
                        > points[current].distance_squared(points[candidate]))
            {
                candidate = i;
            }
        }
        current = candidate;
        if points[current] == points[start] || hull.len() > points.len() {
            break;
        }
    }
    hull
}

/// Total perimeter length of a closed polygon
pub fn perimeter(vertices: &[Vec2]) -> f32 {
    if vertices.len() < 2 {
        return 0.0;
    }
    (0..vertices.len())
        .map(|i| vertices[i].distance(vertices[(i + 1) % vertices.len()]))
        .sum()
}

/// Point at arc-length fraction `t ∈ [0, 1)` along a closed polygon's perimeter
pub fn point_on_perimeter(vertices: &[Vec2], t: f32) -> Vec2 {
    match vertices.len() {
        0 => return Vec2::ZERO,
        1 => return vertices[0],
        _ => {}
    }
    let mut remaining = perimeter(vertices) * t.clamp(0.0, 1.0);
    for i in 0..vertices.len() {
        let a = vertices[i];
        let b = vertices[(i + 1) % vertices.len()];
        let len = a.distance(b);
        if remaining <= len && len > 0.0 {
            return a + (b - a) * (remaining / len);
        }
        remaining -= len;
    }
    vertices[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges_are_y_up() {
        let r = Rect::new(10.0, 100.0, 50.0, 40.0);
        assert_eq!(r.bottom(), 60.0);
        assert_eq!(r.right(), 60.0);
        assert_eq!(r.center(), Vec2::new(35.0, 80.0));
        assert!(r.contains(Vec2::new(10.0, 60.0)));
        assert!(!r.contains(Vec2::new(10.0, 59.9)));
    }

    #[test]
    fn test_rect_intersects_touching_edges() {
        let a = Rect::new(0.0, 10.0, 10.0, 10.0);
        let b = Rect::new(10.0, 10.0, 10.0, 10.0);
        let c = Rect::new(20.1, 10.0, 10.0, 10.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_segment_entry() {
        let r = Rect::new(10.0, 10.0, 10.0, 20.0);
        let t = r.segment_entry(Vec2::new(0.0, 0.0), Vec2::new(20.0, 0.0)).unwrap();
        assert!((t - 0.5).abs() < 1e-5);
        assert!(r.segment_entry(Vec2::new(0.0, 50.0), Vec2::new(20.0, 50.0)).is_none());
    }

    #[test]
    fn test_gift_wrap_rectangles() {
        let mut points = Vec::new();
        points.extend(Rect::new(0.0, 10.0, 100.0, 10.0).corners());
        points.extend(Rect::new(40.0, 30.0, 10.0, 40.0).corners());
        let hull = gift_wrap(&points);

        // Every input point is inside or on the hull
        for p in &points {
            for i in 0..hull.len() {
                let a = hull[i];
                let b = hull[(i + 1) % hull.len()];
                assert!((b - a).perp_dot(*p - a) >= -1e-3, "point {p:?} outside hull");
            }
        }
        assert!(hull.contains(&Vec2::new(0.0, 0.0)));
        assert!(hull.contains(&Vec2::new(40.0, 30.0)));
    }

    #[test]
    fn test_point_on_perimeter() {
        let square = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ];
        assert!((perimeter(&square) - 40.0).abs() < 1e-5);
        let p = point_on_perimeter(&square, 0.375);
        assert!(p.distance(Vec2::new(10.0, 5.0)) < 1e-4);
    }
}
