//! Integer tile coordinates and rectangles.
//!
//! Rectangles are half-open: `min` is inclusive, `max` exclusive, so
//! `GridRect::new(0, 0, 10, 10)` covers exactly 100 tiles.

use serde::{Deserialize, Serialize};

fn axis_step(from: i32, to: i32) -> i32 {
    i32::from(to > from) - i32::from(to < from)
}

/// Integer 2D tile coordinate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct GridPoint {
    /// Column.
    #[serde(rename = "X")]
    pub x: i32,
    /// Row.
    #[serde(rename = "Y")]
    pub y: i32,
}

impl GridPoint {
    /// Create a new tile coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The origin tile.
    pub const ZERO: Self = Self::new(0, 0);

    /// One diagonal-or-orthogonal step toward `target`.
    ///
    /// Each axis independently moves -1, 0 or +1. Returns `self` when
    /// already at the target.
    #[must_use]
    pub fn step_toward(self, target: Self) -> Self {
        Self::new(
            self.x + axis_step(self.x, target.x),
            self.y + axis_step(self.y, target.y),
        )
    }

    /// Offset this point by another point.
    #[must_use]
    pub const fn offset(self, by: Self) -> Self {
        Self::new(self.x.saturating_add(by.x), self.y.saturating_add(by.y))
    }

    /// Squared Euclidean distance in whole tiles.
    #[must_use]
    pub const fn distance_squared(self, other: Self) -> i64 {
        let dx = self.x as i64 - other.x as i64;
        let dy = self.y as i64 - other.y as i64;
        dx * dx + dy * dy
    }

    /// Number of diagonal-or-orthogonal steps between two points.
    #[must_use]
    pub const fn chebyshev_distance(self, other: Self) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        if dx > dy {
            dx
        } else {
            dy
        }
    }
}

impl std::fmt::Display for GridPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Half-open rectangle of tile coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridRect {
    /// Inclusive lower corner.
    #[serde(rename = "Min")]
    pub min: GridPoint,
    /// Exclusive upper corner.
    #[serde(rename = "Max")]
    pub max: GridPoint,
}

impl GridRect {
    /// Create a rectangle from two corners, swapping coordinates as needed
    /// so that `min <= max` on both axes.
    #[must_use]
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            min: GridPoint::new(x0.min(x1), y0.min(y1)),
            max: GridPoint::new(x0.max(x1), y0.max(y1)),
        }
    }

    /// Create a rectangle from its corner points.
    #[must_use]
    pub fn from_corners(a: GridPoint, b: GridPoint) -> Self {
        Self::new(a.x, a.y, b.x, b.y)
    }

    /// The empty rectangle at the origin.
    pub const EMPTY: Self = Self {
        min: GridPoint::ZERO,
        max: GridPoint::ZERO,
    };

    /// Width in tiles. Zero for an empty rectangle.
    #[must_use]
    pub const fn width(&self) -> u32 {
        if self.is_empty() {
            return 0;
        }
        self.max.x.abs_diff(self.min.x)
    }

    /// Height in tiles. Zero for an empty rectangle.
    #[must_use]
    pub const fn height(&self) -> u32 {
        if self.is_empty() {
            return 0;
        }
        self.max.y.abs_diff(self.min.y)
    }

    /// Number of tiles covered.
    #[must_use]
    pub const fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// True if the rectangle covers no tiles.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.min.x >= self.max.x || self.min.y >= self.max.y
    }

    /// True if `point` lies inside the rectangle.
    #[must_use]
    pub const fn contains(&self, point: GridPoint) -> bool {
        point.x >= self.min.x && point.x < self.max.x && point.y >= self.min.y && point.y < self.max.y
    }

    /// The largest rectangle contained in both. Empty if they do not overlap.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        let rect = Self {
            min: GridPoint::new(self.min.x.max(other.min.x), self.min.y.max(other.min.y)),
            max: GridPoint::new(self.max.x.min(other.max.x), self.max.y.min(other.max.y)),
        };
        if rect.is_empty() {
            Self::EMPTY
        } else {
            rect
        }
    }

    /// True if the two rectangles share at least one tile.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Iterate covered points in row-major order.
    pub fn points(&self) -> impl Iterator<Item = GridPoint> {
        let rect = *self;
        let (xs, ys) = if rect.is_empty() {
            (0..0, 0..0)
        } else {
            (rect.min.x..rect.max.x, rect.min.y..rect.max.y)
        };
        ys.flat_map(move |y| xs.clone().map(move |x| GridPoint::new(x, y)))
    }
}

impl std::fmt::Display for GridRect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_toward_moves_each_axis_independently() {
        let p = GridPoint::new(0, 0);
        assert_eq!(p.step_toward(GridPoint::new(5, -2)), GridPoint::new(1, -1));
        assert_eq!(p.step_toward(GridPoint::new(0, 3)), GridPoint::new(0, 1));
        assert_eq!(p.step_toward(p), p);
    }

    #[test]
    fn test_rect_is_canonical() {
        let r = GridRect::new(10, 5, 0, 0);
        assert_eq!(r.min, GridPoint::new(0, 0));
        assert_eq!(r.max, GridPoint::new(10, 5));
        assert_eq!(r.area(), 50);
    }

    #[test]
    fn test_extreme_rect_extents_do_not_overflow() {
        let r = GridRect::new(i32::MIN, 0, i32::MAX, 1);
        assert_eq!(r.width(), u32::MAX);
        assert_eq!(r.height(), 1);
        assert_eq!(r.area(), u64::from(u32::MAX));

        let full = GridRect::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        assert_eq!(full.area(), u64::from(u32::MAX) * u64::from(u32::MAX));
    }

    #[test]
    fn test_inverted_rect_is_empty() {
        // Deserialized rectangles skip canonicalization.
        let r = GridRect {
            min: GridPoint::new(5, 5),
            max: GridPoint::new(0, 0),
        };
        assert_eq!(r.width(), 0);
        assert_eq!(r.area(), 0);
    }

    #[test]
    fn test_step_toward_across_full_range() {
        let p = GridPoint::new(i32::MIN, i32::MAX);
        assert_eq!(
            p.step_toward(GridPoint::new(i32::MAX, i32::MIN)),
            GridPoint::new(i32::MIN + 1, i32::MAX - 1)
        );
        assert_eq!(
            p.distance_squared(GridPoint::new(i32::MAX, i32::MAX)),
            i64::from(u32::MAX) * i64::from(u32::MAX)
        );
    }

    #[test]
    fn test_rect_contains_is_half_open() {
        let r = GridRect::new(0, 0, 10, 10);
        assert!(r.contains(GridPoint::new(0, 0)));
        assert!(r.contains(GridPoint::new(9, 9)));
        assert!(!r.contains(GridPoint::new(10, 0)));
        assert!(!r.contains(GridPoint::new(0, -1)));
    }

    #[test]
    fn test_intersect_and_overlaps() {
        let a = GridRect::new(0, 0, 10, 10);
        let b = GridRect::new(5, 5, 15, 15);
        assert_eq!(a.intersect(&b), GridRect::new(5, 5, 10, 10));
        assert!(a.overlaps(&b));

        let c = GridRect::new(10, 0, 20, 10);
        assert!(!a.overlaps(&c));
        assert!(a.intersect(&c).is_empty());
    }

    #[test]
    fn test_points_row_major() {
        let r = GridRect::new(0, 0, 2, 2);
        let pts: Vec<_> = r.points().collect();
        assert_eq!(
            pts,
            vec![
                GridPoint::new(0, 0),
                GridPoint::new(1, 0),
                GridPoint::new(0, 1),
                GridPoint::new(1, 1),
            ]
        );
        assert_eq!(GridRect::EMPTY.points().count(), 0);
    }
}
