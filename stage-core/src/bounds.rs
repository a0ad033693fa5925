//! Integer bounding boxes in twips.
//!
//! A [`Bounds`] starts out empty, marked by a sentinel on every edge, and
//! grows point by point as geometry is recorded. Emptiness is always decided
//! by comparing against the sentinel, never by `x_min > x_max`.

use kurbo::{Affine, Rect};
use serde::{Deserialize, Serialize};

/// Twips per pixel.
pub const TWIPS_PER_PIXEL: i32 = 20;

/// Sentinel stored on every edge of an empty bounds.
pub const SENTINEL: i32 = 0x800_0000;

/// Convert a pixel coordinate to twips, truncating toward zero.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Truncation to whole twips is the storage format
pub fn to_twips(pixels: f64) -> i32 {
    (pixels * f64::from(TWIPS_PER_PIXEL)) as i32
}

/// An axis-aligned bounding box in twips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    /// Left edge.
    pub x_min: i32,
    /// Top edge.
    pub y_min: i32,
    /// Right edge.
    pub x_max: i32,
    /// Bottom edge.
    pub y_max: i32,
}

impl Bounds {
    /// The empty bounds.
    pub const EMPTY: Self = Self {
        x_min: SENTINEL,
        y_min: SENTINEL,
        x_max: SENTINEL,
        y_max: SENTINEL,
    };

    /// Create bounds from its four edges.
    #[must_use]
    pub const fn new(x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Create bounds from an origin and a size.
    #[must_use]
    pub const fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Create empty bounds.
    #[must_use]
    pub const fn empty() -> Self {
        Self::EMPTY
    }

    /// Whether no point has been recorded on either axis.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.x_min == SENTINEL || self.y_min == SENTINEL
    }

    /// Reset every edge to the sentinel.
    pub fn set_to_sentinels(&mut self) {
        *self = Self::EMPTY;
    }

    /// Width in twips.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.x_max - self.x_min
    }

    /// Height in twips.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.y_max - self.y_min
    }

    /// Grow horizontally to include `x`.
    pub fn extend_by_x(&mut self, x: i32) {
        if self.x_min == SENTINEL {
            self.x_min = x;
            self.x_max = x;
        } else {
            self.x_min = self.x_min.min(x);
            self.x_max = self.x_max.max(x);
        }
    }

    /// Grow vertically to include `y`.
    pub fn extend_by_y(&mut self, y: i32) {
        if self.y_min == SENTINEL {
            self.y_min = y;
            self.y_max = y;
        } else {
            self.y_min = self.y_min.min(y);
            self.y_max = self.y_max.max(y);
        }
    }

    /// Grow to include the point.
    pub fn extend_by_point(&mut self, x: i32, y: i32) {
        self.extend_by_x(x);
        self.extend_by_y(y);
    }

    /// Whether the point lies inside; the min edges are inclusive and the max
    /// edges exclusive.
    #[must_use]
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        !self.is_empty() && x >= self.x_min && x < self.x_max && y >= self.y_min && y < self.y_max
    }

    /// Whether `other` lies entirely within these bounds.
    #[must_use]
    pub const fn contains_bounds(&self, other: &Self) -> bool {
        if other.is_empty() {
            return true;
        }
        !self.is_empty()
            && other.x_min >= self.x_min
            && other.x_max <= self.x_max
            && other.y_min >= self.y_min
            && other.y_max <= self.y_max
    }

    /// Smallest bounds containing both. Empty operands are ignored.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        if other.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return *other;
        }
        Self::new(
            self.x_min.min(other.x_min),
            self.y_min.min(other.y_min),
            self.x_max.max(other.x_max),
            self.y_max.max(other.y_max),
        )
    }

    /// Axis-aligned box of these bounds after applying `matrix`.
    ///
    /// The result is rounded outward to whole twips.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // Values originate from i32 twips
    pub fn transform_aabb(&self, matrix: &Affine) -> Self {
        if self.is_empty() {
            return *self;
        }
        let rect = matrix.transform_rect_bbox(self.to_rect());
        Self::new(
            rect.x0.floor() as i32,
            rect.y0.floor() as i32,
            rect.x1.ceil() as i32,
            rect.y1.ceil() as i32,
        )
    }

    /// These bounds as a floating point rectangle in twips.
    #[must_use]
    pub fn to_rect(&self) -> Rect {
        Rect::new(
            f64::from(self.x_min),
            f64::from(self.y_min),
            f64::from(self.x_max),
            f64::from(self.y_max),
        )
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl std::fmt::Display for Bounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "(empty)")
        } else {
            write!(
                f,
                "({}, {}) - ({}, {})",
                self.x_min, self.y_min, self.x_max, self.y_max
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_uses_sentinel() {
        let bounds = Bounds::empty();
        assert!(bounds.is_empty());
        assert_eq!(bounds.x_min, SENTINEL);
        assert_eq!(bounds.width(), 0);
        assert!(!bounds.contains(0, 0));
    }

    #[test]
    fn test_extend_from_empty() {
        let mut bounds = Bounds::empty();
        bounds.extend_by_point(40, -20);
        assert!(!bounds.is_empty());
        assert_eq!(bounds, Bounds::new(40, -20, 40, -20));

        bounds.extend_by_point(-10, 60);
        assert_eq!(bounds, Bounds::new(-10, -20, 40, 60));
    }

    #[test]
    fn test_contains_edges() {
        let bounds = Bounds::new(0, 0, 100, 100);
        assert!(bounds.contains(0, 0));
        assert!(bounds.contains(50, 99));
        assert!(!bounds.contains(100, 50));
        assert!(!bounds.contains(-1, 50));
    }

    #[test]
    fn test_union_ignores_empty() {
        let a = Bounds::new(0, 0, 10, 10);
        assert_eq!(a.union(&Bounds::empty()), a);
        assert_eq!(Bounds::empty().union(&a), a);
        assert_eq!(
            a.union(&Bounds::new(5, -5, 20, 8)),
            Bounds::new(0, -5, 20, 10)
        );
    }

    #[test]
    fn test_transform_aabb_translate_and_scale() {
        let bounds = Bounds::new(0, 0, 200, 100);
        let moved = bounds.transform_aabb(&Affine::translate((20.0, 40.0)));
        assert_eq!(moved, Bounds::new(20, 40, 220, 140));

        let scaled = bounds.transform_aabb(&Affine::scale(2.0));
        assert_eq!(scaled, Bounds::new(0, 0, 400, 200));

        assert!(Bounds::empty()
            .transform_aabb(&Affine::scale(3.0))
            .is_empty());
    }

    #[test]
    fn test_to_twips_truncates() {
        assert_eq!(to_twips(1.0), 20);
        assert_eq!(to_twips(0.99), 19);
        assert_eq!(to_twips(-0.99), -19);
    }

    proptest! {
        #[test]
        fn prop_extended_bounds_are_ordered(
            points in prop::collection::vec((-100_000i32..100_000, -100_000i32..100_000), 1..20)
        ) {
            let mut bounds = Bounds::empty();
            for &(x, y) in &points {
                bounds.extend_by_point(x, y);
            }
            prop_assert!(!bounds.is_empty());
            prop_assert!(bounds.x_min <= bounds.x_max);
            prop_assert!(bounds.y_min <= bounds.y_max);
            for &(x, y) in &points {
                prop_assert!(x >= bounds.x_min && x <= bounds.x_max);
                prop_assert!(y >= bounds.y_min && y <= bounds.y_max);
            }
        }
    }
}
