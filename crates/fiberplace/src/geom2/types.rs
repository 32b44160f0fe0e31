//! Basic 2D plate types.
//!
//! - `Point2`: plate coordinate (nalgebra column vector).
//! - `Bbox`: closed axis-aligned box used as the cheap envelope for every
//!   polygon and shape test.

use nalgebra::Vector2;

/// Plate coordinate.
pub type Point2 = Vector2<f64>;

/// Closed axis-aligned bounding box `[min, max]`.
///
/// The empty box has `min > max` on both axes and overlaps nothing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bbox {
    pub min: Point2,
    pub max: Point2,
}

impl Default for Bbox {
    fn default() -> Self {
        Self::empty()
    }
}

impl Bbox {
    #[inline]
    pub fn empty() -> Self {
        Self {
            min: Vector2::new(f64::INFINITY, f64::INFINITY),
            max: Vector2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn from_points(pts: &[Point2]) -> Self {
        pts.iter().fold(Self::empty(), |b, p| b.including(*p))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    #[inline]
    pub fn including(&self, p: Point2) -> Self {
        Self {
            min: Vector2::new(self.min.x.min(p.x), self.min.y.min(p.y)),
            max: Vector2::new(self.max.x.max(p.x), self.max.y.max(p.y)),
        }
    }

    #[inline]
    pub fn union(&self, other: &Bbox) -> Self {
        Self {
            min: Vector2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Vector2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// Closed-box overlap (touching boxes overlap).
    #[inline]
    pub fn overlaps(&self, other: &Bbox) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }
}
