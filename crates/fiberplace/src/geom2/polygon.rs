//! Simple polygons and polygon unions on the plate.
//!
//! Purpose
//! - Represent fiber buttons (regular polygons) and bent tube ribbons (simple,
//!   possibly non-convex polygons) by their vertex rings.
//! - Answer one question quickly: do two regions share any point?
//!
//! Intersection model
//! - Two closed polygons intersect iff an edge of one crosses or touches an
//!   edge of the other, or one contains a vertex of the other.
//! - Every test is guarded by bounding boxes: whole polygon first, then per
//!   edge, which prunes most pairs before any orientation test runs.

use nalgebra::Vector2;

use super::types::{Bbox, Point2};
use super::util::{point_in_polygon, segments_intersect};

/// Closed simple polygon given by its vertex ring (no repeated closing vertex).
#[derive(Clone, Debug)]
pub struct Polygon {
    pts: Vec<Point2>,
    bbox: Bbox,
}

impl Polygon {
    /// Build from a vertex ring. None if fewer than three vertices or any
    /// coordinate is non-finite.
    pub fn new(pts: Vec<Point2>) -> Option<Self> {
        if pts.len() < 3 || pts.iter().any(|p| !(p.x.is_finite() && p.y.is_finite())) {
            return None;
        }
        let bbox = Bbox::from_points(&pts);
        Some(Self { pts, bbox })
    }

    /// Regular `n`-gon (n clamped to at least 3) inscribed in the circle of
    /// `radius` around `center`; the first vertex lies on the +x axis.
    pub fn regular(center: Point2, radius: f64, n: usize) -> Self {
        let n = n.max(3);
        let step = std::f64::consts::TAU / n as f64;
        let pts: Vec<Point2> = (0..n)
            .map(|k| {
                let a = k as f64 * step;
                center + Vector2::new(radius * a.cos(), radius * a.sin())
            })
            .collect();
        let bbox = Bbox::from_points(&pts);
        Self { pts, bbox }
    }

    #[inline]
    pub fn points(&self) -> &[Point2] {
        &self.pts
    }

    #[inline]
    pub fn bbox(&self) -> Bbox {
        self.bbox
    }

    /// Edges `(p_k, p_{k+1})`, closing back to the first vertex.
    pub fn edges(&self) -> impl Iterator<Item = (Point2, Point2)> + '_ {
        let n = self.pts.len();
        (0..n).map(move |k| (self.pts[k], self.pts[(k + 1) % n]))
    }

    #[inline]
    pub fn contains(&self, p: Point2) -> bool {
        self.bbox.overlaps(&Bbox::from_points(&[p])) && point_in_polygon(p, &self.pts)
    }

    /// Closed-set intersection test.
    pub fn intersects(&self, other: &Polygon) -> bool {
        if !self.bbox.overlaps(&other.bbox) {
            return false;
        }
        for (a0, a1) in self.edges() {
            let ea = Bbox::from_points(&[a0, a1]);
            if !ea.overlaps(&other.bbox) {
                continue;
            }
            for (b0, b1) in other.edges() {
                if !ea.overlaps(&Bbox::from_points(&[b0, b1])) {
                    continue;
                }
                if segments_intersect(a0, a1, b0, b1) {
                    return true;
                }
            }
        }
        // No boundary contact: either disjoint or one strictly inside the other.
        other.contains(self.pts[0]) || self.contains(other.pts[0])
    }
}

/// Union of polygons, tested part by part.
#[derive(Clone, Debug, Default)]
pub struct Shape {
    parts: Vec<Polygon>,
    bbox: Bbox,
}

impl Shape {
    pub fn new(parts: Vec<Polygon>) -> Self {
        let bbox = parts
            .iter()
            .fold(Bbox::empty(), |b, p| b.union(&p.bbox()));
        Self { parts, bbox }
    }

    #[inline]
    pub fn parts(&self) -> &[Polygon] {
        &self.parts
    }

    #[inline]
    pub fn bbox(&self) -> Bbox {
        self.bbox
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn push(&mut self, part: Polygon) {
        self.bbox = self.bbox.union(&part.bbox());
        self.parts.push(part);
    }

    /// Union with another shape (parts are concatenated, not merged).
    pub fn union(&self, other: &Shape) -> Shape {
        let mut parts = self.parts.clone();
        parts.extend(other.parts.iter().cloned());
        Shape {
            parts,
            bbox: self.bbox.union(&other.bbox),
        }
    }

    pub fn intersects_polygon(&self, poly: &Polygon) -> bool {
        self.bbox.overlaps(&poly.bbox()) && self.parts.iter().any(|p| p.intersects(poly))
    }

    pub fn intersects(&self, other: &Shape) -> bool {
        if !self.bbox.overlaps(&other.bbox) {
            return false;
        }
        self.parts.iter().any(|p| other.intersects_polygon(p))
    }
}
