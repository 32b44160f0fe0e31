//! Plate geometry in 2D.
//!
//! Purpose
//! - Provide the small polygon toolkit the fiber model and the collision
//!   classifier need: vertex-ring polygons, unions of polygons (`Shape`),
//!   axis-aligned envelopes, and closed-set intersection tests.
//! - Keep the API minimal and numerically explicit (one orientation epsilon).
//!
//! Code cross-refs: `fiber::geometry` (builds shapes), `collision::classify`
//! (consumes `Shape::intersects`).

mod polygon;
mod types;
mod util;

pub use polygon::{Polygon, Shape};
pub use types::{Bbox, Point2};
pub use util::{point_in_polygon, segments_intersect};
