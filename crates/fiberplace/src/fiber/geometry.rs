//! Fiber footprint for a candidate target position.
//!
//! Model
//! - The tube leaves the pivot along the fiber's radial line and bends towards
//!   the button. Along the tube, at fraction `ε` from the button (0) to the
//!   pivot line (1), the lateral offset is `d · f(ε)` with the cubic profile
//!   `f(ε) = 0.5ε³ − 1.5ε + 1` (f(0)=1, f(1)=0, f'(1)=0).
//! - The ribbon polygon is the sampled centreline offset by ± tube half-width;
//!   the button is a regular polygon around the target.
//! - Positions with `|ψ| > max_bend` or `ext > max_extend` are unreachable and
//!   yield no pose.

use nalgebra::Vector2;

use super::types::{Fiber, InstrumentCfg};
use crate::geom2::{Point2, Polygon, Shape};

/// Footprint and legality metrics of one fiber on one target.
#[derive(Clone, Debug)]
pub struct FiberPose {
    /// Button ∪ tube.
    pub shape: Shape,
    /// Bend angle at the pivot.
    pub psi: f64,
    /// Pivot-to-button distance.
    pub ext: f64,
}

/// Cubic bend profile `0.5ε³ − 1.5ε + 1`.
#[inline]
pub fn bend_profile(eps: f64) -> f64 {
    0.5 * eps * eps * eps - 1.5 * eps + 1.0
}

/// Button polygon centred on `target`.
pub fn button(cfg: &InstrumentCfg, target: Point2) -> Polygon {
    Polygon::regular(target, cfg.button_radius, cfg.button_vertices)
}

/// Pose of `fiber` reaching `target`, or None when unreachable.
pub fn fiber_pose(cfg: &InstrumentCfg, fiber: &Fiber, target: Point2) -> Option<FiberPose> {
    fiber_pose_with_button(cfg, fiber, target, button(cfg, target))
}

/// As `fiber_pose`, reusing a button polygon built once per target.
pub fn fiber_pose_with_button(
    cfg: &InstrumentCfg,
    fiber: &Fiber,
    target: Point2,
    button: Polygon,
) -> Option<FiberPose> {
    let ext = (fiber.pivot - target).norm();
    if ext > cfg.max_extend {
        return None;
    }
    let r = target.norm();
    let phi = target.y.atan2(target.x) - fiber.theta;
    let deflection = r * phi.sin();
    let radial = r * phi.cos();
    let pivot_radial = cfg.pivot_radius - radial;
    let psi = deflection.atan2(pivot_radial);
    if psi.abs() > cfg.max_bend {
        return None;
    }
    let tube = tube_ribbon(cfg, fiber.theta, deflection, radial, pivot_radial, target)?;
    Some(FiberPose {
        shape: Shape::new(vec![button, tube]),
        psi,
        ext,
    })
}

/// Offset ribbon around the bent centreline, button end first.
fn tube_ribbon(
    cfg: &InstrumentCfg,
    theta: f64,
    deflection: f64,
    radial: f64,
    pivot_radial: f64,
    target: Point2,
) -> Option<Polygon> {
    let nseg = cfg.n_tube_segments();
    if nseg == 0 {
        return None;
    }
    let hw = cfg.tube_half_width;
    let mut left: Vec<Point2> = Vec::with_capacity(nseg + 1);
    let mut right: Vec<Point2> = Vec::with_capacity(nseg + 1);
    let mut last = target;
    let mut offset = Vector2::zeros();
    for &eps in &cfg.tube_segments[1..] {
        let defl = deflection * bend_profile(eps);
        let dist = radial + pivot_radial * eps;
        let rn = dist.hypot(defl);
        let phin = defl.atan2(dist);
        let next = Vector2::new(rn * (theta + phin).cos(), rn * (theta + phin).sin());
        let step = next - last;
        let len = step.norm();
        if !(len.is_finite() && len > 0.0) {
            return None;
        }
        offset = Vector2::new(-step.y, step.x) * (hw / len);
        left.push(last + offset);
        right.push(last - offset);
        last = next;
    }
    left.push(last + offset);
    right.push(last - offset);
    left.extend(right.into_iter().rev());
    Polygon::new(left)
}
