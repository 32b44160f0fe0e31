//! Fiber and instrument types.
//!
//! - `InstrumentCfg`: fixed positioner constants (plate, pivot circle, button
//!   and tube dimensions, reach limits).
//! - `Cable`: the two science cables plus the guide (FOPS) bundle.
//! - `Fiber`: one physical fiber with its derived pivot/park geometry.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::geom2::Point2;

/// Positioner constants.
///
/// Lengths share one plate unit; angles are radians. `tube_segments` holds the
/// fractional positions along the tube from the button (0) to the pivot line
/// (1); it must start at 0 and end at 1.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentCfg {
    /// Radius of the usable plate area.
    pub plate_radius: f64,
    /// Radius of the circle carrying the fiber pivots.
    pub pivot_radius: f64,
    /// Radius of the parking circle.
    pub park_radius: f64,
    /// Number of fiber positions around the pivot circle.
    pub n_fibers: u32,
    pub button_radius: f64,
    /// Vertices of the button polygon.
    pub button_vertices: usize,
    pub tube_half_width: f64,
    pub tube_segments: Vec<f64>,
    /// Maximum bend angle |ψ| at the pivot.
    pub max_bend: f64,
    /// Maximum pivot-to-button distance.
    pub max_extend: f64,
}

impl Default for InstrumentCfg {
    fn default() -> Self {
        Self {
            plate_radius: 300.0,
            pivot_radius: 330.0,
            park_radius: 315.0,
            n_fibers: 288,
            button_radius: 1.25,
            button_vertices: 16,
            tube_half_width: 0.5,
            tube_segments: vec![0.0, 0.1, 0.25, 0.45, 0.7, 1.0],
            max_bend: 12f64.to_radians(),
            max_extend: 520.0,
        }
    }
}

impl InstrumentCfg {
    #[inline]
    pub fn n_tube_segments(&self) -> usize {
        self.tube_segments.len().saturating_sub(1)
    }

    /// Minimum centre distance of two buttons that do not touch.
    #[inline]
    pub fn button_diameter(&self) -> f64 {
        2.0 * self.button_radius
    }

    #[inline]
    pub fn on_plate(&self, p: Point2) -> bool {
        p.norm_squared() <= self.plate_radius * self.plate_radius
    }
}

/// Fiber bundle a fiber belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cable {
    #[serde(rename = "R")]
    Red,
    #[serde(rename = "B")]
    Blue,
    /// Guide (FOPS) bundle.
    #[serde(rename = "F")]
    Guide,
}

impl Cable {
    /// Single-letter code used by concentricity files (`R`, `B`, `F`).
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "R" => Some(Cable::Red),
            "B" => Some(Cable::Blue),
            "F" => Some(Cable::Guide),
            _ => None,
        }
    }

    /// Science cable named by a field header (`RED` / `BLUE`, any case).
    pub fn from_header(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "RED" => Some(Cable::Red),
            "BLUE" => Some(Cable::Blue),
            _ => None,
        }
    }

    #[inline]
    pub fn is_guide(self) -> bool {
        matches!(self, Cable::Guide)
    }
}

/// Physical fiber number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FiberId(pub u32);

/// One fiber and its fixed geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct Fiber {
    pub id: FiberId,
    pub cable: Cable,
    /// Slit position; None for guide fibers.
    pub slit: Option<i32>,
    /// Status flag from the concentricity file was `A`.
    pub operational: bool,
    pub active: bool,
    /// Angle of the pivot around the plate centre.
    pub theta: f64,
    pub pivot: Point2,
    pub park: Point2,
}

impl Fiber {
    /// Place fiber `id` on the pivot circle at `θ = 2π·id/n_fibers`.
    pub fn new(id: u32, cable: Cable, cfg: &InstrumentCfg) -> Self {
        let theta = std::f64::consts::TAU * f64::from(id) / f64::from(cfg.n_fibers.max(1));
        let dir = Vector2::new(theta.cos(), theta.sin());
        Self {
            id: FiberId(id),
            cable,
            slit: None,
            operational: true,
            active: true,
            theta,
            pivot: dir * cfg.pivot_radius,
            park: dir * cfg.park_radius,
        }
    }

    #[inline]
    pub fn is_guide(&self) -> bool {
        self.cable.is_guide()
    }
}
