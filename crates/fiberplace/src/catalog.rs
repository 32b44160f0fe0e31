//! Targets, field header, and the sky→plate boundary.
//!
//! - `CatalogEntry` is the sky-side record (RA/Dec, weight, kind, optional
//!   prior fiber assignment); `Target` is its plate-side counterpart with a
//!   dense `TargetId`.
//! - `SkyToPlate` is the astrometry collaborator; projection itself lives
//!   outside this crate.
//! - `cache_key` fingerprints everything a collision matrix depends on.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::fiber::{Cable, Fiber, FiberId, InstrumentCfg};
use crate::geom2::Point2;

/// Dense index of a target in the current catalog ordering (optID).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TargetId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Science,
    Sky,
    /// Guide star (FOPS); only reachable by guide fibers.
    Guide,
}

impl TargetKind {
    /// Catalog type codes: `O` object, `S` sky, `F` guide.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "O" => Some(TargetKind::Science),
            "S" => Some(TargetKind::Sky),
            "F" => Some(TargetKind::Guide),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            TargetKind::Science => "O",
            TargetKind::Sky => "S",
            TargetKind::Guide => "F",
        }
    }

    #[inline]
    pub fn is_guide(self) -> bool {
        matches!(self, TargetKind::Guide)
    }
}

/// A target on the plate.
#[derive(Clone, Debug, PartialEq)]
pub struct Target {
    pub id: TargetId,
    /// External catalog key (objID).
    pub obj_id: u64,
    pub name: String,
    pub pos: Point2,
    pub weight: u32,
    pub kind: TargetKind,
}

impl Target {
    pub fn new(id: usize, obj_id: u64, pos: Point2, weight: u32, kind: TargetKind) -> Self {
        Self {
            id: TargetId(id),
            obj_id,
            name: String::new(),
            pos,
            weight,
            kind,
        }
    }
}

/// Fiber assignment carried over from a previously saved configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorAssignment {
    pub fiber: FiberId,
    /// Assignment was marked manual (locked).
    #[serde(default)]
    pub pinned: bool,
}

/// Sky-side catalog record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub obj_id: u64,
    #[serde(default)]
    pub name: String,
    /// Degrees.
    pub ra: f64,
    /// Degrees.
    pub dec: f64,
    pub weight: u32,
    pub kind: TargetKind,
    #[serde(default)]
    pub prior: Option<PriorAssignment>,
}

/// Plate positions of one sky position for the two optical paths.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlatePosition {
    pub guide: Point2,
    pub science: Point2,
}

/// Astrometry collaborator: maps RA/Dec (degrees) to plate coordinates.
pub trait SkyToPlate {
    fn sky_to_plate(&self, ra: f64, dec: f64) -> PlatePosition;
}

/// Project catalog entries onto the plate. Guide stars use the guide path,
/// everything else the science path. Off-plate entries are dropped; the
/// surviving targets get dense ids in input order.
pub fn project_catalog<A: SkyToPlate + ?Sized>(
    entries: &[CatalogEntry],
    astrometry: &A,
    cfg: &InstrumentCfg,
) -> Vec<Target> {
    let mut targets = Vec::with_capacity(entries.len());
    for e in entries {
        let plate = astrometry.sky_to_plate(e.ra, e.dec);
        let pos = if e.kind.is_guide() {
            plate.guide
        } else {
            plate.science
        };
        if !cfg.on_plate(pos) {
            tracing::warn!(
                obj_id = e.obj_id,
                name = %e.name,
                x = pos.x,
                y = pos.y,
                "object is not on the plate"
            );
            continue;
        }
        targets.push(Target {
            id: TargetId(targets.len()),
            obj_id: e.obj_id,
            name: e.name.clone(),
            pos,
            weight: e.weight,
            kind: e.kind,
        });
    }
    targets
}

/// Give unweighted guide entries the header's `FOPSWEIGHT`. Returns how
/// many were changed.
pub fn weight_guides(entries: &mut [CatalogEntry], header: &FieldHeader) -> usize {
    let weight = header.guide_weight();
    let mut changed = 0;
    for e in entries.iter_mut().filter(|e| e.kind.is_guide() && e.weight == 0) {
        e.weight = weight;
        changed += 1;
    }
    changed
}

const DEFAULT_MIN_GUIDES: usize = 3;
const DEFAULT_GUIDE_WEIGHT: u32 = 1000;

/// Field header: free-form keywords with typed accessors for the ones the
/// placer reads.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldHeader(pub BTreeMap<String, String>);

impl FieldHeader {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str).filter(|v| !v.trim().is_empty())
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// `MINFOPS`: minimum number of assigned guide stars (default 3).
    pub fn min_guides(&self) -> usize {
        self.parsed("MINFOPS").unwrap_or(DEFAULT_MIN_GUIDES)
    }

    /// `FOPSWEIGHT`: weight given to guide stars added from a survey (default 1000).
    pub fn guide_weight(&self) -> u32 {
        self.parsed("FOPSWEIGHT").unwrap_or(DEFAULT_GUIDE_WEIGHT)
    }

    /// `CABLE`: science cable in use.
    pub fn cable(&self) -> Option<Cable> {
        self.get("CABLE").and_then(Cable::from_header)
    }

    fn parsed<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        let raw = self.get(key)?;
        match raw.trim().parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(key, value = raw, "could not parse header value, using default");
                None
            }
        }
    }
}

/// Deterministic key for a collision matrix: SHA-256 (hex) over the sorted
/// header, the instrument constants, the (fiber, active) flags, and the
/// projected targets in `TargetId` order. Assignment fields never enter.
///
/// Matrix rows are indexed by `TargetId`, so reordering the catalog or
/// moving any target on the plate yields a different key.
pub fn cache_key(
    header: &FieldHeader,
    targets: &[Target],
    fibers: &[Fiber],
    cfg: &InstrumentCfg,
) -> String {
    let targets: Vec<_> = targets
        .iter()
        .map(|t| {
            json!({
                "obj_id": t.obj_id,
                "name": t.name,
                "x": t.pos.x,
                "y": t.pos.y,
                "weight": t.weight,
                "kind": t.kind.code(),
            })
        })
        .collect();
    let mut flags: Vec<(u32, bool)> = fibers.iter().map(|f| (f.id.0, f.active)).collect();
    flags.sort_unstable();
    let doc = json!({
        "header": header.0,
        "instrument": cfg,
        "fibers": flags,
        "targets": targets,
    });
    let digest = Sha256::digest(doc.to_string().as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector2;

    struct Flat;
    impl SkyToPlate for Flat {
        fn sky_to_plate(&self, ra: f64, dec: f64) -> PlatePosition {
            PlatePosition {
                guide: Vector2::new(ra + 1.0, dec),
                science: Vector2::new(ra, dec),
            }
        }
    }

    fn entry(obj_id: u64, ra: f64, dec: f64, kind: TargetKind) -> CatalogEntry {
        CatalogEntry {
            obj_id,
            name: format!("obj{obj_id}"),
            ra,
            dec,
            weight: 10,
            kind,
            prior: None,
        }
    }

    #[test]
    fn projection_uses_path_by_kind_and_drops_off_plate() {
        let cfg = InstrumentCfg::default();
        let entries = vec![
            entry(7, 10.0, 0.0, TargetKind::Science),
            entry(8, 500.0, 0.0, TargetKind::Science),
            entry(9, 10.0, 0.0, TargetKind::Guide),
        ];
        let targets = project_catalog(&entries, &Flat, &cfg);
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].id, TargetId(0));
        assert_eq!(targets[1].id, TargetId(1));
        assert_eq!(targets[1].obj_id, 9);
        assert!((targets[0].pos.x - 10.0).abs() < 1e-12);
        assert!((targets[1].pos.x - 11.0).abs() < 1e-12);
    }

    #[test]
    fn header_accessors_fall_back_to_defaults() {
        let mut h = FieldHeader::default();
        assert_eq!(h.min_guides(), 3);
        assert_eq!(h.guide_weight(), 1000);
        assert_eq!(h.cable(), None);
        h.set("MINFOPS", "5");
        h.set("FOPSWEIGHT", "oops");
        h.set("CABLE", "blue");
        assert_eq!(h.min_guides(), 5);
        assert_eq!(h.guide_weight(), 1000);
        assert_eq!(h.cable(), Some(Cable::Blue));
    }

    #[test]
    fn unweighted_guides_take_header_weight() {
        let mut header = FieldHeader::default();
        header.set("FOPSWEIGHT", "750");
        let mut entries = vec![
            entry(1, 0.0, 0.0, TargetKind::Guide),
            entry(2, 0.0, 0.0, TargetKind::Guide),
            entry(3, 0.0, 0.0, TargetKind::Science),
        ];
        entries[0].weight = 0;
        entries[1].weight = 40;
        entries[2].weight = 0;
        assert_eq!(weight_guides(&mut entries, &header), 1);
        assert_eq!(entries.iter().map(|e| e.weight).collect::<Vec<_>>(), vec![750, 40, 0]);
    }

    #[test]
    fn cache_key_ignores_assignments() {
        let cfg = InstrumentCfg::default();
        let mut header = FieldHeader::default();
        header.set("FIELDNAME", "m67");
        let fibers = vec![Fiber::new(1, Cable::Red, &cfg), Fiber::new(2, Cable::Guide, &cfg)];
        let a = vec![
            entry(1, 100.0, 0.0, TargetKind::Science),
            entry(2, 120.0, 10.0, TargetKind::Guide),
        ];
        let mut b = a.clone();
        b[1].prior = Some(PriorAssignment {
            fiber: FiberId(2),
            pinned: true,
        });
        let ka = cache_key(&header, &project_catalog(&a, &Flat, &cfg), &fibers, &cfg);
        assert_eq!(ka.len(), 64);
        assert_eq!(ka, cache_key(&header, &project_catalog(&b, &Flat, &cfg), &fibers, &cfg));
    }

    #[test]
    fn cache_key_follows_everything_the_matrix_depends_on() {
        let cfg = InstrumentCfg::default();
        let mut header = FieldHeader::default();
        header.set("FIELDNAME", "m67");
        let fibers = vec![Fiber::new(1, Cable::Red, &cfg), Fiber::new(2, Cable::Guide, &cfg)];
        let entries = vec![
            entry(1, 100.0, 0.0, TargetKind::Science),
            entry(2, 120.0, 10.0, TargetKind::Guide),
            entry(3, 140.0, -5.0, TargetKind::Science),
        ];
        let targets = project_catalog(&entries, &Flat, &cfg);
        let ka = cache_key(&header, &targets, &fibers, &cfg);

        // same objects, different TargetId order
        let reordered = vec![entries[2].clone(), entries[0].clone(), entries[1].clone()];
        let kr = cache_key(&header, &project_catalog(&reordered, &Flat, &cfg), &fibers, &cfg);
        assert_ne!(ka, kr);

        // plate positions, e.g. a different projection scale
        let mut moved = targets.clone();
        moved[0].pos *= 1.01;
        assert_ne!(ka, cache_key(&header, &moved, &fibers, &cfg));

        let mut c = targets.clone();
        c[0].weight = 11;
        assert_ne!(ka, cache_key(&header, &c, &fibers, &cfg));

        let wide = InstrumentCfg {
            button_radius: cfg.button_radius * 2.0,
            ..cfg.clone()
        };
        assert_ne!(ka, cache_key(&header, &targets, &fibers, &wide));

        let mut inactive = fibers.clone();
        inactive[0].active = false;
        assert_ne!(ka, cache_key(&header, &targets, &inactive, &cfg));

        header.set("PA", "90");
        assert_ne!(ka, cache_key(&header, &targets, &fibers, &cfg));
    }
}
