use fiberplace::api::{FieldHeader, PlatePosition, SkyToPlate};
use fiberplace::Vec2;

/// Gnomonic projection about the field centre, scaled to millimetres.
/// Both optical paths share one mapping.
#[derive(Clone, Copy, Debug)]
pub struct TangentPlane {
    ra0: f64,
    dec0: f64,
    /// Millimetres per degree at the tangent point.
    scale: f64,
}

impl TangentPlane {
    pub fn new(ra0_deg: f64, dec0_deg: f64, scale: f64) -> Self {
        Self {
            ra0: ra0_deg.to_radians(),
            dec0: dec0_deg.to_radians(),
            scale,
        }
    }

    /// Centre from header `RA`/`DEC` (degrees).
    pub fn from_header(header: &FieldHeader, scale: f64) -> Option<Self> {
        let ra = header.get("RA")?.trim().parse().ok()?;
        let dec = header.get("DEC")?.trim().parse().ok()?;
        Some(Self::new(ra, dec, scale))
    }
}

impl SkyToPlate for TangentPlane {
    fn sky_to_plate(&self, ra: f64, dec: f64) -> PlatePosition {
        let (ra, dec) = (ra.to_radians(), dec.to_radians());
        let dra = ra - self.ra0;
        let cos_c = self.dec0.sin() * dec.sin() + self.dec0.cos() * dec.cos() * dra.cos();
        let xi = dec.cos() * dra.sin() / cos_c;
        let eta = (self.dec0.cos() * dec.sin() - self.dec0.sin() * dec.cos() * dra.cos()) / cos_c;
        // east to the left on the sky
        let p = Vec2::new(-xi, eta).map(f64::to_degrees) * self.scale;
        PlatePosition {
            guide: p,
            science: p,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centre_maps_to_origin_and_offsets_scale() {
        let tp = TangentPlane::new(120.0, -30.0, 100.0);
        let c = tp.sky_to_plate(120.0, -30.0);
        assert!(c.science.norm() < 1e-9);
        let n = tp.sky_to_plate(120.0, -29.9);
        assert!((n.science.y - 10.0).abs() < 0.01);
        assert!(n.science.x.abs() < 1e-9);
        let e = tp.sky_to_plate(120.1, -30.0);
        assert!(e.science.x < 0.0);
    }

    #[test]
    fn header_centre() {
        let mut h = FieldHeader::default();
        assert!(TangentPlane::from_header(&h, 100.0).is_none());
        h.set("RA", "10.5");
        h.set("DEC", "-45");
        assert!(TangentPlane::from_header(&h, 100.0).is_some());
    }
}
