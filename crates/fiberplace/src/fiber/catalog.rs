//! Fiber catalog from a concentricity document.
//!
//! Input is a JSON object keyed by fiber number, plus an optional
//! `"modified"` stamp that is ignored:
//!
//! ```json
//! { "modified": "2024-01-01",
//!   "12": { "slit": 40, "cable": "R", "status": "A" },
//!   "13": { "slit": "41", "cable": "F", "status": "A" } }
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use super::types::{Cable, Fiber, InstrumentCfg};

#[derive(Debug)]
pub enum FiberCatalogError {
    Json(serde_json::Error),
    BadFiberId(String),
    UnknownCable { fiber: String, code: String },
}

impl fmt::Display for FiberCatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FiberCatalogError::Json(e) => write!(f, "could not parse concentricities: {e}"),
            FiberCatalogError::BadFiberId(id) => write!(f, "bad fiber id {id:?}"),
            FiberCatalogError::UnknownCable { fiber, code } => {
                write!(f, "fiber {fiber}: unknown cable {code:?}")
            }
        }
    }
}

impl std::error::Error for FiberCatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FiberCatalogError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for FiberCatalogError {
    fn from(e: serde_json::Error) -> Self {
        FiberCatalogError::Json(e)
    }
}

#[derive(Deserialize)]
struct RawFiber {
    #[serde(default)]
    slit: Value,
    cable: String,
    status: String,
}

fn slit_number(v: &Value) -> Option<i32> {
    match v {
        Value::Number(n) => n.as_i64().and_then(|x| i32::try_from(x).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse all fibers (sorted by fiber number). Every fiber starts inactive;
/// call `activate` to select the science cable.
pub fn load_fibers(json: &str, cfg: &InstrumentCfg) -> Result<Vec<Fiber>, FiberCatalogError> {
    let doc: BTreeMap<String, Value> = serde_json::from_str(json)?;
    let mut fibers = Vec::with_capacity(doc.len());
    for (key, value) in doc {
        if key == "modified" {
            continue;
        }
        let id: u32 = key
            .trim()
            .parse()
            .map_err(|_| FiberCatalogError::BadFiberId(key.clone()))?;
        let raw: RawFiber = serde_json::from_value(value)?;
        let cable = Cable::from_code(&raw.cable).ok_or_else(|| FiberCatalogError::UnknownCable {
            fiber: key.clone(),
            code: raw.cable.clone(),
        })?;
        let mut fiber = Fiber::new(id, cable, cfg);
        fiber.slit = if cable.is_guide() {
            None
        } else {
            slit_number(&raw.slit)
        };
        fiber.operational = raw.status.trim() == "A";
        fiber.active = false;
        fibers.push(fiber);
    }
    fibers.sort_by_key(|f| f.id);
    Ok(fibers)
}

/// Activate operational fibers of the guide bundle and of `science`.
pub fn activate(fibers: &mut [Fiber], science: Cable) {
    for f in fibers.iter_mut() {
        f.active = f.operational && (f.cable.is_guide() || f.cable == science);
    }
}
