use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use fiberplace::api::*;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::SubscriberBuilder;

mod astrometry;
mod cache;
mod provenance;

use astrometry::TangentPlane;
use cache::DirStore;
use provenance::{write_sidecar, Payload};

#[derive(Parser)]
#[command(name = "fiberplace")]
#[command(about = "Fiber assignment for a multi-object spectrograph plate")]
struct Cmd {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Assign fibers for a field and write the configuration
    Place(PlaceArgs),
    /// Print the collision-matrix cache key of a field
    Key {
        #[arg(long)]
        field: PathBuf,
        #[arg(long)]
        fibers: PathBuf,
        #[arg(long)]
        instrument: Option<PathBuf>,
        /// Plate scale, mm per degree
        #[arg(long, default_value_t = 100.0)]
        scale: f64,
    },
    /// Print a small provenance JSON block
    Report,
}

#[derive(Deserialize)]
struct FieldDoc {
    #[serde(default)]
    header: FieldHeader,
    catalog: Vec<CatalogEntry>,
}

#[derive(Serialize)]
struct AssignmentRow {
    fiber: u32,
    slit: Option<i32>,
    obj_id: u64,
    name: String,
    kind: TargetKind,
    weight: u32,
    pinned: bool,
    x: f64,
    y: f64,
}

#[derive(Serialize)]
struct PlacementDoc {
    success: bool,
    score: u64,
    guide_stars: usize,
    min_guides: usize,
    cache_key: String,
    assignments: Vec<AssignmentRow>,
}

/// Logs progress milestones and the latest score.
struct LogObserver {
    stage: &'static str,
}

impl Observer for LogObserver {
    fn on_progress(&mut self, percent: u8) {
        tracing::info!(stage = self.stage, percent, "progress");
    }

    fn on_score_update(&mut self, score: u64) {
        tracing::debug!(stage = self.stage, score, "score");
    }
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Place(args) => place(args),
        Action::Key {
            field,
            fibers,
            instrument,
            scale,
        } => key(field, fibers, instrument, scale),
        Action::Report => report(),
    }
}

#[derive(Args)]
struct PlaceArgs {
    /// Field document: {"header": {..}, "catalog": [..]}
    #[arg(long)]
    field: PathBuf,
    /// Concentricity document
    #[arg(long)]
    fibers: PathBuf,
    #[arg(long)]
    out: PathBuf,
    /// Instrument constants (JSON); missing keys take defaults
    #[arg(long)]
    instrument: Option<PathBuf>,
    /// Annealing schedules (JSON); missing keys take defaults
    #[arg(long)]
    anneal: Option<PathBuf>,
    /// Directory for cached collision matrices
    #[arg(long)]
    cache_dir: Option<PathBuf>,
    #[arg(long, default_value_t = 20_000)]
    steps: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long)]
    workers: Option<usize>,
    /// Plate scale, mm per degree
    #[arg(long, default_value_t = 100.0)]
    scale: f64,
    /// Ignore assignments carried in the catalog
    #[arg(long)]
    fresh: bool,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn read_optional<T: serde::de::DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    path.map_or_else(|| Ok(T::default()), read_json)
}

/// Field, instrument and fibers with the header's cable activated and
/// unweighted guide stars given `FOPSWEIGHT`.
fn load_inputs(
    field: &Path,
    fibers: &Path,
    instrument: Option<&Path>,
) -> Result<(FieldDoc, InstrumentCfg, Vec<Fiber>)> {
    let mut doc: FieldDoc = read_json(field)?;
    let weighted = weight_guides(&mut doc.catalog, &doc.header);
    if weighted > 0 {
        tracing::info!(weighted, weight = doc.header.guide_weight(), "unweighted guide stars");
    }
    let cfg: InstrumentCfg = read_optional(instrument)?;
    let raw = fs::read_to_string(fibers).with_context(|| format!("reading {}", fibers.display()))?;
    let mut all = load_fibers(&raw, &cfg).with_context(|| format!("parsing {}", fibers.display()))?;
    let cable = doc.header.cable().unwrap_or_else(|| {
        tracing::warn!("header has no usable CABLE, using the red cable");
        Cable::Red
    });
    activate(&mut all, cable);
    Ok((doc, cfg, all))
}

/// Plate targets of the field, projected about the header's RA/DEC.
fn project(doc: &FieldDoc, cfg: &InstrumentCfg, scale: f64) -> Result<Vec<Target>> {
    let sky = TangentPlane::from_header(&doc.header, scale)
        .context("field header needs numeric RA and DEC")?;
    Ok(project_catalog(&doc.catalog, &sky, cfg))
}

fn place(args: PlaceArgs) -> Result<()> {
    let (doc, cfg, fibers) = load_inputs(&args.field, &args.fibers, args.instrument.as_deref())?;
    let anneal: AnnealCfg = read_optional(args.anneal.as_deref())?;
    let targets = project(&doc, &cfg, args.scale)?;
    let min_guides = doc.header.min_guides();
    tracing::info!(
        targets = targets.len(),
        fibers = fibers.iter().filter(|f| f.active).count(),
        min_guides,
        "field loaded"
    );

    let builder = args
        .workers
        .map(MatrixBuilder::with_workers)
        .unwrap_or_default();
    let key = cache_key(&doc.header, &targets, &fibers, &cfg);
    let mut build_obs = LogObserver { stage: "matrix" };
    let mut memory = MemoryStore::default();
    let mut on_disk = args.cache_dir.as_ref().map(DirStore::new);
    let store: &mut dyn MatrixStore = match on_disk.as_mut() {
        Some(s) => s,
        None => &mut memory,
    };
    let (field, source) =
        Field::build_cached(&cfg, &fibers, targets, &builder, store, &key, &mut build_obs);
    tracing::info!(?source, key = %key, "collision matrix ready");

    let mut config = field.new_configuration();
    if !args.fresh {
        let applied = apply_prior_assignments(&field, &mut config, &doc.catalog);
        tracing::info!(applied, "prior assignments");
    }

    let mut anneal_obs = LogObserver { stage: "anneal" };
    let outcome = Placer::new(&field, min_guides, StdRng::seed_from_u64(args.seed))
        .with_cfg(anneal)
        .optimize(&mut config, args.steps, &mut anneal_obs);

    let result = placement_doc(&field, &outcome, min_guides, key);
    if let Some(parent) = args.out.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&args.out, serde_json::to_vec_pretty(&result)?)
        .with_context(|| format!("writing {}", args.out.display()))?;
    let payload = Payload::new(json!({
        "steps": args.steps,
        "seed": args.seed,
        "workers": builder.workers(),
        "scale": args.scale,
        "fresh": args.fresh,
        "anneal": anneal,
        "instrument": cfg,
    }))
    .with_input(&args.field)
    .with_input(&args.fibers);
    write_sidecar(&args.out, payload)?;

    if !outcome.success {
        bail!(
            "could not reach {min_guides} guide stars; wrote the unchanged configuration to {}",
            args.out.display()
        );
    }
    tracing::info!(score = result.score, guide_stars = result.guide_stars, "placement written");
    Ok(())
}

fn placement_doc(field: &Field, outcome: &Outcome, min_guides: usize, key: String) -> PlacementDoc {
    let fibers = field.footprints().map(|t| t.fibers());
    let assignments = outcome
        .best
        .assigned()
        .map(|(s, t)| {
            let target = field.target(t);
            let slot = outcome.best.get(s);
            AssignmentRow {
                fiber: field.slots()[s].fiber.0,
                slit: fibers.and_then(|fs| fs[s].slit),
                obj_id: target.obj_id,
                name: target.name.clone(),
                kind: target.kind,
                weight: slot.weight,
                pinned: slot.pinned,
                x: target.pos.x,
                y: target.pos.y,
            }
        })
        .collect();
    PlacementDoc {
        success: outcome.success,
        score: outcome.best.score(),
        guide_stars: outcome.best.guide_count(),
        min_guides,
        cache_key: key,
        assignments,
    }
}

fn key(field: PathBuf, fibers: PathBuf, instrument: Option<PathBuf>, scale: f64) -> Result<()> {
    let (doc, cfg, fibers) = load_inputs(&field, &fibers, instrument.as_deref())?;
    let targets = project(&doc, &cfg, scale)?;
    println!("{}", cache_key(&doc.header, &targets, &fibers, &cfg));
    Ok(())
}

fn report() -> Result<()> {
    let obj = json!({
        "code_rev": provenance::current_git_rev(),
        "fiberplace": fiberplace::VERSION,
        "defaults": {
            "instrument": InstrumentCfg::default(),
            "anneal": AnnealCfg::default(),
            "workers": default_workers(),
        },
    });
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::tempdir;

    const FIBERS: &str = r#"{
        "modified": "2024-05-01",
        "0": {"slit": 1, "cable": "R", "status": "A"},
        "1": {"slit": 2, "cable": "R", "status": "A"},
        "2": {"slit": 3, "cable": "B", "status": "A"},
        "5": {"cable": "F", "status": "A"}
    }"#;

    const FIELD: &str = r#"{
        "header": {"RA": "0", "DEC": "0", "CABLE": "RED", "MINFOPS": "1"},
        "catalog": [
            {"obj_id": 1, "name": "a", "ra": -1.0, "dec": 0.0, "weight": 10, "kind": "science"},
            {"obj_id": 2, "name": "g", "ra": -1.5, "dec": 0.1, "weight": 1000, "kind": "guide"},
            {"obj_id": 3, "name": "b", "ra": -2.0, "dec": -0.05, "weight": 20, "kind": "science",
             "prior": {"fiber": 0, "pinned": true}},
            {"obj_id": 4, "name": "far", "ra": 10.0, "dec": 0.0, "weight": 99, "kind": "sky"}
        ]
    }"#;

    fn args(dir: &Path) -> PlaceArgs {
        let field = dir.join("field.json");
        let fibers = dir.join("fibers.json");
        fs::write(&field, FIELD).unwrap();
        fs::write(&fibers, FIBERS).unwrap();
        PlaceArgs {
            field,
            fibers,
            out: dir.join("out/placement.json"),
            instrument: None,
            anneal: None,
            cache_dir: Some(dir.join("cache")),
            steps: 300,
            seed: 1,
            workers: Some(1),
            scale: 100.0,
            fresh: false,
        }
    }

    #[test]
    fn place_writes_configuration_sidecar_and_cache() {
        let dir = tempdir().unwrap();
        place(args(dir.path())).unwrap();

        let out: Value =
            serde_json::from_slice(&fs::read(dir.path().join("out/placement.json")).unwrap())
                .unwrap();
        assert_eq!(out["success"], true);
        assert_eq!(out["guide_stars"], 1);
        assert_eq!(out["score"], 1030);
        let rows = out["assignments"].as_array().unwrap();
        assert_eq!(rows.len(), 3);
        let pinned: Vec<&Value> = rows.iter().filter(|r| r["pinned"] == true).collect();
        assert_eq!(pinned.len(), 1);
        assert_eq!(pinned[0]["fiber"], 0);
        assert_eq!(pinned[0]["obj_id"], 3);
        assert!(dir.path().join("out/placement.provenance.json").exists());

        let cached: Vec<_> = fs::read_dir(dir.path().join("cache")).unwrap().collect();
        assert_eq!(cached.len(), 1);

        // second run reads the cache and reproduces the result
        place(args(dir.path())).unwrap();
        let again: Value =
            serde_json::from_slice(&fs::read(dir.path().join("out/placement.json")).unwrap())
                .unwrap();
        assert_eq!(again, out);
    }

    #[test]
    fn plate_scale_and_instrument_change_the_cache_key() {
        let dir = tempdir().unwrap();
        let cache = dir.path().join("cache");
        let entries = || fs::read_dir(&cache).unwrap().count();
        place(args(dir.path())).unwrap();
        assert_eq!(entries(), 1);

        let mut scaled = args(dir.path());
        scaled.scale = 101.0;
        place(scaled).unwrap();
        assert_eq!(entries(), 2);

        let mut narrow = args(dir.path());
        let cfg = dir.path().join("instrument.json");
        fs::write(&cfg, r#"{"tube_half_width": 0.4}"#).unwrap();
        narrow.instrument = Some(cfg);
        place(narrow).unwrap();
        assert_eq!(entries(), 3);
    }

    #[test]
    fn place_fails_without_enough_guides() {
        let dir = tempdir().unwrap();
        let mut a = args(dir.path());
        let strict = FIELD.replace(r#""MINFOPS": "1""#, r#""MINFOPS": "2""#);
        fs::write(&a.field, strict).unwrap();
        a.cache_dir = None;
        let err = place(a).unwrap_err();
        assert!(err.to_string().contains("guide stars"));
        let out: Value =
            serde_json::from_slice(&fs::read(dir.path().join("out/placement.json")).unwrap())
                .unwrap();
        assert_eq!(out["success"], false);
    }
}
