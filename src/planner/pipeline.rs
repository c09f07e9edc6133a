//! The two-pass workflow: explore, select and lay out stations, validate

use anyhow::{bail, Result};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};

use super::context::NetworkContext;
use super::controller::{ChargeController, ControllerConfig};
use super::distance::DistanceEngine;
use super::engine::TrafficEngine;
use super::layout::StationLayout;
use super::metrics::{parse_teleports, RunMetrics};
use super::runner::run_pass;
use super::selection::{select_stations, GraspParams, SelectionMethod, StationCandidateSet};
use super::types::VehicleId;
use super::visits::LaneVisitStatistics;

/// Parameters of the selection step
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    pub method: SelectionMethod,
    pub station_count: usize,
    pub capacity: u32,
    pub seed: u64,
    pub grasp: GraspParams,
    pub out_dir: PathBuf,
    /// Route file base name, used to name the layout file
    pub route_base: String,
}

impl PlanRequest {
    /// `<method>_<routeBase>_er<k>`
    pub fn layout_base_name(&self) -> String {
        format!("{}_{}_er{}", self.method, self.route_base, self.station_count)
    }
}

/// Result of the selection step
#[derive(Debug, Clone)]
pub struct PlannedLayout {
    pub candidates: StationCandidateSet,
    pub layout: StationLayout,
    pub path: PathBuf,
}

/// Exploration pass: lane visit counts of the designated vehicles
pub fn explore<E: TrafficEngine + ?Sized>(
    engine: &mut E,
    context: &NetworkContext,
    low_energy: Vec<VehicleId>,
) -> Result<LaneVisitStatistics> {
    let controller = ChargeController::new(ControllerConfig::exploration(), low_energy);
    let mut distance = DistanceEngine::new(context);
    let outcome = run_pass(engine, controller, &mut distance)?;
    Ok(outcome.visits)
}

/// Selects candidate lanes, builds the stations and writes the layout file
pub fn plan_layout(
    context: &NetworkContext,
    visits: &LaneVisitStatistics,
    request: &PlanRequest,
) -> Result<PlannedLayout> {
    let mut rng = StdRng::seed_from_u64(request.seed);
    let mut distance = DistanceEngine::new(context);

    let candidates = select_stations(
        request.method,
        visits,
        request.station_count,
        &mut rng,
        &mut distance,
        &request.grasp,
    )?;

    let layout = StationLayout::build(&candidates, context.index(), request.capacity);
    let path = layout.persist(&request.out_dir, &request.layout_base_name())?;

    Ok(PlannedLayout {
        candidates,
        layout,
        path,
    })
}

/// The validation pass cannot run without a station layout
pub fn require_layout(layout: Option<&Path>) -> Result<&Path> {
    match layout {
        None => bail!("A station layout file (.add.xml) is required for the validation pass"),
        Some(path) if !path.is_file() => bail!(
            "Station layout file {} does not exist; run the selection step first",
            path.display()
        ),
        Some(path) => Ok(path),
    }
}

/// Validation pass: route low-energy vehicles to the stations and measure the run
///
/// The engine must already have the layout loaded; `layout` is only checked
/// for presence. Teleports are read from `run_log` once the pass is over.
pub fn validate<E: TrafficEngine + ?Sized>(
    engine: &mut E,
    context: &NetworkContext,
    low_energy: Vec<VehicleId>,
    layout: Option<&Path>,
    recharge_minutes: f64,
    run_log: &Path,
) -> Result<RunMetrics> {
    let layout = require_layout(layout)?;
    info!("Validating station layout {}", layout.display());

    let controller = ChargeController::new(ControllerConfig::validation(recharge_minutes), low_energy);
    let mut distance = DistanceEngine::new(context);
    let outcome = run_pass(engine, controller, &mut distance)?;

    let metrics = RunMetrics::aggregate(
        &outcome.records,
        outcome.execution_time,
        parse_teleports(run_log),
    );
    info!(
        "Validation metrics: mean queue {:.2}s, mean distance {:.3}km, {} teleports",
        metrics.mean_queue_time,
        metrics.mean_distance_km(),
        metrics.teleport_count
    );
    Ok(metrics)
}
