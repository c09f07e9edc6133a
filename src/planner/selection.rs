//! Station selection strategies
//!
//! Each strategy turns lane visit counts into an ordered list of distinct
//! candidate lanes, at most `k` long. Randomized strategies take the caller's
//! RNG so a fixed seed reproduces the same selection.

use anyhow::{bail, Result};
use log::{debug, info, warn};
use rand::seq::IndexedRandom;
use rand::Rng;
use std::collections::HashSet;
use std::fmt;

use super::distance::DistanceEngine;
use super::types::LaneId;
use super::visits::LaneVisitStatistics;

/// Ordered candidate lanes produced by one selector
pub type StationCandidateSet = Vec<LaneId>;

/// Which selection strategy to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SelectionMethod {
    Random,
    Greedy,
    Grasp,
}

impl fmt::Display for SelectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SelectionMethod::Random => "random",
            SelectionMethod::Greedy => "greedy",
            SelectionMethod::Grasp => "grasp",
        })
    }
}

/// Tunables of the GRASP search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraspParams {
    /// Number of randomized restarts
    pub restarts: usize,
    /// Network distance under which a candidate is excluded near a chosen station
    pub exclusion_radius: f64,
    /// Candidate list holds `k * rcl_factor` lanes
    pub rcl_factor: usize,
}

impl Default for GraspParams {
    fn default() -> Self {
        Self {
            restarts: 10,
            exclusion_radius: 500.0,
            rcl_factor: 5,
        }
    }
}

/// Runs the chosen strategy and logs the outcome
///
/// A result shorter than `k` is not an error; callers compare the length
/// against the request.
pub fn select_stations<R: Rng + ?Sized>(
    method: SelectionMethod,
    visits: &LaneVisitStatistics,
    k: usize,
    rng: &mut R,
    distance: &mut DistanceEngine,
    params: &GraspParams,
) -> Result<StationCandidateSet> {
    info!(
        "Selecting {} stations with {} from {} visited lanes",
        k,
        method,
        visits.len()
    );

    let selected = match method {
        SelectionMethod::Random => select_random(visits, k, rng)?,
        SelectionMethod::Greedy => select_greedy(visits, k),
        SelectionMethod::Grasp => select_grasp(visits, k, rng, distance, params),
    };

    if selected.len() < k {
        warn!(
            "{} selected only {} of {} requested stations",
            method,
            selected.len(),
            k
        );
    }
    info!("Selected lanes ({}): {:?}", method, selected);
    Ok(selected)
}

/// Uniform sample of `k` distinct visited lanes
///
/// Fails when fewer than `k` lanes were visited.
pub fn select_random<R: Rng + ?Sized>(
    visits: &LaneVisitStatistics,
    k: usize,
    rng: &mut R,
) -> Result<StationCandidateSet> {
    let lanes: Vec<&LaneId> = visits.lanes().collect();
    if k > lanes.len() {
        bail!(
            "Cannot sample {} stations from only {} visited lanes",
            k,
            lanes.len()
        );
    }

    Ok(lanes
        .choose_multiple(rng, k)
        .map(|lane| (*lane).clone())
        .collect())
}

/// Top `k` lanes by visit count; ties keep first-seen order
pub fn select_greedy(visits: &LaneVisitStatistics, k: usize) -> StationCandidateSet {
    ranked_lanes(visits).into_iter().take(k).cloned().collect()
}

/// Multi-restart randomized search with spatial exclusion
///
/// Every restart seeds the solution with the most visited candidate, then
/// keeps adding random candidates that are not within the exclusion radius
/// of an already chosen lane. The restart with the highest total visit count
/// wins; the first one found wins ties.
pub fn select_grasp<R: Rng + ?Sized>(
    visits: &LaneVisitStatistics,
    k: usize,
    rng: &mut R,
    distance: &mut DistanceEngine,
    params: &GraspParams,
) -> StationCandidateSet {
    if k == 0 {
        return Vec::new();
    }

    let rcl: Vec<LaneId> = ranked_lanes(visits)
        .into_iter()
        .take(k.saturating_mul(params.rcl_factor))
        .cloned()
        .collect();
    debug!("GRASP candidate list: {:?}", rcl);

    if rcl.is_empty() {
        debug!("GRASP candidate list is empty, nothing to select");
        return Vec::new();
    }

    let mut best: Option<(u64, StationCandidateSet)> = None;
    for restart in 0..params.restarts {
        let solution = grasp_restart(&rcl, k, rng, distance, params.exclusion_radius);
        let score: u64 = solution.iter().map(|lane| visits.count(lane)).sum();
        debug!(
            "GRASP restart {}: {} lanes, score {}",
            restart,
            solution.len(),
            score
        );

        if best.as_ref().is_none_or(|(best_score, _)| score > *best_score) {
            best = Some((score, solution));
        }
    }

    best.map(|(_, solution)| solution).unwrap_or_default()
}

fn grasp_restart<R: Rng + ?Sized>(
    rcl: &[LaneId],
    k: usize,
    rng: &mut R,
    distance: &mut DistanceEngine,
    radius: f64,
) -> StationCandidateSet {
    let mut solution = Vec::with_capacity(k);
    let mut excluded: HashSet<&LaneId> = HashSet::new();

    let seed = &rcl[0];
    solution.push(seed.clone());
    excluded.insert(seed);
    exclude_near(seed, rcl, &mut excluded, distance, radius);

    while solution.len() < k {
        let open: Vec<&LaneId> = rcl.iter().filter(|lane| !excluded.contains(lane)).collect();
        let Some(&chosen) = open.choose(rng) else {
            debug!("No open candidates left after {} lanes", solution.len());
            break;
        };

        solution.push(chosen.clone());
        excluded.insert(chosen);
        exclude_near(chosen, rcl, &mut excluded, distance, radius);
    }

    solution
}

fn exclude_near<'r>(
    chosen: &LaneId,
    rcl: &'r [LaneId],
    excluded: &mut HashSet<&'r LaneId>,
    distance: &mut DistanceEngine,
    radius: f64,
) {
    for lane in rcl {
        if lane != chosen && distance.lanes_within(chosen, lane, radius) {
            excluded.insert(lane);
        }
    }
}

/// Visited lanes sorted by count, descending, stable on ties
fn ranked_lanes(visits: &LaneVisitStatistics) -> Vec<&LaneId> {
    let mut ranked: Vec<(&LaneId, u64)> = visits.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.into_iter().map(|(lane, _)| lane).collect()
}
