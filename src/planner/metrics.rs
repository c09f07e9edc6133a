//! Run-level metrics and the cumulative results table

use anyhow::{Context, Result};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::controller::VehicleChargeRecord;
use super::selection::SelectionMethod;

static TELEPORTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Teleports:\s+(\d+)").expect("Invalid teleport pattern"));

static ELECTRIC_PERCENTAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"rotas_(\d+)").expect("Invalid route name pattern"));

/// Summary of one validation run
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RunMetrics {
    /// Wall-clock duration of the pass, in seconds
    pub execution_time: f64,
    pub teleport_count: u64,
    /// Mean decision-to-arrival time over vehicles that reached a station
    pub mean_queue_time: f64,
    /// Mean network distance to the chosen station, in metres
    pub mean_distance_to_station: f64,
}

impl RunMetrics {
    /// Reduces the charge records of a run plus the engine-reported teleports
    pub fn aggregate(records: &[VehicleChargeRecord], execution_time: Duration, teleport_count: u64) -> Self {
        let queue_times: Vec<f64> = records.iter().filter_map(|record| record.queue_time).collect();
        let distances: Vec<f64> = records
            .iter()
            .map(|record| record.distance_to_station)
            .filter(|distance| distance.is_finite())
            .collect();

        Self {
            execution_time: execution_time.as_secs_f64(),
            teleport_count,
            mean_queue_time: mean(&queue_times),
            mean_distance_to_station: mean(&distances),
        }
    }

    pub fn mean_distance_km(&self) -> f64 {
        self.mean_distance_to_station / 1000.0
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Teleport count reported in the engine's run log
///
/// A missing log or a log without the counter yields 0 with a warning.
pub fn parse_teleports(log_path: &Path) -> u64 {
    let log = match std::fs::read_to_string(log_path) {
        Ok(log) => log,
        Err(err) => {
            warn!("Run log {} not readable ({}), assuming 0 teleports", log_path.display(), err);
            return 0;
        }
    };

    match teleports_in(&log) {
        Some(count) => count,
        None => {
            warn!("No teleport count found in {}, assuming 0", log_path.display());
            0
        }
    }
}

/// First `Teleports: <n>` counter in a log text
pub fn teleports_in(log: &str) -> Option<u64> {
    TELEPORTS
        .captures(log)
        .and_then(|captures| captures.get(1))
        .and_then(|count| count.as_str().parse().ok())
}

/// Share of electric trips encoded in a route file name as `rotas_<n>`, or 0
pub fn electric_percentage_from_route(route_file: &str) -> u32 {
    ELECTRIC_PERCENTAGE
        .captures(route_file)
        .and_then(|captures| captures.get(1))
        .and_then(|percentage| percentage.as_str().parse().ok())
        .unwrap_or(0)
}

/// What identifies a validation run in the results table
#[derive(Debug, Clone, PartialEq)]
pub struct RunLabels {
    pub method: SelectionMethod,
    pub station_count: usize,
    pub recharge_minutes: f64,
    pub repetition: u32,
    pub route_file: PathBuf,
    pub layout_file: PathBuf,
}

/// One line of the cumulative results table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub heuristic: String,
    pub station_count: usize,
    pub electric_percentage: u32,
    pub recharge_minutes: f64,
    pub repetition_index: u32,
    pub mean_queue_time: f64,
    pub mean_distance_km: f64,
    pub teleport_count: u64,
    pub execution_time_seconds: f64,
    pub route_file_name: String,
    pub layout_file_name: String,
}

impl ResultRow {
    pub fn new(labels: &RunLabels, metrics: &RunMetrics) -> Self {
        let route_file_name = file_name(&labels.route_file);
        Self {
            heuristic: labels.method.to_string(),
            station_count: labels.station_count,
            electric_percentage: electric_percentage_from_route(&labels.route_file.to_string_lossy()),
            recharge_minutes: labels.recharge_minutes,
            repetition_index: labels.repetition,
            mean_queue_time: round_to(metrics.mean_queue_time, 2),
            mean_distance_km: round_to(metrics.mean_distance_km(), 3),
            teleport_count: metrics.teleport_count,
            execution_time_seconds: round_to(metrics.execution_time, 3),
            route_file_name,
            layout_file_name: file_name(&labels.layout_file),
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Appends a row, writing the header only when the table does not exist yet
pub fn append_result_row(path: &Path, row: &ResultRow) -> Result<()> {
    let exists = path.is_file();
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Could not create directory {}", parent.display()))?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Could not open results table {}", path.display()))?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(!exists)
        .from_writer(file);
    writer
        .serialize(row)
        .with_context(|| format!("Could not write result row to {}", path.display()))?;
    writer.flush()?;

    info!("Results appended to {}", path.display());
    Ok(())
}
