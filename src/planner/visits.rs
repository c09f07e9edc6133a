//! Lane visit counts gathered during the exploration pass

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::types::{LaneId, VehicleId};

/// Persisted form of a single lane count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LaneVisit {
    lane: LaneId,
    visits: u64,
}

/// Lane id to visit count, iterated in first-seen order
#[derive(Debug, Clone, Default)]
pub struct LaneVisitStatistics {
    counts: Vec<(LaneId, u64)>,
    positions: HashMap<LaneId, usize>,
    /// Last tick each vehicle was counted in, so a re-delivered tick is not counted twice
    last_counted_tick: HashMap<VehicleId, u64>,
}

impl LaneVisitStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one vehicle-step on a lane
    ///
    /// Internal lanes are ignored, as is a second report for the same
    /// vehicle within the same tick. Returns whether the visit was counted.
    pub fn record(&mut self, tick: u64, vehicle: &VehicleId, lane: &LaneId) -> bool {
        if lane.as_str().is_empty() || lane.is_internal() {
            return false;
        }
        if self.last_counted_tick.get(vehicle) == Some(&tick) {
            return false;
        }
        self.last_counted_tick.insert(vehicle.clone(), tick);
        self.increment(lane);
        true
    }

    /// Adds one visit to a lane
    pub fn increment(&mut self, lane: &LaneId) {
        self.add(lane, 1);
    }

    fn add(&mut self, lane: &LaneId, visits: u64) {
        match self.positions.get(lane) {
            Some(position) => self.counts[*position].1 += visits,
            None => {
                self.positions.insert(lane.clone(), self.counts.len());
                self.counts.push((lane.clone(), visits));
            }
        }
    }

    pub fn count(&self, lane: &LaneId) -> u64 {
        self.positions
            .get(lane)
            .map(|position| self.counts[*position].1)
            .unwrap_or(0)
    }

    /// Visited lanes with their counts, in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&LaneId, u64)> {
        self.counts.iter().map(|(lane, visits)| (lane, *visits))
    }

    /// Visited lanes in first-seen order
    pub fn lanes(&self) -> impl Iterator<Item = &LaneId> {
        self.counts.iter().map(|(lane, _)| lane)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total_visits(&self) -> u64 {
        self.counts.iter().map(|(_, visits)| visits).sum()
    }

    /// Writes the counts as JSON, preserving order
    pub fn save(&self, path: &Path) -> Result<()> {
        let entries: Vec<LaneVisit> = self
            .counts
            .iter()
            .map(|(lane, visits)| LaneVisit {
                lane: lane.clone(),
                visits: *visits,
            })
            .collect();

        let file = std::fs::File::create(path)
            .with_context(|| format!("Could not create visits file {}", path.display()))?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), &entries)
            .with_context(|| format!("Could not write visits file {}", path.display()))?;
        Ok(())
    }

    /// Reads counts previously written by [`LaneVisitStatistics::save`]
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Could not open visits file {}", path.display()))?;
        let entries: Vec<LaneVisit> = serde_json::from_reader(std::io::BufReader::new(file))
            .with_context(|| format!("Could not parse visits file {}", path.display()))?;

        Ok(entries
            .into_iter()
            .map(|entry| (entry.lane, entry.visits))
            .collect())
    }
}

impl FromIterator<(LaneId, u64)> for LaneVisitStatistics {
    fn from_iter<I: IntoIterator<Item = (LaneId, u64)>>(iter: I) -> Self {
        let mut statistics = Self::new();
        for (lane, visits) in iter {
            statistics.add(&lane, visits);
        }
        statistics
    }
}
