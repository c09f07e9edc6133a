//! Network distance between lanes and edges
//!
//! The distance from A to B is the shortest path from the end junction of A's
//! edge to the start junction of B's edge. It is directional. Every topology
//! gap (unknown lane, edge without endpoints, junction outside the graph, no
//! path) yields `f64::INFINITY` rather than an error.
//!
//! Results are memoized for the lifetime of the engine. The context is borrowed
//! immutably, so cached entries can never go stale while the engine exists.

use log::debug;
use std::collections::HashMap;

use super::context::NetworkContext;
use super::types::{EdgeId, LaneId};

/// Default bound on cached entries per cache before it is cleared
pub const DEFAULT_CACHE_CAPACITY: usize = 1 << 20;

pub struct DistanceEngine<'a> {
    context: &'a NetworkContext,
    lane_cache: HashMap<(LaneId, LaneId), f64>,
    edge_cache: HashMap<(EdgeId, EdgeId), f64>,
    capacity: usize,
}

impl<'a> DistanceEngine<'a> {
    pub fn new(context: &'a NetworkContext) -> Self {
        Self::with_capacity(context, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(context: &'a NetworkContext, capacity: usize) -> Self {
        Self {
            context,
            lane_cache: HashMap::new(),
            edge_cache: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn context(&self) -> &'a NetworkContext {
        self.context
    }

    /// Network distance from lane `from` to lane `to`
    pub fn lane_distance(&mut self, from: &LaneId, to: &LaneId) -> f64 {
        let key = (from.clone(), to.clone());
        if let Some(distance) = self.lane_cache.get(&key) {
            return *distance;
        }

        let index = self.context.index();
        let distance = match (index.edge_of(from), index.edge_of(to)) {
            (Some(from_edge), Some(to_edge)) => self.compute_edge_distance(from_edge, to_edge),
            _ => f64::INFINITY,
        };

        if self.lane_cache.len() >= self.capacity {
            debug!("Lane distance cache full ({} entries), clearing", self.lane_cache.len());
            self.lane_cache.clear();
        }
        self.lane_cache.insert(key, distance);
        distance
    }

    /// Network distance from edge `from` to edge `to`, used for live vehicle positions
    pub fn edge_distance(&mut self, from: &EdgeId, to: &EdgeId) -> f64 {
        let key = (from.clone(), to.clone());
        if let Some(distance) = self.edge_cache.get(&key) {
            return *distance;
        }

        let distance = self.compute_edge_distance(from, to);

        if self.edge_cache.len() >= self.capacity {
            debug!("Edge distance cache full ({} entries), clearing", self.edge_cache.len());
            self.edge_cache.clear();
        }
        self.edge_cache.insert(key, distance);
        distance
    }

    /// Whether `to` lies strictly closer than `threshold` from `from`
    pub fn lanes_within(&mut self, from: &LaneId, to: &LaneId, threshold: f64) -> bool {
        self.lane_distance(from, to) < threshold
    }

    /// Edge a lane belongs to, falling back to the `<edge>_<index>` naming scheme
    pub fn edge_of_lane(&self, lane: &LaneId) -> Option<EdgeId> {
        self.context
            .index()
            .edge_of(lane)
            .cloned()
            .or_else(|| lane.implied_edge())
    }

    fn compute_edge_distance(&self, from: &EdgeId, to: &EdgeId) -> f64 {
        let index = self.context.index();

        let (Some((_, from_end)), Some((to_start, _))) = (index.endpoints(from), index.endpoints(to))
        else {
            return f64::INFINITY;
        };

        // Already on the target segment
        if from == to {
            return 0.0;
        }

        self.context
            .graph()
            .shortest_path_length(from_end, to_start)
            .unwrap_or(f64::INFINITY)
    }

    /// Number of memoized lane and edge pairs
    pub fn cache_len(&self) -> usize {
        self.lane_cache.len() + self.edge_cache.len()
    }

    pub fn clear_cache(&mut self) {
        self.lane_cache.clear();
        self.edge_cache.clear();
    }
}
