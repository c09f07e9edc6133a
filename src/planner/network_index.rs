//! Lookup tables over the network description
//!
//! Built in a single pass and shared by every distance query, so no query
//! ever walks the description again.

use std::collections::HashMap;

use super::network::NetworkDescription;
use super::types::{EdgeId, JunctionId, LaneId};

#[derive(Debug, Default, Clone)]
pub struct NetworkIndex {
    lane_to_edge: HashMap<LaneId, EdgeId>,
    edge_nodes: HashMap<EdgeId, (JunctionId, JunctionId)>,
    lane_length: HashMap<LaneId, f64>,
    edge_lanes: HashMap<EdgeId, Vec<LaneId>>,
}

impl NetworkIndex {
    pub fn from_description(description: &NetworkDescription) -> Self {
        let mut index = Self::default();

        for edge in &description.edges {
            if let (Some(from), Some(to)) = (&edge.from, &edge.to) {
                index
                    .edge_nodes
                    .insert(edge.id.clone(), (from.clone(), to.clone()));
            }

            let lanes = index.edge_lanes.entry(edge.id.clone()).or_default();
            for lane in &edge.lanes {
                index.lane_to_edge.insert(lane.id.clone(), edge.id.clone());
                index.lane_length.insert(lane.id.clone(), lane.length);
                lanes.push(lane.id.clone());
            }
        }

        index
    }

    /// The edge a lane belongs to
    pub fn edge_of(&self, lane: &LaneId) -> Option<&EdgeId> {
        self.lane_to_edge.get(lane)
    }

    /// `(from, to)` junctions of an edge, if it has both
    pub fn endpoints(&self, edge: &EdgeId) -> Option<&(JunctionId, JunctionId)> {
        self.edge_nodes.get(edge)
    }

    pub fn lane_length(&self, lane: &LaneId) -> Option<f64> {
        self.lane_length.get(lane).copied()
    }

    /// Lanes of an edge in description order
    pub fn lanes_of(&self, edge: &EdgeId) -> &[LaneId] {
        self.edge_lanes.get(edge).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_edge(&self, edge: &EdgeId) -> bool {
        self.edge_lanes.contains_key(edge)
    }

    pub fn lane_count(&self) -> usize {
        self.lane_to_edge.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_lanes.len()
    }
}
