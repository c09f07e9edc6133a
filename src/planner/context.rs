//! Immutable network context shared by every component of a run

use anyhow::Result;
use log::info;
use std::path::Path;

use super::network::NetworkDescription;
use super::network_index::NetworkIndex;
use super::road_graph::RoadNetworkGraph;

/// Graph and lookup index built once from the same description
#[derive(Debug, Clone)]
pub struct NetworkContext {
    graph: RoadNetworkGraph,
    index: NetworkIndex,
}

impl NetworkContext {
    pub fn from_description(description: &NetworkDescription) -> Self {
        Self {
            graph: RoadNetworkGraph::from_description(description),
            index: NetworkIndex::from_description(description),
        }
    }

    /// Loads the network file and builds the context
    pub fn load(path: &Path) -> Result<Self> {
        let description = NetworkDescription::load(path)?;
        let context = Self::from_description(&description);
        info!(
            "Loaded network {}: {} edges ({} in graph), {} lanes, {} junctions",
            path.display(),
            context.index.edge_count(),
            context.graph.added_edge_ids().len(),
            context.index.lane_count(),
            context.graph.junction_count()
        );
        Ok(context)
    }

    pub fn graph(&self) -> &RoadNetworkGraph {
        &self.graph
    }

    pub fn index(&self) -> &NetworkIndex {
        &self.index
    }
}
