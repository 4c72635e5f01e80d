//! Task graph snapshot using petgraph.
//!
//! The registry keeps its own adjacency in [`crate::DependencyIndex`]; this
//! module copies it into a petgraph `DiGraph` when a petgraph algorithm or
//! the Graphviz renderer is needed. Edges point from prerequisite to
//! dependent, weighted with the prerequisite's duration, and dangling
//! prerequisites are left out.

use crate::TaskPlanner;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use std::fmt;
use tracing::debug;

/// A node in the task graph.
#[derive(Debug, Clone)]
pub(crate) struct GraphNode {
    /// Task id.
    pub id: String,
    /// Task name.
    pub name: String,
    /// Estimated duration.
    pub duration: u64,
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({}d)", self.id, self.name, self.duration)
    }
}

/// Petgraph view of the registry. Node indices equal registration
/// positions.
pub(crate) struct TaskGraph {
    /// The directed graph of tasks.
    pub graph: DiGraph<GraphNode, u64>,
}

impl TaskPlanner {
    /// Copy the registry into a petgraph `DiGraph`, nodes in registration
    /// order.
    pub(crate) fn to_petgraph(&self) -> TaskGraph {
        let mut graph: DiGraph<GraphNode, u64> =
            DiGraph::with_capacity(self.len(), self.index.edge_count());
        for task in self.tasks() {
            graph.add_node(GraphNode {
                id: task.id.clone(),
                name: task.name.clone(),
                duration: task.estimated_duration,
            });
        }

        for (id, prerequisites) in self.index.forward() {
            let Some(to) = self.position(id).map(NodeIndex::new) else {
                continue;
            };
            for prerequisite in prerequisites {
                if let Some(from) = self.position(prerequisite).map(NodeIndex::new) {
                    let lag = graph[from].duration;
                    graph.add_edge(from, to, lag);
                }
            }
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built petgraph snapshot"
        );
        TaskGraph { graph }
    }

    /// Render the dependency graph in Graphviz DOT format.
    ///
    /// Nodes are labelled `id: name (duration)`, edges run from prerequisite
    /// to dependent.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let snapshot = self.to_petgraph();
        format!(
            "{}",
            Dot::with_config(&snapshot.graph, &[Config::EdgeNoLabel])
        )
    }
}
