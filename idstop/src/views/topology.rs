//! Topology snapshot with a cached force-directed layout and node selection.

use tracing::{info, warn};

use crate::api::DashboardApi;
use crate::types::{Node, NodeKind, NodeStatus, TopologyGraph};
use crate::views::layout::{force_layout, ITERATIONS};

const MIN_ZOOM: f64 = 0.5;
const MAX_ZOOM: f64 = 4.0;
const ZOOM_STEP: f64 = 1.25;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TopologySummary {
    pub switches: usize,
    pub hosts: usize,
    pub links: usize,
}

impl TopologySummary {
    pub fn of(graph: &TopologyGraph) -> Self {
        Self {
            switches: graph.nodes.iter().filter(|n| n.kind == NodeKind::Switch).count(),
            hosts: graph.nodes.iter().filter(|n| n.kind == NodeKind::Host).count(),
            links: graph.edges.len(),
        }
    }
}

/// What the details panel shows for the selected node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDetails {
    pub id: String,
    pub label: String,
    pub title: String,
    pub status: NodeStatus,
    pub degree: usize,
    /// Sum of the traffic weights on every incident link.
    pub traffic: f64,
}

pub struct TopologyView<A> {
    api: A,
    graph: TopologyGraph,
    positions: Vec<(f64, f64)>,
    selected: Option<usize>,
    zoom: f64,
}

impl<A: DashboardApi> TopologyView<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            graph: TopologyGraph::default(),
            positions: Vec::new(),
            selected: None,
            zoom: 1.0,
        }
    }

    pub async fn refresh(&mut self) -> bool {
        match self.api.topology().await {
            Ok(graph) => {
                self.apply_graph(graph);
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to load topology");
                false
            }
        }
    }

    /// Replaces the whole graph and re-runs the layout. The selection
    /// survives only if the same node id is still present.
    pub fn apply_graph(&mut self, graph: TopologyGraph) {
        let keep = self.selected_node().map(|n| n.id.clone());
        self.positions = force_layout(&graph, ITERATIONS);
        self.graph = graph;
        self.selected = keep.and_then(|id| self.graph.nodes.iter().position(|n| n.id == id));
        let s = self.summary();
        info!(switches = s.switches, hosts = s.hosts, links = s.links, "topology updated");
    }

    pub fn graph(&self) -> &TopologyGraph {
        &self.graph
    }

    pub fn positions(&self) -> &[(f64, f64)] {
        &self.positions
    }

    /// Largest link weight, used to scale edge shading.
    pub fn peak_weight(&self) -> f64 {
        self.graph.edges.iter().map(|e| e.weight).fold(0.0, f64::max)
    }

    pub fn summary(&self) -> TopologySummary {
        TopologySummary::of(&self.graph)
    }

    pub fn select(&mut self, id: &str) -> Option<NodeDetails> {
        self.selected = self.graph.nodes.iter().position(|n| n.id == id);
        self.details()
    }

    pub fn select_next(&mut self) {
        let n = self.graph.nodes.len();
        if n == 0 {
            return;
        }
        self.selected = Some(self.selected.map_or(0, |i| (i + 1) % n));
    }

    pub fn select_prev(&mut self) {
        let n = self.graph.nodes.len();
        if n == 0 {
            return;
        }
        self.selected = Some(self.selected.map_or(n - 1, |i| (i + n - 1) % n));
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_node(&self) -> Option<&Node> {
        self.selected.and_then(|i| self.graph.nodes.get(i))
    }

    pub fn details(&self) -> Option<NodeDetails> {
        let node = self.selected_node()?;
        let (degree, traffic) = self
            .graph
            .edges
            .iter()
            .filter(|e| e.from == node.id || e.to == node.id)
            .fold((0, 0.0), |(n, w), e| (n + 1, w + e.weight));
        Some(NodeDetails {
            id: node.id.clone(),
            label: node.label.clone(),
            title: node.title(),
            status: node.status,
            degree,
            traffic,
        })
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * ZOOM_STEP).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / ZOOM_STEP).max(MIN_ZOOM);
    }

    pub fn fit(&mut self) {
        self.zoom = 1.0;
    }
}
