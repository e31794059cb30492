//! Typed undirected graph of venues, artists and genres

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

/// Semantic role of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    Artist,
    Genre,
    Venue,
}

impl NodeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeRole::Artist => "artist",
            NodeRole::Genre => "genre",
            NodeRole::Venue => "venue",
        }
    }
}

/// A graph node. Artists and genres are identified by name, venues by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Artist { name: String },
    Genre { name: String },
    Venue {
        id: String,
        name: String,
        city: String,
        state: String,
    },
}

impl Node {
    /// Identity of the node within a graph
    pub fn key(&self) -> &str {
        match self {
            Node::Artist { name } | Node::Genre { name } => name,
            Node::Venue { id, .. } => id,
        }
    }

    pub fn role(&self) -> NodeRole {
        match self {
            Node::Artist { .. } => NodeRole::Artist,
            Node::Genre { .. } => NodeRole::Genre,
            Node::Venue { .. } => NodeRole::Venue,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Node::Artist { name } | Node::Genre { name } => name,
            Node::Venue { name, .. } => name,
        }
    }

    pub fn city(&self) -> Option<&str> {
        match self {
            Node::Venue { city, .. } => Some(city),
            _ => None,
        }
    }

    pub fn state(&self) -> Option<&str> {
        match self {
            Node::Venue { state, .. } => Some(state),
            _ => None,
        }
    }
}

/// Data carried by an edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EdgeData {
    Plain,
    /// A shared attribute value, e.g. the genre two venues have in common
    Labeled(String),
    /// Number of shared attribute values
    Weighted(u32),
}

impl EdgeData {
    /// Weight used by the metrics; unweighted edges count as 1
    pub fn weight(&self) -> f64 {
        match self {
            EdgeData::Weighted(w) => *w as f64,
            _ => 1.0,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            EdgeData::Labeled(label) => Some(label),
            _ => None,
        }
    }
}

/// Simple undirected graph keyed by node identity.
///
/// Node and edge iteration follow insertion order; every ranking in the
/// metrics module breaks ties on that order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "GraphSnapshot", into = "GraphSnapshot")]
pub struct EventGraph {
    graph: UnGraph<Node, EdgeData>,
    index: HashMap<String, NodeIndex>,
}

impl EventGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            graph: UnGraph::with_capacity(nodes, edges),
            index: HashMap::with_capacity(nodes),
        }
    }

    /// Insert a node, or replace the attributes of the node with the same key
    pub fn add_node(&mut self, node: Node) -> NodeIndex {
        if let Some(&idx) = self.index.get(node.key()) {
            self.graph[idx] = node;
            return idx;
        }

        let key = node.key().to_string();
        let idx = self.graph.add_node(node);
        self.index.insert(key, idx);
        idx
    }

    /// Connect two existing nodes. Returns `true` when a new edge was created.
    ///
    /// Self-loops are ignored. On an existing edge, labeled or weighted data
    /// replaces the stored data and `Plain` leaves it untouched.
    pub fn add_edge(&mut self, a: NodeIndex, b: NodeIndex, data: EdgeData) -> bool {
        if a == b {
            log::debug!("Ignoring self-loop on {}", self.graph[a].key());
            return false;
        }

        match self.graph.find_edge(a, b) {
            Some(edge) => {
                if data != EdgeData::Plain {
                    self.graph[edge] = data;
                }
                false
            }
            None => {
                self.graph.add_edge(a, b, data);
                true
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn node_index(&self, key: &str) -> Option<NodeIndex> {
        self.index.get(key).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &Node {
        &self.graph[idx]
    }

    pub fn node_by_key(&self, key: &str) -> Option<&Node> {
        self.node_index(key).map(|idx| &self.graph[idx])
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &Node)> + '_ {
        self.graph
            .node_indices()
            .map(move |idx| (idx, &self.graph[idx]))
    }

    /// Edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, &EdgeData)> + '_ {
        self.graph
            .edge_references()
            .map(|e| (e.source(), e.target(), e.weight()))
    }

    /// Neighbors of a node in the order their edges were added
    pub fn neighbors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut adjacent: Vec<_> = self
            .graph
            .edges(idx)
            .map(|e| {
                let other = if e.source() == idx { e.target() } else { e.source() };
                (e.id(), other)
            })
            .collect();
        adjacent.sort_unstable_by_key(|(edge, _)| *edge);
        adjacent.into_iter().map(|(_, other)| other).collect()
    }

    pub fn degree(&self, idx: NodeIndex) -> usize {
        self.graph.edges(idx).count()
    }

    pub fn edge_data(&self, a: NodeIndex, b: NodeIndex) -> Option<&EdgeData> {
        self.graph.find_edge(a, b).map(|edge| &self.graph[edge])
    }

    pub fn edge_weight(&self, a: NodeIndex, b: NodeIndex) -> Option<f64> {
        self.edge_data(a, b).map(EdgeData::weight)
    }

    /// Largest edge weight, or `None` for an edgeless graph
    pub fn max_weight(&self) -> Option<f64> {
        self.graph
            .raw_edges()
            .iter()
            .map(|e| e.weight.weight())
            .reduce(f64::max)
    }
}

impl PartialEq for EventGraph {
    fn eq(&self, other: &Self) -> bool {
        let key_edges = |g: &EventGraph| -> Vec<(String, String, EdgeData)> {
            g.edges()
                .map(|(a, b, data)| {
                    (
                        g.node(a).key().to_string(),
                        g.node(b).key().to_string(),
                        data.clone(),
                    )
                })
                .collect()
        };

        self.nodes().map(|(_, n)| n).eq(other.nodes().map(|(_, n)| n))
            && key_edges(self) == key_edges(other)
    }
}

/// Serialized form of an [`EventGraph`]: nodes in order, edges as index pairs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<(u32, u32, EdgeData)>,
}

impl From<EventGraph> for GraphSnapshot {
    fn from(graph: EventGraph) -> Self {
        let edges = graph
            .edges()
            .map(|(a, b, data)| (a.index() as u32, b.index() as u32, data.clone()))
            .collect();
        let (nodes, _) = graph.graph.into_nodes_edges();

        Self {
            nodes: nodes.into_iter().map(|n| n.weight).collect(),
            edges,
        }
    }
}

impl TryFrom<GraphSnapshot> for EventGraph {
    type Error = String;

    fn try_from(snapshot: GraphSnapshot) -> Result<Self, Self::Error> {
        let node_count = snapshot.nodes.len();
        let mut graph = EventGraph::with_capacity(node_count, snapshot.edges.len());

        for node in snapshot.nodes {
            graph.add_node(node);
        }
        if graph.node_count() != node_count {
            return Err("snapshot contains duplicate node keys".to_string());
        }

        for (a, b, data) in snapshot.edges {
            if a as usize >= node_count || b as usize >= node_count {
                return Err(format!("edge ({}, {}) references a missing node", a, b));
            }
            graph.add_edge(NodeIndex::new(a as usize), NodeIndex::new(b as usize), data);
        }

        Ok(graph)
    }
}
