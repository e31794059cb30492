//! Graph metrics: centrality, clustering, edge weights and communities

pub mod centrality;
pub mod clustering;
pub mod community;
pub mod edges;

use serde::{Deserialize, Serialize};

use crate::graph::NodeRole;

pub use centrality::{degree_centrality, find_bridge_nodes, genre_centrality};
pub use clustering::weighted_clustering;
pub use community::{detect_communities, modularity};
pub use edges::edge_weight_extremes;

/// A node with its score in a ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedNode {
    /// Node key (venue id, artist or genre name)
    pub node: String,
    pub name: String,
    pub role: NodeRole,
    pub score: f64,
}

/// An edge resolved to node keys and display names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedEdge {
    pub source: String,
    pub target: String,
    pub source_name: String,
    pub target_name: String,
    pub weight: f64,
}

/// Strongest and weakest edges plus the full list sorted by weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeWeightSummary {
    /// Heaviest edges, heaviest first
    pub strongest: Vec<WeightedEdge>,

    /// Lightest edges, lightest first
    pub weakest: Vec<WeightedEdge>,

    /// Every edge, heaviest first
    pub edges: Vec<WeightedEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityMember {
    pub node: String,
    pub name: String,
    pub community: usize,
}

/// Assignment of every node to a community
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityPartition {
    /// One entry per node, in graph node order
    pub members: Vec<CommunityMember>,
    pub community_count: usize,
    pub modularity: f64,
}

impl CommunityPartition {
    pub fn community_of(&self, node: &str) -> Option<usize> {
        self.members
            .iter()
            .find(|m| m.node == node)
            .map(|m| m.community)
    }
}

/// A leaf node joining exactly two hub nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeNode {
    pub node: String,
    pub name: String,
    /// Keys of the two hubs, in adjacency order
    pub hubs: Vec<String>,
}

/// Kinds of metric artifacts stored next to a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MetricKind {
    DegreeCentrality,
    Clustering,
    EdgeWeights,
    Communities,
    GenreCentrality,
    BridgeNodes,
}

impl MetricKind {
    pub const ALL: [MetricKind; 6] = [
        MetricKind::DegreeCentrality,
        MetricKind::Clustering,
        MetricKind::EdgeWeights,
        MetricKind::Communities,
        MetricKind::GenreCentrality,
        MetricKind::BridgeNodes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::DegreeCentrality => "degree-centrality",
            MetricKind::Clustering => "clustering",
            MetricKind::EdgeWeights => "edge-weights",
            MetricKind::Communities => "communities",
            MetricKind::GenreCentrality => "genre-centrality",
            MetricKind::BridgeNodes => "bridge-nodes",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A computed metric, as persisted in the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "kebab-case")]
pub enum MetricArtifact {
    DegreeCentrality(Vec<RankedNode>),
    Clustering(Vec<RankedNode>),
    EdgeWeights(EdgeWeightSummary),
    Communities(CommunityPartition),
    GenreCentrality(Vec<RankedNode>),
    BridgeNodes(Vec<BridgeNode>),
}

impl MetricArtifact {
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricArtifact::DegreeCentrality(_) => MetricKind::DegreeCentrality,
            MetricArtifact::Clustering(_) => MetricKind::Clustering,
            MetricArtifact::EdgeWeights(_) => MetricKind::EdgeWeights,
            MetricArtifact::Communities(_) => MetricKind::Communities,
            MetricArtifact::GenreCentrality(_) => MetricKind::GenreCentrality,
            MetricArtifact::BridgeNodes(_) => MetricKind::BridgeNodes,
        }
    }
}

/// Stable descending sort by score; equal scores keep their input order
pub(crate) fn sort_descending(ranking: &mut [RankedNode]) {
    ranking.sort_by(|a, b| b.score.total_cmp(&a.score));
}
