//! Degree centrality rankings and bridge detection

use crate::graph::{EventGraph, NodeRole};
use crate::metrics::{sort_descending, BridgeNode, RankedNode};

/// Normalized degree (degree / (n - 1)) for every node, highest first.
///
/// A single-node graph scores its node 1.0.
pub fn degree_centrality(graph: &EventGraph) -> Vec<RankedNode> {
    let n = graph.node_count();

    let mut ranking: Vec<RankedNode> = graph
        .nodes()
        .map(|(idx, node)| RankedNode {
            node: node.key().to_string(),
            name: node.display_name().to_string(),
            role: node.role(),
            score: if n > 1 { graph.degree(idx) as f64 / (n - 1) as f64 } else { 1.0 },
        })
        .collect();

    sort_descending(&mut ranking);
    ranking
}

/// Degree centrality of genre nodes, leaving out placeholder labels.
///
/// Scores are normalized over the whole graph, not just the genres.
pub fn genre_centrality<S: AsRef<str>>(graph: &EventGraph, excluded_labels: &[S]) -> Vec<RankedNode> {
    degree_centrality(graph)
        .into_iter()
        .filter(|entry| entry.role == NodeRole::Genre)
        .filter(|entry| !excluded_labels.iter().any(|l| l.as_ref() == entry.node))
        .collect()
}

/// `leaf_role` nodes connected to exactly two `hub_role` nodes
pub fn find_bridge_nodes(graph: &EventGraph, hub_role: NodeRole, leaf_role: NodeRole) -> Vec<BridgeNode> {
    let mut bridges = Vec::new();

    for (idx, node) in graph.nodes() {
        if node.role() != leaf_role {
            continue;
        }

        let hubs: Vec<String> = graph
            .neighbors(idx)
            .into_iter()
            .map(|n| graph.node(n))
            .filter(|n| n.role() == hub_role)
            .map(|n| n.key().to_string())
            .collect();

        if hubs.len() == 2 {
            bridges.push(BridgeNode {
                node: node.key().to_string(),
                name: node.display_name().to_string(),
                hubs,
            });
        }
    }

    log::debug!("Found {} bridge nodes", bridges.len());
    bridges
}
