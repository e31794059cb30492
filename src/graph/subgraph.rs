//! Induced subgraphs

use std::collections::HashMap;

use crate::graph::{EventGraph, Node};

/// Induced subgraph on the nodes accepted by `keep`, preserving node and edge order
pub fn induced_subgraph<F>(graph: &EventGraph, keep: F) -> EventGraph
where
    F: Fn(&Node) -> bool,
{
    let mut subgraph = EventGraph::new();
    let mut orig_to_sub = HashMap::new();

    for (idx, node) in graph.nodes() {
        if keep(node) {
            orig_to_sub.insert(idx, subgraph.add_node(node.clone()));
        }
    }

    // Only include edges where both endpoints are kept
    for (a, b, data) in graph.edges() {
        if let (Some(&a), Some(&b)) = (orig_to_sub.get(&a), orig_to_sub.get(&b)) {
            subgraph.add_edge(a, b, data.clone());
        }
    }

    subgraph
}

/// Induced subgraph on the nodes located in `city`, or `None` when no node is
pub fn subgraph_by_city(graph: &EventGraph, city: &str) -> Option<EventGraph> {
    let subgraph = induced_subgraph(graph, |node| node.city() == Some(city));

    if subgraph.is_empty() {
        log::debug!("No nodes in city {}", city);
        return None;
    }

    Some(subgraph)
}
