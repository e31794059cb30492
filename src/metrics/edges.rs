//! Strongest and weakest connections

use crate::graph::EventGraph;
use crate::metrics::{EdgeWeightSummary, WeightedEdge};

/// Sort edges by weight and keep the `count` heaviest and lightest.
///
/// Equal weights keep edge insertion order in the full list. `weakest` is the
/// tail of that list reversed, so it reads lightest first.
pub fn edge_weight_extremes(graph: &EventGraph, count: usize) -> EdgeWeightSummary {
    let mut edges: Vec<WeightedEdge> = graph
        .edges()
        .map(|(a, b, data)| {
            let (a, b) = (graph.node(a), graph.node(b));
            WeightedEdge {
                source: a.key().to_string(),
                target: b.key().to_string(),
                source_name: a.display_name().to_string(),
                target_name: b.display_name().to_string(),
                weight: data.weight(),
            }
        })
        .collect();

    edges.sort_by(|x, y| y.weight.total_cmp(&x.weight));

    let strongest = edges.iter().take(count).cloned().collect();
    let weakest = edges.iter().rev().take(count).cloned().collect();

    EdgeWeightSummary {
        strongest,
        weakest,
        edges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeData, Node};

    fn ring(weights: &[u32]) -> EventGraph {
        let mut graph = EventGraph::new();
        let nodes: Vec<_> = (0..weights.len())
            .map(|i| graph.add_node(Node::Genre { name: format!("n{}", i) }))
            .collect();
        for (i, &w) in weights.iter().enumerate() {
            let next = nodes[(i + 1) % nodes.len()];
            graph.add_edge(nodes[i], next, EdgeData::Weighted(w));
        }
        graph
    }

    #[test]
    fn extremes_are_ordered_and_bounded() {
        let graph = ring(&[3, 9, 1, 7, 4, 4, 8, 2, 6, 5, 10, 1]);
        let summary = edge_weight_extremes(&graph, 5);

        assert_eq!(summary.edges.len(), 12);
        assert_eq!(summary.strongest.len(), 5);
        assert_eq!(summary.weakest.len(), 5);

        let strongest: Vec<_> = summary.strongest.iter().map(|e| e.weight).collect();
        assert_eq!(strongest, vec![10.0, 9.0, 8.0, 7.0, 6.0]);
        let weakest: Vec<_> = summary.weakest.iter().map(|e| e.weight).collect();
        assert_eq!(weakest, vec![1.0, 1.0, 2.0, 3.0, 4.0]);

        let last_strong = summary.strongest.last().unwrap().weight;
        assert!(summary.weakest.iter().all(|e| e.weight <= last_strong));
    }

    #[test]
    fn small_graphs_return_every_edge_on_both_sides() {
        let graph = ring(&[2, 5, 3]);
        let summary = edge_weight_extremes(&graph, 5);

        assert_eq!(summary.strongest.len(), 3);
        assert_eq!(summary.weakest.len(), 3);
        assert_eq!(summary.strongest[0].weight, 5.0);
        assert_eq!(summary.weakest[0].weight, 2.0);
        assert_eq!(summary.strongest[0].source, "n1");
        assert_eq!(summary.strongest[0].target_name, "n2");
    }

    #[test]
    fn equal_weights_keep_insertion_order() {
        let graph = ring(&[1, 1, 1]);
        let summary = edge_weight_extremes(&graph, 5);
        let sources: Vec<_> = summary.edges.iter().map(|e| e.source.as_str()).collect();
        assert_eq!(sources, vec!["n0", "n1", "n2"]);
    }
}
