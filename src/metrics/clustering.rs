//! Weighted clustering coefficient (Onnela et al.)
//!
//! Edge weights are normalized by the largest weight in the graph. For a
//! node `v` with `d` neighbors the coefficient is
//! `2 * sum((w_vj * w_jk * w_kv)^(1/3)) / (d * (d - 1))` over the triangles
//! through `v`. Unweighted edges count as weight 1, which reduces this to
//! the plain triangle-based coefficient.

use std::collections::HashSet;

use crate::graph::EventGraph;
use crate::metrics::{sort_descending, RankedNode};

/// Weighted clustering coefficient of every node, highest first
pub fn weighted_clustering(graph: &EventGraph) -> Vec<RankedNode> {
    let max_weight = graph.max_weight().unwrap_or(1.0);
    let weight = |a, b| graph.edge_weight(a, b).unwrap_or(0.0) / max_weight;

    let mut ranking: Vec<RankedNode> = graph
        .nodes()
        .map(|(i, node)| {
            let neighbors = graph.neighbors(i);
            let inbrs: HashSet<_> = neighbors.iter().copied().collect();
            let mut seen = HashSet::new();
            let mut triangles = 0.0;

            for &j in &neighbors {
                seen.insert(j);
                let wij = weight(i, j);
                // each triangle is visited once from its first-seen neighbor
                for k in graph.neighbors(j) {
                    if inbrs.contains(&k) && !seen.contains(&k) {
                        triangles += (wij * weight(j, k) * weight(k, i)).cbrt();
                    }
                }
            }

            let d = neighbors.len() as f64;
            let score = if triangles == 0.0 {
                0.0
            } else {
                2.0 * triangles / (d * (d - 1.0))
            };

            RankedNode {
                node: node.key().to_string(),
                name: node.display_name().to_string(),
                role: node.role(),
                score,
            }
        })
        .collect();

    sort_descending(&mut ranking);
    ranking
}
