//! Louvain community detection
//!
//! Local moving visits nodes, and each node's neighboring communities, in an
//! order shuffled by a seeded RNG, so a fixed seed gives a fixed partition.
//! Each level is aggregated into a graph of communities until modularity
//! stops improving.

use std::collections::{BTreeMap, HashMap};

use petgraph::graph::NodeIndex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::graph::EventGraph;
use crate::metrics::{CommunityMember, CommunityPartition};

/// Smallest modularity gain that counts as an improvement
const MIN_IMPROVEMENT: f64 = 1e-7;

/// Weighted adjacency of one Louvain level
struct LevelGraph {
    /// Neighbors with edge weights, self-loops excluded
    links: Vec<Vec<(usize, f64)>>,

    /// Self-loop weight per node (internal weight of an aggregated community)
    loops: Vec<f64>,

    /// Sum of all edge weights, self-loops counted once
    total_weight: f64,
}

impl LevelGraph {
    fn from_graph(graph: &EventGraph) -> Self {
        let n = graph.node_count();
        let mut links = vec![Vec::new(); n];
        let mut total_weight = 0.0;

        for (a, b, data) in graph.edges() {
            let w = data.weight();
            links[a.index()].push((b.index(), w));
            links[b.index()].push((a.index(), w));
            total_weight += w;
        }

        Self {
            links,
            loops: vec![0.0; n],
            total_weight,
        }
    }

    fn len(&self) -> usize {
        self.links.len()
    }

    /// Weighted degree; a self-loop counts twice
    fn degree(&self, node: usize) -> f64 {
        self.links[node].iter().map(|(_, w)| w).sum::<f64>() + 2.0 * self.loops[node]
    }

    /// Collapse each community into a single node
    fn aggregate(&self, partition: &[usize], count: usize) -> Self {
        let mut loops = vec![0.0; count];
        let mut between: BTreeMap<(usize, usize), f64> = BTreeMap::new();

        for node in 0..self.len() {
            let c = partition[node];
            loops[c] += self.loops[node];

            for &(other, w) in &self.links[node] {
                if other < node {
                    continue;
                }
                let d = partition[other];
                if c == d {
                    loops[c] += w;
                } else {
                    *between.entry((c.min(d), c.max(d))).or_insert(0.0) += w;
                }
            }
        }

        let mut links = vec![Vec::new(); count];
        for ((c, d), w) in between {
            links[c].push((d, w));
            links[d].push((c, w));
        }

        Self {
            links,
            loops,
            total_weight: self.total_weight,
        }
    }
}

/// Community bookkeeping for one level
struct Status {
    node_to_comm: Vec<usize>,
    node_degree: Vec<f64>,
    comm_degree: Vec<f64>,
    comm_internal: Vec<f64>,
}

impl Status {
    fn new(level: &LevelGraph) -> Self {
        let node_degree: Vec<f64> = (0..level.len()).map(|n| level.degree(n)).collect();
        Self {
            node_to_comm: (0..level.len()).collect(),
            comm_degree: node_degree.clone(),
            comm_internal: level.loops.clone(),
            node_degree,
        }
    }

    fn modularity(&self, level: &LevelGraph) -> f64 {
        let m = level.total_weight;
        self.comm_internal
            .iter()
            .zip(&self.comm_degree)
            .map(|(internal, degree)| internal / m - (degree / (2.0 * m)).powi(2))
            .sum()
    }

    /// Weight from `node` into each neighboring community, in community id order
    fn neighbor_communities(&self, level: &LevelGraph, node: usize) -> Vec<(usize, f64)> {
        let mut weights: BTreeMap<usize, f64> = BTreeMap::new();
        for &(other, w) in &level.links[node] {
            *weights.entry(self.node_to_comm[other]).or_insert(0.0) += w;
        }
        weights.into_iter().collect()
    }

    fn remove(&mut self, level: &LevelGraph, node: usize, comm: usize, weight: f64) {
        self.comm_degree[comm] -= self.node_degree[node];
        self.comm_internal[comm] -= weight + level.loops[node];
    }

    fn insert(&mut self, level: &LevelGraph, node: usize, comm: usize, weight: f64) {
        self.node_to_comm[node] = comm;
        self.comm_degree[comm] += self.node_degree[node];
        self.comm_internal[comm] += weight + level.loops[node];
    }

    /// Move nodes between communities until a pass stops improving modularity
    fn one_level(&mut self, level: &LevelGraph, rng: &mut StdRng) {
        let two_m = 2.0 * level.total_weight;
        let mut new_mod = self.modularity(level);

        loop {
            let cur_mod = new_mod;
            let mut modified = false;

            let mut order: Vec<usize> = (0..level.len()).collect();
            order.shuffle(rng);

            for node in order {
                let own = self.node_to_comm[node];
                let degc_totw = self.node_degree[node] / two_m;
                let mut neighbors = self.neighbor_communities(level, node);
                let weight_to = |neighbors: &[(usize, f64)], comm: usize| {
                    neighbors
                        .iter()
                        .find(|(c, _)| *c == comm)
                        .map_or(0.0, |(_, w)| *w)
                };

                let own_weight = weight_to(&neighbors, own);
                let remove_cost =
                    -own_weight + (self.comm_degree[own] - self.node_degree[node]) * degc_totw;
                self.remove(level, node, own, own_weight);

                let mut best = own;
                let mut best_increase = 0.0;
                neighbors.shuffle(rng);
                for &(comm, weight) in &neighbors {
                    let increase = remove_cost + weight - self.comm_degree[comm] * degc_totw;
                    if increase > best_increase {
                        best_increase = increase;
                        best = comm;
                    }
                }

                self.insert(level, node, best, weight_to(&neighbors, best));
                if best != own {
                    modified = true;
                }
            }

            new_mod = self.modularity(level);
            if !modified || new_mod - cur_mod < MIN_IMPROVEMENT {
                break;
            }
        }
    }
}

/// Relabel communities 0.. in order of first appearance
fn renumber(assignment: &[usize]) -> (Vec<usize>, usize) {
    let mut mapping: BTreeMap<usize, usize> = BTreeMap::new();
    let renumbered = assignment
        .iter()
        .map(|c| {
            let next = mapping.len();
            *mapping.entry(*c).or_insert(next)
        })
        .collect();
    (renumbered, mapping.len())
}

/// Partition the graph into communities with the Louvain method.
///
/// The same graph and seed always give the same partition. A graph without
/// edges puts every node in its own community.
pub fn detect_communities(graph: &EventGraph, seed: u64) -> CommunityPartition {
    let n = graph.node_count();
    let mut level = LevelGraph::from_graph(graph);

    let assignment: Vec<usize> = if level.total_weight == 0.0 {
        (0..n).collect()
    } else {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut membership: Vec<usize> = (0..n).collect();
        let mut status = Status::new(&level);
        let mut current = f64::NEG_INFINITY;

        loop {
            status.one_level(&level, &mut rng);
            let new_mod = status.modularity(&level);
            // the first level is always kept
            if current.is_finite() && new_mod - current < MIN_IMPROVEMENT {
                break;
            }

            let (partition, count) = renumber(&status.node_to_comm);
            for m in membership.iter_mut() {
                *m = partition[*m];
            }
            current = new_mod;
            level = level.aggregate(&partition, count);
            status = Status::new(&level);
        }

        membership
    };

    let (assignment, community_count) = renumber(&assignment);
    let members = graph
        .nodes()
        .map(|(idx, node)| CommunityMember {
            node: node.key().to_string(),
            name: node.display_name().to_string(),
            community: assignment[idx.index()],
        })
        .collect();

    let mut partition = CommunityPartition {
        members,
        community_count,
        modularity: 0.0,
    };
    partition.modularity = modularity(graph, &partition);

    log::debug!(
        "Louvain found {} communities (modularity {:.4})",
        partition.community_count,
        partition.modularity
    );

    partition
}

/// Newman modularity of a partition, using edge weights
pub fn modularity(graph: &EventGraph, partition: &CommunityPartition) -> f64 {
    let total_weight: f64 = graph.edges().map(|(_, _, data)| data.weight()).sum();
    if total_weight == 0.0 {
        return 0.0;
    }

    let lookup: HashMap<&str, usize> = partition
        .members
        .iter()
        .map(|m| (m.node.as_str(), m.community))
        .collect();
    let community = |idx: NodeIndex| lookup.get(graph.node(idx).key()).copied();

    let mut internal = vec![0.0; partition.community_count];
    let mut degree = vec![0.0; partition.community_count];

    for (a, b, data) in graph.edges() {
        let w = data.weight();
        let (ca, cb) = (community(a), community(b));
        for c in [ca, cb].into_iter().flatten() {
            if let Some(d) = degree.get_mut(c) {
                *d += w;
            }
        }
        if let (Some(ca), Some(cb)) = (ca, cb) {
            if ca == cb {
                if let Some(i) = internal.get_mut(ca) {
                    *i += w;
                }
            }
        }
    }

    internal
        .iter()
        .zip(&degree)
        .map(|(l, d)| l / total_weight - (d / (2.0 * total_weight)).powi(2))
        .sum()
}
