//! Graph construction from event records

use std::collections::{BTreeMap, BTreeSet};

use petgraph::graph::NodeIndex;

use crate::data::{EventField, EventRecord};
use crate::graph::{EdgeData, EventGraph, Node};

/// How co-occurrence edges are emitted for a pair of groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooccurrenceMode {
    /// One edge per pair labeled with a shared value. Shared values are
    /// visited in sorted order and each overwrites the label, so the edge
    /// keeps the greatest one.
    PerSharedLabel,
    /// One edge per pair weighted by the number of shared values
    Weighted,
}

/// Builder for incrementally constructing an EventGraph
pub struct GraphBuilder {
    graph: EventGraph,

    /// Records that lacked a value for one of the requested columns
    skipped: usize,
}

impl GraphBuilder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            graph: EventGraph::with_capacity(capacity, capacity),
            skipped: 0,
        }
    }

    /// Get or create the node, refreshing its attributes
    pub fn get_or_create_node(&mut self, node: Node) -> NodeIndex {
        self.graph.add_node(node)
    }

    pub fn add_edge(&mut self, a: NodeIndex, b: NodeIndex, data: EdgeData) {
        self.graph.add_edge(a, b, data);
    }

    pub fn skip_record(&mut self) {
        self.skipped += 1;
    }

    pub fn graph(&self) -> &EventGraph {
        &self.graph
    }

    pub fn build(self) -> EventGraph {
        if self.skipped > 0 {
            log::debug!("Skipped {} records without the requested columns", self.skipped);
        }
        log::debug!(
            "Built graph with {} nodes and {} edges",
            self.graph.node_count(),
            self.graph.edge_count()
        );
        self.graph
    }
}

/// Two-role graph: one node per distinct value of each column and one edge
/// per record joining its two values.
pub fn build_bipartite_graph<'a, I>(records: I, role_a: EventField, role_b: EventField) -> EventGraph
where
    I: IntoIterator<Item = &'a EventRecord>,
{
    let records = records.into_iter();
    let mut builder = GraphBuilder::with_capacity(records.size_hint().0);

    for record in records {
        let (Some(a), Some(b)) = (record.node(role_a), record.node(role_b)) else {
            builder.skip_record();
            continue;
        };

        let a = builder.get_or_create_node(a);
        let b = builder.get_or_create_node(b);
        builder.add_edge(a, b, EdgeData::Plain);
    }

    builder.build()
}

/// Co-occurrence graph between `group_key` nodes that share `shared_attr` values.
///
/// Every unordered pair of groups is compared, which is quadratic in the
/// number of distinct groups. That is fine for the few hundred venues per
/// dataset this runs on and is the scaling limit of the rebuild.
pub fn build_cooccurrence_graph<'a, I>(
    records: I,
    group_key: EventField,
    shared_attr: EventField,
    mode: CooccurrenceMode,
) -> EventGraph
where
    I: IntoIterator<Item = &'a EventRecord>,
{
    let records = records.into_iter();
    let mut builder = GraphBuilder::with_capacity(records.size_hint().0);
    let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for record in records {
        let Some(node) = record.node(group_key) else {
            builder.skip_record();
            continue;
        };
        let group = node.key().to_string();
        builder.get_or_create_node(node);

        let shared = groups.entry(group).or_default();
        match record.key(shared_attr) {
            Some(value) => {
                shared.insert(value.to_string());
            }
            None => builder.skip_record(),
        }
    }

    let groups: Vec<(NodeIndex, &BTreeSet<String>)> = groups
        .iter()
        .filter_map(|(key, shared)| builder.graph().node_index(key).map(|idx| (idx, shared)))
        .collect();

    for (i, &(a, a_shared)) in groups.iter().enumerate() {
        for &(b, b_shared) in &groups[i + 1..] {
            let common = a_shared.intersection(b_shared);
            match mode {
                CooccurrenceMode::PerSharedLabel => {
                    for label in common {
                        builder.add_edge(a, b, EdgeData::Labeled(label.clone()));
                    }
                }
                CooccurrenceMode::Weighted => {
                    let count = common.count();
                    if count > 0 {
                        builder.add_edge(a, b, EdgeData::Weighted(count as u32));
                    }
                }
            }
        }
    }

    builder.build()
}
