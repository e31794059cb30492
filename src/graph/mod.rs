//! Graph representation and construction module

pub mod builder;
pub mod model;
pub mod subgraph;

pub use builder::{build_bipartite_graph, build_cooccurrence_graph, CooccurrenceMode};
pub use model::{EdgeData, EventGraph, GraphSnapshot, Node, NodeRole};
pub use subgraph::subgraph_by_city;
