//! GraphML and CSV export of cached graphs for external renderers

use std::io::Write;

use polars::prelude::*;

use crate::error::Result;
use crate::graph::EventGraph;
use crate::metrics::CommunityPartition;

/// Write `graph` as undirected GraphML.
///
/// Nodes carry role, name, city and state, plus their community when a
/// partition is given. Edges carry their label and weight.
pub fn write_graphml<W: Write>(graph: &EventGraph, partition: Option<&CommunityPartition>, mut out: W) -> Result<()> {
    log::debug!(
        "Writing GraphML for {} nodes and {} edges",
        graph.node_count(),
        graph.edge_count()
    );

    writeln!(out, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
    writeln!(out, "<graphml xmlns=\"http://graphml.graphdrawing.org/xmlns\">")?;
    for (id, target, name, kind) in [
        ("role", "node", "role", "string"),
        ("name", "node", "name", "string"),
        ("city", "node", "city", "string"),
        ("state", "node", "state", "string"),
        ("community", "node", "community", "int"),
        ("label", "edge", "label", "string"),
        ("weight", "edge", "weight", "double"),
    ] {
        writeln!(
            out,
            "  <key id=\"{}\" for=\"{}\" attr.name=\"{}\" attr.type=\"{}\"/>",
            id, target, name, kind
        )?;
    }
    writeln!(out, "  <graph id=\"G\" edgedefault=\"undirected\">")?;

    for (idx, node) in graph.nodes() {
        writeln!(out, "    <node id=\"n{}\">", idx.index())?;
        write_data(&mut out, "role", node.role().as_str())?;
        write_data(&mut out, "name", node.display_name())?;
        if let Some(city) = node.city() {
            write_data(&mut out, "city", city)?;
        }
        if let Some(state) = node.state() {
            write_data(&mut out, "state", state)?;
        }
        if let Some(community) = partition.and_then(|p| p.community_of(node.key())) {
            write_data(&mut out, "community", &community.to_string())?;
        }
        writeln!(out, "    </node>")?;
    }

    for (edge_id, (a, b, data)) in graph.edges().enumerate() {
        writeln!(
            out,
            "    <edge id=\"e{}\" source=\"n{}\" target=\"n{}\">",
            edge_id,
            a.index(),
            b.index()
        )?;
        if let Some(label) = data.label() {
            write_data(&mut out, "label", label)?;
        }
        write_data(&mut out, "weight", &data.weight().to_string())?;
        writeln!(out, "    </edge>")?;
    }

    writeln!(out, "  </graph>")?;
    writeln!(out, "</graphml>")?;
    out.flush()?;

    Ok(())
}

/// Write one CSV row per node: key, name, role, city, state and community
pub fn write_node_csv<W: Write>(graph: &EventGraph, partition: Option<&CommunityPartition>, mut out: W) -> Result<()> {
    let nodes: Vec<_> = graph.nodes().map(|(_, node)| node).collect();

    let mut df = df!(
        "node" => nodes.iter().map(|n| n.key()).collect::<Vec<_>>(),
        "name" => nodes.iter().map(|n| n.display_name()).collect::<Vec<_>>(),
        "role" => nodes.iter().map(|n| n.role().as_str()).collect::<Vec<_>>(),
        "city" => nodes.iter().map(|n| n.city()).collect::<Vec<_>>(),
        "state" => nodes.iter().map(|n| n.state()).collect::<Vec<_>>(),
        "community" => nodes
            .iter()
            .map(|n| partition.and_then(|p| p.community_of(n.key())).map(|c| c as u32))
            .collect::<Vec<_>>(),
    )?;

    CsvWriter::new(&mut out).include_header(true).finish(&mut df)?;
    out.flush()?;

    Ok(())
}

fn write_data<W: Write>(out: &mut W, key: &str, value: &str) -> Result<()> {
    writeln!(out, "      <data key=\"{}\">{}</data>", key, escape_xml(value))?;
    Ok(())
}

/// Escape the five XML special characters
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
