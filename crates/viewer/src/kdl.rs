//! KDL graph parsing utilities.
//!
//! ```kdl
//! node "1" label="You" type="person"
//! node "2" label="Running" type="goal" description="5k in spring" x=120 y=80
//! edge "1" "2" label="wants"
//! ```

use graphview::{Edge, GraphInput, Node, NodeType, StructuralGraph};
use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use tracing::warn;

/// Parse a KDL graph into a single-snapshot history. Unknown nodes are
/// skipped; a document that does not parse yields an error.
pub fn parse_kdl_graph(content: &str) -> anyhow::Result<GraphInput> {
    let doc = KdlDocument::parse(content)
        .map_err(|err| anyhow::anyhow!("invalid KDL graph: {err}"))?;

    let mut graph = StructuralGraph::default();
    for kdl_node in doc.nodes() {
        match kdl_node.name().value() {
            "node" => match parse_node(kdl_node) {
                Some(node) => graph.nodes.push(node),
                None => warn!("skipping node without an id"),
            },
            "edge" => match parse_edge(kdl_node) {
                Some(edge) => graph.edges.push(edge),
                None => warn!("skipping edge without both endpoints"),
            },
            other => warn!(name = other, "skipping unknown KDL node"),
        }
    }

    Ok(GraphInput {
        snapshots: vec![graph],
        current: 0,
    })
}

fn parse_node(kdl_node: &KdlNode) -> Option<Node> {
    let id = positional(kdl_node).next().and_then(value_to_string)?;
    let label = property(kdl_node, "label")
        .and_then(value_to_string)
        .unwrap_or_else(|| id.clone());
    let node_type = property(kdl_node, "type")
        .and_then(KdlValue::as_string)
        .and_then(|s| s.parse().ok())
        .unwrap_or(NodeType::Default);

    let mut node = Node::new(id, label, node_type);
    if let Some(description) = property(kdl_node, "description").and_then(value_to_string) {
        node = node.with_description(description);
    }
    if let (Some(x), Some(y)) = (
        property(kdl_node, "x").and_then(value_to_f64),
        property(kdl_node, "y").and_then(value_to_f64),
    ) {
        node = node.at(x, y);
    }
    Some(node)
}

fn parse_edge(kdl_node: &KdlNode) -> Option<Edge> {
    let mut args = positional(kdl_node).filter_map(value_to_string);
    let source = args.next()?;
    let target = args.next()?;
    let label = property(kdl_node, "label")
        .and_then(value_to_string)
        .unwrap_or_default();
    Some(Edge::new(source, target, label))
}

fn positional(kdl_node: &KdlNode) -> impl Iterator<Item = &KdlValue> {
    kdl_node
        .entries()
        .iter()
        .filter(|e| e.name().is_none())
        .map(KdlEntry::value)
}

fn property<'a>(kdl_node: &'a KdlNode, key: &str) -> Option<&'a KdlValue> {
    kdl_node
        .entries()
        .iter()
        .find(|e| e.name().map(|n| n.value() == key).unwrap_or(false))
        .map(KdlEntry::value)
}

fn value_to_string(value: &KdlValue) -> Option<String> {
    if let Some(s) = value.as_string() {
        return Some(s.to_string());
    }
    value.as_integer().map(|i| i.to_string())
}

fn value_to_f64(value: &KdlValue) -> Option<f64> {
    value
        .as_float()
        .or_else(|| value.as_integer().map(|i| i as f64))
}
