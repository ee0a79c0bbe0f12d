//! Form payloads and the snapshot transformations they commit.
//!
//! Every operation takes the current snapshot by reference and returns the
//! next one; nothing here touches history or persistence.

use lifegraph_layout::Position;
use petgraph::graphmap::UnGraphMap;
use tracing::debug;

use crate::edge::Edge;
use crate::node::{Node, NodeType};
use crate::snapshot::StructuralGraph;
use crate::store::MutationKind;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FormMode {
    /// New node placed at a canvas-space point.
    Create { at: Position },
    Edit,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeForm {
    pub id: String,
    pub label: String,
    pub node_type: NodeType,
    pub description: String,
    pub mode: FormMode,
}

impl NodeForm {
    /// Blank form for a new node with a freshly allocated id.
    pub fn create(graph: &StructuralGraph, at: Position) -> Self {
        Self {
            id: graph.next_node_id(),
            label: String::new(),
            node_type: NodeType::Person,
            description: String::new(),
            mode: FormMode::Create { at },
        }
    }

    /// Form pre-filled from an existing node.
    pub fn edit(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            label: node.label.clone(),
            node_type: node.node_type,
            description: node.description.clone(),
            mode: FormMode::Edit,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self.mode, FormMode::Create { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeForm {
    pub source: String,
    pub target: String,
    pub label: String,
}

impl EdgeForm {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label: String::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("Node label cannot be empty")]
    EmptyNodeLabel,
    #[error("Edge label cannot be empty")]
    EmptyEdgeLabel,
    #[error("These nodes are already connected")]
    DuplicateEdge,
    #[error("A node cannot be connected to itself")]
    SelfLoop,
    #[error("Cannot delete the 'You' node")]
    AnchorProtected,
    #[error("Node {0} does not exist")]
    UnknownNode(String),
    #[error("Node id {0} is already taken")]
    DuplicateId(String),
    #[error("No form is open")]
    NoOpenForm,
}

/// Apply a submitted node form. Creation appends a node stamped with the
/// form's canvas point; editing overwrites label, type and description only.
pub fn apply_node_form(
    graph: &StructuralGraph,
    form: &NodeForm,
) -> Result<(StructuralGraph, MutationKind), EditError> {
    let label = form.label.trim();
    if label.is_empty() {
        return Err(EditError::EmptyNodeLabel);
    }

    let mut next = graph.clone();
    match form.mode {
        FormMode::Create { at } => {
            if graph.node(&form.id).is_some() {
                return Err(EditError::DuplicateId(form.id.clone()));
            }
            let node = Node::new(form.id.clone(), label, form.node_type)
                .with_description(form.description.trim())
                .at(at.x, at.y);
            debug!(id = %node.id, "creating node");
            next.nodes.push(node);
            Ok((next, MutationKind::CreateNode))
        }
        FormMode::Edit => {
            let node = next
                .nodes
                .iter_mut()
                .find(|n| n.id == form.id)
                .ok_or_else(|| EditError::UnknownNode(form.id.clone()))?;
            node.label = label.to_string();
            node.node_type = form.node_type;
            node.description = form.description.trim().to_string();
            debug!(id = %node.id, "updating node");
            Ok((next, MutationKind::UpdateNode))
        }
    }
}

/// Whether `a` and `b` are already joined by a structural edge, in either direction.
pub fn is_connected(graph: &StructuralGraph, a: &str, b: &str) -> bool {
    let mut links: UnGraphMap<&str, ()> = UnGraphMap::with_capacity(graph.nodes.len(), graph.edges.len());
    for edge in graph.edges.iter().filter(|e| !e.is_temporary) {
        links.add_edge(edge.source.as_str(), edge.target.as_str(), ());
    }
    links.contains_edge(a, b)
}

/// Apply a submitted edge form. Rejects empty labels, self loops, unknown
/// endpoints and pairs that are already connected.
pub fn apply_edge_form(graph: &StructuralGraph, form: &EdgeForm) -> Result<StructuralGraph, EditError> {
    let label = form.label.trim();
    if label.is_empty() {
        return Err(EditError::EmptyEdgeLabel);
    }
    if form.source == form.target {
        return Err(EditError::SelfLoop);
    }
    for id in [&form.source, &form.target] {
        if graph.node(id).is_none() {
            return Err(EditError::UnknownNode(id.clone()));
        }
    }
    if is_connected(graph, &form.source, &form.target) {
        return Err(EditError::DuplicateEdge);
    }

    let mut next = graph.clone();
    next.edges
        .push(Edge::new(form.source.clone(), form.target.clone(), label));
    Ok(next)
}

/// Remove a node and every edge touching it. The anchor cannot be deleted.
pub fn delete_node(graph: &StructuralGraph, id: &str) -> Result<StructuralGraph, EditError> {
    let node = graph
        .node(id)
        .ok_or_else(|| EditError::UnknownNode(id.to_string()))?;
    if node.is_anchor {
        return Err(EditError::AnchorProtected);
    }

    let mut next = graph.clone();
    next.nodes.retain(|n| n.id != id);
    next.edges.retain(|e| !e.touches(id));
    Ok(next)
}
