use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::edge::Edge;
use crate::node::Node;

/// One immutable version of the persisted nodes and edges.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuralGraph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl StructuralGraph {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    /// A graph holding only the anchor node.
    pub fn with_anchor() -> Self {
        Self::new(vec![Node::anchor()], Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn anchor(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| n.is_anchor)
    }

    pub fn is_anchor(&self, id: &str) -> bool {
        self.node(id).is_some_and(|n| n.is_anchor)
    }

    pub fn has_edge_between(&self, a: &str, b: &str) -> bool {
        self.edges.iter().any(|e| e.connects(a, b))
    }

    /// Next free id: one past the largest numeric id, never below 2. When the
    /// largest id is `u64::MAX` the lowest unused id from 2 up is taken instead.
    pub fn next_node_id(&self) -> String {
        let ids: HashSet<u64> = self
            .nodes
            .iter()
            .filter_map(|n| n.id.trim().parse::<u64>().ok())
            .collect();
        let max = ids.iter().copied().max().unwrap_or(0);
        if let Some(next) = max.checked_add(1) {
            return next.max(2).to_string();
        }
        let mut candidate = 2;
        while ids.contains(&candidate) {
            candidate += 1;
        }
        candidate.to_string()
    }

    /// Clean up a graph as received from storage:
    /// drops temporary and duplicate edges, drops duplicate node ids, tags
    /// exactly one anchor, and inserts one if none exists.
    pub fn normalized(mut self) -> Self {
        let mut seen = HashSet::new();
        self.nodes.retain(|n| {
            let fresh = seen.insert(n.id.clone());
            if !fresh {
                warn!(id = %n.id, "dropping duplicate node id");
            }
            fresh
        });

        let mut kept: Vec<Edge> = Vec::with_capacity(self.edges.len());
        for edge in self.edges.drain(..) {
            if edge.is_temporary || kept.iter().any(|e| e.connects(&edge.source, &edge.target)) {
                continue;
            }
            kept.push(edge);
        }
        self.edges = kept;

        let anchor = self
            .nodes
            .iter()
            .position(|n| n.is_anchor)
            .or_else(|| self.nodes.iter().position(|n| n.id == crate::node::ANCHOR_ID))
            .or_else(|| self.nodes.iter().position(Node::looks_like_anchor));
        for (i, node) in self.nodes.iter_mut().enumerate() {
            node.is_anchor = Some(i) == anchor;
        }

        if anchor.is_none() {
            debug!("graph has no anchor, inserting one");
            self.nodes.insert(0, Node::anchor());
        }
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("graph data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Graph data as delivered to the editor: a history of snapshots with a
/// current index.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphInput {
    pub snapshots: Vec<StructuralGraph>,
    pub current: usize,
}

impl GraphInput {
    pub fn parse(text: &str) -> Result<Self, LoadError> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_json(value))
    }

    /// Accepts an array of snapshots, a single `{nodes, edges}` object, or a
    /// `{graph_history, current_index?}` envelope. Any other shape becomes an
    /// empty history.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::from_items(items, None),
            Value::Object(mut map) => {
                if let Some(Value::Array(items)) = map.remove("graph_history") {
                    let current = map
                        .get("current_index")
                        .and_then(Value::as_u64)
                        .map(|i| i as usize);
                    Self::from_items(items, current)
                } else if map.contains_key("nodes") || map.contains_key("edges") {
                    Self::from_items(vec![Value::Object(map)], None)
                } else {
                    warn!("unrecognized graph data shape, starting empty");
                    Self::empty()
                }
            }
            _ => {
                warn!("unrecognized graph data shape, starting empty");
                Self::empty()
            }
        }
    }

    pub fn empty() -> Self {
        Self {
            snapshots: Vec::new(),
            current: 0,
        }
    }

    fn from_items(items: Vec<Value>, current: Option<usize>) -> Self {
        let snapshots: Vec<StructuralGraph> = items.into_iter().map(snapshot_from_value).collect();
        let last = snapshots.len().saturating_sub(1);
        Self {
            current: current.unwrap_or(last).min(last),
            snapshots,
        }
    }
}

/// Lenient snapshot decoding: non-array `nodes`/`edges` become empty and
/// entries that fail to decode are skipped with a warning.
fn snapshot_from_value(value: Value) -> StructuralGraph {
    let Value::Object(mut map) = value else {
        return StructuralGraph::default();
    };
    StructuralGraph {
        nodes: decode_entries(map.remove("nodes"), "node"),
        edges: decode_entries(map.remove("edges"), "edge"),
    }
}

fn decode_entries<T: DeserializeOwned>(items: Option<Value>, what: &str) -> Vec<T> {
    let Some(Value::Array(items)) = items else {
        return Vec::new();
    };
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<T>(item) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(index, "skipping {what}: {err}");
                None
            }
        })
        .collect()
}
