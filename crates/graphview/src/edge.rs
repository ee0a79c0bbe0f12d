use lifegraph_layout::{ForceEdge, Linked};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    #[serde(deserialize_with = "crate::node::string_or_number")]
    pub source: String,
    #[serde(deserialize_with = "crate::node::string_or_number")]
    pub target: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_temporary: bool,
}

impl Edge {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label: label.into(),
            is_temporary: false,
        }
    }

    pub fn touches(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }

    /// Same endpoints, in either direction.
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }
}

impl Linked for Edge {
    fn source(&self) -> &str {
        &self.source
    }

    fn target(&self) -> &str {
        &self.target
    }
}

impl From<&Edge> for ForceEdge {
    fn from(edge: &Edge) -> Self {
        ForceEdge {
            source: edge.source.clone(),
            target: edge.target.clone(),
            temporary: edge.is_temporary,
        }
    }
}
