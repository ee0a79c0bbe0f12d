use lifegraph_layout::{Position, Positioned};
use serde::{Deserialize, Deserializer, Serialize};

/// Id of the conventional anchor node.
pub const ANCHOR_ID: &str = "1";
pub const ANCHOR_LABEL: &str = "You";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Person,
    Trait,
    Belief,
    Goal,
    #[default]
    Default,
}

impl NodeType {
    pub const ALL: [NodeType; 5] = [
        NodeType::Person,
        NodeType::Trait,
        NodeType::Belief,
        NodeType::Goal,
        NodeType::Default,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Person => "person",
            NodeType::Trait => "trait",
            NodeType::Belief => "belief",
            NodeType::Goal => "goal",
            NodeType::Default => "default",
        }
    }

    /// Stroke colour used by renderers.
    pub fn color(&self) -> &'static str {
        match self {
            NodeType::Person => "#4299e1",
            NodeType::Trait => "#68d391",
            NodeType::Belief => "#f6ad55",
            NodeType::Goal => "#fc8181",
            NodeType::Default => "#a0aec0",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "person" => Ok(NodeType::Person),
            "trait" => Ok(NodeType::Trait),
            "belief" => Ok(NodeType::Belief),
            "goal" => Ok(NodeType::Goal),
            "default" => Ok(NodeType::Default),
            other => Err(format!("unknown node type: {other}")),
        }
    }
}

// Unknown or null types fall back to `default` instead of failing the load.
impl<'de> Deserialize<'de> for NodeType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.and_then(|s| s.parse().ok()).unwrap_or_default())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub node_type: NodeType,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub description: String,
    /// Canvas point the node was created at. Layout positions live elsewhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_anchor: bool,
}

fn string_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Ids are strings on the wire, but integer ids are accepted and stringified.
pub(crate) fn string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Unsigned(u64),
        Signed(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Unsigned(n) => n.to_string(),
        RawId::Signed(n) => n.to_string(),
    })
}

impl Node {
    pub fn new(id: impl Into<String>, label: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            node_type,
            description: String::new(),
            x: None,
            y: None,
            is_anchor: false,
        }
    }

    pub fn anchor() -> Self {
        Self {
            is_anchor: true,
            ..Self::new(ANCHOR_ID, ANCHOR_LABEL, NodeType::Person)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Whether this node looks like the anchor by convention. Only used once,
    /// when a graph is normalized; afterwards `is_anchor` is authoritative.
    pub(crate) fn looks_like_anchor(&self) -> bool {
        self.id == ANCHOR_ID || self.label.trim().eq_ignore_ascii_case("you")
    }

    pub fn stored_position(&self) -> Option<Position> {
        match (self.x, self.y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some(Position::new(x, y)),
            _ => None,
        }
    }
}

impl Positioned for Node {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_anchor(&self) -> bool {
        self.is_anchor
    }

    fn position(&self) -> Option<Position> {
        self.stored_position()
    }

    fn set_position(&mut self, pos: Position) {
        self.x = Some(pos.x);
        self.y = Some(pos.y);
    }
}
