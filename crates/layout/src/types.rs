use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Position {
        Position::new(self.width / 2.0, self.height / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance(&self, other: &Position) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutError {
    InvalidViewport(Size),
    InvalidNodeIndex,
}

impl std::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutError::InvalidViewport(size) => {
                write!(f, "invalid viewport {}x{}", size.width, size.height)
            }
            LayoutError::InvalidNodeIndex => write!(f, "layout returned an unknown node"),
        }
    }
}

impl std::error::Error for LayoutError {}

/// A node record in the simulation arena.
///
/// Records are moved into [`crate::ForceLayout::run`] and handed back with
/// their positions updated; nothing is shared between calls except what the
/// caller feeds back in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceNode {
    pub id: String,
    pub anchor: bool,
    /// Last known position. `None` (or a non-finite value) is reseeded near the center.
    pub position: Option<Position>,
    #[serde(default)]
    pub velocity: Position,
    /// Fixed position, if any. The anchor is always pinned at the viewport center.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<Position>,
}

impl ForceNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            anchor: false,
            position: None,
            velocity: Position::ORIGIN,
            pinned: None,
        }
    }

    pub fn anchor(id: impl Into<String>) -> Self {
        Self {
            anchor: true,
            ..Self::new(id)
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Position::new(x, y));
        self
    }

    /// Position after a run. Always set and finite for nodes returned by the layout.
    pub fn xy(&self) -> Position {
        self.position.unwrap_or(Position::ORIGIN)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceEdge {
    pub source: String,
    pub target: String,
    /// Layout-only spring from the anchor to an otherwise unconnected node.
    #[serde(default)]
    pub temporary: bool,
}

impl ForceEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            temporary: false,
        }
    }

    pub fn touches(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }
}

/// Trait for node types that can be laid out in place.
pub trait Positioned {
    fn id(&self) -> &str;
    fn is_anchor(&self) -> bool;
    fn position(&self) -> Option<Position>;
    fn set_position(&mut self, pos: Position);
}

/// Trait for edge types that can feed the layout.
pub trait Linked {
    fn source(&self) -> &str;
    fn target(&self) -> &str;
}
