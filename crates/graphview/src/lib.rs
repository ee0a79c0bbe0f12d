//! Headless core of the life-graph editor: structural snapshots with an
//! undoable history, the force layout driver, pointer interaction and the
//! edit forms that turn into commits.

mod edge;
pub mod edit;
mod graph;
mod history;
pub mod interaction;
mod node;
mod notification;
mod snapshot;
mod store;

pub use edge::Edge;
pub use edit::{EdgeForm, EditError, FormMode, NodeForm};
pub use graph::{EditorConfig, GraphEditor};
pub use history::GraphHistory;
pub use interaction::{
    ContextMenu, Effect, Form, Hover, InteractionController, InteractionState, MenuAction,
    MenuTarget, PointerButton, Scene,
};
pub use node::{ANCHOR_ID, ANCHOR_LABEL, Node, NodeType};
pub use notification::{NOTIFICATION_TTL, Notification, NotificationKind, Notifications};
pub use snapshot::{GraphInput, LoadError, StructuralGraph};
pub use store::{
    GraphStore, HistoryUpdate, Mutation, MutationId, MutationKind, MutationStatus, PendingCommit,
    Persister, StoreError, persist,
};

pub use lifegraph_layout::{ForceLayout, ForceNode, Position, Size, Viewport, ZoomDirection};
