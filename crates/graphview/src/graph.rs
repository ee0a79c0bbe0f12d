use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use lifegraph_layout::{ForceEdge, ForceLayout, ForceNode, Position, Size, Viewport, ZoomDirection};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::edit::{self, EditError};
use crate::history::GraphHistory;
use crate::interaction::{
    Effect, Form, Hover, InteractionController, InteractionState, MenuAction, PointerButton, Scene,
};
use crate::notification::{NotificationKind, Notifications};
use crate::snapshot::{GraphInput, StructuralGraph};
use crate::store::{
    GraphStore, MutationId, MutationKind, MutationStatus, PendingCommit, Persister, StoreError,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub layout: ForceLayout,
    pub viewport: Size,
    /// Resize events closer together than this collapse into one relayout.
    pub resize_debounce: Duration,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            layout: ForceLayout::default(),
            viewport: Size::new(800.0, 600.0),
            resize_debounce: Duration::from_millis(100),
        }
    }
}

/// The life-graph editor: history, layout and pointer handling behind one
/// event-driven facade. Every handler runs to completion on the caller's
/// thread; persistence is handed out as [`PendingCommit`]s.
pub struct GraphEditor {
    config: EditorConfig,
    store: GraphStore,
    layout: Vec<ForceNode>,
    /// Node and edge counts the current layout was computed for.
    layout_key: (usize, usize),
    pending_resize: Option<(Size, Instant)>,
    controller: InteractionController,
    notifications: Notifications,
    outbox: VecDeque<PendingCommit>,
    rng: StdRng,
}

impl GraphEditor {
    pub fn new(input: GraphInput, config: EditorConfig) -> Self {
        Self::with_rng(input, config, StdRng::from_rng(&mut rand::rng()))
    }

    /// Editor with a fixed layout seed, for reproducible layouts.
    pub fn with_seed(input: GraphInput, config: EditorConfig, seed: u64) -> Self {
        Self::with_rng(input, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(input: GraphInput, config: EditorConfig, rng: StdRng) -> Self {
        let history = GraphHistory::from_input(input);
        info!(
            snapshots = history.len(),
            current = history.current_index(),
            "loaded graph history"
        );
        let mut editor = Self {
            config,
            store: GraphStore::new(history),
            layout: Vec::new(),
            layout_key: (0, 0),
            pending_resize: None,
            controller: InteractionController::default(),
            notifications: Notifications::default(),
            outbox: VecDeque::new(),
            rng,
        };
        editor.relayout();
        editor
    }

    pub fn snapshot(&self) -> &StructuralGraph {
        self.store.current_snapshot()
    }

    pub fn history(&self) -> (&[StructuralGraph], usize) {
        self.store.history()
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Laid-out nodes, in snapshot order.
    pub fn layout(&self) -> &[ForceNode] {
        &self.layout
    }

    pub fn position_of(&self, id: &str) -> Option<Position> {
        self.layout.iter().find(|n| n.id == id).and_then(|n| n.position)
    }

    pub fn viewport(&self) -> &Viewport {
        self.controller.viewport()
    }

    pub fn state(&self) -> &InteractionState {
        self.controller.state()
    }

    pub fn hovered(&self) -> Option<&Hover> {
        self.controller.hovered()
    }

    pub fn form_mut(&mut self) -> Option<&mut Form> {
        self.controller.form_mut()
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    fn notify(&mut self, kind: NotificationKind, message: impl Into<String>, now: Instant) {
        let message = message.into();
        debug!(?kind, %message, "notification");
        self.notifications.push(kind, message, now);
    }

    /// Re-run the force layout for the current snapshot, seeding from the
    /// previous layout where a node already had a position.
    pub fn relayout(&mut self) {
        let graph = self.store.current_snapshot();
        let previous: HashMap<&str, Position> = self
            .layout
            .iter()
            .filter_map(|n| Some((n.id.as_str(), n.position?)))
            .collect();

        let arena: Vec<ForceNode> = graph
            .nodes
            .iter()
            .map(|node| ForceNode {
                id: node.id.clone(),
                anchor: node.is_anchor,
                position: previous
                    .get(node.id.as_str())
                    .copied()
                    .or_else(|| node.stored_position()),
                velocity: Position::ORIGIN,
                pinned: None,
            })
            .collect();
        let edges: Vec<ForceEdge> = graph.edges.iter().map(ForceEdge::from).collect();
        let key = (graph.nodes.len(), graph.edges.len());

        match self
            .config
            .layout
            .run_with_rng(arena, &edges, self.config.viewport, &mut self.rng)
        {
            Ok(nodes) => {
                debug!(nodes = key.0, edges = key.1, "relayout");
                self.layout = nodes;
                self.layout_key = key;
            }
            Err(err) => warn!("layout skipped: {err}"),
        }
    }

    /// Relayout only when the structure changed shape.
    fn sync_layout(&mut self) {
        let graph = self.store.current_snapshot();
        let key = (graph.nodes.len(), graph.edges.len());
        let same_nodes = graph.nodes.len() == self.layout.len()
            && graph
                .nodes
                .iter()
                .all(|n| self.layout.iter().any(|l| l.id == n.id));
        if key != self.layout_key || !same_nodes {
            self.relayout();
        }
    }

    /// Viewport size changed. The relayout happens from [`Self::tick`] once
    /// resizes stop arriving for the debounce period.
    pub fn resize(&mut self, size: Size, now: Instant) {
        self.pending_resize = Some((size, now + self.config.resize_debounce));
    }

    /// Advance timers: fire a due resize and expire notifications.
    pub fn tick(&mut self, now: Instant) {
        if let Some((size, due)) = self.pending_resize {
            if now >= due {
                self.pending_resize = None;
                if size != self.config.viewport {
                    self.config.viewport = size;
                    self.relayout();
                }
            }
        }
        self.notifications.expire(now);
    }

    fn apply_effects(&mut self, effects: Vec<Effect>, now: Instant) {
        for effect in effects {
            match effect {
                Effect::Notify(kind, message) => self.notify(kind, message, now),
                Effect::DeleteNode(id) => {
                    // Failures are already reported as notifications.
                    let _ = self.delete_node(&id, now);
                }
                Effect::MoveNode { id, to } => {
                    if let Some(node) = self.layout.iter_mut().find(|n| n.id == id && !n.anchor) {
                        node.position = Some(to);
                        node.velocity = Position::ORIGIN;
                    }
                }
            }
        }
    }

    pub fn pointer_down(&mut self, screen: Position, button: PointerButton, now: Instant) {
        let scene = Scene {
            graph: self.store.current_snapshot(),
            layout: &self.layout,
        };
        let effects = self.controller.pointer_down(screen, button, scene);
        self.apply_effects(effects, now);
    }

    pub fn pointer_move(&mut self, screen: Position, now: Instant) {
        let scene = Scene {
            graph: self.store.current_snapshot(),
            layout: &self.layout,
        };
        let effects = self.controller.pointer_move(screen, scene);
        self.apply_effects(effects, now);
    }

    pub fn pointer_up(&mut self, screen: Position) {
        self.controller.pointer_up(screen);
    }

    pub fn pointer_leave(&mut self) {
        self.controller.pointer_leave();
    }

    pub fn wheel(&mut self, screen: Position, delta_y: f64) -> bool {
        self.controller.wheel(screen, delta_y)
    }

    pub fn zoom(&mut self, screen: Position, direction: ZoomDirection) -> bool {
        self.controller.zoom(screen, direction)
    }

    pub fn context_click(&mut self, screen: Position) {
        let scene = Scene {
            graph: self.store.current_snapshot(),
            layout: &self.layout,
        };
        self.controller.context_click(screen, scene);
    }

    pub fn select_action(&mut self, action: MenuAction, now: Instant) {
        let scene = Scene {
            graph: self.store.current_snapshot(),
            layout: &self.layout,
        };
        let effects = self.controller.select_action(action, scene);
        self.apply_effects(effects, now);
    }

    pub fn hover(&mut self, screen: Position) -> Option<&Hover> {
        let scene = Scene {
            graph: self.store.current_snapshot(),
            layout: &self.layout,
        };
        self.controller.hover(screen, scene)
    }

    pub fn cancel(&mut self) {
        self.controller.cancel();
    }

    /// Submit the open form. Validation and policy failures are reported and
    /// leave the form open; success stages a commit and returns to `Idle`.
    pub fn submit_form(&mut self, now: Instant) -> Result<MutationId, EditError> {
        let Some(form) = self.controller.form().cloned() else {
            return Err(EditError::NoOpenForm);
        };
        let graph = self.store.current_snapshot();
        let result = match &form {
            Form::Node(node) => edit::apply_node_form(graph, node),
            Form::Edge(edge) => {
                edit::apply_edge_form(graph, edge).map(|next| (next, MutationKind::CreateEdge))
            }
        };

        match result {
            Ok((next, kind)) => {
                self.controller.close_form();
                Ok(self.stage(next, kind))
            }
            Err(err) => {
                warn!("form rejected: {err}");
                self.notify(NotificationKind::Error, err.to_string(), now);
                Err(err)
            }
        }
    }

    /// Delete a node and its edges. The anchor is always refused.
    pub fn delete_node(&mut self, id: &str, now: Instant) -> Result<MutationId, EditError> {
        match edit::delete_node(self.store.current_snapshot(), id) {
            Ok(next) => Ok(self.stage(next, MutationKind::DeleteNode)),
            Err(err) => {
                warn!(%id, "delete rejected: {err}");
                self.notify(NotificationKind::Error, err.to_string(), now);
                Err(err)
            }
        }
    }

    fn stage(&mut self, next: StructuralGraph, kind: MutationKind) -> MutationId {
        let pending = self.store.stage(next, kind);
        let id = pending.id;
        self.outbox.push_back(pending);
        self.sync_layout();
        id
    }

    /// Commits waiting to be sent to the persister, oldest first.
    pub fn take_pending(&mut self) -> Vec<PendingCommit> {
        self.outbox.drain(..).collect()
    }

    /// Report a persistence outcome and notify the user.
    pub fn resolve_commit(&mut self, id: MutationId, accepted: bool, now: Instant) {
        let Some(kind) = self.store.mutation(id).map(|m| m.kind) else {
            debug!(id, "ignoring result for a forgotten mutation");
            return;
        };
        match self.store.resolve(id, accepted) {
            Some(MutationStatus::Committed) => {
                self.notify(NotificationKind::Success, kind.success_message(), now)
            }
            Some(_) => self.notify(NotificationKind::Error, kind.failure_message(), now),
            None => {}
        }
    }

    /// Send every queued commit through `persister`, in order, and resolve each.
    pub async fn flush<P: Persister + ?Sized>(
        &mut self,
        persister: &P,
        now: Instant,
    ) -> Vec<(MutationId, bool)> {
        let mut outcomes = Vec::new();
        for pending in self.take_pending() {
            let accepted = crate::store::persist(persister, pending.update).await;
            self.resolve_commit(pending.id, accepted, now);
            outcomes.push((pending.id, accepted));
        }
        outcomes
    }

    pub fn retry(&mut self, id: MutationId) -> Result<(), StoreError> {
        let pending = self.store.retry(id)?;
        self.outbox.push_back(pending);
        Ok(())
    }

    pub fn rollback(&mut self, id: MutationId) -> Result<(), StoreError> {
        self.store.rollback(id)?;
        self.sync_layout();
        Ok(())
    }

    /// Move the timeline to `index` (clamped).
    pub fn seek(&mut self, index: usize) -> bool {
        let moved = self.store.timeline_mut().seek(index);
        if moved {
            self.sync_layout();
        }
        moved
    }

    pub fn undo(&mut self) -> bool {
        let moved = self.store.timeline_mut().undo();
        if moved {
            self.sync_layout();
        }
        moved
    }

    pub fn redo(&mut self) -> bool {
        let moved = self.store.timeline_mut().redo();
        if moved {
            self.sync_layout();
        }
        moved
    }
}
