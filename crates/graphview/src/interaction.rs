use lifegraph_layout::{ForceNode, Position, Size, Viewport, ZoomDirection};
use tracing::debug;

use crate::edit::{EdgeForm, NodeForm, is_connected};
use crate::notification::NotificationKind;
use crate::snapshot::StructuralGraph;

pub const NODE_RADIUS: f64 = 28.0;
pub const ANCHOR_RADIUS: f64 = 32.0;

pub const MENU_WIDTH: f64 = 180.0;
pub const MENU_ITEM_HEIGHT: f64 = 36.0;
pub const MENU_PADDING: f64 = 8.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MenuTarget {
    Canvas,
    Node(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    AddNode,
    EditNode,
    DeleteNode,
    CreateConnection,
}

impl MenuAction {
    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::AddNode => "Add Node",
            MenuAction::EditNode => "Edit",
            MenuAction::DeleteNode => "Delete",
            MenuAction::CreateConnection => "Create Connection",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContextMenu {
    pub target: MenuTarget,
    /// Top-left corner in screen space.
    pub position: Position,
    /// Canvas point under the click that opened the menu.
    pub canvas_point: Position,
    pub actions: Vec<MenuAction>,
}

impl ContextMenu {
    pub fn size(&self) -> Size {
        Size::new(
            MENU_WIDTH,
            self.actions.len() as f64 * MENU_ITEM_HEIGHT + 2.0 * MENU_PADDING,
        )
    }

    pub fn contains(&self, point: Position) -> bool {
        let size = self.size();
        point.x >= self.position.x
            && point.x <= self.position.x + size.width
            && point.y >= self.position.y
            && point.y <= self.position.y + size.height
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Form {
    Node(NodeForm),
    Edge(EdgeForm),
}

#[derive(Clone, Debug, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Panning {
        last: Position,
    },
    DraggingNode {
        id: String,
        last: Position,
        moved: bool,
    },
    CreatingEdge {
        source: String,
    },
    ContextMenuOpen(ContextMenu),
    FormOpen(Form),
}

/// Side effects the controller asks its owner to carry out.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    Notify(NotificationKind, String),
    DeleteNode(String),
    MoveNode { id: String, to: Position },
}

impl Effect {
    fn notify(kind: NotificationKind, message: impl Into<String>) -> Self {
        Effect::Notify(kind, message.into())
    }
}

/// Hovered node and where its tooltip is anchored, in screen space.
#[derive(Clone, Debug, PartialEq)]
pub struct Hover {
    pub id: String,
    pub anchor: Position,
}

/// What the controller reads when handling an event.
#[derive(Clone, Copy)]
pub struct Scene<'a> {
    pub graph: &'a StructuralGraph,
    pub layout: &'a [ForceNode],
}

impl<'a> Scene<'a> {
    /// Topmost node under a canvas-space point. Later nodes are drawn on top.
    pub fn node_at(&self, canvas: Position) -> Option<&'a ForceNode> {
        self.layout.iter().rev().find(|node| {
            let radius = if node.anchor { ANCHOR_RADIUS } else { NODE_RADIUS };
            node.position
                .is_some_and(|p| p.is_finite() && p.distance(&canvas) <= radius)
        })
    }
}

/// Pointer state machine over the laid-out graph.
#[derive(Debug, Default)]
pub struct InteractionController {
    state: InteractionState,
    viewport: Viewport,
    hovered: Option<Hover>,
}

impl InteractionController {
    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn hovered(&self) -> Option<&Hover> {
        self.hovered.as_ref()
    }

    pub fn form(&self) -> Option<&Form> {
        match &self.state {
            InteractionState::FormOpen(form) => Some(form),
            _ => None,
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut Form> {
        match &mut self.state {
            InteractionState::FormOpen(form) => Some(form),
            _ => None,
        }
    }

    pub fn menu(&self) -> Option<&ContextMenu> {
        match &self.state {
            InteractionState::ContextMenuOpen(menu) => Some(menu),
            _ => None,
        }
    }

    fn set_state(&mut self, state: InteractionState) {
        if std::mem::discriminant(&state) != std::mem::discriminant(&self.state) {
            debug!(from = ?self.state, to = ?state, "interaction state");
        }
        self.state = state;
    }

    /// Return to `Idle`, closing any menu or form and abandoning edge creation.
    pub fn cancel(&mut self) {
        self.set_state(InteractionState::Idle);
    }

    pub fn pointer_down(
        &mut self,
        screen: Position,
        button: PointerButton,
        scene: Scene<'_>,
    ) -> Vec<Effect> {
        match &self.state {
            InteractionState::ContextMenuOpen(menu) => {
                // A press outside the menu closes it and is otherwise swallowed.
                if !menu.contains(screen) {
                    self.set_state(InteractionState::Idle);
                }
                return Vec::new();
            }
            InteractionState::FormOpen(_) => return Vec::new(),
            _ => {}
        }
        if button != PointerButton::Primary {
            return Vec::new();
        }

        let canvas = self.viewport.to_canvas(screen);
        let hit = scene.node_at(canvas).map(|n| n.id.clone());

        if let InteractionState::CreatingEdge { source } = &self.state {
            let source = source.clone();
            return match hit {
                Some(target) if target == source => Vec::new(),
                Some(target) => self.complete_edge(source, target, scene),
                None => {
                    debug!(%source, "edge creation abandoned");
                    self.set_state(InteractionState::Panning { last: screen });
                    Vec::new()
                }
            };
        }

        match hit {
            Some(id) => self.set_state(InteractionState::DraggingNode {
                id,
                last: screen,
                moved: false,
            }),
            None => self.set_state(InteractionState::Panning { last: screen }),
        }
        Vec::new()
    }

    fn complete_edge(&mut self, source: String, target: String, scene: Scene<'_>) -> Vec<Effect> {
        if is_connected(scene.graph, &source, &target) {
            self.set_state(InteractionState::Idle);
            return vec![Effect::notify(
                NotificationKind::Info,
                "These nodes are already connected",
            )];
        }
        self.set_state(InteractionState::FormOpen(Form::Edge(EdgeForm::new(
            source, target,
        ))));
        Vec::new()
    }

    pub fn pointer_move(&mut self, screen: Position, scene: Scene<'_>) -> Vec<Effect> {
        match &mut self.state {
            InteractionState::Panning { last } => {
                let (dx, dy) = (screen.x - last.x, screen.y - last.y);
                *last = screen;
                self.viewport.pan_by(dx, dy);
                Vec::new()
            }
            InteractionState::DraggingNode { id, last, moved } => {
                if screen == *last {
                    return Vec::new();
                }
                *last = screen;
                *moved = true;
                let to = self.viewport.to_canvas(screen);
                vec![Effect::MoveNode { id: id.clone(), to }]
            }
            _ => {
                self.hover(screen, scene);
                Vec::new()
            }
        }
    }

    pub fn pointer_up(&mut self, _screen: Position) {
        if matches!(
            self.state,
            InteractionState::Panning { .. } | InteractionState::DraggingNode { .. }
        ) {
            self.set_state(InteractionState::Idle);
        }
    }

    pub fn pointer_leave(&mut self) {
        self.pointer_up(Position::ORIGIN);
        self.hovered = None;
    }

    /// Zoom one step around the cursor. Ignored while a form is open.
    pub fn wheel(&mut self, screen: Position, delta_y: f64) -> bool {
        match ZoomDirection::from_wheel(delta_y) {
            Some(direction) => self.zoom(screen, direction),
            None => false,
        }
    }

    /// One zoom step about `screen`. The view stays put while a form is open.
    pub fn zoom(&mut self, screen: Position, direction: ZoomDirection) -> bool {
        if matches!(self.state, InteractionState::FormOpen(_)) {
            return false;
        }
        self.viewport.zoom_step_at(screen, direction)
    }

    /// Secondary click: open the canvas or node context menu.
    pub fn context_click(&mut self, screen: Position, scene: Scene<'_>) {
        if matches!(self.state, InteractionState::FormOpen(_)) {
            return;
        }
        let canvas = self.viewport.to_canvas(screen);
        let menu = match scene.node_at(canvas) {
            Some(node) => {
                let mut actions = vec![MenuAction::EditNode];
                if !node.anchor {
                    actions.push(MenuAction::DeleteNode);
                }
                actions.push(MenuAction::CreateConnection);
                ContextMenu {
                    target: MenuTarget::Node(node.id.clone()),
                    position: self.viewport.to_screen(node.xy()),
                    canvas_point: canvas,
                    actions,
                }
            }
            None => ContextMenu {
                target: MenuTarget::Canvas,
                position: screen,
                canvas_point: canvas,
                actions: vec![MenuAction::AddNode],
            },
        };
        self.set_state(InteractionState::ContextMenuOpen(menu));
    }

    /// A context menu entry was chosen.
    pub fn select_action(&mut self, action: MenuAction, scene: Scene<'_>) -> Vec<Effect> {
        let InteractionState::ContextMenuOpen(menu) = &self.state else {
            return Vec::new();
        };
        if !menu.actions.contains(&action) {
            return Vec::new();
        }
        let target = menu.target.clone();
        let canvas_point = menu.canvas_point;

        match (action, target) {
            (MenuAction::AddNode, _) => {
                let form = NodeForm::create(scene.graph, canvas_point);
                self.set_state(InteractionState::FormOpen(Form::Node(form)));
                Vec::new()
            }
            (MenuAction::EditNode, MenuTarget::Node(id)) => match scene.graph.node(&id) {
                Some(node) => {
                    self.set_state(InteractionState::FormOpen(Form::Node(NodeForm::edit(node))));
                    Vec::new()
                }
                None => {
                    self.set_state(InteractionState::Idle);
                    Vec::new()
                }
            },
            (MenuAction::DeleteNode, MenuTarget::Node(id)) => {
                self.set_state(InteractionState::Idle);
                vec![Effect::DeleteNode(id)]
            }
            (MenuAction::CreateConnection, MenuTarget::Node(id)) => {
                self.set_state(InteractionState::CreatingEdge { source: id });
                vec![Effect::notify(
                    NotificationKind::Info,
                    "Click on another node to create a connection",
                )]
            }
            _ => {
                self.set_state(InteractionState::Idle);
                Vec::new()
            }
        }
    }

    /// Update the hovered node and its tooltip anchor.
    pub fn hover(&mut self, screen: Position, scene: Scene<'_>) -> Option<&Hover> {
        let canvas = self.viewport.to_canvas(screen);
        self.hovered = scene.node_at(canvas).map(|node| Hover {
            id: node.id.clone(),
            anchor: self.viewport.to_screen(node.xy()),
        });
        self.hovered.as_ref()
    }

    /// Leave a submitted form.
    pub(crate) fn close_form(&mut self) {
        if matches!(self.state, InteractionState::FormOpen(_)) {
            self.set_state(InteractionState::Idle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::Edge;
    use crate::node::{Node, NodeType};

    fn fixture() -> (StructuralGraph, Vec<ForceNode>) {
        let graph = StructuralGraph::new(
            vec![
                Node::anchor(),
                Node::new("2", "Friend", NodeType::Person),
                Node::new("3", "Calm", NodeType::Trait),
            ],
            vec![Edge::new("1", "2", "knows")],
        );
        let layout = vec![
            ForceNode::anchor("1").at(400.0, 300.0),
            ForceNode::new("2").at(200.0, 300.0),
            ForceNode::new("3").at(600.0, 300.0),
        ];
        (graph, layout)
    }

    fn scene<'a>(graph: &'a StructuralGraph, layout: &'a [ForceNode]) -> Scene<'a> {
        Scene { graph, layout }
    }

    #[test]
    fn test_pan_accumulates() {
        let (graph, layout) = fixture();
        let mut ctl = InteractionController::default();
        ctl.pointer_down(Position::new(10.0, 10.0), PointerButton::Primary, scene(&graph, &layout));
        assert!(matches!(ctl.state(), InteractionState::Panning { .. }));
        ctl.pointer_move(Position::new(20.0, 15.0), scene(&graph, &layout));
        ctl.pointer_move(Position::new(30.0, 5.0), scene(&graph, &layout));
        ctl.pointer_up(Position::new(30.0, 5.0));

        assert_eq!(ctl.state(), &InteractionState::Idle);
        assert_eq!(ctl.viewport().pan, Position::new(20.0, -5.0));
    }

    #[test]
    fn test_canvas_menu_and_add_form() {
        let (graph, layout) = fixture();
        let mut ctl = InteractionController::default();
        ctl.context_click(Position::new(100.0, 100.0), scene(&graph, &layout));
        let menu = ctl.menu().unwrap();
        assert_eq!(menu.target, MenuTarget::Canvas);
        assert_eq!(menu.actions, vec![MenuAction::AddNode]);

        ctl.select_action(MenuAction::AddNode, scene(&graph, &layout));
        let Some(Form::Node(form)) = ctl.form() else {
            panic!("expected node form, got {:?}", ctl.state());
        };
        assert_eq!(form.id, "4");
        assert!(form.is_new());
    }

    #[test]
    fn test_anchor_menu_has_no_delete() {
        let (graph, layout) = fixture();
        let mut ctl = InteractionController::default();
        ctl.context_click(Position::new(405.0, 295.0), scene(&graph, &layout));
        let menu = ctl.menu().unwrap();
        assert_eq!(menu.target, MenuTarget::Node("1".into()));
        assert_eq!(menu.position, Position::new(400.0, 300.0));
        assert!(!menu.actions.contains(&MenuAction::DeleteNode));

        // Not offered, so not accepted either.
        assert!(ctl.select_action(MenuAction::DeleteNode, scene(&graph, &layout)).is_empty());
        assert!(ctl.menu().is_some());
    }

    #[test]
    fn test_click_outside_closes_menu() {
        let (graph, layout) = fixture();
        let mut ctl = InteractionController::default();
        ctl.context_click(Position::new(100.0, 100.0), scene(&graph, &layout));

        ctl.pointer_down(Position::new(120.0, 110.0), PointerButton::Primary, scene(&graph, &layout));
        assert!(ctl.menu().is_some());

        ctl.pointer_down(Position::new(700.0, 500.0), PointerButton::Primary, scene(&graph, &layout));
        assert_eq!(ctl.state(), &InteractionState::Idle);
        assert_eq!(ctl.viewport().pan, Position::ORIGIN);
    }

    #[test]
    fn test_create_connection_flow() {
        let (graph, layout) = fixture();
        let mut ctl = InteractionController::default();
        ctl.context_click(Position::new(200.0, 300.0), scene(&graph, &layout));
        let effects = ctl.select_action(MenuAction::CreateConnection, scene(&graph, &layout));
        assert!(matches!(effects[0], Effect::Notify(NotificationKind::Info, _)));
        assert_eq!(
            ctl.state(),
            &InteractionState::CreatingEdge { source: "2".into() }
        );

        // Clicking the source again does nothing.
        ctl.pointer_down(Position::new(200.0, 300.0), PointerButton::Primary, scene(&graph, &layout));
        assert!(matches!(ctl.state(), InteractionState::CreatingEdge { .. }));

        ctl.pointer_down(Position::new(600.0, 300.0), PointerButton::Primary, scene(&graph, &layout));
        assert_eq!(
            ctl.form(),
            Some(&Form::Edge(EdgeForm::new("2", "3")))
        );
    }

    #[test]
    fn test_connection_to_linked_node_is_refused() {
        let (graph, layout) = fixture();
        let mut ctl = InteractionController::default();
        ctl.context_click(Position::new(200.0, 300.0), scene(&graph, &layout));
        ctl.select_action(MenuAction::CreateConnection, scene(&graph, &layout));

        let effects =
            ctl.pointer_down(Position::new(400.0, 300.0), PointerButton::Primary, scene(&graph, &layout));
        assert_eq!(
            effects,
            vec![Effect::Notify(
                NotificationKind::Info,
                "These nodes are already connected".into()
            )]
        );
        assert_eq!(ctl.state(), &InteractionState::Idle);
    }

    #[test]
    fn test_drag_node() {
        let (graph, layout) = fixture();
        let mut ctl = InteractionController::default();
        ctl.pointer_down(Position::new(600.0, 300.0), PointerButton::Primary, scene(&graph, &layout));
        let effects = ctl.pointer_move(Position::new(650.0, 320.0), scene(&graph, &layout));
        assert_eq!(
            effects,
            vec![Effect::MoveNode {
                id: "3".into(),
                to: Position::new(650.0, 320.0)
            }]
        );
        ctl.pointer_up(Position::new(650.0, 320.0));
        assert_eq!(ctl.state(), &InteractionState::Idle);
    }

    #[test]
    fn test_hover_tooltip_follows_view() {
        let (graph, layout) = fixture();
        let mut ctl = InteractionController::default();
        ctl.pointer_down(Position::new(0.0, 0.0), PointerButton::Primary, scene(&graph, &layout));
        ctl.pointer_move(Position::new(10.0, 20.0), scene(&graph, &layout));
        ctl.pointer_up(Position::new(10.0, 20.0));

        let hover = ctl.hover(Position::new(212.0, 318.0), scene(&graph, &layout)).unwrap();
        assert_eq!(hover.id, "2");
        assert_eq!(hover.anchor, Position::new(210.0, 320.0));

        ctl.pointer_leave();
        assert!(ctl.hovered().is_none());
    }

    #[test]
    fn test_wheel_ignored_with_form_open() {
        let (graph, layout) = fixture();
        let mut ctl = InteractionController::default();
        assert!(ctl.wheel(Position::new(50.0, 50.0), -1.0));
        ctl.context_click(Position::new(100.0, 100.0), scene(&graph, &layout));
        ctl.select_action(MenuAction::AddNode, scene(&graph, &layout));
        assert!(!ctl.wheel(Position::new(50.0, 50.0), -1.0));
        assert_eq!(ctl.viewport().zoom, 1.1);
    }

    #[test]
    fn test_zoom_ignored_with_form_open() {
        let (graph, layout) = fixture();
        let mut ctl = InteractionController::default();
        ctl.context_click(Position::new(100.0, 100.0), scene(&graph, &layout));
        ctl.select_action(MenuAction::AddNode, scene(&graph, &layout));

        assert!(!ctl.zoom(Position::new(50.0, 50.0), ZoomDirection::In));
        assert_eq!(ctl.viewport().zoom, 1.0);
        assert_eq!(ctl.viewport().pan, Position::ORIGIN);

        ctl.cancel();
        assert!(ctl.zoom(Position::new(50.0, 50.0), ZoomDirection::In));
    }
}
