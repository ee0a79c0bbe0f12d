use lifegraph_layout::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn viewport() -> Size {
    Size::new(800.0, 600.0)
}

fn rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

fn life_graph() -> (Vec<ForceNode>, Vec<ForceEdge>) {
    let nodes = vec![
        ForceNode::anchor("1"),
        ForceNode::new("2"),
        ForceNode::new("3"),
        ForceNode::new("4").at(20.0, 580.0),
        ForceNode::new("5"),
        ForceNode::new("6"),
    ];
    let edges = vec![
        ForceEdge::new("1", "2"),
        ForceEdge::new("2", "3"),
        ForceEdge::new("3", "1"),
        ForceEdge::new("1", "4"),
    ];
    (nodes, edges)
}

#[test]
fn test_one_finite_position_per_node() {
    let (nodes, edges) = life_graph();
    let result = ForceLayout::default()
        .run_with_rng(nodes.clone(), &edges, viewport(), &mut rng())
        .unwrap();

    assert_eq!(result.len(), nodes.len());
    for (input, output) in nodes.iter().zip(&result) {
        assert_eq!(input.id, output.id);
        let pos = output.position.expect("position set");
        assert!(pos.is_finite(), "node {} at {:?}", output.id, pos);
    }
}

#[test]
fn test_anchor_stays_at_center() {
    let (nodes, edges) = life_graph();
    let layouts = [
        ForceLayout::default(),
        ForceLayout {
            iterations: 50,
            repulsion_strength: 50_000.0,
            ..Default::default()
        },
    ];
    for layout in layouts {
        for edge_set in [&edges[..], &[]] {
            let result = layout
                .run_with_rng(nodes.clone(), edge_set, viewport(), &mut rng())
                .unwrap();
            assert_eq!(result[0].xy(), Position::new(400.0, 300.0));
        }
    }
}

#[test]
fn test_anchor_follows_viewport_resize() {
    let result = ForceLayout::default()
        .run(
            vec![ForceNode::anchor("1").at(400.0, 300.0), ForceNode::new("2")],
            &[],
            Size::new(1200.0, 900.0),
        )
        .unwrap();
    assert_eq!(result[0].xy(), Position::new(600.0, 450.0));
}

#[test]
fn test_dangling_edges_are_skipped() {
    let nodes = vec![ForceNode::anchor("1"), ForceNode::new("2")];
    let edges = vec![
        ForceEdge::new("1", "99"),
        ForceEdge::new("ghost", "2"),
        ForceEdge::new("2", "2"),
    ];
    let result = ForceLayout::default()
        .run_with_rng(nodes, &edges, viewport(), &mut rng())
        .unwrap();
    assert_eq!(result.len(), 2);
    assert!(result.iter().all(|n| n.xy().is_finite()));
}

#[test]
fn test_isolated_node_is_drawn_toward_anchor() {
    let start = Position::new(750.0, 580.0);
    let nodes = vec![
        ForceNode::anchor("1"),
        ForceNode::new("2").at(start.x, start.y),
    ];
    let center = viewport().center();
    let before = start.distance(&center);

    let result = ForceLayout::default()
        .run_with_rng(nodes, &[], viewport(), &mut rng())
        .unwrap();
    let after = result[1].xy().distance(&result[0].xy());

    assert!(after.is_finite());
    assert!(after < before, "distance went from {before} to {after}");
}

#[test]
fn test_repulsion_separates_close_nodes() {
    let nodes = vec![
        ForceNode::anchor("1"),
        ForceNode::new("2").at(100.0, 100.0),
        ForceNode::new("3").at(101.0, 100.0),
    ];
    let result = ForceLayout {
        link_strength: 0.0,
        ..Default::default()
    }
    .run_with_rng(nodes, &[], viewport(), &mut rng())
    .unwrap();
    assert!(result[1].xy().distance(&result[2].xy()) > 1.0);
}

#[test]
fn test_known_positions_are_kept_as_start() {
    let (nodes, edges) = life_graph();
    let result = ForceLayout::default()
        .run_with_rng(nodes, &edges, viewport(), &mut rng())
        .unwrap();

    // Node 4 starts in the lower-left corner and only drifts part of the way in.
    let pos = result[3].xy();
    assert!(pos.x < 250.0 && pos.y > 420.0, "node 4 at {pos:?}");
}

#[test]
fn test_layout_without_anchor() {
    let nodes = vec![ForceNode::new("a"), ForceNode::new("b")];
    let result = ForceLayout::default()
        .run_with_rng(nodes, &[ForceEdge::new("a", "b")], viewport(), &mut rng())
        .unwrap();
    assert!(result.iter().all(|n| n.xy().is_finite()));
}

struct Card {
    id: String,
    anchor: bool,
    at: Option<Position>,
}

impl Positioned for Card {
    fn id(&self) -> &str {
        &self.id
    }
    fn is_anchor(&self) -> bool {
        self.anchor
    }
    fn position(&self) -> Option<Position> {
        self.at
    }
    fn set_position(&mut self, pos: Position) {
        self.at = Some(pos);
    }
}

struct Link(&'static str, &'static str);

impl Linked for Link {
    fn source(&self) -> &str {
        self.0
    }
    fn target(&self) -> &str {
        self.1
    }
}

#[test]
fn test_layout_in_place() {
    let mut cards = vec![
        Card {
            id: "1".into(),
            anchor: true,
            at: None,
        },
        Card {
            id: "2".into(),
            anchor: false,
            at: None,
        },
    ];
    ForceLayout::default()
        .layout_in_place(&mut cards, &[Link("1", "2")], viewport())
        .unwrap();
    assert_eq!(cards[0].at, Some(Position::new(400.0, 300.0)));
    assert!(cards[1].at.is_some_and(|p| p.is_finite()));
}

#[test]
fn test_config_from_json() {
    let layout: ForceLayout = serde_json::from_str(r#"{"iterations": 12}"#).unwrap();
    assert_eq!(layout.iterations, 12);
    assert_eq!(layout.link_distance, 100.0);
}
