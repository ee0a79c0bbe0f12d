//! Static SVG rendering of a laid-out graph.

use std::fmt::Write as _;

use graphview::{GraphEditor, Node, Position};

const NODE_RADIUS: f64 = 28.0;
const ANCHOR_RADIUS: f64 = 32.0;
const MAX_LABEL_CHARS: usize = 10;

/// Render the editor's current snapshot with its layout and view transform.
pub fn render_svg(editor: &GraphEditor) -> String {
    let size = editor.config().viewport;
    let viewport = editor.viewport();
    let graph = editor.snapshot();

    let mut svg = format!(
        r#"<svg width="{}" height="{}" xmlns="http://www.w3.org/2000/svg">
<rect width="100%" height="100%" fill="white"/>
<g transform="translate({} {}) scale({})">
"#,
        size.width,
        size.height,
        viewport.pan.x + viewport.origin.x * (1.0 - viewport.zoom),
        viewport.pan.y + viewport.origin.y * (1.0 - viewport.zoom),
        viewport.zoom,
    );

    for edge in &graph.edges {
        let (Some(a), Some(b)) = (editor.position_of(&edge.source), editor.position_of(&edge.target))
        else {
            continue;
        };
        let mid = Position::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
        let _ = write!(
            svg,
            r##"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="#666" stroke-width="1.5"/>
<text x="{}" y="{}" font-family="Arial" font-size="12" fill="#555" text-anchor="middle">{}</text>
"##,
            a.x,
            a.y,
            b.x,
            b.y,
            mid.x,
            mid.y + 4.0,
            escape(&edge.label)
        );
    }

    for node in &graph.nodes {
        // Nodes without a valid position are never painted.
        let Some(pos) = editor.position_of(&node.id).filter(Position::is_finite) else {
            continue;
        };
        let radius = if node.is_anchor { ANCHOR_RADIUS } else { NODE_RADIUS };
        let color = node.node_type.color();
        let _ = write!(
            svg,
            r#"<circle cx="{}" cy="{}" r="{}" fill="{}" fill-opacity="0.8" stroke="{}" stroke-width="3"/>
<text x="{}" y="{}" font-family="Arial" font-size="{}" fill="white" text-anchor="middle">{}</text>
"#,
            pos.x,
            pos.y,
            radius,
            color,
            color,
            pos.x,
            pos.y + 5.0,
            if node.is_anchor { 14 } else { 12 },
            escape(&short_label(node))
        );
    }

    svg.push_str("</g>\n</svg>\n");
    svg
}

/// Long labels are cut to fit inside the circle.
fn short_label(node: &Node) -> String {
    if node.label.chars().count() > MAX_LABEL_CHARS {
        let head: String = node.label.chars().take(MAX_LABEL_CHARS - 2).collect();
        format!("{head}...")
    } else {
        node.label.clone()
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
