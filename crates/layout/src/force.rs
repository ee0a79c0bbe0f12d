use std::collections::{HashMap, HashSet};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::types::*;

/// Force-directed layout with a fixed iteration budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceLayout {
    pub iterations: usize,
    pub repulsion_strength: f64,
    pub link_distance: f64,
    pub link_strength: f64,
    pub velocity_decay: f64,
    /// Rest length multiplier for temporary anchor springs.
    pub temporary_link_factor: f64,
    /// Half-width of the square around the center used to seed unplaced nodes.
    pub initial_jitter: f64,
}

impl Default for ForceLayout {
    fn default() -> Self {
        Self {
            iterations: 5,
            repulsion_strength: 1000.0,
            link_distance: 100.0,
            link_strength: 0.1,
            velocity_decay: 0.6,
            temporary_link_factor: 1.5,
            initial_jitter: 50.0,
        }
    }
}

/// Edge resolved to arena indices, with its rest length.
struct Spring {
    a: usize,
    b: usize,
    rest: f64,
}

impl ForceLayout {
    /// Lay out `nodes` inside a viewport of `viewport` size using the thread RNG.
    pub fn run(
        &self,
        nodes: Vec<ForceNode>,
        edges: &[ForceEdge],
        viewport: Size,
    ) -> Result<Vec<ForceNode>, LayoutError> {
        self.run_with_rng(nodes, edges, viewport, &mut rand::rng())
    }

    pub fn run_with_rng<R: Rng + ?Sized>(
        &self,
        mut nodes: Vec<ForceNode>,
        edges: &[ForceEdge],
        viewport: Size,
        rng: &mut R,
    ) -> Result<Vec<ForceNode>, LayoutError> {
        if !(viewport.width.is_finite()
            && viewport.height.is_finite()
            && viewport.width > 0.0
            && viewport.height > 0.0)
        {
            return Err(LayoutError::InvalidViewport(viewport));
        }
        if nodes.is_empty() {
            return Ok(nodes);
        }

        let center = viewport.center();
        self.initialize(&mut nodes, center, rng);

        let springs = self.springs(&nodes, edges);
        debug!(
            nodes = nodes.len(),
            springs = springs.len(),
            iterations = self.iterations,
            "running force layout"
        );

        for iter in 0..self.iterations {
            let alpha = 1.0 - iter as f64 / self.iterations as f64;
            self.repel(&mut nodes, alpha);
            self.pull(&mut nodes, &springs, alpha);
            self.integrate(&mut nodes);
            trace!(iter, alpha, "layout pass");
        }

        // Forces are bounded, but guard the output anyway.
        for node in nodes.iter_mut() {
            let pos = node.xy();
            if !pos.is_finite() {
                node.position = Some(center);
                node.velocity = Position::ORIGIN;
            }
        }

        Ok(nodes)
    }

    fn initialize<R: Rng + ?Sized>(&self, nodes: &mut [ForceNode], center: Position, rng: &mut R) {
        for node in nodes.iter_mut() {
            if node.anchor {
                node.pinned = Some(center);
                node.position = Some(center);
            } else if let Some(pin) = node.pinned.filter(Position::is_finite) {
                node.position = Some(pin);
            } else {
                node.pinned = None;
                let placed = node.position.filter(Position::is_finite);
                node.position = Some(placed.unwrap_or_else(|| self.seed(center, rng)));
            }
            node.velocity = Position::ORIGIN;
        }
    }

    fn seed<R: Rng + ?Sized>(&self, center: Position, rng: &mut R) -> Position {
        let jitter = self.initial_jitter.abs();
        if jitter == 0.0 {
            return center;
        }
        Position::new(
            center.x + rng.random_range(-jitter..=jitter),
            center.y + rng.random_range(-jitter..=jitter),
        )
    }

    /// Resolve real edges to indices and add temporary anchor springs for
    /// every node no real edge touches. Edges naming unknown nodes are skipped.
    fn springs(&self, nodes: &[ForceNode], edges: &[ForceEdge]) -> Vec<Spring> {
        let index: HashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();

        let mut springs = Vec::with_capacity(edges.len());
        let mut connected = HashSet::new();
        for edge in edges.iter().filter(|e| !e.temporary) {
            let (Some(&a), Some(&b)) = (
                index.get(edge.source.as_str()),
                index.get(edge.target.as_str()),
            ) else {
                debug!(source = %edge.source, target = %edge.target, "skipping dangling edge");
                continue;
            };
            if a == b {
                continue;
            }
            connected.insert(a);
            connected.insert(b);
            springs.push(Spring {
                a,
                b,
                rest: self.link_distance,
            });
        }

        if let Some(anchor) = nodes.iter().position(|n| n.anchor) {
            for i in 0..nodes.len() {
                if i != anchor && !connected.contains(&i) {
                    springs.push(Spring {
                        a: anchor,
                        b: i,
                        rest: self.link_distance * self.temporary_link_factor,
                    });
                }
            }
        }

        springs
    }

    fn repel(&self, nodes: &mut [ForceNode], alpha: f64) {
        let n = nodes.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let a = nodes[i].xy();
                let b = nodes[j].xy();
                let dx = a.x - b.x;
                let dy = a.y - b.y;
                let dist = (dx * dx + dy * dy).sqrt();
                if dist == 0.0 {
                    // Coincident: split along a direction derived from the pair.
                    let angle = (i * 31 + j * 17) as f64;
                    let force = self.repulsion_strength * alpha;
                    apply(nodes, i, j, force * angle.cos(), force * angle.sin());
                    continue;
                }
                let force = self.repulsion_strength * alpha / (dist * dist + 1.0);
                apply(nodes, i, j, force * dx / dist, force * dy / dist);
            }
        }
    }

    fn pull(&self, nodes: &mut [ForceNode], springs: &[Spring], alpha: f64) {
        for spring in springs {
            let a = nodes[spring.a].xy();
            let b = nodes[spring.b].xy();
            let dx = b.x - a.x;
            let dy = b.y - a.y;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist == 0.0 {
                continue;
            }
            let force = self.link_strength * alpha * (dist - spring.rest) / dist;
            // Stretched springs draw the endpoints together.
            apply(nodes, spring.a, spring.b, force * dx, force * dy);
        }
    }

    fn integrate(&self, nodes: &mut [ForceNode]) {
        for node in nodes.iter_mut() {
            if let Some(pin) = node.pinned {
                node.position = Some(pin);
                node.velocity = Position::ORIGIN;
                continue;
            }
            node.velocity.x *= self.velocity_decay;
            node.velocity.y *= self.velocity_decay;
            let pos = node.xy();
            node.position = Some(Position::new(
                pos.x + node.velocity.x,
                pos.y + node.velocity.y,
            ));
        }
    }

    /// Lay out caller-owned nodes, writing the resulting positions back.
    pub fn layout_in_place<N: Positioned, E: Linked>(
        &self,
        nodes: &mut [N],
        edges: &[E],
        viewport: Size,
    ) -> Result<(), LayoutError> {
        let arena: Vec<ForceNode> = nodes
            .iter()
            .map(|n| ForceNode {
                id: n.id().to_string(),
                anchor: n.is_anchor(),
                position: n.position(),
                velocity: Position::ORIGIN,
                pinned: None,
            })
            .collect();
        let links: Vec<ForceEdge> = edges
            .iter()
            .map(|e| ForceEdge::new(e.source(), e.target()))
            .collect();

        let result = self.run(arena, &links, viewport)?;

        for (i, laid_out) in result.into_iter().enumerate() {
            let node = nodes.get_mut(i).ok_or(LayoutError::InvalidNodeIndex)?;
            node.set_position(laid_out.xy());
        }
        Ok(())
    }
}

/// Add `(fx, fy)` to node `i`'s velocity and subtract it from node `j`'s.
fn apply(nodes: &mut [ForceNode], i: usize, j: usize, fx: f64, fy: f64) {
    nodes[i].velocity.x += fx;
    nodes[i].velocity.y += fy;
    nodes[j].velocity.x -= fx;
    nodes[j].velocity.y -= fy;
}
