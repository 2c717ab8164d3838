//! Layout and animated transitions for the node/link diagram.
//!
//! Layout puts every visible node on its own row (its pre-order rank) and in
//! the column band of its depth.  Each [`Diagram::update`] diffs the new
//! layout against the previous one:
//!
//! * entering nodes and links grow out of the *source* node's previous
//!   position and fade in,
//! * surviving nodes slide from where they are now to their new position,
//! * exiting nodes and links shrink into the source node's new position and
//!   fade out.
//!
//! The transition is sampled per frame with cubic in-out easing.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::view::{Fill, VisibleNode};

/// Opacity used for "not there yet" so entering nodes start invisible.
const HIDDEN: f64 = 1e-6;

/// A position in layout space: `row` is the vertical rank, `depth` the
/// horizontal band.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub row: f64,
    pub depth: f64,
}

impl Point {
    pub fn new(row: f64, depth: f64) -> Self {
        Self { row, depth }
    }

    fn lerp(self, to: Point, t: f64) -> Point {
        Point {
            row: lerp(self.row, to.row, t),
            depth: lerp(self.depth, to.depth, t),
        }
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Settled position of one visible node, kept between updates.
#[derive(Debug, Clone)]
struct Placed {
    pos: Point,
    parent: Option<u64>,
}

#[derive(Debug, Clone)]
struct NodeSprite {
    id: u64,
    name: String,
    fill: Fill,
    from: Point,
    to: Point,
    from_opacity: f64,
    to_opacity: f64,
    exiting: bool,
}

#[derive(Debug, Clone)]
struct LinkSprite {
    target: u64,
    from: (Point, Point),
    to: (Point, Point),
    exiting: bool,
}

/// One node as it should be drawn right now.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameNode {
    pub id: u64,
    pub name: String,
    pub fill: Fill,
    pub pos: Point,
    pub opacity: f64,
}

/// One parent → child link as it should be drawn right now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameLink {
    pub source: Point,
    pub target: Point,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub nodes: Vec<FrameNode>,
    pub links: Vec<FrameLink>,
}

/// Diagram state across updates.
#[derive(Debug, Clone)]
pub struct Diagram {
    placed: HashMap<u64, Placed>,
    nodes: Vec<NodeSprite>,
    links: Vec<LinkSprite>,
    started: Option<Instant>,
    duration: Duration,
}

impl Diagram {
    pub fn new(duration: Duration) -> Self {
        Self {
            placed: HashMap::new(),
            nodes: Vec::new(),
            links: Vec::new(),
            started: None,
            duration,
        }
    }

    /// Row = pre-order rank, depth = tree depth.
    pub fn layout(visible: &[VisibleNode]) -> HashMap<u64, Point> {
        visible
            .iter()
            .enumerate()
            .map(|(rank, n)| (n.id, Point::new(rank as f64, n.depth as f64)))
            .collect()
    }

    /// Number of visible rows after the last update.
    pub fn rows(&self) -> usize {
        self.placed.len()
    }

    /// Eased progress of the running transition in `[0, 1]`.
    pub fn progress(&self, now: Instant) -> f64 {
        let Some(started) = self.started else {
            return 1.0;
        };
        if self.duration.is_zero() {
            return 1.0;
        }
        let raw = now.saturating_duration_since(started).as_secs_f64() / self.duration.as_secs_f64();
        ease_cubic_in_out(raw)
    }

    pub fn is_animating(&self, now: Instant) -> bool {
        self.started
            .is_some_and(|s| now.saturating_duration_since(s) < self.duration)
    }

    /// Where every live node is drawn at `now`, taking a running transition
    /// into account.
    fn drawn_positions(&self, now: Instant) -> HashMap<u64, Point> {
        let t = self.progress(now);
        let mut drawn: HashMap<u64, Point> =
            self.placed.iter().map(|(&id, p)| (id, p.pos)).collect();
        for sprite in self.nodes.iter().filter(|s| !s.exiting) {
            drawn.insert(sprite.id, sprite.from.lerp(sprite.to, t));
        }
        drawn
    }

    /// Lay out `visible` and start a transition anchored at `source`.
    pub fn update(&mut self, visible: &[VisibleNode], source: u64, now: Instant) {
        let layout = Self::layout(visible);
        let drawn = self.drawn_positions(now);
        let current = |id: u64| drawn.get(&id).copied();
        let source_prev = current(source).unwrap_or_default();
        let source_next = layout.get(&source).copied().unwrap_or_default();

        let mut nodes = Vec::with_capacity(visible.len());
        let mut links = Vec::with_capacity(visible.len());

        for node in visible {
            let to = layout[&node.id];
            let (from, from_opacity) = match current(node.id) {
                Some(pos) => (pos, 1.0),
                None => (source_prev, HIDDEN),
            };
            nodes.push(NodeSprite {
                id: node.id,
                name: node.name.clone(),
                fill: node.fill,
                from,
                to,
                from_opacity,
                to_opacity: 1.0,
                exiting: false,
            });

            if let Some(parent) = node.parent {
                let to = (layout[&parent], to);
                let old = current(parent)
                    .zip(current(node.id))
                    .filter(|_| self.placed.contains_key(&node.id));
                links.push(LinkSprite {
                    target: node.id,
                    from: old.unwrap_or((source_prev, source_prev)),
                    to,
                    exiting: false,
                });
            }
        }

        for sprite in self.nodes.iter().filter(|s| !s.exiting) {
            if layout.contains_key(&sprite.id) {
                continue;
            }
            let from = current(sprite.id).unwrap_or(sprite.to);
            nodes.push(NodeSprite {
                id: sprite.id,
                name: sprite.name.clone(),
                fill: sprite.fill,
                from,
                to: source_next,
                from_opacity: 1.0,
                to_opacity: HIDDEN,
                exiting: true,
            });
        }

        for (&id, placed) in &self.placed {
            if layout.contains_key(&id) {
                continue;
            }
            let Some(parent) = placed.parent else {
                continue;
            };
            let from = current(parent)
                .zip(current(id))
                .unwrap_or((placed.pos, placed.pos));
            links.push(LinkSprite {
                target: id,
                from,
                to: (source_next, source_next),
                exiting: true,
            });
        }
        // Stable draw order for exiting links.
        links.sort_by_key(|l| (l.exiting, l.target));

        self.placed = visible
            .iter()
            .map(|n| {
                (
                    n.id,
                    Placed {
                        pos: layout[&n.id],
                        parent: n.parent,
                    },
                )
            })
            .collect();
        self.nodes = nodes;
        self.links = links;
        self.started = Some(now);

        tracing::debug!(
            visible = visible.len(),
            sprites = self.nodes.len(),
            source,
            "diagram updated"
        );
    }

    /// Sample the diagram at `now`.  Exiting sprites disappear once the
    /// transition has finished.
    pub fn frame(&self, now: Instant) -> Frame {
        let t = self.progress(now);
        let done = !self.is_animating(now);

        let nodes = self
            .nodes
            .iter()
            .filter(|s| !(done && s.exiting))
            .map(|s| FrameNode {
                id: s.id,
                name: s.name.clone(),
                fill: s.fill,
                pos: s.from.lerp(s.to, t),
                opacity: lerp(s.from_opacity, s.to_opacity, t),
            })
            .collect();

        let links = self
            .links
            .iter()
            .filter(|l| !(done && l.exiting))
            .map(|l| FrameLink {
                source: l.from.0.lerp(l.to.0, t),
                target: l.from.1.lerp(l.to.1, t),
            })
            .collect();

        Frame { nodes, links }
    }
}
