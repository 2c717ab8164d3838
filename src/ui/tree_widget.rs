//! Custom Ratatui widget that draws a sampled diagram [`Frame`]: one node
//! box per row, indented by depth, joined to its parent by box-drawing links.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::Span,
    widgets::{Block, Borders, StatefulWidget, Widget},
};

use crate::core::{diagram::Frame, view::VisibleNode};

use super::theme::Theme;

/// Columns per depth level.
pub const INDENT: u16 = 4;

/// Nodes fainter than this are not drawn at all.
const MIN_OPACITY: f64 = 0.3;

// ───────────────────────────────────────── state ─────────────

/// Persistent state for the tree widget (scroll offset and the row to keep
/// in view).
#[derive(Debug, Default)]
pub struct TreeWidgetState {
    /// Vertical scroll offset (first visible row).
    pub offset: usize,
    /// Row of the backend cursor, if any.
    pub focus: Option<usize>,
    /// Focus row the offset was last adjusted for.
    followed: Option<usize>,
    /// Largest useful offset as of the last render.
    max_offset: usize,
}

impl TreeWidgetState {
    pub fn scroll_by(&mut self, delta: isize) {
        self.offset = self.offset.saturating_add_signed(delta).min(self.max_offset);
    }

    /// Bring a newly moved focus row into view, then keep the offset inside
    /// `rows` for a viewport of `height` rows.  Manual scrolling is left
    /// alone while the focus stays put.
    pub fn clamp_scroll(&mut self, rows: usize, height: usize) {
        if height == 0 {
            return;
        }
        if self.focus != self.followed {
            if let Some(focus) = self.focus {
                if focus < self.offset {
                    self.offset = focus;
                } else if focus >= self.offset + height {
                    self.offset = focus + 1 - height;
                }
            }
            self.followed = self.focus;
        }
        self.max_offset = rows.saturating_sub(height);
        self.offset = self.offset.min(self.max_offset);
    }
}

// ───────────────────────────────────────── geometry ──────────

/// The bordered block around the diagram pane.
pub fn tree_block(title: &str) -> Block<'_> {
    Block::default()
        .title(format!(" {title} "))
        .title_style(Theme::title_style())
        .borders(Borders::ALL)
        .border_style(Theme::border_style())
}

/// Area inside [`tree_block`].
pub fn inner_area(area: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(area)
}

fn label(name: &str) -> String {
    format!(" {name} ")
}

/// Node whose box covers the cell at (`column`, `row`), using settled
/// positions.
pub fn node_at(
    visible: &[VisibleNode],
    inner: Rect,
    offset: usize,
    column: u16,
    row: u16,
) -> Option<u64> {
    if !inner.contains((column, row).into()) {
        return None;
    }
    let node = visible.get(offset + (row - inner.y) as usize)?;
    let x = inner.x as usize + node.depth * INDENT as usize;
    let width = Span::raw(label(&node.name)).width();
    let column = column as usize;
    (column >= x && column < x + width).then_some(node.id)
}

// ───────────────────────────────────────── widget ────────────

/// The tree widget itself — created fresh each frame.
pub struct TreeWidget<'a> {
    frame: &'a Frame,
    rows: usize,
    block: Option<Block<'a>>,
}

impl<'a> TreeWidget<'a> {
    /// `rows` is the settled row count, used to bound scrolling.
    pub fn new(frame: &'a Frame, rows: usize) -> Self {
        Self {
            frame,
            rows,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

/// Maps layout space onto cells of `inner`, shifted by the scroll offset.
struct Canvas {
    inner: Rect,
    offset: f64,
}

impl Canvas {
    fn cell(&self, row: f64, depth: f64) -> (i32, i32) {
        let x = self.inner.x as i32 + (depth * INDENT as f64).round() as i32;
        let y = self.inner.y as i32 + (row - self.offset).round() as i32;
        (x, y)
    }

    /// `lo..hi` cut down to the visible rows.
    fn rows(&self, lo: i32, hi: i32) -> std::ops::Range<i32> {
        lo.max(self.inner.top() as i32)..hi.min(self.inner.bottom() as i32)
    }

    /// `lo..hi` cut down to the visible columns.
    fn columns(&self, lo: i32, hi: i32) -> std::ops::Range<i32> {
        lo.max(self.inner.left() as i32)..hi.min(self.inner.right() as i32)
    }

    fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.inner.left() as i32
            && x < self.inner.right() as i32
            && y >= self.inner.top() as i32
            && y < self.inner.bottom() as i32
    }

    fn put(&self, buf: &mut Buffer, x: i32, y: i32, symbol: impl FnOnce(&str) -> &'static str) {
        if !self.contains(x, y) {
            return;
        }
        if let Some(cell) = buf.cell_mut((x as u16, y as u16)) {
            let next = symbol(cell.symbol());
            cell.set_symbol(next).set_style(Theme::link_style());
        }
    }
}

impl<'a> StatefulWidget for TreeWidget<'a> {
    type State = TreeWidgetState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        // Resolve the inner area (inside the optional block border).
        let inner = if let Some(ref block) = self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };
        if inner.is_empty() {
            return;
        }

        if self.frame.nodes.is_empty() {
            buf.set_stringn(
                inner.x,
                inner.y,
                "waiting for tree…",
                inner.width as usize,
                Theme::placeholder_style(),
            );
            return;
        }

        state.clamp_scroll(self.rows, inner.height as usize);
        let canvas = Canvas {
            inner,
            offset: state.offset as f64,
        };

        // Links first so node boxes sit on top.
        for link in &self.frame.links {
            let (px, py) = canvas.cell(link.source.row, link.source.depth);
            let (cx, cy) = canvas.cell(link.target.row, link.target.depth);
            // Far-off rows saturate in the cast, so step with saturating adds.
            let first = py.saturating_add(1);
            if cy <= py || canvas.rows(first, cy.saturating_add(1)).is_empty() {
                continue;
            }
            let spine = px.saturating_add(1);
            for y in canvas.rows(first, cy) {
                canvas.put(buf, spine, y, |s| match s {
                    "└" | "├" => "├",
                    _ => "│",
                });
            }
            canvas.put(buf, spine, cy, |s| match s {
                "│" | "├" => "├",
                _ => "└",
            });
            for x in canvas.columns(spine.saturating_add(1), cx) {
                canvas.put(buf, x, cy, |_| "─");
            }
        }

        for node in &self.frame.nodes {
            if node.opacity < MIN_OPACITY {
                continue;
            }
            let (x, y) = canvas.cell(node.pos.row, node.pos.depth);
            if !canvas.contains(x, y) {
                continue;
            }
            let mut style = Theme::node_style(node.fill);
            if node.opacity < 0.99 {
                style = style.add_modifier(Theme::fading_modifier());
            }
            let room = (inner.right() as i32 - x) as usize;
            buf.set_stringn(x as u16, y as u16, label(&node.name), room, style);
        }
    }
}
