//! Page layout: the document flattened into styled terminal lines.
//!
//! Block nodes start (and end) a line; inline nodes are appended to the line
//! being built. Inputs and buttons record their cell range so mouse clicks
//! can be mapped back to nodes.

use crate::data::document::{Document, NodeId};
use crate::data::element::ElementKind;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

/// Cell range occupied by a focusable node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub node: NodeId,
    /// Page row (0 = first line of the page, before scrolling)
    pub row: usize,
    pub start: u16,
    /// Exclusive
    pub end: u16,
}

#[derive(Debug, Default)]
pub struct PageLayout {
    pub lines: Vec<Line<'static>>,
    pub hits: Vec<Hit>,
}

impl PageLayout {
    pub fn height(&self) -> usize {
        self.lines.len()
    }

    /// Node under page cell `(row, column)`
    pub fn hit_at(&self, row: usize, column: u16) -> Option<NodeId> {
        self.hits
            .iter()
            .find(|h| h.row == row && column >= h.start && column < h.end)
            .map(|h| h.node)
    }

    pub fn row_of(&self, node: NodeId) -> Option<usize> {
        self.hits.iter().find(|h| h.node == node).map(|h| h.row)
    }

    /// Plain text of every line
    pub fn plain_lines(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }
}

struct Builder<'a> {
    doc: &'a Document,
    width: u16,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    column: u16,
    hits: Vec<Hit>,
}

impl<'a> Builder<'a> {
    fn break_line(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.current);
        self.lines.push(Line::from(spans));
        self.column = 0;
    }

    /// Append inline text, returning its cell range on the current line
    fn push(&mut self, text: String, style: Style) -> (u16, u16) {
        let start = self.column;
        let span = Span::styled(text, style);
        let width = u16::try_from(span.width()).unwrap_or(u16::MAX);
        self.column = self.column.saturating_add(width);
        self.current.push(span);
        (start, self.column)
    }

    fn push_focusable(&mut self, id: NodeId, text: String, style: Style) {
        let (start, end) = self.push(text, style);
        self.hits.push(Hit {
            node: id,
            row: self.lines.len(),
            start,
            end,
        });
    }

    fn visit(&mut self, id: NodeId, inherited: Style) {
        let doc = self.doc;
        let Some(node) = doc.node(id) else {
            return;
        };
        let focused = doc.focused() == Some(id);
        let mut style = inherited;
        if let Some(fg) = node.style.fg {
            style = style.fg(fg);
        }
        let block = node.kind.is_block();
        if block {
            self.break_line();
        }

        match node.kind {
            ElementKind::Rule => {
                let rule = "─".repeat(usize::from(self.width.max(1)));
                self.lines
                    .push(Line::styled(rule, Style::default().fg(Color::DarkGray)));
            }
            ElementKind::Heading(level) => {
                let mut heading = style.add_modifier(Modifier::BOLD);
                if level == 1 {
                    heading = heading.add_modifier(Modifier::UNDERLINED);
                }
                if !node.text.is_empty() {
                    self.push(node.text.clone(), heading);
                }
            }
            ElementKind::Paragraph | ElementKind::Label | ElementKind::Span | ElementKind::Text => {
                if !node.text.is_empty() {
                    self.push(node.text.clone(), style);
                }
            }
            ElementKind::TextInput => {
                let style = focus_style(style, focused);
                self.push_focusable(id, format!("[{}]", node.text), style);
            }
            ElementKind::Button => {
                let style = focus_style(style.add_modifier(Modifier::BOLD), focused);
                self.push_focusable(id, format!("[ {} ]", node.text), style);
            }
            ElementKind::Container | ElementKind::Component => {}
        }

        for child in &node.children {
            self.visit(*child, style);
        }

        if block {
            self.break_line();
        }
    }
}

fn focus_style(style: Style, focused: bool) -> Style {
    if focused {
        style.add_modifier(Modifier::REVERSED)
    } else {
        style
    }
}

/// Lay the document out for a page `width` cells wide
pub fn layout_document(doc: &Document, width: u16) -> PageLayout {
    let mut builder = Builder {
        doc,
        width,
        lines: Vec::new(),
        current: Vec::new(),
        column: 0,
        hits: Vec::new(),
    };
    if let Some(root) = doc.root() {
        builder.visit(root, Style::default());
    }
    builder.break_line();

    PageLayout {
        lines: builder.lines,
        hits: builder.hits,
    }
}
