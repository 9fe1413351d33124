use crate::components::RefExamples;
use crate::config::Config;
use crate::core::event_bridge::to_textarea_input;
use crate::core::input_router::{route_key, InputAction};
use crate::core::ports::DocumentMeta;
use crate::core::runtime::Runtime;
use crate::data::document::NodeId;
use crate::data::element::ElementKind;
use crate::data::page::{layout_document, PageLayout};
use crate::frontend::FrontendEvent;
use anyhow::Result;
use crossterm::event::{KeyEvent, MouseButton, MouseEventKind};
use std::rc::Rc;
use tui_textarea::{CursorMove, TextArea};

/// Lines moved per mouse wheel notch
const WHEEL_LINES: i32 = 3;

/// Editing buffer for the focused text input
struct Editor {
    node: NodeId,
    area: TextArea<'static>,
}

impl Editor {
    fn new(node: NodeId, value: &str) -> Self {
        let mut area = TextArea::new(vec![value.to_string()]);
        area.move_cursor(CursorMove::End);
        Self { node, area }
    }

    fn value(&self) -> String {
        self.area.lines().concat()
    }
}

/// Core application state (frontend-agnostic)
///
/// Owns the mounted demo and turns `FrontendEvent`s into clicks, edits, focus
/// moves and scrolling. The frontend calls [`DemoApp::refresh_layout`] before
/// drawing [`DemoApp::page`].
pub struct DemoApp {
    pub config: Config,

    runtime: Runtime,
    meta: Rc<dyn DocumentMeta>,

    /// Last page layout, used for hit testing
    page: PageLayout,
    scroll: usize,
    viewport_height: u16,

    editor: Option<Editor>,
    last_error: Option<String>,

    /// Application running flag
    pub running: bool,
}

impl DemoApp {
    /// Mount the demo page with `meta` as the title port
    pub fn new(config: Config, meta: Rc<dyn DocumentMeta>) -> Result<Self> {
        let mut runtime = Runtime::new(config.metrics());
        runtime.mount(RefExamples::new(Rc::clone(&meta), config.measure_settings()))?;
        tracing::info!(
            nodes = runtime.document().len(),
            instances = runtime.instance_count(),
            "demo mounted"
        );

        Ok(Self {
            config,
            runtime,
            meta,
            page: PageLayout::default(),
            scroll: 0,
            viewport_height: 0,
            editor: None,
            last_error: None,
            running: true,
        })
    }

    #[cfg(test)]
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn page(&self) -> &PageLayout {
        &self.page
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    fn status_rows(&self) -> u16 {
        u16::from(self.config.ui.show_status_bar)
    }

    /// Text for the status bar: the document title, plus the last error
    pub fn status_line(&self) -> String {
        let title = self.meta.title().unwrap_or_else(|| "(no title)".to_string());
        match &self.last_error {
            Some(error) => format!("{}  !! {}", title, error),
            None => title,
        }
    }

    /// Re-layout for a `width` x `height` terminal and clamp the scroll offset
    pub fn refresh_layout(&mut self, width: u16, height: u16) {
        self.page = layout_document(&self.runtime.document(), width);
        self.viewport_height = height.saturating_sub(self.status_rows());
        self.scroll_by(0);
    }

    pub fn handle_event(&mut self, event: FrontendEvent) {
        match event {
            FrontendEvent::Key { code, modifiers } => {
                self.handle_key(KeyEvent::new(code, modifiers));
            }
            FrontendEvent::Mouse { kind, x, y, .. } => self.handle_mouse(kind, x, y),
            FrontendEvent::Paste { text } => {
                // Single-line inputs
                let text = text.replace(['\r', '\n'], " ");
                self.edit_focused(|area| area.insert_str(&text));
            }
            // Next refresh_layout picks the new size up
            FrontendEvent::Resize { .. } => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match route_key(key, self.focused_kind()) {
            InputAction::Quit => self.running = false,
            InputAction::FocusNext => self.cycle_focus(1),
            InputAction::FocusPrev => self.cycle_focus(-1),
            InputAction::Activate => {
                let focused = self.runtime.document().focused();
                if let Some(node) = focused {
                    let result = self.runtime.click(node);
                    self.report(result);
                }
            }
            InputAction::Edit(key) => {
                self.edit_focused(|area| area.input(to_textarea_input(key)));
            }
            InputAction::ScrollLines(lines) => self.scroll_by(lines),
            InputAction::ScrollPages(pages) => {
                let page = i32::from(self.viewport_height.max(1));
                self.scroll_by(pages * page);
            }
            InputAction::None => {}
        }
    }

    fn handle_mouse(&mut self, kind: MouseEventKind, x: u16, y: u16) {
        match kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let top = self.status_rows();
                if y < top {
                    return;
                }
                let row = usize::from(y - top) + self.scroll;
                let Some(node) = self.page.hit_at(row, x) else {
                    return;
                };
                self.runtime.focus(node);
                if self.focused_kind() == Some(ElementKind::Button) {
                    let result = self.runtime.click(node);
                    self.report(result);
                }
            }
            MouseEventKind::ScrollUp => self.scroll_by(-WHEEL_LINES),
            MouseEventKind::ScrollDown => self.scroll_by(WHEEL_LINES),
            _ => {}
        }
    }

    fn focused_kind(&self) -> Option<ElementKind> {
        let doc = self.runtime.document();
        doc.focused().and_then(|id| doc.node(id)).map(|n| n.kind)
    }

    /// Move focus through inputs and buttons in document order, wrapping
    fn cycle_focus(&mut self, step: isize) {
        let (order, current) = {
            let doc = self.runtime.document();
            (doc.focusable(), doc.focused())
        };
        if order.is_empty() {
            return;
        }
        let len = order.len() as isize;
        let next = match current.and_then(|id| order.iter().position(|n| *n == id)) {
            Some(index) => (index as isize + step).rem_euclid(len),
            None if step > 0 => 0,
            None => len - 1,
        };
        let target = order[next as usize];
        self.runtime.focus(target);
        self.scroll_into_view(target);
    }

    fn scroll_into_view(&mut self, node: NodeId) {
        let Some(row) = self.page.row_of(node) else {
            return;
        };
        let height = usize::from(self.viewport_height.max(1));
        if row < self.scroll {
            self.scroll = row;
        } else if row >= self.scroll + height {
            self.scroll = row + 1 - height;
        }
    }

    fn scroll_by(&mut self, delta: i32) {
        let max = self
            .page
            .height()
            .saturating_sub(usize::from(self.viewport_height));
        let target = self.scroll as i64 + i64::from(delta);
        self.scroll = target.clamp(0, max as i64) as usize;
    }

    /// Apply `edit` to the focused input's buffer and dispatch the new value.
    /// The buffer is rebuilt from the document whenever they disagree, so a
    /// read-only input snaps back after each keystroke.
    fn edit_focused(&mut self, edit: impl FnOnce(&mut TextArea<'static>) -> bool) {
        let (node, current) = {
            let doc = self.runtime.document();
            match doc.focused().and_then(|id| doc.node(id)) {
                Some(n) if n.kind == ElementKind::TextInput => (n.id, n.text.clone()),
                _ => return,
            }
        };

        let in_sync = matches!(&self.editor, Some(e) if e.node == node && e.value() == current);
        if !in_sync {
            self.editor = Some(Editor::new(node, &current));
        }
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        if !edit(&mut editor.area) {
            return;
        }

        let value = editor.value();
        if value != current {
            let result = self.runtime.change(node, value);
            self.report(result);
        }
    }

    fn report(&mut self, result: Result<()>) {
        match result {
            Ok(()) => self.last_error = None,
            Err(e) => {
                tracing::error!("{:#}", e);
                self.last_error = Some(format!("{:#}", e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ports::RecordingMeta;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn app() -> (DemoApp, Rc<RecordingMeta>) {
        let meta = Rc::new(RecordingMeta::new());
        let mut app = DemoApp::new(Config::default(), meta.clone()).unwrap();
        app.refresh_layout(60, 20);
        (app, meta)
    }

    fn press(app: &mut DemoApp, code: KeyCode) {
        app.handle_event(FrontendEvent::key(code, KeyModifiers::NONE));
    }

    fn focused_text(app: &DemoApp) -> String {
        let doc = app.runtime().document();
        let text = doc
            .focused()
            .and_then(|id| doc.node(id))
            .map(|n| n.text.clone())
            .unwrap_or_default();
        text
    }

    #[test]
    fn test_starts_focused_on_dom_api_input() {
        let (app, meta) = app();
        assert_eq!(focused_text(&app), "Value");
        assert_eq!(app.status_line(), "Width:104");
        assert_eq!(meta.writes(), 1);
    }

    #[test]
    fn test_typing_into_measured_input_updates_title() {
        let (mut app, meta) = app();
        press(&mut app, KeyCode::Tab);
        assert_eq!(focused_text(&app), "Some text ...");

        press(&mut app, KeyCode::Char('!'));
        assert_eq!(focused_text(&app), "Some text ...!");
        assert_eq!(meta.title().as_deref(), Some("Width:112"));

        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Backspace);
        assert_eq!(focused_text(&app), "Some text ..");
        assert_eq!(meta.title().as_deref(), Some("Width:96"));
    }

    #[test]
    fn test_ctrl_enter_chords_keep_input_single_line() {
        let (mut app, meta) = app();
        press(&mut app, KeyCode::Tab);
        app.handle_event(FrontendEvent::key(KeyCode::Char('m'), KeyModifiers::CONTROL));
        app.handle_event(FrontendEvent::key(KeyCode::Char('j'), KeyModifiers::CONTROL));
        press(&mut app, KeyCode::Char('!'));

        assert_eq!(focused_text(&app), "Some text ...!");
        assert_eq!(meta.title().as_deref(), Some("Width:112"));
    }

    #[test]
    fn test_read_only_input_ignores_typing() {
        let (mut app, _) = app();
        press(&mut app, KeyCode::Char('x'));
        assert_eq!(focused_text(&app), "Value");
        app.handle_event(FrontendEvent::paste("pasted".to_string()));
        assert_eq!(focused_text(&app), "Value");
    }

    #[test]
    fn test_paste_into_measured_input() {
        let (mut app, meta) = app();
        press(&mut app, KeyCode::Tab);
        app.handle_event(FrontendEvent::paste("ab\ncd".to_string()));
        assert_eq!(focused_text(&app), "Some text ...ab cd");
        assert_eq!(meta.title().as_deref(), Some("Width:144"));
    }

    #[test]
    fn test_focus_wraps_and_buttons_activate() {
        let (mut app, _) = app();
        // Back from the dom-api input lands on the first Increase button
        press(&mut app, KeyCode::BackTab);
        assert_eq!(focused_text(&app), "Increase");
        press(&mut app, KeyCode::Enter);

        let paragraphs = {
            let doc = app.runtime().document();
            let texts: Vec<String> = doc
                .find_by_kind(ElementKind::Paragraph)
                .into_iter()
                .filter_map(|id| doc.node(id).map(|n| n.text.clone()))
                .collect();
            texts
        };
        assert_eq!(paragraphs, vec!["1", "Re-render."]);

        // And back around to the last button
        press(&mut app, KeyCode::BackTab);
        assert_eq!(focused_text(&app), "Increase");
        press(&mut app, KeyCode::Char(' '));
        let span = app.runtime().document().find_by_kind(ElementKind::Span);
        let last = span.last().copied().unwrap();
        assert_eq!(app.runtime().document().node(last).unwrap().text, "1");
    }

    #[test]
    fn test_mouse_click_on_button() {
        let (mut app, _) = app();
        let hit = app.page().hits[0];
        // Status bar occupies the first terminal row
        let y = u16::try_from(hit.row - app.scroll()).unwrap() + 1;
        app.handle_event(FrontendEvent::mouse(
            MouseEventKind::Down(MouseButton::Left),
            hit.start,
            y,
            KeyModifiers::NONE,
        ));

        let doc = app.runtime().document();
        assert_eq!(doc.focused(), Some(hit.node));
        assert!(doc.find_by_text("1").is_some());
    }

    #[test]
    fn test_scroll_is_clamped() {
        let (mut app, _) = app();
        press(&mut app, KeyCode::PageUp);
        assert_eq!(app.scroll(), 0);

        for _ in 0..10 {
            press(&mut app, KeyCode::PageDown);
        }
        let max = app.page().height() - 19;
        assert_eq!(app.scroll(), max);
    }

    #[test]
    fn test_quit_keys() {
        let (mut app, _) = app();
        press(&mut app, KeyCode::Esc);
        assert!(!app.running);

        let (mut app, _) = self::app();
        app.handle_event(FrontendEvent::key(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(!app.running);
    }
}
