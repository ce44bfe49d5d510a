//! Terminal playground: a document pane hosting the assistant overlay.

use crate::agents::AgentRegistry;
use crate::api::Collaborator;
use crate::assist::{AssistSession, OverlayMode, OverlayPlacement};
use crate::config::Config;
use crate::editor::caret::MirrorLayout;
use crate::editor::{
    Buffer, CaretLocator, Edges, LineHeight, MemorySurface, MonospaceMetrics, PositionMode,
    Rect as SurfaceRect, RenderStyle, ScrollOffset, TextSurface,
};
use crate::terminal::TerminalGuard;
use crate::ui::editor::{document_key, DocumentAction, PromptAction, PromptEditor};
use crate::ui::layout::{overlay_rect, split_playground_layout, PlaygroundLayout};
use crate::ui::render::{
    render_document, render_header, render_overlay, render_status_line, OverlayView,
};
use crate::util::host_of;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::layout::Rect;
use ratatui::widgets::Clear;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

const TUI_TICK_INTERVAL: Duration = Duration::from_millis(50);
const GUTTER: u16 = 2;
const OVERLAY_MAX_WIDTH: u16 = 72;
const HEADER: &str = "AgentKey playground | type // to summon an agent | ctrl-q quit";

pub const DEMO_DOCUMENT: &str = "\
AgentKey playground

Mission 1: agent switching
  Put the cursor on the empty line below, type // and then
  \"@coder write a fast python fibonacci function\".


Mission 2: memory
  Type // right after the project code below and submit //save.
  Then open a new line, type // and ask \"@writer write a confidential memo about this project\".
  The overlay shows [memory active] while a saved context is carried along.

Project code: 884-Bravo-X

Mission 3: images
  Type // and \"@memer a programmer realizing it's friday 5pm\".
  Enter generates, Enter again inserts the image markdown.
";

type PlaygroundSession = AssistSession<MemorySurface, MonospaceMetrics>;

/// Everything one frame draws, computed before touching the terminal.
struct FrameModel {
    panes: PlaygroundLayout,
    lines: Vec<String>,
    scroll_rows: usize,
    cursor: Option<(u16, u16)>,
    overlay: Option<(Rect, OverlayView)>,
    status: String,
}

pub struct App {
    session: PlaygroundSession,
    prompt: PromptEditor,
    scroll_rows: usize,
    should_quit: bool,
}

impl App {
    pub fn new(config: &Config, registry: Arc<AgentRegistry>, collaborator: Arc<dyn Collaborator>) -> Self {
        Self::with_document(config, registry, collaborator, DEMO_DOCUMENT)
    }

    pub fn with_document(
        config: &Config,
        registry: Arc<AgentRegistry>,
        collaborator: Arc<dyn Collaborator>,
        document: &str,
    ) -> Self {
        let surface = MemorySurface::new(
            Buffer::new(document),
            document_style(0),
            SurfaceRect::default(),
        );
        let locator = CaretLocator::new(MonospaceMetrics { cell_width: 1.0 }, PositionMode::Viewport);
        let session = AssistSession::new(surface, locator, registry, collaborator)
            .with_trigger(config.trigger.clone())
            .with_context_radius(config.context_radius);
        Self {
            session,
            prompt: PromptEditor::new(),
            scroll_rows: 0,
            should_quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn document(&self) -> &str {
        self.session.surface().buffer().text()
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut guard = TerminalGuard::new()?;
        let mut tick = tokio::time::interval(TUI_TICK_INTERVAL);

        while !self.should_quit {
            self.draw_frame(&mut guard)?;
            self.process_terminal_events()?;
            self.session.poll_updates();
            if self.should_quit {
                break;
            }

            tokio::select! {
                _ = tick.tick() => {}
                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
                update = self.session.next_update() => {
                    if let Some(update) = update {
                        self.session.apply_update(update);
                    }
                }
            }
        }

        Ok(())
    }

    fn process_terminal_events(&mut self) -> Result<()> {
        while event::poll(Duration::ZERO)? {
            let event = event::read()?;
            self.handle_event(event);
        }
        Ok(())
    }

    fn draw_frame(&mut self, guard: &mut TerminalGuard) -> Result<()> {
        let terminal = guard.terminal_mut();
        let size = terminal.size()?;
        let model = self.frame_model(Rect::new(0, 0, size.width, size.height));

        terminal.draw(|frame| {
            frame.render_widget(Clear, frame.area());
            render_header(frame, model.panes.header, HEADER);
            let lines: Vec<&str> = model.lines.iter().map(String::as_str).collect();
            render_document(frame, model.panes.document, &lines, model.scroll_rows, GUTTER);
            render_status_line(frame, model.panes.status, &model.status);
            if let Some((area, view)) = &model.overlay {
                render_overlay(frame, *area, view);
            }
            if let Some(position) = model.cursor {
                frame.set_cursor_position(position);
            }
        })?;
        Ok(())
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Release => {}
            Event::Key(key)
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && matches!(key.code, KeyCode::Char('q')) =>
            {
                self.should_quit = true;
            }
            Event::Key(key)
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && matches!(key.code, KeyCode::Char('c')) =>
            {
                if self.session.machine().is_visible() {
                    self.session.close();
                    self.prompt.clear();
                } else {
                    self.should_quit = true;
                }
            }
            _ if self.session.machine().is_visible() => self.handle_overlay_event(event),
            Event::Key(key) => self.handle_document_key(key),
            Event::Paste(text) => {
                let text = text.replace('\t', "    ");
                let buffer = self.session.surface().buffer().insert_str(&text);
                self.apply_document_edit(buffer);
            }
            _ => {}
        }
    }

    fn handle_document_key(&mut self, key: KeyEvent) {
        match document_key(self.session.surface().buffer(), key) {
            DocumentAction::Edit(buffer) => self.apply_document_edit(buffer),
            DocumentAction::Navigate(buffer) => self.session.navigate(buffer),
            DocumentAction::Quit => self.should_quit = true,
            DocumentAction::None => {}
        }
    }

    fn apply_document_edit(&mut self, buffer: Buffer) {
        if self.session.edit(buffer).is_some() {
            self.prompt.clear();
        }
    }

    fn handle_overlay_event(&mut self, event: Event) {
        let mode = self.session.machine().mode();
        let action = if mode == OverlayMode::Listening {
            self.prompt.apply_event(event)
        } else {
            match event {
                Event::Key(key) => match key.code {
                    KeyCode::Esc => PromptAction::Cancel,
                    KeyCode::Enter => PromptAction::Submit,
                    KeyCode::Tab => PromptAction::Accept,
                    _ => PromptAction::None,
                },
                _ => PromptAction::None,
            }
        };

        match action {
            PromptAction::Changed => {
                self.session.set_input(self.prompt.buffer());
            }
            PromptAction::Submit if mode == OverlayMode::Listening => {
                self.prompt.remember();
                self.session.submit();
            }
            PromptAction::Submit | PromptAction::Accept if mode == OverlayMode::Done => {
                self.session.accept();
                self.prompt.clear();
            }
            PromptAction::Cancel => {
                self.session.cancel();
                self.prompt.clear();
            }
            _ => {}
        }
    }

    /// Feeds the document pane's geometry to the surface so the caret
    /// locator measures in terminal cells.
    fn sync_geometry(&mut self, pane: Rect) {
        let style = document_style(pane.width);
        let text = self.session.surface().buffer().text().to_string();
        let cursor = self.session.surface().cursor();
        let metrics = MonospaceMetrics { cell_width: 1.0 };
        let cursor_line = MirrorLayout::new(&style, &metrics)
            .marker_position(&text, cursor)
            .map(|position| position.line)
            .unwrap_or(0);

        let height = pane.height.max(1) as usize;
        if cursor_line < self.scroll_rows {
            self.scroll_rows = cursor_line;
        } else if cursor_line >= self.scroll_rows + height {
            self.scroll_rows = cursor_line + 1 - height;
        }

        let surface = self.session.surface_mut();
        surface.set_style(style);
        surface.set_bounding_box(SurfaceRect {
            top: pane.y as f32,
            left: pane.x as f32,
            width: pane.width as f32,
            height: pane.height as f32,
        });
        surface.set_scroll(ScrollOffset {
            top: self.scroll_rows as f32,
            left: 0.0,
        });
        self.session.refresh_anchor();
    }

    fn frame_model(&mut self, area: Rect) -> FrameModel {
        let panes = split_playground_layout(area);
        self.sync_geometry(panes.document);

        let surface = self.session.surface();
        let text = surface.buffer().text();
        let style = surface.render_style();
        let metrics = MonospaceMetrics { cell_width: 1.0 };
        let lines = MirrorLayout::new(&style, &metrics)
            .visual_lines(text)
            .into_iter()
            .map(|range| text[range].to_string())
            .collect();

        let machine = self.session.machine();
        let overlay = machine.activation().map(|activation| {
            let view = self.overlay_view();
            let placement = OverlayPlacement::below_with(
                &activation.anchor,
                0.0,
                f32::from(panes.document.x + GUTTER),
            );
            let width = area.width.saturating_sub(2).min(OVERLAY_MAX_WIDTH);
            let height = view.height(width);
            let rect = overlay_rect(
                area,
                to_cell(placement.top),
                to_cell(placement.left),
                to_cell(activation.anchor.top),
                width,
                height,
            );
            (rect, view)
        });

        let cursor = if machine.mode() == OverlayMode::Listening {
            None
        } else {
            let anchor = self.session.locate(self.session.surface().cursor());
            let pane = panes.document;
            let x = to_cell(anchor.left);
            let y = to_cell(anchor.top);
            (y >= pane.y && y < pane.y + pane.height && x < pane.x + pane.width).then_some((x, y))
        };

        FrameModel {
            panes,
            lines,
            scroll_rows: self.scroll_rows,
            cursor,
            overlay,
            status: self.status_line(),
        }
    }

    fn overlay_view(&self) -> OverlayView {
        let machine = self.session.machine();
        let agent = machine.agent();
        let result = machine.result();
        let source_hosts: BTreeSet<String> = result
            .source_urls
            .iter()
            .filter_map(|url| host_of(url))
            .collect();
        OverlayView {
            mode: machine.mode(),
            agent_name: agent.name.clone(),
            agent_description: agent.description.clone(),
            memory_active: self.session.memory().is_active(),
            input: self.prompt.buffer().to_string(),
            input_cursor: self.prompt.cursor(),
            content: result.text.clone(),
            image_count: result.images.len(),
            source_hosts: source_hosts.into_iter().collect(),
        }
    }

    fn status_line(&self) -> String {
        let machine = self.session.machine();
        let memory = match self.session.memory().current() {
            Some(record) => format!("memory:active({})", record.source_agent),
            None => "memory:empty".to_string(),
        };
        let error = machine
            .error()
            .map(|error| format!(" | {error}"))
            .unwrap_or_default();
        format!(
            "mode:{} agent:{} {} trigger:{}{}",
            machine.mode().label(),
            machine.agent_id(),
            memory,
            self.session.trigger(),
            error
        )
    }
}

fn document_style(width: u16) -> RenderStyle {
    RenderStyle {
        font_family: "terminal".to_string(),
        font_size: 1.0,
        line_height: LineHeight::Px(1.0),
        padding: Edges {
            left: f32::from(GUTTER),
            right: 1.0,
            ..Edges::default()
        },
        width: f32::from(width),
        ..RenderStyle::default()
    }
}

fn to_cell(value: f32) -> u16 {
    if value.is_finite() {
        value.max(0.0).min(f32::from(u16::MAX)) as u16
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Script, ScriptedCollaborator};

    fn app_with(document: &str, collaborator: ScriptedCollaborator) -> App {
        App::with_document(
            &Config::default(),
            Arc::new(AgentRegistry::builtin()),
            Arc::new(collaborator),
            document,
        )
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_event(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    async fn settle(app: &mut App) {
        while app.session.is_busy() {
            match app.session.next_update().await {
                Some(update) => {
                    app.session.apply_update(update);
                }
                None => break,
            }
        }
    }

    #[tokio::test]
    async fn test_trigger_opens_overlay_below_the_caret() {
        let area = Rect::new(0, 0, 120, 24);
        let mut app = app_with("hello ", ScriptedCollaborator::default());
        app.frame_model(area);
        type_text(&mut app, "//");
        assert_eq!(app.session.machine().mode(), OverlayMode::Listening);

        let model = app.frame_model(area);
        let (rect, view) = model.overlay.expect("overlay visible");
        // Document pane starts at row 1; the caret sits on it at column 2 + 8.
        assert_eq!((rect.x, rect.y), (10, 2));
        assert_eq!(view.agent_name, "General");
        assert!(model.status.starts_with("mode:listening agent:default memory:empty"));
    }

    #[tokio::test]
    async fn test_fix_flow_splices_the_answer() {
        let collaborator = ScriptedCollaborator::new(vec![Script::text(["HE", "HELLO "])]);
        let mut app = app_with("hello ", collaborator.clone());
        app.frame_model(Rect::new(0, 0, 80, 24));
        type_text(&mut app, "//");
        type_text(&mut app, "fix this");
        press(&mut app, KeyCode::Enter);
        settle(&mut app).await;
        assert_eq!(app.session.machine().mode(), OverlayMode::Done);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.document(), "hello HELLO ");
        assert!(!app.session.machine().is_visible());
        assert_eq!(collaborator.requests()[0].prompt, "this");
    }

    #[tokio::test]
    async fn test_escape_closes_and_keeps_the_trigger_text() {
        let mut app = app_with("", ScriptedCollaborator::default());
        type_text(&mut app, "//");
        type_text(&mut app, "@coder");
        assert_eq!(app.session.machine().agent_id(), "coder");
        press(&mut app, KeyCode::Esc);
        assert!(!app.session.machine().is_visible());
        assert_eq!(app.document(), "//");
        assert_eq!(app.prompt.buffer(), "");
    }

    #[tokio::test]
    async fn test_long_documents_scroll_to_the_cursor() {
        let document = "line\n".repeat(40);
        let mut app = app_with(&document, ScriptedCollaborator::default());
        let model = app.frame_model(Rect::new(0, 0, 80, 12));
        // 10 document rows; the cursor is on row 40.
        assert_eq!(model.scroll_rows, 31);
        assert_eq!(model.cursor, Some((2, 10)));
    }

    #[tokio::test]
    async fn test_ctrl_c_closes_the_overlay_before_quitting() {
        let mut app = app_with("", ScriptedCollaborator::default());
        type_text(&mut app, "//");
        type_text(&mut app, "draft");
        let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        app.handle_event(ctrl_c.clone());
        assert!(!app.session.machine().is_visible());
        assert!(!app.should_quit());
        assert_eq!(app.prompt.buffer(), "");

        app.handle_event(ctrl_c);
        assert!(app.should_quit());
    }

    #[test]
    fn test_ctrl_q_quits() {
        let mut app = app_with("", ScriptedCollaborator::default());
        app.handle_event(Event::Key(KeyEvent::new(
            KeyCode::Char('q'),
            KeyModifiers::CONTROL,
        )));
        assert!(app.should_quit());
    }
}
