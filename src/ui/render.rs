use crate::assist::OverlayMode;
use crate::ui::input_metrics::{
    char_display_width, clamp_to_char_boundary_left, display_width, truncate_to_display_width, wrap_input_lines,
};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const MAX_CONTENT_ROWS: usize = 8;

/// Everything the overlay box shows for one frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OverlayView {
    pub mode: OverlayMode,
    pub agent_name: String,
    pub agent_description: String,
    pub memory_active: bool,
    pub input: String,
    pub input_cursor: usize,
    pub content: String,
    pub image_count: usize,
    pub source_hosts: Vec<String>,
}

impl OverlayView {
    fn hint(&self) -> &'static str {
        match self.mode {
            OverlayMode::Idle | OverlayMode::Listening => {
                "enter send  @coder @writer @researcher @memer  //save  esc close"
            }
            OverlayMode::Thinking | OverlayMode::Streaming => "esc cancel",
            OverlayMode::Done => "enter/tab insert  esc discard",
            OverlayMode::Error => "esc dismiss",
        }
    }

    fn content_lines(&self, width: usize) -> Vec<String> {
        let mut lines = match self.mode {
            OverlayMode::Thinking if self.content.is_empty() => vec!["thinking...".to_string()],
            _ if self.content.is_empty() => Vec::new(),
            _ => wrap_input_lines(&self.content, width),
        };
        if lines.len() > MAX_CONTENT_ROWS {
            // Streaming text grows at the bottom; keep the tail in view.
            lines.drain(..lines.len() - MAX_CONTENT_ROWS);
        }
        if self.image_count > 0 {
            lines.push(format!("[{} image(s) generated]", self.image_count));
        }
        if !self.source_hosts.is_empty() {
            lines.push(format!("sources: {}", self.source_hosts.join(", ")));
        }
        lines
    }

    /// Rows the box needs at `width` columns, borders included.
    pub fn height(&self, width: u16) -> u16 {
        let inner = width.saturating_sub(2).max(1) as usize;
        // input + hint + borders
        (self.content_lines(inner).len() + 4) as u16
    }
}

pub fn render_header(frame: &mut Frame<'_>, area: Rect, title: &str) {
    if area.height == 0 || area.width == 0 {
        return;
    }
    frame.render_widget(
        Paragraph::new(truncate_line(title, area.width as usize)).style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        area,
    );
}

/// Draws pre-wrapped document lines starting at `scroll_rows`, indented by `gutter` cells.
pub fn render_document(
    frame: &mut Frame<'_>,
    area: Rect,
    lines: &[&str],
    scroll_rows: usize,
    gutter: u16,
) {
    if area.height == 0 || area.width == 0 {
        return;
    }
    let indent = " ".repeat(gutter as usize);
    let visible: Vec<Line> = lines
        .iter()
        .skip(scroll_rows)
        .take(area.height as usize)
        .map(|line| Line::from(format!("{indent}{line}")))
        .collect();
    frame.render_widget(
        Paragraph::new(visible).style(Style::default().fg(Color::White)),
        area,
    );
}

pub fn render_status_line(frame: &mut Frame<'_>, area: Rect, status: &str) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let text = truncate_line(status, area.width as usize);
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

pub fn render_overlay(frame: &mut Frame<'_>, area: Rect, view: &OverlayView) {
    if area.height < 3 || area.width < 4 {
        return;
    }
    frame.render_widget(Clear, area);

    let mut title = vec![Span::styled(
        format!(" {} ", view.agent_name),
        Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD),
    )];
    if !view.agent_description.is_empty() {
        title.push(Span::styled(
            format!("{} ", view.agent_description),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if view.memory_active {
        title.push(Span::styled(
            "[memory active] ",
            Style::default().fg(Color::Green),
        ));
    }
    let border_color = match view.mode {
        OverlayMode::Error => Color::Red,
        OverlayMode::Done => Color::Green,
        _ => Color::Blue,
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Line::from(title))
        .style(Style::default().fg(border_color));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let width = inner.width.max(1) as usize;
    let input_width = width.saturating_sub(2).max(1);
    let cursor_col =
        display_width(&view.input[..clamp_to_char_boundary_left(&view.input, view.input_cursor)]);
    // Keep the cursor visible on long inputs.
    let skip_cols = cursor_col.saturating_sub(input_width.saturating_sub(1));
    let input_visible = skip_display_cols(&view.input, skip_cols);

    let mut lines = vec![Line::styled(
        format!("> {}", truncate_to_display_width(&input_visible, input_width)),
        Style::default().fg(Color::White),
    )];
    let content_style = match view.mode {
        OverlayMode::Error => Style::default().fg(Color::Red),
        OverlayMode::Thinking => Style::default()
            .fg(Color::Gray)
            .add_modifier(Modifier::ITALIC),
        _ => Style::default().fg(Color::Gray),
    };
    for line in view.content_lines(width) {
        lines.push(Line::styled(line, content_style));
    }
    lines.push(Line::styled(
        truncate_line(view.hint(), width),
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Text::from(lines)), inner);

    if view.mode == OverlayMode::Listening {
        let cursor_x = inner
            .x
            .saturating_add(2 + (cursor_col - skip_cols) as u16)
            .min(inner.x.saturating_add(inner.width.saturating_sub(1)));
        frame.set_cursor_position((cursor_x, inner.y));
    }
}

fn skip_display_cols(text: &str, cols: usize) -> String {
    let mut skipped = 0usize;
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.peek() {
        if skipped >= cols {
            break;
        }
        skipped += char_display_width(*ch);
        chars.next();
    }
    chars.collect()
}

fn truncate_line(input: &str, width: usize) -> String {
    let width = width.max(1);
    if display_width(input) <= width {
        return input.to_string();
    }
    if width >= 4 {
        let mut out = truncate_to_display_width(input, width - 3);
        out.push_str("...");
        out
    } else {
        truncate_to_display_width(input, width)
    }
}
