use ratatui::layout::{Constraint, Direction, Layout, Rect};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaygroundLayout {
    pub header: Rect,
    pub document: Rect,
    pub status: Rect,
}

pub fn split_playground_layout(area: Rect) -> PlaygroundLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    PlaygroundLayout {
        header: chunks[0],
        document: chunks[1],
        status: chunks[2],
    }
}

/// Places a `width` x `height` box with its top edge at row `top` and left
/// edge at column `left`, both absolute. Flips the box above `flip_row` when
/// it would run past the bottom of `area`, and keeps it inside `area`.
pub fn overlay_rect(area: Rect, top: u16, left: u16, flip_row: u16, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let bottom = area.y.saturating_add(area.height);
    let right = area.x.saturating_add(area.width);

    let y = if top.saturating_add(height) <= bottom {
        top.max(area.y)
    } else if flip_row >= area.y.saturating_add(height) {
        flip_row - height
    } else {
        bottom.saturating_sub(height).max(area.y)
    };
    let x = left.max(area.x).min(right.saturating_sub(width));

    Rect::new(x, y, width, height)
}
