use super::buffer::Buffer;
use crate::ui::input_metrics::clamp_to_char_boundary_left;

pub const DEFAULT_CONTEXT_RADIUS: usize = 500;

/// Text sent alongside the prompt: the selection if there is one, otherwise up
/// to `radius` chars on each side of the cursor.
pub fn context_snippet(buffer: &Buffer, radius: usize) -> String {
    if let Some(selected) = buffer.selected_text() {
        return selected.to_string();
    }
    let text = buffer.text();
    let cursor = clamp_to_char_boundary_left(text, buffer.cursor());

    let start = text[..cursor]
        .char_indices()
        .rev()
        .nth(radius.saturating_sub(1))
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    let start = if radius == 0 { cursor } else { start };
    let end = text[cursor..]
        .char_indices()
        .nth(radius)
        .map(|(idx, _)| cursor + idx)
        .unwrap_or(text.len());

    text[start..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_wins() {
        let buffer = Buffer::new("Project code: 884-Bravo-X").with_selection(14, 25);
        assert_eq!(context_snippet(&buffer, 500), "884-Bravo-X");
    }

    #[test]
    fn test_window_around_cursor() {
        let buffer = Buffer::new("0123456789").with_cursor(5);
        assert_eq!(context_snippet(&buffer, 2), "3456");
        assert_eq!(context_snippet(&buffer, 500), "0123456789");
        assert_eq!(context_snippet(&buffer, 0), "");
    }

    #[test]
    fn test_window_counts_chars_not_bytes() {
        let buffer = Buffer::new("漢字漢字").with_cursor(6);
        assert_eq!(context_snippet(&buffer, 1), "字漢");
    }
}
