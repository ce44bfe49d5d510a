use crate::ui::input_metrics::{
    clamp_to_char_boundary_left, next_char_boundary, prev_char_boundary,
};
use std::ops::Range;

/// One revision of the editable document.
///
/// Every edit returns a new `Buffer`; the previous revision stays valid for
/// anything still holding it (splicing, context capture, tests).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Buffer {
    text: String,
    cursor: usize,
    selection: Option<Range<usize>>,
}

impl Buffer {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.len();
        Self {
            text,
            cursor,
            selection: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Selection as `(start, end)`; collapses to the cursor when nothing is selected.
    pub fn selection(&self) -> (usize, usize) {
        match &self.selection {
            Some(range) => (range.start, range.end),
            None => (self.cursor, self.cursor),
        }
    }

    pub fn selected_text(&self) -> Option<&str> {
        let range = self.selection.as_ref()?;
        if range.is_empty() {
            return None;
        }
        self.text.get(range.clone())
    }

    pub fn with_cursor(&self, cursor: usize) -> Self {
        Self {
            text: self.text.clone(),
            cursor: clamp_to_char_boundary_left(&self.text, cursor),
            selection: None,
        }
    }

    /// Selects `[start, end)`; the cursor lands on `end`.
    pub fn with_selection(&self, start: usize, end: usize) -> Self {
        let mut start = clamp_to_char_boundary_left(&self.text, start);
        let mut end = clamp_to_char_boundary_left(&self.text, end);
        if start > end {
            std::mem::swap(&mut start, &mut end);
        }
        Self {
            text: self.text.clone(),
            cursor: end,
            selection: (start != end).then_some(start..end),
        }
    }

    pub fn with_text(&self, text: impl Into<String>, cursor: usize) -> Self {
        let text = text.into();
        let cursor = clamp_to_char_boundary_left(&text, cursor);
        Self {
            text,
            cursor,
            selection: None,
        }
    }

    /// Inserts at the cursor, replacing the selection if there is one.
    pub fn insert_str(&self, value: &str) -> Self {
        let (start, end) = self.selection();
        let mut text = String::with_capacity(self.text.len() + value.len());
        text.push_str(&self.text[..start]);
        text.push_str(value);
        text.push_str(&self.text[end..]);
        Self {
            text,
            cursor: start + value.len(),
            selection: None,
        }
    }

    pub fn backspace(&self) -> Self {
        if self.selection.is_some() {
            return self.insert_str("");
        }
        if self.cursor == 0 {
            return self.clone();
        }
        let start = prev_char_boundary(&self.text, self.cursor);
        let mut text = self.text.clone();
        text.replace_range(start..self.cursor, "");
        Self {
            text,
            cursor: start,
            selection: None,
        }
    }

    pub fn delete(&self) -> Self {
        if self.selection.is_some() {
            return self.insert_str("");
        }
        if self.cursor >= self.text.len() {
            return self.clone();
        }
        let end = next_char_boundary(&self.text, self.cursor);
        let mut text = self.text.clone();
        text.replace_range(self.cursor..end, "");
        Self {
            text,
            cursor: self.cursor,
            selection: None,
        }
    }

    pub fn move_left(&self) -> Self {
        self.with_cursor(prev_char_boundary(&self.text, self.cursor))
    }

    pub fn move_right(&self) -> Self {
        self.with_cursor(next_char_boundary(&self.text, self.cursor))
    }

    pub fn move_line_start(&self) -> Self {
        let start = self.text[..self.cursor]
            .rfind('\n')
            .map(|idx| idx + 1)
            .unwrap_or(0);
        self.with_cursor(start)
    }

    pub fn move_line_end(&self) -> Self {
        let end = self.text[self.cursor..]
            .find('\n')
            .map(|idx| self.cursor + idx)
            .unwrap_or(self.text.len());
        self.with_cursor(end)
    }

    /// Moves one hard line up or down, keeping the char column where possible.
    pub fn move_vertical(&self, down: bool) -> Self {
        let line_start = self.move_line_start().cursor;
        let column = self.text[line_start..self.cursor].chars().count();
        let target_start = if down {
            match self.text[self.cursor..].find('\n') {
                Some(idx) => self.cursor + idx + 1,
                None => return self.clone(),
            }
        } else {
            if line_start == 0 {
                return self.clone();
            }
            self.text[..line_start - 1]
                .rfind('\n')
                .map(|idx| idx + 1)
                .unwrap_or(0)
        };
        let line_end = self.text[target_start..]
            .find('\n')
            .map(|idx| target_start + idx)
            .unwrap_or(self.text.len());
        let target = self.text[target_start..line_end]
            .char_indices()
            .nth(column)
            .map(|(idx, _)| target_start + idx)
            .unwrap_or(line_end);
        self.with_cursor(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edits_produce_new_revisions() {
        let original = Buffer::new("hello ");
        let edited = original.insert_str("//");
        assert_eq!(original.text(), "hello ");
        assert_eq!(edited.text(), "hello //");
        assert_eq!(edited.cursor(), 8);
    }

    #[test]
    fn test_insert_replaces_selection() {
        let buffer = Buffer::new("one two three").with_selection(4, 7);
        assert_eq!(buffer.selected_text(), Some("two"));
        let edited = buffer.insert_str("2");
        assert_eq!(edited.text(), "one 2 three");
        assert_eq!(edited.cursor(), 5);
        assert_eq!(edited.selection(), (5, 5));
    }

    #[test]
    fn test_backspace_and_delete_respect_char_boundaries() {
        let buffer = Buffer::new("a漢b").with_cursor(4);
        let after_backspace = buffer.backspace();
        assert_eq!(after_backspace.text(), "ab");
        assert_eq!(after_backspace.cursor(), 1);

        let after_delete = Buffer::new("a漢b").with_cursor(1).delete();
        assert_eq!(after_delete.text(), "ab");
        assert_eq!(Buffer::new("").backspace(), Buffer::new(""));
    }

    #[test]
    fn test_cursor_is_clamped_left_inside_multibyte_chars() {
        let buffer = Buffer::new("漢字").with_cursor(4);
        assert_eq!(buffer.cursor(), 3);
        assert_eq!(Buffer::new("ab").with_cursor(99).cursor(), 2);
    }

    #[test]
    fn test_vertical_movement_keeps_column() {
        let buffer = Buffer::new("abcd\nxy\nlonger").with_cursor(3);
        let down = buffer.move_vertical(true);
        assert_eq!(down.cursor(), 7);
        let down_again = down.move_vertical(true);
        assert_eq!(down_again.cursor(), 10);
        assert_eq!(down_again.move_vertical(false).move_vertical(false).cursor(), 2);
    }

    #[test]
    fn test_line_start_and_end() {
        let buffer = Buffer::new("ab\ncdef").with_cursor(5);
        assert_eq!(buffer.move_line_start().cursor(), 3);
        assert_eq!(buffer.move_line_end().cursor(), 7);
    }
}
