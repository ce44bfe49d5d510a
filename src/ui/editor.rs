use crate::editor::Buffer;
use crate::ui::input_metrics::{clamp_to_char_boundary_left, next_char_boundary, prev_char_boundary};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};

#[derive(Clone, Debug, PartialEq, Eq)]
struct PromptSnapshot {
    buffer: String,
    cursor: usize,
}

/// Single-line input of the overlay, with prompt history and undo.
#[derive(Default, Debug)]
pub struct PromptEditor {
    buffer: String,
    cursor: usize,
    history: Vec<String>,
    history_index: Option<usize>,
    history_stash: Option<PromptSnapshot>,
    undo_stack: Vec<PromptSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptAction {
    None,
    /// The line changed and the live agent indicator needs a refresh.
    Changed,
    Submit,
    Accept,
    Cancel,
}

impl PromptEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.history_index = None;
        self.history_stash = None;
        self.undo_stack.clear();
    }

    fn snapshot(&self) -> PromptSnapshot {
        PromptSnapshot {
            buffer: self.buffer.clone(),
            cursor: self.cursor,
        }
    }

    fn restore(&mut self, snapshot: PromptSnapshot) {
        self.buffer = snapshot.buffer;
        self.cursor = clamp_to_char_boundary_left(&self.buffer, snapshot.cursor);
    }

    fn begin_edit(&mut self) {
        self.history_index = None;
        self.history_stash = None;
        self.undo_stack.push(self.snapshot());
    }

    pub fn insert_str(&mut self, value: &str) {
        // The overlay input is a single line.
        let value: String = value.chars().filter(|ch| *ch != '\n' && *ch != '\r').collect();
        if value.is_empty() {
            return;
        }
        let cursor = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        self.begin_edit();
        self.buffer.insert_str(cursor, &value);
        self.cursor = cursor + value.len();
    }

    pub fn backspace(&mut self) -> bool {
        let end = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        if end == 0 {
            return false;
        }
        let start = prev_char_boundary(&self.buffer, end);
        self.begin_edit();
        self.buffer.replace_range(start..end, "");
        self.cursor = start;
        true
    }

    pub fn delete(&mut self) -> bool {
        let start = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        if start >= self.buffer.len() {
            return false;
        }
        let end = next_char_boundary(&self.buffer, start);
        self.begin_edit();
        self.buffer.replace_range(start..end, "");
        self.cursor = start;
        true
    }

    /// Records the current line in the history. The line itself stays put
    /// so it remains visible while the request runs.
    pub fn remember(&mut self) {
        let line = self.buffer.trim();
        if line.is_empty() || self.history.last().is_some_and(|last| last == line) {
            return;
        }
        self.history.push(line.to_string());
        self.history_index = None;
        self.history_stash = None;
    }

    pub fn history_up(&mut self) -> bool {
        if self.history.is_empty() {
            return false;
        }
        if self.history_index.is_none() {
            self.history_stash = Some(self.snapshot());
        }
        let next_index = match self.history_index {
            Some(idx) => idx.saturating_sub(1),
            None => self.history.len() - 1,
        };
        self.history_index = Some(next_index);
        self.buffer = self.history[next_index].clone();
        self.cursor = self.buffer.len();
        true
    }

    pub fn history_down(&mut self) -> bool {
        let Some(idx) = self.history_index else {
            return false;
        };
        if idx + 1 >= self.history.len() {
            self.history_index = None;
            match self.history_stash.take() {
                Some(stash) => self.restore(stash),
                None => {
                    self.buffer.clear();
                    self.cursor = 0;
                }
            }
        } else {
            self.history_index = Some(idx + 1);
            self.buffer = self.history[idx + 1].clone();
            self.cursor = self.buffer.len();
        }
        true
    }

    pub fn undo(&mut self) -> bool {
        match self.undo_stack.pop() {
            Some(previous) => {
                self.restore(previous);
                true
            }
            None => false,
        }
    }

    pub fn apply_event(&mut self, event: Event) -> PromptAction {
        match event {
            Event::Paste(text) => {
                self.insert_str(&text);
                PromptAction::Changed
            }
            Event::Key(key) => self.apply_key(key),
            _ => PromptAction::None,
        }
    }

    pub fn apply_key(&mut self, key: KeyEvent) -> PromptAction {
        let changed = match key.code {
            KeyCode::Esc => return PromptAction::Cancel,
            KeyCode::Enter => return PromptAction::Submit,
            KeyCode::Tab => return PromptAction::Accept,
            KeyCode::Char('z') if key.modifiers.contains(KeyModifiers::CONTROL) => self.undo(),
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if self.buffer.is_empty() {
                    false
                } else {
                    self.begin_edit();
                    self.buffer.clear();
                    self.cursor = 0;
                    true
                }
            }
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => {
                self.cursor = prev_char_boundary(&self.buffer, self.cursor);
                false
            }
            KeyCode::Right => {
                self.cursor = next_char_boundary(&self.buffer, self.cursor);
                false
            }
            KeyCode::Home => {
                self.cursor = 0;
                false
            }
            KeyCode::End => {
                self.cursor = self.buffer.len();
                false
            }
            KeyCode::Up => self.history_up(),
            KeyCode::Down => self.history_down(),
            KeyCode::Char(ch)
                if !key.modifiers.contains(KeyModifiers::CONTROL)
                    && !key.modifiers.contains(KeyModifiers::ALT) =>
            {
                self.insert_str(&ch.to_string());
                true
            }
            _ => false,
        };

        if changed {
            PromptAction::Changed
        } else {
            PromptAction::None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentAction {
    None,
    /// Text changed; trigger detection must run.
    Edit(Buffer),
    /// Only the cursor moved.
    Navigate(Buffer),
    Quit,
}

/// Maps a key pressed in the document pane onto a new buffer revision.
pub fn document_key(buffer: &Buffer, key: KeyEvent) -> DocumentAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('q') if ctrl => DocumentAction::Quit,
        KeyCode::Char(ch) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
            DocumentAction::Edit(buffer.insert_str(&ch.to_string()))
        }
        KeyCode::Enter => DocumentAction::Edit(buffer.insert_str("\n")),
        KeyCode::Tab => DocumentAction::Edit(buffer.insert_str("    ")),
        KeyCode::Backspace => DocumentAction::Edit(buffer.backspace()),
        KeyCode::Delete => DocumentAction::Edit(buffer.delete()),
        KeyCode::Left => DocumentAction::Navigate(buffer.move_left()),
        KeyCode::Right => DocumentAction::Navigate(buffer.move_right()),
        KeyCode::Home => DocumentAction::Navigate(buffer.move_line_start()),
        KeyCode::End => DocumentAction::Navigate(buffer.move_line_end()),
        KeyCode::Up => DocumentAction::Navigate(buffer.move_vertical(false)),
        KeyCode::Down => DocumentAction::Navigate(buffer.move_vertical(true)),
        _ => DocumentAction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_typing_reports_changes_and_enter_submits_without_clearing() {
        let mut editor = PromptEditor::new();
        assert_eq!(editor.apply_key(key(KeyCode::Char('h'))), PromptAction::Changed);
        assert_eq!(editor.apply_key(key(KeyCode::Char('é'))), PromptAction::Changed);
        assert_eq!(editor.apply_key(key(KeyCode::Left)), PromptAction::None);
        assert_eq!(editor.cursor(), 1);
        assert_eq!(editor.apply_key(key(KeyCode::Enter)), PromptAction::Submit);
        assert_eq!(editor.buffer(), "hé");
    }

    #[test]
    fn test_control_keys_map_to_overlay_actions() {
        let mut editor = PromptEditor::new();
        assert_eq!(editor.apply_key(key(KeyCode::Esc)), PromptAction::Cancel);
        assert_eq!(editor.apply_key(key(KeyCode::Tab)), PromptAction::Accept);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(editor.apply_key(ctrl_c), PromptAction::None);
        assert_eq!(editor.buffer(), "");
    }

    #[test]
    fn test_pasted_newlines_are_dropped() {
        let mut editor = PromptEditor::new();
        editor.apply_event(Event::Paste("fix\nthis\r\n".to_string()));
        assert_eq!(editor.buffer(), "fixthis");
    }

    #[test]
    fn test_history_recalls_and_restores_stash() {
        let mut editor = PromptEditor::new();
        editor.insert_str("@coder one");
        editor.remember();
        editor.clear();
        editor.insert_str("draft");
        assert!(editor.history_up());
        assert_eq!(editor.buffer(), "@coder one");
        assert!(editor.history_down());
        assert_eq!(editor.buffer(), "draft");
    }

    #[test]
    fn test_undo_reverts_last_edit() {
        let mut editor = PromptEditor::new();
        editor.insert_str("ab");
        editor.backspace();
        assert_eq!(editor.buffer(), "a");
        editor.undo();
        assert_eq!(editor.buffer(), "ab");
    }

    #[test]
    fn test_document_keys_split_edits_from_navigation() {
        let buffer = Buffer::new("ab");
        assert_eq!(
            document_key(&buffer, key(KeyCode::Char('/'))),
            DocumentAction::Edit(buffer.insert_str("/"))
        );
        assert_eq!(
            document_key(&buffer, key(KeyCode::Left)),
            DocumentAction::Navigate(buffer.move_left())
        );
        assert_eq!(
            document_key(
                &buffer,
                KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL)
            ),
            DocumentAction::Quit
        );
    }
}
