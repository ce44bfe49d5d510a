use super::buffer::Buffer;
use crate::ui::input_metrics::clamp_to_char_boundary_left;

/// Replaces the trigger span with `payload`.
///
/// `before` is the text up to `trigger_offset` with a trailing `trigger` removed
/// if it is still there; `after` starts at the cursor position captured when the
/// user accepted. Anything typed between the two became the prompt and is dropped.
pub fn splice(
    text: &str,
    trigger_offset: usize,
    cursor_at_accept: usize,
    payload: &str,
    trigger: &str,
) -> String {
    let trigger_offset = clamp_to_char_boundary_left(text, trigger_offset);
    let cursor_at_accept = clamp_to_char_boundary_left(text, cursor_at_accept).max(trigger_offset);

    let before = &text[..trigger_offset];
    let before = if trigger.is_empty() {
        before
    } else {
        before.strip_suffix(trigger).unwrap_or(before)
    };
    let after = &text[cursor_at_accept..];

    let mut out = String::with_capacity(before.len() + payload.len() + after.len());
    out.push_str(before);
    out.push_str(payload);
    out.push_str(after);
    out
}

/// Splices into a buffer revision and parks the cursor right after the payload.
pub fn accept(
    buffer: &Buffer,
    trigger_offset: usize,
    cursor_at_accept: usize,
    payload: &str,
    trigger: &str,
) -> Buffer {
    let text = splice(
        buffer.text(),
        trigger_offset,
        cursor_at_accept,
        payload,
        trigger,
    );
    let kept_before = {
        let offset = clamp_to_char_boundary_left(buffer.text(), trigger_offset);
        let before = &buffer.text()[..offset];
        if trigger.is_empty() {
            before.len()
        } else {
            before.strip_suffix(trigger).unwrap_or(before).len()
        }
    };
    buffer.with_text(text, kept_before + payload.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_trigger_with_payload() {
        let out = splice("hello //", 8, 8, "HELLO ", "//");
        assert_eq!(out, "hello HELLO ");
    }

    #[test]
    fn test_empty_payload_is_pure_deletion() {
        let text = "keep // this";
        assert_eq!(splice(text, 7, 7, "", "//"), "keep  this");
    }

    #[test]
    fn test_preserves_text_after_accept_cursor() {
        let out = splice("a //\nrest of doc", 4, 4, "X", "//");
        assert_eq!(out, "a X\nrest of doc");
    }

    #[test]
    fn test_text_typed_after_trigger_is_not_reinserted() {
        let out = splice("a //extra tail", 4, 9, "X", "//");
        assert_eq!(out, "a X tail");
    }

    #[test]
    fn test_missing_trigger_is_tolerated() {
        assert_eq!(splice("plain", 5, 5, "!", "//"), "plain!");
    }

    #[test]
    fn test_out_of_range_offsets_are_clamped() {
        assert_eq!(splice("ab//", 99, 99, "c", "//"), "abc");
        assert_eq!(splice("ab//cd", 4, 1, "X", "//"), "abXcd");
    }

    #[test]
    fn test_accept_moves_cursor_after_payload() {
        let buffer = Buffer::new("hello //");
        let accepted = accept(&buffer, 8, 8, "HELLO ", "//");
        assert_eq!(accepted.text(), "hello HELLO ");
        assert_eq!(accepted.cursor(), 12);
        assert_eq!(buffer.text(), "hello //");
    }
}
