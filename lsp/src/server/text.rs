use ropey::Rope;
use tower_lsp::lsp_types::{Position, TextDocumentContentChangeEvent};

// LSP positions count UTF-16 units; the rope indexes chars. Clamped to the line end.
pub(crate) fn position_to_char_idx(text: &Rope, pos: Position) -> usize {
    let line_idx = pos.line as usize;
    if line_idx >= text.len_lines() {
        return text.len_chars();
    }
    let line_start_char = text.line_to_char(line_idx);
    let line_slice = text.line(line_idx);
    let target_utf16 = pos.character as usize;

    if let Some(s) = line_slice.as_str() {
        if s.is_ascii() {
            return line_start_char + target_utf16.min(s.len());
        }
    }

    let mut seen_utf16 = 0usize;
    let mut chars_in_line = 0usize;
    for ch in line_slice.chars() {
        let u16_len = ch.len_utf16();
        if seen_utf16 + u16_len > target_utf16 {
            break;
        }
        seen_utf16 += u16_len;
        chars_in_line += 1;
        if seen_utf16 == target_utf16 {
            break;
        }
    }
    line_start_char + chars_in_line
}

// Apply one LSP content change; a change without a range replaces the buffer.
pub(crate) fn apply_incremental_change_rope(text: &mut Rope, change: &TextDocumentContentChangeEvent) {
    let Some(range) = &change.range else {
        *text = Rope::from_str(&change.text);
        return;
    };
    let start_char = position_to_char_idx(text, range.start);
    let end_char = position_to_char_idx(text, range.end);
    let (s, e) = if start_char <= end_char {
        (start_char, end_char)
    } else {
        (end_char, start_char)
    };
    if s != e {
        text.remove(s..e);
    }
    if !change.text.is_empty() {
        text.insert(s, &change.text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::Range;

    fn change(range: Option<Range>, text: &str) -> TextDocumentContentChangeEvent {
        TextDocumentContentChangeEvent {
            range,
            range_length: None,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_incremental_edit() {
        let mut rope = Rope::from_str("BEGIN options\nEND options\n");
        let at = Position::new(1, 0);
        apply_incremental_change_rope(&mut rope, &change(Some(Range::new(at, at)), "  SAVE_FLOWS\n"));
        assert_eq!(rope.to_string(), "BEGIN options\n  SAVE_FLOWS\nEND options\n");

        let r = Range::new(Position::new(0, 6), Position::new(0, 13));
        apply_incremental_change_rope(&mut rope, &change(Some(r), "dimensions"));
        assert!(rope.to_string().starts_with("BEGIN dimensions\n"));
    }

    #[test]
    fn test_full_replacement() {
        let mut rope = Rope::from_str("old");
        apply_incremental_change_rope(&mut rope, &change(None, "new text"));
        assert_eq!(rope.to_string(), "new text");
    }

    #[test]
    fn test_position_counts_utf16_units() {
        let rope = Rope::from_str("# 𝄞 note\nnext");
        // '𝄞' spans UTF-16 columns 2..4.
        assert_eq!(position_to_char_idx(&rope, Position::new(0, 4)), 3);
        assert_eq!(position_to_char_idx(&rope, Position::new(1, 99)), 13);
        assert_eq!(position_to_char_idx(&rope, Position::new(7, 0)), rope.len_chars());
    }
}
