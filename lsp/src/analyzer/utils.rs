use mf6_core::{Document, TextPosition, TextRange};
use tower_lsp::lsp_types::{Position, Range};

/// UTF-16 offset of char column `col` within `line`, clamped to the line end.
pub fn char_col_to_utf16(line: &str, col: usize) -> u32 {
    line.chars().take(col).map(char::len_utf16).sum::<usize>() as u32
}

/// Char column for a UTF-16 offset; an offset inside a surrogate pair maps to
/// the character that starts before it.
pub fn utf16_to_char_col(line: &str, utf16: u32) -> usize {
    let target = utf16 as usize;
    let mut seen = 0usize;
    let mut col = 0usize;
    for ch in line.chars() {
        if seen + ch.len_utf16() > target {
            break;
        }
        seen += ch.len_utf16();
        col += 1;
    }
    col
}

pub fn to_text_position(doc: &Document<'_>, pos: Position) -> TextPosition {
    let line = pos.line as usize;
    TextPosition::new(line, utf16_to_char_col(doc.line(line), pos.character))
}

pub fn to_lsp_position(doc: &Document<'_>, pos: TextPosition) -> Position {
    Position::new(pos.line as u32, char_col_to_utf16(doc.line(pos.line), pos.column))
}

pub fn to_lsp_range(doc: &Document<'_>, range: TextRange) -> Range {
    Range::new(to_lsp_position(doc, range.start), to_lsp_position(doc, range.end))
}
