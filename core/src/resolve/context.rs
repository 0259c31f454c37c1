use crate::document::Document;
use crate::scan::blocks::match_begin;

/// A whitespace-delimited token of one line. Quoted spans keep embedded whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineToken {
    pub text: String,
    /// Character columns, half-open.
    pub start: usize,
    pub end: usize,
    quoted: Vec<QuotedSpan>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct QuotedSpan {
    open: usize,
    /// Column of the closing quote, or the token end when unterminated.
    close: usize,
    inner: String,
}

impl LineToken {
    /// Token text as seen from `column`: the bare contents when the column falls
    /// inside a quoted span, the raw token otherwise.
    pub fn text_at(&self, column: usize) -> &str {
        self.quoted
            .iter()
            .find(|q| q.open <= column && column <= q.close)
            .map(|q| q.inner.as_str())
            .unwrap_or(&self.text)
    }
}

/// Token under the cursor together with its zero-based index on the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorToken {
    pub text: String,
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

fn is_quote(c: char) -> bool {
    c == '\'' || c == '"'
}

pub fn tokenize_line(line: &str) -> Vec<LineToken> {
    let chars: Vec<char> = line.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0usize;
    while i < chars.len() {
        if chars[i].is_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        let mut quoted = Vec::new();
        while i < chars.len() && !chars[i].is_whitespace() {
            if !is_quote(chars[i]) {
                i += 1;
                continue;
            }
            let quote = chars[i];
            let open = i;
            i += 1;
            while i < chars.len() && chars[i] != quote {
                i += 1;
            }
            quoted.push(QuotedSpan {
                open,
                close: i.min(chars.len()),
                inner: chars[open + 1..i].iter().collect(),
            });
            if i < chars.len() {
                i += 1;
            }
        }
        tokens.push(LineToken {
            text: chars[start..i].iter().collect(),
            start,
            end: i,
            quoted,
        });
    }
    tokens
}

/// Token covering `column`; a cursor sitting just past a token still selects it.
pub fn token_at(line: &str, column: usize) -> Option<CursorToken> {
    let tokens = tokenize_line(line);
    let index = tokens
        .iter()
        .position(|t| t.start <= column && column < t.end)
        .or_else(|| tokens.iter().position(|t| t.end == column))?;
    let token = &tokens[index];
    Some(CursorToken {
        text: token.text_at(column).to_string(),
        index,
        start: token.start,
        end: token.end,
    })
}

/// Name (lower-case) of the nearest `begin <name>` line above `line`.
///
/// Only the closest opening line is considered; `end` lines in between are not
/// tracked, so a position after a closed block still reports that block.
pub fn enclosing_block(doc: &Document<'_>, line: usize) -> Option<String> {
    (0..line.min(doc.line_count()))
        .rev()
        .find_map(|i| match_begin(doc.line(i)))
        .map(|header| header.name.to_ascii_lowercase())
}
