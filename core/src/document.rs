use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Zero-based line/column pair. Columns count Unicode scalar values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct TextPosition {
    pub line: usize,
    pub column: usize,
}

impl TextPosition {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for TextPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextRange {
    pub start: TextPosition,
    pub end: TextPosition,
}

impl TextRange {
    pub fn new(start: TextPosition, end: TextPosition) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, other: &TextRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start.line == self.end.line {
            write!(f, "{}:{}-{}", self.start.line + 1, self.start.column + 1, self.end.column + 1)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Read-only view over the lines of an open buffer.
///
/// Lines are split on `\n` with a trailing `\r` removed, so a buffer ending in a
/// newline has a final empty line the same way an editor counts it.
#[derive(Debug, Clone)]
pub struct Document<'a> {
    path: Option<&'a Path>,
    lines: Vec<&'a str>,
}

impl<'a> Document<'a> {
    pub fn new(text: &'a str) -> Self {
        let lines = text
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .collect();
        Self { path: None, lines }
    }

    pub fn with_path(text: &'a str, path: &'a Path) -> Self {
        let mut doc = Self::new(text);
        doc.path = Some(path);
        doc
    }

    pub fn path(&self) -> Option<&'a Path> {
        self.path
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Line text by index; out-of-range lines read as empty.
    pub fn line(&self, index: usize) -> &'a str {
        self.lines.get(index).copied().unwrap_or("")
    }

    pub fn line_len(&self, index: usize) -> usize {
        self.line(index).chars().count()
    }

    /// Range covering whole lines `start..=end`.
    pub fn line_span(&self, start: usize, end: usize) -> TextRange {
        TextRange::new(TextPosition::new(start, 0), TextPosition::new(end, self.line_len(end)))
    }

    /// Lower-cased extension of the backing file, without the dot.
    pub fn extension(&self) -> Option<String> {
        self.path
            .and_then(|p| p.extension())
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }

    pub fn file_name(&self) -> Option<String> {
        self.path
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
    }

    /// Directory of the backing file; a bare file name lives in `.`.
    pub fn directory(&self) -> Option<&'a Path> {
        let dir = self.path?.parent()?;
        Some(if dir.as_os_str().is_empty() { Path::new(".") } else { dir })
    }
}

/// True for lines that carry only a comment after leading whitespace.
pub fn is_comment_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with('#') || trimmed.starts_with('!') || trimmed.starts_with("//")
}

/// Length of the leading whitespace run, in characters.
pub fn indentation(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}
